mod run;

pub(crate) use run::resolve_weight;
pub use run::{
    AnimationMode, DEPTH_STABILIZATION_WEIGHT, DIRECT_INIT_WEIGHT, DIRECT_STABILIZATION_WEIGHT,
    EDGE_STABILIZATION_WEIGHT, FLOW_STABILIZATION_WEIGHT, MAX_FLOW_LONG_TERM_SAMPLES,
    RunParameters, SEMANTIC_INIT_WEIGHT, WEIGHT_KEYS,
};
