use std::slice;

use log::debug;
use loss_aug::{LossTerm, RgbImage};
use ndarray::ArrayView3;

use crate::error::OrchestratorError;

/// The position of a term in a `LossAugs`, stable for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TermId(usize);

impl TermId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The ordered, append only list of every loss term in a run.
#[derive(Debug, Default)]
pub struct LossAugs {
    terms: Vec<LossTerm>,
}

impl LossAugs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `term` and returns its position.
    pub fn push(&mut self, term: LossTerm) -> TermId {
        let id = TermId(self.terms.len());
        self.terms.push(term);
        id
    }

    pub fn get(&self, id: TermId) -> Option<&LossTerm> {
        self.terms.get(id.0)
    }

    pub fn get_mut(&mut self, id: TermId) -> Option<&mut LossTerm> {
        self.terms.get_mut(id.0)
    }

    pub fn iter(&self) -> slice::Iter<'_, LossTerm> {
        self.terms.iter()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl<'a> IntoIterator for &'a LossAugs {
    type Item = &'a LossTerm;
    type IntoIter = slice::Iter<'a, LossTerm>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The frame offset the `index`-th optical flow term looks back to, that is `-2^index`.
///
/// Returns `None` past `MAX_FLOW_LONG_TERM_SAMPLES`, where the offset doesn't fit an `i64`.
pub fn flow_offset(index: usize) -> Option<i64> {
    let index = u32::try_from(index).ok()?;
    let lookback = 1i64.checked_shl(index).filter(|&lookback| lookback > 0)?;
    Some(-lookback)
}

/// The value a single term contributed to an evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct LossReport {
    pub name: String,
    pub enabled: bool,
    pub value: f32,
}

/// Everything the orchestrator configured for a run.
#[derive(Debug)]
pub struct LossPlan {
    pub(crate) augs: LossAugs,
    pub(crate) init_augs: Vec<TermId>,
    pub(crate) stabilization_augs: Vec<TermId>,
    pub(crate) optical_flows: Vec<TermId>,
    pub(crate) smoothing: Option<TermId>,
    pub(crate) semantic_init: Option<LossTerm>,
}

impl LossPlan {
    /// Every term, in the order they were configured.
    pub fn augs(&self) -> &LossAugs {
        &self.augs
    }

    pub fn init_augs(&self) -> &[TermId] {
        &self.init_augs
    }

    pub fn stabilization_augs(&self) -> &[TermId] {
        &self.stabilization_augs
    }

    /// The optical flow terms, the `i`-th one looks back `2^i` frames.
    pub fn optical_flows(&self) -> &[TermId] {
        &self.optical_flows
    }

    pub fn smoothing(&self) -> Option<TermId> {
        self.smoothing
    }

    /// The semantic term for the init image, meant to be added to the scene prompts.
    pub fn semantic_init(&self) -> Option<&LossTerm> {
        self.semantic_init.as_ref()
    }

    pub fn take_semantic_init(&mut self) -> Option<LossTerm> {
        self.semantic_init.take()
    }

    pub fn term(&self, id: TermId) -> Option<&LossTerm> {
        self.augs.get(id)
    }

    pub fn term_mut(&mut self, id: TermId) -> Option<&mut LossTerm> {
        self.augs.get_mut(id)
    }

    pub fn optical_flow(&self, index: usize) -> Option<&LossTerm> {
        let id = *self.optical_flows.get(index)?;
        self.augs.get(id)
    }

    pub fn optical_flow_mut(&mut self, index: usize) -> Option<&mut LossTerm> {
        let id = *self.optical_flows.get(index)?;
        self.augs.get_mut(id)
    }

    /// Binds the optical flow terms whose frame exists by now.
    ///
    /// The `i`-th term references the frame `2^i` frames back, it only gets bound when
    /// `frame >= 2^i` and `warped` returns that frame warped into the current one. Terms that
    /// can't be bound yet are left as they were.
    ///
    /// # Arguments
    /// * `frame` - The index of the frame about to be rendered.
    /// * `warped` - Given a frame offset, returns the warped prior frame if there's one.
    ///
    /// # Returns
    /// The amount of terms bound by this call.
    pub fn update_optical_flows<F>(
        &mut self,
        frame: usize,
        mut warped: F,
    ) -> Result<usize, OrchestratorError>
    where
        F: FnMut(i64) -> Option<RgbImage>,
    {
        let mut bound = 0;

        for (i, &id) in self.optical_flows.iter().enumerate() {
            let Some(offset) = flow_offset(i) else {
                break;
            };
            if (frame as u64) < offset.unsigned_abs() {
                continue;
            }

            let Some(target) = warped(offset) else {
                continue;
            };

            if let Some(term) = self.augs.get_mut(id) {
                term.bind(&target)?;
                bound += 1;
            }
        }

        debug!("frame {frame}: bound {bound} optical flow term(s)");
        Ok(bound)
    }

    /// Evaluates every term against `input`, disabled ones report zero.
    pub fn evaluate(&self, input: ArrayView3<f32>) -> Result<Vec<LossReport>, OrchestratorError> {
        self.augs
            .iter()
            .map(|term| -> Result<LossReport, OrchestratorError> {
                Ok(LossReport {
                    name: term.name().to_string(),
                    enabled: term.is_enabled(),
                    value: term.evaluate(input)?,
                })
            })
            .collect()
    }

    /// The sum of every term's weighted loss.
    pub fn total(&self, input: ArrayView3<f32>) -> Result<f32, OrchestratorError> {
        Ok(self.evaluate(input)?.iter().map(|report| report.value).sum())
    }
}
