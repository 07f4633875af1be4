pub mod error;
pub mod image;
pub mod loss;
mod prompt;
mod session;
mod term;
mod weight;

pub use error::{LossErr, Result};
pub use image::{CHANNELS, Image, ImageShape, PixelImage, RgbImage};
pub use loss::{Loss, LossKind};
pub use prompt::{Prompt, parse_prompt};
pub use session::{DepthModel, Embedder, ModelSession};
pub use term::{LossTerm, TermState};
pub use weight::{Weight, WeightSpec};
