use std::sync::Arc;

use ndarray::{Array1, ArrayView1, ArrayView3};

use crate::{
    LossTerm,
    error::{LossErr, Result},
    image::{RgbImage, shape_of},
    loss::{Loss, LossKind},
    session::{Embedder, ModelSession},
};

const DEFAULT_WEIGHT: &str = "1";
const DEFAULT_STOP: &str = "-inf";

/// A semantic objective, pulls the embedding of the input towards the embedding of a target.
pub struct Prompt {
    embedder: Arc<dyn Embedder>,
    stop: f32,
    target_embed: Option<Array1<f32>>,
}

impl Prompt {
    /// Returns a new, unbound `Prompt`.
    ///
    /// # Arguments
    /// * `embedder` - The model images get embedded with.
    /// * `stop` - The loss is never reported below this value.
    pub fn new(embedder: Arc<dyn Embedder>, stop: f32) -> Self {
        Self {
            embedder,
            stop,
            target_embed: None,
        }
    }
}

impl Loss for Prompt {
    fn set_target(&mut self, target: ArrayView3<f32>) -> Result<()> {
        self.target_embed = Some(self.embedder.embed_image(target));
        Ok(())
    }

    fn is_bound(&self) -> bool {
        self.target_embed.is_some()
    }

    fn loss(&self, input: ArrayView3<f32>) -> Result<f32> {
        let Some(target_embed) = &self.target_embed else {
            return Ok(0.0);
        };

        let embed = self.embedder.embed_image(input);
        if embed.len() != target_embed.len() {
            return Err(LossErr::SizeMismatch {
                what: "embedding",
                got: (embed.len(), 1),
                expected: (target_embed.len(), 1),
            });
        }

        let dist = spherical_distance(embed.view(), target_embed.view());
        Ok(dist.max(self.stop))
    }
}

/// Squared great circle distance between the normalized embeddings.
fn spherical_distance(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    let norm = |v: &ArrayView1<f32>| {
        v.iter()
            .map(|x| x * x)
            .sum::<f32>()
            .sqrt()
            .max(f32::EPSILON)
    };
    let (norm_a, norm_b) = (norm(&a), norm(&b));

    let chord = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (x / norm_a - y / norm_b).powi(2))
        .sum::<f32>()
        .sqrt();

    2.0 * (chord / 2.0).min(1.0).asin().powi(2)
}

/// Splits a prompt on the colons that are not inside square brackets.
fn split_prompt(prompt: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in prompt.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => {
                parts.push(&prompt[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    parts.push(&prompt[start..]);
    parts
}

/// Parses a `text[:weight[:stop]]` prompt into a semantic loss term bound to `target`.
///
/// Colons inside square brackets belong to the text. The weight defaults to `1` and the stop
/// to negative infinity.
///
/// # Arguments
/// * `session` - Provides the embedder.
/// * `prompt` - The prompt text.
/// * `target` - The image whose embedding the term pulls towards.
///
/// # Errors
/// `LossErr::MalformedPrompt` if there are too many parts or the numbers don't parse, and
/// `LossErr::MissingModel` if the session has no embedder.
pub fn parse_prompt(session: &ModelSession, prompt: &str, target: &RgbImage) -> Result<LossTerm> {
    let parts = split_prompt(prompt);
    if parts.len() > 3 {
        return Err(LossErr::MalformedPrompt {
            prompt: prompt.to_string(),
            reason: "expected at most text, weight and stop",
        });
    }

    let text = parts[0].trim();
    let weight = parts.get(1).copied().unwrap_or(DEFAULT_WEIGHT);
    let stop = parts.get(2).copied().unwrap_or(DEFAULT_STOP);

    let weight: f32 = weight.trim().parse().map_err(|_| LossErr::MalformedPrompt {
        prompt: prompt.to_string(),
        reason: "the weight is not a number",
    })?;
    let stop: f32 = stop.trim().parse().map_err(|_| LossErr::MalformedPrompt {
        prompt: prompt.to_string(),
        reason: "the stop is not a number",
    })?;

    let loss = Prompt::new(session.embedder()?, stop);
    let shape = shape_of(target.view());
    let mut term = LossTerm::new(text, LossKind::Semantic, weight, shape, Box::new(loss));
    term.bind(target)?;

    Ok(term)
}
