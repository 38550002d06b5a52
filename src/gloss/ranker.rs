//! Top-K ranking of model output into labelled predictions.

use crate::defaults::TOP_K;
use crate::error::{GlossError, Result};
use crate::gloss::table::GlossTable;
use crate::infer::RawOutput;
use ndarray::Axis;
use std::cmp::Ordering;
use std::fmt;

/// A single ranked gloss.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Class index in the model output.
    pub index: usize,
    pub label: String,
    pub score: f32,
}

impl Prediction {
    /// Score formatted to three decimals, ties rounded away from zero.
    pub fn confidence(&self) -> String {
        // `{:.3}` alone rounds exact binary ties to even (0.0625 -> 0.062).
        let rounded = (f64::from(self.score) * 1000.0).round() / 1000.0;
        format!("{:.3}", rounded)
    }

    /// Caption wire format: `"<label> (<confidence>)"`.
    pub fn caption(&self) -> String {
        format!("{} ({})", self.label, self.confidence())
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.caption())
    }
}

/// Predictions ordered by descending score. Published as a whole; never mutated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PredictionSet {
    predictions: Vec<Prediction>,
}

impl PredictionSet {
    pub fn new(predictions: Vec<Prediction>) -> Self {
        Self { predictions }
    }

    /// Highest-scoring prediction.
    pub fn top(&self) -> Option<&Prediction> {
        self.predictions.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Prediction> {
        self.predictions.iter()
    }

    pub fn as_slice(&self) -> &[Prediction] {
        &self.predictions
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// Class indices in rank order.
    pub fn indices(&self) -> Vec<usize> {
        self.predictions.iter().map(|p| p.index).collect()
    }

    /// Every prediction rendered in caption format.
    pub fn captions(&self) -> Vec<String> {
        self.predictions.iter().map(Prediction::caption).collect()
    }
}

impl<'a> IntoIterator for &'a PredictionSet {
    type Item = &'a Prediction;
    type IntoIter = std::slice::Iter<'a, Prediction>;

    fn into_iter(self) -> Self::IntoIter {
        self.predictions.iter()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PredictionRanker {
    top_k: usize,
}

impl Default for PredictionRanker {
    fn default() -> Self {
        Self { top_k: TOP_K }
    }
}

impl PredictionRanker {
    pub fn new(top_k: usize) -> Self {
        Self {
            top_k: top_k.max(1),
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Per-class scores for the first batch item.
    ///
    /// Rank-2 output `[batch, classes]` is used as is. Higher ranks
    /// `[batch, classes, ...spatial]` are average-pooled over every spatial
    /// position of each class.
    pub fn class_scores(output: &RawOutput) -> Result<Vec<f32>> {
        let shape = output.shape();
        if shape.len() < 2 {
            return Err(GlossError::malformed_output(format!(
                "expected [batch, classes, ...], got shape {:?}",
                shape
            )));
        }
        if shape[0] == 0 || shape[1] == 0 {
            return Err(GlossError::malformed_output(format!(
                "empty output, shape {:?}",
                shape
            )));
        }

        let first = output.index_axis(Axis(0), 0);
        if first.ndim() == 1 {
            return Ok(first.iter().copied().collect());
        }

        let spatial: usize = shape[2..].iter().product();
        if spatial == 0 {
            return Err(GlossError::malformed_output(format!(
                "empty spatial extent, shape {:?}",
                shape
            )));
        }
        Ok(first
            .outer_iter()
            .map(|class| class.sum() / spatial as f32)
            .collect())
    }

    /// Rank the output and map the top-K class indices through `table`.
    pub fn rank(&self, output: &RawOutput, table: &GlossTable) -> Result<PredictionSet> {
        let scores = Self::class_scores(output)?;

        let mut order: Vec<(usize, f32)> = scores
            .into_iter()
            .map(|s| if s.is_nan() { f32::NEG_INFINITY } else { s })
            .enumerate()
            .collect();
        // Stable: equal scores keep ascending class index.
        order.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let predictions = order
            .into_iter()
            .take(self.top_k)
            .map(|(index, score)| Prediction {
                index,
                label: table.label(index).into_owned(),
                score,
            })
            .collect();

        Ok(PredictionSet::new(predictions))
    }
}
