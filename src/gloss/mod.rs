//! Gloss labels and prediction ranking.

pub mod ranker;
pub mod table;

pub use ranker::{Prediction, PredictionRanker, PredictionSet};
pub use table::GlossTable;
