//! Class index → gloss label mapping.

use crate::defaults::placeholder_label;
use crate::error::{GlossError, Result};
use serde::Deserialize;
use std::borrow::Cow;
use std::path::Path;
use tracing::{info, warn};

/// One entry of the gloss list file. Extra fields (e.g. `instances`) are ignored.
#[derive(Debug, Deserialize)]
struct GlossEntry {
    #[serde(default)]
    gloss: Option<String>,
}

/// Immutable mapping from class index to gloss label.
#[derive(Debug, Clone, PartialEq)]
pub struct GlossTable {
    labels: Vec<String>,
    synthetic: bool,
}

impl GlossTable {
    /// Build a table from labels ordered by class index.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            synthetic: false,
        }
    }

    /// Placeholder table `Sign_0 .. Sign_<n-1>`.
    pub fn synthetic(class_count: usize) -> Self {
        Self {
            labels: (0..class_count).map(placeholder_label).collect(),
            synthetic: true,
        }
    }

    /// Parse a JSON array of `{"gloss": "..."}` objects.
    ///
    /// Entries with a missing or empty `gloss` get a placeholder label.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::parse(json, "<inline>")
    }

    /// Load the gloss list file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|e| GlossError::GlossTable {
            path: source.clone(),
            message: e.to_string(),
        })?;
        let table = Self::parse(&contents, &source)?;
        info!(path = %source, glosses = table.len(), "loaded gloss table");
        Ok(table)
    }

    /// Load the gloss list, substituting a synthetic table of `class_count`
    /// labels if the file is missing or malformed.
    pub fn load_or_fallback(path: &Path, class_count: usize) -> Self {
        match Self::load(path) {
            Ok(table) => table,
            Err(e) => {
                warn!(error = %e, classes = class_count, "using placeholder gloss labels");
                Self::synthetic(class_count)
            }
        }
    }

    fn parse(json: &str, source: &str) -> Result<Self> {
        let entries: Vec<GlossEntry> =
            serde_json::from_str(json).map_err(|e| GlossError::GlossTable {
                path: source.to_string(),
                message: e.to_string(),
            })?;
        if entries.is_empty() {
            return Err(GlossError::GlossTable {
                path: source.to_string(),
                message: "gloss list is empty".to_string(),
            });
        }

        let labels = entries
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| match entry.gloss {
                Some(gloss) if !gloss.is_empty() => gloss,
                _ => placeholder_label(idx),
            })
            .collect();

        Ok(Self {
            labels,
            synthetic: false,
        })
    }

    /// Label for `index`, if the table has one.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Label for `index`, or `Sign_<index>` when absent.
    pub fn label(&self, index: usize) -> Cow<'_, str> {
        match self.get(index) {
            Some(label) => Cow::Borrowed(label),
            None => Cow::Owned(placeholder_label(index)),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// True when this is a placeholder table rather than a loaded one.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }
}
