//! Short model code extraction from verbose model names
//!
//! "Latitude 7490" -> "7490", "Latitude E7470" -> "E7470".

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

static MODEL_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z]?[0-9]{4}[A-Za-z]?").expect("static regex must compile"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelTokenError {
    #[error("No model code found in {0:?}")]
    NotFound(String),
}

/// Canonical short model code used to match catalog display strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelToken(String);

impl ModelToken {
    /// Token that matches nothing
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Extract the first model code from a full model string
    pub fn extract(model: &str) -> Result<Self, ModelTokenError> {
        MODEL_TOKEN_RE
            .find(model)
            .map(|m| Self(m.as_str().to_string()))
            .ok_or_else(|| ModelTokenError::NotFound(model.to_string()))
    }

    /// Every model code present in the string, in order of appearance
    pub fn find_all(model: &str) -> Vec<Self> {
        MODEL_TOKEN_RE
            .find_iter(model)
            .map(|m| Self(m.as_str().to_string()))
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Substring match against a catalog display string.
    /// An empty token never matches.
    pub fn matches(&self, display: &str) -> bool {
        !self.0.is_empty() && display.contains(self.0.as_str())
    }
}

impl fmt::Display for ModelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
