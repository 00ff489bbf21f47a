use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pipeline::error::PathError;

/// One hop from a parent to a child element.
///
/// `index` counts every element child of the parent, not only the ones
/// sharing `tag`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathStep {
    pub tag: String,
    pub index: usize,
}

impl PathStep {
    pub fn new(tag: &str, index: usize) -> Self {
        Self {
            tag: tag.to_ascii_uppercase(),
            index,
        }
    }
}

/// Ordered steps from a root element (exclusive) down to a target (inclusive).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuralPath(Vec<PathStep>);

impl StructuralPath {
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self(steps)
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical key used by the reverse page index.
    ///
    /// Steps are written as `index:TAG` joined by `/`. Tag names never
    /// contain `/` and the index never contains `:`, so the encoding is
    /// lossless.
    pub fn key(&self) -> String {
        self.0
            .iter()
            .map(|step| format!("{}:{}", step.index, step.tag))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Decode a key produced by [`StructuralPath::key`].
    pub fn from_key(key: &str) -> Result<Self, PathError> {
        if key.is_empty() {
            return Ok(Self::default());
        }

        let mut steps = Vec::new();
        for (position, raw) in key.split('/').enumerate() {
            let (index, tag) = raw.split_once(':').ok_or_else(|| PathError::MalformedKey {
                key: key.to_string(),
                message: format!("step {} has no ':' separator", position),
            })?;

            let index = index.parse::<usize>().map_err(|e| PathError::MalformedKey {
                key: key.to_string(),
                message: format!("step {} index: {}", position, e),
            })?;

            if tag.is_empty() {
                return Err(PathError::EmptyTag { position });
            }

            steps.push(PathStep {
                tag: tag.to_string(),
                index,
            });
        }
        Ok(Self(steps))
    }
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        let rendered: Vec<String> = self
            .0
            .iter()
            .map(|step| format!("{}[{}]", step.tag, step.index))
            .collect();
        write!(f, "{}", rendered.join(" > "))
    }
}

impl From<Vec<PathStep>> for StructuralPath {
    fn from(steps: Vec<PathStep>) -> Self {
        Self(steps)
    }
}
