//! Breathing technique catalog.
//!
//! A technique carries its instructions as free text; `how_to` is run
//! through the pattern parser to get the phase list the engine needs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PatternError, Result};
use crate::pattern::{parse_pattern, Phase};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technique {
    /// Slug used for lookup.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub how_to: Option<String>,
    #[serde(default)]
    pub after_feel: Option<String>,
    #[serde(default)]
    pub short_desc: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Technique {
    /// Phases parsed from `how_to`. Empty when there are no instructions.
    pub fn phases(&self) -> std::result::Result<Vec<Phase>, PatternError> {
        match self.how_to.as_deref() {
            Some(text) => parse_pattern(text),
            None => Ok(Vec::new()),
        }
    }
}

/// Source of techniques for the front end.
pub trait TechniqueProvider {
    fn fetch_techniques(&self) -> Vec<Technique>;

    fn find_by_slug(&self, slug: &str) -> Option<Technique> {
        self.fetch_techniques().into_iter().find(|t| t.id == slug)
    }
}

/// The techniques shipped with the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

impl BuiltinCatalog {
    pub fn new() -> Self {
        Self
    }
}

impl TechniqueProvider for BuiltinCatalog {
    fn fetch_techniques(&self) -> Vec<Technique> {
        vec![
            builtin(
                "box-breathing",
                "Box Breathing",
                "4-4-4-4 pattern to calm and focus.",
                "Inhale 4s, hold 4s, exhale 4s, hold 4s.",
                &["focus", "calm"],
            ),
            builtin(
                "4-7-8-breathing",
                "4-7-8 Breathing",
                "Great for anxiety and sleep.",
                "Inhale 4s, hold 7s, exhale 8s.",
                &["sleep", "anxiety"],
            ),
            builtin(
                "coherent-breathing",
                "Coherent Breathing",
                "Balance breath with 5s inhale/exhale.",
                "Inhale 5s, exhale 5s.",
                &["balance"],
            ),
            builtin(
                "resonant-breathing",
                "Resonant Breathing",
                "Slow 6-6 pattern to reset nervous system.",
                "Inhale 6s, exhale 6s.",
                &["balance", "calm"],
            ),
            builtin(
                "tactical-breathing",
                "Tactical Breathing",
                "Military-tested 4-4-4-4 cycle.",
                "Inhale 4s, hold 4s, exhale 4s, hold 4s.",
                &["focus", "stress"],
            ),
        ]
    }
}

fn builtin(id: &str, name: &str, short_desc: &str, how_to: &str, categories: &[&str]) -> Technique {
    Technique {
        id: id.into(),
        name: name.into(),
        aliases: Vec::new(),
        level: Some("beginner".into()),
        how_to: Some(how_to.into()),
        after_feel: None,
        short_desc: Some(short_desc.into()),
        description: None,
        categories: categories.iter().map(|c| c.to_string()).collect(),
    }
}

/// Techniques loaded from a JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    path: PathBuf,
    techniques: Vec<Technique>,
}

impl JsonCatalog {
    /// Read and parse `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON array of techniques.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path)?;
        let techniques: Vec<Technique> = serde_json::from_str(&content)?;
        tracing::info!(path = %path.display(), count = techniques.len(), "techniques loaded");
        Ok(Self { path, techniques })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TechniqueProvider for JsonCatalog {
    fn fetch_techniques(&self) -> Vec<Technique> {
        self.techniques.clone()
    }
}
