//! Script languages known to both backends

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Script language, with its sandbox language id and local interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Python2,
    JavaScript,
    Shell,
}

impl Language {
    /// All languages the sandbox client accepts
    pub const ALL: [Language; 4] = [
        Language::Python,
        Language::Python2,
        Language::JavaScript,
        Language::Shell,
    ];

    /// Judge0 language id
    pub fn id(self) -> u32 {
        match self {
            Language::Python => 71,
            Language::Python2 => 70,
            Language::JavaScript => 63,
            Language::Shell => 46,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.id() == id)
    }

    /// Guess the language from a script's file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "py" => Some(Language::Python),
            "js" | "mjs" => Some(Language::JavaScript),
            "sh" => Some(Language::Shell),
            _ => None,
        }
    }
}
