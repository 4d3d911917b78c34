use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Upper bound on the number of suggestions returned for one input.
pub const MAX_SUGGESTIONS: usize = 10;

const BUILTIN_CITIES: &str = include_str!("../data/cities.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityEntry {
    pub name: String,
    pub country: String,
}

/// Static city -> country table used to complete user input.
#[derive(Debug, Clone, Default)]
pub struct CityDirectory {
    entries: Vec<CityEntry>,
}

impl CityDirectory {
    pub fn new(entries: Vec<CityEntry>) -> Self {
        Self { entries }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<CityEntry> =
            serde_json::from_str(json).context("Failed to parse city table")?;
        Ok(Self::new(entries))
    }

    /// The table shipped with the crate, parsed on first use.
    pub fn builtin() -> &'static CityDirectory {
        static DIRECTORY: OnceLock<CityDirectory> = OnceLock::new();
        DIRECTORY.get_or_init(|| {
            Self::from_json(BUILTIN_CITIES).unwrap_or_else(|e| {
                tracing::warn!("Built-in city table unusable: {e:#}");
                Self::default()
            })
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cities whose name starts with `input`, ignoring case, in table order.
    pub fn suggest(&self, input: &str) -> Vec<&CityEntry> {
        let needle = input.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.entries
            .iter()
            .filter(|entry| entry.name.to_lowercase().starts_with(&needle))
            .take(MAX_SUGGESTIONS)
            .collect()
    }
}
