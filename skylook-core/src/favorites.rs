use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Ordered list of favorite city names, persisted as a JSON array.
///
/// Names are compared exactly; adding one that is already present is a no-op.
/// Every successful mutation is written back to disk before returning.
#[derive(Debug, Clone)]
pub struct Favorites {
    path: PathBuf,
    names: Vec<String>,
}

impl Favorites {
    /// Read the list at `path`; a missing file is an empty list.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let names = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read favorites file: {}", path.display()))?;
            let raw: Vec<String> = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse favorites file: {}", path.display()))?;
            dedup_in_order(raw)
        } else {
            Vec::new()
        };

        Ok(Self { path, names })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Append `name`; returns `false` when it was already a favorite.
    pub fn add(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return Ok(false);
        }

        self.names.push(name.to_string());
        self.persist()?;
        tracing::info!("Added favorite {name}");
        Ok(true)
    }

    /// Remove `name`; returns `false` when it was not a favorite.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        let before = self.names.len();
        self.names.retain(|n| n != name.trim());
        if self.names.len() == before {
            return Ok(false);
        }

        self.persist()?;
        tracing::info!("Removed favorite {name}");
        Ok(true)
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create favorites directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(&self.names)
            .context("Failed to serialize favorites")?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write favorites file: {}", self.path.display()))
    }
}

fn dedup_in_order(raw: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let favs = Favorites::load(dir.path().join("favorites.json")).unwrap();
        assert!(favs.names().is_empty());
    }

    #[test]
    fn repeated_adds_keep_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut favs = Favorites::load(dir.path().join("favorites.json")).unwrap();

        assert!(favs.add("Paris").unwrap());
        for _ in 0..5 {
            assert!(!favs.add("Paris").unwrap());
        }
        assert!(favs.add("Oslo").unwrap());

        assert_eq!(favs.names(), ["Paris", "Oslo"]);
    }

    #[test]
    fn match_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let mut favs = Favorites::load(dir.path().join("favorites.json")).unwrap();

        favs.add("Paris").unwrap();
        favs.add("paris").unwrap();
        assert_eq!(favs.names().len(), 2);
    }

    #[test]
    fn mutations_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("favorites.json");

        let mut favs = Favorites::load(&path).unwrap();
        favs.add("Lisbon").unwrap();
        favs.add("Tokyo").unwrap();
        favs.add("Lima").unwrap();
        assert!(favs.remove("Tokyo").unwrap());
        assert!(!favs.remove("Tokyo").unwrap());

        let reloaded = Favorites::load(&path).unwrap();
        assert_eq!(reloaded.names(), ["Lisbon", "Lima"]);
        assert!(reloaded.contains("Lima"));
    }

    #[test]
    fn duplicates_on_disk_are_collapsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        fs::write(&path, r#"["Rome","Oslo","Rome"]"#).unwrap();

        let favs = Favorites::load(&path).unwrap();
        assert_eq!(favs.names(), ["Rome", "Oslo"]);
    }

    #[test]
    fn blank_names_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut favs = Favorites::load(dir.path().join("favorites.json")).unwrap();
        assert!(!favs.add("   ").unwrap());
        assert!(!dir.path().join("favorites.json").exists());
    }
}
