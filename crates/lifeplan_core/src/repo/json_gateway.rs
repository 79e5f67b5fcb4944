//! JSON file persistence gateway.
//!
//! # Invariants
//! - A missing file loads as an empty tree.
//! - Saves write a sibling temp file and rename it over the target, so a
//!   reader never sees a half-written document.

use super::gateway::{GatewayResult, PersistenceGateway};
use super::records::RoadmapRecords;
use crate::model::tree::Tree;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Stores the flat record collections as one pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileGateway {
    path: PathBuf,
}

impl JsonFileGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PersistenceGateway for JsonFileGateway {
    fn backend(&self) -> &'static str {
        "json"
    }

    fn try_load(&self) -> GatewayResult<Tree> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Tree::default()),
            Err(err) => return Err(err.into()),
        };
        if text.trim().is_empty() {
            return Ok(Tree::default());
        }
        let records: RoadmapRecords = serde_json::from_str(&text)?;
        records.into_tree()
    }

    fn try_save(&self, tree: &Tree) -> GatewayResult<()> {
        let json = serde_json::to_string_pretty(&RoadmapRecords::from_tree(tree))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = self.temp_path();
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}
