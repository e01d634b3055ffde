//! Map id to scene name lookup, loaded from the client's scene table.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::Result;

pub const UNKNOWN_SCENE: &str = "Unknown";

/// One row of the scene table; fields the lookup does not use are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Scene {
    #[serde(rename = "clientres", default)]
    pub client_res: i32,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "scenenumber", default)]
    pub scene_number: Option<i32>,
    #[serde(rename = "serverid", default)]
    pub server_id: Option<i32>,
    #[serde(rename = "type", default)]
    pub kind: Option<i32>,
}

/// Scenes indexed by client resource id (the map id read from memory).
#[derive(Debug, Clone, Default)]
pub struct SceneTable {
    scenes: Vec<Scene>,
    by_client_res: HashMap<i32, usize>,
}

impl SceneTable {
    pub fn from_scenes(scenes: Vec<Scene>) -> Self {
        let by_client_res = scenes
            .iter()
            .enumerate()
            .filter(|(_, scene)| scene.client_res > 0 && !scene.name.is_empty())
            .map(|(index, scene)| (scene.client_res, index))
            .collect();
        Self {
            scenes,
            by_client_res,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let scenes: Vec<Scene> = serde_json::from_str(json)?;
        Ok(Self::from_scenes(scenes))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let table = Self::from_json(&content)?;
        info!(
            "Loaded {} scenes from {}",
            table.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    /// Load, or fall back to an empty table that names every map "Unknown".
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(table) => table,
            Err(e) => {
                warn!(
                    "Scene table {} not loaded: {}",
                    path.as_ref().display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn get(&self, map_id: i32) -> Option<&Scene> {
        self.by_client_res
            .get(&map_id)
            .map(|&index| &self.scenes[index])
    }

    pub fn name(&self, map_id: i32) -> &str {
        self.get(map_id)
            .map(|scene| scene.name.as_str())
            .unwrap_or(UNKNOWN_SCENE)
    }

    /// Number of indexed scenes.
    pub fn len(&self) -> usize {
        self.by_client_res.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_client_res.is_empty()
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TABLE: &str = r#"[
        {"no": "1", "clientres": 1, "name": "Lạc Dương", "scenenumber": 0},
        {"clientres": 0, "name": "Nowhere"},
        {"clientres": 2, "name": ""},
        {"clientres": 37, "name": "Tô Châu", "PvpRuler": 3}
    ]"#;

    #[test]
    fn test_lookup_skips_unusable_rows() {
        let table = SceneTable::from_json(TABLE).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.scenes().len(), 4);
        assert_eq!(table.name(1), "Lạc Dương");
        assert_eq!(table.name(37), "Tô Châu");
        assert_eq!(table.name(0), UNKNOWN_SCENE);
        assert_eq!(table.name(2), UNKNOWN_SCENE);
        assert_eq!(table.name(99), UNKNOWN_SCENE);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TABLE.as_bytes()).unwrap();
        let table = SceneTable::load(file.path()).unwrap();
        assert_eq!(table.get(37).unwrap().scene_number, None);
        assert_eq!(table.get(1).unwrap().scene_number, Some(0));
    }

    #[test]
    fn test_missing_file_is_empty_table() {
        let table = SceneTable::load_or_empty("/nonexistent/scene.json");
        assert!(table.is_empty());
        assert_eq!(table.name(1), UNKNOWN_SCENE);

        let err = SceneTable::load("/nonexistent/scene.json").unwrap_err();
        assert!(err.is_not_found());
    }
}
