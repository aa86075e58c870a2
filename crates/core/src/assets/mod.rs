use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{mapping::AssetKey, timeline::Phase, MandalaError, PhaseVisualTable, Result};

/// Reference to a loaded image or sprite owned by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetHandle {
    pub key: AssetKey,
    pub path: String,
}

impl AssetHandle {
    pub fn new(key: AssetKey, path: impl Into<String>) -> Self {
        Self {
            key,
            path: path.into(),
        }
    }
}

/// Resolves the artwork shown for a phase.
pub trait AssetTable {
    fn get(&self, key: &AssetKey) -> Option<AssetHandle>;
}

/// In-memory registry of phase artwork.
#[derive(Debug, Default, Clone)]
pub struct AssetStore {
    handles: HashMap<AssetKey, AssetHandle>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }

    /// Registers `<directory>/<phase>.png` for every phase.
    pub fn with_phase_images(directory: &str) -> Self {
        let mut store = Self::new();
        let directory = directory.trim_end_matches('/');
        for phase in Phase::ALL {
            let key = AssetKey::from(phase);
            let path = format!("{directory}/{key}.png");
            store.register(AssetHandle::new(key, path));
        }
        store
    }

    pub fn register(&mut self, handle: AssetHandle) {
        self.handles.insert(handle.key.clone(), handle);
    }

    /// Checks that every asset key referenced by `table` is registered.
    pub fn resolve_table(&self, table: &PhaseVisualTable) -> Result<()> {
        for (phase, target) in table.iter() {
            if !self.handles.contains_key(&target.asset_key) {
                return Err(MandalaError::msg(format!(
                    "unknown asset `{}` referenced by {phase}",
                    target.asset_key
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl AssetTable for AssetStore {
    fn get(&self, key: &AssetKey) -> Option<AssetHandle> {
        self.handles.get(key).cloned()
    }
}
