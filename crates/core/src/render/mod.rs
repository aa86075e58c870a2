use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::{assets::AssetHandle, geometry::Mesh, mapping::Rgba};

/// Material property names understood by the mandala shader.
pub mod keys {
    pub const BASE_COLOR: &str = "_BaseColor";
    pub const EMISSION_COLOR: &str = "_EmissionColor";
    pub const ACCENT_COLOR: &str = "_AccentColor";
    pub const PATTERN_INTENSITY: &str = "_PatternIntensity";
    pub const PATTERN_SCALE: &str = "_PatternScale";
    pub const PATTERN_SPEED: &str = "_PatternSpeed";
    pub const GLOW_INTENSITY: &str = "_GlowIntensity";
    pub const TIME: &str = "_Time";
    pub const ALPHA: &str = "_Alpha";
    pub const SCALE: &str = "_Scale";
    pub const ROTATION: &str = "_Rotation";
}

/// Receives named shader and transform properties.
pub trait MaterialSink {
    fn set_color(&mut self, key: &str, color: Rgba);
    fn set_float(&mut self, key: &str, value: f32);
}

/// Receives freshly generated geometry.
pub trait MeshSink {
    fn set_mesh(&mut self, mesh: &Mesh);
}

/// Shows phase artwork, cross-fading over `transition_seconds`.
pub trait Display {
    fn show(&mut self, asset: &AssetHandle, transition_seconds: f32);
}

impl<T: MaterialSink + ?Sized> MaterialSink for Rc<RefCell<T>> {
    fn set_color(&mut self, key: &str, color: Rgba) {
        self.borrow_mut().set_color(key, color);
    }

    fn set_float(&mut self, key: &str, value: f32) {
        self.borrow_mut().set_float(key, value);
    }
}

impl<T: MeshSink + ?Sized> MeshSink for Rc<RefCell<T>> {
    fn set_mesh(&mut self, mesh: &Mesh) {
        self.borrow_mut().set_mesh(mesh);
    }
}

impl<T: Display + ?Sized> Display for Rc<RefCell<T>> {
    fn show(&mut self, asset: &AssetHandle, transition_seconds: f32) {
        self.borrow_mut().show(asset, transition_seconds);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaterialValue {
    Color(Rgba),
    Float(f32),
}

/// A single property write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialUpdate {
    pub key: String,
    pub value: MaterialValue,
}

/// Headless render surface that records everything pushed to it. Serves as
/// the material, mesh and display target for tooling and tests.
#[derive(Debug, Default)]
pub struct RenderGraph {
    properties: BTreeMap<String, MaterialValue>,
    last_updates: Vec<MaterialUpdate>,
    mesh: Option<Mesh>,
    mesh_updates: usize,
    shown: Vec<(AssetHandle, f32)>,
}

impl RenderGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a new graph for sharing between the engine and its host.
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    fn record(&mut self, key: &str, value: MaterialValue) {
        self.properties.insert(key.to_string(), value);
        self.last_updates.push(MaterialUpdate {
            key: key.to_string(),
            value,
        });
    }

    /// Forgets the per-frame update log while keeping the latest values.
    pub fn clear_updates(&mut self) {
        self.last_updates.clear();
    }

    pub fn updates(&self) -> &[MaterialUpdate] {
        &self.last_updates
    }

    pub fn color(&self, key: &str) -> Option<Rgba> {
        match self.properties.get(key) {
            Some(MaterialValue::Color(color)) => Some(*color),
            _ => None,
        }
    }

    pub fn float(&self, key: &str) -> Option<f32> {
        match self.properties.get(key) {
            Some(MaterialValue::Float(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    pub fn mesh_updates(&self) -> usize {
        self.mesh_updates
    }

    /// Every asset shown so far, oldest first.
    pub fn shown(&self) -> &[(AssetHandle, f32)] {
        &self.shown
    }
}

impl MaterialSink for RenderGraph {
    fn set_color(&mut self, key: &str, color: Rgba) {
        self.record(key, MaterialValue::Color(color));
    }

    fn set_float(&mut self, key: &str, value: f32) {
        self.record(key, MaterialValue::Float(value));
    }
}

impl MeshSink for RenderGraph {
    fn set_mesh(&mut self, mesh: &Mesh) {
        self.mesh = Some(mesh.clone());
        self.mesh_updates += 1;
    }
}

impl Display for RenderGraph {
    fn show(&mut self, asset: &AssetHandle, transition_seconds: f32) {
        self.shown.push((asset.clone(), transition_seconds));
    }
}
