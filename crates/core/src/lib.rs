//! Core library for the mandala visualiser.
//!
//! The engine maps the playback position of an audio track onto an ordered
//! set of phases and animates a procedurally generated mandala between the
//! looks assigned to each phase. Everything is driven by one synchronous
//! [`MandalaEngine::tick`] call per frame; audio playback, rendering and
//! artwork live behind the collaborator traits in [`audio`], [`render`] and
//! [`assets`].

pub mod assets;
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod mapping;
pub mod render;
pub mod smoothing;
pub mod timeline;
pub mod transition;

pub use assets::{AssetHandle, AssetStore, AssetTable};
pub use audio::{AudioPlayer, PlaybackClock};
pub use config::{AppConfig, EngineConfig};
pub use engine::{EngineStats, MandalaEngine, TickReport};
pub use error::{MandalaError, Result};
pub use geometry::{generate, GeometryConfig, GeometryGenerator, Mesh};
pub use mapping::{AssetKey, GeometryComplexity, PhaseVisualTable, Rgba, ShaderPreset, VisualTarget};
pub use render::{Display, MaterialSink, MeshSink, RenderGraph};
pub use smoothing::{ParameterSmoother, SmoothedValues, SmoothingConfig};
pub use timeline::{classify, Phase, PhaseBoundaries, PhaseBoundary};
pub use transition::{
    ChannelValues, TransitionConfig, TransitionJob, TransitionScheduler, TransitionStyle,
};
