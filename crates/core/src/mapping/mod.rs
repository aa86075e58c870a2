use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{timeline::Phase, transition::TransitionStyle, MandalaError, Result};

/// Linear RGBA colour with components nominally in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Scales the colour channels while leaving alpha untouched.
    pub fn boosted(self, factor: f32) -> Rgba {
        Rgba {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
            a: self.a,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

/// Typed key used to look up the artwork shown for a phase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetKey(String);

impl AssetKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Phase> for AssetKey {
    fn from(phase: Phase) -> Self {
        Self::new(phase.as_str())
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ring tessellation settings: angular segments and concentric layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryComplexity {
    pub segments: u32,
    pub layers: u32,
}

impl GeometryComplexity {
    pub const MIN_SEGMENTS: u32 = 3;
    pub const MAX_SEGMENTS: u32 = 360;
    pub const MIN_LAYERS: u32 = 1;
    pub const MAX_LAYERS: u32 = 10;

    pub const fn new(segments: u32, layers: u32) -> Self {
        Self { segments, layers }
    }

    pub fn validate(&self) -> Result<()> {
        if !(Self::MIN_SEGMENTS..=Self::MAX_SEGMENTS).contains(&self.segments) {
            return Err(MandalaError::geometry(format!(
                "segment count {} outside [{}, {}]",
                self.segments,
                Self::MIN_SEGMENTS,
                Self::MAX_SEGMENTS
            )));
        }
        if !(Self::MIN_LAYERS..=Self::MAX_LAYERS).contains(&self.layers) {
            return Err(MandalaError::geometry(format!(
                "layer count {} outside [{}, {}]",
                self.layers,
                Self::MIN_LAYERS,
                Self::MAX_LAYERS
            )));
        }
        Ok(())
    }
}

/// Shader pattern settings written once per phase change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShaderPreset {
    pub accent_color: Rgba,
    pub pattern_intensity: f32,
    pub pattern_scale: f32,
    pub pattern_speed: f32,
    pub glow_intensity: f32,
}

impl ShaderPreset {
    /// Copy of the preset with every value clamped to the range the shader
    /// accepts.
    pub fn clamped(&self) -> ShaderPreset {
        ShaderPreset {
            accent_color: self.accent_color,
            pattern_intensity: self.pattern_intensity.clamp(0.0, 5.0),
            pattern_scale: self.pattern_scale.clamp(0.0, 10.0),
            pattern_speed: self.pattern_speed.clamp(0.0, 5.0),
            glow_intensity: self.glow_intensity.clamp(0.0, 1.0),
        }
    }
}

/// Everything the engine needs to render a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualTarget {
    pub base_color: Rgba,
    pub scale: f32,
    /// Rotation speed in degrees per second.
    pub angular_velocity: f32,
    pub alpha: f32,
    pub asset_key: AssetKey,
    pub complexity: GeometryComplexity,
    /// Outer ring radius multiplier, applied as `radius * (1 + intensity)`.
    #[serde(default)]
    pub radius_intensity: f32,
    pub transition: TransitionStyle,
    pub shader: ShaderPreset,
}

impl VisualTarget {
    fn validate(&self, phase: Phase) -> Result<()> {
        let invalid = |reason: String| MandalaError::InvalidVisualTarget { phase, reason };

        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(invalid(format!("scale {} must be positive", self.scale)));
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(invalid(format!("alpha {} outside [0, 1]", self.alpha)));
        }
        if !self.angular_velocity.is_finite() {
            return Err(invalid("angular velocity must be finite".to_string()));
        }
        if !self.base_color.is_finite() {
            return Err(invalid("base colour must be finite".to_string()));
        }
        if !self.radius_intensity.is_finite() || self.radius_intensity < 0.0 {
            return Err(invalid(format!(
                "radius intensity {} must be non-negative",
                self.radius_intensity
            )));
        }
        self.complexity
            .validate()
            .map_err(|err| invalid(err.to_string()))
    }
}

/// Total mapping from [`Phase`] to its [`VisualTarget`].
///
/// Construction rejects tables that miss a phase, so [`lookup`] never fails.
///
/// [`lookup`]: PhaseVisualTable::lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Phase, VisualTarget>",
    into = "BTreeMap<Phase, VisualTarget>"
)]
pub struct PhaseVisualTable {
    entries: [VisualTarget; 6],
}

impl PhaseVisualTable {
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Phase, VisualTarget)>,
    {
        let mut slots: [Option<VisualTarget>; 6] = Default::default();
        for (phase, target) in entries {
            target.validate(phase)?;
            slots[phase.index()] = Some(target);
        }

        let mut resolved = Vec::with_capacity(Phase::ALL.len());
        for phase in Phase::ALL {
            let target = slots[phase.index()]
                .take()
                .ok_or(MandalaError::MissingVisualTarget(phase))?;
            resolved.push(target);
        }

        let entries: [VisualTarget; 6] = resolved
            .try_into()
            .map_err(|_| MandalaError::msg("visual table must hold one entry per phase"))?;
        Ok(Self { entries })
    }

    pub fn lookup(&self, phase: Phase) -> &VisualTarget {
        &self.entries[phase.index()]
    }

    /// Returns a copy of the table with `phase` remapped to `target`.
    pub fn with_entry(&self, phase: Phase, target: VisualTarget) -> Result<Self> {
        target.validate(phase)?;
        let mut table = self.clone();
        table.entries[phase.index()] = target;
        Ok(table)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Phase, &VisualTarget)> {
        Phase::ALL.into_iter().zip(self.entries.iter())
    }
}

impl Default for PhaseVisualTable {
    fn default() -> Self {
        Self {
            entries: [
                VisualTarget {
                    base_color: Rgba::rgb(0.2, 0.4, 0.8),
                    scale: 0.7,
                    angular_velocity: 10.0,
                    alpha: 1.0,
                    asset_key: Phase::Emergence.into(),
                    complexity: GeometryComplexity::new(8, 3),
                    radius_intensity: DEFAULT_RADIUS_INTENSITY,
                    transition: TransitionStyle::FadeInAndGrow,
                    shader: ShaderPreset {
                        accent_color: Rgba::new(0.3, 0.5, 0.9, 0.7),
                        pattern_intensity: 0.5,
                        pattern_scale: 1.5,
                        pattern_speed: 0.5,
                        glow_intensity: 0.2,
                    },
                },
                VisualTarget {
                    base_color: Rgba::rgb(0.2, 0.7, 0.8),
                    scale: 1.0,
                    angular_velocity: 20.0,
                    alpha: 1.0,
                    asset_key: Phase::Curiosity.into(),
                    complexity: GeometryComplexity::new(10, 4),
                    radius_intensity: DEFAULT_RADIUS_INTENSITY,
                    transition: TransitionStyle::Dissolve,
                    shader: ShaderPreset {
                        accent_color: Rgba::new(0.3, 0.8, 0.7, 0.8),
                        pattern_intensity: 1.0,
                        pattern_scale: 2.0,
                        pattern_speed: 0.8,
                        glow_intensity: 0.4,
                    },
                },
                VisualTarget {
                    base_color: Rgba::new(0.4, 0.6, 0.2, 0.9),
                    scale: 1.2,
                    angular_velocity: 30.0,
                    alpha: 1.0,
                    asset_key: Phase::Buildup.into(),
                    complexity: GeometryComplexity::new(12, 5),
                    radius_intensity: DEFAULT_RADIUS_INTENSITY,
                    transition: TransitionStyle::Dissolve,
                    shader: ShaderPreset {
                        accent_color: Rgba::new(0.7, 0.6, 0.2, 0.9),
                        pattern_intensity: 2.0,
                        pattern_scale: 3.0,
                        pattern_speed: 1.2,
                        glow_intensity: 0.6,
                    },
                },
                VisualTarget {
                    base_color: Rgba::rgb(0.9, 0.4, 0.1),
                    scale: 1.5,
                    angular_velocity: 40.0,
                    alpha: 1.0,
                    asset_key: Phase::Peak.into(),
                    complexity: GeometryComplexity::new(16, 8),
                    radius_intensity: DEFAULT_RADIUS_INTENSITY,
                    transition: TransitionStyle::Dissolve,
                    shader: ShaderPreset {
                        accent_color: Rgba::new(1.0, 0.7, 0.0, 1.0),
                        pattern_intensity: 4.0,
                        pattern_scale: 4.0,
                        pattern_speed: 2.0,
                        glow_intensity: 1.0,
                    },
                },
                VisualTarget {
                    base_color: Rgba::rgb(0.6, 0.4, 0.8),
                    scale: 1.2,
                    angular_velocity: 15.0,
                    alpha: 1.0,
                    asset_key: Phase::Descent.into(),
                    complexity: GeometryComplexity::new(10, 5),
                    radius_intensity: DEFAULT_RADIUS_INTENSITY,
                    transition: TransitionStyle::Dissolve,
                    shader: ShaderPreset {
                        accent_color: Rgba::new(0.5, 0.3, 0.9, 0.9),
                        pattern_intensity: 2.0,
                        pattern_scale: 3.0,
                        pattern_speed: 1.0,
                        glow_intensity: 0.7,
                    },
                },
                VisualTarget {
                    base_color: Rgba::rgb(0.9, 0.9, 1.0),
                    scale: 0.8,
                    angular_velocity: 5.0,
                    alpha: 0.0,
                    asset_key: Phase::Resolution.into(),
                    complexity: GeometryComplexity::new(6, 2),
                    radius_intensity: DEFAULT_RADIUS_INTENSITY,
                    transition: TransitionStyle::FadeOutAndShrink,
                    shader: ShaderPreset {
                        accent_color: Rgba::new(1.0, 1.0, 1.0, 0.8),
                        pattern_intensity: 0.7,
                        pattern_scale: 1.0,
                        pattern_speed: 0.3,
                        glow_intensity: 0.5,
                    },
                },
            ],
        }
    }
}

const DEFAULT_RADIUS_INTENSITY: f32 = 0.3;

impl TryFrom<BTreeMap<Phase, VisualTarget>> for PhaseVisualTable {
    type Error = MandalaError;

    fn try_from(value: BTreeMap<Phase, VisualTarget>) -> Result<Self> {
        Self::from_entries(value)
    }
}

impl From<PhaseVisualTable> for BTreeMap<Phase, VisualTarget> {
    fn from(value: PhaseVisualTable) -> Self {
        Phase::ALL.into_iter().zip(value.entries).collect()
    }
}
