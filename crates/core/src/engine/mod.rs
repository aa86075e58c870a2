use std::fmt;

use serde::Serialize;

use crate::{
    assets::AssetTable,
    audio::{AudioPlayer, PlaybackClock},
    config::EngineConfig,
    geometry::{self, GeometryGenerator, Mesh},
    mapping::{GeometryComplexity, VisualTarget},
    render::{keys, Display, MaterialSink, MeshSink},
    smoothing::{ParameterSmoother, SmoothedValues},
    timeline::{classify, Phase},
    transition::{ChannelValues, TransitionJob, TransitionScheduler},
    MandalaError, PhaseBoundaries, PhaseVisualTable, Result,
};

/// Emission is the base colour pushed past 1.0 so bloom picks it up.
const EMISSION_BOOST: f32 = 2.0;

/// Counters describing what the engine has done since construction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub ticks: u64,
    pub phase_changes: u64,
    pub transitions_started: u64,
    pub mesh_rebuilds: u64,
}

/// Outcome of a single [`MandalaEngine::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub playback_seconds: f32,
    pub phase: Phase,
    pub phase_changed: bool,
    pub transition_running: bool,
    /// Values pushed to the material sink this tick, with any running
    /// transition already applied to scale and alpha.
    pub values: SmoothedValues,
}

#[derive(Debug, Default, Clone, Copy)]
struct PendingOutputs {
    mesh: bool,
    asset: bool,
    shader: bool,
}

impl PendingOutputs {
    fn all() -> Self {
        Self {
            mesh: true,
            asset: true,
            shader: true,
        }
    }
}

/// Frame-driven orchestrator tying playback time to the mandala's look.
///
/// The host calls [`tick`](Self::tick) once per frame. Each tick classifies
/// the playback position, reacts to phase changes (new smoothing targets, a
/// fresh transition, geometry and artwork), then advances the smoother and
/// the transition scheduler and pushes the result to whichever output
/// collaborators are attached. Missing collaborators are skipped.
pub struct MandalaEngine<P: AudioPlayer = PlaybackClock> {
    player: P,
    config: EngineConfig,
    smoother: ParameterSmoother,
    scheduler: TransitionScheduler,
    geometry: GeometryGenerator,
    phase: Phase,
    complexity_override: Option<GeometryComplexity>,
    animation_time: f32,
    last_values: SmoothedValues,
    pending: PendingOutputs,
    stats: EngineStats,
    materials: Option<Box<dyn MaterialSink>>,
    meshes: Option<Box<dyn MeshSink>>,
    display: Option<Box<dyn Display>>,
    assets: Option<Box<dyn AssetTable>>,
}

impl<P: AudioPlayer> MandalaEngine<P> {
    pub fn new(player: P, config: EngineConfig) -> Result<Self> {
        validate_table_geometry(&config.table, &config)?;

        let smoother = ParameterSmoother::new(config.smoothing);
        let geometry = GeometryGenerator::new(config.geometry);
        let mut engine = Self {
            player,
            last_values: smoother.current_values(),
            smoother,
            scheduler: TransitionScheduler::new(),
            geometry,
            phase: Phase::INITIAL,
            complexity_override: None,
            animation_time: 0.0,
            pending: PendingOutputs::all(),
            stats: EngineStats::default(),
            materials: None,
            meshes: None,
            display: None,
            assets: None,
            config,
        };
        engine.reset_visuals();
        Ok(engine)
    }

    pub fn with_material_sink(mut self, sink: impl MaterialSink + 'static) -> Self {
        self.materials = Some(Box::new(sink));
        self
    }

    pub fn with_mesh_sink(mut self, sink: impl MeshSink + 'static) -> Self {
        self.meshes = Some(Box::new(sink));
        self.pending.mesh = true;
        self
    }

    pub fn with_display(mut self, display: impl Display + 'static) -> Self {
        self.display = Some(Box::new(display));
        self.pending.asset = true;
        self
    }

    pub fn with_assets(mut self, assets: impl AssetTable + 'static) -> Self {
        self.assets = Some(Box::new(assets));
        self.pending.asset = true;
        self
    }

    /// Replaces the phase timeline and visual table, then resets the
    /// animation to the initial phase. Invalid input leaves the engine
    /// untouched.
    pub fn configure(&mut self, boundaries: PhaseBoundaries, table: PhaseVisualTable) -> Result<()> {
        validate_table_geometry(&table, &self.config)?;
        self.config.boundaries = boundaries;
        self.config.table = table;
        tracing::info!("engine reconfigured");
        self.reset_visuals();
        Ok(())
    }

    pub fn start(&mut self) {
        tracing::info!(at = self.player.current_time(), "playback started");
        self.player.play();
    }

    pub fn pause(&mut self) {
        tracing::info!(at = self.player.current_time(), "playback paused");
        self.player.pause();
    }

    /// Stops playback and snaps the visuals back to the initial phase.
    pub fn stop(&mut self) {
        tracing::info!("playback stopped");
        self.player.stop();
        self.reset_visuals();
    }

    /// Pins geometry to the given complexity regardless of phase. Phase
    /// changes still rebuild the pinned rings with the new radius intensity.
    ///
    /// Rejected values keep both the current mesh and any earlier override.
    pub fn set_complexity_override(&mut self, segments: u32, layers: u32) -> Result<()> {
        let complexity = GeometryComplexity::new(segments, layers);
        complexity.validate()?;
        let intensity = self.target().radius_intensity;
        self.geometry.regenerate(complexity, intensity)?;
        self.stats.mesh_rebuilds += 1;
        self.complexity_override = Some(complexity);
        self.pending.mesh = true;
        Ok(())
    }

    /// Hands geometry back to the phase table.
    pub fn clear_complexity_override(&mut self) {
        if self.complexity_override.take().is_some() {
            self.rebuild_geometry();
        }
    }

    /// Reads the player position and advances the engine by one frame.
    pub fn tick(&mut self, delta_seconds: f32) -> TickReport {
        let playback_seconds = self.player.current_time();
        self.tick_at(playback_seconds, delta_seconds)
    }

    /// Advances one frame at an explicit playback position.
    pub fn tick_at(&mut self, playback_seconds: f32, delta_seconds: f32) -> TickReport {
        let delta_seconds = if delta_seconds.is_finite() {
            delta_seconds.max(0.0)
        } else {
            0.0
        };
        self.stats.ticks += 1;

        let phase = classify(playback_seconds, &self.config.boundaries);
        let phase_changed = phase != self.phase;
        if phase_changed {
            self.enter_phase(phase, playback_seconds);
        }

        self.smoother.advance(delta_seconds);
        let transition_running = self.scheduler.tick(delta_seconds);

        let mut values = self.smoother.current_values();
        if let Some(driven) = self.scheduler.output() {
            values.scale = driven.scale;
            values.alpha = driven.alpha;
            if !transition_running {
                self.smoother
                    .set_current_scale_alpha(driven.scale, driven.alpha);
            }
        }
        self.animation_time += delta_seconds;
        self.last_values = values;

        self.flush_pending();
        self.push_frame(&values);

        TickReport {
            playback_seconds,
            phase,
            phase_changed,
            transition_running,
            values,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Values pushed by the most recent tick (or the reset values before the
    /// first tick).
    pub fn current_values(&self) -> SmoothedValues {
        self.last_values
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.geometry.mesh()
    }

    pub fn complexity(&self) -> Option<GeometryComplexity> {
        self.geometry.complexity()
    }

    pub fn complexity_override(&self) -> Option<GeometryComplexity> {
        self.complexity_override
    }

    pub fn is_transition_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    fn target(&self) -> &VisualTarget {
        self.config.table.lookup(self.phase)
    }

    fn enter_phase(&mut self, phase: Phase, playback_seconds: f32) {
        tracing::info!(from = %self.phase, to = %phase, at = playback_seconds, "phase changed");

        let target = self.config.table.lookup(phase).clone();
        let shown = self.scheduler.output().unwrap_or_else(|| {
            let current = self.smoother.current_values();
            ChannelValues::new(current.scale, current.alpha)
        });

        self.smoother.set_targets(
            target.scale,
            target.base_color,
            target.angular_velocity,
            target.alpha,
        );
        self.scheduler.start(TransitionJob::from_style(
            target.transition,
            shown,
            ChannelValues::new(target.scale, target.alpha),
            &self.config.transition,
        ));

        self.phase = phase;
        self.stats.phase_changes += 1;
        self.stats.transitions_started += 1;
        self.pending.asset = true;
        self.pending.shader = true;

        self.rebuild_geometry();
    }

    fn reset_visuals(&mut self) {
        self.phase = Phase::INITIAL;
        let target = self.target();
        let (scale, color, angular_velocity, alpha) =
            (target.scale, target.base_color, target.angular_velocity, target.alpha);

        self.smoother.reset_to(scale, color, angular_velocity, alpha);
        self.scheduler.cancel();
        self.animation_time = 0.0;
        self.last_values = self.smoother.current_values();
        self.pending = PendingOutputs::all();
        self.rebuild_geometry();
    }

    fn rebuild_geometry(&mut self) {
        let target = self.target();
        let complexity = self.complexity_override.unwrap_or(target.complexity);
        let intensity = target.radius_intensity;

        if self.geometry.regenerate(complexity, intensity).is_ok() {
            self.stats.mesh_rebuilds += 1;
            self.pending.mesh = true;
        }
    }

    fn flush_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        let target = self.config.table.lookup(self.phase);

        if pending.mesh {
            if let (Some(sink), Some(mesh)) = (self.meshes.as_mut(), self.geometry.mesh()) {
                sink.set_mesh(mesh);
            }
        }

        if pending.asset {
            if let (Some(assets), Some(display)) = (self.assets.as_ref(), self.display.as_mut()) {
                match assets.get(&target.asset_key) {
                    Some(handle) => {
                        display.show(&handle, self.config.transition.duration_seconds)
                    }
                    None => tracing::warn!(
                        key = %target.asset_key,
                        phase = %self.phase,
                        "no asset registered for phase"
                    ),
                }
            }
        }

        if pending.shader {
            if let Some(materials) = self.materials.as_mut() {
                let preset = target.shader.clamped();
                materials.set_color(keys::ACCENT_COLOR, preset.accent_color);
                materials.set_float(keys::PATTERN_INTENSITY, preset.pattern_intensity);
                materials.set_float(keys::PATTERN_SCALE, preset.pattern_scale);
                materials.set_float(keys::PATTERN_SPEED, preset.pattern_speed);
                materials.set_float(keys::GLOW_INTENSITY, preset.glow_intensity);
            }
        }
    }

    fn push_frame(&mut self, values: &SmoothedValues) {
        let Some(materials) = self.materials.as_mut() else {
            return;
        };
        materials.set_color(keys::BASE_COLOR, values.color);
        materials.set_color(keys::EMISSION_COLOR, values.color.boosted(EMISSION_BOOST));
        materials.set_float(keys::ALPHA, values.alpha);
        materials.set_float(keys::SCALE, values.scale);
        materials.set_float(keys::ROTATION, values.angle);
        materials.set_float(keys::TIME, self.animation_time);
    }
}

/// Checks that every phase's ring is buildable with the configured radii.
fn validate_table_geometry(table: &PhaseVisualTable, config: &EngineConfig) -> Result<()> {
    for (phase, target) in table.iter() {
        let outer = config.geometry.outer_radius * (1.0 + target.radius_intensity);
        geometry::validate_ring(target.complexity.segments, outer, config.geometry.inner_radius)
            .map_err(|err| MandalaError::InvalidVisualTarget {
                phase,
                reason: err.to_string(),
            })?;
    }
    Ok(())
}

impl<P: AudioPlayer + fmt::Debug> fmt::Debug for MandalaEngine<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MandalaEngine")
            .field("player", &self.player)
            .field("phase", &self.phase)
            .field("complexity_override", &self.complexity_override)
            .field("transition_running", &self.scheduler.is_running())
            .field("animation_time", &self.animation_time)
            .field("stats", &self.stats)
            .field("materials", &self.materials.is_some())
            .field("meshes", &self.meshes.is_some())
            .field("display", &self.display.is_some())
            .field("assets", &self.assets.is_some())
            .finish()
    }
}
