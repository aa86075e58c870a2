use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mandala_visualiser_core::{
    render::keys, AppConfig, AssetHandle, AssetStore, AudioPlayer, Display, MandalaEngine, Mesh,
    MeshSink, PlaybackClock, RenderGraph,
};
use tracing_subscriber::EnvFilter;

/// Extra playback simulated after the last phase boundary.
const TAIL_SECONDS: f32 = 30.0;

fn main() -> mandala_visualiser_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            duration,
            fps,
            assets,
        } => run_simulate(config.as_ref(), duration, fps, &assets),
        Commands::DefaultConfig => run_default_config(),
        Commands::Mesh {
            segments,
            outer,
            inner,
        } => run_mesh(segments, outer, inner),
    }
}

fn run_simulate(
    config: Option<&PathBuf>,
    duration: Option<f32>,
    fps: u32,
    assets: &str,
) -> mandala_visualiser_core::Result<()> {
    let config = match config {
        Some(path) => {
            tracing::info!(?path, "loading configuration");
            AppConfig::load(path)?
        }
        None => AppConfig::default(),
    };

    let last_boundary = config
        .engine
        .boundaries
        .as_slice()
        .last()
        .map(|boundary| boundary.start_seconds)
        .unwrap_or(0.0);
    let duration = duration.unwrap_or(last_boundary + TAIL_SECONDS);
    let fps = fps.max(1);
    let delta = 1.0 / fps as f32;

    tracing::info!(duration, fps, "starting simulation");

    let store = AssetStore::with_phase_images(assets);
    if let Err(err) = store.resolve_table(&config.engine.table) {
        tracing::warn!(%err, "some phases have no artwork");
    }

    let materials = RenderGraph::shared();
    let mut engine = MandalaEngine::new(PlaybackClock::with_duration(duration), config.engine)?
        .with_material_sink(materials.clone())
        .with_mesh_sink(LogSurface)
        .with_display(LogSurface)
        .with_assets(store);

    engine.start();
    let mut timeline = Vec::new();
    loop {
        let report = engine.tick(delta);
        if report.phase_changed || timeline.is_empty() {
            timeline.push((report.playback_seconds, report.phase));
        }
        if !engine.player().is_playing() {
            break;
        }
        engine.player_mut().advance(delta);
    }

    println!("phase timeline:");
    for (at, phase) in &timeline {
        println!("  {at:>8.2}s  {phase}");
    }

    let stats = engine.stats();
    println!(
        "ticks: {}  phase changes: {}  transitions: {}  mesh rebuilds: {}",
        stats.ticks, stats.phase_changes, stats.transitions_started, stats.mesh_rebuilds
    );

    let materials = materials.borrow();
    if let (Some(scale), Some(rotation)) =
        (materials.float(keys::SCALE), materials.float(keys::ROTATION))
    {
        println!("final scale: {scale:.3}  rotation: {rotation:.1} deg");
    }

    Ok(())
}

fn run_default_config() -> mandala_visualiser_core::Result<()> {
    println!("{}", AppConfig::default().to_json_pretty()?);
    Ok(())
}

fn run_mesh(segments: u32, outer: f32, inner: f32) -> mandala_visualiser_core::Result<()> {
    let mesh = mandala_visualiser_core::generate(segments, outer, inner)?;
    println!(
        "vertices: {}  triangles: {}  indices: {}",
        mesh.vertex_count(),
        mesh.triangle_count(),
        mesh.indices.len()
    );
    Ok(())
}

/// Output target that only reports what it receives.
struct LogSurface;

impl MeshSink for LogSurface {
    fn set_mesh(&mut self, mesh: &Mesh) {
        tracing::debug!(
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "mesh updated"
        );
    }
}

impl Display for LogSurface {
    fn show(&mut self, asset: &AssetHandle, transition_seconds: f32) {
        tracing::info!(asset = %asset.key, path = %asset.path, transition_seconds, "showing artwork");
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Phase-synchronised mandala visualiser", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a simulated track through the engine and report the phases.
    Simulate {
        /// Optional JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Track length in seconds; defaults to shortly after the last phase.
        #[arg(short, long)]
        duration: Option<f32>,
        /// Simulated frame rate.
        #[arg(long, default_value_t = 60)]
        fps: u32,
        /// Directory holding `<phase>.png` artwork.
        #[arg(long, default_value = "assets")]
        assets: String,
    },
    /// Print the built-in configuration as JSON.
    DefaultConfig,
    /// Generate a single ring and print its size.
    Mesh {
        #[arg(long, default_value_t = 60)]
        segments: u32,
        #[arg(long, default_value_t = 5.0)]
        outer: f32,
        #[arg(long, default_value_t = 1.0)]
        inner: f32,
    },
}
