#[macro_use]
mod utils;

pub mod engine;
pub mod exercises;
pub mod geometry;
pub mod gesture;
pub mod locale;
pub mod puzzle;
pub mod session;
pub mod settings;
pub mod stats;
pub mod tracking;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use engine::{forward_stdin, ChannelControls, Engine, EngineContext, FrameClock, LogPresenter};
use exercises::ExerciseKind;
use locale::Language;
use session::PlayerProfile;
use settings::EngineSettings;
use stats::Reporter;
use tracking::ReplaySource;

const ENABLE_LOGS: bool = true;

/// Frame rate assumed for timing when replay pacing is off.
const DEFAULT_FPS: u32 = 30;

/// Gesture-driven hand rehabilitation exercises.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    /// capture, drag, puzzle or repetition (or exercise_1..exercise_4)
    pub exercise: ExerciseKind,

    /// Player identity reported with results
    pub identity: Option<String>,

    /// Player age; anything that is not a non-negative integer becomes 0
    pub age: Option<String>,

    /// Display language code (el, en)
    pub lang: Option<String>,

    /// JSON-lines file of recorded hand landmarks
    #[clap(long)]
    pub frames: PathBuf,

    /// Replay pacing in frames per second, 0 for as fast as possible
    #[clap(long, default_value_t = DEFAULT_FPS)]
    pub fps: u32,

    /// JSON settings file
    #[clap(long)]
    pub settings: Option<PathBuf>,

    /// POST results to this URL (overrides the settings endpoint)
    #[clap(long)]
    pub stats_url: Option<String>,

    /// Append results to this JSON-lines file instead of the log
    #[clap(long)]
    pub stats_file: Option<PathBuf>,

    /// Start the first run immediately
    #[clap(long)]
    pub auto_start: bool,
}

pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    log_info!("hand-rehab starting {}", cli.exercise);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            log_error!("failed to start runtime: {err}");
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(launch(cli));
    // The stdin reader sits in a blocking read; don't wait for it.
    runtime.shutdown_timeout(Duration::from_millis(200));

    if let Err(err) = result {
        log_error!("{err:#}");
        std::process::exit(1);
    }
}

async fn launch(cli: Cli) -> Result<()> {
    let profile = PlayerProfile::from_args(cli.identity.as_deref(), cli.age.as_deref());
    let language = Language::from_code(cli.lang.as_deref());
    let settings = EngineSettings::load_or_default(cli.settings.as_deref());

    let mut source = ReplaySource::open(&cli.frames, cli.fps).await?;
    let step_fps = if cli.fps == 0 { DEFAULT_FPS } else { cli.fps };
    let clock = FrameClock::fixed(Duration::from_secs_f64(1.0 / f64::from(step_fps)));

    let reporter = Reporter::select(
        cli.stats_url.clone(),
        cli.stats_file.clone(),
        &settings.reporting,
    )?;
    let ctx = EngineContext::open(profile, language, settings, reporter);

    let (tx, mut controls) = ChannelControls::channel(8);
    let stdin_task = tokio::spawn(forward_stdin(tx));
    let mut presenter = LogPresenter::new(language);

    let outcome = {
        let mut engine = Engine::new(&ctx, cli.exercise, clock);
        if cli.auto_start {
            engine.auto_start();
        }
        engine.run(&mut source, &mut controls, &mut presenter).await
    };

    stdin_task.abort();
    ctx.close().await.context("failed to flush pending results")?;

    let outcome = outcome?;
    log_info!(
        "stopped ({:?}) after {} frames ({} skipped, {} partial hands dropped), {} result(s) reported",
        outcome.reason,
        outcome.frames,
        outcome.transient_failures,
        outcome.dropped_hands,
        outcome.results.len()
    );
    Ok(())
}
