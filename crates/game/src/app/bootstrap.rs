use engine::{resolve_app_paths, LoopConfig, ScheduleError, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{load_config, resolve_config_path, ClientConfig, ConfigError};
use super::gameplay::DoorScene;
use super::remote_feed::{FeedHandle, QueuedTransactionSink};
use super::replay::{
    load_replay, resolve_replay_path, LoopbackStore, ReplayDriver, ReplayError, ReplayScript,
};

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Replay(#[from] ReplayError),
    #[error("gameplay systems: {0}")]
    Schedule(#[from] ScheduleError),
}

pub(crate) struct AppWiring {
    pub(crate) loop_config: LoopConfig,
    pub(crate) scene: DoorScene,
    pub(crate) driver: ReplayDriver,
    pub(crate) session: String,
}

pub(crate) fn build_app() -> Result<AppWiring, AppError> {
    init_tracing();
    info!("=== Door Decor Startup ===");

    let paths = resolve_app_paths()?;
    let config_path = resolve_config_path(&paths);
    let config = load_config(&config_path)?;
    info!(
        path = %config_path.display(),
        identity = config.local_identity.as_str(),
        target_tps = config.target_tps,
        "config_loaded"
    );

    let (script, session) = match resolve_replay_path(&paths) {
        Some(path) => (load_replay(&path)?, path.display().to_string()),
        None => (
            ReplayScript::demo(&config.local_identity),
            "demo".to_string(),
        ),
    };
    info!(
        session = session.as_str(),
        frames = script.total_frames(),
        "replay_loaded"
    );

    wire(config, script, session)
}

/// Connects scene, feed, sink and loopback store for one session.
fn wire(
    config: ClientConfig,
    script: ReplayScript,
    session: String,
) -> Result<AppWiring, AppError> {
    let feed = FeedHandle::new();
    let sink = QueuedTransactionSink::new();
    let loop_config = config.loop_config();
    let store = LoopbackStore::new(feed.clone(), sink.clone(), &config.local_identity);
    let driver = ReplayDriver::new(script, store, loop_config.fixed_dt());
    let scene = DoorScene::new(config, feed, Box::new(sink))?;

    Ok(AppWiring {
        loop_config,
        scene,
        driver,
        session,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
