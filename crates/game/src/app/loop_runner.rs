use std::process::ExitCode;

use engine::{run_headless, MetricsHandle};
use tracing::info;

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        loop_config,
        scene,
        mut driver,
        session,
    } = app;
    let metrics = MetricsHandle::default();
    let run = run_headless(&loop_config, scene, &mut driver, &metrics);

    let stats = driver.store().stats();
    let scene = &run.scene;
    info!(
        session = session.as_str(),
        frames = run.frames,
        script_frames = driver.frames_played(),
        ticks = run.ticks,
        exit_reason = ?run.exit_reason,
        active_door = ?scene.context().active_door,
        decor_count = scene.decor_count(),
        package_count = scene.package_count(),
        pending = scene.pending_count(),
        inventory = scene.inventory().len(),
        applied = stats.applied,
        rejected = stats.rejected,
        "session_finished"
    );
    run.shutdown();

    ExitCode::SUCCESS
}
