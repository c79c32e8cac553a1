use std::time::Duration;

use tracing::{info, warn};

use super::input::{InputCollector, RawInputEvent};
use super::metrics::MetricsAccumulator;
use super::registry::Registry;
use super::scene::{Scene, SceneCommand};
use super::MetricsHandle;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

impl LoopConfig {
    pub fn fixed_dt(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_tps.max(1) as f64)
    }
}

/// One presented frame: how much wall time it covers and the raw input seen during it.
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub delta: Duration,
    pub events: Vec<RawInputEvent>,
}

/// Supplies frames to the headless loop in place of a window event loop.
pub trait FrameDriver<S: Scene> {
    /// `None` ends the run.
    fn next_frame(&mut self, scene: &mut S) -> Option<FrameInput>;

    fn after_tick(&mut self, _scene: &mut S, _world: &Registry<S::Components>) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    DriverFinished,
    QuitRequested,
    SceneExit,
}

pub struct HeadlessRun<S: Scene> {
    pub scene: S,
    pub world: Registry<S::Components>,
    pub frames: u64,
    pub ticks: u64,
    pub exit_reason: ExitReason,
}

impl<S: Scene> HeadlessRun<S> {
    pub fn shutdown(mut self) -> S {
        self.scene.unload(&mut self.world);
        info!(frames = self.frames, ticks = self.ticks, "shutdown");
        self.scene
    }
}

pub fn run_headless<S, D>(
    config: &LoopConfig,
    mut scene: S,
    driver: &mut D,
    metrics_handle: &MetricsHandle,
) -> HeadlessRun<S>
where
    S: Scene,
    D: FrameDriver<S>,
{
    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = config.fixed_dt();
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        "loop_config"
    );

    let mut world = Registry::new();
    let mut input_collector = InputCollector::new();
    scene.load(&mut world);
    info!(entity_count = world.entity_count(), "scene_loaded");

    let mut accumulator = Duration::ZERO;
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut frames = 0u64;
    let mut exit_reason = ExitReason::DriverFinished;

    'frames: while let Some(frame) = driver.next_frame(&mut scene) {
        for event in frame.events {
            input_collector.handle(event);
        }

        let clamped_frame_dt = clamp_frame_delta(frame.delta, max_frame_delta);
        accumulator = accumulator.saturating_add(clamped_frame_dt);

        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
        accumulator = step_plan.remaining_accumulator;
        for _ in 0..step_plan.ticks_to_run {
            let input_snapshot = input_collector.snapshot_for_tick();
            let command = scene.update(fixed_dt_seconds, &input_snapshot, &mut world);
            metrics_accumulator.record_tick();
            driver.after_tick(&mut scene, &world);

            if input_snapshot.quit_requested() {
                info!(reason = "quit_key", "shutdown_requested");
                exit_reason = ExitReason::QuitRequested;
                break 'frames;
            }
            if command == SceneCommand::Exit {
                info!(reason = "scene_exit", "shutdown_requested");
                exit_reason = ExitReason::SceneExit;
                break 'frames;
            }
        }

        if step_plan.dropped_backlog > Duration::ZERO {
            warn!(
                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame, "sim_clamp_triggered"
            );
        }

        frames = frames.saturating_add(1);
        metrics_accumulator.record_frame(frame.delta);
        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(world.entity_count()) {
            metrics_handle.publish(snapshot);
            info!(
                fps = snapshot.fps,
                tps = snapshot.tps,
                frame_time_ms = snapshot.frame_time_ms,
                entity_count = snapshot.entity_count,
                "loop_metrics"
            );
        }
    }

    HeadlessRun {
        scene,
        world,
        frames,
        ticks: metrics_accumulator.total_ticks(),
        exit_reason,
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
