mod input;
mod loop_runner;
mod metrics;
mod registry;
mod scene;
mod schedule;
mod tween;

pub use input::{ActionStates, InputAction, InputCollector, RawInputEvent};
pub use loop_runner::{run_headless, ExitReason, FrameDriver, FrameInput, HeadlessRun, LoopConfig};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use registry::{ComponentSet, EntityId, Registry, RegistryEvent, TypedComponent};
pub use scene::{InputSnapshot, Scene, SceneCommand, Vec2};
pub use schedule::{order_text, Schedule, ScheduleError};
pub use tween::{Easing, Lerp, Tween, TweenStep};
