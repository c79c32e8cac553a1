use std::collections::{BTreeMap, VecDeque};

use engine::{
    order_text, ComponentSet, Easing, EntityId, InputAction, InputSnapshot, Lerp, Registry,
    RegistryEvent, Scene, SceneCommand, Schedule, ScheduleError, Tween, TweenStep,
    TypedComponent, Vec2,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::config::{ClientConfig, DoorBounds};
use super::remote_feed::{
    DecorRow, DoorRow, FeedBatch, FeedHandle, InventoryRow, OutcomeStatus, OutgoingTransaction,
    PackageRow, RowChange, TransactionCall, TransactionOutcome, TransactionSink,
};

const TEXT_BEARING_KEYS: [&str; 3] = ["board_01", "board_02", "board_03"];
const PACKAGE_SLOT_COUNT: u64 = 4;
const PACKAGE_EXTENT: f32 = 48.0;
#[cfg(test)]
const GAMEPLAY_SYSTEM_ORDER_TEXT: &str =
    "FeedIngest>DecorLifecycle>Reconciler>UiIntent>KeyInput>Drag>PositionLimit>DoorSequence>Fade";

include!("types.rs");
include!("systems.rs");
include!("lifecycle.rs");
include!("reconciler.rs");
include!("intents.rs");
include!("drag.rs");
include!("door_sequence.rs");
include!("scene_state.rs");
include!("scene_impl.rs");
include!("util.rs");
