//! Scripted headless sessions and the in-process store they run against.
//!
//! A [`ReplayScript`] is a list of frames: raw input events for the loop's
//! collector, UI intents for the scene, rows injected into the store and calls
//! other players make. The [`ReplayDriver`] feeds those frames to
//! [`engine::run_headless`] and answers every submitted transaction through a
//! [`LoopbackStore`] after each tick.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine::{AppPaths, FrameDriver, FrameInput, InputAction, RawInputEvent, Registry, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::gameplay::{DoorScene, GameComponent, UiEvent};
use super::remote_feed::{
    DecorRow, DoorRow, FeedHandle, InventoryRow, PackageRow, QueuedTransactionSink, RowChange,
    TransactionCall, TransactionKind, TransactionOutcome, UserRow,
};

pub(crate) const REPLAY_ENV_VAR: &str = "DECOR_REPLAY";

const NO_VISITOR: &str = "";
const FORCED_REJECTION: &str = "Rejected by loopback store";
const OWNED_DELETES_PER_PACKAGE: u8 = 3;
const DECOR_KEYS: [&str; 18] = [
    "heart_01",
    "eye_01",
    "cac_01",
    "star_01",
    "paw_01",
    "board_01",
    "board_02",
    "rainbow_01",
    "cat_01",
    "face_01",
    "leaf_01",
    "shroom_01",
    "star_02",
    "lights_01",
    "cac_02",
    "weird_01",
    "char_01",
    "board_03",
];

#[derive(Debug, Error)]
pub(crate) enum ReplayError {
    #[error("read replay '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse replay '{path}' at {at}: {message}")]
    Parse {
        path: PathBuf,
        at: String,
        message: String,
    },
}

/// A row change arriving from the store without a local transaction behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub(crate) enum FeedNotification {
    Decor { change: RowChange<DecorRow> },
    Door { row: DoorRow },
    User { row: UserRow },
    Inventory { change: RowChange<InventoryRow> },
    Package { change: RowChange<PackageRow> },
}

/// A transaction another player submits to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RemoteCall {
    pub(crate) identity: String,
    pub(crate) call: TransactionCall,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ReplayFrame {
    /// Wall time covered by the frame; one fixed tick when absent.
    pub(crate) delta_ms: Option<u64>,
    pub(crate) input: Vec<RawInputEvent>,
    pub(crate) ui: Vec<UiEvent>,
    pub(crate) feed: Vec<FeedNotification>,
    pub(crate) remote: Vec<RemoteCall>,
    /// Empty frames played after this one.
    pub(crate) idle_frames: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ReplayScript {
    /// Identities connected to the store before the first frame, after the local one.
    pub(crate) connect: Vec<String>,
    /// Transaction kinds the store answers with a failure.
    pub(crate) reject: Vec<TransactionKind>,
    pub(crate) frames: Vec<ReplayFrame>,
}

impl ReplayScript {
    pub(crate) fn parse_json(raw: &str, path: &Path) -> Result<Self, ReplayError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let at = error.path().to_string();
            ReplayError::Parse {
                path: path.to_path_buf(),
                at,
                message: error.into_inner().to_string(),
            }
        })
    }

    /// Frames including idle ones.
    pub(crate) fn total_frames(&self) -> u64 {
        self.frames
            .iter()
            .map(|frame| 1 + u64::from(frame.idle_frames))
            .sum()
    }

    /// Built-in session: rearrange the starting door, edit a board, delete a
    /// neighbour's item, unpack and place a new item, then walk to the next door.
    pub(crate) fn demo(local_identity: &str) -> Self {
        const HOME_DOOR: u64 = 1;
        const NEIGHBOUR_DOOR: u64 = 4;
        const NEIGHBOUR: &str = "neighbour";

        let row = |id: u64, door_id: u64, owner: &str, key: &str, x: u32, y: u32| DecorRow {
            id,
            door_id,
            owner: Some(owner.to_string()),
            key: key.to_string(),
            text: None,
            x,
            y,
            rot: 0,
        };
        let insert = |row: DecorRow| FeedNotification::Decor {
            change: RowChange::Insert(row),
        };
        let board = DecorRow {
            text: Some("welcome".to_string()),
            ..row(101, HOME_DOOR, local_identity, "board_01", 300, 120)
        };

        let key = |action: InputAction, pressed: bool| RawInputEvent::Key { action, pressed };
        let frame = |idle_frames: u32| ReplayFrame {
            idle_frames,
            ..ReplayFrame::default()
        };

        Self {
            connect: vec![NEIGHBOUR.to_string()],
            reject: Vec::new(),
            frames: vec![
                ReplayFrame {
                    feed: vec![
                        insert(row(100, HOME_DOOR, local_identity, "cac_01", 40, 40)),
                        insert(board),
                        insert(row(102, HOME_DOOR, NEIGHBOUR, "star_01", 500, 300)),
                        insert(row(120, NEIGHBOUR_DOOR, NEIGHBOUR, "lights_01", 200, 240)),
                    ],
                    remote: vec![RemoteCall {
                        identity: NEIGHBOUR.to_string(),
                        call: TransactionCall::EnterDoor,
                    }],
                    ..frame(2)
                },
                ReplayFrame {
                    input: vec![
                        RawInputEvent::PointerMoved { x: 60.0, y: 60.0 },
                        RawInputEvent::PointerButton { pressed: true },
                    ],
                    ..frame(0)
                },
                ReplayFrame {
                    input: vec![RawInputEvent::PointerMoved { x: 260.0, y: 200.0 }],
                    ..frame(0)
                },
                ReplayFrame {
                    input: vec![RawInputEvent::PointerButton { pressed: false }],
                    ..frame(2)
                },
                ReplayFrame {
                    ui: vec![
                        UiEvent::TextEditStarted { decor_id: 101 },
                        UiEvent::TextSubmitted {
                            text: "hello from next door".to_string(),
                        },
                    ],
                    ..frame(2)
                },
                ReplayFrame {
                    ui: vec![UiEvent::DeleteRequested { decor_id: 102 }],
                    ..frame(2)
                },
                ReplayFrame {
                    ui: vec![UiEvent::PackageClicked { package_id: 2 }],
                    ..frame(2)
                },
                ReplayFrame {
                    ui: vec![UiEvent::PlaceFromInventory {
                        inventory_id: 124,
                        position: Vec2::new(420.0, 260.0),
                    }],
                    ..frame(2)
                },
                ReplayFrame {
                    input: vec![key(InputAction::OpenDoor, true)],
                    ..frame(0)
                },
                ReplayFrame {
                    input: vec![key(InputAction::OpenDoor, false)],
                    ..frame(90)
                },
                ReplayFrame {
                    input: vec![key(InputAction::Quit, true)],
                    ..frame(0)
                },
            ],
        }
    }
}

/// `DECOR_REPLAY` when set; relative names resolve under `replays/`.
pub(crate) fn resolve_replay_path(app_paths: &AppPaths) -> Option<PathBuf> {
    match std::env::var(REPLAY_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => {
            let path = PathBuf::from(value);
            if path.is_relative() {
                Some(app_paths.replay_dir.join(path))
            } else {
                Some(path)
            }
        }
        _ => None,
    }
}

pub(crate) fn load_replay(path: &Path) -> Result<ReplayScript, ReplayError> {
    let raw = fs::read_to_string(path).map_err(|source| ReplayError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ReplayScript::parse_json(&raw, path)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct StoreStats {
    pub(crate) applied: u64,
    pub(crate) rejected: u64,
}

/// Authoritative tables kept in process. Applies transactions with the same
/// rules and rejections as the hosted store and publishes every row change
/// and outcome through the feed.
#[derive(Debug)]
pub(crate) struct LoopbackStore {
    feed: FeedHandle,
    sink: QueuedTransactionSink,
    local_identity: String,
    decor: BTreeMap<u64, DecorRow>,
    doors: BTreeMap<u64, DoorRow>,
    users: BTreeMap<String, UserRow>,
    inventory: BTreeMap<u64, InventoryRow>,
    packages: BTreeMap<u64, PackageRow>,
    package_items: BTreeMap<u64, Vec<String>>,
    visits: BTreeMap<String, BTreeSet<u64>>,
    next_row_id: u64,
    rejected_kinds: Vec<TransactionKind>,
    stats: StoreStats,
}

impl LoopbackStore {
    pub(crate) fn new(feed: FeedHandle, sink: QueuedTransactionSink, local_identity: &str) -> Self {
        Self {
            feed,
            sink,
            local_identity: local_identity.to_string(),
            decor: BTreeMap::new(),
            doors: BTreeMap::new(),
            users: BTreeMap::new(),
            inventory: BTreeMap::new(),
            packages: BTreeMap::new(),
            package_items: BTreeMap::new(),
            visits: BTreeMap::new(),
            next_row_id: 1,
            rejected_kinds: Vec::new(),
            stats: StoreStats::default(),
        }
    }

    pub(crate) fn reject(&mut self, kind: TransactionKind) {
        if !self.rejected_kinds.contains(&kind) {
            self.rejected_kinds.push(kind);
        }
    }

    pub(crate) fn stats(&self) -> StoreStats {
        self.stats
    }

    pub(crate) fn decor_row(&self, decor_id: u64) -> Option<&DecorRow> {
        self.decor.get(&decor_id)
    }

    pub(crate) fn user(&self, identity: &str) -> Option<&UserRow> {
        self.users.get(identity)
    }

    pub(crate) fn current_door_of(&self, identity: &str) -> Option<u64> {
        self.doors
            .values()
            .find(|door| door.current_visitor == identity)
            .map(|door| door.id)
    }

    pub(crate) fn inventory_of(&self, identity: &str) -> Vec<&InventoryRow> {
        self.inventory
            .values()
            .filter(|item| item.owner == identity)
            .collect()
    }

    pub(crate) fn packages_at(&self, door_id: u64) -> Vec<u64> {
        self.packages
            .values()
            .filter(|package| package.door_id == door_id)
            .map(|package| package.id)
            .collect()
    }

    /// First connection of `identity`: a user row and a door of their own.
    pub(crate) fn connect(&mut self, identity: &str) {
        if self.users.contains_key(identity) {
            return;
        }
        let user = UserRow {
            identity: identity.to_string(),
            current_door_number: 1,
            owned_items_deleted: 0,
        };
        self.put_user(user);
        let door_id = self.create_door_for(identity, 1);
        self.visits
            .entry(identity.to_string())
            .or_default()
            .insert(door_id);
        info!(identity, door_id, "store_user_connected");
    }

    /// Applies every transaction the client submitted since the last pump.
    pub(crate) fn pump(&mut self) -> usize {
        let transactions = self.sink.drain();
        let count = transactions.len();
        for transaction in transactions {
            let kind = transaction.call.kind();
            let result = if self.rejected_kinds.contains(&kind) {
                Err(FORCED_REJECTION.to_string())
            } else {
                let identity = self.local_identity.clone();
                self.apply_as(&identity, &transaction.call)
            };
            let outcome = match result {
                Ok(()) => {
                    self.stats.applied += 1;
                    debug!(correlation_id = transaction.correlation_id, kind = ?kind, "store_transaction_applied");
                    TransactionOutcome::succeeded(transaction.correlation_id, transaction.call)
                }
                Err(reason) => {
                    self.stats.rejected += 1;
                    info!(
                        correlation_id = transaction.correlation_id,
                        kind = ?kind,
                        reason = reason.as_str(),
                        "store_transaction_rejected"
                    );
                    TransactionOutcome::failed(transaction.correlation_id, transaction.call, &reason)
                }
            };
            self.feed.push_outcome(outcome);
        }
        count
    }

    /// A call made by another player; only row changes reach the local feed.
    pub(crate) fn apply_remote(&mut self, remote: &RemoteCall) {
        if let Err(reason) = self.apply_as(&remote.identity, &remote.call) {
            warn!(
                identity = remote.identity.as_str(),
                call = ?remote.call,
                reason = reason.as_str(),
                "store_remote_call_rejected"
            );
        }
    }

    pub(crate) fn inject(&mut self, notification: FeedNotification) {
        match notification {
            FeedNotification::Decor { change } => {
                self.reserve_id(change.row().id);
                match &change {
                    RowChange::Insert(row) | RowChange::Update(row) => {
                        self.decor.insert(row.id, row.clone());
                    }
                    RowChange::Delete(row) => {
                        self.decor.remove(&row.id);
                    }
                }
                self.feed.push_decor(change);
            }
            FeedNotification::Door { row } => {
                self.reserve_id(row.id);
                self.put_door(row);
            }
            FeedNotification::User { row } => self.put_user(row),
            FeedNotification::Inventory { change } => {
                self.reserve_id(change.row().id);
                match &change {
                    RowChange::Insert(row) | RowChange::Update(row) => {
                        self.inventory.insert(row.id, row.clone());
                    }
                    RowChange::Delete(row) => {
                        self.inventory.remove(&row.id);
                    }
                }
                self.feed.push_inventory(change);
            }
            FeedNotification::Package { change } => {
                self.reserve_id(change.row().id);
                match &change {
                    RowChange::Insert(row) | RowChange::Update(row) => {
                        self.packages.insert(row.id, row.clone());
                    }
                    RowChange::Delete(row) => {
                        self.packages.remove(&row.id);
                        self.package_items.remove(&row.id);
                    }
                }
                self.feed.push_package(change);
            }
        }
    }

    fn apply_as(&mut self, sender: &str, call: &TransactionCall) -> Result<(), String> {
        match call {
            TransactionCall::MoveDecor { decor_id, x, y, rot } => {
                let mut row = self.find_decor(*decor_id)?;
                row.x = *x;
                row.y = *y;
                row.rot = *rot;
                self.decor.insert(row.id, row.clone());
                self.feed.push_decor(RowChange::Update(row));
                Ok(())
            }
            TransactionCall::DeleteDecor { decor_id } => self.delete_decor(sender, *decor_id),
            TransactionCall::UpdateDecorText { decor_id, text } => {
                let mut row = self.find_decor(*decor_id)?;
                row.text = Some(text.clone());
                self.decor.insert(row.id, row.clone());
                self.feed.push_decor(RowChange::Update(row));
                Ok(())
            }
            TransactionCall::EnterDoor => self.enter_door(sender),
            TransactionCall::OpenPackage { package_id } => self.open_package(sender, *package_id),
            TransactionCall::CreateDecor { inventory_id, x, y } => {
                self.create_decor(sender, *inventory_id, *x, *y)
            }
        }
    }

    fn find_decor(&self, decor_id: u64) -> Result<DecorRow, String> {
        self.decor
            .get(&decor_id)
            .cloned()
            .ok_or_else(|| "Decor does not exist".to_string())
    }

    fn find_user(&self, identity: &str) -> Result<UserRow, String> {
        self.users
            .get(identity)
            .cloned()
            .ok_or_else(|| "User does not exist".to_string())
    }

    fn enter_door(&mut self, sender: &str) -> Result<(), String> {
        let mut user = self.find_user(sender)?;

        let occupied: Vec<DoorRow> = self
            .doors
            .values()
            .filter(|door| door.current_visitor == sender)
            .cloned()
            .collect();
        for mut door in occupied {
            door.current_visitor = NO_VISITOR.to_string();
            self.put_door(door);
        }

        let visited = self.visits.get(sender).cloned().unwrap_or_default();
        let door_number = u8::try_from(visited.len() + 1).unwrap_or(u8::MAX);
        let free_door = self
            .doors
            .values()
            .find(|door| {
                door.current_visitor == NO_VISITOR
                    && door.owner != sender
                    && !visited.contains(&door.id)
            })
            .cloned();

        let door_id = match free_door {
            Some(mut door) => {
                door.current_visitor = sender.to_string();
                let door_id = door.id;
                self.put_door(door);
                if self.packages_at(door_id).is_empty() {
                    self.add_initial_packages(door_id);
                }
                door_id
            }
            None => self.create_door_for(sender, door_number),
        };

        user.current_door_number = door_number;
        self.put_user(user);
        self.visits
            .entry(sender.to_string())
            .or_default()
            .insert(door_id);
        info!(identity = sender, door_id, door_number, "store_door_entered");
        Ok(())
    }

    fn create_decor(&mut self, sender: &str, inventory_id: u64, x: u32, y: u32) -> Result<(), String> {
        self.find_user(sender)?;
        let item = self
            .inventory
            .get(&inventory_id)
            .cloned()
            .ok_or_else(|| format!("Didn't find inventory item {inventory_id}"))?;
        let door_id = self
            .current_door_of(sender)
            .ok_or_else(|| "Cannot add a decor if you aren't at a door".to_string())?;

        let row = DecorRow {
            id: self.next_id(),
            door_id,
            owner: Some(sender.to_string()),
            key: item.decor_key.clone(),
            text: None,
            x,
            y,
            rot: 0,
        };
        self.decor.insert(row.id, row.clone());
        self.feed.push_decor(RowChange::Insert(row));
        self.inventory.remove(&item.id);
        self.feed.push_inventory(RowChange::Delete(item));
        Ok(())
    }

    /// Deleting your own item returns it to your inventory. Deleting someone
    /// else's counts against them; every third loss earns them a package.
    fn delete_decor(&mut self, sender: &str, decor_id: u64) -> Result<(), String> {
        self.find_user(sender)?;
        let row = self.find_decor(decor_id)?;

        if let Some(mut owner) = row
            .owner
            .as_deref()
            .and_then(|owner| self.users.get(owner).cloned())
        {
            if owner.identity != sender {
                owner.owned_items_deleted = owner.owned_items_deleted.saturating_add(1);
                if owner.owned_items_deleted >= OWNED_DELETES_PER_PACKAGE {
                    owner.owned_items_deleted = 0;
                    match self.current_door_of(&owner.identity) {
                        Some(door_id) => self.add_package(door_id),
                        None => warn!(identity = owner.identity.as_str(), "store_owner_not_at_door"),
                    }
                }
                self.put_user(owner);
            } else {
                let item = InventoryRow {
                    id: self.next_id(),
                    owner: owner.identity,
                    decor_key: row.key.clone(),
                };
                self.inventory.insert(item.id, item.clone());
                self.feed.push_inventory(RowChange::Insert(item));
            }
        }

        self.decor.remove(&row.id);
        self.feed.push_decor(RowChange::Delete(row));
        Ok(())
    }

    fn open_package(&mut self, sender: &str, package_id: u64) -> Result<(), String> {
        let package = self
            .packages
            .get(&package_id)
            .cloned()
            .ok_or_else(|| format!("Could not find package {package_id}"))?;

        for decor_key in self.package_items.remove(&package_id).unwrap_or_default() {
            let item = InventoryRow {
                id: self.next_id(),
                owner: sender.to_string(),
                decor_key,
            };
            self.inventory.insert(item.id, item.clone());
            self.feed.push_inventory(RowChange::Insert(item));
        }

        self.packages.remove(&package.id);
        self.feed.push_package(RowChange::Delete(package));
        Ok(())
    }

    fn create_door_for(&mut self, identity: &str, number: u8) -> u64 {
        let door = DoorRow {
            id: self.next_id(),
            owner: identity.to_string(),
            current_visitor: identity.to_string(),
            number,
        };
        let door_id = door.id;
        self.put_door(door);
        self.add_initial_packages(door_id);
        door_id
    }

    /// One or two packages, picked from the door id.
    fn add_initial_packages(&mut self, door_id: u64) {
        for _ in 0..1 + door_id % 2 {
            self.add_package(door_id);
        }
    }

    /// Three to five items, keys picked from the package id.
    fn add_package(&mut self, door_id: u64) {
        let package = PackageRow {
            id: self.next_id(),
            door_id,
        };
        let item_count = 3 + package.id % 3;
        let items = (0..item_count)
            .map(|slot| {
                let index = (package.id.wrapping_mul(7).wrapping_add(slot) % DECOR_KEYS.len() as u64) as usize;
                DECOR_KEYS[index].to_string()
            })
            .collect();
        self.package_items.insert(package.id, items);
        self.packages.insert(package.id, package.clone());
        debug!(package_id = package.id, door_id, item_count, "store_package_added");
        self.feed.push_package(RowChange::Insert(package));
    }

    fn put_door(&mut self, door: DoorRow) {
        self.doors.insert(door.id, door.clone());
        self.feed.push_door(door);
    }

    fn put_user(&mut self, user: UserRow) {
        self.users.insert(user.identity.clone(), user.clone());
        self.feed.push_user(user);
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_row_id;
        self.next_row_id = id.saturating_add(1);
        id
    }

    fn reserve_id(&mut self, id: u64) {
        self.next_row_id = self.next_row_id.max(id.saturating_add(1));
    }
}

/// Plays a [`ReplayScript`] frame by frame and lets the loopback store answer
/// after every tick.
#[derive(Debug)]
pub(crate) struct ReplayDriver {
    frames: VecDeque<ReplayFrame>,
    idle_remaining: u32,
    default_delta: Duration,
    store: LoopbackStore,
    frames_played: u64,
}

impl ReplayDriver {
    pub(crate) fn new(script: ReplayScript, mut store: LoopbackStore, default_delta: Duration) -> Self {
        let local_identity = store.local_identity.clone();
        store.connect(&local_identity);
        for identity in &script.connect {
            store.connect(identity);
        }
        for kind in &script.reject {
            store.reject(*kind);
        }
        Self {
            frames: script.frames.into(),
            idle_remaining: 0,
            default_delta,
            store,
            frames_played: 0,
        }
    }

    pub(crate) fn store(&self) -> &LoopbackStore {
        &self.store
    }

    pub(crate) fn frames_played(&self) -> u64 {
        self.frames_played
    }
}

impl FrameDriver<DoorScene> for ReplayDriver {
    fn next_frame(&mut self, scene: &mut DoorScene) -> Option<FrameInput> {
        self.store.pump();

        if self.idle_remaining > 0 {
            self.idle_remaining -= 1;
            self.frames_played += 1;
            return Some(FrameInput {
                delta: self.default_delta,
                events: Vec::new(),
            });
        }

        let frame = self.frames.pop_front()?;
        for notification in frame.feed {
            self.store.inject(notification);
        }
        for remote in &frame.remote {
            self.store.apply_remote(remote);
        }
        for event in frame.ui {
            scene.push_ui_event(event);
        }
        self.idle_remaining = frame.idle_frames;
        self.frames_played += 1;
        Some(FrameInput {
            delta: frame
                .delta_ms
                .map_or(self.default_delta, Duration::from_millis),
            events: frame.input,
        })
    }

    fn after_tick(&mut self, _scene: &mut DoorScene, _world: &Registry<GameComponent>) {
        self.store.pump();
    }
}
