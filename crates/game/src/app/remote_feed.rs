//! Boundary between asynchronous store callbacks and the synchronous tick.
//!
//! Producers push row changes and transaction outcomes through a cloned
//! [`FeedHandle`]; the gameplay scene drains everything once per tick. Nothing
//! pushed here touches entity state until that drain.

use std::collections::{BTreeMap, VecDeque};
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::warn;

static FEED_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn lock_recovering<'a, T>(mutex: &'a Mutex<T>, operation: &'static str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            if FEED_LOCK_POISON_WARNED
                .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                warn!(operation, "feed lock poisoned; recovered inner value");
            }
            poisoned.into_inner()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DecorRow {
    pub(crate) id: u64,
    pub(crate) door_id: u64,
    #[serde(default)]
    pub(crate) owner: Option<String>,
    pub(crate) key: String,
    #[serde(default)]
    pub(crate) text: Option<String>,
    pub(crate) x: u32,
    pub(crate) y: u32,
    #[serde(default)]
    pub(crate) rot: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DoorRow {
    pub(crate) id: u64,
    pub(crate) owner: String,
    pub(crate) current_visitor: String,
    pub(crate) number: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct UserRow {
    pub(crate) identity: String,
    pub(crate) current_door_number: u8,
    #[serde(default)]
    pub(crate) owned_items_deleted: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct InventoryRow {
    pub(crate) id: u64,
    pub(crate) owner: String,
    pub(crate) decor_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PackageRow {
    pub(crate) id: u64,
    pub(crate) door_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "row", rename_all = "snake_case")]
pub(crate) enum RowChange<T> {
    Insert(T),
    Update(T),
    Delete(T),
}

impl<T> RowChange<T> {
    pub(crate) fn row(&self) -> &T {
        match self {
            Self::Insert(row) | Self::Update(row) | Self::Delete(row) => row,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reducer", rename_all = "snake_case")]
pub(crate) enum TransactionCall {
    MoveDecor {
        decor_id: u64,
        x: u32,
        y: u32,
        rot: u32,
    },
    DeleteDecor {
        decor_id: u64,
    },
    UpdateDecorText {
        decor_id: u64,
        text: String,
    },
    EnterDoor,
    OpenPackage {
        package_id: u64,
    },
    CreateDecor {
        inventory_id: u64,
        x: u32,
        y: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum TransactionKind {
    MoveDecor,
    DeleteDecor,
    UpdateDecorText,
    EnterDoor,
    OpenPackage,
    CreateDecor,
}

impl TransactionCall {
    pub(crate) fn kind(&self) -> TransactionKind {
        match self {
            Self::MoveDecor { .. } => TransactionKind::MoveDecor,
            Self::DeleteDecor { .. } => TransactionKind::DeleteDecor,
            Self::UpdateDecorText { .. } => TransactionKind::UpdateDecorText,
            Self::EnterDoor => TransactionKind::EnterDoor,
            Self::OpenPackage { .. } => TransactionKind::OpenPackage,
            Self::CreateDecor { .. } => TransactionKind::CreateDecor,
        }
    }

    pub(crate) fn decor_id(&self) -> Option<u64> {
        match self {
            Self::MoveDecor { decor_id, .. }
            | Self::DeleteDecor { decor_id }
            | Self::UpdateDecorText { decor_id, .. } => Some(*decor_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub(crate) enum OutcomeStatus {
    Succeeded,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TransactionOutcome {
    pub(crate) correlation_id: u64,
    #[serde(flatten)]
    pub(crate) status: OutcomeStatus,
    pub(crate) call: TransactionCall,
}

impl TransactionOutcome {
    pub(crate) fn succeeded(correlation_id: u64, call: TransactionCall) -> Self {
        Self {
            correlation_id,
            status: OutcomeStatus::Succeeded,
            call,
        }
    }

    pub(crate) fn failed(correlation_id: u64, call: TransactionCall, reason: &str) -> Self {
        Self {
            correlation_id,
            status: OutcomeStatus::Failed {
                reason: reason.to_string(),
            },
            call,
        }
    }

    pub(crate) fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded)
    }
}

/// Everything that arrived since the previous drain, one FIFO per kind.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct FeedBatch {
    pub(crate) decor: VecDeque<RowChange<DecorRow>>,
    pub(crate) doors: VecDeque<DoorRow>,
    pub(crate) users: VecDeque<UserRow>,
    pub(crate) inventory: VecDeque<RowChange<InventoryRow>>,
    pub(crate) packages: VecDeque<RowChange<PackageRow>>,
    pub(crate) move_outcomes: VecDeque<TransactionOutcome>,
    pub(crate) delete_outcomes: VecDeque<TransactionOutcome>,
    pub(crate) text_outcomes: VecDeque<TransactionOutcome>,
    pub(crate) enter_door_outcomes: VecDeque<TransactionOutcome>,
    pub(crate) other_outcomes: VecDeque<TransactionOutcome>,
}

impl FeedBatch {
    pub(crate) fn is_empty(&self) -> bool {
        self.decor.is_empty()
            && self.doors.is_empty()
            && self.users.is_empty()
            && self.inventory.is_empty()
            && self.packages.is_empty()
            && self.move_outcomes.is_empty()
            && self.delete_outcomes.is_empty()
            && self.text_outcomes.is_empty()
            && self.enter_door_outcomes.is_empty()
            && self.other_outcomes.is_empty()
    }

    fn outcome_queue_mut(&mut self, kind: TransactionKind) -> &mut VecDeque<TransactionOutcome> {
        match kind {
            TransactionKind::MoveDecor => &mut self.move_outcomes,
            TransactionKind::DeleteDecor => &mut self.delete_outcomes,
            TransactionKind::UpdateDecorText => &mut self.text_outcomes,
            TransactionKind::EnterDoor => &mut self.enter_door_outcomes,
            TransactionKind::OpenPackage | TransactionKind::CreateDecor => {
                &mut self.other_outcomes
            }
        }
    }
}

#[derive(Debug, Default)]
struct FeedState {
    pending: FeedBatch,
    decor_cache: BTreeMap<u64, DecorRow>,
    package_cache: BTreeMap<u64, PackageRow>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FeedHandle {
    inner: Arc<Mutex<FeedState>>,
}

impl FeedHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_decor(&self, change: RowChange<DecorRow>) {
        let mut state = lock_recovering(&self.inner, "push_decor");
        match &change {
            RowChange::Insert(row) | RowChange::Update(row) => {
                state.decor_cache.insert(row.id, row.clone());
            }
            RowChange::Delete(row) => {
                state.decor_cache.remove(&row.id);
            }
        }
        state.pending.decor.push_back(change);
    }

    pub(crate) fn push_door(&self, row: DoorRow) {
        lock_recovering(&self.inner, "push_door")
            .pending
            .doors
            .push_back(row);
    }

    pub(crate) fn push_user(&self, row: UserRow) {
        lock_recovering(&self.inner, "push_user")
            .pending
            .users
            .push_back(row);
    }

    pub(crate) fn push_inventory(&self, change: RowChange<InventoryRow>) {
        lock_recovering(&self.inner, "push_inventory")
            .pending
            .inventory
            .push_back(change);
    }

    pub(crate) fn push_package(&self, change: RowChange<PackageRow>) {
        let mut state = lock_recovering(&self.inner, "push_package");
        match &change {
            RowChange::Insert(row) | RowChange::Update(row) => {
                state.package_cache.insert(row.id, row.clone());
            }
            RowChange::Delete(row) => {
                state.package_cache.remove(&row.id);
            }
        }
        state.pending.packages.push_back(change);
    }

    pub(crate) fn push_outcome(&self, outcome: TransactionOutcome) {
        let mut state = lock_recovering(&self.inner, "push_outcome");
        let kind = outcome.call.kind();
        state.pending.outcome_queue_mut(kind).push_back(outcome);
    }

    pub(crate) fn drain(&self) -> FeedBatch {
        mem::take(&mut lock_recovering(&self.inner, "drain").pending)
    }

    /// Latest known rows for one door, ascending by decor id.
    pub(crate) fn cached_decor_for_door(&self, door_id: u64) -> Vec<DecorRow> {
        lock_recovering(&self.inner, "cached_decor_for_door")
            .decor_cache
            .values()
            .filter(|row| row.door_id == door_id)
            .cloned()
            .collect()
    }

    pub(crate) fn cached_packages_for_door(&self, door_id: u64) -> Vec<PackageRow> {
        lock_recovering(&self.inner, "cached_packages_for_door")
            .package_cache
            .values()
            .filter(|row| row.door_id == door_id)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct OutgoingTransaction {
    pub(crate) correlation_id: u64,
    pub(crate) call: TransactionCall,
}

/// Fire-and-forget submission; the outcome comes back through the feed.
pub(crate) trait TransactionSink {
    fn submit(&mut self, transaction: OutgoingTransaction);
}

/// Shared FIFO of submitted transactions, drained by whatever talks to the store.
#[derive(Debug, Clone, Default)]
pub(crate) struct QueuedTransactionSink {
    queue: Arc<Mutex<VecDeque<OutgoingTransaction>>>,
}

impl QueuedTransactionSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn drain(&self) -> Vec<OutgoingTransaction> {
        lock_recovering(&self.queue, "sink_drain").drain(..).collect()
    }

    pub(crate) fn len(&self) -> usize {
        lock_recovering(&self.queue, "sink_len").len()
    }
}

impl TransactionSink for QueuedTransactionSink {
    fn submit(&mut self, transaction: OutgoingTransaction) {
        lock_recovering(&self.queue, "sink_submit").push_back(transaction);
    }
}
