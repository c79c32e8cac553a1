use super::*;
use crate::app::remote_feed::{QueuedTransactionSink, UserRow};

const FIXED_DT: f32 = 1.0 / 60.0;
const DOOR: u64 = 5;

struct Harness {
    scene: DoorScene,
    world: Registry<GameComponent>,
    feed: FeedHandle,
    sink: QueuedTransactionSink,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    fn with_config(config: ClientConfig) -> Self {
        let feed = FeedHandle::new();
        let sink = QueuedTransactionSink::new();
        let mut scene =
            DoorScene::new(config, feed.clone(), Box::new(sink.clone())).expect("schedule");
        let mut world = Registry::new();
        scene.load(&mut world);
        Self {
            scene,
            world,
            feed,
            sink,
        }
    }

    /// Loaded scene already standing in `DOOR`.
    fn at_door() -> Self {
        let mut harness = Self::new();
        harness.enter_door(DOOR);
        harness
    }

    fn tick(&mut self) {
        self.tick_with(&InputSnapshot::empty());
    }

    fn tick_with(&mut self, input: &InputSnapshot) {
        let command = self.scene.update(FIXED_DT, input, &mut self.world);
        assert_eq!(command, SceneCommand::None);
    }

    fn ticks(&mut self, count: usize) {
        for _ in 0..count {
            self.tick();
        }
    }

    fn enter_door(&mut self, door_id: u64) {
        self.feed.push_door(DoorRow {
            id: door_id,
            owner: "local".to_string(),
            current_visitor: "local".to_string(),
            number: 1,
        });
        self.tick();
    }

    fn insert_decor(&mut self, row: DecorRow) {
        self.feed.push_decor(RowChange::Insert(row));
        self.tick();
    }

    fn decor(&self, decor_id: u64) -> &DecorState {
        let entity = self.scene.decor_entity(decor_id).expect("decor entity");
        self.world.get::<DecorState>(entity).expect("decor state")
    }

    fn submitted(&self) -> Vec<OutgoingTransaction> {
        self.sink.drain()
    }

    /// Press at `from`, hold at `to`, release at `to`; returns the submitted move.
    fn drag(&mut self, from: Vec2, to: Vec2) -> OutgoingTransaction {
        self.tick_with(&press_at(from));
        self.tick_with(&hold_at(to));
        self.tick_with(&release_at(to));
        let mut sent = self.submitted();
        assert_eq!(sent.len(), 1, "one move per release");
        sent.remove(0)
    }

    fn destroyed_in_last_tick(&self) -> usize {
        self.scene
            .last_tick_events()
            .iter()
            .filter(|event| matches!(event, RegistryEvent::EntityDestroyed(_)))
            .count()
    }
}

fn decor_row(id: u64, door_id: u64, x: u32, y: u32) -> DecorRow {
    DecorRow {
        id,
        door_id,
        owner: Some("local".to_string()),
        key: "plant_01".to_string(),
        text: None,
        x,
        y,
        rot: 0,
    }
}

fn board_row(id: u64, owner: &str) -> DecorRow {
    DecorRow {
        key: "board_01".to_string(),
        owner: Some(owner.to_string()),
        text: Some("hello".to_string()),
        ..decor_row(id, DOOR, 100, 100)
    }
}

fn press_at(position: Vec2) -> InputSnapshot {
    InputSnapshot::empty()
        .with_pointer_position(Some(position))
        .with_pointer_pressed(true)
}

fn hold_at(position: Vec2) -> InputSnapshot {
    InputSnapshot::empty()
        .with_pointer_position(Some(position))
        .with_pointer_down(true)
}

fn release_at(position: Vec2) -> InputSnapshot {
    InputSnapshot::empty()
        .with_pointer_position(Some(position))
        .with_pointer_released(true)
}

fn open_key() -> InputSnapshot {
    InputSnapshot::empty().with_action_pressed(InputAction::OpenDoor)
}

#[test]
fn gameplay_system_order_is_stable_and_expected_names() {
    let harness = Harness::new();
    assert_eq!(harness.scene.system_order_text(), GAMEPLAY_SYSTEM_ORDER_TEXT);
    assert_eq!(
        harness.scene.systems_host.order,
        vec![
            GameplaySystemId::FeedIngest,
            GameplaySystemId::DecorLifecycle,
            GameplaySystemId::Reconciler,
            GameplaySystemId::UiIntent,
            GameplaySystemId::KeyInput,
            GameplaySystemId::Drag,
            GameplaySystemId::PositionLimit,
            GameplaySystemId::DoorSequence,
            GameplaySystemId::Fade,
        ]
    );
}

#[test]
fn systems_host_runs_every_system_once_per_tick() {
    let mut harness = Harness::new();
    harness.tick();
    assert_eq!(harness.scene.systems_host.last_tick_order.len(), GAMEPLAY_SYSTEMS.len());
    assert_eq!(harness.scene.tick(), 1);
}

#[test]
fn load_spawns_door_and_background_only() {
    let harness = Harness::new();
    assert_eq!(harness.world.entity_count(), 2);
    assert_eq!(harness.world.iter_with::<DoorMarker>().count(), 1);
    assert_eq!(harness.world.iter_with::<Background>().count(), 1);
    assert_eq!(harness.scene.decor_count(), 0);
    assert_eq!(harness.scene.context().active_door, None);
}

#[test]
fn door_row_for_local_visitor_assigns_active_door() {
    let mut harness = Harness::new();
    harness.enter_door(DOOR);
    assert_eq!(harness.scene.context().active_door, Some(DOOR));
    let door_entity = harness.scene.state.door_entity.expect("door entity");
    let marker = harness.world.get::<DoorMarker>(door_entity).expect("marker");
    assert_eq!(marker.door_id, Some(DOOR));

    harness.feed.push_door(DoorRow {
        id: 9,
        owner: "other".to_string(),
        current_visitor: "other".to_string(),
        number: 2,
    });
    harness.tick();
    assert_eq!(harness.scene.context().active_door, Some(DOOR));
}

#[test]
fn insert_for_active_door_spawns_and_other_door_is_ignored() {
    let mut harness = Harness::at_door();
    harness.feed.push_decor(RowChange::Insert(decor_row(10, DOOR, 10, 10)));
    harness.feed.push_decor(RowChange::Insert(decor_row(11, 6, 10, 10)));
    harness.tick();

    assert_eq!(harness.scene.decor_count(), 1);
    let decor = harness.decor(10);
    assert_eq!(decor.committed, Vec2::new(10.0, 10.0));
    assert!(decor.in_sync());
    assert!(harness.scene.decor_entity(11).is_none());
    assert!(harness
        .scene
        .last_tick_events()
        .iter()
        .any(|event| matches!(event, RegistryEvent::EntityCreated(_))));
}

#[test]
fn delete_then_stray_delete_destroys_once() {
    let mut harness = Harness::at_door();
    harness.insert_decor(decor_row(10, DOOR, 10, 10));
    assert_eq!(harness.scene.decor_count(), 1);

    harness.feed.push_decor(RowChange::Delete(decor_row(10, DOOR, 10, 10)));
    harness.feed.push_decor(RowChange::Delete(decor_row(10, DOOR, 10, 10)));
    harness.feed.push_decor(RowChange::Delete(decor_row(99, DOOR, 0, 0)));
    harness.tick();

    assert_eq!(harness.scene.decor_count(), 0);
    assert_eq!(harness.destroyed_in_last_tick(), 1);

    harness.feed.push_decor(RowChange::Delete(decor_row(10, DOOR, 10, 10)));
    harness.tick();
    assert_eq!(harness.destroyed_in_last_tick(), 0);
    assert_eq!(harness.world.entity_count(), 2);
}

#[test]
fn update_moving_decor_to_other_door_destroys_it() {
    let mut harness = Harness::at_door();
    harness.insert_decor(decor_row(10, DOOR, 10, 10));
    harness.feed.push_decor(RowChange::Update(decor_row(10, 6, 10, 10)));
    harness.tick();
    assert!(harness.scene.decor_entity(10).is_none());
}

#[test]
fn drag_moves_prediction_and_confirm_converges() {
    let mut harness = Harness::at_door();
    harness.insert_decor(decor_row(1, DOOR, 10, 10));

    let sent = harness.drag(Vec2::new(20.0, 20.0), Vec2::new(60.0, 60.0));
    assert_eq!(
        sent.call,
        TransactionCall::MoveDecor {
            decor_id: 1,
            x: 50,
            y: 50,
            rot: 0
        }
    );
    assert_eq!(harness.decor(1).predicted, Vec2::new(50.0, 50.0));
    assert_eq!(harness.decor(1).committed, Vec2::new(10.0, 10.0));
    let pending = harness.scene.pending_action(1).expect("pending move");
    assert_eq!(pending.kind, PendingKind::Move);
    assert_eq!(pending.pre_action.position, Vec2::new(10.0, 10.0));

    harness
        .feed
        .push_outcome(TransactionOutcome::succeeded(sent.correlation_id, sent.call));
    harness.tick();

    let decor = harness.decor(1);
    assert_eq!(decor.committed, Vec2::new(50.0, 50.0));
    assert!(decor.in_sync());
    assert!(harness.scene.pending_action(1).is_none());
}

#[test]
fn failed_move_rolls_back_to_committed_position() {
    let mut harness = Harness::at_door();
    harness.insert_decor(decor_row(1, DOOR, 10, 10));

    let sent = harness.drag(Vec2::new(20.0, 20.0), Vec2::new(60.0, 60.0));
    assert_eq!(harness.decor(1).predicted, Vec2::new(50.0, 50.0));

    harness.feed.push_outcome(TransactionOutcome::failed(
        sent.correlation_id,
        sent.call,
        "Decor does not exist",
    ));
    harness.tick();

    let decor = harness.decor(1);
    assert_eq!(decor.predicted, Vec2::new(10.0, 10.0));
    assert!(decor.in_sync());
    assert!(decor.interactive);
    assert_eq!(harness.scene.pending_count(), 0);
}

#[test]
fn update_during_pending_move_is_deferred_and_applied_once() {
    let mut harness = Harness::at_door();
    harness.insert_decor(decor_row(1, DOOR, 10, 10));
    let sent = harness.drag(Vec2::new(20.0, 20.0), Vec2::new(60.0, 60.0));

    harness.feed.push_decor(RowChange::Update(decor_row(1, DOOR, 150, 150)));
    harness.feed.push_decor(RowChange::Update(decor_row(1, DOOR, 200, 200)));
    harness.tick();
    assert_eq!(harness.decor(1).predicted, Vec2::new(50.0, 50.0));
    assert_eq!(harness.scene.state.deferred_updates.len(), 1);

    harness
        .feed
        .push_outcome(TransactionOutcome::succeeded(sent.correlation_id, sent.call));
    harness.tick();

    let decor = harness.decor(1);
    assert_eq!(decor.committed, Vec2::new(200.0, 200.0));
    assert!(decor.in_sync());
    assert!(harness.scene.state.deferred_updates.is_empty());

    harness.ticks(3);
    assert_eq!(harness.decor(1).committed, Vec2::new(200.0, 200.0));
}

#[test]
fn update_while_grabbed_waits_for_release() {
    let mut harness = Harness::at_door();
    harness.insert_decor(decor_row(1, DOOR, 10, 10));
    harness.tick_with(&press_at(Vec2::new(20.0, 20.0)));

    harness.feed.push_decor(RowChange::Update(decor_row(1, DOOR, 300, 300)));
    harness.tick_with(&hold_at(Vec2::new(40.0, 40.0)));
    assert_eq!(harness.decor(1).predicted, Vec2::new(30.0, 30.0));
    assert!(harness.scene.state.deferred_updates.contains_key(&1));
}

#[test]
fn superseded_confirm_advances_baseline_for_later_failure() {
    let mut harness = Harness::at_door();
    harness.insert_decor(decor_row(1, DOOR, 10, 10));

    let first = harness.drag(Vec2::new(20.0, 20.0), Vec2::new(60.0, 60.0));
    let second = harness.drag(Vec2::new(60.0, 60.0), Vec2::new(110.0, 110.0));
    assert!(second.correlation_id > first.correlation_id);
    let pending = harness.scene.pending_action(1).expect("pending");
    assert_eq!(pending.correlation_id, second.correlation_id);
    assert_eq!(pending.pre_action.position, Vec2::new(10.0, 10.0));

    harness
        .feed
        .push_outcome(TransactionOutcome::succeeded(first.correlation_id, first.call));
    harness.tick();
    assert_eq!(harness.decor(1).committed, Vec2::new(50.0, 50.0));
    assert_eq!(harness.decor(1).predicted, Vec2::new(100.0, 100.0));

    harness.feed.push_outcome(TransactionOutcome::failed(
        second.correlation_id,
        second.call,
        "Decor does not exist",
    ));
    harness.tick();
    let decor = harness.decor(1);
    assert_eq!(decor.predicted, Vec2::new(50.0, 50.0));
    assert!(decor.in_sync());
}

#[test]
fn outcome_without_pending_action_is_ignored() {
    let mut harness = Harness::at_door();
    harness.insert_decor(decor_row(1, DOOR, 10, 10));
    harness.feed.push_outcome(TransactionOutcome::succeeded(
        77,
        TransactionCall::MoveDecor {
            decor_id: 1,
            x: 400,
            y: 400,
            rot: 0,
        },
    ));
    harness.tick();
    assert_eq!(harness.decor(1).committed, Vec2::new(10.0, 10.0));
}

#[test]
fn pending_action_times_out_and_rolls_back() {
    let config = ClientConfig {
        pending_action_timeout_ticks: 5,
        ..ClientConfig::default()
    };
    let mut harness = Harness::with_config(config);
    harness.enter_door(DOOR);
    harness.insert_decor(decor_row(1, DOOR, 10, 10));

    harness.scene.push_ui_event(UiEvent::DeleteRequested { decor_id: 1 });
    harness.tick();
    assert!(!harness.decor(1).interactive);
    assert_eq!(harness.submitted().len(), 1);

    harness.ticks(3);
    assert!(harness.scene.pending_action(1).is_some());

    harness.ticks(3);
    assert!(harness.scene.pending_action(1).is_none());
    assert!(harness.decor(1).interactive);
}

#[test]
fn confirmed_delete_destroys_decor_without_feed_row() {
    let mut harness = Harness::at_door();
    harness.insert_decor(decor_row(1, DOOR, 10, 10));
    harness.scene.push_ui_event(UiEvent::DeleteRequested { decor_id: 1 });
    harness.tick();
    let sent = harness.submitted().remove(0);
    assert_eq!(sent.call, TransactionCall::DeleteDecor { decor_id: 1 });

    harness
        .feed
        .push_outcome(TransactionOutcome::succeeded(sent.correlation_id, sent.call));
    harness.tick();
    assert!(harness.scene.decor_entity(1).is_none());
    assert_eq!(harness.destroyed_in_last_tick(), 1);
    assert_eq!(harness.scene.pending_count(), 0);

    harness.feed.push_decor(RowChange::Delete(decor_row(1, DOOR, 10, 10)));
    harness.tick();
    assert_eq!(harness.destroyed_in_last_tick(), 0);
}

#[test]
fn rejected_delete_restores_interactive() {
    let mut harness = Harness::at_door();
    harness.insert_decor(decor_row(1, DOOR, 10, 10));
    harness.scene.push_ui_event(UiEvent::DeleteRequested { decor_id: 1 });
    harness.tick();
    assert!(!harness.decor(1).interactive);
    let sent = harness.submitted().remove(0);

    harness.feed.push_outcome(TransactionOutcome::failed(
        sent.correlation_id,
        sent.call,
        "Not the owner",
    ));
    harness.tick();
    assert_eq!(harness.scene.pending_count(), 0);
    let decor = harness.decor(1);
    assert!(decor.interactive);
    assert!(decor.in_sync());
}

#[test]
fn rejected_move_superseded_by_text_edit_rolls_back_position() {
    let mut harness = Harness::at_door();
    harness.insert_decor(board_row(1, "local"));

    let moved = harness.drag(Vec2::new(110.0, 110.0), Vec2::new(150.0, 150.0));
    assert_eq!(harness.decor(1).predicted, Vec2::new(140.0, 140.0));

    harness.scene.push_ui_event(UiEvent::TextEditStarted { decor_id: 1 });
    harness.tick();
    harness.scene.push_ui_event(UiEvent::TextSubmitted {
        text: "moved in".to_string(),
    });
    harness.tick();
    let edited = harness.submitted().remove(0);
    assert!(edited.correlation_id > moved.correlation_id);

    harness.feed.push_outcome(TransactionOutcome::failed(
        moved.correlation_id,
        moved.call,
        "Decor does not exist",
    ));
    harness.tick();
    assert_eq!(harness.decor(1).predicted, Vec2::new(100.0, 100.0));
    assert_eq!(harness.decor(1).predicted_text.as_deref(), Some("moved in"));

    harness
        .feed
        .push_outcome(TransactionOutcome::succeeded(edited.correlation_id, edited.call));
    harness.tick();
    assert_eq!(harness.scene.pending_count(), 0);
    let decor = harness.decor(1);
    assert_eq!(decor.committed, Vec2::new(100.0, 100.0));
    assert_eq!(decor.committed_text.as_deref(), Some("moved in"));
    assert!(decor.in_sync());
}

#[test]
fn rejected_text_edit_superseded_by_move_restores_text() {
    let mut harness = Harness::at_door();
    harness.insert_decor(board_row(1, "local"));

    harness.scene.push_ui_event(UiEvent::TextEditStarted { decor_id: 1 });
    harness.tick();
    harness.scene.push_ui_event(UiEvent::TextSubmitted {
        text: "draft".to_string(),
    });
    harness.tick();
    let edited = harness.submitted().remove(0);

    let moved = harness.drag(Vec2::new(110.0, 110.0), Vec2::new(150.0, 150.0));
    harness.feed.push_outcome(TransactionOutcome::failed(
        edited.correlation_id,
        edited.call,
        "Text too long",
    ));
    harness.tick();
    assert_eq!(harness.decor(1).predicted_text.as_deref(), Some("hello"));
    assert_eq!(harness.decor(1).predicted, Vec2::new(140.0, 140.0));

    harness
        .feed
        .push_outcome(TransactionOutcome::succeeded(moved.correlation_id, moved.call));
    harness.tick();
    assert_eq!(harness.scene.pending_count(), 0);
    assert!(harness.decor(1).in_sync());
}

#[test]
fn foreign_text_board_cannot_be_deleted_or_edited() {
    let mut harness = Harness::at_door();
    harness.insert_decor(board_row(1, "other"));
    harness.insert_decor(DecorRow {
        owner: Some("other".to_string()),
        ..decor_row(2, DOOR, 300, 300)
    });

    harness.scene.push_ui_event(UiEvent::DeleteRequested { decor_id: 1 });
    harness.scene.push_ui_event(UiEvent::TextEditStarted { decor_id: 1 });
    harness.tick();
    assert!(harness.submitted().is_empty());
    assert!(!harness.scene.context().editing_text);

    harness.scene.push_ui_event(UiEvent::DeleteRequested { decor_id: 2 });
    harness.tick();
    assert_eq!(harness.submitted().len(), 1);
}

#[test]
fn text_edit_truncates_and_commits_on_confirm() {
    let mut harness = Harness::at_door();
    harness.insert_decor(board_row(1, "local"));

    harness.scene.push_ui_event(UiEvent::TextEditStarted { decor_id: 1 });
    harness.tick();
    assert!(harness.scene.context().editing_text);

    let long_text = "x".repeat(100);
    harness
        .scene
        .push_ui_event(UiEvent::TextSubmitted { text: long_text });
    harness.tick();
    assert!(!harness.scene.context().editing_text);

    let sent = harness.submitted().remove(0);
    let TransactionCall::UpdateDecorText { decor_id, text } = &sent.call else {
        panic!("expected text update, got {:?}", sent.call);
    };
    assert_eq!(*decor_id, 1);
    assert_eq!(text.chars().count(), 58);
    assert_eq!(harness.decor(1).predicted_text.as_deref(), Some(text.as_str()));
    assert_eq!(harness.decor(1).committed_text.as_deref(), Some("hello"));

    harness
        .feed
        .push_outcome(TransactionOutcome::succeeded(sent.correlation_id, sent.call.clone()));
    harness.tick();
    assert!(harness.decor(1).in_sync());
    assert_eq!(harness.decor(1).committed_text.as_deref(), Some(text.as_str()));
}

#[test]
fn open_key_is_ignored_while_editing_text() {
    let mut harness = Harness::at_door();
    harness.insert_decor(board_row(1, "local"));
    harness.scene.push_ui_event(UiEvent::TextEditStarted { decor_id: 1 });
    harness.tick_with(&open_key());
    assert_eq!(harness.scene.door_phase(), DoorPhase::Idle);

    harness.scene.push_ui_event(UiEvent::TextEditCancelled);
    harness.tick_with(&open_key());
    assert_eq!(harness.scene.door_phase(), DoorPhase::Opening);
}

#[test]
fn only_one_decor_is_grabbed_at_a_time() {
    let mut harness = Harness::at_door();
    harness.insert_decor(decor_row(1, DOOR, 10, 10));
    harness.insert_decor(decor_row(2, DOOR, 30, 30));

    harness.tick_with(&press_at(Vec2::new(40.0, 40.0)));
    let session = harness.scene.state.drag.expect("drag session");
    assert_eq!(session.decor_id, 2);

    harness.tick_with(&press_at(Vec2::new(15.0, 15.0)));
    assert_eq!(harness.scene.state.drag.map(|drag| drag.decor_id), Some(2));
    assert_eq!(harness.world.iter_with::<Grabbed>().count(), 1);
}

#[test]
fn decor_deleted_while_grabbed_drops_the_drag() {
    let mut harness = Harness::at_door();
    harness.insert_decor(decor_row(1, DOOR, 10, 10));
    harness.tick_with(&press_at(Vec2::new(20.0, 20.0)));

    harness.feed.push_decor(RowChange::Delete(decor_row(1, DOOR, 10, 10)));
    harness.tick_with(&hold_at(Vec2::new(50.0, 50.0)));
    assert!(harness.scene.state.drag.is_none());

    harness.tick_with(&release_at(Vec2::new(50.0, 50.0)));
    assert!(harness.submitted().is_empty());
}

#[test]
fn grabbed_decor_is_clamped_to_door_bounds() {
    let mut harness = Harness::at_door();
    harness.insert_decor(decor_row(1, DOOR, 10, 10));
    harness.tick_with(&press_at(Vec2::new(10.0, 10.0)));
    harness.tick_with(&hold_at(Vec2::new(2000.0, 2000.0)));
    assert_eq!(harness.decor(1).predicted, Vec2::new(736.0, 536.0));

    harness.tick_with(&release_at(Vec2::new(-50.0, 2000.0)));
    let sent = harness.submitted().remove(0);
    assert_eq!(
        sent.call,
        TransactionCall::MoveDecor {
            decor_id: 1,
            x: 0,
            y: 536,
            rot: 0
        }
    );
}

#[test]
fn update_for_torn_down_decor_does_not_respawn() {
    let mut harness = Harness::at_door();
    harness.insert_decor(decor_row(1, DOOR, 10, 10));
    harness.tick_with(&open_key());
    harness.ticks(200);
    assert_eq!(harness.scene.decor_count(), 0);
    assert_eq!(harness.scene.context().active_door, Some(DOOR));

    harness.feed.push_decor(RowChange::Update(decor_row(1, DOOR, 70, 70)));
    harness.tick();
    assert_eq!(harness.scene.decor_count(), 0);
    assert!(harness.scene.decor_entity(1).is_none());
}

#[test]
fn door_sequence_tears_down_decor_once_and_enters_once() {
    let mut harness = Harness::at_door();
    for (decor_id, x) in [(1, 10), (2, 100), (3, 200)] {
        harness.feed.push_decor(RowChange::Insert(decor_row(decor_id, DOOR, x, 10)));
    }
    harness.tick();
    assert_eq!(harness.scene.decor_count(), 3);

    let mut destroyed = 0;
    let mut enter_door_calls = 0;
    for tick in 0..90 {
        if tick < 30 {
            harness.tick_with(&open_key());
        } else {
            harness.tick();
        }
        destroyed += harness.destroyed_in_last_tick();
        enter_door_calls += harness
            .submitted()
            .iter()
            .filter(|sent| sent.call == TransactionCall::EnterDoor)
            .count();
        if tick == 30 {
            assert_eq!(harness.scene.door_phase(), DoorPhase::Opening);
            assert!(harness.scene.door().is_locked());
            assert!(harness.scene.fade_alpha() > 0.0);
        }
    }

    assert_eq!(destroyed, 3);
    assert_eq!(enter_door_calls, 1);
    assert_eq!(harness.scene.decor_count(), 0);
    assert_eq!(harness.scene.door_phase(), DoorPhase::Idle);
    assert!(!harness.scene.door().is_locked());
    assert_eq!(
        harness.scene.door().transitions(),
        &[
            (DoorPhase::Idle, DoorPhase::Opening),
            (DoorPhase::Opening, DoorPhase::Completing),
            (DoorPhase::Completing, DoorPhase::Resetting),
            (DoorPhase::Resetting, DoorPhase::Idle),
        ]
    );
    assert_eq!(harness.scene.fade_alpha(), 0.0);
    let door_entity = harness.scene.state.door_entity.expect("door entity");
    assert_eq!(
        harness.world.get::<ScenePose>(door_entity),
        Some(&ScenePose::NEUTRAL)
    );
}

#[test]
fn door_animation_offsets_decor_by_secondary_ratio() {
    let mut harness = Harness::at_door();
    harness.insert_decor(decor_row(1, DOOR, 10, 10));
    harness.tick_with(&open_key());
    harness.ticks(20);

    let door_entity = harness.scene.state.door_entity.expect("door entity");
    let door_pose = *harness.world.get::<ScenePose>(door_entity).expect("door pose");
    let decor_entity = harness.scene.decor_entity(1).expect("decor");
    let decor_pose = *harness.world.get::<ScenePose>(decor_entity).expect("decor pose");
    assert!(door_pose.x_offset > 0.0);
    assert_eq!(decor_pose.x_offset, door_pose.x_offset);
    assert!((decor_pose.y_offset - door_pose.y_offset * 0.25).abs() < 1e-4);
}

#[test]
fn intents_are_blocked_while_door_is_opening() {
    let mut harness = Harness::at_door();
    harness.insert_decor(decor_row(1, DOOR, 10, 10));
    harness.tick_with(&open_key());

    harness.scene.push_ui_event(UiEvent::DeleteRequested { decor_id: 1 });
    harness.tick_with(&press_at(Vec2::new(20.0, 20.0)));
    assert!(harness.scene.state.drag.is_none());
    assert!(harness.submitted().is_empty());
}

#[test]
fn rejected_enter_door_restores_torn_down_decor() {
    let mut harness = Harness::at_door();
    harness.insert_decor(decor_row(1, DOOR, 10, 10));
    harness.insert_decor(decor_row(2, DOOR, 100, 10));
    harness.tick_with(&open_key());
    harness.ticks(70);
    assert_eq!(harness.scene.decor_count(), 0);

    let enter = harness
        .submitted()
        .into_iter()
        .find(|sent| sent.call == TransactionCall::EnterDoor)
        .expect("enter door submitted");
    harness.feed.push_outcome(TransactionOutcome::failed(
        enter.correlation_id,
        enter.call,
        "No free door",
    ));
    harness.tick();
    assert_eq!(harness.scene.decor_count(), 2);
    assert!(harness.scene.state.door.enter_door_correlation.is_none());
}

#[test]
fn new_door_spawns_cached_rows() {
    let mut harness = Harness::at_door();
    harness.insert_decor(decor_row(1, DOOR, 10, 10));
    harness.feed.push_decor(RowChange::Insert(decor_row(20, 6, 40, 40)));
    harness.feed.push_decor(RowChange::Insert(decor_row(21, 6, 80, 80)));
    harness.feed.push_package(RowChange::Insert(PackageRow { id: 3, door_id: 6 }));
    harness.tick();
    assert_eq!(harness.scene.decor_count(), 1);
    assert_eq!(harness.scene.package_count(), 0);

    harness.enter_door(6);
    assert_eq!(harness.scene.context().active_door, Some(6));
    assert!(harness.scene.decor_entity(1).is_none());
    assert!(harness.scene.decor_entity(20).is_some());
    assert!(harness.scene.decor_entity(21).is_some());
    assert_eq!(harness.scene.package_count(), 1);
}

#[test]
fn profile_and_inventory_follow_local_rows() {
    let mut harness = Harness::at_door();
    harness.feed.push_user(UserRow {
        identity: "local".to_string(),
        current_door_number: 3,
        owned_items_deleted: 2,
    });
    harness.feed.push_user(UserRow {
        identity: "other".to_string(),
        current_door_number: 9,
        owned_items_deleted: 0,
    });
    harness.feed.push_inventory(RowChange::Insert(InventoryRow {
        id: 7,
        owner: "local".to_string(),
        decor_key: "plant_01".to_string(),
    }));
    harness.feed.push_inventory(RowChange::Insert(InventoryRow {
        id: 8,
        owner: "other".to_string(),
        decor_key: "lamp_01".to_string(),
    }));
    harness.tick();

    assert_eq!(
        harness.scene.profile(),
        PlayerProfile {
            current_door_number: 3,
            owned_items_deleted: 2
        }
    );
    assert_eq!(harness.scene.inventory().len(), 1);
    assert_eq!(harness.scene.inventory()[0].id, 7);

    harness.feed.push_inventory(RowChange::Delete(InventoryRow {
        id: 7,
        owner: "local".to_string(),
        decor_key: "plant_01".to_string(),
    }));
    harness.tick();
    assert!(harness.scene.inventory().is_empty());
}

#[test]
fn placing_from_inventory_submits_clamped_create() {
    let mut harness = Harness::at_door();
    harness.feed.push_inventory(RowChange::Insert(InventoryRow {
        id: 7,
        owner: "local".to_string(),
        decor_key: "plant_01".to_string(),
    }));
    harness.tick();

    harness.scene.push_ui_event(UiEvent::PlaceFromInventory {
        inventory_id: 7,
        position: Vec2::new(900.0, -20.0),
    });
    harness.scene.push_ui_event(UiEvent::PlaceFromInventory {
        inventory_id: 99,
        position: Vec2::new(10.0, 10.0),
    });
    harness.tick();

    let sent = harness.submitted();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].call,
        TransactionCall::CreateDecor {
            inventory_id: 7,
            x: 736,
            y: 0
        }
    );
}

#[test]
fn packages_spawn_open_and_disappear() {
    let mut harness = Harness::at_door();
    harness.feed.push_package(RowChange::Insert(PackageRow { id: 4, door_id: DOOR }));
    harness.tick();
    assert_eq!(harness.scene.package_count(), 1);
    let (_, package) = harness
        .world
        .iter_with::<PackageState>()
        .next()
        .expect("package entity");
    assert_eq!(package.position, package_slot_position(DoorBounds::default(), 4));

    harness.scene.push_ui_event(UiEvent::PackageClicked { package_id: 4 });
    harness.tick();
    let sent = harness.submitted();
    assert_eq!(sent[0].call, TransactionCall::OpenPackage { package_id: 4 });

    harness.feed.push_package(RowChange::Delete(PackageRow { id: 4, door_id: DOOR }));
    harness.tick();
    assert_eq!(harness.scene.package_count(), 0);
}

#[test]
fn unload_clears_world_and_state() {
    let mut harness = Harness::at_door();
    harness.insert_decor(decor_row(1, DOOR, 10, 10));
    harness.scene.unload(&mut harness.world);
    assert_eq!(harness.world.entity_count(), 0);
    assert_eq!(harness.scene.decor_count(), 0);
    assert_eq!(harness.scene.context().active_door, None);
}

#[test]
fn wire_coords_round_and_saturate_at_zero() {
    assert_eq!(to_wire_coord(10.4), 10);
    assert_eq!(to_wire_coord(10.5), 11);
    assert_eq!(to_wire_coord(-3.0), 0);
    assert_eq!(to_wire_coord(f32::NAN), 0);
}

#[test]
fn truncate_counts_chars_not_bytes() {
    assert_eq!(truncate_text("héllo", 2), "hé");
    assert_eq!(truncate_text("abc", 10), "abc");
}

#[test]
fn package_slots_stay_inside_door_width() {
    let bounds = DoorBounds::default();
    for package_id in 0..16 {
        let position = package_slot_position(bounds, package_id);
        assert!(position.x >= bounds.width / 2.0);
        assert!(position.x + PACKAGE_EXTENT <= bounds.x + bounds.width);
    }
}
