#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameplaySystemId {
    FeedIngest,
    DecorLifecycle,
    Reconciler,
    UiIntent,
    KeyInput,
    Drag,
    PositionLimit,
    DoorSequence,
    Fade,
}

type SystemRegistration = (GameplaySystemId, &'static str, &'static [&'static str]);

const GAMEPLAY_SYSTEMS: [SystemRegistration; 9] = [
    (GameplaySystemId::FeedIngest, "FeedIngest", &[]),
    (GameplaySystemId::DecorLifecycle, "DecorLifecycle", &["FeedIngest"]),
    (GameplaySystemId::Reconciler, "Reconciler", &["DecorLifecycle"]),
    (GameplaySystemId::UiIntent, "UiIntent", &["Reconciler"]),
    (GameplaySystemId::KeyInput, "KeyInput", &["UiIntent"]),
    (GameplaySystemId::Drag, "Drag", &["Reconciler"]),
    (GameplaySystemId::PositionLimit, "PositionLimit", &["Drag"]),
    (
        GameplaySystemId::DoorSequence,
        "DoorSequence",
        &["KeyInput", "PositionLimit"],
    ),
    (GameplaySystemId::Fade, "Fade", &["DoorSequence"]),
];

struct GameplaySystemContext<'a> {
    fixed_dt_ms: f32,
    input: &'a InputSnapshot,
    world: &'a mut Registry<GameComponent>,
    feed: &'a FeedHandle,
    sink: &'a mut Box<dyn TransactionSink>,
    config: &'a ClientConfig,
    state: &'a mut GameplayState,
}

#[derive(Debug)]
struct GameplaySystemsHost {
    order: Vec<GameplaySystemId>,
    order_text: String,
    last_tick_order: Vec<GameplaySystemId>,
}

impl GameplaySystemsHost {
    fn new() -> Result<Self, ScheduleError> {
        let mut schedule = Schedule::new();
        for (system_id, name, dependencies) in GAMEPLAY_SYSTEMS {
            schedule.register(system_id, name, dependencies)?;
        }
        let resolved = schedule.resolve()?;
        Ok(Self {
            order: resolved.iter().map(|(system_id, _)| *system_id).collect(),
            order_text: order_text(&resolved),
            last_tick_order: Vec::new(),
        })
    }

    fn order_text(&self) -> &str {
        &self.order_text
    }

    fn run_once_per_tick(&mut self, context: &mut GameplaySystemContext<'_>) {
        self.last_tick_order.clear();
        for &system_id in &self.order {
            self.last_tick_order.push(system_id);
            run_system(system_id, context);
        }
    }
}

fn run_system(system_id: GameplaySystemId, context: &mut GameplaySystemContext<'_>) {
    match system_id {
        GameplaySystemId::FeedIngest => context.run_feed_ingest(),
        GameplaySystemId::DecorLifecycle => context.run_decor_lifecycle(),
        GameplaySystemId::Reconciler => context.run_reconciler(),
        GameplaySystemId::UiIntent => context.run_ui_intents(),
        GameplaySystemId::KeyInput => context.run_key_input(),
        GameplaySystemId::Drag => context.run_drag(),
        GameplaySystemId::PositionLimit => context.run_position_limit(),
        GameplaySystemId::DoorSequence => context.run_door_sequence(),
        GameplaySystemId::Fade => context.run_fade(),
    }
}

impl GameplaySystemContext<'_> {
    fn submit(&mut self, call: TransactionCall) -> u64 {
        let correlation_id = self.state.next_correlation_id;
        self.state.next_correlation_id = correlation_id.saturating_add(1);
        debug!(correlation_id, call = ?call, "transaction_submitted");
        self.sink.submit(OutgoingTransaction {
            correlation_id,
            call,
        });
        correlation_id
    }

    fn decor_entity(&self, decor_id: u64) -> Option<EntityId> {
        self.state.decor_by_id.get(&decor_id).copied()
    }

    fn decor(&self, decor_id: u64) -> Option<&DecorState> {
        self.decor_entity(decor_id)
            .and_then(|entity| self.world.get::<DecorState>(entity))
    }

    fn decor_mut(&mut self, decor_id: u64) -> Option<&mut DecorState> {
        let entity = self.decor_entity(decor_id)?;
        self.world.get_mut::<DecorState>(entity)
    }

    fn is_grabbed(&self, decor_id: u64) -> bool {
        self.state
            .drag
            .is_some_and(|session| session.decor_id == decor_id)
    }

    fn local_identity(&self) -> &str {
        &self.state.context.local_identity
    }

    fn spawn_decor(&mut self, row: &DecorRow) -> EntityId {
        let extent = Vec2::new(self.config.decor_extent, self.config.decor_extent);
        let pose = self
            .state
            .door
            .pose
            .value()
            .for_decor(self.config.decor_secondary_offset_ratio);
        let entity = self.world.spawn([
            GameComponent::Decor(DecorState::from_row(row, extent)),
            GameComponent::Pose(pose),
            GameComponent::PositionLimit(PositionLimit {
                bounds: self.config.door_bounds,
            }),
        ]);
        self.state.decor_by_id.insert(row.id, entity);
        info!(
            decor_id = row.id,
            door_id = row.door_id,
            key = row.key.as_str(),
            x = row.x,
            y = row.y,
            "decor_spawned"
        );
        entity
    }

    /// Destroys one decor entity and drops all local state keyed by it.
    /// Unknown ids are a no-op.
    fn destroy_decor(&mut self, decor_id: u64, reason: &'static str) -> bool {
        let Some(entity) = self.state.decor_by_id.remove(&decor_id) else {
            debug!(decor_id, reason, "decor_destroy_ignored_unknown");
            return false;
        };
        self.world.destroy_entity(entity);
        self.state.deferred_updates.remove(&decor_id);
        self.state.pending.remove(&decor_id);
        if self.is_grabbed(decor_id) {
            self.state.drag = None;
            info!(decor_id, "drag_discarded");
        }
        if self.state.context.editing_decor == Some(decor_id) {
            self.state.context.editing_decor = None;
            self.state.context.editing_text = false;
        }
        info!(decor_id, reason, "decor_destroyed");
        true
    }

    fn destroy_package(&mut self, package_id: u64) -> bool {
        let Some(entity) = self.state.packages_by_id.remove(&package_id) else {
            return false;
        };
        self.world.destroy_entity(entity);
        info!(package_id, "package_destroyed");
        true
    }
}
