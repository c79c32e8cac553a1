/// Everything the systems mutate besides the registry. Reset on every load.
#[derive(Debug)]
struct GameplayState {
    tick: u64,
    context: SceneContext,
    batch: FeedBatch,
    decor_by_id: BTreeMap<u64, EntityId>,
    packages_by_id: BTreeMap<u64, EntityId>,
    door_entity: Option<EntityId>,
    background_entity: Option<EntityId>,
    pending: BTreeMap<u64, PendingAction>,
    deferred_updates: BTreeMap<u64, DecorRow>,
    drag: Option<DragSession>,
    door: DoorSequenceState,
    fade: FadeState,
    inventory: Vec<InventoryRow>,
    profile: PlayerProfile,
    ui_events: VecDeque<UiEvent>,
    next_correlation_id: u64,
    last_tick_events: Vec<RegistryEvent<ComponentKind>>,
}

impl GameplayState {
    fn new(local_identity: &str) -> Self {
        Self {
            tick: 0,
            context: SceneContext::new(local_identity),
            batch: FeedBatch::default(),
            decor_by_id: BTreeMap::new(),
            packages_by_id: BTreeMap::new(),
            door_entity: None,
            background_entity: None,
            pending: BTreeMap::new(),
            deferred_updates: BTreeMap::new(),
            drag: None,
            door: DoorSequenceState::default(),
            fade: FadeState::default(),
            inventory: Vec::new(),
            profile: PlayerProfile::default(),
            ui_events: VecDeque::new(),
            next_correlation_id: 1,
            last_tick_events: Vec::new(),
        }
    }
}

/// The single door scene: decor of the active door, its background, packages
/// waiting to be opened and the transition into the next door.
pub(crate) struct DoorScene {
    config: ClientConfig,
    feed: FeedHandle,
    sink: Box<dyn TransactionSink>,
    systems_host: GameplaySystemsHost,
    state: GameplayState,
}

impl DoorScene {
    pub(crate) fn new(
        config: ClientConfig,
        feed: FeedHandle,
        sink: Box<dyn TransactionSink>,
    ) -> Result<Self, ScheduleError> {
        let systems_host = GameplaySystemsHost::new()?;
        let state = GameplayState::new(&config.local_identity);
        Ok(Self {
            config,
            feed,
            sink,
            systems_host,
            state,
        })
    }

    /// Queues a UI intent for the next tick.
    pub(crate) fn push_ui_event(&mut self, event: UiEvent) {
        self.state.ui_events.push_back(event);
    }

    pub(crate) fn context(&self) -> &SceneContext {
        &self.state.context
    }

    pub(crate) fn profile(&self) -> PlayerProfile {
        self.state.profile
    }

    pub(crate) fn inventory(&self) -> &[InventoryRow] {
        &self.state.inventory
    }

    pub(crate) fn door(&self) -> &DoorSequenceState {
        &self.state.door
    }

    pub(crate) fn door_phase(&self) -> DoorPhase {
        self.state.door.phase()
    }

    pub(crate) fn fade_alpha(&self) -> f32 {
        self.state.fade.alpha()
    }

    pub(crate) fn pending_action(&self, decor_id: u64) -> Option<&PendingAction> {
        self.state.pending.get(&decor_id)
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.state.pending.len()
    }

    pub(crate) fn decor_entity(&self, decor_id: u64) -> Option<EntityId> {
        self.state.decor_by_id.get(&decor_id).copied()
    }

    pub(crate) fn decor_count(&self) -> usize {
        self.state.decor_by_id.len()
    }

    pub(crate) fn package_count(&self) -> usize {
        self.state.packages_by_id.len()
    }

    pub(crate) fn system_order_text(&self) -> &str {
        self.systems_host.order_text()
    }

    /// Registry events raised during the most recent tick.
    pub(crate) fn last_tick_events(&self) -> &[RegistryEvent<ComponentKind>] {
        &self.state.last_tick_events
    }

    pub(crate) fn tick(&self) -> u64 {
        self.state.tick
    }

    fn reset_state(&mut self) {
        self.state = GameplayState::new(&self.config.local_identity);
    }
}
