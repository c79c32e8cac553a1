#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum ComponentKind {
    Decor,
    Grabbed,
    Pose,
    PositionLimit,
    Door,
    Background,
    Package,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GameComponent {
    Decor(DecorState),
    Grabbed(Grabbed),
    Pose(ScenePose),
    PositionLimit(PositionLimit),
    Door(DoorMarker),
    Background(Background),
    Package(PackageState),
}

impl ComponentSet for GameComponent {
    type Kind = ComponentKind;

    fn kind(&self) -> ComponentKind {
        match self {
            Self::Decor(_) => ComponentKind::Decor,
            Self::Grabbed(_) => ComponentKind::Grabbed,
            Self::Pose(_) => ComponentKind::Pose,
            Self::PositionLimit(_) => ComponentKind::PositionLimit,
            Self::Door(_) => ComponentKind::Door,
            Self::Background(_) => ComponentKind::Background,
            Self::Package(_) => ComponentKind::Package,
        }
    }
}

macro_rules! typed_component {
    ($ty:ty, $variant:ident) => {
        impl TypedComponent<GameComponent> for $ty {
            const KIND: ComponentKind = ComponentKind::$variant;

            fn from_ref(component: &GameComponent) -> Option<&Self> {
                match component {
                    GameComponent::$variant(value) => Some(value),
                    _ => None,
                }
            }

            fn from_mut(component: &mut GameComponent) -> Option<&mut Self> {
                match component {
                    GameComponent::$variant(value) => Some(value),
                    _ => None,
                }
            }

            fn into_set(self) -> GameComponent {
                GameComponent::$variant(self)
            }
        }
    };
}

typed_component!(DecorState, Decor);
typed_component!(Grabbed, Grabbed);
typed_component!(ScenePose, Pose);
typed_component!(PositionLimit, PositionLimit);
typed_component!(DoorMarker, Door);
typed_component!(Background, Background);
typed_component!(PackageState, Package);

/// One placed decor item as mirrored from the store.
///
/// `committed*` fields hold the last values the store confirmed, `predicted*`
/// the values currently shown. They only differ while an action is in flight
/// or the item is grabbed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DecorState {
    pub(crate) decor_id: u64,
    pub(crate) door_id: u64,
    pub(crate) key: String,
    pub(crate) owner: Option<String>,
    pub(crate) committed: Vec2,
    pub(crate) predicted: Vec2,
    pub(crate) committed_text: Option<String>,
    pub(crate) predicted_text: Option<String>,
    pub(crate) rot: u32,
    pub(crate) extent: Vec2,
    pub(crate) interactive: bool,
}

impl DecorState {
    fn from_row(row: &DecorRow, extent: Vec2) -> Self {
        let position = Vec2::new(row.x as f32, row.y as f32);
        Self {
            decor_id: row.id,
            door_id: row.door_id,
            key: row.key.clone(),
            owner: row.owner.clone(),
            committed: position,
            predicted: position,
            committed_text: row.text.clone(),
            predicted_text: row.text.clone(),
            rot: row.rot,
            extent,
            interactive: true,
        }
    }

    fn apply_row(&mut self, row: &DecorRow) {
        let position = Vec2::new(row.x as f32, row.y as f32);
        self.door_id = row.door_id;
        self.key = row.key.clone();
        self.owner = row.owner.clone();
        self.committed = position;
        self.predicted = position;
        self.committed_text = row.text.clone();
        self.predicted_text = row.text.clone();
        self.rot = row.rot;
    }

    pub(crate) fn is_text_bearing(&self) -> bool {
        is_text_bearing_key(&self.key)
    }

    fn is_owned_by(&self, identity: &str) -> bool {
        self.owner.as_deref() == Some(identity)
    }

    /// Text-bearing decor belongs to its owner; everything else is fair game.
    fn can_be_deleted_by(&self, identity: &str) -> bool {
        !self.is_text_bearing() || self.is_owned_by(identity)
    }

    fn can_be_edited_by(&self, identity: &str) -> bool {
        self.is_text_bearing() && self.is_owned_by(identity)
    }

    fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.predicted.x
            && point.y >= self.predicted.y
            && point.x <= self.predicted.x + self.extent.x
            && point.y <= self.predicted.y + self.extent.y
    }

    pub(crate) fn in_sync(&self) -> bool {
        self.predicted == self.committed && self.predicted_text == self.committed_text
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Grabbed {
    pub(crate) grab_offset: Vec2,
}

/// Transform offsets the door animation applies on top of base positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScenePose {
    pub(crate) x_offset: f32,
    pub(crate) y_offset: f32,
    pub(crate) skew: f32,
    pub(crate) scale: f32,
}

impl ScenePose {
    pub(crate) const NEUTRAL: ScenePose = ScenePose {
        x_offset: 0.0,
        y_offset: 0.0,
        skew: 0.0,
        scale: 1.0,
    };

    pub(crate) const DOOR_OPEN: ScenePose = ScenePose {
        x_offset: 400.0,
        y_offset: -350.0,
        skew: -1.4,
        scale: 5.0,
    };

    fn for_decor(self, secondary_offset_ratio: f32) -> ScenePose {
        ScenePose {
            y_offset: self.y_offset * secondary_offset_ratio,
            ..self
        }
    }

    fn for_background(self) -> ScenePose {
        ScenePose {
            scale: self.scale,
            ..ScenePose::NEUTRAL
        }
    }
}

impl Lerp for ScenePose {
    fn lerp(self, target: ScenePose, t: f32) -> ScenePose {
        ScenePose {
            x_offset: self.x_offset.lerp(target.x_offset, t),
            y_offset: self.y_offset.lerp(target.y_offset, t),
            skew: self.skew.lerp(target.skew, t),
            scale: self.scale.lerp(target.scale, t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PositionLimit {
    pub(crate) bounds: DoorBounds,
}

impl PositionLimit {
    /// Keeps an item of `extent` (anchored top-left) fully inside the bounds.
    fn clamp(&self, position: Vec2, extent: Vec2) -> Vec2 {
        let max_x = (self.bounds.x + self.bounds.width - extent.x).max(self.bounds.x);
        let max_y = (self.bounds.y + self.bounds.height - extent.y).max(self.bounds.y);
        Vec2::new(
            position.x.clamp(self.bounds.x, max_x),
            position.y.clamp(self.bounds.y, max_y),
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct DoorMarker {
    pub(crate) door_id: Option<u64>,
    pub(crate) number: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Background;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PackageState {
    pub(crate) package_id: u64,
    pub(crate) door_id: u64,
    pub(crate) position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PendingKind {
    Move,
    Delete,
    EditText,
}

/// Committed baseline captured when an action is issued; failures restore it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PreActionState {
    pub(crate) position: Vec2,
    pub(crate) text: Option<String>,
    pub(crate) interactive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingAction {
    pub(crate) decor_id: u64,
    pub(crate) kind: PendingKind,
    pub(crate) correlation_id: u64,
    pub(crate) pre_action: PreActionState,
    pub(crate) issued_at_tick: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DragSession {
    pub(crate) entity: EntityId,
    pub(crate) decor_id: u64,
    pub(crate) grab_offset: Vec2,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum DoorPhase {
    #[default]
    Idle,
    Opening,
    Completing,
    Resetting,
}

#[derive(Debug, Clone)]
pub(crate) struct DoorSequenceState {
    phase: DoorPhase,
    trigger_lock: bool,
    pose: Tween<ScenePose>,
    teardown: Vec<u64>,
    enter_door_correlation: Option<u64>,
    transitions: Vec<(DoorPhase, DoorPhase)>,
}

impl Default for DoorSequenceState {
    fn default() -> Self {
        Self {
            phase: DoorPhase::Idle,
            trigger_lock: false,
            pose: Tween::new(ScenePose::NEUTRAL).with_easing(Easing::ExponentialInOut),
            teardown: Vec::new(),
            enter_door_correlation: None,
            transitions: Vec::new(),
        }
    }
}

impl DoorSequenceState {
    pub(crate) fn phase(&self) -> DoorPhase {
        self.phase
    }

    pub(crate) fn is_locked(&self) -> bool {
        self.trigger_lock
    }

    /// Every phase change since the scene loaded, oldest first.
    pub(crate) fn transitions(&self) -> &[(DoorPhase, DoorPhase)] {
        &self.transitions
    }

    fn transition(&mut self, next: DoorPhase) {
        let previous = self.phase;
        self.phase = next;
        self.trigger_lock = next != DoorPhase::Idle;
        self.transitions.push((previous, next));
        info!(from = ?previous, to = ?next, "door_phase_changed");
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FadeState {
    alpha: Tween<f32>,
}

impl Default for FadeState {
    fn default() -> Self {
        Self {
            alpha: Tween::new(0.0),
        }
    }
}

impl FadeState {
    pub(crate) fn alpha(&self) -> f32 {
        self.alpha.value()
    }

    fn fade_out(&mut self, duration_ms: f32) {
        self.alpha.stop();
        self.alpha.to(1.0, duration_ms);
    }

    fn fade_in(&mut self, duration_ms: f32) {
        self.alpha.stop();
        self.alpha.to(0.0, duration_ms);
    }
}

/// State shared by several systems, scoped to the scene instead of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SceneContext {
    pub(crate) editing_text: bool,
    pub(crate) editing_decor: Option<u64>,
    pub(crate) active_door: Option<u64>,
    pub(crate) local_identity: String,
}

impl SceneContext {
    fn new(local_identity: &str) -> Self {
        Self {
            editing_text: false,
            editing_decor: None,
            active_door: None,
            local_identity: local_identity.to_string(),
        }
    }
}

/// Intents raised by UI widgets (text box, inventory, click handlers).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum UiEvent {
    TextEditStarted { decor_id: u64 },
    TextSubmitted { text: String },
    TextEditCancelled,
    DeleteRequested { decor_id: u64 },
    PackageClicked { package_id: u64 },
    PlaceFromInventory { inventory_id: u64, position: Vec2 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PlayerProfile {
    pub(crate) current_door_number: u8,
    pub(crate) owned_items_deleted: u8,
}
