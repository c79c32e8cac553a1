use serde::{Deserialize, Serialize};

use super::scene::{InputSnapshot, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputAction {
    OpenDoor,
    Quit,
}

const ACTION_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionStates {
    down: [bool; ACTION_COUNT],
    pressed: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub fn set_pressed_edge(&mut self, action: InputAction, pressed: bool) {
        self.pressed[action.index()] = pressed;
    }

    pub fn just_pressed(&self, action: InputAction) -> bool {
        self.pressed[action.index()]
    }

    fn clear_edges(&mut self) {
        self.pressed = [false; ACTION_COUNT];
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::OpenDoor => 0,
            InputAction::Quit => 1,
        }
    }
}

/// Raw device events as delivered by the platform layer, between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawInputEvent {
    PointerMoved { x: f32, y: f32 },
    PointerLeft,
    PointerButton { pressed: bool },
    Key { action: InputAction, pressed: bool },
}

/// Folds raw events into edge-triggered per-tick snapshots.
#[derive(Debug, Default)]
pub struct InputCollector {
    quit_requested: bool,
    actions: ActionStates,
    pointer_position: Option<Vec2>,
    pointer_is_down: bool,
    pointer_pressed_edge: bool,
    pointer_released_edge: bool,
}

impl InputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: RawInputEvent) {
        match event {
            RawInputEvent::PointerMoved { x, y } => {
                self.pointer_position = Some(Vec2::new(x, y));
            }
            RawInputEvent::PointerLeft => {
                self.pointer_position = None;
            }
            RawInputEvent::PointerButton { pressed } => self.handle_pointer_button(pressed),
            RawInputEvent::Key { action, pressed } => self.handle_key(action, pressed),
        }
    }

    fn handle_pointer_button(&mut self, pressed: bool) {
        if pressed {
            if !self.pointer_is_down {
                self.pointer_pressed_edge = true;
            }
            self.pointer_is_down = true;
        } else {
            if self.pointer_is_down {
                self.pointer_released_edge = true;
            }
            self.pointer_is_down = false;
        }
    }

    fn handle_key(&mut self, action: InputAction, pressed: bool) {
        if pressed && !self.actions.is_down(action) {
            self.actions.set_pressed_edge(action, true);
            if action == InputAction::Quit {
                self.quit_requested = true;
            }
        }
        self.actions.set(action, pressed);
    }

    pub fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(
            self.quit_requested,
            self.actions,
            self.pointer_position,
            self.pointer_is_down,
            self.pointer_pressed_edge,
            self.pointer_released_edge,
        );
        self.actions.clear_edges();
        self.pointer_pressed_edge = false;
        self.pointer_released_edge = false;
        snapshot
    }
}
