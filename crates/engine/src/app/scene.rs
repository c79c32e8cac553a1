use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use super::input::{ActionStates, InputAction};
use super::registry::{ComponentSet, Registry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Exit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    pointer_position: Option<Vec2>,
    pointer_down: bool,
    pointer_pressed: bool,
    pointer_released: bool,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        actions: ActionStates,
        pointer_position: Option<Vec2>,
        pointer_down: bool,
        pointer_pressed: bool,
        pointer_released: bool,
    ) -> Self {
        Self {
            quit_requested,
            actions,
            pointer_position,
            pointer_down,
            pointer_pressed,
            pointer_released,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn just_pressed(&self, action: InputAction) -> bool {
        self.actions.just_pressed(action)
    }

    pub fn with_action_pressed(mut self, action: InputAction) -> Self {
        self.actions.set(action, true);
        self.actions.set_pressed_edge(action, true);
        self
    }

    pub fn with_pointer_position(mut self, pointer_position: Option<Vec2>) -> Self {
        self.pointer_position = pointer_position;
        self
    }

    pub fn with_pointer_down(mut self, pointer_down: bool) -> Self {
        self.pointer_down = pointer_down;
        self
    }

    pub fn with_pointer_pressed(mut self, pointer_pressed: bool) -> Self {
        self.pointer_pressed = pointer_pressed;
        if pointer_pressed {
            self.pointer_down = true;
        }
        self
    }

    pub fn with_pointer_released(mut self, pointer_released: bool) -> Self {
        self.pointer_released = pointer_released;
        if pointer_released {
            self.pointer_down = false;
        }
        self
    }

    pub fn pointer_position(&self) -> Option<Vec2> {
        self.pointer_position
    }

    pub fn pointer_down(&self) -> bool {
        self.pointer_down
    }

    pub fn pointer_pressed(&self) -> bool {
        self.pointer_pressed
    }

    pub fn pointer_released(&self) -> bool {
        self.pointer_released
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

pub trait Scene {
    type Components: ComponentSet;

    fn load(&mut self, world: &mut Registry<Self::Components>);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut Registry<Self::Components>,
    ) -> SceneCommand;
    fn unload(&mut self, world: &mut Registry<Self::Components>);
    fn debug_title(&self, _world: &Registry<Self::Components>) -> Option<String> {
        None
    }
}
