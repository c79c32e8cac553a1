impl GameplaySystemContext<'_> {
    fn run_drag(&mut self) {
        if let Some(session) = self.state.drag {
            if self.decor_entity(session.decor_id) != Some(session.entity)
                || !self.world.contains(session.entity)
            {
                self.state.drag = None;
                info!(decor_id = session.decor_id, "drag_discarded");
            }
        }

        let pointer = self.input.pointer_position();
        let can_grab = !self.state.door.is_locked() && !self.state.context.editing_text;
        if self.state.drag.is_none() && self.input.pointer_pressed() && can_grab {
            if let Some(pointer) = pointer {
                self.try_start_drag(pointer);
            }
        }

        let Some(session) = self.state.drag else {
            return;
        };
        if let Some(pointer) = pointer {
            if let Some(decor) = self.world.get_mut::<DecorState>(session.entity) {
                decor.predicted = pointer - session.grab_offset;
            }
        }
        if self.input.pointer_released() {
            self.release_drag(session);
        }
    }

    fn try_start_drag(&mut self, pointer: Vec2) {
        // Later spawns draw on top, so the last hit wins.
        let hit = self
            .world
            .iter_with::<DecorState>()
            .filter(|(_, decor)| decor.interactive && decor.contains_point(pointer))
            .map(|(entity, decor)| (entity, decor.decor_id, decor.predicted))
            .last();
        let Some((entity, decor_id, anchor)) = hit else {
            return;
        };

        let grab_offset = pointer - anchor;
        self.world.insert(entity, Grabbed { grab_offset });
        self.state.drag = Some(DragSession {
            entity,
            decor_id,
            grab_offset,
        });
        info!(decor_id, x = anchor.x, y = anchor.y, "drag_started");
    }

    fn release_drag(&mut self, session: DragSession) {
        self.state.drag = None;
        self.world.remove::<Grabbed>(session.entity);

        let limit = self.world.get::<PositionLimit>(session.entity).copied();
        let Some(decor) = self.world.get_mut::<DecorState>(session.entity) else {
            return;
        };
        let target = match limit {
            Some(limit) => limit.clamp(decor.predicted, decor.extent),
            None => decor.predicted,
        };
        let x = to_wire_coord(target.x);
        let y = to_wire_coord(target.y);
        decor.predicted = Vec2::new(x as f32, y as f32);
        let rot = decor.rot;

        info!(decor_id = session.decor_id, x, y, "drag_released");
        self.issue_action(
            session.decor_id,
            PendingKind::Move,
            TransactionCall::MoveDecor {
                decor_id: session.decor_id,
                x,
                y,
                rot,
            },
        );
    }

    /// Keeps the grabbed decor inside the door bounds.
    fn run_position_limit(&mut self) {
        let Some(session) = self.state.drag else {
            return;
        };
        let Some(limit) = self.world.get::<PositionLimit>(session.entity).copied() else {
            return;
        };
        if let Some(decor) = self.world.get_mut::<DecorState>(session.entity) {
            decor.predicted = limit.clamp(decor.predicted, decor.extent);
        }
    }
}
