impl GameplaySystemContext<'_> {
    fn run_key_input(&mut self) {
        if !self.input.just_pressed(InputAction::OpenDoor) {
            return;
        }
        if self.state.context.editing_text {
            debug!("door_trigger_ignored_editing_text");
            return;
        }
        if self.state.door.is_locked() {
            debug!(phase = ?self.state.door.phase(), "door_trigger_ignored_busy");
            return;
        }
        self.start_door_opening();
    }

    fn start_door_opening(&mut self) {
        let door = &mut self.state.door;
        door.transition(DoorPhase::Opening);
        door.pose.to(ScenePose::DOOR_OPEN, self.config.door_open_duration_ms);
        self.state.fade.fade_out(self.config.fade_out_duration_ms);
    }

    fn run_door_sequence(&mut self) {
        self.handle_enter_door_outcomes();

        if self.state.door.phase() != DoorPhase::Opening {
            return;
        }
        match self.state.door.pose.update(self.fixed_dt_ms) {
            TweenStep::Running(pose) => self.apply_scene_pose(pose),
            TweenStep::Completed(pose) => {
                self.apply_scene_pose(pose);
                self.finish_door_sequence();
            }
            TweenStep::Idle => self.finish_door_sequence(),
        }
    }

    /// Opening -> Completing -> Resetting -> Idle, all within the tick the
    /// open animation completes.
    fn finish_door_sequence(&mut self) {
        self.state.door.transition(DoorPhase::Completing);
        let correlation_id = self.submit(TransactionCall::EnterDoor);
        self.state.door.enter_door_correlation = Some(correlation_id);
        self.state.fade.fade_in(self.config.fade_in_duration_ms);
        let active_door = self.state.context.active_door;
        let snapshot: Vec<u64> = self
            .state
            .decor_by_id
            .keys()
            .copied()
            .filter(|decor_id| {
                self.decor(*decor_id)
                    .is_some_and(|decor| Some(decor.door_id) == active_door)
            })
            .collect();
        info!(correlation_id, decor_count = snapshot.len(), "door_entering");
        self.state.door.teardown = snapshot;

        self.state.door.transition(DoorPhase::Resetting);
        self.state.door.pose.set(ScenePose::NEUTRAL);
        self.apply_scene_pose(ScenePose::NEUTRAL);
        for decor_id in std::mem::take(&mut self.state.door.teardown) {
            self.destroy_decor(decor_id, "door_teardown");
        }

        self.state.door.transition(DoorPhase::Idle);
    }

    fn apply_scene_pose(&mut self, pose: ScenePose) {
        if let Some(door_pose) = self
            .state
            .door_entity
            .and_then(|entity| self.world.get_mut::<ScenePose>(entity))
        {
            *door_pose = pose;
        }
        if let Some(background_pose) = self
            .state
            .background_entity
            .and_then(|entity| self.world.get_mut::<ScenePose>(entity))
        {
            *background_pose = pose.for_background();
        }
        let decor_pose = pose.for_decor(self.config.decor_secondary_offset_ratio);
        for entity in self.state.decor_by_id.values() {
            if let Some(current) = self.world.get_mut::<ScenePose>(*entity) {
                *current = decor_pose;
            }
        }
    }

    /// A rejected door change leaves the player where they were; the decor torn
    /// down for the transition is brought back from the row cache.
    fn handle_enter_door_outcomes(&mut self) {
        while let Some(outcome) = self.state.batch.enter_door_outcomes.pop_front() {
            if self.state.door.enter_door_correlation != Some(outcome.correlation_id) {
                debug!(correlation_id = outcome.correlation_id, "enter_door_outcome_unmatched");
                continue;
            }
            self.state.door.enter_door_correlation = None;
            match &outcome.status {
                OutcomeStatus::Succeeded => {
                    info!(correlation_id = outcome.correlation_id, "enter_door_confirmed");
                }
                OutcomeStatus::Failed { reason } => {
                    warn!(
                        correlation_id = outcome.correlation_id,
                        reason = reason.as_str(),
                        "enter_door_failed"
                    );
                    let respawned = self.resync_active_door();
                    info!(respawned, "door_resynced");
                }
            }
        }
    }

    fn run_fade(&mut self) {
        if let TweenStep::Completed(alpha) = self.state.fade.alpha.update(self.fixed_dt_ms) {
            debug!(alpha, "fade_finished");
        }
    }
}
