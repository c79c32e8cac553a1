impl Scene for DoorScene {
    type Components = GameComponent;

    fn load(&mut self, world: &mut Registry<GameComponent>) {
        world.clear();
        self.reset_state();
        let door = world.spawn([
            GameComponent::Door(DoorMarker::default()),
            GameComponent::Pose(ScenePose::NEUTRAL),
        ]);
        let background = world.spawn([
            GameComponent::Background(Background),
            GameComponent::Pose(ScenePose::NEUTRAL.for_background()),
        ]);
        self.state.door_entity = Some(door);
        self.state.background_entity = Some(background);
        world.drain_events();
        info!(
            identity = self.state.context.local_identity.as_str(),
            entity_count = world.entity_count(),
            sys = %self.systems_host.order_text(),
            "scene_loaded"
        );
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut Registry<GameComponent>,
    ) -> SceneCommand {
        self.state.tick = self.state.tick.saturating_add(1);
        {
            let mut context = GameplaySystemContext {
                fixed_dt_ms: fixed_dt_seconds * 1000.0,
                input,
                world,
                feed: &self.feed,
                sink: &mut self.sink,
                config: &self.config,
                state: &mut self.state,
            };
            self.systems_host.run_once_per_tick(&mut context);
        }
        self.state.last_tick_events = world.drain_events();
        SceneCommand::None
    }

    fn unload(&mut self, world: &mut Registry<GameComponent>) {
        let pending = self.state.pending.len();
        world.clear();
        world.drain_events();
        self.reset_state();
        info!(pending_dropped = pending, "scene_unloaded");
    }

    fn debug_title(&self, world: &Registry<GameComponent>) -> Option<String> {
        let door = self
            .state
            .context
            .active_door
            .map_or_else(|| "-".to_string(), |door_id| door_id.to_string());
        Some(format!(
            "door {door} | decor {} | pending {} | entities {} | {:?}",
            self.state.decor_by_id.len(),
            self.state.pending.len(),
            world.entity_count(),
            self.state.door.phase()
        ))
    }
}
