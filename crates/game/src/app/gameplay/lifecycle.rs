impl GameplaySystemContext<'_> {
    fn run_feed_ingest(&mut self) {
        self.state.batch = self.feed.drain();
        if self.state.batch.is_empty() {
            return;
        }

        while let Some(user) = self.state.batch.users.pop_front() {
            if user.identity != self.state.context.local_identity {
                continue;
            }
            self.state.profile = PlayerProfile {
                current_door_number: user.current_door_number,
                owned_items_deleted: user.owned_items_deleted,
            };
            info!(
                current_door_number = user.current_door_number,
                owned_items_deleted = user.owned_items_deleted,
                "profile_updated"
            );
        }

        while let Some(change) = self.state.batch.inventory.pop_front() {
            self.apply_inventory_change(change);
        }
    }

    fn apply_inventory_change(&mut self, change: RowChange<InventoryRow>) {
        match change {
            RowChange::Insert(row) | RowChange::Update(row) => {
                if row.owner != self.state.context.local_identity {
                    return;
                }
                match self
                    .state
                    .inventory
                    .iter_mut()
                    .find(|item| item.id == row.id)
                {
                    Some(existing) => *existing = row,
                    None => {
                        debug!(inventory_id = row.id, key = row.decor_key.as_str(), "inventory_added");
                        self.state.inventory.push(row);
                    }
                }
            }
            RowChange::Delete(row) => {
                if let Some(index) = self
                    .state
                    .inventory
                    .iter()
                    .position(|item| item.id == row.id)
                {
                    self.state.inventory.remove(index);
                    debug!(inventory_id = row.id, "inventory_removed");
                }
            }
        }
    }

    fn run_decor_lifecycle(&mut self) {
        while let Some(door) = self.state.batch.doors.pop_front() {
            self.apply_door_row(door);
        }

        while let Some(change) = self.state.batch.decor.pop_front() {
            match change {
                RowChange::Insert(row) => self.on_decor_insert(row),
                RowChange::Update(row) => self.on_decor_update(row),
                RowChange::Delete(row) => {
                    self.destroy_decor(row.id, "feed_delete");
                }
            }
        }

        while let Some(change) = self.state.batch.packages.pop_front() {
            match change {
                RowChange::Insert(row) | RowChange::Update(row) => self.on_package_row(row),
                RowChange::Delete(row) => {
                    self.destroy_package(row.id);
                }
            }
        }
    }

    fn on_decor_insert(&mut self, row: DecorRow) {
        if self.decor_entity(row.id).is_some() {
            self.on_decor_update(row);
            return;
        }
        if self.state.context.active_door != Some(row.door_id) {
            debug!(decor_id = row.id, door_id = row.door_id, "decor_insert_other_door");
            return;
        }
        self.spawn_decor(&row);
    }

    /// Pending or grabbed decor keep their prediction; the latest update waits
    /// until the action resolves. Updates never spawn: a torn-down door must
    /// stay empty until the next door arrives.
    fn on_decor_update(&mut self, row: DecorRow) {
        let Some(entity) = self.decor_entity(row.id) else {
            debug!(decor_id = row.id, door_id = row.door_id, "decor_update_unknown");
            return;
        };

        if self.state.pending.contains_key(&row.id) || self.is_grabbed(row.id) {
            debug!(decor_id = row.id, "decor_update_deferred");
            self.state.deferred_updates.insert(row.id, row);
            return;
        }

        self.apply_decor_row(entity, &row);
    }

    fn apply_decor_row(&mut self, entity: EntityId, row: &DecorRow) {
        if self.state.context.active_door != Some(row.door_id) {
            self.destroy_decor(row.id, "moved_to_other_door");
            return;
        }
        if let Some(decor) = self.world.get_mut::<DecorState>(entity) {
            decor.apply_row(row);
            debug!(decor_id = row.id, x = row.x, y = row.y, "decor_updated");
        }
    }

    /// Applies each deferred update whose decor is no longer pending or grabbed.
    fn flush_deferred_updates(&mut self) {
        let ready: Vec<u64> = self
            .state
            .deferred_updates
            .keys()
            .copied()
            .filter(|decor_id| {
                !self.state.pending.contains_key(decor_id) && !self.is_grabbed(*decor_id)
            })
            .collect();

        for decor_id in ready {
            let Some(row) = self.state.deferred_updates.remove(&decor_id) else {
                continue;
            };
            match self.decor_entity(decor_id) {
                Some(entity) => {
                    info!(decor_id, "deferred_update_applied");
                    self.apply_decor_row(entity, &row);
                }
                None => debug!(decor_id, "deferred_update_dropped"),
            }
        }
    }

    fn apply_door_row(&mut self, door: DoorRow) {
        if door.current_visitor != self.state.context.local_identity {
            debug!(door_id = door.id, "door_row_other_visitor");
            return;
        }
        if let Some(door_entity) = self.state.door_entity {
            if let Some(marker) = self.world.get_mut::<DoorMarker>(door_entity) {
                marker.door_id = Some(door.id);
                marker.number = door.number;
            }
        }
        if self.state.context.active_door == Some(door.id) {
            return;
        }
        self.assign_door(door.id);
    }

    /// Switches the scene to `door_id`: everything scoped to another door goes,
    /// rows already cached for the new door are spawned.
    fn assign_door(&mut self, door_id: u64) {
        let previous = self.state.context.active_door.replace(door_id);

        let stale_decor: Vec<u64> = self.state.decor_by_id.keys().copied().collect();
        for decor_id in stale_decor {
            self.destroy_decor(decor_id, "door_changed");
        }
        let stale_packages: Vec<u64> = self.state.packages_by_id.keys().copied().collect();
        for package_id in stale_packages {
            self.destroy_package(package_id);
        }

        let cached_decor = self.feed.cached_decor_for_door(door_id);
        for row in &cached_decor {
            self.spawn_decor(row);
        }
        for row in self.feed.cached_packages_for_door(door_id) {
            self.on_package_row(row);
        }
        info!(
            door_id,
            previous_door = ?previous,
            decor_count = cached_decor.len(),
            "door_assigned"
        );
    }

    /// Spawns decor for cached rows of the active door that have no entity.
    fn resync_active_door(&mut self) -> usize {
        let Some(door_id) = self.state.context.active_door else {
            return 0;
        };
        let mut spawned = 0;
        for row in self.feed.cached_decor_for_door(door_id) {
            if self.decor_entity(row.id).is_none() {
                self.spawn_decor(&row);
                spawned += 1;
            }
        }
        spawned
    }

    fn on_package_row(&mut self, row: PackageRow) {
        if self.state.context.active_door != Some(row.door_id) {
            return;
        }
        if self.state.packages_by_id.contains_key(&row.id) {
            return;
        }
        let position = package_slot_position(self.config.door_bounds, row.id);
        let entity = self.world.spawn([GameComponent::Package(PackageState {
            package_id: row.id,
            door_id: row.door_id,
            position,
        })]);
        self.state.packages_by_id.insert(row.id, entity);
        info!(package_id = row.id, door_id = row.door_id, "package_spawned");
    }
}
