impl GameplaySystemContext<'_> {
    fn run_ui_intents(&mut self) {
        while let Some(event) = self.state.ui_events.pop_front() {
            self.handle_ui_event(event);
        }
    }

    fn handle_ui_event(&mut self, event: UiEvent) {
        let door_busy = self.state.door.is_locked();
        match event {
            UiEvent::TextEditStarted { decor_id } => {
                if door_busy {
                    debug!(decor_id, "text_edit_ignored_door_busy");
                    return;
                }
                let identity = self.local_identity().to_string();
                let editable = self
                    .decor(decor_id)
                    .is_some_and(|decor| decor.interactive && decor.can_be_edited_by(&identity));
                if !editable {
                    debug!(decor_id, "text_edit_rejected");
                    return;
                }
                self.state.context.editing_text = true;
                self.state.context.editing_decor = Some(decor_id);
                debug!(decor_id, "text_edit_started");
            }
            UiEvent::TextSubmitted { text } => self.submit_text(text),
            UiEvent::TextEditCancelled => {
                self.state.context.editing_text = false;
                self.state.context.editing_decor = None;
            }
            UiEvent::DeleteRequested { decor_id } => {
                if door_busy {
                    debug!(decor_id, "delete_ignored_door_busy");
                    return;
                }
                self.request_delete(decor_id);
            }
            UiEvent::PackageClicked { package_id } => {
                if door_busy || !self.state.packages_by_id.contains_key(&package_id) {
                    debug!(package_id, "package_click_ignored");
                    return;
                }
                self.submit(TransactionCall::OpenPackage { package_id });
                info!(package_id, "package_open_requested");
            }
            UiEvent::PlaceFromInventory {
                inventory_id,
                position,
            } => {
                let known = self
                    .state
                    .inventory
                    .iter()
                    .any(|item| item.id == inventory_id);
                if door_busy || !known || self.state.context.active_door.is_none() {
                    debug!(inventory_id, "place_from_inventory_ignored");
                    return;
                }
                let limit = PositionLimit {
                    bounds: self.config.door_bounds,
                };
                let extent = Vec2::new(self.config.decor_extent, self.config.decor_extent);
                let placed = limit.clamp(position, extent);
                self.submit(TransactionCall::CreateDecor {
                    inventory_id,
                    x: to_wire_coord(placed.x),
                    y: to_wire_coord(placed.y),
                });
                info!(inventory_id, x = placed.x, y = placed.y, "decor_placement_requested");
            }
        }
    }

    fn submit_text(&mut self, text: String) {
        self.state.context.editing_text = false;
        let Some(decor_id) = self.state.context.editing_decor.take() else {
            debug!("text_submitted_without_target");
            return;
        };
        let text = truncate_text(&text, self.config.max_text_len);
        let call = TransactionCall::UpdateDecorText {
            decor_id,
            text: text.clone(),
        };
        if self.issue_action(decor_id, PendingKind::EditText, call).is_none() {
            debug!(decor_id, "text_target_missing");
            return;
        }
        if let Some(decor) = self.decor_mut(decor_id) {
            decor.predicted_text = Some(text);
        }
    }

    fn request_delete(&mut self, decor_id: u64) {
        let identity = self.local_identity().to_string();
        let grabbed = self.is_grabbed(decor_id);
        let deletable = self.decor(decor_id).is_some_and(|decor| {
            decor.interactive && !grabbed && decor.can_be_deleted_by(&identity)
        });
        if !deletable {
            debug!(decor_id, "delete_rejected");
            return;
        }
        if self
            .issue_action(decor_id, PendingKind::Delete, TransactionCall::DeleteDecor { decor_id })
            .is_some()
        {
            if let Some(decor) = self.decor_mut(decor_id) {
                decor.interactive = false;
            }
        }
    }
}
