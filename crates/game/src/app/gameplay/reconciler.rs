impl GameplaySystemContext<'_> {
    fn run_reconciler(&mut self) {
        while let Some(outcome) = self.state.batch.move_outcomes.pop_front() {
            self.resolve_outcome(outcome);
        }
        while let Some(outcome) = self.state.batch.delete_outcomes.pop_front() {
            self.resolve_outcome(outcome);
        }
        while let Some(outcome) = self.state.batch.text_outcomes.pop_front() {
            self.resolve_outcome(outcome);
        }
        while let Some(outcome) = self.state.batch.other_outcomes.pop_front() {
            match &outcome.status {
                OutcomeStatus::Succeeded => {
                    debug!(correlation_id = outcome.correlation_id, call = ?outcome.call, "transaction_confirmed");
                }
                OutcomeStatus::Failed { reason } => warn!(
                    correlation_id = outcome.correlation_id,
                    call = ?outcome.call,
                    reason = reason.as_str(),
                    "transaction_rejected"
                ),
            }
        }

        self.expire_pending_actions();
        self.flush_deferred_updates();
    }

    /// Records the action in the decor's pending slot and submits it.
    ///
    /// A slot that is already open keeps its baseline and takes over the new
    /// kind and correlation id.
    fn issue_action(&mut self, decor_id: u64, kind: PendingKind, call: TransactionCall) -> Option<u64> {
        let baseline = {
            let decor = self.decor(decor_id)?;
            PreActionState {
                position: decor.committed,
                text: decor.committed_text.clone(),
                interactive: decor.interactive,
            }
        };
        let correlation_id = self.submit(call);
        let tick = self.state.tick;
        match self.state.pending.get_mut(&decor_id) {
            Some(slot) => {
                debug!(
                    decor_id,
                    superseded = slot.correlation_id,
                    correlation_id,
                    "pending_action_superseded"
                );
                slot.kind = kind;
                slot.correlation_id = correlation_id;
                slot.issued_at_tick = tick;
            }
            None => {
                self.state.pending.insert(
                    decor_id,
                    PendingAction {
                        decor_id,
                        kind,
                        correlation_id,
                        pre_action: baseline,
                        issued_at_tick: tick,
                    },
                );
            }
        }
        info!(decor_id, kind = ?kind, correlation_id, "action_issued");
        Some(correlation_id)
    }

    fn resolve_outcome(&mut self, outcome: TransactionOutcome) {
        let Some(decor_id) = outcome.call.decor_id() else {
            return;
        };
        let Some(slot_correlation) = self
            .state
            .pending
            .get(&decor_id)
            .map(|slot| slot.correlation_id)
        else {
            debug!(decor_id, correlation_id = outcome.correlation_id, "outcome_unmatched");
            return;
        };

        if outcome.correlation_id == slot_correlation {
            let Some(slot) = self.state.pending.remove(&decor_id) else {
                return;
            };
            match &outcome.status {
                OutcomeStatus::Succeeded => self.commit_action(&slot, &outcome.call),
                OutcomeStatus::Failed { reason } => {
                    warn!(
                        decor_id,
                        kind = ?slot.kind,
                        correlation_id = outcome.correlation_id,
                        reason = reason.as_str(),
                        "action_rejected"
                    );
                    self.rollback_action(&slot);
                }
            }
        } else if outcome.correlation_id < slot_correlation {
            if outcome.is_success() {
                self.advance_baseline(decor_id, &outcome.call);
            } else {
                self.rollback_superseded(decor_id, &outcome);
            }
        } else {
            debug!(decor_id, correlation_id = outcome.correlation_id, "outcome_unmatched");
        }
    }

    fn commit_action(&mut self, slot: &PendingAction, call: &TransactionCall) {
        let grabbed = self.is_grabbed(slot.decor_id);
        match call {
            TransactionCall::MoveDecor { x, y, rot, .. } => {
                if let Some(decor) = self.decor_mut(slot.decor_id) {
                    decor.committed = Vec2::new(*x as f32, *y as f32);
                    decor.rot = *rot;
                    if !grabbed {
                        decor.predicted = decor.committed;
                    }
                    decor.predicted_text = decor.committed_text.clone();
                }
            }
            TransactionCall::DeleteDecor { .. } => {
                self.destroy_decor(slot.decor_id, "delete_confirmed");
            }
            TransactionCall::UpdateDecorText { text, .. } => {
                if let Some(decor) = self.decor_mut(slot.decor_id) {
                    decor.committed_text = Some(text.clone());
                    decor.predicted_text = Some(text.clone());
                    // The slot is closed: no other prediction may outlive it.
                    if !grabbed {
                        decor.predicted = decor.committed;
                    }
                }
            }
            _ => {}
        }
        info!(decor_id = slot.decor_id, kind = ?slot.kind, correlation_id = slot.correlation_id, "action_confirmed");
    }

    fn rollback_action(&mut self, slot: &PendingAction) {
        let grabbed = self.is_grabbed(slot.decor_id);
        if let Some(decor) = self.decor_mut(slot.decor_id) {
            if !grabbed {
                decor.predicted = slot.pre_action.position;
            }
            decor.predicted_text = slot.pre_action.text.clone();
            decor.interactive = slot.pre_action.interactive;
            info!(
                decor_id = slot.decor_id,
                kind = ?slot.kind,
                x = decor.predicted.x,
                y = decor.predicted.y,
                "action_rolled_back"
            );
        }
    }

    /// A failed older action restores the field it predicted, unless the
    /// slot's current action predicts that same field again.
    fn rollback_superseded(&mut self, decor_id: u64, outcome: &TransactionOutcome) {
        let failed_kind = match &outcome.call {
            TransactionCall::MoveDecor { .. } => PendingKind::Move,
            TransactionCall::UpdateDecorText { .. } => PendingKind::EditText,
            TransactionCall::DeleteDecor { .. } => PendingKind::Delete,
            _ => return,
        };
        let Some(slot) = self.state.pending.get(&decor_id) else {
            return;
        };
        if slot.kind == failed_kind {
            debug!(decor_id, correlation_id = outcome.correlation_id, "superseded_failure_dropped");
            return;
        }
        let pre_action = slot.pre_action.clone();
        let grabbed = self.is_grabbed(decor_id);
        let Some(decor) = self.decor_mut(decor_id) else {
            return;
        };
        match failed_kind {
            PendingKind::Move => {
                if !grabbed {
                    decor.predicted = pre_action.position;
                }
            }
            PendingKind::EditText => decor.predicted_text = pre_action.text,
            PendingKind::Delete => decor.interactive = pre_action.interactive,
        }
        warn!(
            decor_id,
            kind = ?failed_kind,
            correlation_id = outcome.correlation_id,
            "superseded_action_rolled_back"
        );
    }

    /// A confirmed older action moves the committed baseline without closing the slot.
    fn advance_baseline(&mut self, decor_id: u64, call: &TransactionCall) {
        match call {
            TransactionCall::MoveDecor { x, y, .. } => {
                let position = Vec2::new(*x as f32, *y as f32);
                if let Some(decor) = self.decor_mut(decor_id) {
                    decor.committed = position;
                }
                if let Some(slot) = self.state.pending.get_mut(&decor_id) {
                    slot.pre_action.position = position;
                }
            }
            TransactionCall::UpdateDecorText { text, .. } => {
                if let Some(decor) = self.decor_mut(decor_id) {
                    decor.committed_text = Some(text.clone());
                }
                if let Some(slot) = self.state.pending.get_mut(&decor_id) {
                    slot.pre_action.text = Some(text.clone());
                }
            }
            TransactionCall::DeleteDecor { .. } => {
                self.destroy_decor(decor_id, "delete_confirmed");
                return;
            }
            _ => return,
        }
        debug!(decor_id, "baseline_advanced");
    }

    fn expire_pending_actions(&mut self) {
        let timeout = self.config.pending_action_timeout_ticks;
        let tick = self.state.tick;
        let expired: Vec<u64> = self
            .state
            .pending
            .values()
            .filter(|slot| tick.saturating_sub(slot.issued_at_tick) >= timeout)
            .map(|slot| slot.decor_id)
            .collect();

        for decor_id in expired {
            let Some(slot) = self.state.pending.remove(&decor_id) else {
                continue;
            };
            warn!(
                decor_id,
                kind = ?slot.kind,
                correlation_id = slot.correlation_id,
                issued_at_tick = slot.issued_at_tick,
                "pending_action_timed_out"
            );
            self.rollback_action(&slot);
        }
    }
}
