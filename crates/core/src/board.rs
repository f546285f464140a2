// crates/core/src/board.rs
//! Run-scoped status board for the five pipeline stages.
//!
//! All transition rules live here, behind [`StageBoard::apply`] and
//! [`StageBoard::finalize`]. The invariant the whole display depends on:
//! stage status only ever moves forward. Events may arrive out of order,
//! repeat, or never announce a stage at all; none of that can make the
//! board flicker backward.

use crate::classify::{resolve_stage, REPORT_LOOP_AUTHOR, REPORT_TOOLS};
use crate::event::StreamEvent;
use crate::types::{StageId, StageStatus};

/// One observed status change, in the order it happened. Callers render
/// deltas from these instead of diffing snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageChange {
    pub stage: StageId,
    pub status: StageStatus,
}

/// Status of all five stages for one run.
#[derive(Debug, Clone)]
pub struct StageBoard {
    statuses: [StageStatus; 5],
    /// Speculative successor activation. The protocol does not reliably
    /// announce stage starts, so completing stage N implies N+1 began.
    lookahead: bool,
}

impl Default for StageBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StageBoard {
    pub fn new() -> Self {
        Self {
            statuses: [StageStatus::NotStarted; 5],
            lookahead: true,
        }
    }

    /// Disable speculative successor activation.
    pub fn without_lookahead(mut self) -> Self {
        self.lookahead = false;
        self
    }

    pub fn status(&self, stage: StageId) -> StageStatus {
        self.statuses[stage.index()]
    }

    /// Snapshot of every stage in pipeline order.
    pub fn snapshot(&self) -> [(StageId, StageStatus); 5] {
        StageId::ALL.map(|stage| (stage, self.status(stage)))
    }

    /// True once every stage has completed.
    pub fn all_completed(&self) -> bool {
        self.statuses.iter().all(|&s| s == StageStatus::Completed)
    }

    /// Raise `stage` to `target` if that is a forward move; demotions are
    /// silently refused.
    fn promote(&mut self, stage: StageId, target: StageStatus, changes: &mut Vec<StageChange>) {
        let slot = &mut self.statuses[stage.index()];
        if target.rank() > slot.rank() {
            *slot = target;
            changes.push(StageChange { stage, status: target });
        }
    }

    /// Apply one decoded event, returning the changes it caused in order.
    pub fn apply(&mut self, event: &StreamEvent) -> Vec<StageChange> {
        let mut changes = Vec::new();

        if let Some(author) = event.author.as_deref() {
            match resolve_stage(author) {
                Some(stage) => self.apply_to_stage(stage, event, &mut changes),
                None => {
                    tracing::debug!(actor = %author.to_ascii_lowercase(), "event from untracked actor");
                }
            }

            // The verification loop wraps report building; its events can
            // precede any builder-authored event.
            if author.eq_ignore_ascii_case(REPORT_LOOP_AUTHOR) {
                self.promote(StageId::Builder, StageStatus::Active, &mut changes);
            }
        }

        if let Some(actions) = &event.actions {
            let report_tool = actions
                .tool_calls
                .iter()
                .any(|call| REPORT_TOOLS.contains(&call.name.as_str()));
            if report_tool {
                self.promote(StageId::Builder, StageStatus::Active, &mut changes);
            }
        }

        changes
    }

    fn apply_to_stage(&mut self, stage: StageId, event: &StreamEvent, changes: &mut Vec<StageChange>) {
        if event.is_terminal() {
            self.promote(stage, StageStatus::Completed, changes);
            if self.lookahead {
                if let Some(next) = stage.successor() {
                    if self.status(next) == StageStatus::NotStarted {
                        self.promote(next, StageStatus::Active, changes);
                    }
                }
            }
            return;
        }

        if let Some(reason) = event.finish_reason.as_deref() {
            tracing::debug!(reason, stage = %stage, "unrecognized finish reason, treating as non-terminal");
        }
        self.promote(stage, StageStatus::Active, changes);
    }

    /// Stream ended: whatever is still active is assumed done. The last
    /// stage rarely gets an explicit terminal marker.
    pub fn finalize(&mut self) -> Vec<StageChange> {
        let mut changes = Vec::new();
        for stage in StageId::ALL {
            if self.status(stage) == StageStatus::Active {
                self.promote(stage, StageStatus::Completed, &mut changes);
            }
        }
        changes
    }
}
