// crates/core/src/types.rs
//! Stage identity and status for the five-stage pipeline board.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The five fixed pipeline roles, declared in static pipeline order.
///
/// Declaration order doubles as the display order and the successor order
/// used for speculative activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Orchestrator,
    Parser,
    Modeler,
    Builder,
    Verifier,
}

impl StageId {
    /// All stages in pipeline order.
    pub const ALL: [StageId; 5] = [
        StageId::Orchestrator,
        StageId::Parser,
        StageId::Modeler,
        StageId::Builder,
        StageId::Verifier,
    ];

    /// Zero-based position in pipeline order.
    pub fn index(self) -> usize {
        match self {
            StageId::Orchestrator => 0,
            StageId::Parser => 1,
            StageId::Modeler => 2,
            StageId::Builder => 3,
            StageId::Verifier => 4,
        }
    }

    /// The statically-next stage, if any. The verifier is last.
    pub fn successor(self) -> Option<StageId> {
        match self {
            StageId::Orchestrator => Some(StageId::Parser),
            StageId::Parser => Some(StageId::Modeler),
            StageId::Modeler => Some(StageId::Builder),
            StageId::Builder => Some(StageId::Verifier),
            StageId::Verifier => None,
        }
    }

    /// Human-readable label for display surfaces.
    pub fn label(self) -> &'static str {
        match self {
            StageId::Orchestrator => "Orchestrator",
            StageId::Parser => "Architecture Parser",
            StageId::Modeler => "Threat Modeler",
            StageId::Builder => "Report Builder",
            StageId::Verifier => "Report Verifier",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageId::Orchestrator => "orchestrator",
            StageId::Parser => "parser",
            StageId::Modeler => "modeler",
            StageId::Builder => "builder",
            StageId::Verifier => "verifier",
        };
        f.write_str(name)
    }
}

/// Status of one stage within a run.
///
/// Moves are forward-only: not_started → active → completed. Completed is
/// terminal for the run; nothing ever demotes a stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    NotStarted,
    Active,
    Completed,
}

impl StageStatus {
    /// Ordering rank used to enforce forward-only transitions.
    pub fn rank(self) -> u8 {
        match self {
            StageStatus::NotStarted => 0,
            StageStatus::Active => 1,
            StageStatus::Completed => 2,
        }
    }
}
