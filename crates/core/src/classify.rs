// crates/core/src/classify.rs
//! Maps free-form actor names onto pipeline stages.
//!
//! The backend's agents do not share a naming convention, so resolution is
//! two layers: an exact table of the names observed today, then ordered
//! keyword containment for renamed or versioned variants. Both layers are
//! pure lookups; callers decide what an unresolved name means.

use crate::types::StageId;

/// Exact actor names the backend emits, lowercased.
const ACTOR_TABLE: &[(&str, StageId)] = &[
    ("threat_model_orchestrator", StageId::Orchestrator),
    ("threat_modeller_orchestrator", StageId::Orchestrator),
    ("architecture_parser_agent", StageId::Parser),
    ("threat_modeler_agent", StageId::Modeler),
    ("report_builder_agent", StageId::Builder),
    ("report_verifier_agent", StageId::Verifier),
    ("escalation_checker", StageId::Verifier),
    ("verification_loop", StageId::Verifier),
];

/// Keyword fallback evaluated top to bottom; first containment wins. The
/// priority order matters: a hypothetical "modeler_verifier" is a modeler.
const KEYWORD_TABLE: &[(&str, StageId)] = &[
    ("parser", StageId::Parser),
    ("modeler", StageId::Modeler),
    ("modeller", StageId::Modeler),
    ("builder", StageId::Builder),
    ("verifier", StageId::Verifier),
    ("orchestrator", StageId::Orchestrator),
];

/// Author name of the sub-workflow that wraps report verification. Its
/// events double as the signal that report building has begun.
pub const REPORT_LOOP_AUTHOR: &str = "verification_loop";

/// Tool invocations only the report builder issues.
pub const REPORT_TOOLS: &[&str] = &["write_file", "convert_markdown_to_pdf"];

/// Resolve an actor name to a stage: exact table first, then keyword
/// containment in priority order. Case-insensitive throughout. Returns
/// `None` for actors the board does not track.
pub fn resolve_stage(actor: &str) -> Option<StageId> {
    let lowered = actor.to_ascii_lowercase();

    if let Some(&(_, stage)) = ACTOR_TABLE.iter().find(|(name, _)| *name == lowered) {
        return Some(stage);
    }

    KEYWORD_TABLE
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|&(_, stage)| stage)
}
