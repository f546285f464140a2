// crates/cli/src/display.rs
//! Terminal rendering: live stage progress during a run and the finished
//! report afterwards.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use threatflow_client::RunUpdate;
use threatflow_core::markdown::{Block, Document, Span};
use threatflow_core::{StageId, StageStatus};

/// Live progress view for one run: a spinner line summarizing the board,
/// with one printed line per stage completion. Writes to stderr so the
/// report on stdout stays pipeable.
pub struct RunDisplay {
    spinner: ProgressBar,
    statuses: [StageStatus; 5],
}

impl RunDisplay {
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner} {msg}")
                .expect("valid spinner template"),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message("contacting backend...");
        Self { spinner, statuses: [StageStatus::NotStarted; 5] }
    }

    pub fn apply(&mut self, update: &RunUpdate) {
        match update {
            RunUpdate::SessionReady { session_id } => {
                self.spinner.println(format!("  \u{2713} Session {session_id}"));
                self.spinner.set_message("waiting for first event...");
            }
            RunUpdate::Stage(change) => {
                self.statuses[change.stage.index()] = change.status;
                if change.status == StageStatus::Completed {
                    self.spinner.println(format!("  \u{2713} {}", change.stage.label()));
                }
                self.spinner.set_message(self.active_summary());
            }
        }
    }

    /// "modeler, builder running" style message for the spinner line.
    fn active_summary(&self) -> String {
        let active: Vec<String> = StageId::ALL
            .iter()
            .filter(|stage| self.statuses[stage.index()] == StageStatus::Active)
            .map(|stage| stage.to_string())
            .collect();
        if active.is_empty() {
            "waiting...".to_string()
        } else {
            format!("{} running", active.join(", "))
        }
    }

    /// Last observed status of every stage, in pipeline order. This is
    /// what the post-run summary prints, whether the run finished or died.
    pub fn snapshot(&self) -> [(StageId, StageStatus); 5] {
        StageId::ALL.map(|stage| (stage, self.statuses[stage.index()]))
    }

    /// Stream finished normally.
    pub fn finish(self) {
        self.spinner.finish_and_clear();
    }

    /// Run ended early. Clears the spinner only; callers print the partial
    /// board from [`snapshot`](Self::snapshot) next to the error.
    pub fn halt(self) {
        self.spinner.finish_and_clear();
    }
}

/// One line per stage with a status glyph, for the post-run summary.
pub fn board_summary(stages: &[(StageId, StageStatus)], color: bool) -> String {
    let mut out = String::new();
    for (stage, status) in stages {
        let glyph = match status {
            StageStatus::Completed => checked("\u{2713}", "32", color), // Green
            StageStatus::Active => checked("\u{25cb}", "33", color),    // Yellow
            StageStatus::NotStarted => checked("\u{00b7}", "90", color), // Gray
        };
        out.push_str(&format!("  {glyph} {}\n", stage.label()));
    }
    out
}

fn checked(glyph: &str, code: &str, color: bool) -> String {
    if color {
        format!("\x1b[{code}m{glyph}\x1b[0m")
    } else {
        glyph.to_string()
    }
}

/// Write a parsed report as terminal text. With `color` set, headings and
/// inline styles use ANSI escapes; otherwise the text is bare.
pub fn render_document(doc: &Document, color: bool) -> String {
    let mut out = String::new();
    for block in &doc.blocks {
        match block {
            Block::Heading { level, spans } => {
                let text = spans_text(spans);
                if color {
                    match level {
                        1 => out.push_str(&format!("\x1b[1;4m{text}\x1b[0m\n\n")), // Bold underline
                        _ => out.push_str(&format!("\x1b[1m{text}\x1b[0m\n\n")),   // Bold
                    }
                } else {
                    out.push_str(&text);
                    out.push('\n');
                    let underline = if *level == 1 { '=' } else { '-' };
                    out.push_str(&underline.to_string().repeat(text.chars().count()));
                    out.push_str("\n\n");
                }
            }
            Block::Paragraph { spans } => {
                for span in spans {
                    out.push_str(&render_span(span, color));
                }
                out.push_str("\n\n");
            }
        }
    }
    // Single trailing newline.
    let trimmed = out.trim_end_matches('\n');
    let mut result = trimmed.to_string();
    if !result.is_empty() {
        result.push('\n');
    }
    result
}

fn render_span(span: &Span, color: bool) -> String {
    if !color {
        return match span {
            Span::Text(t) | Span::Strong(t) | Span::Emphasis(t) | Span::Code(t) => t.clone(),
        };
    }
    match span {
        Span::Text(t) => t.clone(),
        Span::Strong(t) => format!("\x1b[1m{t}\x1b[0m"),   // Bold
        Span::Emphasis(t) => format!("\x1b[3m{t}\x1b[0m"), // Italic
        Span::Code(t) => format!("\x1b[36m{t}\x1b[0m"),    // Cyan
    }
}

fn spans_text(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Text(t) | Span::Strong(t) | Span::Emphasis(t) | Span::Code(t) => t.as_str(),
        })
        .collect()
}
