// crates/core/src/markdown.rs
//! Minimal markdown rendering for finished reports.
//!
//! Covers exactly the subset the report generator emits: ATX headings
//! levels 1-3, blank-line-delimited paragraphs, and inline bold, italic,
//! and code spans. Everything else passes through as literal text. This is
//! intentionally not a general markdown engine.

/// A parsed report, ready for a display writer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// ATX heading, level 1-3.
    Heading { level: u8, spans: Vec<Span> },
    Paragraph { spans: Vec<Span> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    Strong(String),
    Emphasis(String),
    Code(String),
}

/// Parse accumulated report text into a [`Document`].
pub fn render(text: &str) -> Document {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
            continue;
        }
        if let Some((level, rest)) = heading_line(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::Heading { level, spans: parse_spans(rest) });
            continue;
        }
        paragraph.push(line);
    }
    flush_paragraph(&mut paragraph, &mut blocks);

    Document { blocks }
}

fn flush_paragraph(lines: &mut Vec<&str>, blocks: &mut Vec<Block>) {
    if lines.is_empty() {
        return;
    }
    // Soft line breaks inside a paragraph collapse to single spaces.
    let joined = lines.join(" ");
    blocks.push(Block::Paragraph { spans: parse_spans(&joined) });
    lines.clear();
}

/// Recognize `# `, `## `, `### `. Deeper levels and missing spaces fall
/// through to paragraph text.
fn heading_line(line: &str) -> Option<(u8, &str)> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if !(1..=3).contains(&hashes) {
        return None;
    }
    let rest = line[hashes..].strip_prefix(' ')?;
    Some((hashes as u8, rest.trim()))
}

/// Split a line into inline spans. Unterminated or empty markers stay
/// literal text.
fn parse_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while !rest.is_empty() {
        if let Some((span, remainder)) = take_marked(rest) {
            if !literal.is_empty() {
                spans.push(Span::Text(std::mem::take(&mut literal)));
            }
            spans.push(span);
            rest = remainder;
            continue;
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            literal.push(ch);
            rest = chars.as_str();
        }
    }
    if !literal.is_empty() {
        spans.push(Span::Text(literal));
    }
    spans
}

/// Try to take one delimited span off the front of `rest`. Marker order
/// matters: `**` before `*`.
fn take_marked(rest: &str) -> Option<(Span, &str)> {
    const MARKERS: [(&str, fn(String) -> Span); 3] = [
        ("**", Span::Strong),
        ("*", Span::Emphasis),
        ("`", Span::Code),
    ];

    for (marker, make) in MARKERS {
        let Some(inner) = rest.strip_prefix(marker) else { continue };
        let Some(end) = inner.find(marker) else { continue };
        if end == 0 {
            continue;
        }
        let body = &inner[..end];
        let after = &inner[end + marker.len()..];
        return Some((make(body.to_string()), after));
    }
    None
}

impl Document {
    /// HTML form of the document. Also the structure the render round-trip
    /// tests assert against.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                Block::Heading { level, spans } => {
                    out.push_str(&format!("<h{level}>"));
                    write_spans_html(spans, &mut out);
                    out.push_str(&format!("</h{level}>"));
                }
                Block::Paragraph { spans } => {
                    out.push_str("<p>");
                    write_spans_html(spans, &mut out);
                    out.push_str("</p>");
                }
            }
        }
        out
    }
}

fn write_spans_html(spans: &[Span], out: &mut String) {
    for span in spans {
        match span {
            Span::Text(text) => out.push_str(&escape_html(text)),
            Span::Strong(text) => {
                out.push_str("<strong>");
                out.push_str(&escape_html(text));
                out.push_str("</strong>");
            }
            Span::Emphasis(text) => {
                out.push_str("<em>");
                out.push_str(&escape_html(text));
                out.push_str("</em>");
            }
            Span::Code(text) => {
                out.push_str("<code>");
                out.push_str(&escape_html(text));
                out.push_str("</code>");
            }
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
