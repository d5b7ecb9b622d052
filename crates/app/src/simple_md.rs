//! Lightweight formatting for assistant replies.
//!
//! Handles what local models usually emit:
//! - fenced code blocks (```` ``` ````, optional language tag)
//! - `` `inline code` `` and `**bold**`
//! - `# Heading` through `### Heading`
//! - `- bullet` and `* bullet` list items
//! - line breaks kept as-is

use eframe::egui;

/// A run of reply text: prose or the body of a fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'a> {
    Prose(Vec<&'a str>),
    Code(Vec<&'a str>),
}

/// Split text on ``` fences. An unterminated fence runs to the end.
pub fn split_blocks(text: &str) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut in_code = false;

    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            if in_code {
                blocks.push(Block::Code(std::mem::take(&mut current)));
            } else if !current.is_empty() {
                blocks.push(Block::Prose(std::mem::take(&mut current)));
            }
            in_code = !in_code;
            continue;
        }
        current.push(line);
    }

    if in_code {
        blocks.push(Block::Code(current));
    } else if !current.is_empty() {
        blocks.push(Block::Prose(current));
    }
    blocks
}

fn code_background(base_color: egui::Color32) -> egui::Color32 {
    if base_color.r() > 128 {
        // dark mode
        egui::Color32::from_rgb(45, 45, 55)
    } else {
        egui::Color32::from_rgb(230, 232, 236)
    }
}

/// Render a reply into an egui region.
pub fn render_markdown(ui: &mut egui::Ui, text: &str, base_color: egui::Color32) {
    let code_bg = code_background(base_color);

    for block in split_blocks(text) {
        match block {
            Block::Code(lines) => {
                egui::Frame::none()
                    .fill(code_bg)
                    .rounding(egui::Rounding::same(6.0))
                    .inner_margin(egui::Margin::same(8.0))
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(lines.join("\n"))
                                .monospace()
                                .size(13.0)
                                .color(base_color),
                        );
                    });
            }
            Block::Prose(lines) => {
                for line in lines {
                    render_prose_line(ui, line, base_color, code_bg);
                }
            }
        }
    }
}

fn render_prose_line(ui: &mut egui::Ui, line: &str, base_color: egui::Color32, code_bg: egui::Color32) {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        ui.add_space(6.0);
        return;
    }

    for (prefix, size) in [("### ", 15.0), ("## ", 16.0), ("# ", 18.0)] {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            ui.add_space(4.0);
            ui.label(egui::RichText::new(rest).strong().size(size).color(base_color));
            return;
        }
    }

    let bullet = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "));

    ui.horizontal_wrapped(|ui| {
        ui.spacing_mut().item_spacing.x = 0.0;
        match bullet {
            Some(rest) => {
                ui.label(egui::RichText::new("  •  ").size(14.0).color(base_color));
                render_inline(ui, rest, base_color, code_bg);
            }
            None => render_inline(ui, trimmed, base_color, code_bg),
        }
    });
}

/// Inline pieces of one prose line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span<'a> {
    Text(&'a str),
    Bold(&'a str),
    Code(&'a str),
}

/// Split a line on `**bold**` and `` `code` ``. Unclosed markers stay literal
/// and scanning carries on after them.
pub fn inline_spans(text: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    // Start of text not yet emitted, and where to search for the next marker
    let mut literal_from = 0;
    let mut cursor = 0;

    while cursor < text.len() {
        let rest = &text[cursor..];
        let bold = rest.find("**");
        let code = rest.find('`');
        let (pos, marker) = match (bold, code) {
            (Some(b), Some(c)) if c < b => (c, "`"),
            (Some(b), _) => (b, "**"),
            (None, Some(c)) => (c, "`"),
            (None, None) => break,
        };

        let open = cursor + pos;
        let inner_start = open + marker.len();
        let Some(len) = text[inner_start..].find(marker) else {
            cursor = inner_start;
            continue;
        };
        if open > literal_from {
            spans.push(Span::Text(&text[literal_from..open]));
        }
        let inner = &text[inner_start..inner_start + len];
        spans.push(if marker == "`" {
            Span::Code(inner)
        } else {
            Span::Bold(inner)
        });
        cursor = inner_start + len + marker.len();
        literal_from = cursor;
    }

    if literal_from < text.len() {
        spans.push(Span::Text(&text[literal_from..]));
    }
    spans
}

fn render_inline(ui: &mut egui::Ui, text: &str, base_color: egui::Color32, code_bg: egui::Color32) {
    let base_size = 14.0;
    for span in inline_spans(text) {
        match span {
            Span::Text(t) => {
                ui.label(egui::RichText::new(t).size(base_size).color(base_color));
            }
            Span::Bold(t) => {
                ui.label(egui::RichText::new(t).size(base_size).strong().color(base_color));
            }
            Span::Code(t) => {
                egui::Frame::none()
                    .fill(code_bg)
                    .rounding(egui::Rounding::same(3.0))
                    .inner_margin(egui::Margin::symmetric(4.0, 1.0))
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(t)
                                .size(base_size)
                                .monospace()
                                .color(base_color),
                        );
                    });
            }
        }
    }
}
