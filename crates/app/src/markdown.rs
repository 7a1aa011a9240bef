//! Markdown renderer for reports and search results.
//!
//! Covers what models put in reports: headings, bullet and numbered lists,
//! fenced code, pipe tables (shown monospace), horizontal rules, and inline
//! `**bold**`, `` `code` `` and `[links](url)`.

use eframe::egui;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'a> {
    Heading(usize, &'a str),
    Bullet(&'a str),
    Numbered(&'a str, &'a str),
    Code(Vec<&'a str>),
    TableRow(&'a str),
    Rule,
    Paragraph(&'a str),
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span<'a> {
    Text(&'a str),
    Bold(&'a str),
    Code(&'a str),
    Link { text: &'a str, url: &'a str },
}

pub fn parse_blocks(text: &str) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        let trimmed = line.trim();

        if trimmed.starts_with("```") {
            let code: Vec<&str> = lines
                .by_ref()
                .take_while(|l| !l.trim_start().starts_with("```"))
                .collect();
            blocks.push(Block::Code(code));
            continue;
        }

        let block = if trimmed.is_empty() {
            Block::Blank
        } else if matches!(trimmed, "---" | "***" | "___") {
            Block::Rule
        } else if let Some(heading) = heading(trimmed) {
            heading
        } else if let Some(rest) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            Block::Bullet(rest)
        } else if let Some((num, rest)) = numbered(trimmed) {
            Block::Numbered(num, rest)
        } else if trimmed.starts_with('|') {
            Block::TableRow(trimmed)
        } else {
            Block::Paragraph(trimmed)
        };
        blocks.push(block);
    }
    blocks
}

fn heading(line: &str) -> Option<Block<'_>> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    line[level..].strip_prefix(' ').map(|rest| Block::Heading(level, rest.trim()))
}

fn numbered(line: &str) -> Option<(&str, &str)> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix(". ")?;
    Some((&line[..digits], rest))
}

pub fn parse_inline(text: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let bold = rest.find("**");
        let code = rest.find('`');
        let link = find_link(rest);
        let next = [bold, code, link.as_ref().map(|(start, _, _)| *start)]
            .into_iter()
            .flatten()
            .min();

        let Some(pos) = next else {
            spans.push(Span::Text(rest));
            break;
        };
        if pos > 0 {
            spans.push(Span::Text(&rest[..pos]));
        }
        let tail = &rest[pos..];

        let parsed = if Some(pos) == bold {
            tail[2..].find("**").map(|end| (Span::Bold(&tail[2..2 + end]), 4 + end))
        } else if Some(pos) == code {
            tail[1..].find('`').map(|end| (Span::Code(&tail[1..1 + end]), 2 + end))
        } else {
            link.map(|(start, span, end)| (span, end - start))
        };

        match parsed {
            Some((span, consumed)) => {
                spans.push(span);
                rest = &tail[consumed..];
            }
            None => {
                // unterminated marker, keep it literally
                spans.push(Span::Text(tail));
                break;
            }
        }
    }
    spans
}

/// First `[text](url)` in `s`: its start, the link, and the offset just past `)`.
/// A `[` only opens a link when its own `]` is directly followed by `(`.
fn find_link(s: &str) -> Option<(usize, Span<'_>, usize)> {
    let mut from = 0;
    while let Some(open) = s[from..].find('[').map(|p| from + p) {
        let close = open + s[open..].find(']')?;
        let text = &s[open + 1..close];
        if !text.contains('[') {
            if let Some(end) = s[close + 1..].strip_prefix('(').and_then(|a| a.find(')')) {
                let url_start = close + 2;
                let link = Span::Link {
                    text,
                    url: &s[url_start..url_start + end],
                };
                return Some((open, link, url_start + end + 1));
            }
        }
        from = open + 1;
    }
    None
}

pub fn render_markdown(ui: &mut egui::Ui, text: &str) {
    let base = ui.visuals().text_color();
    let code_bg = ui.visuals().extreme_bg_color;

    for block in parse_blocks(text) {
        match block {
            Block::Blank => ui.add_space(6.0),
            Block::Rule => {
                ui.separator();
            }
            Block::Heading(level, title) => {
                let size = match level {
                    1 => 22.0,
                    2 => 19.0,
                    3 => 16.5,
                    _ => 15.0,
                };
                ui.add_space(10.0 - level.min(4) as f32);
                ui.label(egui::RichText::new(title).strong().size(size).color(base));
                ui.add_space(2.0);
            }
            Block::Bullet(item) => {
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new("  •  ").color(base));
                    render_inline(ui, item, base, code_bg);
                });
            }
            Block::Numbered(num, item) => {
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(format!("  {}. ", num)).color(base));
                    render_inline(ui, item, base, code_bg);
                });
            }
            Block::Code(lines) => {
                egui::Frame::none()
                    .fill(code_bg)
                    .rounding(egui::Rounding::same(4.0))
                    .inner_margin(egui::Margin::same(8.0))
                    .show(ui, |ui| {
                        ui.label(egui::RichText::new(lines.join("\n")).monospace().color(base));
                    });
            }
            Block::TableRow(row) => {
                ui.label(egui::RichText::new(row).monospace().color(base));
            }
            Block::Paragraph(line) => {
                ui.horizontal_wrapped(|ui| render_inline(ui, line, base, code_bg));
            }
        }
    }
}

fn render_inline(ui: &mut egui::Ui, text: &str, base: egui::Color32, code_bg: egui::Color32) {
    ui.spacing_mut().item_spacing.x = 0.0;
    for span in parse_inline(text) {
        match span {
            Span::Text(t) => {
                ui.label(egui::RichText::new(t).color(base));
            }
            Span::Bold(t) => {
                ui.label(egui::RichText::new(t).strong().color(base));
            }
            Span::Code(t) => {
                ui.label(
                    egui::RichText::new(t)
                        .monospace()
                        .background_color(code_bg)
                        .color(base),
                );
            }
            Span::Link { text, url } => {
                ui.hyperlink_to(text, url).on_hover_text(url);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report_blocks() {
        let md = "# Title\n\n## Sources\n1. Based on AI model analysis\n- point\n---\n```\nlet x = 1;\n```\n| a | b |\nplain";
        assert_eq!(
            parse_blocks(md),
            vec![
                Block::Heading(1, "Title"),
                Block::Blank,
                Block::Heading(2, "Sources"),
                Block::Numbered("1", "Based on AI model analysis"),
                Block::Bullet("point"),
                Block::Rule,
                Block::Code(vec!["let x = 1;"]),
                Block::TableRow("| a | b |"),
                Block::Paragraph("plain"),
            ]
        );
    }

    #[test]
    fn test_hashtag_is_not_a_heading() {
        assert_eq!(parse_blocks("#rust"), vec![Block::Paragraph("#rust")]);
    }

    #[test]
    fn test_parse_inline_spans() {
        assert_eq!(
            parse_inline("see **this** and `code` at [docs](https://x.y) now"),
            vec![
                Span::Text("see "),
                Span::Bold("this"),
                Span::Text(" and "),
                Span::Code("code"),
                Span::Text(" at "),
                Span::Link {
                    text: "docs",
                    url: "https://x.y"
                },
                Span::Text(" now"),
            ]
        );
    }

    #[test]
    fn test_bracket_before_link_stays_text() {
        assert_eq!(
            parse_inline("[a] and [b](u)"),
            vec![Span::Text("[a] and "), Span::Link { text: "b", url: "u" }]
        );
        assert_eq!(parse_inline("[1] (see above)"), vec![Span::Text("[1] (see above)")]);
    }

    #[test]
    fn test_unterminated_marker_is_literal() {
        assert_eq!(
            parse_inline("a **b"),
            vec![Span::Text("a "), Span::Text("**b")]
        );
    }
}
