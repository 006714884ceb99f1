//! [`Markup`] → ratatui [`Line`]s.
//!
//! Only the small HTML subset produced by the templates, the views and the
//! message formatter is understood.  Unknown elements render their children.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use scraper::{ElementRef, Html};

use super::Markup;
use crate::theme::*;

pub fn to_lines(markup: &Markup) -> Vec<Line<'static>> {
    let fragment = Html::parse_fragment(markup.as_str());
    let mut builder = Builder::default();
    walk(fragment.root_element(), style_default(), &mut builder);
    builder.finish()
}

/// Rows the lines occupy once word-wrapped to `width` columns, counted by
/// the same wrapper that draws them.
pub fn wrapped_height(lines: &[Line<'_>], width: u16) -> usize {
    wrapped(lines.to_vec()).line_count(width.max(1))
}

/// Lines as a paragraph that wraps at word boundaries without trimming.
pub fn wrapped<'a>(lines: Vec<Line<'a>>) -> Paragraph<'a> {
    Paragraph::new(lines).wrap(Wrap { trim: false })
}

#[derive(Default)]
struct Builder {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    quote_depth: usize,
    /// `None` for `<ul>`, `Some(next number)` for `<ol>`.
    lists: Vec<Option<usize>>,
}

impl Builder {
    fn start_line_if_needed(&mut self) {
        if self.current.is_empty() && self.quote_depth > 0 {
            self.current.push(Span::styled(
                "▎ ".repeat(self.quote_depth),
                Style::default().fg(C_QUOTE),
            ));
        }
    }

    fn current_is_blank(&self) -> bool {
        self.current
            .iter()
            .all(|s| s.content.trim().is_empty() || s.content.starts_with('▎'))
    }

    /// Inline text with HTML whitespace collapsing.
    fn push_text(&mut self, text: &str, style: Style) {
        let mut collapsed = String::with_capacity(text.len());
        let mut last_space = self
            .current
            .last()
            .map(|s| s.content.ends_with(' '))
            .unwrap_or(true);
        for c in text.chars() {
            if c.is_whitespace() {
                if !last_space {
                    collapsed.push(' ');
                    last_space = true;
                }
            } else {
                collapsed.push(c);
                last_space = false;
            }
        }
        if collapsed.is_empty() || (collapsed == " " && self.current_is_blank()) {
            return;
        }
        self.start_line_if_needed();
        self.current.push(Span::styled(collapsed, style));
    }

    fn push_raw(&mut self, text: String, style: Style) {
        self.start_line_if_needed();
        self.current.push(Span::styled(text, style));
    }

    fn break_line(&mut self) {
        let mut spans = std::mem::take(&mut self.current);
        if let Some(last) = spans.last_mut() {
            if last.content.ends_with(' ') {
                let trimmed = last.content.trim_end().to_string();
                last.content = trimmed.into();
            }
        }
        self.lines.push(Line::from(spans));
    }

    fn ensure_break(&mut self) {
        if !self.current.is_empty() {
            self.break_line();
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.ensure_break();
        self.lines
    }
}

fn walk(el: ElementRef<'_>, style: Style, b: &mut Builder) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            b.push_text(text, style);
        } else if let Some(child) = ElementRef::wrap(child) {
            element(child, style, b);
        }
    }
}

fn element(el: ElementRef<'_>, style: Style, b: &mut Builder) {
    let name = el.value().name();
    let style = el
        .value()
        .attr("class")
        .into_iter()
        .flat_map(str::split_whitespace)
        .fold(style, class_style);

    match name {
        "br" => b.break_line(),
        "hr" => {
            b.ensure_break();
            b.push_raw("─".repeat(24), style_muted());
            b.break_line();
        }
        "strong" | "b" => walk(el, style.add_modifier(Modifier::BOLD), b),
        "em" | "i" => walk(el, style.add_modifier(Modifier::ITALIC), b),
        "u" => walk(el, style.add_modifier(Modifier::UNDERLINED), b),
        "del" | "s" => walk(el, style.add_modifier(Modifier::CROSSED_OUT), b),
        "kbd" => walk(el, style.fg(C_FILTER_FG).add_modifier(Modifier::BOLD), b),
        "a" => walk(el, style.fg(C_LINK).add_modifier(Modifier::UNDERLINED), b),
        "code" => walk(el, style.fg(C_CODE_FG).bg(C_CODE_BG), b),
        "img" => {
            let alt = el.value().attr("alt").unwrap_or("image");
            b.push_raw(format!("[{alt}]"), style_muted());
        }
        "pre" => {
            b.ensure_break();
            let code: String = el.text().collect();
            let code_style = style.fg(C_CODE_FG).bg(C_CODE_BG);
            for line in code.split('\n') {
                b.push_raw(line.to_string(), code_style);
                b.break_line();
            }
        }
        "blockquote" => {
            b.ensure_break();
            b.quote_depth += 1;
            walk(el, style, b);
            b.ensure_break();
            b.quote_depth -= 1;
        }
        "ul" | "ol" => {
            b.ensure_break();
            b.lists.push((name == "ol").then_some(1));
            walk(el, style, b);
            b.ensure_break();
            b.lists.pop();
        }
        "li" => {
            b.ensure_break();
            let indent = "  ".repeat(b.lists.len().saturating_sub(1));
            let bullet = match b.lists.last_mut() {
                Some(Some(n)) => {
                    let bullet = format!("{indent}{n}. ");
                    *n += 1;
                    bullet
                }
                _ => format!("{indent}• "),
            };
            b.push_raw(bullet, style_secondary());
            walk(el, style, b);
            b.ensure_break();
        }
        "h1" | "h2" | "h3" | "h4" => {
            b.ensure_break();
            walk(el, style.fg(C_ACCENT).add_modifier(Modifier::BOLD), b);
            b.ensure_break();
        }
        "p" | "div" | "section" | "header" | "footer" | "nav" | "article" | "main" => {
            b.ensure_break();
            walk(el, style, b);
            b.ensure_break();
        }
        _ => walk(el, style, b),
    }
}

fn class_style(style: Style, class: &str) -> Style {
    match class {
        "mention" => style.fg(C_MENTION).add_modifier(Modifier::BOLD),
        "spoiler" => style.fg(C_SEPARATOR).bg(C_SEPARATOR),
        "emoji" => style.fg(C_TAG),
        "badge-live" => style
            .fg(Color::White)
            .bg(C_BADGE_LIVE)
            .add_modifier(Modifier::BOLD),
        "muted" => style.fg(C_MUTED),
        "secondary" | "meta" => style.fg(C_SECONDARY),
        "error" => style.fg(C_ERROR),
        "success" | "playing" => style.fg(C_PLAYING),
        "paused" => style.fg(C_PAUSED),
        "title" => style.fg(C_PRIMARY).add_modifier(Modifier::BOLD),
        "tag" => style.fg(C_TAG),
        _ => style,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_inline_styles_and_entities() {
        let lines = to_lines(&Markup::trusted("a <strong>b</strong> &lt;c&gt;"));
        assert_eq!(plain(&lines), vec!["a b <c>"]);
        let bold = &lines[0].spans[1];
        assert_eq!(bold.content, "b");
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_blocks_break_lines_and_collapse_whitespace() {
        let html = "<section>\n  <p>one   two</p>\n  <p>three<br>four</p>\n</section>";
        let lines = to_lines(&Markup::trusted(html));
        assert_eq!(plain(&lines), vec!["one two", "three", "four"]);
    }

    #[test]
    fn test_pre_keeps_lines() {
        let lines = to_lines(&Markup::trusted("<pre><code>a\n  b</code></pre>after"));
        assert_eq!(plain(&lines), vec!["a", "  b", "after"]);
        assert_eq!(lines[1].spans[0].style.fg, Some(C_CODE_FG));
    }

    #[test]
    fn test_lists_and_quotes() {
        let html = "<ol><li>x</li><li>y</li></ol><blockquote>q</blockquote>";
        let lines = to_lines(&Markup::trusted(html));
        assert_eq!(plain(&lines), vec!["1. x", "2. y", "▎ q"]);
    }

    #[test]
    fn test_wrapped_height() {
        let lines = vec![Line::from("abcdefghij"), Line::from("")];
        assert_eq!(wrapped_height(&lines, 4), 3 + 1);
        assert_eq!(wrapped_height(&lines, 20), 2);
        // Word wrap needs more rows than the character count suggests.
        assert_eq!(wrapped_height(&[Line::from("aa bbbb cc")], 5), 3);
    }
}
