//! Discord message text → [`Markup`].
//!
//! The transforms run in a fixed order.  Code (fenced and inline) is pulled
//! out into placeholders before anything else runs and put back last, so no
//! later rule can match inside it.  Everything that is not code is escaped
//! before the markdown rules run, which means every rule below matches on
//! escaped text (`&gt;` for a quote marker, `&lt;@123&gt;` for a mention).
//!
//! Order:
//!  1. fenced code blocks → placeholder
//!  2. inline code → placeholder
//!  3. escape the rest
//!  4. blockquote and list markers (line level)
//!  5. bold, underline, italic, strikethrough
//!  6. masked links, then bare URLs
//!  7. user / role / channel / everyone mentions
//!  8. custom emoji
//!  9. spoilers
//! 10. list grouping
//! 11. newline → `<br>`
//! 12. code placeholders reinserted

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use panel_proto::protocol::Message;

use super::{escape, Markup};

const PH_OPEN: char = '\u{E000}';
const PH_CLOSE: char = '\u{E001}';
const LIST_MARK: char = '\u{E002}';
const QUOTE_MARK: char = '\u{E003}';

struct Patterns {
    fence: Regex,
    inline_code: Regex,
    bold: Regex,
    underline: Regex,
    italic_star: Regex,
    italic_underscore: Regex,
    strike: Regex,
    masked_link: Regex,
    bare_url: Regex,
    user_mention: Regex,
    role_mention: Regex,
    channel_mention: Regex,
    everyone: Regex,
    emoji: Regex,
    spoiler: Regex,
    ordered_item: Regex,
    placeholder: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("static message pattern");
        Patterns {
            fence: re(r"```(?:([A-Za-z0-9_+-]*)\n)?([\s\S]*?)```"),
            inline_code: re(r"`([^`\n]+)`"),
            bold: re(r"\*\*(.+?)\*\*"),
            underline: re(r"__(.+?)__"),
            italic_star: re(r"\*([^*\n]+)\*"),
            italic_underscore: re(r"(^|[^\w])_([^_\n]+)_([^\w]|$)"),
            strike: re(r"~~(.+?)~~"),
            masked_link: re(r"\[([^\]\n]+)\]\((https?://[^\s)]+)\)"),
            bare_url: re(r#"(^|[^"=>\w/])(https?://[^\s<]+)"#),
            user_mention: re(r"&lt;@!?(\d+)&gt;"),
            role_mention: re(r"&lt;@&amp;(\d+)&gt;"),
            channel_mention: re(r"&lt;#(\d+)&gt;"),
            everyone: re(r"@(everyone|here)\b"),
            emoji: re(r"&lt;(a?):(\w+):(\d+)&gt;"),
            spoiler: re(r"\|\|(.+?)\|\|"),
            ordered_item: re(r"^(\d+)\. (.+)$"),
            placeholder: re("\u{E000}([BI])(\\d+)\u{E001}"),
        }
    })
}

/// Names for the ids a message mentions.
#[derive(Debug, Default)]
pub struct MentionNames<'a> {
    users: HashMap<&'a str, &'a str>,
    roles: HashMap<&'a str, &'a str>,
    channels: HashMap<&'a str, &'a str>,
}

impl<'a> MentionNames<'a> {
    pub fn from_message(message: &'a Message) -> Self {
        let collect = |list: &'a [panel_proto::protocol::Mention]| {
            list.iter()
                .map(|m| (m.id.as_str(), m.name.as_str()))
                .collect::<HashMap<_, _>>()
        };
        Self {
            users: collect(&message.mentions),
            roles: collect(&message.role_mentions),
            channels: collect(&message.channel_mentions),
        }
    }
}

#[derive(Default)]
struct CodeStash {
    blocks: Vec<String>,
    inline: Vec<String>,
}

impl CodeStash {
    fn block(&mut self, lang: Option<&str>, code: &str) -> String {
        let code = code.strip_suffix('\n').unwrap_or(code);
        let html = match lang.filter(|l| !l.is_empty()) {
            Some(lang) => format!(
                "<pre><code class=\"language-{}\">{}</code></pre>",
                escape(lang),
                escape(code)
            ),
            None => format!("<pre><code>{}</code></pre>", escape(code)),
        };
        self.blocks.push(html);
        format!("{PH_OPEN}B{}{PH_CLOSE}", self.blocks.len() - 1)
    }

    fn inline(&mut self, code: &str) -> String {
        self.inline.push(format!("<code>{}</code>", escape(code)));
        format!("{PH_OPEN}I{}{PH_CLOSE}", self.inline.len() - 1)
    }

    fn restore(&self, text: &str) -> String {
        patterns()
            .placeholder
            .replace_all(text, |caps: &Captures| {
                let idx: usize = caps[2].parse().unwrap_or(usize::MAX);
                let stash = if &caps[1] == "B" { &self.blocks } else { &self.inline };
                stash.get(idx).cloned().unwrap_or_default()
            })
            .into_owned()
    }
}

/// Render message text.  All text from the message is escaped; the only
/// markup in the result is produced by the rules listed in the module docs.
pub fn format_message(content: &str, names: &MentionNames<'_>) -> Markup {
    let p = patterns();
    let mut stash = CodeStash::default();

    let content: String = content
        .chars()
        .filter(|c| !matches!(*c, PH_OPEN | PH_CLOSE | LIST_MARK | QUOTE_MARK))
        .collect();

    let text = p.fence.replace_all(&content, |caps: &Captures| {
        stash.block(caps.get(1).map(|m| m.as_str()), &caps[2])
    });
    let text = p
        .inline_code
        .replace_all(&text, |caps: &Captures| stash.inline(&caps[1]));

    let text = escape(&text);
    let text = mark_lines(&text);

    let text = p.bold.replace_all(&text, "<strong>$1</strong>");
    let text = p.underline.replace_all(&text, "<u>$1</u>");
    let text = p.italic_star.replace_all(&text, "<em>$1</em>");
    let text = p
        .italic_underscore
        .replace_all(&text, "$1<em>$2</em>$3");
    let text = p.strike.replace_all(&text, "<del>$1</del>");

    let text = p
        .masked_link
        .replace_all(&text, "<a href=\"$2\">$1</a>");
    let text = p
        .bare_url
        .replace_all(&text, "$1<a href=\"$2\">$2</a>");

    let text = p.role_mention.replace_all(&text, |caps: &Captures| {
        mention_span('@', names.roles.get(&caps[1]).copied(), "unknown-role")
    });
    let text = p.user_mention.replace_all(&text, |caps: &Captures| {
        mention_span('@', names.users.get(&caps[1]).copied(), "unknown-user")
    });
    let text = p.channel_mention.replace_all(&text, |caps: &Captures| {
        mention_span('#', names.channels.get(&caps[1]).copied(), "deleted-channel")
    });
    let text = p
        .everyone
        .replace_all(&text, "<span class=\"mention\">@$1</span>");

    let text = p.emoji.replace_all(
        &text,
        "<span class=\"emoji\" title=\":$2:\">:$2:</span>",
    );
    let text = p
        .spoiler
        .replace_all(&text, "<span class=\"spoiler\">$1</span>");

    let text = group_lines(&text);
    Markup::trusted(stash.restore(&text))
}

fn mention_span(sigil: char, name: Option<&str>, fallback: &str) -> String {
    let name = name.filter(|n| !n.is_empty()).unwrap_or(fallback);
    format!("<span class=\"mention\">{sigil}{}</span>", escape(name))
}

/// Replace line-leading quote and list markers with private markers, so the
/// emphasis rules cannot pair a list bullet `*` with a later asterisk.
fn mark_lines(text: &str) -> String {
    let p = patterns();
    text.split('\n')
        .map(|line| {
            let (quoted, rest) = match line.strip_prefix("&gt; ") {
                Some(rest) => (true, rest),
                None if line == "&gt;" => (true, ""),
                None => (false, line),
            };
            let rest = if let Some(item) = rest
                .strip_prefix("- ")
                .or_else(|| rest.strip_prefix("* "))
            {
                format!("{LIST_MARK}U{item}")
            } else if let Some(caps) = p.ordered_item.captures(rest) {
                format!("{LIST_MARK}O{}", &caps[2])
            } else {
                rest.to_string()
            };
            if quoted {
                format!("{QUOTE_MARK}{rest}")
            } else {
                rest
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Clone, Copy, PartialEq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            Self::Unordered => "ul",
            Self::Ordered => "ol",
        }
    }
}

/// Group quote and list lines into blocks and join the rest with `<br>`.
fn group_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 32);
    let mut in_quote = false;
    let mut list: Option<ListKind> = None;
    // Whether the previous emitted piece was inline content that needs a
    // `<br>` before the next inline piece.
    let mut pending_break = false;

    for line in text.split('\n') {
        let (quoted, line) = match line.strip_prefix(QUOTE_MARK) {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let item = line.strip_prefix(LIST_MARK).and_then(|rest| {
            let mut chars = rest.chars();
            let kind = match chars.next() {
                Some('U') => ListKind::Unordered,
                Some('O') => ListKind::Ordered,
                _ => return None,
            };
            Some((kind, chars.as_str()))
        });

        if list.is_some() && item.map(|(k, _)| Some(k)) != Some(list) {
            if let Some(kind) = list.take() {
                out.push_str(&format!("</{}>", kind.tag()));
            }
        }
        if in_quote && !quoted {
            out.push_str("</blockquote>");
            in_quote = false;
            pending_break = false;
        }
        if quoted && !in_quote {
            out.push_str("<blockquote>");
            in_quote = true;
            pending_break = false;
        }

        if let Some((kind, content)) = item {
            if list.is_none() {
                out.push_str(&format!("<{}>", kind.tag()));
                list = Some(kind);
            }
            out.push_str("<li>");
            out.push_str(content);
            out.push_str("</li>");
            pending_break = false;
            continue;
        }

        if is_block_placeholder(line) {
            out.push_str(line);
            pending_break = false;
            continue;
        }

        if pending_break {
            out.push_str("<br>");
        }
        out.push_str(line);
        pending_break = true;
    }

    if let Some(kind) = list {
        out.push_str(&format!("</{}>", kind.tag()));
    }
    if in_quote {
        out.push_str("</blockquote>");
    }
    out
}

fn is_block_placeholder(line: &str) -> bool {
    let line = line.trim();
    line.starts_with(PH_OPEN)
        && line.ends_with(PH_CLOSE)
        && line[PH_OPEN.len_utf8()..].starts_with('B')
        && line.matches(PH_OPEN).count() == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(s: &str) -> String {
        format_message(s, &MentionNames::default()).to_string()
    }

    #[test]
    fn test_plain_text_is_escaped() {
        assert_eq!(fmt("a < b & c"), "a &lt; b &amp; c");
    }

    #[test]
    fn test_fenced_code_untouched_by_later_rules() {
        let out = fmt("look:\n```\n**bold** <b>x</b> [a](https://x.io) _em_ ||s||\n```\ndone");
        assert!(out.contains(
            "<pre><code>**bold** &lt;b&gt;x&lt;/b&gt; [a](https://x.io) _em_ ||s||</code></pre>"
        ));
        assert!(!out.contains("<strong>"));
        assert!(!out.contains("<a "));
        assert!(!out.contains("<em>"));
        assert!(!out.contains("spoiler"));
        assert!(out.starts_with("look:"));
        assert!(out.ends_with("done"));
    }

    #[test]
    fn test_fenced_code_language_class() {
        let out = fmt("```rust\nfn main() {}\n```");
        assert_eq!(
            out,
            "<pre><code class=\"language-rust\">fn main() {}</code></pre>"
        );
    }

    #[test]
    fn test_inline_code_protected() {
        let out = fmt("run `**not bold**` now **bold**");
        assert_eq!(
            out,
            "run <code>**not bold**</code> now <strong>bold</strong>"
        );
    }

    #[test]
    fn test_emphasis_rules() {
        assert_eq!(fmt("**b** *i* __u__ ~~s~~ _e_"),
            "<strong>b</strong> <em>i</em> <u>u</u> <del>s</del> <em>e</em>");
    }

    #[test]
    fn test_underscores_inside_words_are_literal() {
        assert_eq!(fmt("snake_case_name"), "snake_case_name");
    }

    #[test]
    fn test_links() {
        assert_eq!(
            fmt("[docs](https://example.com/a_b) and https://x.io/p?q=1&r=2"),
            "<a href=\"https://example.com/a_b\">docs</a> and <a href=\"https://x.io/p?q=1&amp;r=2\">https://x.io/p?q=1&amp;r=2</a>"
        );
    }

    #[test]
    fn test_mentions_use_names_and_escape_them() {
        let message: Message = serde_json::from_value(serde_json::json!({
            "id": "1",
            "content": "",
            "author": {"id": "2"},
            "timestamp": "2024-01-01T00:00:00Z",
            "mentions": [{"id": "42", "name": "<Reimu>"}],
            "channelMentions": [{"id": "7", "name": "general"}]
        }))
        .unwrap();
        let names = MentionNames::from_message(&message);
        let out = format_message("hi <@42> see <#7>, <@&9> @everyone", &names).to_string();
        assert_eq!(
            out,
            "hi <span class=\"mention\">@&lt;Reimu&gt;</span> see <span class=\"mention\">#general</span>, <span class=\"mention\">@unknown-role</span> <span class=\"mention\">@everyone</span>"
        );
    }

    #[test]
    fn test_custom_emoji_and_spoiler() {
        assert_eq!(
            fmt("<:marisa:123> ||secret||"),
            "<span class=\"emoji\" title=\":marisa:\">:marisa:</span> <span class=\"spoiler\">secret</span>"
        );
    }

    #[test]
    fn test_blockquote_and_breaks() {
        assert_eq!(
            fmt("> quoted\n> more\nafter\nend"),
            "<blockquote>quoted<br>more</blockquote>after<br>end"
        );
    }

    #[test]
    fn test_list_grouping() {
        assert_eq!(
            fmt("items:\n- one\n* *two*\n1. first\n2. second\nbye"),
            "items:<ul><li>one</li><li><em>two</em></li></ul><ol><li>first</li><li>second</li></ol>bye"
        );
    }

    #[test]
    fn test_placeholder_characters_in_input_are_dropped() {
        assert_eq!(fmt("a\u{E000}B0\u{E001}b"), "aB0b");
    }
}
