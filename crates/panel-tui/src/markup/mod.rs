//! Escape-by-default markup.
//!
//! Fragments, templates and formatted chat messages are all held as
//! [`Markup`], a small HTML subset.  Text pushed through the builder is always
//! escaped; raw insertion is only possible through [`Markup::trusted`] and
//! [`Markup::push_markup`], for fragments that were produced by this module or
//! ship with the binary.

pub mod discord;
pub mod render;

use std::fmt;

/// Escape `&`, `<`, `>`, `"` and `'`.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup(String);

impl Markup {
    pub fn new() -> Self {
        Self(String::new())
    }

    /// Markup that is already safe: bundled templates or output of this module.
    pub fn trusted(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    /// `<tag class="…">text</tag>` with escaped text.
    pub fn element(tag: &str, class: Option<&str>, text: &str) -> Self {
        let mut m = Self::new();
        m.open(tag, class);
        m.push_text(text);
        m.close(tag);
        m
    }

    pub fn push_text(&mut self, text: &str) -> &mut Self {
        self.0.push_str(&escape(text));
        self
    }

    pub fn push_markup(&mut self, other: &Markup) -> &mut Self {
        self.0.push_str(&other.0);
        self
    }

    pub fn open(&mut self, tag: &str, class: Option<&str>) -> &mut Self {
        match class {
            Some(class) => self.0.push_str(&format!("<{tag} class=\"{}\">", escape(class))),
            None => self.0.push_str(&format!("<{tag}>")),
        }
        self
    }

    pub fn close(&mut self, tag: &str) -> &mut Self {
        self.0.push_str(&format!("</{tag}>"));
        self
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_escaped() {
        let mut m = Markup::new();
        m.push_text("<script>alert('x') & \"y\"</script>");
        assert_eq!(
            m.as_str(),
            "&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_element_escapes_text_not_tags() {
        let m = Markup::element("p", Some("error"), "HTTP <404>");
        assert_eq!(m.as_str(), "<p class=\"error\">HTTP &lt;404&gt;</p>");
    }
}
