//! Placeholder token codec: `{{KEY}}` ⇄ inline embed markup.
//!
//! Storage text carries placeholders as `{{KEY}}`. While loaded, each token
//! is a canonical span the host turns into a single-unit embed:
//!
//! ```text
//! <span class="ql-placeholder" data-key="KEY" data-label="KEY" contenteditable="false">KEY</span>
//! ```
//!
//! The reverse direction only keeps the key. A label that differs from the
//! key does not survive a storage round-trip.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::markup::{self, Tag, Token, push_escaped_attr, push_escaped_text};

/// Embed type name registered with the host.
pub const PLACEHOLDER_EMBED: &str = "placeholder";

/// Class marking the canonical placeholder span.
pub const PLACEHOLDER_CLASS: &str = "ql-placeholder";

/// A placeholder embed payload.
///
/// Keys are not unique; several placeholders may share one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaceholderToken {
    pub key: SmolStr,
    pub label: SmolStr,
}

impl PlaceholderToken {
    /// A placeholder whose label is its key.
    pub fn new(key: impl Into<SmolStr>) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
        }
    }

    pub fn with_label(key: impl Into<SmolStr>, label: impl Into<SmolStr>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }

    /// Validate a canonical placeholder start tag.
    ///
    /// Requires a `span` with the placeholder class and a `data-key`
    /// attribute, in any attribute order. A missing label falls back to the key.
    pub fn from_tag(tag: &Tag<'_>) -> Option<Self> {
        if !tag.is("span") || !tag.has_class(PLACEHOLDER_CLASS) {
            return None;
        }
        let key = SmolStr::new(tag.attr("data-key")?);
        let label = tag
            .attr("data-label")
            .map(SmolStr::new)
            .unwrap_or_else(|| key.clone());
        Some(Self { key, label })
    }

    /// Storage form, `{{KEY}}`.
    pub fn to_storage(&self) -> String {
        format!("{{{{{}}}}}", self.key)
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.push_markup(&mut out);
        out
    }

    pub fn push_markup(&self, out: &mut String) {
        out.push_str("<span class=\"");
        out.push_str(PLACEHOLDER_CLASS);
        out.push_str("\" data-key=\"");
        push_escaped_attr(out, &self.key);
        out.push_str("\" data-label=\"");
        push_escaped_attr(out, &self.label);
        out.push_str("\" contenteditable=\"false\">");
        push_escaped_text(out, &self.label);
        out.push_str("</span>");
    }
}

/// Replace every `{{content}}` token with canonical placeholder markup.
///
/// `content` is one or more chars other than `}`; the key is the trimmed
/// content, so `{{ }}` yields an empty key.
pub fn tokens_to_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut replaced = 0usize;

    while let Some(open) = rest.find("{{") {
        let after = &rest[open + 2..];
        match after.find('}') {
            Some(close) if close > 0 && after[close..].starts_with("}}") => {
                out.push_str(&rest[..open]);
                PlaceholderToken::new(after[..close].trim()).push_markup(&mut out);
                rest = &after[close + 2..];
                replaced += 1;
            }
            _ => {
                // Retry one char later so `{{{K}}` still matches at the second brace.
                out.push_str(&rest[..open + 1]);
                rest = &rest[open + 1..];
            }
        }
    }
    out.push_str(rest);

    tracing::trace!(target: "weaver::richtext::placeholder", replaced, "tokens to markup");
    out
}

/// Replace every canonical placeholder element, content included, with `{{key}}`.
///
/// Spans without a `data-key` are left untouched.
pub fn markup_to_tokens(markup: &str) -> String {
    let tokens = markup::tokenize(markup);
    let mut out = String::with_capacity(markup.len());
    let mut replaced = 0usize;
    let mut idx = 0;

    while idx < tokens.len() {
        let spanned = &tokens[idx];
        if let Token::Start(tag) = &spanned.token {
            if let Some(placeholder) = PlaceholderToken::from_tag(tag) {
                out.push_str(&placeholder.to_storage());
                replaced += 1;
                idx = markup::matching_end(&tokens, idx).map_or(idx + 1, |end| end + 1);
                continue;
            }
        }
        out.push_str(&markup[spanned.span.clone()]);
        idx += 1;
    }

    tracing::trace!(target: "weaver::richtext::placeholder", replaced, "markup to tokens");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_to_markup() {
        insta::assert_snapshot!(
            tokens_to_markup("Dear {{ NAME }},"),
            @r#"Dear <span class="ql-placeholder" data-key="NAME" data-label="NAME" contenteditable="false">NAME</span>,"#
        );
    }

    #[test]
    fn test_round_trip_keys() {
        let keys = [
            "NAME",
            "first.name",
            "a b",
            "{K",
            "x{",
            "<b>",
            "a&amp;b",
            "q\"uote",
            "ünïcödé",
            "K\"><script>",
        ];
        for key in keys {
            let storage = format!("{{{{{key}}}}}");
            assert_eq!(markup_to_tokens(&tokens_to_markup(&storage)), storage, "{key}");
        }
    }

    #[test]
    fn test_text_around_tokens_survives() {
        let storage = "Hi {{A}} and {{B}}{{A}}!";
        assert_eq!(markup_to_tokens(&tokens_to_markup(storage)), storage);
    }

    #[test]
    fn test_non_tokens_untouched() {
        for text in ["{{}}", "{{a}b}}", "{ {a}}", "{{open", "}}{{", "plain"] {
            assert_eq!(tokens_to_markup(text), text, "{text}");
        }
    }

    #[test]
    fn test_triple_brace() {
        let markup = tokens_to_markup("{{{K}}");
        assert!(markup.contains(r#"data-key="{K""#));
    }

    #[test]
    fn test_whitespace_key_is_empty_embed() {
        let markup = tokens_to_markup("{{   }}");
        assert!(markup.contains(r#"data-key="""#));
        assert_eq!(markup_to_tokens(&markup), "{{}}");
    }

    #[test]
    fn test_label_is_lost() {
        let token = PlaceholderToken::with_label("K", "Customer name");
        assert_eq!(markup_to_tokens(&token.to_markup()), "{{K}}");
    }

    #[test]
    fn test_attribute_order_independent() {
        let markup = r#"<p>x <span data-label="L" contenteditable="false" data-key="K" class="other ql-placeholder">L</span> y</p>"#;
        assert_eq!(markup_to_tokens(markup), "<p>x {{K}} y</p>");
    }

    #[test]
    fn test_missing_key_passes_through() {
        let markup = r#"<span class="ql-placeholder" data-label="L">L</span>"#;
        assert_eq!(markup_to_tokens(markup), markup);
    }

    #[test]
    fn test_nested_content_removed() {
        let markup = r#"<span class="ql-placeholder" data-key="K"><span>inner</span>K</span>tail"#;
        assert_eq!(markup_to_tokens(markup), "{{K}}tail");
    }

    #[test]
    fn test_self_closing_and_unclosed() {
        assert_eq!(
            markup_to_tokens(r#"a<span class="ql-placeholder" data-key="K"/>b"#),
            "a{{K}}b"
        );
        assert_eq!(
            markup_to_tokens(r#"a<span class="ql-placeholder" data-key="K">b"#),
            "a{{K}}b"
        );
    }

    #[test]
    fn test_from_tag() {
        let tokens = markup::tokenize(r#"<span class="ql-placeholder" data-key="a&amp;b">"#);
        let Token::Start(tag) = &tokens[0].token else {
            panic!("expected start tag");
        };
        assert_eq!(
            PlaceholderToken::from_tag(tag),
            Some(PlaceholderToken::new("a&b"))
        );

        let tokens = markup::tokenize(r#"<div class="ql-placeholder" data-key="K">"#);
        let Token::Start(tag) = &tokens[0].token else {
            panic!("expected start tag");
        };
        assert_eq!(PlaceholderToken::from_tag(tag), None);
    }
}
