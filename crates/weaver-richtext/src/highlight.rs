//! Highlight codec.
//!
//! Highlights are never persisted: storage holds bare phrases, and the
//! presentation is re-derived at load time from a caller-supplied request
//! list. While loaded, a highlight is a canonical span:
//!
//! ```text
//! <span class="ql-highlight" data-highlight-id="ID" data-tooltip="TEXT"
//!       data-tooltip-placement="top" style="--highlight-background: yellow">phrase</span>
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::markup::{self, Tag, Token, escape_text, parse_style, push_escaped_attr};
use crate::placeholder::PLACEHOLDER_CLASS;

/// Inline attribute name registered with the host.
pub const HIGHLIGHT_ATTRIBUTE: &str = "highlight";

/// Class marking the canonical highlight span.
pub const HIGHLIGHT_CLASS: &str = "ql-highlight";

const DATA_PREFIX: &str = "data-highlight";
const DATA_ID: &str = "data-highlight-id";
const DATA_COLOR: &str = "data-highlight-color";
const DATA_TOOLTIP: &str = "data-tooltip";
const DATA_PLACEMENT: &str = "data-tooltip-placement";
const STYLE_PREFIX: &str = "--highlight-";

/// Preferred tooltip side relative to the highlighted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TooltipPlacement {
    #[default]
    Top,
    Bottom,
    Left,
    Right,
}

impl TooltipPlacement {
    pub fn as_str(&self) -> &'static str {
        match self {
            TooltipPlacement::Top => "top",
            TooltipPlacement::Bottom => "bottom",
            TooltipPlacement::Left => "left",
            TooltipPlacement::Right => "right",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            TooltipPlacement::Top => TooltipPlacement::Bottom,
            TooltipPlacement::Bottom => TooltipPlacement::Top,
            TooltipPlacement::Left => TooltipPlacement::Right,
            TooltipPlacement::Right => TooltipPlacement::Left,
        }
    }

    /// Parse a placement name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        [
            TooltipPlacement::Top,
            TooltipPlacement::Bottom,
            TooltipPlacement::Left,
            TooltipPlacement::Right,
        ]
        .into_iter()
        .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for TooltipPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A caller's request to highlight every occurrence of `text`.
///
/// Field aliases accept the camelCase names hosts commonly send.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightRequest {
    pub text: String,
    #[serde(alias = "styleProperties")]
    pub style: BTreeMap<String, String>,
    #[serde(alias = "tooltipText")]
    pub tooltip: Option<String>,
    #[serde(alias = "tooltipPlacement")]
    pub placement: TooltipPlacement,
    /// Identity reported when the highlight is hovered.
    pub id: Option<SmolStr>,
}

impl HighlightRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.insert(property.into(), value.into());
        self
    }

    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn with_placement(mut self, placement: TooltipPlacement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_id(mut self, id: impl Into<SmolStr>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The attribute payload this request applies.
    pub fn format(&self) -> HighlightFormat {
        HighlightFormat {
            style: self.style.clone(),
            tooltip: self.tooltip.clone(),
            placement: self.placement,
            id: self.id.clone(),
        }
    }
}

/// The highlight attribute payload carried by document ops.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HighlightFormat {
    /// Style entries, applied as CSS custom properties.
    pub style: BTreeMap<String, String>,
    pub tooltip: Option<String>,
    pub placement: TooltipPlacement,
    pub id: Option<SmolStr>,
}

impl HighlightFormat {
    /// Apply an update on top of this format.
    ///
    /// Style entries are set one by one, so an update without style keeps the
    /// current styling. Tooltip and identity are replaced only when present.
    pub fn merge(&mut self, update: HighlightFormat) {
        for (property, value) in update.style {
            self.style.insert(property, value);
        }
        if update.tooltip.is_some() {
            self.tooltip = update.tooltip;
        }
        if update.id.is_some() {
            self.id = update.id;
        }
        self.placement = update.placement;
    }

    /// Inline `style` value: one custom property per style entry.
    pub fn style_declarations(&self) -> String {
        self.style
            .iter()
            .map(|(property, value)| format!("{}: {}", custom_property(property), value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn push_start_tag(&self, out: &mut String) {
        out.push_str("<span class=\"");
        out.push_str(HIGHLIGHT_CLASS);
        out.push('"');
        if let Some(id) = &self.id {
            out.push_str(" data-highlight-id=\"");
            push_escaped_attr(out, id);
            out.push('"');
        }
        if let Some(tooltip) = &self.tooltip {
            out.push_str(" data-tooltip=\"");
            push_escaped_attr(out, tooltip);
            out.push_str("\" data-tooltip-placement=\"");
            out.push_str(self.placement.as_str());
            out.push('"');
        }
        if !self.style.is_empty() {
            out.push_str(" style=\"");
            push_escaped_attr(out, &self.style_declarations());
            out.push('"');
        }
        out.push('>');
    }

    /// Re-derive the payload from a canonical highlight tag.
    ///
    /// Only for in-memory re-rendering; highlights never come back from storage.
    pub fn from_tag(tag: &Tag<'_>) -> Option<Self> {
        if !tag.has_class(HIGHLIGHT_CLASS) {
            return None;
        }
        let mut style = BTreeMap::new();
        if let Some(declarations) = tag.attr("style") {
            for (property, value) in parse_style(&declarations) {
                if let Some(key) = property.strip_prefix(STYLE_PREFIX) {
                    style.insert(key.to_owned(), value.to_owned());
                } else if property.starts_with("--") {
                    style.insert(property.to_owned(), value.to_owned());
                }
            }
        }
        Some(Self {
            style,
            tooltip: tag.attr(DATA_TOOLTIP).map(|t| t.into_owned()),
            placement: tag
                .attr(DATA_PLACEMENT)
                .and_then(|p| TooltipPlacement::parse(&p))
                .unwrap_or_default(),
            id: tag.attr(DATA_ID).map(SmolStr::new),
        })
    }
}

fn custom_property(key: &str) -> String {
    if key.starts_with("--") {
        key.to_owned()
    } else {
        format!("{STYLE_PREFIX}{key}")
    }
}

/// Whether an element carries highlight presentation that storage must not keep.
///
/// Matches the canonical class, any `data-highlight*` attribute, and the
/// style-only spans hosts produce when they normalize highlight markup.
pub fn is_highlight_element(tag: &Tag<'_>) -> bool {
    if tag.has_class(HIGHLIGHT_CLASS) {
        return true;
    }
    let data_attr = tag.attrs.iter().any(|attr| {
        attr.name
            .get(..DATA_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(DATA_PREFIX))
    });
    data_attr || (tag.is("span") && is_style_only_highlight(tag))
}

fn is_style_only_highlight(tag: &Tag<'_>) -> bool {
    if tag.attrs.len() != 1 {
        return false;
    }
    let Some(style) = tag.attr("style") else {
        return false;
    };
    parse_style(&style).any(|(property, _)| {
        property.eq_ignore_ascii_case("background")
            || property.eq_ignore_ascii_case("background-color")
            || property.starts_with(STYLE_PREFIX)
    })
}

/// Strip every highlight element down to its content.
///
/// Runs unwrap passes until one removes nothing, which also handles spans
/// the host nested or re-wrapped while normalizing markup.
pub fn storage_from_document_markup(markup: &str) -> String {
    let mut current = markup.to_owned();
    let mut passes = 0usize;
    loop {
        let (next, unwrapped) = unwrap_pass(&current);
        passes += 1;
        if unwrapped == 0 {
            tracing::trace!(target: "weaver::richtext::highlight", passes, "stripped highlights");
            return next;
        }
        current = next;
    }
}

/// One pass over the markup, dropping highlight start tags and their end tags.
fn unwrap_pass(markup: &str) -> (String, usize) {
    let tokens = markup::tokenize(markup);
    let mut out = String::with_capacity(markup.len());
    let mut open: Vec<(&str, bool)> = Vec::new();
    let mut unwrapped = 0usize;

    for spanned in &tokens {
        let source = &markup[spanned.span.clone()];
        match &spanned.token {
            Token::Start(tag) => {
                let drop = is_highlight_element(tag);
                if drop {
                    unwrapped += 1;
                } else {
                    out.push_str(source);
                }
                if !tag.is_void() {
                    open.push((tag.name, drop));
                }
            }
            Token::End(name) => match open.iter().rposition(|(n, _)| n.eq_ignore_ascii_case(name)) {
                Some(idx) => {
                    let (_, dropped) = open[idx];
                    open.truncate(idx);
                    if !dropped {
                        out.push_str(source);
                    }
                }
                None => out.push_str(source),
            },
            _ => out.push_str(source),
        }
    }

    (out, unwrapped)
}

/// Prepare storage markup for loading: canonicalize highlight tokens, then
/// wrap every requested phrase in highlight markup.
///
/// Longer phrases are wrapped first so "Hello world" is not pre-empted by
/// "Hello". Phrases are matched literally inside text segments only: never
/// inside tags, existing highlights or placeholder labels, and never across
/// a tag boundary.
pub fn document_markup_from_storage(markup: &str, requests: &[HighlightRequest]) -> String {
    let mut current = canonicalize_highlight_tokens(markup);

    let mut ordered: Vec<&HighlightRequest> =
        requests.iter().filter(|r| !r.text.is_empty()).collect();
    ordered.sort_by_key(|r| std::cmp::Reverse(r.text.chars().count()));

    for request in ordered {
        current = wrap_phrase(&current, request);
    }
    current
}

/// Turn `data-highlight-color` token markup into canonical highlight spans.
fn canonicalize_highlight_tokens(markup: &str) -> String {
    let tokens = markup::tokenize(markup);
    let mut out = String::with_capacity(markup.len());
    let mut open: Vec<(&str, bool)> = Vec::new();

    for spanned in &tokens {
        let source = &markup[spanned.span.clone()];
        match &spanned.token {
            Token::Start(tag) => {
                let color = tag
                    .attr(DATA_COLOR)
                    .filter(|_| !tag.has_class(HIGHLIGHT_CLASS));
                let converted = color.is_some();
                match color {
                    Some(color) => {
                        let mut format = HighlightFormat {
                            id: tag.attr(DATA_ID).map(SmolStr::new),
                            ..HighlightFormat::default()
                        };
                        format
                            .style
                            .insert("background".to_owned(), color.into_owned());
                        format.push_start_tag(&mut out);
                        if tag.is_void() {
                            out.push_str("</span>");
                        }
                    }
                    None => out.push_str(source),
                }
                if !tag.is_void() {
                    open.push((tag.name, converted));
                }
            }
            Token::End(name) => match open.iter().rposition(|(n, _)| n.eq_ignore_ascii_case(name)) {
                Some(idx) => {
                    let (_, converted) = open[idx];
                    open.truncate(idx);
                    out.push_str(if converted { "</span>" } else { source });
                }
                None => out.push_str(source),
            },
            _ => out.push_str(source),
        }
    }
    out
}

fn wrap_phrase(markup: &str, request: &HighlightRequest) -> String {
    let needle = escape_text(&request.text);
    let format = request.format();
    let tokens = markup::tokenize(markup);
    let mut out = String::with_capacity(markup.len());
    let mut open: Vec<(&str, bool)> = Vec::new();
    let mut wrapped = 0usize;

    for spanned in &tokens {
        let source = &markup[spanned.span.clone()];
        match &spanned.token {
            Token::Start(tag) => {
                if !tag.is_void() {
                    let skip = is_highlight_element(tag) || tag.has_class(PLACEHOLDER_CLASS);
                    open.push((tag.name, skip));
                }
                out.push_str(source);
            }
            Token::End(name) => {
                if let Some(idx) = open.iter().rposition(|(n, _)| n.eq_ignore_ascii_case(name)) {
                    open.truncate(idx);
                }
                out.push_str(source);
            }
            Token::Text(text) if !open.iter().any(|(_, skip)| *skip) => {
                let mut last = 0;
                for (idx, matched) in text.match_indices(needle.as_str()) {
                    out.push_str(&text[last..idx]);
                    format.push_start_tag(&mut out);
                    out.push_str(matched);
                    out.push_str("</span>");
                    last = idx + matched.len();
                    wrapped += 1;
                }
                out.push_str(&text[last..]);
            }
            _ => out.push_str(source),
        }
    }

    tracing::trace!(
        target: "weaver::richtext::highlight",
        phrase = %request.text,
        wrapped,
        "wrapped highlight phrase"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yellow(text: &str) -> HighlightRequest {
        HighlightRequest::new(text).with_style("background", "yellow")
    }

    #[test]
    fn test_wrap_single_phrase() {
        let markup = document_markup_from_storage(
            "Hello world",
            &[yellow("world").with_tooltip("Planet").with_id("w1")],
        );
        insta::assert_snapshot!(
            markup,
            @r#"Hello <span class="ql-highlight" data-highlight-id="w1" data-tooltip="Planet" data-tooltip-placement="top" style="--highlight-background: yellow">world</span>"#
        );
    }

    #[test]
    fn test_longer_phrase_first() {
        let markup = document_markup_from_storage(
            "Hello world. Hello.",
            &[HighlightRequest::new("Hello"), HighlightRequest::new("Hello world")],
        );
        insta::assert_snapshot!(
            markup,
            @r#"<span class="ql-highlight">Hello world</span>. <span class="ql-highlight">Hello</span>."#
        );
    }

    #[test]
    fn test_no_match_inside_tags() {
        let markup = r#"<a title="world">hello</a>"#;
        assert_eq!(
            document_markup_from_storage(markup, &[HighlightRequest::new("world")]),
            markup
        );
    }

    #[test]
    fn test_phrase_across_tag_boundary_does_not_match() {
        let markup = "<b>Hello</b> world";
        assert_eq!(
            document_markup_from_storage(markup, &[HighlightRequest::new("Hello world")]),
            markup
        );
    }

    #[test]
    fn test_escaped_phrase_matches() {
        let markup = document_markup_from_storage("Tom &amp; Jerry", &[HighlightRequest::new("Tom & Jerry")]);
        assert_eq!(
            markup,
            r#"<span class="ql-highlight">Tom &amp; Jerry</span>"#
        );
    }

    #[test]
    fn test_placeholder_labels_not_wrapped() {
        let storage = crate::placeholder::tokens_to_markup("NAME: {{NAME}}");
        let markup = document_markup_from_storage(&storage, &[HighlightRequest::new("NAME")]);
        assert_eq!(markup.matches(HIGHLIGHT_CLASS).count(), 1);
        assert!(markup.starts_with(r#"<span class="ql-highlight">NAME</span>: "#));
    }

    #[test]
    fn test_empty_requests_and_text() {
        let storage = "nothing <b>to</b> do";
        assert_eq!(document_markup_from_storage(storage, &[]), storage);
        assert_eq!(
            document_markup_from_storage(storage, &[HighlightRequest::new("")]),
            storage
        );
    }

    #[test]
    fn test_canonicalize_color_tokens() {
        let markup = document_markup_from_storage(
            r##"a <mark data-highlight-color="#ff0" data-highlight-id="n1">note</mark> b"##,
            &[],
        );
        insta::assert_snapshot!(
            markup,
            @r##"a <span class="ql-highlight" data-highlight-id="n1" style="--highlight-background: #ff0">note</span> b"##
        );
    }

    #[test]
    fn test_strip_canonical_and_variants() {
        let markup = concat!(
            r#"<p><span class="ql-highlight" data-tooltip="t">one</span> "#,
            r#"<span style="background-color: rgb(255, 255, 0);">two</span> "#,
            r#"<mark data-highlight-color="red">three</mark> "#,
            r#"<span style="color: red">kept</span></p>"#,
        );
        assert_eq!(
            storage_from_document_markup(markup),
            r#"<p>one two three <span style="color: red">kept</span></p>"#
        );
    }

    #[test]
    fn test_strip_nested() {
        let markup = r#"<span class="ql-highlight"><span style="background: yellow"><span class="ql-highlight">deep</span></span></span>!"#;
        assert_eq!(storage_from_document_markup(markup), "deep!");
    }

    #[test]
    fn test_strip_keeps_placeholders() {
        let markup = r#"<span class="ql-highlight"><span class="ql-placeholder" data-key="K">K</span> x</span>"#;
        assert_eq!(
            storage_from_document_markup(markup),
            r#"<span class="ql-placeholder" data-key="K">K</span> x"#
        );
    }

    #[test]
    fn test_strip_idempotent() {
        let samples = [
            "",
            "plain text",
            r#"<span class="ql-highlight">a</span><span class="ql-highlight">b"#,
            r#"</span><span style="background:red">x</span></span>"#,
            r#"<span class="ql-highlight"/>y<br>"#,
            "< not a tag <span",
        ];
        for sample in samples {
            let once = storage_from_document_markup(sample);
            assert_eq!(storage_from_document_markup(&once), once, "{sample}");
        }
    }

    #[test]
    fn test_wrap_then_strip_restores_storage() {
        let storage = "<p>Hello world, hello again</p>";
        let requests = [yellow("hello").with_tooltip("greeting"), yellow("world")];
        let loaded = document_markup_from_storage(storage, &requests);
        assert_ne!(loaded, storage);
        assert_eq!(storage_from_document_markup(&loaded), storage);
    }

    #[test]
    fn test_format_from_tag_round_trip() {
        let format = HighlightRequest::new("x")
            .with_style("background", "yellow")
            .with_style("--custom", "1px")
            .with_tooltip("a < b")
            .with_placement(TooltipPlacement::Left)
            .with_id("id-1")
            .format();
        let mut markup = String::new();
        format.push_start_tag(&mut markup);
        let tokens = markup::tokenize(&markup);
        let Token::Start(tag) = &tokens[0].token else {
            panic!("expected start tag");
        };
        assert_eq!(HighlightFormat::from_tag(tag), Some(format));
    }

    #[test]
    fn test_merge_keeps_style_without_update() {
        let mut format = yellow("x").with_tooltip("old").format();
        format.merge(HighlightFormat {
            tooltip: Some("new".into()),
            ..HighlightFormat::default()
        });
        assert_eq!(format.style.get("background").map(String::as_str), Some("yellow"));
        assert_eq!(format.tooltip.as_deref(), Some("new"));

        format.merge(HighlightRequest::new("x").with_style("color", "red").format());
        assert_eq!(format.style.len(), 2);
        assert_eq!(format.tooltip.as_deref(), Some("new"));
    }

    #[test]
    fn test_request_deserialize_camel_case() {
        let request: HighlightRequest = serde_json::from_str(
            r#"{"text": "Hello", "styleProperties": {"background": "pink"}, "tooltipText": "hi", "tooltipPlacement": "bottom", "id": "h1"}"#,
        )
        .unwrap();
        assert_eq!(request.placement, TooltipPlacement::Bottom);
        assert_eq!(request.tooltip.as_deref(), Some("hi"));
        assert_eq!(request.id.as_deref(), Some("h1"));
        assert_eq!(request.style.len(), 1);
    }

    #[test]
    fn test_placement_parse() {
        assert_eq!(TooltipPlacement::parse(" Left "), Some(TooltipPlacement::Left));
        assert_eq!(TooltipPlacement::parse("middle"), None);
        assert_eq!(TooltipPlacement::Top.opposite(), TooltipPlacement::Bottom);
        assert_eq!(TooltipPlacement::Right.to_string(), "right");
    }
}
