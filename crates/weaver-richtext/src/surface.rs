//! Host editing surface contract.
//!
//! The core never owns an editing surface. It drives one through
//! [`EditingSurface`], which a host implements over its own document model.
//! [`PlainSurface`] is a field-based implementation for non-UI contexts and
//! tests.

use std::collections::BTreeSet;

use smol_str::SmolStr;

use crate::document::{AttributeValue, Attributes, Document, Embed, Insert, Op};
use crate::error::SurfaceError;
use crate::highlight::{HIGHLIGHT_ATTRIBUTE, HighlightFormat};
use crate::markup::{self, Token, decode_entities, push_escaped_text};
use crate::placeholder::PlaceholderToken;

/// Inline attribute names the plain surface understands natively.
pub const BOLD_ATTRIBUTE: &str = "bold";
pub const ITALIC_ATTRIBUTE: &str = "italic";

/// Capabilities the core needs from a host editing surface.
///
/// Offsets are document offsets: chars for text runs, one unit per embed.
pub trait EditingSurface {
    // === Required: Markup conversion ===

    /// Convert canonical markup into a document. Host-owned.
    fn markup_to_document(&self, markup: &str) -> Result<Document, SurfaceError>;

    /// Convert a document back into canonical markup. Host-owned.
    fn document_to_markup(&self, doc: &Document) -> String;

    // === Required: Document access ===

    fn document(&self) -> &Document;

    /// Replace the document contents.
    fn set_document(&mut self, doc: Document);

    fn insert_embed(&mut self, offset: usize, embed: Embed) -> Result<(), SurfaceError>;

    /// Set (`Some`) or remove (`None`) an inline attribute over a range.
    ///
    /// Must not insert or delete content.
    fn format_range(
        &mut self,
        offset: usize,
        len: usize,
        attribute: &str,
        value: Option<&AttributeValue>,
    ) -> Result<(), SurfaceError>;

    // === Required: Selection ===

    /// Current caret offset, if the surface has a selection.
    fn selection_offset(&self) -> Option<usize>;

    fn set_selection_offset(&mut self, offset: usize);

    // === Required: Registration ===

    /// Register a named embed type.
    fn register_embed(&mut self, name: &str);

    /// Register a named inline attribute.
    fn register_attribute(&mut self, name: &str);

    // === Provided ===

    fn document_len(&self) -> usize {
        self.document().len()
    }
}

/// Registered embed and attribute names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatRegistry {
    embeds: BTreeSet<SmolStr>,
    attributes: BTreeSet<SmolStr>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the embed was already registered.
    pub fn register_embed(&mut self, name: &str) -> bool {
        self.embeds.insert(SmolStr::new(name))
    }

    /// Returns false if the attribute was already registered.
    pub fn register_attribute(&mut self, name: &str) -> bool {
        self.attributes.insert(SmolStr::new(name))
    }

    pub fn has_embed(&self, name: &str) -> bool {
        self.embeds.contains(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    pub fn check_embed(&self, name: &str) -> Result<(), SurfaceError> {
        if self.has_embed(name) {
            Ok(())
        } else {
            Err(SurfaceError::Unregistered {
                kind: "embed",
                name: SmolStr::new(name),
            })
        }
    }

    pub fn check_attribute(&self, name: &str) -> Result<(), SurfaceError> {
        if self.has_attribute(name) {
            Ok(())
        } else {
            Err(SurfaceError::Unregistered {
                kind: "attribute",
                name: SmolStr::new(name),
            })
        }
    }
}

/// Simple field-based implementation of [`EditingSurface`].
///
/// Stores the document, caret and registry as plain fields.
/// Use this for non-UI contexts or as a base for testing.
///
/// Its markup dialect is the canonical subset: text with entities, `<p>` and
/// `<br>` line breaks, `<strong>`/`<b>`, `<em>`/`<i>`, placeholder spans and
/// highlight spans. Other elements are dropped, keeping their content.
/// Non-breaking spaces are written as `&nbsp;`.
#[derive(Debug, Clone)]
pub struct PlainSurface {
    document: Document,
    selection: Option<usize>,
    registry: FormatRegistry,
}

impl Default for PlainSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl PlainSurface {
    /// A surface with only the built-in bold and italic attributes registered.
    pub fn new() -> Self {
        let mut registry = FormatRegistry::new();
        registry.register_attribute(BOLD_ATTRIBUTE);
        registry.register_attribute(ITALIC_ATTRIBUTE);
        Self {
            document: Document::new(),
            selection: None,
            registry,
        }
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    fn parse(&self, markup: &str) -> Result<Document, SurfaceError> {
        let tokens = markup::tokenize(markup);
        let mut doc = Document::new();
        // Open elements and the attribute each contributes.
        let mut open: Vec<(&str, Option<(&'static str, AttributeValue)>)> = Vec::new();
        // A `<br>` directly before `</p>` only keeps an empty paragraph open.
        let mut pending_break = false;
        let mut idx = 0;

        while idx < tokens.len() {
            let token = &tokens[idx].token;
            if !matches!(token, Token::End(name) if name.eq_ignore_ascii_case("p")) && pending_break {
                doc.push(Op::text("\n").with_attributes(current_attributes(&open)));
                pending_break = false;
            }

            match token {
                Token::Text(text) => {
                    doc.push(
                        Op::text(decode_entities(text).into_owned())
                            .with_attributes(current_attributes(&open)),
                    );
                }
                Token::Start(tag) => {
                    if let Some(placeholder) = PlaceholderToken::from_tag(tag) {
                        let embed = Embed::Placeholder(placeholder);
                        self.registry.check_embed(embed.kind())?;
                        doc.push(Op::embed(embed).with_attributes(current_attributes(&open)));
                        idx = markup::matching_end(&tokens, idx).map_or(idx + 1, |end| end + 1);
                        continue;
                    }
                    if tag.is("br") {
                        pending_break = true;
                    } else if !tag.is_void() {
                        let effect = if tag.is("strong") || tag.is("b") {
                            Some((BOLD_ATTRIBUTE, AttributeValue::Flag(true)))
                        } else if tag.is("em") || tag.is("i") {
                            Some((ITALIC_ATTRIBUTE, AttributeValue::Flag(true)))
                        } else if let Some(format) = HighlightFormat::from_tag(tag) {
                            Some((HIGHLIGHT_ATTRIBUTE, AttributeValue::Highlight(format)))
                        } else {
                            None
                        };
                        if let Some((name, _)) = &effect {
                            self.registry.check_attribute(name)?;
                        }
                        open.push((tag.name, effect));
                    }
                }
                Token::End(name) => {
                    if let Some(pos) = open.iter().rposition(|(n, _)| n.eq_ignore_ascii_case(name)) {
                        open.truncate(pos);
                    }
                    if name.eq_ignore_ascii_case("p") {
                        pending_break = false;
                        doc.push(Op::text("\n").with_attributes(current_attributes(&open)));
                    }
                }
                Token::Comment(_) => {}
            }
            idx += 1;
        }

        if pending_break {
            doc.push(Op::text("\n").with_attributes(current_attributes(&open)));
        }
        Ok(doc)
    }
}

fn current_attributes(open: &[(&str, Option<(&'static str, AttributeValue)>)]) -> Attributes {
    open.iter()
        .filter_map(|(_, effect)| effect.as_ref())
        .map(|(name, value)| (SmolStr::new(name), value.clone()))
        .collect()
}

/// Render one op's content wrapped in its attribute markup.
fn push_wrapped(out: &mut String, attributes: &Attributes, content: &str) {
    let highlight = attributes
        .get(HIGHLIGHT_ATTRIBUTE)
        .and_then(AttributeValue::as_highlight);
    let bold = attributes.contains_key(BOLD_ATTRIBUTE);
    let italic = attributes.contains_key(ITALIC_ATTRIBUTE);

    if let Some(format) = highlight {
        format.push_start_tag(out);
    }
    if bold {
        out.push_str("<strong>");
    }
    if italic {
        out.push_str("<em>");
    }
    out.push_str(content);
    if italic {
        out.push_str("</em>");
    }
    if bold {
        out.push_str("</strong>");
    }
    if highlight.is_some() {
        out.push_str("</span>");
    }
}

fn escape_segment(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, piece) in text.split('\u{a0}').enumerate() {
        if i > 0 {
            out.push_str("&nbsp;");
        }
        push_escaped_text(&mut out, piece);
    }
    out
}

fn flush_paragraph(out: &mut String, line: &mut String) {
    out.push_str("<p>");
    if line.is_empty() {
        out.push_str("<br>");
    }
    out.push_str(line);
    out.push_str("</p>");
    line.clear();
}

impl EditingSurface for PlainSurface {
    fn markup_to_document(&self, markup: &str) -> Result<Document, SurfaceError> {
        self.parse(markup)
    }

    fn document_to_markup(&self, doc: &Document) -> String {
        let mut out = String::new();
        let mut line = String::new();

        for op in doc.ops() {
            match &op.insert {
                Insert::Text(text) => {
                    for (i, segment) in text.split('\n').enumerate() {
                        if i > 0 {
                            flush_paragraph(&mut out, &mut line);
                        }
                        if !segment.is_empty() {
                            push_wrapped(&mut line, &op.attributes, &escape_segment(segment));
                        }
                    }
                }
                Insert::Embed(Embed::Placeholder(token)) => {
                    push_wrapped(&mut line, &op.attributes, &token.to_markup());
                }
            }
        }
        out.push_str(&line);
        out
    }

    fn document(&self) -> &Document {
        &self.document
    }

    fn set_document(&mut self, doc: Document) {
        self.document = doc;
        let len = self.document.len();
        if let Some(selection) = self.selection.as_mut() {
            *selection = (*selection).min(len);
        }
    }

    fn insert_embed(&mut self, offset: usize, embed: Embed) -> Result<(), SurfaceError> {
        self.registry.check_embed(embed.kind())?;
        self.document.insert_embed(offset, embed, Attributes::new())
    }

    fn format_range(
        &mut self,
        offset: usize,
        len: usize,
        attribute: &str,
        value: Option<&AttributeValue>,
    ) -> Result<(), SurfaceError> {
        self.registry.check_attribute(attribute)?;
        self.document.format(offset, len, attribute, value)
    }

    fn selection_offset(&self) -> Option<usize> {
        self.selection
    }

    fn set_selection_offset(&mut self, offset: usize) {
        self.selection = Some(offset.min(self.document.len()));
    }

    fn register_embed(&mut self, name: &str) {
        if self.registry.register_embed(name) {
            tracing::trace!(target: "weaver::richtext::surface", name, "registered embed");
        }
    }

    fn register_attribute(&mut self, name: &str) {
        if self.registry.register_attribute(name) {
            tracing::trace!(target: "weaver::richtext::surface", name, "registered attribute");
        }
    }
}
