//! Document representation: an ordered sequence of text runs and embeds.
//!
//! Offsets are in Unicode scalar values (chars), NOT bytes. Every embed
//! occupies exactly one offset regardless of its payload, so the offset of
//! op `i` is the sum of the lengths of the ops before it.

use std::collections::BTreeMap;

use smol_str::SmolStr;

use crate::error::SurfaceError;
use crate::highlight::HighlightFormat;
use crate::placeholder::{PLACEHOLDER_EMBED, PlaceholderToken};
use crate::search::LocatedRange;

/// Inline formatting carried by an op, keyed by attribute name.
pub type Attributes = BTreeMap<SmolStr, AttributeValue>;

/// Typed attribute payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Highlight(HighlightFormat),
    Flag(bool),
    Text(SmolStr),
}

impl AttributeValue {
    /// Apply `update` on top of this value.
    ///
    /// Highlights merge field by field; every other kind is replaced.
    pub fn merge(&mut self, update: AttributeValue) {
        match (self, update) {
            (AttributeValue::Highlight(current), AttributeValue::Highlight(update)) => {
                current.merge(update)
            }
            (current, update) => *current = update,
        }
    }

    pub fn as_highlight(&self) -> Option<&HighlightFormat> {
        match self {
            AttributeValue::Highlight(format) => Some(format),
            _ => None,
        }
    }
}

/// Typed embed payloads. Each embed is one offset unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Embed {
    Placeholder(PlaceholderToken),
}

impl Embed {
    /// The embed type name the host must have registered.
    pub fn kind(&self) -> &'static str {
        match self {
            Embed::Placeholder(_) => PLACEHOLDER_EMBED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insert {
    Text(String),
    Embed(Embed),
}

/// A single operation: a text run or an embed, plus its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Op {
    pub insert: Insert,
    pub attributes: Attributes,
}

impl Op {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            insert: Insert::Text(text.into()),
            attributes: Attributes::new(),
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            insert: Insert::Embed(embed),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<SmolStr>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Offset units contributed by this op.
    pub fn len(&self) -> usize {
        match &self.insert {
            Insert::Text(text) => text.chars().count(),
            Insert::Embed(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.insert {
            Insert::Text(text) => Some(text),
            Insert::Embed(_) => None,
        }
    }
}

/// An ordered, normalized op sequence.
///
/// Normalized means: no empty text runs, and no two adjacent text runs with
/// equal attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    ops: Vec<Op>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ops(ops: impl IntoIterator<Item = Op>) -> Self {
        let mut doc = Self::new();
        for op in ops {
            doc.push(op);
        }
        doc
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Total length in offset units.
    pub fn len(&self) -> usize {
        self.ops.iter().map(Op::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Append an op, merging it into the last run when possible.
    pub fn push(&mut self, op: Op) {
        if let Insert::Text(text) = &op.insert {
            if text.is_empty() {
                return;
            }
            if let Some(last) = self.ops.last_mut() {
                if let Insert::Text(last_text) = &mut last.insert {
                    if last.attributes == op.attributes {
                        last_text.push_str(text);
                        return;
                    }
                }
            }
        }
        self.ops.push(op);
    }

    /// Append every op of `other` onto the end of this document.
    pub fn concat(&mut self, other: Document) {
        for op in other.ops {
            self.push(op);
        }
    }

    /// Text projection with embeds shown as U+FFFC. Mostly useful for tests and logs.
    pub fn plain_text(&self) -> String {
        self.ops
            .iter()
            .map(|op| match &op.insert {
                Insert::Text(text) => text.as_str(),
                Insert::Embed(_) => "\u{FFFC}",
            })
            .collect()
    }

    pub fn insert_text(
        &mut self,
        offset: usize,
        text: &str,
        attributes: Attributes,
    ) -> Result<(), SurfaceError> {
        self.check_range(offset, 0)?;
        let idx = self.split_at(offset);
        self.ops.insert(idx, Op::text(text).with_attributes(attributes));
        self.normalize();
        Ok(())
    }

    pub fn insert_embed(
        &mut self,
        offset: usize,
        embed: Embed,
        attributes: Attributes,
    ) -> Result<(), SurfaceError> {
        self.check_range(offset, 0)?;
        let idx = self.split_at(offset);
        self.ops.insert(idx, Op::embed(embed).with_attributes(attributes));
        self.normalize();
        Ok(())
    }

    /// Set (`Some`) or remove (`None`) an attribute across `offset..offset + len`.
    ///
    /// Never inserts or deletes content, so the document length is unchanged.
    pub fn format(
        &mut self,
        offset: usize,
        len: usize,
        name: &str,
        value: Option<&AttributeValue>,
    ) -> Result<(), SurfaceError> {
        self.check_range(offset, len)?;
        if len == 0 {
            return Ok(());
        }

        let start = self.split_at(offset);
        let end = self.split_at(offset + len);
        for op in &mut self.ops[start..end] {
            match value {
                Some(value) => match op.attributes.get_mut(name) {
                    Some(existing) => existing.merge(value.clone()),
                    None => {
                        op.attributes.insert(SmolStr::new(name), value.clone());
                    }
                },
                None => {
                    op.attributes.remove(name);
                }
            }
        }
        self.normalize();
        Ok(())
    }

    /// Contiguous ranges whose ops all carry the attribute `name`.
    pub fn attribute_ranges(&self, name: &str) -> Vec<LocatedRange> {
        let mut ranges: Vec<LocatedRange> = Vec::new();
        let mut offset = 0;
        let mut open = false;
        for op in &self.ops {
            let len = op.len();
            if op.attributes.contains_key(name) {
                match ranges.last_mut() {
                    Some(last) if open => last.len += len,
                    _ => ranges.push(LocatedRange { start: offset, len }),
                }
                open = true;
            } else {
                open = false;
            }
            offset += len;
        }
        ranges
    }

    /// Attributes at a single offset, if the offset is inside the document.
    pub fn attributes_at(&self, offset: usize) -> Option<&Attributes> {
        let mut start = 0;
        for op in &self.ops {
            let end = start + op.len();
            if offset < end {
                return Some(&op.attributes);
            }
            start = end;
        }
        None
    }

    fn check_range(&self, offset: usize, len: usize) -> Result<(), SurfaceError> {
        let doc_len = self.len();
        let end = offset.saturating_add(len);
        if end > doc_len {
            return Err(SurfaceError::OutOfBounds {
                offset,
                end,
                len: doc_len,
            });
        }
        Ok(())
    }

    /// Ensure an op boundary at `offset`, returning the index of the op that starts there.
    ///
    /// `offset` must be within `0..=len()`.
    fn split_at(&mut self, offset: usize) -> usize {
        let mut start = 0;
        for idx in 0..self.ops.len() {
            if offset == start {
                return idx;
            }
            let len = self.ops[idx].len();
            if offset < start + len {
                // Embeds are one unit wide, so only text runs can be split inside.
                if let Insert::Text(text) = &mut self.ops[idx].insert {
                    let byte = text
                        .char_indices()
                        .nth(offset - start)
                        .map(|(b, _)| b)
                        .unwrap_or(text.len());
                    let tail = text.split_off(byte);
                    let tail_op = Op::text(tail).with_attributes(self.ops[idx].attributes.clone());
                    self.ops.insert(idx + 1, tail_op);
                }
                return idx + 1;
            }
            start += len;
        }
        self.ops.len()
    }

    fn normalize(&mut self) {
        let ops = std::mem::take(&mut self.ops);
        for op in ops {
            self.push(op);
        }
    }
}
