//! Descending-order range formatting.
//!
//! Formatting at an offset never shifts offsets before it, so applying a batch
//! from the highest start down keeps every pending range valid without
//! recomputation. This only holds while each step is attribute-only; the
//! length is checked after every step.

use std::cmp::Reverse;

use crate::document::AttributeValue;
use crate::error::RichTextError;
use crate::search::LocatedRange;
use crate::surface::EditingSurface;

/// A located range with the attribute value to set, or `None` to remove it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeFormat {
    pub range: LocatedRange,
    pub value: Option<AttributeValue>,
}

impl RangeFormat {
    pub fn set(range: LocatedRange, value: AttributeValue) -> Self {
        Self {
            range,
            value: Some(value),
        }
    }

    pub fn remove(range: LocatedRange) -> Self {
        Self { range, value: None }
    }
}

/// Apply `formats` for `attribute` in descending start order.
///
/// Returns the number of ranges applied. Zero-length ranges are skipped.
/// Ranges sharing a start keep their relative order.
pub fn apply_range_formats<S>(
    surface: &mut S,
    attribute: &str,
    formats: impl IntoIterator<Item = RangeFormat>,
) -> Result<usize, RichTextError>
where
    S: EditingSurface + ?Sized,
{
    let mut formats: Vec<RangeFormat> = formats
        .into_iter()
        .filter(|format| format.range.len > 0)
        .collect();
    formats.sort_by_key(|format| Reverse(format.range.start));

    let before = surface.document_len();
    for format in &formats {
        surface.format_range(
            format.range.start,
            format.range.len,
            attribute,
            format.value.as_ref(),
        )?;
        let after = surface.document_len();
        if after != before {
            tracing::warn!(
                target: "weaver::richtext::ranges",
                attribute,
                before,
                after,
                "formatting changed document length"
            );
            return Err(RichTextError::LengthChanged { before, after });
        }
    }

    tracing::debug!(
        target: "weaver::richtext::ranges",
        attribute,
        applied = formats.len(),
        "applied range formats"
    );
    Ok(formats.len())
}
