//! weaver-richtext: storage ⇄ document bridging for rich-text editing surfaces.
//!
//! This crate provides:
//! - `Document` - run/embed operation sequence where every embed is one offset unit
//! - Placeholder codec: `{{KEY}}` tokens ⇄ inline embed markup
//! - Highlight codec: highlight markup ⇄ plain phrases, plus phrase re-wrapping
//! - Offset-mapped search over documents containing embeds
//! - Descending-order range formatting that never invalidates pending ranges
//! - Viewport-aware tooltip placement with one live overlay per anchor
//! - `RichTextEditor<S>` - facade generic over the host `EditingSurface`

pub mod config;
pub mod document;
pub mod error;
pub mod facade;
pub mod highlight;
pub mod markup;
pub mod placeholder;
pub mod ranges;
pub mod search;
pub mod surface;
pub mod tooltip;

pub use config::{EditorConfig, TooltipConfig};
pub use document::{AttributeValue, Attributes, Document, Embed, Insert, Op};
pub use error::{ConfigError, RichTextError, SurfaceError};
pub use facade::RichTextEditor;
pub use highlight::{
    HIGHLIGHT_ATTRIBUTE, HighlightFormat, HighlightRequest, TooltipPlacement,
    document_markup_from_storage, storage_from_document_markup,
};
pub use placeholder::{PLACEHOLDER_EMBED, PlaceholderToken, markup_to_tokens, tokens_to_markup};
pub use ranges::{RangeFormat, apply_range_formats};
pub use search::{LocatedRange, SearchOptions, TextProjection, find_all};
pub use smol_str::SmolStr;
pub use surface::{EditingSurface, FormatRegistry, PlainSurface};
pub use tooltip::{
    AnchorId, OverlayHost, OverlayPosition, Placement, Rect, Size, TooltipEngine, Viewport,
    compute_placement,
};
