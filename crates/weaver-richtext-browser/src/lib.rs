//! Browser DOM layer for weaver-richtext.
//!
//! Provides a web-sys [`OverlayHost`](weaver_richtext::OverlayHost) so the
//! core tooltip engine can show overlays next to highlight spans. It assumes
//! a `wasm32-unknown-unknown` target; on other targets the host reports every
//! anchor as detached.
//!
//! # Re-exports
//!
//! This crate re-exports `weaver-richtext` for convenience, so consumers
//! only need to depend on `weaver-richtext-browser`.

// Re-export core crate
pub use weaver_richtext;
pub use weaver_richtext::*;

pub mod overlay;
pub mod style;

pub use overlay::{DomOverlayHost, HoverTarget};
pub use style::{ANCHOR_ATTRIBUTE, TOOLTIP_CLASS, anchor_selector, tooltip_class};

/// Tooltip engine driving DOM overlays.
pub type DomTooltipEngine = TooltipEngine<DomOverlayHost>;
