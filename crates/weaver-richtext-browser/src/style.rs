//! CSS helpers for tooltip overlays.
//!
//! Overlays are `position: fixed` so engine coordinates (viewport space) map
//! straight onto `left`/`top`. The side is exposed as a class so stylesheets
//! can draw the arrow:
//!
//! ```css
//! .ql-tooltip { pointer-events: none; }
//! .ql-tooltip-top::after { /* arrow pointing down */ }
//! .ql-tooltip-floating::after { display: none; }
//! ```

use weaver_richtext::{AnchorId, OverlayPosition, Placement, TooltipPlacement};

/// Base class on every overlay element.
pub const TOOLTIP_CLASS: &str = "ql-tooltip";

/// Attribute carrying an anchor's [`AnchorId`].
pub const ANCHOR_ATTRIBUTE: &str = "data-anchor-id";

/// Class list for an overlay with the given placement.
pub fn tooltip_class(placement: Placement) -> String {
    let modifier = match placement {
        Placement::Anchored(side) => side.as_str(),
        Placement::Floating => "floating",
    };
    format!("{TOOLTIP_CLASS} {TOOLTIP_CLASS}-{modifier}")
}

/// Inline style properties that put an overlay at `position`.
pub fn overlay_style(position: &OverlayPosition) -> [(&'static str, String); 4] {
    [
        ("position", "fixed".to_owned()),
        ("left", format!("{}px", position.left)),
        ("top", format!("{}px", position.top)),
        ("visibility", "visible".to_owned()),
    ]
}

/// CSS selector matching the element for `anchor`.
pub fn anchor_selector(anchor: AnchorId) -> String {
    format!("[{ANCHOR_ATTRIBUTE}=\"{anchor}\"]")
}

/// Parse an anchor id attribute value.
pub fn parse_anchor_id(value: &str) -> Option<AnchorId> {
    value.trim().parse().ok().map(AnchorId)
}

/// Placement from a `data-tooltip-placement` value, defaulting to top.
pub fn parse_placement(value: Option<&str>) -> TooltipPlacement {
    value
        .and_then(TooltipPlacement::parse)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tooltip_class() {
        assert_eq!(
            tooltip_class(Placement::Anchored(TooltipPlacement::Bottom)),
            "ql-tooltip ql-tooltip-bottom"
        );
        assert_eq!(tooltip_class(Placement::Floating), "ql-tooltip ql-tooltip-floating");
    }

    #[test]
    fn test_overlay_style() {
        let position = OverlayPosition {
            left: 12.5,
            top: 30.0,
            placement: Placement::Floating,
        };
        let style = overlay_style(&position);
        assert_eq!(style[1], ("left", "12.5px".to_owned()));
        assert_eq!(style[2], ("top", "30px".to_owned()));
    }

    #[test]
    fn test_anchor_ids() {
        assert_eq!(anchor_selector(AnchorId(7)), "[data-anchor-id=\"7\"]");
        assert_eq!(parse_anchor_id(" 42 "), Some(AnchorId(42)));
        assert_eq!(parse_anchor_id("x"), None);
    }

    #[test]
    fn test_parse_placement() {
        assert_eq!(parse_placement(Some("right")), TooltipPlacement::Right);
        assert_eq!(parse_placement(Some("sideways")), TooltipPlacement::Top);
        assert_eq!(parse_placement(None), TooltipPlacement::Top);
    }
}
