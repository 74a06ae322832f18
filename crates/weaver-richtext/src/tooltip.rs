//! Viewport-aware tooltip placement.
//!
//! [`compute_placement`] is pure geometry. [`TooltipEngine`] owns the live
//! overlays, at most one per anchor, and drives an [`OverlayHost`] that
//! creates and positions the actual overlay nodes.

use std::collections::HashMap;
use std::fmt;

use crate::config::TooltipConfig;
use crate::highlight::TooltipPlacement;

/// Axis-aligned rectangle in viewport coordinates (CSS pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The area an overlay must stay inside.
    pub fn inset(&self, margin: f64) -> Rect {
        Rect::new(
            margin,
            margin,
            (self.width - 2.0 * margin).max(0.0),
            (self.height - 2.0 * margin).max(0.0),
        )
    }
}

/// How the overlay ended up placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Attached to one side of the anchor, with a directional arrow.
    Anchored(TooltipPlacement),
    /// No side fits: clamped into the viewport, without an arrow.
    Floating,
}

/// Resolved overlay position, in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayPosition {
    pub left: f64,
    pub top: f64,
    pub placement: Placement,
}

impl OverlayPosition {
    pub fn rect(&self, size: Size) -> Rect {
        Rect::new(self.left, self.top, size.width, size.height)
    }

    pub fn is_floating(&self) -> bool {
        self.placement == Placement::Floating
    }
}

/// Host-assigned identity of an anchor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub u64);

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn naive_position(anchor: Rect, overlay: Size, side: TooltipPlacement, gap: f64) -> (f64, f64) {
    let center_x = anchor.x + anchor.width / 2.0 - overlay.width / 2.0;
    let center_y = anchor.y + anchor.height / 2.0 - overlay.height / 2.0;
    match side {
        TooltipPlacement::Top => (center_x, anchor.y - gap - overlay.height),
        TooltipPlacement::Bottom => (center_x, anchor.bottom() + gap),
        TooltipPlacement::Left => (anchor.x - gap - overlay.width, center_y),
        TooltipPlacement::Right => (anchor.right() + gap, center_y),
    }
}

/// Place an overlay next to `anchor`.
///
/// Tries the preferred side, then its opposite. If neither fits inside the
/// viewport inset by `config.margin`, the preferred position is clamped into
/// it and reported as [`Placement::Floating`]. An overlay larger than the
/// inset viewport is pinned to the top-left margin.
pub fn compute_placement(
    anchor: Rect,
    overlay: Size,
    preferred: TooltipPlacement,
    viewport: Viewport,
    config: &TooltipConfig,
) -> OverlayPosition {
    let bounds = viewport.inset(config.margin);

    for side in [preferred, preferred.opposite()] {
        let (left, top) = naive_position(anchor, overlay, side, config.gap);
        if bounds.contains_rect(&Rect::new(left, top, overlay.width, overlay.height)) {
            return OverlayPosition {
                left,
                top,
                placement: Placement::Anchored(side),
            };
        }
    }

    let (left, top) = naive_position(anchor, overlay, preferred, config.gap);
    let max_left = (bounds.right() - overlay.width).max(bounds.x);
    let max_top = (bounds.bottom() - overlay.height).max(bounds.y);
    OverlayPosition {
        left: left.min(max_left).max(bounds.x),
        top: top.min(max_top).max(bounds.y),
        placement: Placement::Floating,
    }
}

/// Host seam for creating and positioning overlay nodes.
pub trait OverlayHost {
    /// Handle to one live overlay node.
    type Overlay;

    /// Current bounding rectangle of the anchor, or `None` if it is detached.
    fn anchor_rect(&self, anchor: AnchorId) -> Option<Rect>;

    fn viewport(&self) -> Viewport;

    /// Create an overlay showing `content`. `None` if the host cannot.
    fn create_overlay(&mut self, anchor: AnchorId, content: &str) -> Option<Self::Overlay>;

    /// Rendered size of an overlay that has been created but not positioned.
    fn measure(&self, overlay: &Self::Overlay) -> Size;

    fn position_overlay(&mut self, overlay: &Self::Overlay, position: &OverlayPosition);

    /// Remove the overlay node. The handle is consumed.
    fn remove_overlay(&mut self, overlay: Self::Overlay);
}

/// Owns every live tooltip overlay, keyed by anchor.
///
/// Each anchor is either hidden or shown with exactly one overlay. Every exit
/// path (`hide`, `detach`, `scrolled`, `hide_all`, drop) removes the node.
pub struct TooltipEngine<H: OverlayHost> {
    host: H,
    config: TooltipConfig,
    live: HashMap<AnchorId, H::Overlay>,
}

impl<H: OverlayHost> TooltipEngine<H> {
    pub fn new(host: H, config: TooltipConfig) -> Self {
        Self {
            host,
            config,
            live: HashMap::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &TooltipConfig {
        &self.config
    }

    /// Show a tooltip for `anchor`, replacing any overlay it already has.
    ///
    /// Returns `None`, leaving the anchor hidden, if the anchor is detached or
    /// the host could not create an overlay.
    pub fn show(
        &mut self,
        anchor: AnchorId,
        content: &str,
        preferred: TooltipPlacement,
    ) -> Option<OverlayPosition> {
        self.hide(anchor);

        let Some(anchor_rect) = self.host.anchor_rect(anchor) else {
            tracing::trace!(target: "weaver::richtext::tooltip", %anchor, "anchor detached, not showing");
            return None;
        };
        let Some(overlay) = self.host.create_overlay(anchor, content) else {
            tracing::warn!(target: "weaver::richtext::tooltip", %anchor, "host could not create overlay");
            return None;
        };

        let size = self.host.measure(&overlay);
        let position = compute_placement(
            anchor_rect,
            size,
            preferred,
            self.host.viewport(),
            &self.config,
        );
        self.host.position_overlay(&overlay, &position);
        self.live.insert(anchor, overlay);

        tracing::trace!(
            target: "weaver::richtext::tooltip",
            %anchor,
            placement = ?position.placement,
            "tooltip shown"
        );
        Some(position)
    }

    /// Remove the overlay for `anchor`. Returns whether one was shown.
    pub fn hide(&mut self, anchor: AnchorId) -> bool {
        match self.live.remove(&anchor) {
            Some(overlay) => {
                self.host.remove_overlay(overlay);
                true
            }
            None => false,
        }
    }

    /// The anchor left the document.
    pub fn detach(&mut self, anchor: AnchorId) -> bool {
        self.hide(anchor)
    }

    /// The anchor's nearest scrollable ancestor scrolled.
    pub fn scrolled(&mut self, anchor: AnchorId) -> bool {
        self.hide(anchor)
    }

    /// Remove every live overlay, returning how many there were.
    pub fn hide_all(&mut self) -> usize {
        let count = self.live.len();
        for (_, overlay) in self.live.drain() {
            self.host.remove_overlay(overlay);
        }
        count
    }

    pub fn is_shown(&self, anchor: AnchorId) -> bool {
        self.live.contains_key(&anchor)
    }

    pub fn live_overlays(&self) -> usize {
        self.live.len()
    }
}

impl<H: OverlayHost> Drop for TooltipEngine<H> {
    fn drop(&mut self) {
        let removed = self.hide_all();
        if removed > 0 {
            tracing::trace!(target: "weaver::richtext::tooltip", removed, "removed overlays on drop");
        }
    }
}
