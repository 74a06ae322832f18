//! DOM implementation of the tooltip overlay host.
//!
//! Anchors are highlight spans inside the editor root carrying a
//! `data-anchor-id` attribute. Overlays are `div`s appended to
//! `document.body` and positioned in viewport coordinates.

use smol_str::SmolStr;
use weaver_richtext::{AnchorId, OverlayHost, OverlayPosition, Rect, Size, TooltipPlacement, Viewport};

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
use crate::style::{
    ANCHOR_ATTRIBUTE, TOOLTIP_CLASS, anchor_selector, overlay_style, parse_anchor_id,
    parse_placement, tooltip_class,
};
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
use wasm_bindgen::JsCast;

/// What a hovered highlight wants shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverTarget {
    pub anchor: AnchorId,
    pub tooltip: String,
    pub placement: TooltipPlacement,
    /// Identity of the hovered highlight, if the request carried one.
    pub highlight_id: Option<SmolStr>,
}

/// Overlay host over the browser DOM.
pub struct DomOverlayHost {
    editor_id: String,
    next_anchor: u64,
}

impl DomOverlayHost {
    /// Host for the editor element with the given DOM id.
    pub fn new(editor_id: impl Into<String>) -> Self {
        Self {
            editor_id: editor_id.into(),
            next_anchor: 1,
        }
    }

    pub fn editor_id(&self) -> &str {
        &self.editor_id
    }

    /// The id the next assigned anchor will get.
    pub fn next_anchor(&self) -> AnchorId {
        AnchorId(self.next_anchor)
    }
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
impl DomOverlayHost {
    fn editor(&self) -> Option<web_sys::Element> {
        let window = web_sys::window()?;
        let document = window.document()?;
        document.get_element_by_id(&self.editor_id)
    }

    fn anchor_element(&self, anchor: AnchorId) -> Option<web_sys::Element> {
        self.editor()?
            .query_selector(&anchor_selector(anchor))
            .ok()
            .flatten()
    }

    /// Give every tooltip-bearing highlight in the editor an anchor id.
    ///
    /// Call after each load; ids already present are kept. Returns how many
    /// anchors were newly assigned.
    pub fn assign_anchor_ids(&mut self) -> usize {
        let Some(editor) = self.editor() else {
            return 0;
        };
        let selector = format!(".ql-highlight[data-tooltip]:not([{ANCHOR_ATTRIBUTE}])");
        let Ok(nodes) = editor.query_selector_all(&selector) else {
            return 0;
        };

        let mut assigned = 0;
        for i in 0..nodes.length() {
            let Some(element) = nodes
                .item(i)
                .and_then(|node| node.dyn_into::<web_sys::Element>().ok())
            else {
                continue;
            };
            let id = self.next_anchor;
            if element
                .set_attribute(ANCHOR_ATTRIBUTE, &id.to_string())
                .is_ok()
            {
                self.next_anchor += 1;
                assigned += 1;
            }
        }
        tracing::trace!(target: "weaver::richtext::browser", assigned, "assigned anchor ids");
        assigned
    }

    /// Resolve the hover payload for an element under the pointer.
    ///
    /// Walks up to the nearest anchored highlight inside the editor.
    pub fn hover_target(&self, element: &web_sys::Element) -> Option<HoverTarget> {
        let anchored = element
            .closest(&format!("[{ANCHOR_ATTRIBUTE}]"))
            .ok()
            .flatten()?;
        if !self.editor()?.contains(Some(&*anchored)) {
            return None;
        }
        Some(HoverTarget {
            anchor: parse_anchor_id(&anchored.get_attribute(ANCHOR_ATTRIBUTE)?)?,
            tooltip: anchored.get_attribute("data-tooltip")?,
            placement: parse_placement(
                anchored
                    .get_attribute("data-tooltip-placement")
                    .as_deref(),
            ),
            highlight_id: anchored
                .get_attribute("data-highlight-id")
                .map(SmolStr::from),
        })
    }
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
impl OverlayHost for DomOverlayHost {
    type Overlay = web_sys::HtmlElement;

    fn anchor_rect(&self, anchor: AnchorId) -> Option<Rect> {
        let element = self.anchor_element(anchor)?;
        if !element.is_connected() {
            return None;
        }
        let rect = element.get_bounding_client_rect();
        Some(Rect::new(rect.x(), rect.y(), rect.width(), rect.height()))
    }

    fn viewport(&self) -> Viewport {
        let Some(window) = web_sys::window() else {
            return Viewport::default();
        };
        let width = window
            .inner_width()
            .ok()
            .and_then(|w| w.as_f64())
            .unwrap_or(0.0);
        let height = window
            .inner_height()
            .ok()
            .and_then(|h| h.as_f64())
            .unwrap_or(0.0);
        Viewport::new(width, height)
    }

    fn create_overlay(&mut self, anchor: AnchorId, content: &str) -> Option<web_sys::HtmlElement> {
        let document = web_sys::window()?.document()?;
        let overlay = document
            .create_element("div")
            .ok()?
            .dyn_into::<web_sys::HtmlElement>()
            .ok()?;
        overlay.set_class_name(TOOLTIP_CLASS);
        overlay.set_attribute("role", "tooltip").ok()?;
        overlay
            .set_attribute("data-tooltip-for", &anchor.to_string())
            .ok()?;
        overlay.set_text_content(Some(content));

        // Hidden at the origin until positioned, so measuring does not flash.
        let style = overlay.style();
        let _ = style.set_property("position", "fixed");
        let _ = style.set_property("left", "0px");
        let _ = style.set_property("top", "0px");
        let _ = style.set_property("visibility", "hidden");

        document.body()?.append_child(&overlay).ok()?;
        Some(overlay)
    }

    fn measure(&self, overlay: &web_sys::HtmlElement) -> Size {
        let rect = overlay.get_bounding_client_rect();
        Size::new(rect.width(), rect.height())
    }

    fn position_overlay(&mut self, overlay: &web_sys::HtmlElement, position: &OverlayPosition) {
        overlay.set_class_name(&tooltip_class(position.placement));
        let style = overlay.style();
        for (property, value) in overlay_style(position) {
            if let Err(e) = style.set_property(property, &value) {
                tracing::warn!(target: "weaver::richtext::browser", property, error = ?e, "failed to style overlay");
            }
        }
    }

    fn remove_overlay(&mut self, overlay: web_sys::HtmlElement) {
        overlay.remove();
    }
}

#[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
impl DomOverlayHost {
    /// Non-WASM: there is no editor root to scan.
    pub fn assign_anchor_ids(&mut self) -> usize {
        0
    }

    /// Non-WASM: nothing is ever hovered.
    pub fn hover_target(&self, _element: &web_sys::Element) -> Option<HoverTarget> {
        None
    }
}

/// No DOM on non-WASM targets: every anchor is detached.
#[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
impl OverlayHost for DomOverlayHost {
    type Overlay = web_sys::HtmlElement;

    fn anchor_rect(&self, _anchor: AnchorId) -> Option<Rect> {
        None
    }

    fn viewport(&self) -> Viewport {
        Viewport::default()
    }

    fn create_overlay(&mut self, _anchor: AnchorId, _content: &str) -> Option<web_sys::HtmlElement> {
        None
    }

    fn measure(&self, _overlay: &web_sys::HtmlElement) -> Size {
        Size::default()
    }

    fn position_overlay(&mut self, _overlay: &web_sys::HtmlElement, _position: &OverlayPosition) {}

    fn remove_overlay(&mut self, _overlay: web_sys::HtmlElement) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use weaver_richtext::{TooltipConfig, TooltipEngine};

    #[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
    #[test]
    fn test_native_host_never_shows() {
        let mut host = DomOverlayHost::new("editor");
        assert_eq!(host.assign_anchor_ids(), 0);
        assert_eq!(host.next_anchor(), AnchorId(1));

        let mut engine = TooltipEngine::new(host, TooltipConfig::default());
        assert!(engine.show(AnchorId(1), "tip", TooltipPlacement::Top).is_none());
        assert_eq!(engine.live_overlays(), 0);
        assert_eq!(engine.host().editor_id(), "editor");
        assert_eq!(engine.host().next_anchor(), AnchorId(1));
    }
}
