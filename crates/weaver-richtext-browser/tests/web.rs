//! WASM browser tests for weaver-richtext-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

#![cfg(all(target_arch = "wasm32", target_os = "unknown"))]

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use weaver_richtext_browser::{
    AnchorId, DomOverlayHost, DomTooltipEngine, EditingSurface, HighlightRequest, Placement,
    PlainSurface, RichTextEditor, TOOLTIP_CLASS, TooltipConfig, TooltipPlacement,
    anchor_selector,
};

fn document() -> web_sys::Document {
    web_sys::window().unwrap().document().unwrap()
}

/// Render the editor's canonical markup into a fresh editor root.
fn mount(id: &str, storage: &str, requests: Vec<HighlightRequest>) -> web_sys::Element {
    let mut editor = RichTextEditor::new(PlainSurface::new());
    editor.set_highlight_requests(requests).unwrap();
    editor.load(storage).unwrap();
    let surface = editor.surface();
    let markup = surface.document_to_markup(surface.document());

    let root = document().create_element("div").unwrap();
    root.set_id(id);
    root.set_inner_html(&markup);
    document().body().unwrap().append_child(&root).unwrap();
    root
}

fn overlay_count() -> u32 {
    document()
        .query_selector_all(&format!(".{TOOLTIP_CLASS}"))
        .unwrap()
        .length()
}

// === Anchor assignment ===

#[wasm_bindgen_test]
fn test_assign_anchor_ids() {
    let root = mount(
        "editor-assign",
        "alpha beta alpha",
        vec![HighlightRequest::new("alpha").with_tooltip("first letter")],
    );
    let mut host = DomOverlayHost::new("editor-assign");
    assert_eq!(host.assign_anchor_ids(), 2);
    assert_eq!(host.assign_anchor_ids(), 0);
    assert!(root
        .query_selector(&anchor_selector(AnchorId(2)))
        .unwrap()
        .is_some());
    root.remove();
}

#[wasm_bindgen_test]
fn test_hover_target() {
    let root = mount(
        "editor-hover",
        "see note",
        vec![
            HighlightRequest::new("note")
                .with_tooltip("A note")
                .with_placement(TooltipPlacement::Bottom)
                .with_id("n1"),
        ],
    );
    let mut host = DomOverlayHost::new("editor-hover");
    host.assign_anchor_ids();

    let span = root.query_selector(".ql-highlight").unwrap().unwrap();
    let target = host.hover_target(&span).unwrap();
    assert_eq!(target.anchor, AnchorId(1));
    assert_eq!(target.tooltip, "A note");
    assert_eq!(target.placement, TooltipPlacement::Bottom);
    assert_eq!(target.highlight_id.as_deref(), Some("n1"));
    root.remove();
}

// === Overlay lifecycle ===

#[wasm_bindgen_test]
fn test_show_hide_leaves_no_overlay() {
    let root = mount(
        "editor-lifecycle",
        "hover here",
        vec![HighlightRequest::new("here").with_tooltip("tip")],
    );
    let mut host = DomOverlayHost::new("editor-lifecycle");
    host.assign_anchor_ids();
    let before = overlay_count();

    let mut engine = DomTooltipEngine::new(host, TooltipConfig::default());
    for _ in 0..5 {
        let position = engine
            .show(AnchorId(1), "tip", TooltipPlacement::Top)
            .unwrap();
        assert!(matches!(
            position.placement,
            Placement::Anchored(_) | Placement::Floating
        ));
        assert_eq!(overlay_count(), before + 1);
    }
    assert!(engine.hide(AnchorId(1)));
    assert_eq!(overlay_count(), before);

    engine.show(AnchorId(1), "tip", TooltipPlacement::Top);
    drop(engine);
    assert_eq!(overlay_count(), before);
    root.remove();
}

#[wasm_bindgen_test]
fn test_detached_anchor_noop() {
    let root = mount(
        "editor-detached",
        "gone soon",
        vec![HighlightRequest::new("gone").with_tooltip("tip")],
    );
    let mut host = DomOverlayHost::new("editor-detached");
    host.assign_anchor_ids();
    root.remove();

    let mut engine = DomTooltipEngine::new(host, TooltipConfig::default());
    assert!(engine
        .show(AnchorId(1), "tip", TooltipPlacement::Top)
        .is_none());
    assert_eq!(engine.live_overlays(), 0);
}

#[wasm_bindgen_test]
fn test_overlay_inside_viewport() {
    let root = mount(
        "editor-viewport",
        "top edge",
        vec![HighlightRequest::new("top").with_tooltip("flip me")],
    );
    root.dyn_ref::<web_sys::HtmlElement>()
        .unwrap()
        .style()
        .set_property("position", "fixed")
        .unwrap();
    let _ = root
        .dyn_ref::<web_sys::HtmlElement>()
        .unwrap()
        .style()
        .set_property("top", "0px");

    let mut host = DomOverlayHost::new("editor-viewport");
    host.assign_anchor_ids();
    let mut engine = DomTooltipEngine::new(host, TooltipConfig::default());
    let position = engine
        .show(AnchorId(1), "flip me", TooltipPlacement::Top)
        .unwrap();
    assert_ne!(
        position.placement,
        Placement::Anchored(TooltipPlacement::Top)
    );
    assert!(position.top >= 0.0);
    engine.hide_all();
    root.remove();
}
