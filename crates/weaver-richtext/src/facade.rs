//! Document facade over a host editing surface.

use std::cmp::Reverse;

use crate::config::EditorConfig;
use crate::document::{AttributeValue, Document, Embed};
use crate::error::RichTextError;
use crate::highlight::{
    HIGHLIGHT_ATTRIBUTE, HighlightRequest, document_markup_from_storage,
    storage_from_document_markup,
};
use crate::placeholder::{PLACEHOLDER_EMBED, PlaceholderToken, markup_to_tokens, tokens_to_markup};
use crate::ranges::{RangeFormat, apply_range_formats};
use crate::search::{LocatedRange, SearchOptions, TextProjection};
use crate::surface::EditingSurface;

/// Storage-facing operations over an [`EditingSurface`].
///
/// Holds the surface by composition. Placeholder embeds and the highlight
/// attribute are registered with it on construction.
pub struct RichTextEditor<S: EditingSurface> {
    surface: S,
    config: EditorConfig,
    requests: Vec<HighlightRequest>,
    loaded: bool,
}

impl<S: EditingSurface> RichTextEditor<S> {
    pub fn new(surface: S) -> Self {
        Self::with_config(surface, EditorConfig::default())
    }

    pub fn with_config(mut surface: S, config: EditorConfig) -> Self {
        surface.register_embed(PLACEHOLDER_EMBED);
        surface.register_attribute(HIGHLIGHT_ATTRIBUTE);
        Self {
            surface,
            config,
            requests: Vec::new(),
            loaded: false,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn highlight_requests(&self) -> &[HighlightRequest] {
        &self.requests
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Storage text to a document. Highlight requests are applied afterwards
    /// through the search path, so phrase wrapping is not done here.
    fn convert(&self, storage: &str) -> Result<Document, RichTextError> {
        let markup = tokens_to_markup(storage);
        let markup = document_markup_from_storage(&markup, &[]);
        Ok(self.surface.markup_to_document(&markup)?)
    }

    fn reapply_requests(&mut self) -> Result<usize, RichTextError> {
        let requests = self.requests.clone();
        self.apply_highlights(&requests)
    }

    fn ensure_loaded(&self) -> Result<(), RichTextError> {
        if self.loaded {
            Ok(())
        } else {
            Err(RichTextError::NotLoaded)
        }
    }

    /// Replace the document with `storage` and apply the stored highlight requests.
    pub fn load(&mut self, storage: &str) -> Result<(), RichTextError> {
        let doc = self.convert(storage)?;
        tracing::debug!(
            target: "weaver::richtext::facade",
            storage_len = storage.len(),
            doc_len = doc.len(),
            requests = self.requests.len(),
            "loaded document"
        );
        self.surface.set_document(doc);
        self.loaded = true;
        self.reapply_requests()?;
        Ok(())
    }

    /// Current document as storage text.
    pub fn extract(&self) -> String {
        let markup = self.surface.document_to_markup(self.surface.document());
        let storage = markup_to_tokens(&storage_from_document_markup(&markup));
        if self.config.normalize_nbsp {
            storage.replace("&nbsp;", " ").replace('\u{a0}', " ")
        } else {
            storage
        }
    }

    /// Extract, then reload with the current highlight requests.
    ///
    /// Returns the extracted storage text.
    pub fn refresh(&mut self) -> Result<String, RichTextError> {
        let storage = self.extract();
        self.load(&storage)?;
        Ok(storage)
    }

    /// Convert `storage` and concatenate it onto the current document.
    pub fn append(&mut self, storage: &str) -> Result<(), RichTextError> {
        let fragment = self.convert(storage)?;
        let mut doc = self.surface.document().clone();
        doc.concat(fragment);
        tracing::debug!(target: "weaver::richtext::facade", doc_len = doc.len(), "appended fragment");
        self.surface.set_document(doc);
        self.loaded = true;
        self.reapply_requests()?;
        Ok(())
    }

    /// Insert a placeholder embed and put the caret right after it.
    ///
    /// Without an explicit offset, inserts at the caret, or at the end if the
    /// surface has no selection. Returns the new caret offset.
    pub fn insert_placeholder(
        &mut self,
        token: PlaceholderToken,
        offset: Option<usize>,
    ) -> Result<usize, RichTextError> {
        self.ensure_loaded()?;
        let len = self.surface.document_len();
        let offset = offset
            .or_else(|| self.surface.selection_offset())
            .unwrap_or(len);
        if offset > len {
            return Err(RichTextError::OffsetOutOfBounds { offset, len });
        }

        tracing::debug!(target: "weaver::richtext::facade", key = %token.key, offset, "inserting placeholder");
        self.surface.insert_embed(offset, Embed::Placeholder(token))?;
        let caret = offset + 1;
        self.surface.set_selection_offset(caret);
        Ok(caret)
    }

    /// Store the requests used on every load, and re-apply them to a loaded document.
    pub fn set_highlight_requests(
        &mut self,
        requests: Vec<HighlightRequest>,
    ) -> Result<(), RichTextError> {
        self.requests = requests;
        if self.loaded {
            self.remove_all_highlights()?;
            self.reapply_requests()?;
        }
        Ok(())
    }

    /// Highlight every occurrence of each request's phrase in the loaded document.
    ///
    /// Longer phrases claim their ranges first; a hit overlapping an already
    /// claimed range is skipped. Returns the number of ranges formatted.
    pub fn apply_highlights(
        &mut self,
        requests: &[HighlightRequest],
    ) -> Result<usize, RichTextError> {
        self.ensure_loaded()?;
        let projection = TextProjection::new(self.surface.document());
        let options = SearchOptions {
            case_sensitive: self.config.case_sensitive,
        };

        let mut ordered: Vec<&HighlightRequest> = requests.iter().collect();
        ordered.sort_by_key(|request| Reverse(request.text.chars().count()));

        let mut claimed: Vec<LocatedRange> = Vec::new();
        let mut formats = Vec::new();
        for request in ordered {
            let value = AttributeValue::Highlight(request.format());
            for range in projection.find_all(&request.text, options) {
                if claimed.iter().any(|c| c.start < range.end() && range.start < c.end()) {
                    continue;
                }
                claimed.push(range);
                formats.push(RangeFormat::set(range, value.clone()));
            }
        }

        tracing::debug!(
            target: "weaver::richtext::facade",
            requests = requests.len(),
            ranges = formats.len(),
            "applying highlights"
        );
        apply_range_formats(&mut self.surface, HIGHLIGHT_ATTRIBUTE, formats)
    }

    /// Remove the highlight attribute everywhere. Returns the number of ranges cleared.
    pub fn remove_all_highlights(&mut self) -> Result<usize, RichTextError> {
        self.ensure_loaded()?;
        let ranges = self
            .surface
            .document()
            .attribute_ranges(HIGHLIGHT_ATTRIBUTE);
        apply_range_formats(
            &mut self.surface,
            HIGHLIGHT_ATTRIBUTE,
            ranges.into_iter().map(RangeFormat::remove),
        )
    }
}
