//! Error types for facade, surface, and config operations.
//!
//! The codecs and the tokenizer never error: malformed markup passes through
//! unchanged. Only caller misuse and host failures surface here.

use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

/// Main error type for rich-text facade operations.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum RichTextError {
    /// An operation that needs a document ran before `load`.
    #[error("no document is loaded")]
    #[diagnostic(
        code(weaver::richtext::not_loaded),
        help("call `load` (or `append`) before mutating highlights or embeds")
    )]
    NotLoaded,

    /// A caller-supplied offset lies past the end of the document.
    #[error("offset {offset} is past the end of the document (length {len})")]
    #[diagnostic(code(weaver::richtext::offset_out_of_bounds))]
    OffsetOutOfBounds { offset: usize, len: usize },

    /// A formatting pass inserted or deleted content.
    #[error("formatting changed document length from {before} to {after}")]
    #[diagnostic(
        code(weaver::richtext::length_changed),
        help("range formatting must be attribute-only; pending ranges are now stale")
    )]
    LengthChanged { before: usize, after: usize },

    /// The host editing surface rejected an operation.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Surface(#[from] SurfaceError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

/// Errors reported by an [`EditingSurface`](crate::surface::EditingSurface).
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
#[non_exhaustive]
pub enum SurfaceError {
    /// The embed type or inline attribute was never registered.
    #[error("{kind} `{name}` is not registered with the editing surface")]
    #[diagnostic(code(weaver::richtext::surface::unregistered))]
    Unregistered { kind: &'static str, name: SmolStr },

    /// The surface was asked to touch offsets it does not have.
    #[error("range {offset}..{end} is outside the document (length {len})")]
    #[diagnostic(code(weaver::richtext::surface::out_of_bounds))]
    OutOfBounds { offset: usize, end: usize, len: usize },
}

/// Errors from loading an [`EditorConfig`](crate::config::EditorConfig).
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    #[diagnostic(code(weaver::richtext::config::io))]
    Io(#[from] std::io::Error),

    #[error("invalid JSON config: {0}")]
    #[diagnostic(code(weaver::richtext::config::json))]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML config: {0}")]
    #[diagnostic(code(weaver::richtext::config::toml))]
    Toml(#[from] toml::de::Error),

    #[error("unsupported config format: {0}")]
    #[diagnostic(
        code(weaver::richtext::config::format),
        help("use a `.json` or `.toml` file")
    )]
    UnsupportedFormat(String),
}
