//! despeck-svg: SVG reader and writer for the despeck scene model
//! (sans-IO).
//!
//! [`read_scene`] turns SVG text into a [`Scene`](despeck_engine::Scene)
//! with every drawable element flattened to one shape carrying its
//! cumulative transform and resolved paint. [`write_scene`] emits a scene
//! back as a standalone SVG document.
//!
//! This crate has **no file system access** -- it operates on `&str` and
//! returns `String`s. Reading files lives in the `despeck` CLI.

pub mod reader;
pub mod style;
pub mod transform;
pub mod writer;

pub use reader::read_scene;
pub use transform::parse_transform;
pub use writer::{SvgMetadata, output_file_name, write_scene};

/// Errors raised while reading an SVG document. Any of them rejects the
/// whole document before a scene is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SvgError {
    /// The XML could not be tokenized.
    #[error("failed to parse SVG: {0}")]
    Parse(String),

    /// The document has no `<svg>` root element.
    #[error("document has no <svg> root element")]
    MissingRoot,

    /// A paint attribute holds a malformed color.
    #[error("invalid color in {attribute}: {source}")]
    InvalidColor {
        /// Attribute or style property name.
        attribute: String,
        source: despeck_engine::ColorError,
    },

    /// A `transform` attribute could not be parsed.
    #[error("invalid transform {0:?}")]
    InvalidTransform(String),
}
