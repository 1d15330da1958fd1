//! # reportgen
//!
//! Declarative paginated reports.
//!
//! A report is a document tree: the document owns a header, a footer and an
//! ordered list of pages, and every section owns cells of text. Each node
//! carries inline attributes (`font-size: 4mm`, `border-color: #ff0000`) and
//! a list of named styles. Attributes cascade from the document down to the
//! cells, every length is converted into a single display unit, and the
//! result is drawn onto an abstract surface.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON / DocumentBuilder)
//!       ↓
//!   [model]    — Document tree: elements, attributes, styles, fonts
//!       ↓
//!   [cascade]  — Attribute handlers, inheritance, unit resolution
//!       ↓
//!   [render]   — Cell placement, borders, header/footer, watermark
//!       ↓
//!   [surface]  — DocumentSink / Canvas (RecordingSurface built in)
//! ```
//!
//! [`style`] holds the value types every stage shares (colors, dimensions,
//! brushes) and [`font`] the metrics used to measure text.

pub mod builder;
pub mod cascade;
pub mod error;
pub mod font;
pub mod model;
pub mod render;
pub mod style;
pub mod surface;
pub mod template;

pub use builder::{AttributeContainer, DocumentBuilder};
pub use error::{Error, Result};
pub use model::Document;
pub use surface::{Canvas, DocumentSink, RecordingSurface};
pub use template::Template;

/// Render a document described as JSON and return the recorded display
/// lists as JSON.
pub fn render_json(json: &str) -> Result<String> {
    let template = Template::from_json(json)?;
    template.record()?.to_json()
}
