//! # Templates
//!
//! A [`Template`] is a validated document together with its resolved paint
//! states. It is the unit that gets saved, loaded and rendered.
//!
//! Loading checks every font source up front, so malformed embedded data or
//! a missing or oversized font file fails at load time rather than half-way
//! through a render.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::{debug, info};

use crate::cascade::{HandlerTable, ResolvedDocument, Resolver};
use crate::error::{Error, Result, ResultExt};
use crate::model::{Document, Orientation, PageSize};
use crate::render::Emitter;
use crate::style::{ConversionTable, DimensionUnit};
use crate::surface::{DocumentSink, RecordingSurface};

#[derive(Debug, Clone)]
pub struct Template {
    document: Document,
    resolved: ResolvedDocument,
    conversions: ConversionTable,
}

impl Template {
    /// Validate and resolve `document` with the standard tables.
    pub fn new(document: Document) -> Result<Self> {
        Self::with_tables(document, &ConversionTable::standard(), &HandlerTable::standard())
    }

    /// Validate and resolve `document` with caller-supplied tables.
    pub fn with_tables(
        document: Document,
        conversions: &ConversionTable,
        handlers: &HandlerTable,
    ) -> Result<Self> {
        for font in &document.fonts {
            font.data
                .check()
                .with_context(|| format!("font `{}`", font.name))?;
        }
        let resolved = Resolver::new(conversions, handlers).resolve(&document)?;
        debug!(
            "template `{}`: {} page(s), {} style(s), {} font(s)",
            resolved.title,
            resolved.page_count(),
            document.styles.len(),
            document.fonts.len()
        );
        Ok(Self {
            document,
            resolved,
            conversions: conversions.clone(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let document: Document = serde_json::from_str(json)?;
        Self::new(document)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let document: Document = serde_json::from_reader(BufReader::new(reader))?;
        Self::new(document)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("open `{}`", path.display()))?;
        Self::from_reader(file).with_context(|| format!("load `{}`", path.display()))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn resolved(&self) -> &ResolvedDocument {
        &self.resolved
    }

    pub fn page_size(&self) -> PageSize {
        self.document.size
    }

    pub fn orientation(&self) -> Orientation {
        self.document.orientation
    }

    pub fn unit(&self) -> DimensionUnit {
        self.document.units
    }

    /// The document as JSON. Loading the output yields an equal template.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.document)?)
    }

    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = BufWriter::new(writer);
        serde_json::to_writer_pretty(&mut writer, &self.document)?;
        writer.flush()?;
        Ok(())
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("create `{}`", path.display()))?;
        self.save(file)
    }

    /// A recording surface sized for this template.
    pub fn recording_surface(&self) -> Result<RecordingSurface> {
        RecordingSurface::new(self.document.size, self.document.orientation, self.document.units)
    }

    /// Register fonts, draw every page and finish the sink.
    pub fn render<S>(&self, sink: &mut S) -> Result<()>
    where
        S: DocumentSink + ?Sized,
    {
        for font in &self.document.fonts {
            let data = font
                .data
                .load()
                .with_context(|| format!("font `{}`", font.name))?;
            sink.add_font(&font.name, font.style, data)
                .with_context(|| format!("font `{}`", font.name))?;
        }
        Emitter::new(&self.conversions, self.document.units).emit(&self.resolved, sink)?;
        sink.finish()?;
        info!(
            "rendered `{}` ({} page(s))",
            self.resolved.title,
            self.resolved.page_count()
        );
        Ok(())
    }

    /// Render onto a fresh [`RecordingSurface`].
    pub fn record(&self) -> Result<RecordingSurface> {
        let mut surface = self.recording_surface()?;
        self.render(&mut surface)?;
        Ok(surface)
    }
}

impl TryFrom<Document> for Template {
    type Error = Error;

    fn try_from(document: Document) -> Result<Self> {
        Self::new(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::model::FontSource;

    const SIMPLE: &str = r##"{
        "attributes": [{"name": "title", "value": "Invoice"}],
        "size": "A5",
        "units": "mm",
        "pages": [
            {"cells": [{"text": "Hello", "attributes": [{"name": "width", "value": "40mm"}]}]}
        ]
    }"##;

    #[test]
    fn load_and_render() {
        let template = Template::from_json(SIMPLE).unwrap();
        assert_eq!(template.page_size(), PageSize::A5);
        assert_eq!(template.unit(), DimensionUnit::Millimeter);

        let surface = template.record().unwrap();
        assert!(surface.is_finished());
        assert_eq!(surface.title(), "Invoice");
        assert_eq!(surface.pages().len(), 1);
        assert_eq!(surface.pages()[0].texts(), ["Hello"]);
    }

    #[test]
    fn save_and_load_round_trip() {
        let template = Template::from_json(SIMPLE).unwrap();
        let mut buf = Vec::new();
        template.save(&mut buf).unwrap();
        let again = Template::from_reader(buf.as_slice()).unwrap();
        assert_eq!(again.document(), template.document());
        assert_eq!(again.resolved(), template.resolved());
    }

    #[test]
    fn path_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let template = Template::from_json(SIMPLE).unwrap();
        template.save_to_path(&path).unwrap();
        let again = Template::from_path(&path).unwrap();
        assert_eq!(again.document(), template.document());

        let err = Template::from_path(dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().starts_with("open `"));
    }

    #[test]
    fn missing_font_file_fails_at_load() {
        let mut doc: Document = serde_json::from_str(SIMPLE).unwrap();
        doc.fonts.push(crate::model::FontEntry {
            data: FontSource::File("/definitely/not/here.ttf".into()),
            name: "Brand".into(),
            style: Default::default(),
        });
        let err = Template::new(doc).unwrap_err();
        assert!(err.to_string().starts_with("font `Brand`: "));
        assert!(matches!(err.root(), Error::Font(_)));
    }

    #[test]
    fn corrupt_embedded_font_fails_at_load() {
        let mut doc: Document = serde_json::from_str(SIMPLE).unwrap();
        doc.fonts.push(crate::model::FontEntry {
            data: FontSource::Embedded("aéb".into()),
            name: "Broken".into(),
            style: Default::default(),
        });
        let err = Template::new(doc).unwrap_err();
        assert!(err.to_string().starts_with("font `Broken`: "));
        assert!(matches!(err.root(), Error::Font(_)));
    }

    #[test]
    fn invalid_json_carries_a_hint() {
        let err = Template::from_json("{\"pages\": [,]}").unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
        assert!(err.to_string().contains("Hint"));

        let err = Template::from_json("{}").unwrap_err();
        assert_eq!(err.as_validation(), Some(&ValidationError::NoPages));
    }
}
