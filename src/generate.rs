//! Generation of personalised documents from template packages.
//!
//! A template package is an ordinary Office or OpenDocument file whose
//! custom properties contain template source. Generating a document copies
//! every entry of the package into a new archive in the same order. The
//! custom properties part is rendered against a [`TemplateContext`] on the
//! way through; all other entries are copied without being decompressed.

use crate::archive::{ArchiveReader, ArchiveWriter};
use crate::config::RewriteOptions;
use crate::error::Result;
use crate::props::PropertyTransformer;
use crate::render::{
    MiniJinjaRenderer, PropertyRewriter, RenderFailure, TemplateContext, TemplateRenderer,
};
use std::io::BufReader;

/// The output of a generation run.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    /// Bytes of the generated archive
    pub bytes: Vec<u8>,
    /// Properties that kept their original text because they failed to render
    pub render_failures: Vec<RenderFailure>,
    /// Whether the target entry was found and rewritten
    pub rewritten: bool,
}

impl GeneratedDocument {
    /// True when every property rendered.
    pub fn is_clean(&self) -> bool {
        self.render_failures.is_empty()
    }

    /// Take the bytes of the generated archive.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Renders the custom properties of template packages.
///
/// A generator holds no per-document state, so one instance can serve any
/// number of documents, including from several threads when the renderer
/// is `Sync`.
///
/// # Example
///
/// ```rust
/// use docstamp::archive::{ArchiveReader, ArchiveWriter};
/// use docstamp::{DocumentGenerator, TemplateContext};
///
/// let mut package = ArchiveWriter::new();
/// package.write_deflated(
///     "docProps/custom.xml",
///     br#"<Properties><property name="To"><vt:lpwstr>{{ Name }}</vt:lpwstr></property></Properties>"#,
/// )?;
/// let template = package.finish()?;
///
/// let context = TemplateContext::new().with("Name", "Alice");
/// let document = DocumentGenerator::new().generate(&template, &context)?;
/// assert!(document.is_clean());
///
/// let mut reader = ArchiveReader::new(&document.bytes)?;
/// let entry = reader.entries()[0].clone();
/// let xml = reader.read_entry(&entry)?;
/// assert!(String::from_utf8_lossy(&xml).contains("<vt:lpwstr>Alice</vt:lpwstr>"));
/// # Ok::<(), docstamp::DocumentError>(())
/// ```
#[derive(Debug)]
pub struct DocumentGenerator<R = MiniJinjaRenderer> {
    renderer: R,
    options: RewriteOptions,
}

impl DocumentGenerator<MiniJinjaRenderer> {
    /// Create a generator with the MiniJinja renderer and default options.
    pub fn new() -> Self {
        Self::with_renderer(MiniJinjaRenderer::new(), RewriteOptions::default())
    }

    /// Create a generator with the MiniJinja renderer and custom options.
    pub fn with_options(options: RewriteOptions) -> Self {
        Self::with_renderer(MiniJinjaRenderer::new(), options)
    }
}

impl Default for DocumentGenerator<MiniJinjaRenderer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: TemplateRenderer> DocumentGenerator<R> {
    /// Create a generator with any renderer.
    pub fn with_renderer(renderer: R, options: RewriteOptions) -> Self {
        Self { renderer, options }
    }

    /// Options this generator was built with.
    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// Generate a document from the template package `content`.
    ///
    /// # Errors
    ///
    /// Fails if the package cannot be opened, an entry cannot be read, the
    /// target entry is not well-formed XML, or the output archive cannot be
    /// written. Property render failures only fail the call under
    /// [`RenderFailurePolicy::Abort`](crate::RenderFailurePolicy::Abort).
    pub fn generate(&self, content: &[u8], context: &TemplateContext) -> Result<GeneratedDocument> {
        let mut reader = ArchiveReader::new(content)?;
        let target = self.options.target_entry.as_str();

        if !reader.entries().iter().any(|e| e.name() == target && !e.is_dir()) {
            log::debug!("No {} in package, returning it unchanged", target);
            return Ok(GeneratedDocument {
                bytes: content.to_vec(),
                render_failures: Vec::new(),
                rewritten: false,
            });
        }

        let entries = reader.entries().to_vec();
        let mut writer = ArchiveWriter::new();
        let mut rewriter =
            PropertyRewriter::new(&self.renderer, context, self.options.failure_policy);

        for entry in &entries {
            if entry.name() != target || entry.is_dir() {
                writer.copy_raw(&mut reader, entry)?;
                continue;
            }

            let input = BufReader::new(reader.open_entry(entry)?);
            let sink = writer.create_entry(entry)?;
            let summary = PropertyTransformer::new(entry.name())
                .with_element(&self.options.property_element)
                .transform(input, sink, |property| rewriter.rewrite(property))?;
            log::debug!(
                "Rendered {} text run(s) across {} properties in {}",
                summary.rendered_runs,
                summary.properties,
                entry.name()
            );
        }

        let bytes = writer.finish()?;
        Ok(GeneratedDocument {
            bytes,
            render_failures: rewriter.into_failures(),
            rewritten: true,
        })
    }
}

/// Generate a document with the default renderer and options.
///
/// Shorthand for `DocumentGenerator::new().generate(content, context)`.
pub fn generate_document(content: &[u8], context: &TemplateContext) -> Result<GeneratedDocument> {
    DocumentGenerator::new().generate(content, context)
}
