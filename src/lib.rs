//! Docstamp - template rendering for the custom properties of Office documents
//!
//! This library takes an Office or OpenDocument package (a ZIP archive of
//! XML parts) whose custom document properties contain template source, and
//! produces a copy of the package with those properties rendered against a
//! per-recipient context.
//!
//! # Guarantees
//!
//! - **Structure**: the output has the same entries, with the same names, in
//!   the same order as the input.
//! - **Fidelity**: every entry except `docProps/custom.xml` is copied without
//!   being decompressed, so its bytes and compression method are unchanged.
//! - **Selective rendering**: inside the properties part only the text of
//!   `<property>` elements is rendered; tags, attributes, comments and
//!   processing instructions are written back as they were read.
//! - **Containment**: rendered text is escaped before it is written, and a
//!   property that fails to render keeps its original text and is reported
//!   on the result instead of failing the document.
//!
//! # Example
//!
//! ```no_run
//! use docstamp::{CampaignContext, Recipient, generate_document};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let template = std::fs::read("invoice.docx")?;
//!
//! let recipient = Recipient {
//!     first_name: "Alice".into(),
//!     last_name: "Smith".into(),
//!     email: "alice@example.com".into(),
//!     position: "Accounts".into(),
//! };
//! let context = CampaignContext::new(recipient, "https://landing.example.com", "x7Kp2")
//!     .into_context()?;
//!
//! let document = generate_document(&template, &context)?;
//! for failure in &document.render_failures {
//!     eprintln!("{} kept its original text: {}", failure.label(), failure.message);
//! }
//! std::fs::write("invoice-alice.docx", &document.bytes)?;
//! # Ok(())
//! # }
//! ```

/// ZIP container reading and writing
pub mod archive;

/// Stored template attachments and their validation
pub mod attachment;

/// Generation options
pub mod config;

/// Error types
pub mod error;

/// Document generation
pub mod generate;

/// Streaming rewrite of the custom properties XML part
pub mod props;

/// Template rendering of property values
pub mod render;

pub use attachment::{TrackedAttachment, ValidationError};
pub use config::{PROPERTY_ELEMENT, RenderFailurePolicy, RewriteOptions, TARGET_ENTRY_NAME};
pub use error::{DocumentError, Result};
pub use generate::{DocumentGenerator, GeneratedDocument, generate_document};
pub use render::{
    CampaignContext, ContextError, MiniJinjaRenderer, PropertyRewriter, Recipient, RenderError,
    RenderFailure, TemplateContext, TemplateRenderer,
};
