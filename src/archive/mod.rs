//! ZIP container access for Office and OpenDocument packages.
//!
//! [`ArchiveReader`] opens a package from memory and lists its entries in
//! directory order; [`ArchiveWriter`] builds a new package entry by entry,
//! either streaming a fresh payload through an [`EntrySink`] or copying an
//! existing entry's compressed bytes verbatim.
//!
//! # Example
//!
//! ```rust
//! use docstamp::archive::{ArchiveReader, ArchiveWriter};
//!
//! let mut writer = ArchiveWriter::new();
//! writer.write_stored("mimetype", b"application/vnd.oasis.opendocument.text")?;
//! writer.write_deflated("content.xml", b"<office:document-content/>")?;
//! let bytes = writer.finish()?;
//!
//! let reader = ArchiveReader::new(&bytes)?;
//! let names: Vec<&str> = reader.entries().iter().map(|e| e.name()).collect();
//! assert_eq!(names, ["mimetype", "content.xml"]);
//! # Ok::<(), docstamp::DocumentError>(())
//! ```

mod reader;
mod writer;

pub use reader::{ArchiveReader, EntryDescriptor};
pub use writer::{ArchiveWriter, EntrySink};
