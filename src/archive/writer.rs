//! Incremental writing of a ZIP package into memory.

use super::reader::{ArchiveReader, EntryDescriptor};
use crate::error::{DocumentError, Result};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Streaming ZIP writer producing an in-memory archive.
///
/// Entries appear in the output in the order they are written.
pub struct ArchiveWriter {
    archive: ZipWriter<Cursor<Vec<u8>>>,
}

/// Sink for the payload of the entry most recently started on an
/// [`ArchiveWriter`].
///
/// The sink borrows the writer, so the entry is necessarily complete before
/// another entry is started or the archive is finished.
pub struct EntrySink<'a> {
    archive: &'a mut ZipWriter<Cursor<Vec<u8>>>,
}

impl ArchiveWriter {
    /// Create a new archive writer that writes to memory.
    pub fn new() -> Self {
        Self {
            archive: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Start a new entry shaped like `entry` and return a sink for its payload.
    ///
    /// The name, modification time and unix mode are carried over. Stored
    /// entries stay stored; everything else is written with Deflate, the
    /// only compressor built into this crate.
    pub fn create_entry(&mut self, entry: &EntryDescriptor) -> Result<EntrySink<'_>> {
        let mut options = SimpleFileOptions::default()
            .compression_method(writable_method(entry.compression()));
        if let Some(modified) = entry.last_modified() {
            options = options.last_modified_time(modified);
        }
        if let Some(mode) = entry.unix_mode() {
            options = options.unix_permissions(mode);
        }

        self.archive
            .start_file(entry.name(), options)
            .map_err(DocumentError::write)?;
        Ok(EntrySink {
            archive: &mut self.archive,
        })
    }

    /// Copy an entry from `reader` without decompressing it.
    ///
    /// The compressed bytes, compression method and header fields are
    /// reproduced exactly.
    pub fn copy_raw(
        &mut self,
        reader: &mut ArchiveReader<'_>,
        entry: &EntryDescriptor,
    ) -> Result<()> {
        reader.copy_raw_into(entry, &mut self.archive)
    }

    /// Write a file without compression (stored).
    pub fn write_stored(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.write_with(name, data, CompressionMethod::Stored)
    }

    /// Write a file with Deflate compression.
    pub fn write_deflated(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.write_with(name, data, CompressionMethod::Deflated)
    }

    fn write_with(&mut self, name: &str, data: &[u8], method: CompressionMethod) -> Result<()> {
        let options = SimpleFileOptions::default().compression_method(method);
        self.archive
            .start_file(name, options)
            .map_err(DocumentError::write)?;
        self.archive.write_all(data).map_err(DocumentError::write)
    }

    /// Finish writing and return the ZIP archive bytes.
    ///
    /// Writes the central directory. On error nothing is returned, so a
    /// partially written archive can never escape.
    pub fn finish(self) -> Result<Vec<u8>> {
        self.archive
            .finish()
            .map(Cursor::into_inner)
            .map_err(DocumentError::write)
    }
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for EntrySink<'_> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.archive.write(buf)
    }

    #[inline]
    fn flush(&mut self) -> std::io::Result<()> {
        self.archive.flush()
    }
}

fn writable_method(method: CompressionMethod) -> CompressionMethod {
    match method {
        CompressionMethod::Stored => CompressionMethod::Stored,
        _ => CompressionMethod::Deflated,
    }
}
