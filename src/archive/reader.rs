//! Random-access reading of a ZIP package held in memory.

use crate::error::{DocumentError, Result};
use std::io::{Cursor, Read, Seek, Write};
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

/// Description of one archive entry, captured when the archive is opened.
///
/// Descriptors are listed in central-directory order and carry the metadata
/// a writer needs to recreate the entry under the same name.
#[derive(Debug, Clone)]
pub struct EntryDescriptor {
    index: usize,
    name: String,
    size: u64,
    compressed_size: u64,
    compression: CompressionMethod,
    last_modified: Option<DateTime>,
    unix_mode: Option<u32>,
    is_dir: bool,
}

impl EntryDescriptor {
    /// Path of the entry within the archive.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of the entry in the central directory.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Uncompressed size in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Size of the stored payload in bytes.
    #[inline]
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    /// Compression method of the stored payload.
    #[inline]
    pub fn compression(&self) -> CompressionMethod {
        self.compression
    }

    /// Last modification time recorded for the entry, if any.
    #[inline]
    pub fn last_modified(&self) -> Option<DateTime> {
        self.last_modified
    }

    /// Unix mode bits recorded for the entry, if any.
    #[inline]
    pub fn unix_mode(&self) -> Option<u32> {
        self.unix_mode
    }

    /// Whether the entry is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }
}

/// ZIP reader over a borrowed byte buffer.
///
/// Opening the reader parses the central directory only; entry payloads are
/// decompressed when they are opened.
pub struct ArchiveReader<'data> {
    archive: ZipArchive<Cursor<&'data [u8]>>,
    entries: Vec<EntryDescriptor>,
}

impl<'data> ArchiveReader<'data> {
    /// Open an archive from a byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::ArchiveFormat`] if the bytes are not a valid
    /// ZIP structure (missing or corrupt central directory, truncated data).
    pub fn new(data: &'data [u8]) -> Result<Self> {
        let mut archive =
            ZipArchive::new(Cursor::new(data)).map_err(DocumentError::ArchiveFormat)?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let file = archive
                .by_index_raw(index)
                .map_err(DocumentError::ArchiveFormat)?;
            entries.push(EntryDescriptor {
                index,
                name: file.name().to_string(),
                size: file.size(),
                compressed_size: file.compressed_size(),
                compression: file.compression(),
                last_modified: file.last_modified(),
                unix_mode: file.unix_mode(),
                is_dir: file.is_dir(),
            });
        }

        Ok(Self { archive, entries })
    }

    /// Entries in the archive's directory order.
    #[inline]
    pub fn entries(&self) -> &[EntryDescriptor] {
        &self.entries
    }

    /// Number of entries, directories included.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the archive has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find an entry by its exact name.
    pub fn find(&self, name: &str) -> Option<&EntryDescriptor> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Open an entry for streaming its decompressed payload.
    ///
    /// Corrupt data (for example a CRC mismatch) is reported by the returned
    /// reader as an I/O error.
    pub fn open_entry(&mut self, entry: &EntryDescriptor) -> Result<impl Read + '_> {
        self.archive
            .by_index(entry.index)
            .map_err(|e| DocumentError::entry_read(&entry.name, e))
    }

    /// Read an entry's decompressed payload into memory.
    pub fn read_entry(&mut self, entry: &EntryDescriptor) -> Result<Vec<u8>> {
        let mut content = Vec::with_capacity(entry.size as usize);
        self.open_entry(entry)?
            .read_to_end(&mut content)
            .map_err(|e| DocumentError::entry_read(&entry.name, e))?;
        Ok(content)
    }

    /// Copy an entry's compressed payload and header into `writer` untouched.
    pub(crate) fn copy_raw_into<W: Write + Seek>(
        &mut self,
        entry: &EntryDescriptor,
        writer: &mut ZipWriter<W>,
    ) -> Result<()> {
        let file = self
            .archive
            .by_index_raw(entry.index)
            .map_err(|e| DocumentError::entry_read(&entry.name, e))?;
        writer.raw_copy_file(file).map_err(DocumentError::write)
    }
}

impl std::fmt::Debug for ArchiveReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveReader")
            .field("entry_count", &self.entries.len())
            .finish()
    }
}
