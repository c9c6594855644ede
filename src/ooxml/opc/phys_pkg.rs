//! Physical (ZIP) layer of an OPC package.
//!
//! Reading borrows the container bytes; writing always targets memory since
//! packages are handed back to callers as byte buffers.

use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use std::io::{Cursor, Read, Write};
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::{CompressionMethod, ZipArchive};

/// Random access to the members of a ZIP-based OPC package.
pub struct PhysPkgReader<'data> {
    archive: ZipArchive<Cursor<&'data [u8]>>,
}

impl<'data> PhysPkgReader<'data> {
    /// Open a package held in memory. Fails if `data` is not a ZIP archive.
    pub fn new(data: &'data [u8]) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data))?;
        Ok(Self { archive })
    }

    /// Decompressed content of a part.
    pub fn blob_for(&mut self, pack_uri: &PackURI) -> Result<Vec<u8>> {
        let mut file = self
            .archive
            .by_name(pack_uri.membername())
            .map_err(|e| match e {
                zip::result::ZipError::FileNotFound => OpcError::PartNotFound(pack_uri.to_string()),
                other => OpcError::from(other),
            })?;
        let mut blob = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut blob)?;
        Ok(blob)
    }

    /// Relationships XML for a source part, or `None` if it has none.
    pub fn rels_xml_for(&mut self, source_uri: &PackURI) -> Result<Option<Vec<u8>>> {
        let rels_uri = source_uri.rels_uri().map_err(OpcError::InvalidPackUri)?;
        match self.blob_for(&rels_uri) {
            Ok(blob) => Ok(Some(blob)),
            Err(OpcError::PartNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check if a specific member exists in the package.
    #[inline]
    pub fn contains(&self, pack_uri: &PackURI) -> bool {
        self.archive.index_for_name(pack_uri.membername()).is_some()
    }

    /// Number of members, directories included.
    #[inline]
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// All member names in archive order.
    pub fn member_names(&self) -> Vec<String> {
        self.archive.file_names().map(String::from).collect()
    }

    /// Copy every member into `writer` in archive order.
    ///
    /// When `replacement` names a member, its blob is written in place of the
    /// original content. Each member keeps its stored/deflated setting.
    pub fn copy_into(
        &mut self,
        writer: &mut PhysPkgWriter,
        replacement: Option<(&PackURI, &[u8])>,
    ) -> Result<()> {
        for index in 0..self.archive.len() {
            let mut file = self.archive.by_index(index)?;
            let name = file.name().to_string();

            if file.is_dir() {
                writer.add_directory(&name)?;
                continue;
            }

            let stored = file.compression() == CompressionMethod::Stored;
            if let Some((uri, blob)) = replacement
                && uri.membername() == name
            {
                writer.write_member(&name, blob, stored)?;
                continue;
            }

            let mut blob = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut blob)?;
            writer.write_member(&name, &blob, stored)?;
        }
        Ok(())
    }
}

/// Physical package writer for creating OPC packages in memory.
pub struct PhysPkgWriter {
    archive: ZipWriter<Cursor<Vec<u8>>>,
}

impl PhysPkgWriter {
    /// Create a new package writer that writes to memory.
    pub fn new() -> Self {
        Self {
            archive: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Write a part with Deflate compression.
    pub fn write(&mut self, pack_uri: &PackURI, blob: &[u8]) -> Result<()> {
        self.write_member(pack_uri.membername(), blob, false)
    }

    fn write_member(&mut self, name: &str, blob: &[u8], stored: bool) -> Result<()> {
        let method = if stored {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        };
        let options = SimpleFileOptions::default().compression_method(method);
        self.archive.start_file(name, options)?;
        self.archive.write_all(blob)?;
        Ok(())
    }

    fn add_directory(&mut self, name: &str) -> Result<()> {
        self.archive
            .add_directory(name, SimpleFileOptions::default())?;
        Ok(())
    }

    /// Finish writing and return the package bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        let cursor = self.archive.finish()?;
        Ok(cursor.into_inner())
    }
}

impl Default for PhysPkgWriter {
    fn default() -> Self {
        Self::new()
    }
}
