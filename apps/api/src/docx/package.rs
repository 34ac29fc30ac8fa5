//! The .docx zip container.
//!
//! Every entry is held in memory in archive order with its original compression
//! method. Saving rewrites only the parts that were replaced; everything else
//! (images, styles, numbering, relationships) is written back byte-for-byte.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::DocxError;

#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

#[derive(Debug, Clone)]
pub struct DocxPackage {
    entries: Vec<PackageEntry>,
}

impl DocxPackage {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push(PackageEntry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
            });
        }
        Ok(Self { entries })
    }

    pub fn open(path: &Path) -> Result<Self, DocxError> {
        Self::from_bytes(&std::fs::read(path)?)
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name && !e.is_dir)
            .map(|e| e.data.as_slice())
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Replaces a part's bytes, or appends a new deflated part.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(PackageEntry {
                name: name.to_string(),
                data,
                compression: CompressionMethod::Deflated,
                is_dir: false,
            }),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in &self.entries {
            // Only stored and deflated entries can be written back.
            let method = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default().compression_method(method);
            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)?;
            } else {
                zip.start_file(entry.name.as_str(), options)?;
                zip.write_all(&entry.data)?;
            }
        }
        Ok(zip.finish()?.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::fixtures;

    #[test]
    fn test_package_round_trip_keeps_every_part() {
        let bytes = fixtures::resume_docx();
        let package = DocxPackage::from_bytes(&bytes).unwrap();
        let names: Vec<String> = package.part_names().map(str::to_string).collect();
        assert!(names.contains(&"word/document.xml".to_string()));
        assert!(names.contains(&"[Content_Types].xml".to_string()));

        let reopened = DocxPackage::from_bytes(&package.to_bytes().unwrap()).unwrap();
        let reopened_names: Vec<&str> = reopened.part_names().collect();
        assert_eq!(reopened_names, names);
        for name in &names {
            assert_eq!(reopened.part(name), package.part(name), "{name}");
        }
    }

    #[test]
    fn test_set_part_replaces_in_place() {
        let mut package = DocxPackage::from_bytes(&fixtures::resume_docx()).unwrap();
        let before: Vec<String> = package.part_names().map(str::to_string).collect();
        package.set_part("word/document.xml", b"<w:document/>".to_vec());
        package.set_part("custom/extra.xml", b"<x/>".to_vec());

        let after: Vec<&str> = package.part_names().collect();
        assert_eq!(&after[..before.len()], before.iter().map(String::as_str).collect::<Vec<_>>().as_slice());
        assert_eq!(after.last(), Some(&"custom/extra.xml"));
        assert_eq!(package.part("word/document.xml"), Some(&b"<w:document/>"[..]));
    }

    #[test]
    fn test_from_bytes_rejects_non_zip() {
        assert!(matches!(
            DocxPackage::from_bytes(b"plain text"),
            Err(DocxError::Zip(_))
        ));
    }
}
