use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tokio::fs;

use crate::blocks::split_blocks;
use crate::document::DocumentUnit;

/// Supported input formats, in the order the loader visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Pdf,
    Docx,
}

impl FileKind {
    pub const SUPPORTED: [FileKind; 3] = [FileKind::Csv, FileKind::Pdf, FileKind::Docx];

    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Csv => "csv",
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        Self::SUPPORTED
            .into_iter()
            .find(|kind| kind.extension() == extension)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

impl TextEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unsupported file format: {0}")]
    Unsupported(String),
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to extract PDF text: {0}")]
    Pdf(String),
    #[error("failed to extract DOCX text: {0}")]
    Docx(String),
    #[error("document extractor crashed: {0}")]
    Extractor(String),
}

/// Decode raw bytes as UTF-8, falling back to Latin-1.
pub fn decode_text(bytes: Vec<u8>) -> (String, TextEncoding) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, TextEncoding::Utf8),
        Err(err) => {
            // Latin-1 maps every byte to the code point of the same value
            let text = err.into_bytes().iter().map(|&b| char::from(b)).collect();
            (text, TextEncoding::Latin1)
        }
    }
}

pub struct FileReader;

impl FileReader {
    /// Read one file into its document units.
    pub async fn read_file(path: &Path) -> Result<Vec<DocumentUnit>, LoadError> {
        let kind = FileKind::from_path(path).ok_or_else(|| {
            LoadError::Unsupported(
                path.extension()
                    .map(|e| e.to_string_lossy().to_string())
                    .unwrap_or_default(),
            )
        })?;

        let bytes = fs::read(path).await?;
        let source_path = path.to_string_lossy().to_string();

        let mut metadata = BTreeMap::new();
        if let Some(name) = path.file_name() {
            metadata.insert("filename".to_string(), name.to_string_lossy().to_string());
        }
        metadata.insert("file_type".to_string(), kind.extension().to_string());

        match kind {
            FileKind::Csv => {
                let (content, encoding) = decode_text(bytes);
                metadata.insert("encoding".to_string(), encoding.label().to_string());
                Ok(vec![DocumentUnit::from_block(content, &source_path, None, metadata)])
            }
            FileKind::Pdf | FileKind::Docx => {
                // Both extractors are CPU bound and pdf-extract may panic on
                // malformed input; a panic surfaces as a JoinError here.
                let blocks = tokio::task::spawn_blocking(move || match kind {
                    FileKind::Pdf => Self::extract_pdf(&bytes),
                    _ => Self::extract_docx(&bytes),
                })
                .await
                .map_err(|e| LoadError::Extractor(e.to_string()))??;

                Ok(blocks
                    .into_iter()
                    .enumerate()
                    .map(|(index, block)| {
                        DocumentUnit::from_block(block, &source_path, Some(index), metadata.clone())
                    })
                    .collect())
            }
        }
    }

    fn extract_pdf(bytes: &[u8]) -> Result<Vec<String>, LoadError> {
        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| LoadError::Pdf(e.to_string()))?;
        Ok(split_blocks(&text))
    }

    fn extract_docx(bytes: &[u8]) -> Result<Vec<String>, LoadError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| LoadError::Docx(e.to_string()))?;

        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| LoadError::Docx(e.to_string()))?
            .read_to_string(&mut xml)?;

        paragraphs_from_document_xml(&xml)
    }
}

/// Collect the non-empty paragraph texts of a WordprocessingML body.
///
/// Paragraphs nested in text boxes are emitted on their own when they close;
/// the enclosing paragraph keeps the text around them.
pub fn paragraphs_from_document_xml(xml: &str) -> Result<Vec<String>, LoadError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => open.push(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(paragraph) = open.pop() {
                        let paragraph = paragraph.trim();
                        if !paragraph.is_empty() {
                            paragraphs.push(paragraph.to_string());
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match (e.name().as_ref(), open.last_mut()) {
                (b"w:tab", Some(current)) => current.push('\t'),
                (b"w:br" | b"w:cr", Some(current)) => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| LoadError::Docx(e.to_string()))?;
                if let Some(current) = open.last_mut() {
                    current.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(LoadError::Docx(format!(
                    "malformed document.xml at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(FileKind::from_path(Path::new("a/b.csv")), Some(FileKind::Csv));
        assert_eq!(FileKind::from_path(Path::new("b.docx")), Some(FileKind::Docx));
        assert_eq!(FileKind::from_path(Path::new("b.txt")), None);
        assert_eq!(FileKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_decode_prefers_utf8() {
        let (text, encoding) = decode_text("Coût,Risque".as_bytes().to_vec());
        assert_eq!(text, "Coût,Risque");
        assert_eq!(encoding, TextEncoding::Utf8);
    }

    #[test]
    fn test_decode_falls_back_to_latin1() {
        // "Coût" encoded as Latin-1
        let (text, encoding) = decode_text(vec![b'C', b'o', 0xFB, b't']);
        assert_eq!(text, "Coût");
        assert_eq!(encoding, TextEncoding::Latin1);
    }

    #[test]
    fn test_docx_paragraphs() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Supplier:</w:t></w:r><w:r><w:tab/><w:t xml:space="preserve"> Acme &amp; Co</w:t></w:r></w:p>
    <w:p></w:p>
    <w:p/>
    <w:p><w:r><w:t>Delivery</w:t><w:br/><w:t>Q3 2024</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

        let paragraphs = paragraphs_from_document_xml(xml).unwrap();
        assert_eq!(paragraphs, vec!["Supplier:\t Acme & Co", "Delivery\nQ3 2024"]);
    }

    #[test]
    fn test_text_box_keeps_enclosing_paragraph() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:r><w:t xml:space="preserve">Outer before </w:t></w:r><w:r><w:pict><w:txbxContent><w:p><w:r><w:t>Inner box</w:t></w:r></w:p></w:txbxContent></w:pict></w:r><w:r><w:t>outer after</w:t></w:r></w:p>
</w:body></w:document>"#;

        let paragraphs = paragraphs_from_document_xml(xml).unwrap();
        assert_eq!(paragraphs, vec!["Inner box", "Outer before outer after"]);
    }

    #[test]
    fn test_corrupt_docx_is_an_error() {
        let result = FileReader::extract_docx(b"not a zip archive");
        assert!(matches!(result, Err(LoadError::Docx(_))));
    }
}
