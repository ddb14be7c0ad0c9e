//! Plain-text extraction from uploaded documents.

use std::io::{Cursor, Read};

use anyhow::{Context, Result, bail};
use quick_xml::{Reader, events::Event};

/// Ceiling on the inflated `word/document.xml`; uploads are capped compressed only.
const MAX_DOCUMENT_XML_BYTES: u64 = 8 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Docx,
    Pdf,
    Text,
}

impl DocumentKind {
    /// Dispatches on the (case-insensitive) file extension.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let lower = file_name.to_ascii_lowercase();
        if lower.ends_with(".docx") {
            Some(Self::Docx)
        } else if lower.ends_with(".pdf") {
            Some(Self::Pdf)
        } else if lower.ends_with(".txt") {
            Some(Self::Text)
        } else {
            None
        }
    }
}

/// Returns the document text, or `None` for unsupported or unreadable files.
pub fn extract_text(file_name: &str, bytes: &[u8]) -> Option<String> {
    let kind = DocumentKind::from_file_name(file_name)?;
    let result = match kind {
        DocumentKind::Text => Ok(String::from_utf8_lossy(bytes).into_owned()),
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|err| anyhow::anyhow!("pdf extraction: {err}")),
        DocumentKind::Docx => docx_text(bytes),
    };

    match result {
        Ok(text) => Some(text),
        Err(err) => {
            tracing::warn!(file_name, ?kind, error = %format!("{err:#}"), "text extraction failed");
            None
        }
    }
}

fn docx_text(bytes: &[u8]) -> Result<String> {
    docx_text_within(bytes, MAX_DOCUMENT_XML_BYTES)
}

fn docx_text_within(bytes: &[u8], limit: u64) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).context("open docx archive")?;
    let entry = archive
        .by_name("word/document.xml")
        .context("locate word/document.xml")?;

    let declared_size = entry.size();
    if declared_size > limit {
        bail!("word/document.xml too large ({declared_size} bytes; max {limit} bytes)");
    }

    let mut xml = String::with_capacity(declared_size as usize);
    entry
        .take(limit + 1)
        .read_to_string(&mut xml)
        .context("read word/document.xml")?;
    if xml.len() as u64 > limit {
        bail!(
            "word/document.xml too large after read ({} bytes; max {limit} bytes)",
            xml.len()
        );
    }

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    // `w:tab` also appears in paragraph properties as a tab stop; only runs count.
    let mut in_run = false;
    let mut in_run_text = false;

    loop {
        match reader.read_event().context("parse word/document.xml")? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:r" => in_run = true,
                b"w:t" => in_run_text = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:r" => in_run = false,
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) if in_run => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_run_text => {
                text.push_str(&t.unescape().context("unescape docx text")?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn dispatch_is_case_insensitive() {
        assert_eq!(DocumentKind::from_file_name("LISTA.TXT"), Some(DocumentKind::Text));
        assert_eq!(DocumentKind::from_file_name("precios.Docx"), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::from_file_name("factura.pdf"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_file_name("setup.exe"), None);
        assert_eq!(DocumentKind::from_file_name("sin_extension"), None);
    }

    #[test]
    fn text_files_are_decoded() {
        let text = extract_text("stock.txt", "Coca Cola 500ml, precio $800".as_bytes());
        assert_eq!(text.as_deref(), Some("Coca Cola 500ml, precio $800"));
    }

    #[test]
    fn unsupported_extension_yields_none() {
        assert_eq!(extract_text("virus.exe", b"MZ\x90\x00"), None);
    }

    #[test]
    fn docx_paragraphs_become_lines() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Coca Cola</w:t></w:r><w:r><w:tab/><w:t xml:space="preserve"> $800</w:t></w:r></w:p>
    <w:p><w:r><w:t>Fanta &amp; Sprite</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
        let text = extract_text("lista.docx", &docx(xml)).unwrap();
        assert_eq!(text, "Coca Cola\t $800\nFanta & Sprite");
    }

    #[test]
    fn oversized_document_xml_is_rejected() {
        let body = "A".repeat(64 * 1024);
        let xml = format!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>{body}</w:t></w:r></w:p></w:body></w:document>"#
        );
        let archive = docx(&xml);
        assert!(archive.len() < body.len());

        let err = docx_text_within(&archive, 16 * 1024).unwrap_err();
        assert!(err.to_string().contains("too large"));
        assert!(docx_text_within(&archive, 1024 * 1024).is_ok());
    }

    #[test]
    fn corrupt_docx_yields_none() {
        assert_eq!(extract_text("roto.docx", b"not a zip archive"), None);
    }
}
