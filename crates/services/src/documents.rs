//! Plain-text extraction for the document types that can be attached as context.
//!
//! `.txt` and `.md` files are read as-is, with invalid UTF-8 replaced. `.docx` files are opened as zip
//! archives and the text runs of `word/document.xml` are collected, one line
//! per paragraph. Formatting, images and tables' layout are discarded.

use quick_xml::events::Event;
use quick_xml::Reader;
use shared::ChatError;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Extensions accepted by [`read_text`], lowercase and without the dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "docx"];

const DOCX_BODY: &str = "word/document.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Docx,
}

impl DocumentKind {
    /// Classify by extension (case-insensitive). `None` means unsupported.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "md" => Some(DocumentKind::PlainText),
            "docx" => Some(DocumentKind::Docx),
            _ => None,
        }
    }
}

/// Extract the plain text of one file.
pub fn read_text(path: &Path) -> Result<String, ChatError> {
    let display = path.display().to_string();
    let kind = DocumentKind::from_path(path).ok_or_else(|| ChatError::Unsupported {
        path: display.clone(),
    })?;

    match kind {
        DocumentKind::PlainText => fs::read(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .map_err(|e| ChatError::read_failure(&display, e)),
        DocumentKind::Docx => read_docx(path).map_err(|reason| ChatError::ReadFailure {
            path: display,
            reason,
        }),
    }
}

fn read_docx(path: &Path) -> Result<String, String> {
    let file = fs::File::open(path).map_err(|e| e.to_string())?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| format!("not a docx archive: {}", e))?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .map_err(|e| format!("missing {}: {}", DOCX_BODY, e))?
        .read_to_string(&mut xml)
        .map_err(|e| e.to_string())?;
    docx_xml_to_text(&xml)
}

/// Collect `<w:t>` text from a WordprocessingML body.
///
/// `<w:tab/>` becomes a tab and `<w:br/>`/`<w:cr/>` a newline, but only inside
/// a run (`<w:r>`); tab stops declared in paragraph properties are ignored.
pub fn docx_xml_to_text(xml: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"r" => run_depth += 1,
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                // Empty paragraph
                b"p" => out.push('\n'),
                b"tab" if run_depth > 0 => out.push('\t'),
                b"br" | b"cr" if run_depth > 0 => out.push('\n'),
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"r" => run_depth = run_depth.saturating_sub(1),
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "malformed document.xml at byte {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
            _ => {}
        }
    }

    Ok(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p>
      <w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>
      <w:r><w:t>Paris is the</w:t></w:r>
      <w:r><w:t xml:space="preserve"> capital of France.</w:t></w:r>
    </w:p>
    <w:p>
      <w:r><w:t>Name</w:t><w:tab/><w:t>Value &amp; more</w:t></w:r>
    </w:p>
  </w:body>
</w:document>"#;

    fn write_docx(path: &Path, body: &str) {
        let file = fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file(DOCX_BODY, zip::write::FileOptions::default())
            .unwrap();
        zip.write_all(body.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(
            DocumentKind::from_path(Path::new("notes.TXT")),
            Some(DocumentKind::PlainText)
        );
        assert_eq!(
            DocumentKind::from_path(Path::new("/a/report.docx")),
            Some(DocumentKind::Docx)
        );
        assert_eq!(DocumentKind::from_path(Path::new("image.png")), None);
        assert_eq!(DocumentKind::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_docx_xml_paragraphs_and_tabs() {
        let text = docx_xml_to_text(BODY).unwrap();
        assert_eq!(text, "Paris is the capital of France.\nName\tValue & more");
    }

    #[test]
    fn test_plain_text_read_verbatim() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("geo.txt");
        fs::write(&path, "line one\n  line two\n").unwrap();
        assert_eq!(read_text(&path).unwrap(), "line one\n  line two\n");
    }

    #[test]
    fn test_empty_paragraph_keeps_blank_line() {
        let xml = r#"<w:document xmlns:w="w"><w:body>
            <w:p><w:r><w:t>one</w:t></w:r></w:p>
            <w:p/>
            <w:p><w:r><w:t>two</w:t></w:r></w:p>
        </w:body></w:document>"#;
        assert_eq!(docx_xml_to_text(xml).unwrap(), "one\n\ntwo");
    }

    #[test]
    fn test_non_utf8_text_decoded_lossily() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("cafe.txt");
        fs::write(&path, b"caf\xe9 au lait").unwrap();
        let text = read_text(&path).unwrap();
        assert_eq!(text, "caf\u{FFFD} au lait");
    }

    #[test]
    fn test_docx_file_extracted() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("geo.docx");
        write_docx(&path, BODY);
        let text = read_text(&path).unwrap();
        assert!(text.starts_with("Paris is the capital of France."));
    }

    #[test]
    fn test_unsupported_extension() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("photo.png");
        fs::write(&path, [0u8, 1, 2]).unwrap();
        assert!(matches!(read_text(&path), Err(ChatError::Unsupported { .. })));
    }

    #[test]
    fn test_corrupt_docx_is_read_failure() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("broken.docx");
        fs::write(&path, "definitely not a zip").unwrap();
        assert!(matches!(read_text(&path), Err(ChatError::ReadFailure { .. })));
    }

    #[test]
    fn test_missing_file_is_read_failure() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("gone.txt");
        assert!(matches!(read_text(&path), Err(ChatError::ReadFailure { .. })));
    }
}
