//! DOCX body text extraction

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use docqa_core::{Error, Result};

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract paragraph text from a `.docx` archive, one paragraph per line
pub(crate) fn extract_docx(bytes: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::Extraction(format!("Not a valid DOCX archive: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| Error::Extraction(format!("Missing {}: {}", DOCUMENT_PART, e)))?
        .read_to_string(&mut xml)?;

    paragraphs_from_xml(&xml)
}

fn paragraphs_from_xml(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs: Vec<String> = Vec::new();
    // open paragraphs, innermost last; text boxes nest `w:p` inside `w:p`
    let mut open: Vec<String> = Vec::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = true,
                b"p" => open.push(String::new()),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"tab" => push_text(&mut open, "\t"),
                b"br" | b"cr" => push_text(&mut open, "\n"),
                b"p" => paragraphs.push(String::new()),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text_run {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::Extraction(format!("DOCX text error: {}", e)))?;
                    push_text(&mut open, &text);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => paragraphs.extend(open.pop()),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Extraction(format!(
                    "DOCX XML parse error at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

fn push_text(open: &mut [String], text: &str) {
    if let Some(current) = open.last_mut() {
        current.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_and_runs() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Staff must </w:t></w:r><w:r><w:t>report incidents.</w:t></w:r></w:p>
    <w:p/>
    <w:p><w:r><w:t>Fish &amp; chips</w:t><w:tab/><w:t>daily</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

        let text = paragraphs_from_xml(xml).unwrap();
        assert_eq!(text, "Staff must report incidents.\n\nFish & chips\tdaily");
    }

    #[test]
    fn test_text_box_keeps_outer_paragraph() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p>
      <w:r><w:t>Staff must report.</w:t></w:r>
      <w:r><w:pict><w:txbxContent>
        <w:p><w:r><w:t>Box</w:t></w:r></w:p>
      </w:txbxContent></w:pict></w:r>
      <w:r><w:t xml:space="preserve"> Tail</w:t></w:r>
    </w:p>
  </w:body>
</w:document>"#;

        let text = paragraphs_from_xml(xml).unwrap();
        assert_eq!(text, "Box\nStaff must report. Tail");
    }

    #[test]
    fn test_invalid_archive() {
        let err = extract_docx(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }
}
