//! Extraction tests across the supported formats

#[cfg(test)]
mod extraction_tests {
    use crate::{extension_of, DocumentExtractor};
    use docqa_core::{Error, TextExtractor};
    use insta::assert_snapshot;
    use std::io::{Cursor, Write};
    use std::path::Path;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p))
            .collect();
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{}</w:body></w:document>",
            body
        );

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    /// Single-page PDF showing `line` in Helvetica, with a valid xref table
    fn build_pdf(line: &str) -> Vec<u8> {
        let content = format!("BT /F1 12 Tf 72 712 Td ({}) Tj ET", line);
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>"
                .to_string(),
            format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                content.len(),
                content
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica \
             /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];

        let mut pdf = String::from("%PDF-1.4\n");
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
        }

        let xref_at = pdf.len();
        pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
        for offset in offsets {
            pdf.push_str(&format!("{:010} 00000 n \n", offset));
        }
        pdf.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        ));
        pdf.into_bytes()
    }

    #[test]
    fn test_pdf_text_is_extracted() {
        let extractor = DocumentExtractor::new();
        let text = extractor
            .extract_bytes(&build_pdf("Staff must report incidents."), ".pdf")
            .unwrap();
        assert!(text.contains("Staff must report incidents."), "got {:?}", text);
    }

    #[test]
    fn test_malformed_pdf_is_extraction_error() {
        let extractor = DocumentExtractor::new();
        let err = extractor
            .extract_bytes(b"this is not a pdf at all", ".PDF")
            .unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));

        let mut truncated = build_pdf("Cut short.");
        truncated.truncate(60);
        let err = extractor.extract_bytes(&truncated, ".pdf").unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[test]
    fn test_txt_is_cleaned() {
        let extractor = DocumentExtractor::new();
        let text = extractor
            .extract_bytes(b"  Staff must report incidents.  \n\n\n  The office is blue.\n", "txt")
            .unwrap();

        assert_snapshot!(text, @r"
        Staff must report incidents.
        The office is blue.
        ");
    }

    #[test]
    fn test_latin1_fallback() {
        let extractor = DocumentExtractor::new();
        let text = extractor.extract_bytes(b"caf\xe9 policy", ".TXT").unwrap();
        assert_eq!(text, "café policy");
    }

    #[test]
    fn test_unsupported_extension() {
        let extractor = DocumentExtractor::new();
        let err = extractor.extract_bytes(b"a,b,c", ".csv").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(ref ext) if ext == ".csv"));
    }

    #[test]
    fn test_docx_paragraphs_become_lines() {
        let extractor = DocumentExtractor::new();
        let bytes = build_docx(&["Employees must wear badges.", "", "Visitors should sign in."]);
        let text = extractor.extract_bytes(&bytes, ".docx").unwrap();

        assert_eq!(text, "Employees must wear badges.\nVisitors should sign in.");
    }

    #[test]
    fn test_extract_path_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Policy.TXT");
        std::fs::write(&path, "Ensure doors are locked.").unwrap();

        let extractor = DocumentExtractor::new();
        assert_eq!(extractor.extract_path(&path).unwrap(), "Ensure doors are locked.");
    }

    #[test]
    fn test_extract_path_errors() {
        let extractor = DocumentExtractor::new();

        let err = extractor.extract_path(Path::new("README")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = extractor
            .extract_path(Path::new("/definitely/not/here.txt"))
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_empty_file_yields_empty_text() {
        let extractor = DocumentExtractor::new();
        assert_eq!(extractor.extract_bytes(b"  \n \n", ".txt").unwrap(), "");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("a/b/Report.PDF")).as_deref(), Some(".pdf"));
        assert_eq!(extension_of(Path::new("notes")), None);
    }
}
