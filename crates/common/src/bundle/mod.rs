//! Download packaging
//!
//! A bundle is a deflate zip with exactly two entries: the PDF and a
//! UTF-8 summary text.

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Entry name of the document inside a bundle
pub const PDF_ENTRY: &str = "document.pdf";

/// Entry name of the summary inside a bundle
pub const SUMMARY_ENTRY: &str = "summary.txt";

/// Summary text used when no publication summary exists
pub const NO_SUMMARY_PLACEHOLDER: &str = "No summary available.";

/// Package PDF bytes and summary text into an in-memory zip
pub fn build_bundle(pdf: &[u8], summary: &str) -> zip::result::ZipResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    writer.start_file(PDF_ENTRY, options)?;
    writer.write_all(pdf)?;

    writer.start_file(SUMMARY_ENTRY, options)?;
    writer.write_all(summary.as_bytes())?;

    Ok(writer.finish()?.into_inner())
}

/// Keep only ASCII characters that are safe in a `Content-Disposition` filename
pub fn sanitize_filename(base: &str) -> String {
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' '))
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn test_bundle_has_exactly_two_entries() {
        let pdf = b"%PDF-1.4\n\x00\x01binary\xff";
        let bytes = build_bundle(pdf, "Resumen del día").unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec![PDF_ENTRY.to_string(), SUMMARY_ENTRY.to_string()]);

        let mut doc = Vec::new();
        let mut entry = archive.by_name(PDF_ENTRY).unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
        entry.read_to_end(&mut doc).unwrap();
        drop(entry);
        assert_eq!(doc, pdf);

        let mut text = String::new();
        archive.by_name(SUMMARY_ENTRY).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "Resumen del día");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(
            sanitize_filename("DOF_2024-01-15_matutina/../file7"),
            "DOF_2024-01-15_matutina..file7"
        );
        assert_eq!(sanitize_filename("  a\"b;c  "), "abc");
        assert_eq!(sanitize_filename("\"/;"), "document");
        assert_eq!(sanitize_filename("Edición vespertina"), "Edicin vespertina");
    }
}
