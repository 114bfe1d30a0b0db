use lopdf::Document as LoDocument;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfInspectErrorCode {
    PdfParseFailed,
    PdfEmptyOrNoPages,
    PdfIoError,
}

impl PdfInspectErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfInspectErrorCode::PdfParseFailed => "PDF_PARSE_FAILED",
            PdfInspectErrorCode::PdfEmptyOrNoPages => "PDF_EMPTY_OR_NO_PAGES",
            PdfInspectErrorCode::PdfIoError => "PDF_IO_ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfInspectError {
    pub code: PdfInspectErrorCode,
    pub message: String,
}

impl std::fmt::Display for PdfInspectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for PdfInspectError {}

/// Summary of a produced PDF, for tests and build-pipeline sanity checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfInspectReport {
    pub pdf_version: String,
    pub page_count: usize,
    pub file_size_bytes: usize,
}

pub fn inspect_pdf_bytes(bytes: &[u8]) -> Result<PdfInspectReport, PdfInspectError> {
    let pdf = LoDocument::load_mem(bytes).map_err(|err| PdfInspectError {
        code: PdfInspectErrorCode::PdfParseFailed,
        message: err.to_string(),
    })?;

    Ok(PdfInspectReport {
        pdf_version: pdf.version.clone(),
        page_count: pdf.get_pages().len(),
        file_size_bytes: bytes.len(),
    })
}

pub fn inspect_pdf_path(path: &Path) -> Result<PdfInspectReport, PdfInspectError> {
    let data = std::fs::read(path).map_err(|err| PdfInspectError {
        code: PdfInspectErrorCode::PdfIoError,
        message: err.to_string(),
    })?;
    inspect_pdf_bytes(&data)
}

pub fn require_renderable_output(report: &PdfInspectReport) -> Result<(), PdfInspectError> {
    if report.page_count == 0 {
        return Err(PdfInspectError {
            code: PdfInspectErrorCode::PdfEmptyOrNoPages,
            message: "pdf has no pages".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::pdf::document_to_pdf;
    use crate::types::{Pt, Size};

    fn sample_pdf_bytes(text: &str) -> Vec<u8> {
        let mut canvas = Canvas::new(Size::a4());
        canvas.draw_string(Pt::from_f32(72.0), Pt::from_f32(72.0), text);
        document_to_pdf(&canvas.finish()).expect("serialize")
    }

    #[test]
    fn inspect_reads_version_and_page_count() {
        let bytes = sample_pdf_bytes("HELLO");
        let report = inspect_pdf_bytes(&bytes).expect("inspect");
        assert_eq!(report.page_count, 1);
        assert_eq!(report.file_size_bytes, bytes.len());
        assert!(!report.pdf_version.is_empty());
    }

    #[test]
    fn inspect_rejects_malformed_data() {
        let err = inspect_pdf_bytes(b"not a pdf").expect_err("invalid");
        assert_eq!(err.code, PdfInspectErrorCode::PdfParseFailed);
    }

    #[test]
    fn inspect_path_reports_io_error_for_missing_file() {
        let missing = std::env::temp_dir().join(format!(
            "ledgerpress_pdfinspect_missing_{}.pdf",
            std::process::id()
        ));
        let err = inspect_pdf_path(&missing).expect_err("missing");
        assert_eq!(err.code, PdfInspectErrorCode::PdfIoError);
    }

    #[test]
    fn renderable_output_requires_pages() {
        let report = PdfInspectReport {
            pdf_version: "1.7".to_string(),
            page_count: 0,
            file_size_bytes: 0,
        };
        let err = require_renderable_output(&report).expect_err("must fail");
        assert_eq!(err.code, PdfInspectErrorCode::PdfEmptyOrNoPages);
        let ok = PdfInspectReport {
            page_count: 1,
            ..report
        };
        assert!(require_renderable_output(&ok).is_ok());
    }
}
