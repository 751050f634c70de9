//! PDF converter (feature `pdf`)

use super::{Converter, StreamInfo};
use crate::error::ConversionError;

/// Extracts the text layer of PDF documents
pub struct PdfConverter;

impl PdfConverter {
    /// Create a new PDF converter
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter for PdfConverter {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn accepts(&self, info: &StreamInfo, head: &[u8]) -> bool {
        if info.mime_is(&["application/pdf", "application/x-pdf"]) {
            return true;
        }
        if info.mime_is_specific() {
            return false;
        }
        info.extension_is(&["pdf"]) || head.starts_with(b"%PDF-")
    }

    fn convert(&self, body: &[u8], _info: &StreamInfo) -> Result<String, ConversionError> {
        let text = pdf_extract::extract_text_from_mem(body).map_err(|e| {
            ConversionError::ConversionFailed(format!("could not extract PDF text: {}", e))
        })?;
        Ok(text.trim().to_string())
    }
}
