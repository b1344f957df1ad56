//! Capture ingestion
//!
//! Validates the payloads sent by the browser extension and the screen
//! capture loop, and turns them into store `add` inputs with the metadata
//! each source is tagged with.

use serde::Deserialize;

use crate::error::{GatewayError, Result};
use crate::memory::types::NewMemory;
use crate::prompts::OCR_EXTRACTION_PROMPT;

/// Source tag for pages captured by the browser extension
pub const SOURCE_BROWSER: &str = "browser_dom";
/// Source tag for text recognized from screenshots
pub const SOURCE_OCR: &str = "ocr_screenshot";
/// Source tag for memories added by hand through `/memories`
pub const SOURCE_MANUAL: &str = "manual";

/// A web page captured by the browser extension
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageCapture {
    pub url: Option<String>,
    pub content: Option<String>,
    pub title: Option<String>,
}

impl PageCapture {
    pub fn into_new_memory(self, user_id: &str) -> Result<NewMemory> {
        let (Some(url), Some(content)) = (self.url, self.content) else {
            return Err(GatewayError::MalformedRequest(
                "Missing 'url' or 'content' in request".to_string(),
            ));
        };

        tracing::info!(
            url = %url,
            title = self.title.as_deref().unwrap_or(""),
            content_length = content.len(),
            "Ingesting page capture"
        );

        Ok(NewMemory::new(content, user_id, SOURCE_BROWSER)
            .with_metadata("url", Some(url))
            .with_metadata("title", self.title))
    }
}

/// OCR text recognized from a screenshot of the user's screen
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrCapture {
    pub text: Option<String>,
    pub app_name: Option<String>,
    pub window_name: Option<String>,
}

impl OcrCapture {
    pub fn into_new_memory(self, user_id: &str) -> Result<NewMemory> {
        let Some(text) = self.text else {
            return Err(GatewayError::MalformedRequest(
                "Missing OCR text in request".to_string(),
            ));
        };

        tracing::info!(
            app_name = self.app_name.as_deref().unwrap_or(""),
            window_name = self.window_name.as_deref().unwrap_or(""),
            content_length = text.len(),
            "Ingesting OCR capture"
        );

        Ok(NewMemory::new(text, user_id, SOURCE_OCR)
            .with_metadata("app_name", self.app_name)
            .with_metadata("window_name", self.window_name)
            .with_prompt(OCR_EXTRACTION_PROMPT))
    }
}
