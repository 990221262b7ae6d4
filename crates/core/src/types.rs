//! Domain types for representing extracted slide content.

use std::path::PathBuf;

/// One slide of an uploaded deck.
///
/// Created once per run by a [`crate::SlideExtractor`] and never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideRecord {
    /// 1-based slide number, contiguous with extraction order.
    pub slide_number: usize,

    /// Trimmed text of every text-bearing shape, in shape order.
    pub text: Vec<String>,

    /// Temporary files holding the slide's decoded pictures.
    pub images: Vec<PathBuf>,
}

impl SlideRecord {
    /// Create an empty record for the given slide number.
    pub fn new(slide_number: usize) -> Self {
        Self {
            slide_number,
            text: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Add the text of one shape. Blank text is ignored.
    pub fn add_text(&mut self, text: &str) {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            self.text.push(trimmed.to_string());
        }
    }

    /// Record a picture written for this slide.
    pub fn add_image(&mut self, path: impl Into<PathBuf>) {
        self.images.push(path.into());
    }

    /// Whether the slide carries neither text nor pictures.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.images.is_empty()
    }
}
