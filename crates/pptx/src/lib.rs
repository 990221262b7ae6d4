//! PPTX (Office Open XML) slide extractor.
//!
//! Parses .pptx files, which are ZIP archives containing XML documents, into
//! [`deckcheck_core::SlideRecord`]s. Pictures are decoded and written into
//! the run workspace.

pub mod parser;

pub use parser::PptxExtractor;
