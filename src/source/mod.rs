// file: src/source/mod.rs
// description: source directory discovery module exports
// reference: internal module structure

pub mod classifier;
pub mod pattern;
pub mod reader;
pub mod scanner;

pub use classifier::DocumentKind;
pub use pattern::FilePattern;
pub use reader::{DocumentReader, FsDocumentReader};
pub use scanner::{CandidateFile, Discovery, FileLocator};
