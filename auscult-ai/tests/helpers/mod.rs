//! Test Helper Utilities
//!
//! Shared utilities for testing auscult-ai

#![allow(dead_code)]

pub mod audio_generator;
pub mod fixtures;

// Re-export commonly used items
pub use audio_generator::{generate_test_wav, write_corrupt_file, AudioConfig};
pub use fixtures::{
    complete_model_set, multipart_body, test_labels, write_json_artifacts, FixedClassifier,
    MultipartPart, TEST_CLASSES,
};
