//! Scanning stage - source text to annotated token stream

use crate::thinc::lexing::{scan, Scan};
use crate::thinc::transforms::{Runnable, Stage, TransformError};

/// Scanning stage: tokenizes, detects (or takes the forced) notation and measures
/// indentation
pub struct Scanning;

impl Scanning {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Scanning {
    fn default() -> Self {
        Self::new()
    }
}

impl Runnable<Stage<String>, Stage<Scan>> for Scanning {
    fn run(&self, input: Stage<String>) -> Result<Stage<Scan>, TransformError> {
        match scan(&input.value, input.options.source) {
            Ok(scanned) => Ok(input.carry(scanned)),
            Err(errors) => Err(input.fail("scan", errors)),
        }
    }
}
