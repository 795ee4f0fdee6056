//! Structural stages - token stream to resolved block tree
//!
//!     Parsing           builds the block tree for the scanned notation
//!     Classifying       tags every block with its construct kind
//!     ResolvingAliases  fills aggregate alias groups; conflicts become warnings

use crate::thinc::aliases::resolve_aliases;
use crate::thinc::classify::classify;
use crate::thinc::lexing::Scan;
use crate::thinc::parsing::ir::Tree;
use crate::thinc::parsing::parse;
use crate::thinc::transforms::{Runnable, Stage, TransformError};

pub struct Parsing;

impl Parsing {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Parsing {
    fn default() -> Self {
        Self::new()
    }
}

impl Runnable<Stage<Scan>, Stage<Tree>> for Parsing {
    fn run(&self, input: Stage<Scan>) -> Result<Stage<Tree>, TransformError> {
        match parse(&input.value, input.options.flag_macro_lines) {
            Ok(tree) => Ok(input.carry(tree)),
            Err(error) => Err(input.fail("parse", error)),
        }
    }
}

pub struct Classifying;

impl Classifying {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Classifying {
    fn default() -> Self {
        Self::new()
    }
}

impl Runnable<Stage<Tree>, Stage<Tree>> for Classifying {
    fn run(&self, input: Stage<Tree>) -> Result<Stage<Tree>, TransformError> {
        let (tree, context) = input.split();
        match classify(tree) {
            Ok(tree) => Ok(context.carry(tree)),
            Err(error) => Err(context.fail("classify", error)),
        }
    }
}

pub struct ResolvingAliases;

impl ResolvingAliases {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ResolvingAliases {
    fn default() -> Self {
        Self::new()
    }
}

impl Runnable<Stage<Tree>, Stage<Tree>> for ResolvingAliases {
    fn run(&self, mut input: Stage<Tree>) -> Result<Stage<Tree>, TransformError> {
        let conflicts = resolve_aliases(&mut input.value);
        input.warnings.extend(conflicts);
        Ok(input)
    }
}
