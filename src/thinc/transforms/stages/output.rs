//! Output stages - resolved block tree to target text
//!
//!     Terminating  decides every line ending for the target notation; in strict mode any
//!                  ambiguity fails the conversion here, before output exists
//!     Emitting     serializes the tree and packs the warnings into a [`Conversion`]

use crate::thinc::convert::Conversion;
use crate::thinc::formats::emit;
use crate::thinc::parsing::ir::Tree;
use crate::thinc::terminators::terminate;
use crate::thinc::transforms::{Runnable, Stage, TransformError};

pub struct Terminating;

impl Terminating {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Terminating {
    fn default() -> Self {
        Self::new()
    }
}

impl Runnable<Stage<Tree>, Stage<Tree>> for Terminating {
    fn run(&self, input: Stage<Tree>) -> Result<Stage<Tree>, TransformError> {
        let (mut tree, mut context) = input.split();
        let target = context.options.target_for(tree.notation);
        let ambiguities = terminate(&mut tree, target, context.options.flag_macro_lines);
        context.warnings.extend(ambiguities);

        if context.options.strict {
            context.warnings = context.warnings.promote_ambiguities();
            if context.warnings.has_errors() {
                let diagnostics = std::mem::take(&mut context.warnings);
                return Err(context.fail("terminate", diagnostics));
            }
        }
        Ok(context.carry(tree))
    }
}

pub struct Emitting;

impl Emitting {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Emitting {
    fn default() -> Self {
        Self::new()
    }
}

impl Runnable<Stage<Tree>, Conversion> for Emitting {
    fn run(&self, input: Stage<Tree>) -> Result<Conversion, TransformError> {
        let target = input.options.target_for(input.value.notation);
        let output = emit(&input.value, target, &input.options.emit_options());
        Ok(Conversion {
            output,
            source: input.value.notation,
            target,
            diagnostics: input.warnings,
        })
    }
}
