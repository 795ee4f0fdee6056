//! Standard transform definitions
//!
//! Prebuilt pipelines, defined as static references using `once_cell::sync::Lazy`.

use once_cell::sync::Lazy;

use crate::thinc::convert::Conversion;
use crate::thinc::lexing::Scan;
use crate::thinc::parsing::ir::Tree;
use crate::thinc::transforms::stages::{
    Classifying, Emitting, Parsing, ResolvingAliases, Scanning, Terminating,
};
use crate::thinc::transforms::{Stage, Transform};

/// Type alias for the scanning transform
pub type ScanTransform = Transform<Stage<String>, Stage<Scan>>;

/// Type alias for transforms ending in a resolved block tree
pub type TreeTransform = Transform<Stage<String>, Stage<Tree>>;

/// Type alias for the full conversion transform
pub type ConversionTransform = Transform<Stage<String>, Conversion>;

/// Scanning transform: source text → annotated token stream
pub static SCANNING: Lazy<ScanTransform> =
    Lazy::new(|| Transform::from_fn(Ok).then(Scanning::new()));

/// Source text → block tree with construct kinds and alias groups resolved
///
/// Line endings are still undecided; they depend on the target notation.
pub static TO_TREE: Lazy<TreeTransform> = Lazy::new(|| {
    Transform::from_fn(Ok)
        .then_transform(Lazy::force(&SCANNING))
        .then(Parsing::new())
        .then(Classifying::new())
        .then(ResolvingAliases::new())
});

/// The whole conversion: source text → target text plus warnings
pub static CONVERSION: Lazy<ConversionTransform> = Lazy::new(|| {
    Transform::from_fn(Ok)
        .then_transform(Lazy::force(&TO_TREE))
        .then(Terminating::new())
        .then(Emitting::new())
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thinc::convert::ConvertOptions;
    use crate::thinc::token::Notation;

    #[test]
    fn test_to_tree_builds_resolved_tree() {
        let stage = TO_TREE
            .run(Stage::new(
                "struct point {\n    int x;\n} origin;\n".to_string(),
                ConvertOptions::default(),
            ))
            .unwrap();
        assert_eq!(stage.value.notation, Notation::Brace);
        let group = stage.value.root.children[0]
            .as_block()
            .and_then(|b| b.alias_group())
            .unwrap();
        assert_eq!(group.aliases[0].name(), Some("origin"));
    }

    #[test]
    fn test_conversion_pipeline() {
        let conversion = CONVERSION
            .run(Stage::new(
                "int main():\n    return 0\n".to_string(),
                ConvertOptions::default(),
            ))
            .unwrap();
        assert_eq!(conversion.output, "int main() {\n    return 0;\n}\n");
        assert!(conversion.diagnostics.is_empty());
    }
}
