//! # thinc
//!
//! A bidirectional transpiler between the two surface notations of C/C++: the usual
//! brace-and-semicolon form, and an indentation form where blocks are opened by a trailing
//! `:` and closed by dedenting.
//!
//! ```text
//! int main() {                        int main():
//!     for (int i = 0; i < 3; i++) {       for (int i = 0; i < 3; i++):
//!         printf("%d\n", i);   <==>           printf("%d\n", i)
//!     }                                   return 0
//!     return 0;
//! }
//! ```
//!
//! Only delimiters move. Expressions, identifiers and comments pass through verbatim, so a
//! conversion followed by its inverse yields the original token stream.
//!
//! ## Testing
//!
//! Shared helpers for tests live in the [testing module](thinc::testing).

pub mod thinc;

pub use thinc::ast::{Diagnostic, DiagnosticKind, DiagnosticList, Position, Range, Severity};
pub use thinc::config::{load_defaults, Loader, ThincConfig};
pub use thinc::convert::{
    convert, convert_many, count_comments, detect_notation, parse_tree, to_brace, to_indentation,
    CancelFlag, ConvertError, ConvertOptions, Conversion, Converter,
};
pub use thinc::parsing::ir::{StructureEq, Tree};
pub use thinc::token::{IndentUnit, Notation};
