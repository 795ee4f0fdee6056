//! Individual transformation stages
//!
//! One stage per pipeline step, in order:
//!
//!     Scanning -> Parsing -> Classifying -> ResolvingAliases -> Terminating -> Emitting
//!
//! Each stage implements the `Runnable` trait over [`Stage`](super::Stage) values.

pub mod output;
pub mod scanning;
pub mod structure;

pub use output::{Emitting, Terminating};
pub use scanning::Scanning;
pub use structure::{Classifying, Parsing, ResolvingAliases};
