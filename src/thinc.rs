//! Main module for the thinc conversion engine
//!
//! Conversion is a strictly sequential pipeline, each stage owning the output of the one
//! before it:
//!
//!     scan -> parse -> classify -> resolve aliases -> terminate -> emit
//!
//! See [transforms::standard] for the assembled pipelines and [convert] for the public entry
//! points.

pub mod aliases;
pub mod ast;
pub mod classify;
pub mod config;
pub mod convert;
pub mod formats;
pub mod lexing;
pub mod parsing;
pub mod terminators;
pub mod testing;
pub mod token;
pub mod transforms;
