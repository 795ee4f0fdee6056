//! Output formats for block trees
//!
//! - Source text in either notation (emitter)
//! - A one-line-per-node debug view (treeviz)

pub mod emitter;
pub mod treeviz;

pub use emitter::{emit, EmitOptions};
pub use treeviz::to_treeviz;
