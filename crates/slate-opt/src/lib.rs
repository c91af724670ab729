//! Optimisation passes over Slate assembly item streams.
//!
//! Passes operate on the flat `Vec<AsmItem>` form the assembler produces, so
//! they can run before label addresses are resolved. Each pass is a pure
//! function of the item stream plus an explicit config; nothing is carried
//! between invocations, so a driver may re-run the pipeline to a fixed point.

pub mod passes;

pub use passes::inline::{inlinable_blocks, InlinableBlock, InlineConfig};
pub use passes::optimise;
