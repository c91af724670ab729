//! Assembly item model for the Slate stack VM.
//!
//! Slate programs are flat, label-addressed item streams: machine operations,
//! data pushes, label pushes, and label definitions. This crate owns the item
//! model plus the small amount of per-item knowledge the rest of the stack
//! needs (encoded sizes, straight-line classification, a textual listing
//! format). It deliberately knows nothing about gas or optimisation; those
//! live in `slate-gas` and `slate-opt` so they can evolve independently.

mod item;
mod opcode;
mod version;

pub mod semantics;
pub mod text;

pub use item::{AsmItem, JumpKind, Label, LABEL_ADDRESS_BYTES};
pub use opcode::Opcode;
pub use version::VmVersion;
