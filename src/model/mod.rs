//! Program model
//!
//! The `ProgramHost` trait is what the rename logic needs from a decompiler
//! host. `Assembly` is the bundled implementation, loaded from and saved to
//! a JSON description of a decompiled unit.

pub mod assembly;
pub mod host;
pub mod render;

pub use assembly::*;
pub use host::*;
