//! Native code generation
//!
//! Lowers verified IR through Cranelift into either a relocatable object file
//! ([`object`]) or executable memory in the current process ([`jit`]).
//!
//! Target selection is explicit: a [`TargetDescriptor`] names the triple, CPU
//! and feature flags, and [`TargetMachine`] turns it plus [`CodegenOptions`]
//! into a configured Cranelift ISA.

#[cfg(feature = "jit")]
pub mod jit;
pub mod lowering;
pub mod object;
pub mod target;

#[cfg(feature = "jit")]
pub use jit::run_jit;
pub use object::{emit_object, generate_obj_file};
pub use target::{DataLayout, Mangling, TargetDescriptor, TargetMachine};

use std::path::PathBuf;

/// Code generation failure
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// Triple could not be parsed or has no Cranelift backend
    #[error("unsupported target `{target}`: {detail}")]
    UnsupportedTarget { target: String, detail: String },

    /// ISA flag, CPU or feature could not be applied
    #[error("ISA configuration failed: {detail}")]
    Isa { detail: String },

    /// Cranelift module declaration/definition failure
    #[error("module error: {detail}")]
    Module { detail: String },

    /// IR construct the backend cannot translate
    #[error("cannot lower `{function}`: {detail}")]
    Lowering { function: String, detail: String },

    #[error("unknown function `{function}`")]
    UnknownFunction { function: String },

    /// Object serialization failure
    #[error("object emission failed: {detail}")]
    ObjectEmit { detail: String },

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Cranelift optimization level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptLevel {
    None,
    #[default]
    Speed,
    SpeedAndSize,
}

impl OptLevel {
    /// Value of Cranelift's `opt_level` setting
    pub fn as_setting(self) -> &'static str {
        match self {
            OptLevel::None => "none",
            OptLevel::Speed => "speed",
            OptLevel::SpeedAndSize => "speed_and_size",
        }
    }
}

/// Backend options independent of the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodegenOptions {
    pub opt_level: OptLevel,
    /// Position-independent code; must be off for the JIT
    pub pic: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            opt_level: OptLevel::default(),
            pic: true,
        }
    }
}
