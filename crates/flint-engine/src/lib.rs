//! Flint Engine
//!
//! Builds, checks and compiles a small float-only IR:
//! - **IR**: Module-owned arenas of functions, blocks, instructions and values,
//!   plus the insertion-cursor [`Builder`] (`ir` module)
//! - **Lowering**: Constants, binary operators, slot-backed variables and
//!   if/else on top of the builder (`lower` module)
//! - **Verifier**: Structural, type and dominance checks (`verify` module)
//! - **Interpreter**: Direct IR execution (`eval` module)
//! - **Codegen**: Cranelift object emission and JIT (`codegen` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use flint_engine::{verify_module, Demo, TargetDescriptor, TargetMachine, CodegenOptions};
//!
//! let (module, lowered) = Demo::Arith.build();
//! assert!(lowered.diagnostics.is_empty());
//!
//! let mut verified = verify_module(module)?;
//! let target = TargetMachine::new(&TargetDescriptor::host(), &CodegenOptions::default())?;
//! flint_engine::generate_obj_file("foo.o", &mut verified, &target)?;
//! ```

#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// IR model, builder and CFG utilities
pub mod ir;

/// Lowering operations and program trees
pub mod lower;

/// Module verification
pub mod verify;

/// IR interpreter
pub mod eval;

/// Cranelift backend: object emission and JIT
pub mod codegen;

/// Built-in demo programs
pub mod demos;

// ============================================================================
// Re-exports
// ============================================================================

pub use ir::{Builder, Module, PrettyPrint, ValueId};
pub use lower::{lower_function, Expr, FunctionLowering, LowerError, Lowered, Stmt, SymbolTable};
pub use verify::{verify_module, VerifiedModule, VerifyError, Violation};
pub use eval::{evaluate, EvalError};
pub use codegen::{
    emit_object, generate_obj_file, CodegenError, CodegenOptions, DataLayout, OptLevel,
    TargetDescriptor, TargetMachine,
};
#[cfg(feature = "jit")]
pub use codegen::run_jit;
pub use demos::Demo;
