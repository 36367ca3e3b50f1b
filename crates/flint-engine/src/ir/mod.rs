//! Intermediate Representation (IR) for Flint
//!
//! The IR is a typed, block-structured representation that the lowering engine
//! builds through a [`Builder`] cursor and the backend consumes.
//!
//! # Structure
//!
//! - `Module` - Top-level owner of every function, block, instruction and value
//! - `Function` - An ordered list of basic blocks, the first being the entry
//! - `BasicBlock` - Instructions ending in exactly one terminator
//! - `Instruction` - An opcode with operand values and at most one result
//! - `ValueId` - Index handle to a constant, undefined marker or instruction result
//!
//! All handles (`FunctionId`, `BlockId`, `InstId`, `ValueId`) are plain indices
//! into arenas owned by the `Module`, so they are `Copy` and stay valid while
//! blocks are appended mid-construction.

pub mod block;
pub mod builder;
pub mod cfg;
pub mod function;
pub mod instr;
pub mod module;
pub mod pretty;
pub mod types;
pub mod value;

pub use block::{BasicBlock, BlockId};
pub use builder::{Builder, InsertPoint};
pub use function::{Function, FunctionId};
pub use instr::{FloatBinOp, FloatPredicate, InstId, InstKind, Instruction};
pub use module::{Module, TargetStamp};
pub use pretty::{BlockView, FunctionView, PrettyPrint};
pub use types::IrType;
pub use value::{MemorySlot, ValueData, ValueId, ValueKind};
