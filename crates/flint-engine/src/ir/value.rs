//! IR values
//!
//! A value is either a float constant, the undefined marker used for taint
//! propagation, or the result of an instruction.

use super::instr::InstId;
use super::types::IrType;

/// Handle to a value owned by a [`Module`](super::Module)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

impl ValueId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%v{}", self.0)
    }
}

/// What a value is
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueKind {
    /// Float constant
    ConstF32(f32),
    /// Undefined marker; taints any arithmetic built from it
    Undef,
    /// Result of an instruction
    Inst(InstId),
}

/// Arena entry for a value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueData {
    /// Value type
    pub ty: IrType,
    /// Value kind
    pub kind: ValueKind,
}

impl ValueData {
    /// Whether this value is a compile-time constant
    pub fn is_constant(&self) -> bool {
        matches!(self.kind, ValueKind::ConstF32(_))
    }

    /// Whether this value is the undefined marker
    pub fn is_undef(&self) -> bool {
        matches!(self.kind, ValueKind::Undef)
    }
}

/// Stack storage backing one mutable variable.
///
/// Wraps the pointer value produced by the variable's `alloca`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemorySlot(ValueId);

impl MemorySlot {
    pub(crate) fn new(pointer: ValueId) -> Self {
        Self(pointer)
    }

    /// The pointer value produced by the slot's `alloca`
    pub fn pointer(&self) -> ValueId {
        self.0
    }
}

impl std::fmt::Display for MemorySlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot({})", self.0)
    }
}
