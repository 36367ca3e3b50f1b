//! IR instructions
//!
//! Instructions operate on values and live in exactly one basic block.
//! Terminators (`br`, `condbr`, `ret`) end a block.

use super::block::BlockId;
use super::types::IrType;
use super::value::ValueId;

/// Instruction identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstId(pub u32);

impl InstId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for InstId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "i{}", self.0)
    }
}

/// Float arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatBinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl FloatBinOp {
    /// Evaluate on two constants
    pub fn apply(self, lhs: f32, rhs: f32) -> f32 {
        match self {
            FloatBinOp::Add => lhs + rhs,
            FloatBinOp::Sub => lhs - rhs,
            FloatBinOp::Mul => lhs * rhs,
            FloatBinOp::Div => lhs / rhs,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            FloatBinOp::Add => "fadd",
            FloatBinOp::Sub => "fsub",
            FloatBinOp::Mul => "fmul",
            FloatBinOp::Div => "fdiv",
        }
    }
}

/// Float comparison predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatPredicate {
    /// Unordered or less than: true if either operand is NaN or `lhs < rhs`
    Ult,
    /// Ordered and not equal: false if either operand is NaN
    One,
}

impl FloatPredicate {
    /// Evaluate on two constants
    pub fn apply(self, lhs: f32, rhs: f32) -> bool {
        let unordered = lhs.is_nan() || rhs.is_nan();
        match self {
            FloatPredicate::Ult => unordered || lhs < rhs,
            FloatPredicate::One => !unordered && lhs != rhs,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            FloatPredicate::Ult => "ult",
            FloatPredicate::One => "one",
        }
    }
}

/// Instruction opcode and operands
#[derive(Debug, Clone, PartialEq)]
pub enum InstKind {
    /// Reserve a stack slot holding one value of `ty`
    Alloca { ty: IrType },
    /// Read a value of `ty` from a slot
    Load { ty: IrType, slot: ValueId },
    /// Write `value` into a slot
    Store { value: ValueId, slot: ValueId },
    /// Float arithmetic
    Binary {
        op: FloatBinOp,
        lhs: ValueId,
        rhs: ValueId,
    },
    /// Float comparison producing `i1`
    FCmp {
        pred: FloatPredicate,
        lhs: ValueId,
        rhs: ValueId,
    },
    /// Unsigned integer (boolean) to float conversion
    UIToFP { value: ValueId, ty: IrType },
    /// Unconditional branch
    Br { dest: BlockId },
    /// Conditional branch on an `i1`
    CondBr {
        cond: ValueId,
        then_dest: BlockId,
        else_dest: BlockId,
    },
    /// Return from the function
    Ret { value: Option<ValueId> },
}

impl InstKind {
    /// Whether this instruction ends a basic block
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstKind::Br { .. } | InstKind::CondBr { .. } | InstKind::Ret { .. }
        )
    }

    /// Type of the produced value, if any
    pub fn result_type(&self) -> Option<IrType> {
        match self {
            InstKind::Alloca { .. } => Some(IrType::Ptr),
            InstKind::Load { ty, .. } => Some(*ty),
            InstKind::Binary { .. } => Some(IrType::F32),
            InstKind::FCmp { .. } => Some(IrType::I1),
            InstKind::UIToFP { ty, .. } => Some(*ty),
            InstKind::Store { .. }
            | InstKind::Br { .. }
            | InstKind::CondBr { .. }
            | InstKind::Ret { .. } => None,
        }
    }

    /// Values read by this instruction, in operand order
    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            InstKind::Alloca { .. } | InstKind::Br { .. } => vec![],
            InstKind::Load { slot, .. } => vec![*slot],
            InstKind::Store { value, slot } => vec![*value, *slot],
            InstKind::Binary { lhs, rhs, .. } | InstKind::FCmp { lhs, rhs, .. } => {
                vec![*lhs, *rhs]
            }
            InstKind::UIToFP { value, .. } => vec![*value],
            InstKind::CondBr { cond, .. } => vec![*cond],
            InstKind::Ret { value } => value.iter().copied().collect(),
        }
    }

    /// Blocks this instruction may transfer control to
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            InstKind::Br { dest } => vec![*dest],
            InstKind::CondBr {
                then_dest,
                else_dest,
                ..
            } => vec![*then_dest, *else_dest],
            _ => vec![],
        }
    }
}

/// Arena entry for an instruction
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Opcode and operands
    pub kind: InstKind,
    /// Owning block
    pub block: BlockId,
    /// Produced value, if any
    pub result: Option<ValueId>,
    /// Name hint for the textual dump
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_binop_apply() {
        assert_eq!(FloatBinOp::Add.apply(8.0, 8.0), 16.0);
        assert_eq!(FloatBinOp::Sub.apply(1.0, 3.0), -2.0);
        assert_eq!(FloatBinOp::Mul.apply(4.0, 2.0), 8.0);
        assert_eq!(FloatBinOp::Div.apply(16.0, 4.0), 4.0);
    }

    #[test]
    fn test_predicates_handle_nan() {
        assert!(FloatPredicate::Ult.apply(1.0, 2.0));
        assert!(!FloatPredicate::Ult.apply(2.0, 1.0));
        assert!(FloatPredicate::Ult.apply(f32::NAN, 1.0));

        assert!(FloatPredicate::One.apply(1.0, 0.0));
        assert!(!FloatPredicate::One.apply(0.0, 0.0));
        assert!(!FloatPredicate::One.apply(f32::NAN, 0.0));
    }

    #[test]
    fn test_terminators() {
        let br = InstKind::Br { dest: BlockId(1) };
        assert!(br.is_terminator());
        assert_eq!(br.successors(), vec![BlockId(1)]);
        assert_eq!(br.result_type(), None);

        let cond = InstKind::CondBr {
            cond: ValueId(0),
            then_dest: BlockId(1),
            else_dest: BlockId(2),
        };
        assert_eq!(cond.successors(), vec![BlockId(1), BlockId(2)]);
        assert_eq!(cond.operands(), vec![ValueId(0)]);

        let ret = InstKind::Ret { value: None };
        assert!(ret.is_terminator());
        assert!(ret.operands().is_empty());
    }

    #[test]
    fn test_result_types() {
        assert_eq!(
            InstKind::Alloca { ty: IrType::F32 }.result_type(),
            Some(IrType::Ptr)
        );
        let cmp = InstKind::FCmp {
            pred: FloatPredicate::Ult,
            lhs: ValueId(0),
            rhs: ValueId(1),
        };
        assert_eq!(cmp.result_type(), Some(IrType::I1));
        assert!(!cmp.is_terminator());
    }
}
