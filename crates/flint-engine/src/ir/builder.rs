//! IR builder
//!
//! A [`Builder`] is an insertion cursor: it remembers one insertion point
//! (end of a block, or right before an instruction) and appends instructions
//! there. It borrows nothing; every call takes the `Module` explicitly, so any
//! number of independent cursors can exist over the same module.
//!
//! Float arithmetic, comparisons and casts on constant operands are folded into
//! new constants instead of being emitted, unless folding is switched off.

use super::block::BlockId;
use super::function::FunctionId;
use super::instr::{FloatBinOp, FloatPredicate, InstId, InstKind};
use super::module::Module;
use super::types::IrType;
use super::value::ValueId;

/// Where the next instruction goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPoint {
    /// After the last instruction of a block
    End(BlockId),
    /// Immediately before an instruction
    Before(InstId),
}

/// Insertion cursor over a [`Module`]
#[derive(Debug, Clone)]
pub struct Builder {
    point: InsertPoint,
    fold_constants: bool,
}

impl Builder {
    /// Create a builder appending to the end of `block`
    pub fn at_end(block: BlockId) -> Self {
        Self {
            point: InsertPoint::End(block),
            fold_constants: true,
        }
    }

    /// Create a builder inserting before `inst`
    pub fn before(inst: InstId) -> Self {
        Self {
            point: InsertPoint::Before(inst),
            fold_constants: true,
        }
    }

    /// Move the cursor to the end of `block`
    pub fn position_at_end(&mut self, block: BlockId) {
        self.point = InsertPoint::End(block);
    }

    /// Move the cursor right before `inst`
    pub fn position_before(&mut self, inst: InstId) {
        self.point = InsertPoint::Before(inst);
    }

    /// Current insertion point
    pub fn insert_point(&self) -> InsertPoint {
        self.point
    }

    /// Block the cursor currently inserts into
    pub fn insert_block(&self, module: &Module) -> BlockId {
        match self.point {
            InsertPoint::End(block) => block,
            InsertPoint::Before(inst) => module.instruction(inst).block,
        }
    }

    /// Function owning the cursor's block
    pub fn current_function(&self, module: &Module) -> FunctionId {
        module.block(self.insert_block(module)).function
    }

    /// Enable or disable constant folding
    pub fn set_constant_folding(&mut self, enabled: bool) {
        self.fold_constants = enabled;
    }

    /// Whether constant folding is enabled
    pub fn constant_folding(&self) -> bool {
        self.fold_constants
    }

    /// Insert `kind` at the cursor and return its result value.
    ///
    /// Stores and terminators produce no value. Inserting after a terminator
    /// is a caller error; the verifier reports it.
    pub fn insert(
        &mut self,
        module: &mut Module,
        kind: InstKind,
        name: Option<&str>,
    ) -> Option<ValueId> {
        self.insert_instruction(module, kind, name).1
    }

    /// Like [`insert`](Self::insert) but also returns the instruction handle
    pub fn insert_instruction(
        &mut self,
        module: &mut Module,
        kind: InstKind,
        name: Option<&str>,
    ) -> (InstId, Option<ValueId>) {
        log::trace!("insert {:?} at {:?}", kind, self.point);
        match self.point {
            InsertPoint::End(block) => module.append_instruction(block, kind, name),
            InsertPoint::Before(inst) => module.insert_instruction_before(inst, kind, name),
        }
    }

    /// Insert an instruction that always produces a value
    fn insert_value(&mut self, module: &mut Module, kind: InstKind, name: &str) -> ValueId {
        let ty = kind.result_type().unwrap_or(IrType::Void);
        match self.insert(module, kind, Some(name)) {
            Some(value) => value,
            // result_type() is Some for every kind routed here
            None => module.undef(ty),
        }
    }

    fn both_constant(&self, module: &Module, lhs: ValueId, rhs: ValueId) -> Option<(f32, f32)> {
        if !self.fold_constants {
            return None;
        }
        Some((module.as_const_f32(lhs)?, module.as_const_f32(rhs)?))
    }

    /// Outcome of `fcmp pred lhs, rhs` when both operands are constants and
    /// folding is on
    pub fn fold_fcmp(
        &self,
        module: &Module,
        pred: FloatPredicate,
        lhs: ValueId,
        rhs: ValueId,
    ) -> Option<bool> {
        let (l, r) = self.both_constant(module, lhs, rhs)?;
        Some(pred.apply(l, r))
    }

    // =====================================================================
    // Typed helpers
    // =====================================================================

    /// Float arithmetic (`fadd`, `fsub`, `fmul`, `fdiv`)
    pub fn build_float_binop(
        &mut self,
        module: &mut Module,
        op: FloatBinOp,
        lhs: ValueId,
        rhs: ValueId,
        name: &str,
    ) -> ValueId {
        if let Some((l, r)) = self.both_constant(module, lhs, rhs) {
            return module.const_f32(op.apply(l, r));
        }
        self.insert_value(module, InstKind::Binary { op, lhs, rhs }, name)
    }

    pub fn build_fadd(&mut self, module: &mut Module, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.build_float_binop(module, FloatBinOp::Add, lhs, rhs, name)
    }

    pub fn build_fsub(&mut self, module: &mut Module, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.build_float_binop(module, FloatBinOp::Sub, lhs, rhs, name)
    }

    pub fn build_fmul(&mut self, module: &mut Module, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.build_float_binop(module, FloatBinOp::Mul, lhs, rhs, name)
    }

    pub fn build_fdiv(&mut self, module: &mut Module, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.build_float_binop(module, FloatBinOp::Div, lhs, rhs, name)
    }

    /// Float comparison producing an `i1`.
    ///
    /// There are no `i1` constants, so this always emits. Callers that want a
    /// folded `0.0`/`1.0` check [`fold_fcmp`](Self::fold_fcmp) first.
    pub fn build_fcmp(
        &mut self,
        module: &mut Module,
        pred: FloatPredicate,
        lhs: ValueId,
        rhs: ValueId,
        name: &str,
    ) -> ValueId {
        self.insert_value(module, InstKind::FCmp { pred, lhs, rhs }, name)
    }

    /// Convert an `i1` to `ty` (0.0 or 1.0).
    ///
    /// When the operand is a comparison of two constants the whole pair folds
    /// to a float constant and the dead comparison stays unused.
    pub fn build_uitofp(&mut self, module: &mut Module, value: ValueId, ty: IrType, name: &str) -> ValueId {
        if let Some(folded) = self.fold_comparison(module, value) {
            return module.const_f32(if folded { 1.0 } else { 0.0 });
        }
        self.insert_value(module, InstKind::UIToFP { value, ty }, name)
    }

    fn fold_comparison(&self, module: &Module, value: ValueId) -> Option<bool> {
        let inst = module.defining_instruction(value)?;
        match module.instruction(inst).kind {
            InstKind::FCmp { pred, lhs, rhs } => self.fold_fcmp(module, pred, lhs, rhs),
            _ => None,
        }
    }

    /// Reserve a stack slot for one value of `ty`
    pub fn build_alloca(&mut self, module: &mut Module, ty: IrType, name: &str) -> ValueId {
        self.insert_value(module, InstKind::Alloca { ty }, name)
    }

    /// Load a value of `ty` from a slot
    pub fn build_load(&mut self, module: &mut Module, ty: IrType, slot: ValueId, name: &str) -> ValueId {
        self.insert_value(module, InstKind::Load { ty, slot }, name)
    }

    /// Store `value` into a slot
    pub fn build_store(&mut self, module: &mut Module, value: ValueId, slot: ValueId) -> InstId {
        self.insert_instruction(module, InstKind::Store { value, slot }, None).0
    }

    /// Unconditional branch
    pub fn build_br(&mut self, module: &mut Module, dest: BlockId) -> InstId {
        self.insert_instruction(module, InstKind::Br { dest }, None).0
    }

    /// Conditional branch on an `i1`
    pub fn build_cond_br(
        &mut self,
        module: &mut Module,
        cond: ValueId,
        then_dest: BlockId,
        else_dest: BlockId,
    ) -> InstId {
        self.insert_instruction(
            module,
            InstKind::CondBr {
                cond,
                then_dest,
                else_dest,
            },
            None,
        )
        .0
    }

    /// Return from the function
    pub fn build_ret(&mut self, module: &mut Module, value: Option<ValueId>) -> InstId {
        self.insert_instruction(module, InstKind::Ret { value }, None).0
    }
}
