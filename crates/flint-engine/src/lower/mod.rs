//! Lowering into IR
//!
//! [`FunctionLowering`] owns the insertion cursor and the symbol table for one
//! function and exposes the primitive lowering operations: constants, binary
//! operators, variable assignment/reads and if/else. Mutable variables live in
//! stack slots hoisted into the entry block, so reads and writes stay valid from
//! any block without SSA construction.
//!
//! Lowering errors are recoverable: they are logged, recorded as diagnostics
//! and replaced by an undefined value that taints everything computed from it.

mod control_flow;
pub mod program;
pub mod symbols;

pub use program::{lower_function, Expr, Lowered, Stmt};
pub use symbols::SymbolTable;

use crate::ir::{
    BlockId, Builder, FloatBinOp, FloatPredicate, FunctionId, InstId, IrType, MemorySlot, Module,
    ValueId,
};

/// Recoverable lowering error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LowerError {
    /// Read of a variable that was never assigned
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// Operator outside `+ - * / <`
    #[error("invalid operator: {0}")]
    InvalidOperator(char),
}

/// Lowering context for one function
pub struct FunctionLowering<'m> {
    module: &'m mut Module,
    builder: Builder,
    symbols: SymbolTable,
    diagnostics: Vec<LowerError>,
    function: FunctionId,
}

impl<'m> FunctionLowering<'m> {
    /// Add `name() -> f32` to the module and position at its `entry` block
    pub fn new(module: &'m mut Module, name: &str) -> Self {
        let function = module.add_function(name, IrType::F32);
        let entry = module.append_block(function, "entry");
        log::debug!("lowering function `{}`", name);
        Self {
            module,
            builder: Builder::at_end(entry),
            symbols: SymbolTable::new(),
            diagnostics: Vec::new(),
            function,
        }
    }

    /// Function being lowered
    pub fn function(&self) -> FunctionId {
        self.function
    }

    pub fn module(&self) -> &Module {
        self.module
    }

    pub fn builder(&self) -> &Builder {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut Builder {
        &mut self.builder
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Diagnostics recorded so far
    pub fn diagnostics(&self) -> &[LowerError] {
        &self.diagnostics
    }

    /// Block the cursor inserts into
    pub fn current_block(&self) -> BlockId {
        self.builder.insert_block(self.module)
    }

    /// Whether the cursor's block already ends in a terminator
    pub fn current_block_is_terminated(&self) -> bool {
        self.module.is_terminated(self.current_block())
    }

    /// Finish lowering and hand back the diagnostics
    pub fn finish(self) -> Vec<LowerError> {
        log::debug!(
            "lowered function `{}` with {} diagnostic(s)",
            self.module.function(self.function).name,
            self.diagnostics.len()
        );
        self.diagnostics
    }

    fn report(&mut self, error: LowerError) -> ValueId {
        log::error!("{}", error);
        self.diagnostics.push(error);
        self.module.undef(IrType::F32)
    }

    // =====================================================================
    // Primitive operations
    // =====================================================================

    /// Float constant carrying `value` exactly
    pub fn build_number(&mut self, value: f32) -> ValueId {
        self.module.const_f32(value)
    }

    /// Lower `lhs op rhs`.
    ///
    /// `+ - * /` produce the float result; `<` compares and converts the `i1`
    /// back to `0.0`/`1.0`. Constant operands fold to a constant with no
    /// instructions, comparisons included. An undefined operand yields an
    /// undefined result without emitting anything.
    pub fn build_binop(&mut self, lhs: ValueId, rhs: ValueId, op: char) -> ValueId {
        if self.module.is_undef(lhs) || self.module.is_undef(rhs) {
            return self.module.undef(IrType::F32);
        }

        let (binop, name) = match op {
            '+' => (FloatBinOp::Add, "add_result"),
            '-' => (FloatBinOp::Sub, "sub_result"),
            '*' => (FloatBinOp::Mul, "mul_result"),
            '/' => (FloatBinOp::Div, "div_result"),
            '<' => {
                if let Some(folded) =
                    self.builder
                        .fold_fcmp(self.module, FloatPredicate::Ult, lhs, rhs)
                {
                    return self.module.const_f32(if folded { 1.0 } else { 0.0 });
                }
                let cmp = self.builder.build_fcmp(
                    self.module,
                    FloatPredicate::Ult,
                    lhs,
                    rhs,
                    "cmp_result",
                );
                return self
                    .builder
                    .build_uitofp(self.module, cmp, IrType::F32, "bool_result");
            }
            _ => return self.report(LowerError::InvalidOperator(op)),
        };
        self.builder
            .build_float_binop(self.module, binop, lhs, rhs, name)
    }

    /// Reserve a slot for `name` at the top of the entry block.
    ///
    /// The caller's cursor is left where it was.
    pub fn build_alloca(&mut self, name: &str) -> MemorySlot {
        let cursor_block = self.builder.insert_block(self.module);
        let func = self.module.block(cursor_block).function;
        // A function owning the cursor's block has an entry block
        let entry = self
            .module
            .function(func)
            .entry_block()
            .unwrap_or(cursor_block);

        let mut alloca_builder = match self.module.block(entry).first_instruction() {
            Some(first) => Builder::before(first),
            None => Builder::at_end(entry),
        };
        let pointer = alloca_builder.build_alloca(self.module, IrType::F32, name);
        MemorySlot::new(pointer)
    }

    /// Store `value` into the slot of `name`, allocating it on first use
    pub fn build_assignment(&mut self, name: &str, value: ValueId) -> InstId {
        let slot = match self.symbols.get(name) {
            Some(slot) => slot,
            None => {
                let slot = self.build_alloca(name);
                self.symbols.insert(name, slot);
                slot
            }
        };
        self.builder
            .build_store(self.module, value, slot.pointer())
    }

    /// Load the current value of `name`
    pub fn build_variable_val(&mut self, name: &str) -> ValueId {
        match self.symbols.get(name) {
            Some(slot) => {
                self.builder
                    .build_load(self.module, IrType::F32, slot.pointer(), name)
            }
            None => self.report(LowerError::UnknownVariable(name.to_string())),
        }
    }

    /// Return `value` from the function
    pub fn build_return(&mut self, value: ValueId) -> InstId {
        self.builder.build_ret(self.module, Some(value))
    }

    /// Append a fresh block to the function being lowered
    pub fn append_block(&mut self, name: &str) -> BlockId {
        self.module.append_block(self.function, name)
    }

    /// Move the cursor to the end of `block`
    pub fn position_at_end(&mut self, block: BlockId) {
        self.builder.position_at_end(block);
    }
}
