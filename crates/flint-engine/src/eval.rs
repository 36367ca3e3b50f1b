//! IR interpreter
//!
//! Executes a function straight from the IR. Used to check lowering results
//! without a native backend, and as the reference the JIT is compared against.

use crate::ir::{InstKind, Module, ValueId, ValueKind};
use rustc_hash::FxHashMap;

/// Instructions executed before giving up
pub const DEFAULT_STEP_LIMIT: usize = 1_000_000;

/// Interpreter failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("function `{0}` has no blocks")]
    EmptyFunction(String),

    #[error("read of undefined value {0}")]
    UndefinedValue(ValueId),

    #[error("load from {0} before any store")]
    UninitializedSlot(ValueId),

    #[error("block `{0}` ends without a terminator")]
    NoTerminator(String),

    #[error("{0} used with the wrong type")]
    TypeMismatch(ValueId),

    #[error("function returned no value")]
    NoReturnValue,

    #[error("step limit of {0} instructions exceeded")]
    StepLimitExceeded(usize),
}

/// Runtime value
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scalar {
    Float(f32),
    Bool(bool),
    /// Address of a slot, keyed by the alloca's result
    Slot(ValueId),
}

/// Evaluate `function` with the default step limit
pub fn evaluate(module: &Module, function: &str) -> Result<f32, EvalError> {
    Interpreter::new(module).run(function)
}

/// Tree-walking IR interpreter
pub struct Interpreter<'m> {
    module: &'m Module,
    step_limit: usize,
    values: FxHashMap<ValueId, Scalar>,
    memory: FxHashMap<ValueId, f32>,
}

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m Module) -> Self {
        Self {
            module,
            step_limit: DEFAULT_STEP_LIMIT,
            values: FxHashMap::default(),
            memory: FxHashMap::default(),
        }
    }

    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = limit;
        self
    }

    /// Call `function` and return its result
    pub fn run(&mut self, function: &str) -> Result<f32, EvalError> {
        let module = self.module;
        let func = module
            .function_by_name(function)
            .ok_or_else(|| EvalError::UnknownFunction(function.to_string()))?;
        let mut block = func
            .entry_block()
            .ok_or_else(|| EvalError::EmptyFunction(function.to_string()))?;

        self.values.clear();
        self.memory.clear();
        let mut steps = 0usize;

        loop {
            let mut next = None;
            for (_, inst) in module.block_instructions(block) {
                steps += 1;
                if steps > self.step_limit {
                    return Err(EvalError::StepLimitExceeded(self.step_limit));
                }

                let produced = match &inst.kind {
                    InstKind::Alloca { .. } => inst.result.map(Scalar::Slot),
                    InstKind::Load { slot, .. } => {
                        let address = self.slot(*slot)?;
                        let value = self
                            .memory
                            .get(&address)
                            .copied()
                            .ok_or(EvalError::UninitializedSlot(address))?;
                        Some(Scalar::Float(value))
                    }
                    InstKind::Store { value, slot } => {
                        let address = self.slot(*slot)?;
                        let value = self.float(*value)?;
                        self.memory.insert(address, value);
                        None
                    }
                    InstKind::Binary { op, lhs, rhs } => {
                        Some(Scalar::Float(op.apply(self.float(*lhs)?, self.float(*rhs)?)))
                    }
                    InstKind::FCmp { pred, lhs, rhs } => {
                        Some(Scalar::Bool(pred.apply(self.float(*lhs)?, self.float(*rhs)?)))
                    }
                    InstKind::UIToFP { value, .. } => {
                        let bit = self.bool(*value)?;
                        Some(Scalar::Float(if bit { 1.0 } else { 0.0 }))
                    }
                    InstKind::Br { dest } => {
                        next = Some(*dest);
                        None
                    }
                    InstKind::CondBr {
                        cond,
                        then_dest,
                        else_dest,
                    } => {
                        next = Some(if self.bool(*cond)? { *then_dest } else { *else_dest });
                        None
                    }
                    InstKind::Ret { value } => {
                        let value = value.ok_or(EvalError::NoReturnValue)?;
                        let result = self.float(value)?;
                        log::trace!("`{}` returned {} after {} steps", function, result, steps);
                        return Ok(result);
                    }
                };

                if let (Some(result), Some(produced)) = (inst.result, produced) {
                    self.values.insert(result, produced);
                }
                if next.is_some() {
                    break;
                }
            }

            block = next.ok_or_else(|| EvalError::NoTerminator(module.block(block).name.clone()))?;
        }
    }

    fn scalar(&self, value: ValueId) -> Result<Scalar, EvalError> {
        match self.module.value(value).kind {
            ValueKind::ConstF32(v) => Ok(Scalar::Float(v)),
            ValueKind::Undef => Err(EvalError::UndefinedValue(value)),
            ValueKind::Inst(_) => self
                .values
                .get(&value)
                .copied()
                .ok_or(EvalError::UndefinedValue(value)),
        }
    }

    fn float(&self, value: ValueId) -> Result<f32, EvalError> {
        match self.scalar(value)? {
            Scalar::Float(v) => Ok(v),
            _ => Err(EvalError::TypeMismatch(value)),
        }
    }

    fn bool(&self, value: ValueId) -> Result<bool, EvalError> {
        match self.scalar(value)? {
            Scalar::Bool(b) => Ok(b),
            _ => Err(EvalError::TypeMismatch(value)),
        }
    }

    fn slot(&self, value: ValueId) -> Result<ValueId, EvalError> {
        match self.scalar(value)? {
            Scalar::Slot(address) => Ok(address),
            _ => Err(EvalError::TypeMismatch(value)),
        }
    }
}
