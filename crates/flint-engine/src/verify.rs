//! Module verification
//!
//! Checks the structural and typing rules every backend relies on and hands
//! back a [`VerifiedModule`] on success. All violations are collected before
//! failing so a single run reports everything that is wrong.

use crate::ir::cfg::DominatorTree;
use crate::ir::{BlockId, FunctionId, InstKind, IrType, Module, ValueId, ValueKind};
use std::fmt;
use std::ops::Deref;

/// A single rule violation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("function `{function}` has no blocks")]
    EmptyFunction { function: String },

    #[error("{function}:{block}: block is empty")]
    EmptyBlock { function: String, block: String },

    #[error("{function}:{block}: block does not end in a terminator")]
    MissingTerminator { function: String, block: String },

    #[error("{function}:{block}: terminator before the end of the block")]
    TerminatorNotLast { function: String, block: String },

    #[error("{function}:{block}: branch to block `{target}` of another function")]
    ForeignBranchTarget {
        function: String,
        block: String,
        target: String,
    },

    #[error("{function}:{block}: {detail}")]
    TypeMismatch {
        function: String,
        block: String,
        detail: String,
    },

    #[error("{function}:{block}: operand {value} does not dominate its use")]
    UseNotDominated {
        function: String,
        block: String,
        value: String,
    },

    #[error("{function}:{block}: alloca outside the entry block")]
    AllocaOutsideEntry { function: String, block: String },
}

/// Verification failure carrying every violation found
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("module `{module}` failed verification:{}", ViolationList(.violations))]
pub struct VerifyError {
    /// Module name
    pub module: String,
    /// Everything that was wrong, in discovery order
    pub violations: Vec<Violation>,
}

struct ViolationList<'a>(&'a [Violation]);

impl fmt::Display for ViolationList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for violation in self.0 {
            write!(f, "\n  - {}", violation)?;
        }
        Ok(())
    }
}

/// A module that passed [`verify_module`].
///
/// Dereferences to the underlying [`Module`]; the only mutation it allows is
/// the target stamp written by the emitter.
#[derive(Debug, Clone)]
pub struct VerifiedModule(Module);

impl VerifiedModule {
    /// Give up the verification guarantee and take the module back
    pub fn into_inner(self) -> Module {
        self.0
    }

    pub(crate) fn stamp_target(&mut self, triple: impl Into<String>, data_layout: impl Into<String>) {
        self.0.set_target(triple, data_layout);
    }
}

impl Deref for VerifiedModule {
    type Target = Module;

    fn deref(&self) -> &Module {
        &self.0
    }
}

/// Verify a module, consuming it
pub fn verify_module(module: Module) -> Result<VerifiedModule, VerifyError> {
    let violations = collect_violations(&module);
    if violations.is_empty() {
        log::debug!("module `{}` verified", module.name);
        Ok(VerifiedModule(module))
    } else {
        log::debug!(
            "module `{}` has {} violation(s)",
            module.name,
            violations.len()
        );
        Err(VerifyError {
            module: module.name.clone(),
            violations,
        })
    }
}

/// Run every check without consuming the module
pub fn collect_violations(module: &Module) -> Vec<Violation> {
    let mut violations = Vec::new();
    for (id, _) in module.functions() {
        FunctionVerifier::new(module, id, &mut violations).run();
    }
    violations
}

struct FunctionVerifier<'a> {
    module: &'a Module,
    func: FunctionId,
    dom: DominatorTree,
    violations: &'a mut Vec<Violation>,
}

impl<'a> FunctionVerifier<'a> {
    fn new(module: &'a Module, func: FunctionId, violations: &'a mut Vec<Violation>) -> Self {
        Self {
            module,
            func,
            dom: DominatorTree::compute(module, func),
            violations,
        }
    }

    fn function_name(&self) -> String {
        self.module.function(self.func).name.clone()
    }

    fn block_name(&self, block: BlockId) -> String {
        self.module.block(block).name.clone()
    }

    fn run(&mut self) {
        let module = self.module;
        let function = module.function(self.func);
        let Some(entry) = function.entry_block() else {
            self.violations.push(Violation::EmptyFunction {
                function: self.function_name(),
            });
            return;
        };

        for &block in &function.blocks {
            self.check_terminators(block);
            self.check_instructions(block, block == entry);
        }
    }

    fn check_terminators(&mut self, block: BlockId) {
        let data = self.module.block(block);
        if data.is_empty() {
            self.violations.push(Violation::EmptyBlock {
                function: self.function_name(),
                block: self.block_name(block),
            });
            return;
        }

        let last = data.len() - 1;
        let mut misplaced = false;
        for (index, (_, inst)) in self.module.block_instructions(block).enumerate() {
            if inst.kind.is_terminator() && index != last {
                misplaced = true;
            }
        }
        if misplaced {
            self.violations.push(Violation::TerminatorNotLast {
                function: self.function_name(),
                block: self.block_name(block),
            });
        }
        if !self.module.is_terminated(block) {
            self.violations.push(Violation::MissingTerminator {
                function: self.function_name(),
                block: self.block_name(block),
            });
        }
    }

    fn check_instructions(&mut self, block: BlockId, is_entry: bool) {
        let module = self.module;
        for (position, (_, inst)) in module.block_instructions(block).enumerate() {
            if matches!(inst.kind, InstKind::Alloca { .. }) && !is_entry {
                self.violations.push(Violation::AllocaOutsideEntry {
                    function: self.function_name(),
                    block: self.block_name(block),
                });
            }

            for target in inst.kind.successors() {
                if module.block(target).function != self.func {
                    self.violations.push(Violation::ForeignBranchTarget {
                        function: self.function_name(),
                        block: self.block_name(block),
                        target: self.block_name(target),
                    });
                }
            }

            for operand in inst.kind.operands() {
                self.check_dominance(operand, block, position);
            }

            if let Err(detail) = self.check_types(&inst.kind) {
                self.violations.push(Violation::TypeMismatch {
                    function: self.function_name(),
                    block: self.block_name(block),
                    detail,
                });
            }
        }
    }

    /// An instruction result must be defined earlier in the same block or in a
    /// block that dominates the use. Uses in unreachable blocks are exempt.
    fn check_dominance(&mut self, value: ValueId, use_block: BlockId, use_position: usize) {
        let ValueKind::Inst(def) = self.module.value(value).kind else {
            return;
        };
        if !self.dom.is_reachable(use_block) {
            return;
        }
        let def_block = self.module.instruction(def).block;
        let ok = if def_block == use_block {
            self.module
                .block(def_block)
                .position_of(def)
                .is_some_and(|def_position| def_position < use_position)
        } else {
            self.module.block(def_block).function == self.func
                && self.dom.dominates(def_block, use_block)
        };
        if !ok {
            self.violations.push(Violation::UseNotDominated {
                function: self.function_name(),
                block: self.block_name(use_block),
                value: value.to_string(),
            });
        }
    }

    /// Type of the memory a slot pointer refers to, when known
    fn slot_type(&self, slot: ValueId) -> Option<IrType> {
        let def = self.module.defining_instruction(slot)?;
        match self.module.instruction(def).kind {
            InstKind::Alloca { ty } => Some(ty),
            _ => None,
        }
    }

    fn expect(&self, value: ValueId, ty: IrType, role: &str) -> Result<(), String> {
        let actual = self.module.value_type(value);
        if actual == ty {
            Ok(())
        } else {
            Err(format!("{} {} has type {}, expected {}", role, value, actual, ty))
        }
    }

    fn check_types(&self, kind: &InstKind) -> Result<(), String> {
        match kind {
            InstKind::Alloca { ty } => match ty.size_bytes() {
                Some(_) => Ok(()),
                None => Err(format!("alloca of unsized type {}", ty)),
            },
            InstKind::Load { ty, slot } => {
                self.expect(*slot, IrType::Ptr, "load address")?;
                match self.slot_type(*slot) {
                    Some(slot_ty) if slot_ty != *ty => Err(format!(
                        "load of {} from a slot holding {}",
                        ty, slot_ty
                    )),
                    _ => Ok(()),
                }
            }
            InstKind::Store { value, slot } => {
                self.expect(*slot, IrType::Ptr, "store address")?;
                match self.slot_type(*slot) {
                    Some(slot_ty) => self.expect(*value, slot_ty, "stored value"),
                    None => Ok(()),
                }
            }
            InstKind::Binary { op, lhs, rhs } => {
                self.expect(*lhs, IrType::F32, op.mnemonic())?;
                self.expect(*rhs, IrType::F32, op.mnemonic())
            }
            InstKind::FCmp { lhs, rhs, .. } => {
                self.expect(*lhs, IrType::F32, "fcmp")?;
                self.expect(*rhs, IrType::F32, "fcmp")
            }
            InstKind::UIToFP { value, ty } => {
                self.expect(*value, IrType::I1, "uitofp operand")?;
                if ty.is_float() {
                    Ok(())
                } else {
                    Err(format!("uitofp to non-float type {}", ty))
                }
            }
            InstKind::Br { .. } => Ok(()),
            InstKind::CondBr { cond, .. } => self.expect(*cond, IrType::I1, "branch condition"),
            InstKind::Ret { value } => {
                let return_ty = self.module.function(self.func).return_ty;
                match value {
                    Some(value) => self.expect(*value, return_ty, "return value"),
                    None if return_ty == IrType::Void => Ok(()),
                    None => Err(format!("ret void in a function returning {}", return_ty)),
                }
            }
        }
    }
}
