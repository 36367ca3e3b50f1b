//! Pretty-printing for IR
//!
//! Provides human-readable, LLVM-flavoured output for debugging IR structures.
//! The text is for people; nothing parses it back.

use super::block::BlockId;
use super::function::FunctionId;
use super::instr::InstKind;
use super::module::Module;
use super::value::{ValueId, ValueKind};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt::{self, Write};

/// Trait for pretty-printing IR constructs
pub trait PrettyPrint {
    fn pretty_print(&self) -> String;
}

impl PrettyPrint for Module {
    fn pretty_print(&self) -> String {
        let mut output = String::new();
        // Writing into a String cannot fail
        let _ = write_module(self, &mut output);
        output
    }
}

/// A function viewed through its owning module
pub struct FunctionView<'m> {
    pub module: &'m Module,
    pub function: FunctionId,
}

impl PrettyPrint for FunctionView<'_> {
    fn pretty_print(&self) -> String {
        let mut output = String::new();
        let names = ValueNames::for_function(self.module, self.function);
        let _ = write_function(self.module, self.function, &names, &mut output);
        output
    }
}

/// A block viewed through its owning module
pub struct BlockView<'m> {
    pub module: &'m Module,
    pub block: BlockId,
}

impl PrettyPrint for BlockView<'_> {
    fn pretty_print(&self) -> String {
        let mut output = String::new();
        let func = self.module.block(self.block).function;
        let names = ValueNames::for_function(self.module, func);
        let _ = write_block(self.module, self.block, &names, &mut output);
        output
    }
}

impl Module {
    /// Pretty-print one function of this module
    pub fn display_function(&self, function: FunctionId) -> FunctionView<'_> {
        FunctionView {
            module: self,
            function,
        }
    }

    /// Pretty-print one block of this module
    pub fn display_block(&self, block: BlockId) -> BlockView<'_> {
        BlockView {
            module: self,
            block,
        }
    }
}

/// Printable names for instruction results, unique within a function
struct ValueNames {
    names: FxHashMap<ValueId, String>,
}

impl ValueNames {
    fn for_function(module: &Module, func: FunctionId) -> Self {
        let mut names = FxHashMap::default();
        // Next suffix to try per hint, and every name handed out so far
        let mut suffixes: FxHashMap<String, u32> = FxHashMap::default();
        let mut taken: FxHashSet<String> = FxHashSet::default();
        let mut anonymous = 0u32;

        for &block in &module.function(func).blocks {
            for (_, inst) in module.block_instructions(block) {
                let Some(result) = inst.result else { continue };
                let name = match &inst.name {
                    Some(hint) => {
                        let suffix = suffixes.entry(hint.clone()).or_insert(0);
                        loop {
                            let candidate = if *suffix == 0 {
                                hint.clone()
                            } else {
                                format!("{}{}", hint, suffix)
                            };
                            *suffix += 1;
                            if !taken.contains(&candidate) {
                                break candidate;
                            }
                        }
                    }
                    None => loop {
                        let candidate = anonymous.to_string();
                        anonymous += 1;
                        if !taken.contains(&candidate) {
                            break candidate;
                        }
                    },
                };
                taken.insert(name.clone());
                names.insert(result, name);
            }
        }

        Self { names }
    }

    fn operand(&self, module: &Module, value: ValueId) -> String {
        match module.value(value).kind {
            ValueKind::ConstF32(v) => format!("{:?}", v),
            ValueKind::Undef => "undef".to_string(),
            ValueKind::Inst(_) => match self.names.get(&value) {
                Some(name) => format!("%{}", name),
                None => value.to_string(),
            },
        }
    }

    fn typed(&self, module: &Module, value: ValueId) -> String {
        format!("{} {}", module.value_type(value), self.operand(module, value))
    }
}

fn write_module(module: &Module, output: &mut String) -> fmt::Result {
    writeln!(output, "; module {}", module.name)?;
    if let Some(target) = module.target() {
        writeln!(output, "; target triple = \"{}\"", target.triple)?;
        writeln!(output, "; target datalayout = \"{}\"", target.data_layout)?;
    }
    writeln!(output)?;

    for (id, _) in module.functions() {
        let names = ValueNames::for_function(module, id);
        write_function(module, id, &names, output)?;
        writeln!(output)?;
    }
    Ok(())
}

fn write_function(
    module: &Module,
    func: FunctionId,
    names: &ValueNames,
    output: &mut String,
) -> fmt::Result {
    let function = module.function(func);
    let params: Vec<String> = function.params.iter().map(|p| p.to_string()).collect();
    writeln!(
        output,
        "define {} @{}({}) {{",
        function.return_ty,
        function.name,
        params.join(", ")
    )?;

    for (i, &block) in function.blocks.iter().enumerate() {
        if i > 0 {
            writeln!(output)?;
        }
        write_block(module, block, names, output)?;
    }

    writeln!(output, "}}")
}

fn write_block(
    module: &Module,
    block: BlockId,
    names: &ValueNames,
    output: &mut String,
) -> fmt::Result {
    writeln!(output, "{}:", module.block(block).name)?;
    for (_, inst) in module.block_instructions(block) {
        write!(output, "  ")?;
        if let Some(result) = inst.result {
            write!(output, "{} = ", names.operand(module, result))?;
        }
        write_kind(module, &inst.kind, names, output)?;
        writeln!(output)?;
    }
    Ok(())
}

fn write_kind(
    module: &Module,
    kind: &InstKind,
    names: &ValueNames,
    output: &mut String,
) -> fmt::Result {
    let label = |block: BlockId| format!("label %{}", module.block(block).name);
    match kind {
        InstKind::Alloca { ty } => write!(output, "alloca {}", ty),
        InstKind::Load { ty, slot } => {
            write!(output, "load {}, {}", ty, names.typed(module, *slot))
        }
        InstKind::Store { value, slot } => write!(
            output,
            "store {}, {}",
            names.typed(module, *value),
            names.typed(module, *slot)
        ),
        InstKind::Binary { op, lhs, rhs } => write!(
            output,
            "{} {}, {}",
            op.mnemonic(),
            names.typed(module, *lhs),
            names.operand(module, *rhs)
        ),
        InstKind::FCmp { pred, lhs, rhs } => write!(
            output,
            "fcmp {} {}, {}",
            pred.mnemonic(),
            names.typed(module, *lhs),
            names.operand(module, *rhs)
        ),
        InstKind::UIToFP { value, ty } => {
            write!(output, "uitofp {} to {}", names.typed(module, *value), ty)
        }
        InstKind::Br { dest } => write!(output, "br {}", label(*dest)),
        InstKind::CondBr {
            cond,
            then_dest,
            else_dest,
        } => write!(
            output,
            "br {}, {}, {}",
            names.typed(module, *cond),
            label(*then_dest),
            label(*else_dest)
        ),
        InstKind::Ret { value: Some(value) } => {
            write!(output, "ret {}", names.typed(module, *value))
        }
        InstKind::Ret { value: None } => write!(output, "ret void"),
    }
}
