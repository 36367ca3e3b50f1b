//! IR → Cranelift IR lowering
//!
//! Translates verified Flint IR into Cranelift functions inside any
//! `cranelift_module::Module`, so the object emitter and the JIT share one
//! lowering path. Slots become explicit stack slots, `i1` values are carried as
//! Cranelift `i8`, and undefined floats materialize as `0.0`.

use cranelift_codegen::ir::{
    self, condcodes::FloatCC, types, AbiParam, InstBuilder, StackSlotData, StackSlotKind,
    UserFuncName,
};
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_module::{FuncId, Linkage, Module as ClifModule};
use rustc_hash::FxHashMap;

use super::CodegenError;
use crate::ir::cfg::reverse_postorder;
use crate::ir::{
    BlockId, FloatBinOp, FloatPredicate, FunctionId, InstKind, IrType, Module, ValueId, ValueKind,
};
use crate::verify::VerifiedModule;

/// Cranelift type carrying values of `ty`
fn clif_type(ty: IrType, pointer: types::Type) -> Option<types::Type> {
    match ty {
        IrType::F32 => Some(types::F32),
        IrType::I1 => Some(types::I8),
        IrType::Ptr => Some(pointer),
        IrType::Void => None,
    }
}

/// Signature of a Flint function: no parameters, at most one return value
fn signature_for<M: ClifModule>(module: &M, ir: &Module, func: FunctionId) -> ir::Signature {
    let mut sig = module.make_signature();
    let pointer = module.target_config().pointer_type();
    for &param in &ir.function(func).params {
        if let Some(ty) = clif_type(param, pointer) {
            sig.params.push(AbiParam::new(ty));
        }
    }
    if let Some(ty) = clif_type(ir.function(func).return_ty, pointer) {
        sig.returns.push(AbiParam::new(ty));
    }
    sig
}

/// Declare and define every function of `ir` in `module` (exported).
///
/// Returns the Cranelift function ids by name.
pub fn compile_into_module<M: ClifModule>(
    module: &mut M,
    ir: &VerifiedModule,
) -> Result<FxHashMap<String, FuncId>, CodegenError> {
    let mut func_ids = FxHashMap::default();
    for (id, function) in ir.functions() {
        let sig = signature_for(&*module, ir, id);
        let func_id = module
            .declare_function(&function.name, Linkage::Export, &sig)
            .map_err(|detail| CodegenError::Module {
                detail: detail.to_string(),
            })?;
        func_ids.insert(function.name.clone(), func_id);
    }

    let mut context = module.make_context();
    let mut builder_context = FunctionBuilderContext::new();
    for (id, function) in ir.functions() {
        let func_id = func_ids[&function.name];
        context.func.signature = signature_for(&*module, ir, id);
        context.func.name = UserFuncName::user(0, func_id.as_u32());

        {
            let builder = FunctionBuilder::new(&mut context.func, &mut builder_context);
            let pointer = module.target_config().pointer_type();
            FunctionTranslator::new(ir, id, pointer).translate(builder)?;
        }
        log::trace!("cranelift IR for `{}`:\n{}", function.name, context.func.display());

        module
            .define_function(func_id, &mut context)
            .map_err(|detail| CodegenError::Module {
                detail: format!("{detail:?}"),
            })?;
        module.clear_context(&mut context);
    }

    Ok(func_ids)
}

/// Lowering state for one function
struct FunctionTranslator<'a> {
    ir: &'a Module,
    func: FunctionId,
    pointer: types::Type,
    block_map: FxHashMap<BlockId, ir::Block>,
    values: FxHashMap<ValueId, ir::Value>,
    slots: FxHashMap<ValueId, ir::StackSlot>,
}

impl<'a> FunctionTranslator<'a> {
    fn new(ir: &'a Module, func: FunctionId, pointer: types::Type) -> Self {
        Self {
            ir,
            func,
            pointer,
            block_map: FxHashMap::default(),
            values: FxHashMap::default(),
            slots: FxHashMap::default(),
        }
    }

    fn error(&self, detail: impl Into<String>) -> CodegenError {
        CodegenError::Lowering {
            function: self.ir.function(self.func).name.clone(),
            detail: detail.into(),
        }
    }

    /// Lower all reachable blocks in reverse postorder, so every definition is
    /// visited before its uses. Unreachable blocks are dropped.
    fn translate(mut self, mut builder: FunctionBuilder<'_>) -> Result<(), CodegenError> {
        let order = reverse_postorder(self.ir, self.func);
        if order.is_empty() {
            return Err(self.error("function has no blocks"));
        }
        for &block in &order {
            self.block_map.insert(block, builder.create_block());
        }

        let entry = self.block_map[&order[0]];
        builder.append_block_params_for_function_params(entry);

        let ir = self.ir;
        for &block in &order {
            builder.switch_to_block(self.block_map[&block]);
            for (_, inst) in ir.block_instructions(block) {
                self.translate_instruction(&mut builder, &inst.kind, inst.result)?;
            }
        }

        builder.seal_all_blocks();
        builder.finalize();
        Ok(())
    }

    fn translate_instruction(
        &mut self,
        builder: &mut FunctionBuilder<'_>,
        kind: &InstKind,
        result: Option<ValueId>,
    ) -> Result<(), CodegenError> {
        let produced = match kind {
            InstKind::Alloca { ty } => {
                let size = ty
                    .size_bytes()
                    .ok_or_else(|| self.error(format!("alloca of {}", ty)))?;
                // align_shift is log2 of the alignment
                let align_shift = size.trailing_zeros() as u8;
                let slot = builder.create_sized_stack_slot(StackSlotData::new(
                    StackSlotKind::ExplicitSlot,
                    size,
                    align_shift,
                ));
                if let Some(result) = result {
                    self.slots.insert(result, slot);
                }
                None
            }
            InstKind::Load { ty, slot } => {
                let slot = self.slot(*slot)?;
                let ty = clif_type(*ty, self.pointer)
                    .ok_or_else(|| self.error("load of void"))?;
                Some(builder.ins().stack_load(ty, slot, 0))
            }
            InstKind::Store { value, slot } => {
                let slot = self.slot(*slot)?;
                let value = self.operand(builder, *value)?;
                builder.ins().stack_store(value, slot, 0);
                None
            }
            InstKind::Binary { op, lhs, rhs } => {
                let l = self.operand(builder, *lhs)?;
                let r = self.operand(builder, *rhs)?;
                Some(match op {
                    FloatBinOp::Add => builder.ins().fadd(l, r),
                    FloatBinOp::Sub => builder.ins().fsub(l, r),
                    FloatBinOp::Mul => builder.ins().fmul(l, r),
                    FloatBinOp::Div => builder.ins().fdiv(l, r),
                })
            }
            InstKind::FCmp { pred, lhs, rhs } => {
                let l = self.operand(builder, *lhs)?;
                let r = self.operand(builder, *rhs)?;
                let cc = match pred {
                    FloatPredicate::Ult => FloatCC::UnorderedOrLessThan,
                    FloatPredicate::One => FloatCC::OrderedNotEqual,
                };
                Some(builder.ins().fcmp(cc, l, r))
            }
            InstKind::UIToFP { value, .. } => {
                let bit = self.operand(builder, *value)?;
                let wide = builder.ins().uextend(types::I32, bit);
                Some(builder.ins().fcvt_from_uint(types::F32, wide))
            }
            InstKind::Br { dest } => {
                let dest = self.block(*dest)?;
                builder.ins().jump(dest, &[]);
                None
            }
            InstKind::CondBr {
                cond,
                then_dest,
                else_dest,
            } => {
                let cond = self.operand(builder, *cond)?;
                let then_block = self.block(*then_dest)?;
                let else_block = self.block(*else_dest)?;
                builder.ins().brif(cond, then_block, &[], else_block, &[]);
                None
            }
            InstKind::Ret { value } => {
                match value {
                    Some(value) => {
                        let value = self.operand(builder, *value)?;
                        builder.ins().return_(&[value]);
                    }
                    None => {
                        builder.ins().return_(&[]);
                    }
                }
                None
            }
        };

        if let (Some(result), Some(value)) = (result, produced) {
            self.values.insert(result, value);
        }
        Ok(())
    }

    fn operand(
        &self,
        builder: &mut FunctionBuilder<'_>,
        value: ValueId,
    ) -> Result<ir::Value, CodegenError> {
        let ty = self.ir.value_type(value);
        match self.ir.value(value).kind {
            ValueKind::ConstF32(v) => Ok(builder.ins().f32const(v)),
            ValueKind::Undef => match ty {
                IrType::F32 => Ok(builder.ins().f32const(0.0)),
                IrType::I1 => Ok(builder.ins().iconst(types::I8, 0)),
                other => Err(self.error(format!("undefined {} operand", other))),
            },
            ValueKind::Inst(_) => self
                .values
                .get(&value)
                .copied()
                .ok_or_else(|| self.error(format!("{} used before definition", value))),
        }
    }

    fn slot(&self, value: ValueId) -> Result<ir::StackSlot, CodegenError> {
        self.slots
            .get(&value)
            .copied()
            .ok_or_else(|| self.error(format!("{} is not a stack slot", value)))
    }

    fn block(&self, block: BlockId) -> Result<ir::Block, CodegenError> {
        self.block_map
            .get(&block)
            .copied()
            .ok_or_else(|| self.error(format!("branch to unknown block {}", block)))
    }
}
