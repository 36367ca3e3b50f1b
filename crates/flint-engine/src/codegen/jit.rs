//! In-process execution through `cranelift_jit`

use super::lowering::compile_into_module;
use super::target::{TargetDescriptor, TargetMachine};
use super::{CodegenError, CodegenOptions};
use crate::ir::IrType;
use crate::verify::VerifiedModule;
use cranelift_jit::{JITBuilder, JITModule};

/// Compile `module` for the host and call `function`, returning its result.
///
/// Only `fn() -> f32` entry points can be called. `options.pic` is ignored;
/// JIT code is always non-PIC.
pub fn run_jit(
    module: &VerifiedModule,
    function: &str,
    options: &CodegenOptions,
) -> Result<f32, CodegenError> {
    let entry = module
        .function_by_name(function)
        .ok_or_else(|| CodegenError::UnknownFunction {
            function: function.to_string(),
        })?;
    if !entry.params.is_empty() || entry.return_ty != IrType::F32 {
        return Err(CodegenError::Lowering {
            function: function.to_string(),
            detail: "JIT entry point must have signature fn() -> f32".to_string(),
        });
    }

    let options = CodegenOptions {
        pic: false,
        ..*options
    };
    let target = TargetMachine::new(&TargetDescriptor::host(), &options)?;

    let builder = JITBuilder::with_isa(target.owned_isa(), cranelift_module::default_libcall_names());
    let mut jit_module = JITModule::new(builder);
    let func_ids = compile_into_module(&mut jit_module, module)?;
    jit_module
        .finalize_definitions()
        .map_err(|detail| CodegenError::Module {
            detail: detail.to_string(),
        })?;

    let func_id = func_ids
        .get(function)
        .copied()
        .ok_or_else(|| CodegenError::UnknownFunction {
            function: function.to_string(),
        })?;
    let code = jit_module.get_finalized_function(func_id);

    // SAFETY: the signature was checked above to be `fn() -> f32`, which the
    // backend declared with the host's default calling convention, and the
    // code stays mapped while `jit_module` is alive.
    let result = unsafe {
        let entry_fn = std::mem::transmute::<*const u8, extern "C" fn() -> f32>(code);
        entry_fn()
    };
    log::debug!("jit `{}` returned {}", function, result);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demos::{Demo, DEMO_FUNCTION};
    use crate::verify::verify_module;

    #[test]
    fn test_jit_arith() {
        let (module, _) = Demo::Arith.build();
        let verified = verify_module(module).unwrap();
        let result = run_jit(&verified, DEMO_FUNCTION, &CodegenOptions::default()).unwrap();
        assert_eq!(result, 16.0);
    }

    #[test]
    fn test_jit_unknown_function() {
        let (module, _) = Demo::Arith.build();
        let verified = verify_module(module).unwrap();
        assert!(matches!(
            run_jit(&verified, "bar", &CodegenOptions::default()),
            Err(CodegenError::UnknownFunction { .. })
        ));
    }
}
