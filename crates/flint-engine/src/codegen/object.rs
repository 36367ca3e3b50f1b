//! Object file emission

use super::lowering::compile_into_module;
use super::target::TargetMachine;
use super::CodegenError;
use crate::verify::VerifiedModule;
use cranelift_object::{ObjectBuilder, ObjectModule};
use std::path::Path;

/// Stamp `module` with the target and serialize it as a relocatable object.
///
/// Output is deterministic for a given module and target.
pub fn emit_object(module: &mut VerifiedModule, target: &TargetMachine) -> Result<Vec<u8>, CodegenError> {
    module.stamp_target(target.triple(), target.data_layout().to_string());

    let builder = ObjectBuilder::new(
        target.owned_isa(),
        module.name.as_str(),
        cranelift_module::default_libcall_names(),
    )
    .map_err(|detail| CodegenError::Module {
        detail: detail.to_string(),
    })?;
    let mut object_module = ObjectModule::new(builder);
    compile_into_module(&mut object_module, module)?;

    let product = object_module.finish();
    product.emit().map_err(|detail| CodegenError::ObjectEmit {
        detail: detail.to_string(),
    })
}

/// Emit `module` for `target` and write the object to `path`
pub fn generate_obj_file(
    path: impl AsRef<Path>,
    module: &mut VerifiedModule,
    target: &TargetMachine,
) -> Result<(), CodegenError> {
    let path = path.as_ref();
    let bytes = emit_object(module, target)?;
    std::fs::write(path, &bytes).map_err(|source| CodegenError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!(
        "wrote {} ({} bytes, {})",
        path.display(),
        bytes.len(),
        target.triple()
    );
    Ok(())
}
