//! Subcommand implementations

use anyhow::{bail, Context, Result};
use flint_engine::codegen::target::GENERIC_CPU;
use flint_engine::demos::DEMO_FUNCTION;
use flint_engine::{
    evaluate, generate_obj_file, verify_module, CodegenOptions, Demo, OptLevel, PrettyPrint,
    TargetDescriptor, TargetMachine, VerifiedModule,
};
use std::path::PathBuf;

/// Lower `demo` and verify the result; lowering diagnostics are fatal here
fn build_verified(demo: Demo) -> Result<VerifiedModule> {
    let (module, lowered) = demo.build();
    if lowered.has_errors() {
        bail!(
            "lowering `{}` produced {} error(s): {}",
            demo,
            lowered.diagnostics.len(),
            lowered
                .diagnostics
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        );
    }
    verify_module(module).with_context(|| format!("verifying demo `{}`", demo))
}

pub fn print(demo: Demo) -> Result<()> {
    let module = build_verified(demo)?;
    print!("{}", module.pretty_print());
    Ok(())
}

pub fn run(demo: Demo, jit: bool) -> Result<()> {
    let module = build_verified(demo)?;
    let result = if jit {
        run_native(&module)?
    } else {
        evaluate(&module, DEMO_FUNCTION).context("interpreting")?
    };
    println!("{}", result);
    Ok(())
}

#[cfg(feature = "jit")]
fn run_native(module: &VerifiedModule) -> Result<f32> {
    flint_engine::run_jit(module, DEMO_FUNCTION, &CodegenOptions::default()).context("JIT execution")
}

#[cfg(not(feature = "jit"))]
fn run_native(_module: &VerifiedModule) -> Result<f32> {
    bail!("flint was built without the `jit` feature")
}

pub struct EmitArgs {
    pub demo: Demo,
    pub output: PathBuf,
    pub triple: Option<String>,
    pub cpu: Option<String>,
    pub features: String,
    pub opt_level: OptLevel,
}

/// Host by default; an explicit triple switches the CPU default to `generic`
fn descriptor_for(args: &EmitArgs) -> TargetDescriptor {
    let mut descriptor = TargetDescriptor::host();
    if let Some(triple) = &args.triple {
        descriptor.triple = triple.clone();
        descriptor.cpu = GENERIC_CPU.to_string();
    }
    if let Some(cpu) = &args.cpu {
        descriptor.cpu = cpu.clone();
    }
    descriptor.features = TargetDescriptor::parse_features(&args.features);
    descriptor
}

pub fn emit(args: EmitArgs) -> Result<()> {
    let mut module = build_verified(args.demo)?;
    let descriptor = descriptor_for(&args);
    log::debug!("emitting `{}` for {:?}", args.demo, descriptor);
    let options = CodegenOptions {
        opt_level: args.opt_level,
        ..CodegenOptions::default()
    };
    let target = TargetMachine::new(&descriptor, &options)
        .with_context(|| format!("configuring target `{}`", descriptor.triple))?;

    generate_obj_file(&args.output, &mut module, &target)
        .with_context(|| format!("emitting `{}`", args.demo))?;
    println!("{}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(triple: Option<&str>, cpu: Option<&str>) -> EmitArgs {
        EmitArgs {
            demo: Demo::Arith,
            output: PathBuf::from("foo.o"),
            triple: triple.map(str::to_string),
            cpu: cpu.map(str::to_string),
            features: "+avx2".to_string(),
            opt_level: OptLevel::Speed,
        }
    }

    #[test]
    fn test_descriptor_defaults_to_host() {
        let descriptor = descriptor_for(&args(None, None));
        assert_eq!(descriptor.triple, TargetDescriptor::host().triple);
        assert_eq!(descriptor.cpu, "native");
        assert_eq!(descriptor.features, vec!["+avx2".to_string()]);
    }

    #[test]
    fn test_descriptor_explicit_triple() {
        let descriptor = descriptor_for(&args(Some("x86_64-unknown-linux-gnu"), None));
        assert_eq!(descriptor.cpu, GENERIC_CPU);

        let descriptor = descriptor_for(&args(Some("x86_64-unknown-linux-gnu"), Some("skylake")));
        assert_eq!(descriptor.cpu, "skylake");
    }

    #[test]
    fn test_build_verified_demos() {
        for demo in Demo::ALL {
            assert!(build_verified(demo).is_ok());
        }
    }
}
