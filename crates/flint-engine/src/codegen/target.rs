//! Target selection
//!
//! [`TargetDescriptor`] is plain data describing what to compile for;
//! [`TargetMachine`] is the configured Cranelift ISA built from it.

use super::{CodegenError, CodegenOptions};
use cranelift_codegen::isa::{self, OwnedTargetIsa, TargetIsa};
use cranelift_codegen::settings::{self, Configurable};
use std::fmt;
use std::str::FromStr;
use target_lexicon::{BinaryFormat, Endianness, OperatingSystem, Triple};

/// CPU name selecting the host's own features
pub const NATIVE_CPU: &str = "native";
/// CPU name selecting the baseline of the architecture
pub const GENERIC_CPU: &str = "generic";

/// What to generate code for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    /// Target triple, e.g. `x86_64-unknown-linux-gnu`
    pub triple: String,
    /// `native`, `generic`, or a Cranelift CPU preset such as `skylake`
    pub cpu: String,
    /// Feature toggles, `+name` to enable and `-name` to disable
    pub features: Vec<String>,
}

impl TargetDescriptor {
    pub fn new(triple: impl Into<String>, cpu: impl Into<String>, features: Vec<String>) -> Self {
        Self {
            triple: triple.into(),
            cpu: cpu.into(),
            features,
        }
    }

    /// The machine this process runs on
    pub fn host() -> Self {
        Self::new(Triple::host().to_string(), NATIVE_CPU, Vec::new())
    }

    /// Split a comma-separated feature list (`+avx2,-sse4.1`)
    pub fn parse_features(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Symbol mangling scheme of the object format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mangling {
    Elf,
    MachO,
    WinCoff,
    WinCoffX86,
}

impl Mangling {
    fn code(self) -> char {
        match self {
            Mangling::Elf => 'e',
            Mangling::MachO => 'o',
            Mangling::WinCoff => 'w',
            Mangling::WinCoffX86 => 'x',
        }
    }
}

/// Memory layout facts of a target, rendered in the familiar
/// `e-m:e-p:64:64-f32:32:32-S128` form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataLayout {
    pub big_endian: bool,
    pub mangling: Mangling,
    pub pointer_bits: u8,
    pub f32_align_bits: u32,
    pub stack_align_bits: u32,
}

impl fmt::Display for DataLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-m:{}-p:{}:{}-f32:{}:{}-S{}",
            if self.big_endian { 'E' } else { 'e' },
            self.mangling.code(),
            self.pointer_bits,
            self.pointer_bits,
            self.f32_align_bits,
            self.f32_align_bits,
            self.stack_align_bits
        )
    }
}

/// A configured Cranelift ISA
pub struct TargetMachine {
    isa: OwnedTargetIsa,
    descriptor: TargetDescriptor,
}

impl TargetMachine {
    /// Build the ISA for `descriptor` with `options` applied
    pub fn new(descriptor: &TargetDescriptor, options: &CodegenOptions) -> Result<Self, CodegenError> {
        let triple = Triple::from_str(&descriptor.triple).map_err(|e| {
            CodegenError::UnsupportedTarget {
                target: descriptor.triple.clone(),
                detail: e.to_string(),
            }
        })?;

        let mut isa_builder = if descriptor.cpu == NATIVE_CPU {
            if triple != Triple::host() {
                return Err(CodegenError::UnsupportedTarget {
                    target: descriptor.triple.clone(),
                    detail: format!("cpu `{}` requires the host triple {}", NATIVE_CPU, Triple::host()),
                });
            }
            cranelift_native::builder().map_err(|e| CodegenError::UnsupportedTarget {
                target: descriptor.triple.clone(),
                detail: e.to_string(),
            })?
        } else {
            isa::lookup(triple).map_err(|e| CodegenError::UnsupportedTarget {
                target: descriptor.triple.clone(),
                detail: e.to_string(),
            })?
        };

        if !descriptor.cpu.is_empty() && descriptor.cpu != NATIVE_CPU && descriptor.cpu != GENERIC_CPU {
            isa_builder.enable(&descriptor.cpu).map_err(|e| CodegenError::Isa {
                detail: format!("unknown cpu `{}`: {}", descriptor.cpu, e),
            })?;
        }

        for feature in &descriptor.features {
            apply_feature(&mut isa_builder, feature)?;
        }

        let mut flag_builder = settings::builder();
        flag_builder
            .set("opt_level", options.opt_level.as_setting())
            .map_err(|e| CodegenError::Isa {
                detail: format!("Failed to set opt_level: {}", e),
            })?;
        flag_builder
            .set("is_pic", if options.pic { "true" } else { "false" })
            .map_err(|e| CodegenError::Isa {
                detail: format!("Failed to set is_pic: {}", e),
            })?;

        let isa = isa_builder
            .finish(settings::Flags::new(flag_builder))
            .map_err(|e| CodegenError::Isa {
                detail: format!("Failed to finish ISA: {}", e),
            })?;

        log::debug!(
            "target machine {} (cpu {}, opt_level {}, pic {})",
            isa.triple(),
            descriptor.cpu,
            options.opt_level.as_setting(),
            options.pic
        );
        Ok(Self {
            isa,
            descriptor: descriptor.clone(),
        })
    }

    pub fn isa(&self) -> &dyn TargetIsa {
        &*self.isa
    }

    pub(crate) fn owned_isa(&self) -> OwnedTargetIsa {
        self.isa.clone()
    }

    pub fn descriptor(&self) -> &TargetDescriptor {
        &self.descriptor
    }

    /// Canonical triple of the ISA
    pub fn triple(&self) -> String {
        self.isa.triple().to_string()
    }

    pub fn data_layout(&self) -> DataLayout {
        let triple = self.isa.triple();
        let big_endian = matches!(triple.endianness(), Ok(Endianness::Big));
        let pointer_bits = self.isa.pointer_bits();
        let mangling = match triple.binary_format {
            BinaryFormat::Macho => Mangling::MachO,
            BinaryFormat::Coff if pointer_bits == 32 => Mangling::WinCoffX86,
            BinaryFormat::Coff => Mangling::WinCoff,
            _ if triple.operating_system == OperatingSystem::Windows => Mangling::WinCoff,
            _ => Mangling::Elf,
        };
        DataLayout {
            big_endian,
            mangling,
            pointer_bits,
            f32_align_bits: 32,
            stack_align_bits: 128,
        }
    }
}

/// Apply one `+feature`/`-feature` toggle.
///
/// Names map onto Cranelift's `has_*` settings with dots dropped, so `+sse4.1`
/// sets `has_sse41`.
fn apply_feature(builder: &mut isa::Builder, feature: &str) -> Result<(), CodegenError> {
    let (enable, name) = match feature.split_at_checked(1) {
        Some(("+", name)) => (true, name),
        Some(("-", name)) => (false, name),
        _ => (true, feature),
    };
    let setting = if name.starts_with("has_") {
        name.to_string()
    } else {
        format!("has_{}", name.replace('.', ""))
    };

    let result = if enable {
        builder.enable(&setting)
    } else {
        builder.set(&setting, "false")
    };
    result.map_err(|e| CodegenError::Isa {
        detail: format!("feature `{}`: {}", feature, e),
    })
}
