//! IR types
//!
//! Flint programs compute with a single scalar float. Comparisons produce a
//! one-bit boolean and variable slots are pointers, so the type set stays tiny.

/// IR value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrType {
    /// 32-bit IEEE float, the only scalar type
    F32,
    /// One-bit boolean produced by float comparisons
    I1,
    /// Address of a stack slot
    Ptr,
    /// No value
    Void,
}

impl IrType {
    /// Whether this is the scalar float type
    pub fn is_float(&self) -> bool {
        matches!(self, IrType::F32)
    }

    /// Storage size in bytes (`None` for `Void`)
    pub fn size_bytes(&self) -> Option<u32> {
        match self {
            IrType::F32 => Some(4),
            IrType::I1 => Some(1),
            IrType::Ptr => Some(8),
            IrType::Void => None,
        }
    }
}

impl std::fmt::Display for IrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IrType::F32 => write!(f, "f32"),
            IrType::I1 => write!(f, "i1"),
            IrType::Ptr => write!(f, "ptr"),
            IrType::Void => write!(f, "void"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_display() {
        assert_eq!(IrType::F32.to_string(), "f32");
        assert_eq!(IrType::I1.to_string(), "i1");
        assert_eq!(IrType::Ptr.to_string(), "ptr");
    }

    #[test]
    fn test_type_sizes() {
        assert_eq!(IrType::F32.size_bytes(), Some(4));
        assert_eq!(IrType::Void.size_bytes(), None);
        assert!(IrType::F32.is_float());
        assert!(!IrType::I1.is_float());
    }
}
