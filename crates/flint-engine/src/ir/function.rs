//! IR Functions
//!
//! A function is an ordered list of basic blocks; the first one is the entry.

use super::block::BlockId;
use super::types::IrType;
use rustc_hash::FxHashMap;

/// Function identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub u32);

impl std::fmt::Display for FunctionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fn{}", self.0)
    }
}

/// An IR function
#[derive(Debug, Clone)]
pub struct Function {
    /// Function (symbol) name
    pub name: String,
    /// Parameter types (always empty in Flint programs)
    pub params: Vec<IrType>,
    /// Return type
    pub return_ty: IrType,
    /// Basic blocks in layout order
    pub blocks: Vec<BlockId>,
    /// How many blocks already claimed each base name
    block_names: FxHashMap<String, u32>,
}

impl Function {
    /// Create a new function with no blocks
    pub fn new(name: impl Into<String>, params: Vec<IrType>, return_ty: IrType) -> Self {
        Self {
            name: name.into(),
            params,
            return_ty,
            blocks: Vec::new(),
            block_names: FxHashMap::default(),
        }
    }

    /// Get the entry block
    pub fn entry_block(&self) -> Option<BlockId> {
        self.blocks.first().copied()
    }

    /// Get the number of blocks
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Check if this function has any blocks
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Claim a block name, suffixing a counter when `base` is taken
    /// (`then`, `then1`, `then2`, ...).
    pub(crate) fn unique_block_name(&mut self, base: &str) -> String {
        let count = self.block_names.entry(base.to_string()).or_insert(0);
        let name = if *count == 0 {
            base.to_string()
        } else {
            format!("{}{}", base, count)
        };
        *count += 1;
        name
    }
}
