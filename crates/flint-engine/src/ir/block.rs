//! Basic Blocks
//!
//! Basic blocks are ordered instruction lists with a single entry point and a
//! single exit (the terminator, always the last instruction once the block is
//! finished).

use super::function::FunctionId;
use super::instr::InstId;

/// Basic block identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl BlockId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// A basic block
#[derive(Debug, Clone)]
pub struct BasicBlock {
    /// Unique identifier for this block
    pub id: BlockId,
    /// Name, unique within the owning function (diagnostics only)
    pub name: String,
    /// Owning function
    pub function: FunctionId,
    /// Instructions in order, terminator last
    pub instructions: Vec<InstId>,
}

impl BasicBlock {
    /// Create a new empty basic block
    pub fn new(id: BlockId, name: impl Into<String>, function: FunctionId) -> Self {
        Self {
            id,
            name: name.into(),
            function,
            instructions: Vec::new(),
        }
    }

    /// First instruction, if any
    pub fn first_instruction(&self) -> Option<InstId> {
        self.instructions.first().copied()
    }

    /// Last instruction, if any
    pub fn last_instruction(&self) -> Option<InstId> {
        self.instructions.last().copied()
    }

    /// Position of `inst` within this block
    pub fn position_of(&self, inst: InstId) -> Option<usize> {
        self.instructions.iter().position(|&i| i == inst)
    }

    /// Get the number of instructions (including the terminator)
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Check if this block has no instructions
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_block_new() {
        let block = BasicBlock::new(BlockId(0), "entry", FunctionId(0));
        assert_eq!(block.id, BlockId(0));
        assert_eq!(block.name, "entry");
        assert!(block.is_empty());
        assert_eq!(block.first_instruction(), None);
    }

    #[test]
    fn test_block_positions() {
        let mut block = BasicBlock::new(BlockId(3), "then", FunctionId(0));
        block.instructions.push(InstId(7));
        block.instructions.push(InstId(2));

        assert_eq!(block.first_instruction(), Some(InstId(7)));
        assert_eq!(block.last_instruction(), Some(InstId(2)));
        assert_eq!(block.position_of(InstId(2)), Some(1));
        assert_eq!(block.position_of(InstId(9)), None);
        assert_eq!(format!("{}", block.id), "bb3");
    }
}
