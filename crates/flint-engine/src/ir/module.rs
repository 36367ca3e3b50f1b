//! IR Module
//!
//! Top-level owner of all functions, blocks, instructions and values. Handles
//! handed out by the module are indices into its arenas.

use super::block::{BasicBlock, BlockId};
use super::function::{Function, FunctionId};
use super::instr::{InstId, InstKind, Instruction};
use super::types::IrType;
use super::value::{ValueData, ValueId, ValueKind};
use rustc_hash::FxHashMap;

/// Target information stamped onto a module by the emitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetStamp {
    /// Target triple, e.g. `x86_64-unknown-linux-gnu`
    pub triple: String,
    /// Data layout string derived from the target machine
    pub data_layout: String,
}

/// An IR module (compilation unit)
#[derive(Debug, Clone)]
pub struct Module {
    /// Module name
    pub name: String,
    functions: Vec<Function>,
    blocks: Vec<BasicBlock>,
    instructions: Vec<Instruction>,
    values: Vec<ValueData>,
    /// Function lookup by name
    function_map: FxHashMap<String, FunctionId>,
    target: Option<TargetStamp>,
}

impl Module {
    /// Create a new empty module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            blocks: Vec::new(),
            instructions: Vec::new(),
            values: Vec::new(),
            function_map: FxHashMap::default(),
            target: None,
        }
    }

    // ---------------------------------------------------------------------
    // Functions
    // ---------------------------------------------------------------------

    /// Add a function taking no parameters
    pub fn add_function(&mut self, name: impl Into<String>, return_ty: IrType) -> FunctionId {
        let func = Function::new(name, vec![], return_ty);
        let id = FunctionId(self.functions.len() as u32);
        self.function_map.insert(func.name.clone(), id);
        self.functions.push(func);
        id
    }

    /// Get a function by ID
    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.0 as usize]
    }

    /// Get a function ID by name
    pub fn function_id(&self, name: &str) -> Option<FunctionId> {
        self.function_map.get(name).copied()
    }

    /// Get a function by name
    pub fn function_by_name(&self, name: &str) -> Option<&Function> {
        self.function_id(name).map(|id| self.function(id))
    }

    /// Iterate over all functions with their IDs
    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (FunctionId(i as u32), f))
    }

    /// Get the number of functions
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    // ---------------------------------------------------------------------
    // Blocks
    // ---------------------------------------------------------------------

    /// Append a new empty block to the end of `func`.
    ///
    /// `name` is made unique within the function by suffixing a counter.
    pub fn append_block(&mut self, func: FunctionId, name: &str) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        let function = &mut self.functions[func.0 as usize];
        let name = function.unique_block_name(name);
        function.blocks.push(id);
        self.blocks.push(BasicBlock::new(id, name, func));
        id
    }

    /// Unlink an empty block from its function's layout.
    ///
    /// The arena slot stays allocated and the handle must not be used again.
    /// Returns `false` (and leaves the layout alone) if the block has
    /// instructions.
    pub fn discard_block(&mut self, block: BlockId) -> bool {
        let data = &self.blocks[block.0 as usize];
        if !data.is_empty() {
            return false;
        }
        let function = &mut self.functions[data.function.0 as usize];
        function.blocks.retain(|&b| b != block);
        true
    }

    /// Get a block by ID
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0 as usize]
    }

    /// Terminator of a block, if its last instruction is one
    pub fn terminator(&self, block: BlockId) -> Option<&InstKind> {
        self.block(block)
            .last_instruction()
            .map(|inst| &self.instruction(inst).kind)
            .filter(|kind| kind.is_terminator())
    }

    /// Check if a block already ends in a terminator
    pub fn is_terminated(&self, block: BlockId) -> bool {
        self.terminator(block).is_some()
    }

    /// Successor blocks of `block` (empty when unterminated)
    pub fn successors(&self, block: BlockId) -> Vec<BlockId> {
        self.terminator(block)
            .map(|term| term.successors())
            .unwrap_or_default()
    }

    // ---------------------------------------------------------------------
    // Instructions
    // ---------------------------------------------------------------------

    /// Get an instruction by ID
    pub fn instruction(&self, id: InstId) -> &Instruction {
        &self.instructions[id.0 as usize]
    }

    /// Iterate over the instructions of a block in order
    pub fn block_instructions(
        &self,
        block: BlockId,
    ) -> impl Iterator<Item = (InstId, &Instruction)> + '_ {
        self.block(block)
            .instructions
            .iter()
            .map(move |&id| (id, self.instruction(id)))
    }

    /// Append an instruction at the end of `block`
    pub(crate) fn append_instruction(
        &mut self,
        block: BlockId,
        kind: InstKind,
        name: Option<&str>,
    ) -> (InstId, Option<ValueId>) {
        let index = self.block(block).len();
        self.insert_instruction_at(block, index, kind, name)
    }

    /// Insert an instruction immediately before `before`
    pub(crate) fn insert_instruction_before(
        &mut self,
        before: InstId,
        kind: InstKind,
        name: Option<&str>,
    ) -> (InstId, Option<ValueId>) {
        let block = self.instruction(before).block;
        let index = self
            .block(block)
            .position_of(before)
            .unwrap_or_else(|| self.block(block).len());
        self.insert_instruction_at(block, index, kind, name)
    }

    fn insert_instruction_at(
        &mut self,
        block: BlockId,
        index: usize,
        kind: InstKind,
        name: Option<&str>,
    ) -> (InstId, Option<ValueId>) {
        let id = InstId(self.instructions.len() as u32);
        let result = kind.result_type().map(|ty| {
            self.push_value(ValueData {
                ty,
                kind: ValueKind::Inst(id),
            })
        });
        self.instructions.push(Instruction {
            kind,
            block,
            result,
            name: name.map(str::to_string),
        });
        self.blocks[block.0 as usize].instructions.insert(index, id);
        (id, result)
    }

    /// Total instruction count across all blocks
    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.len()).sum()
    }

    // ---------------------------------------------------------------------
    // Values
    // ---------------------------------------------------------------------

    fn push_value(&mut self, data: ValueData) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(data);
        id
    }

    /// Create a float constant
    pub fn const_f32(&mut self, value: f32) -> ValueId {
        self.push_value(ValueData {
            ty: IrType::F32,
            kind: ValueKind::ConstF32(value),
        })
    }

    /// Create an undefined value of `ty`
    pub fn undef(&mut self, ty: IrType) -> ValueId {
        self.push_value(ValueData {
            ty,
            kind: ValueKind::Undef,
        })
    }

    /// Get a value by ID
    pub fn value(&self, id: ValueId) -> &ValueData {
        &self.values[id.0 as usize]
    }

    /// Get the type of a value
    pub fn value_type(&self, id: ValueId) -> IrType {
        self.value(id).ty
    }

    /// Check whether a value is the undefined marker
    pub fn is_undef(&self, id: ValueId) -> bool {
        self.value(id).is_undef()
    }

    /// Read back a float constant
    pub fn as_const_f32(&self, id: ValueId) -> Option<f32> {
        match self.value(id).kind {
            ValueKind::ConstF32(v) => Some(v),
            _ => None,
        }
    }

    /// The instruction that produced a value, if any
    pub fn defining_instruction(&self, id: ValueId) -> Option<InstId> {
        match self.value(id).kind {
            ValueKind::Inst(inst) => Some(inst),
            _ => None,
        }
    }

    /// Total number of values created
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    // ---------------------------------------------------------------------
    // Target
    // ---------------------------------------------------------------------

    /// Stamp the module with a target triple and data layout
    pub fn set_target(&mut self, triple: impl Into<String>, data_layout: impl Into<String>) {
        self.target = Some(TargetStamp {
            triple: triple.into(),
            data_layout: data_layout.into(),
        });
    }

    /// Target stamp, once the emitter has set it
    pub fn target(&self) -> Option<&TargetStamp> {
        self.target.as_ref()
    }
}
