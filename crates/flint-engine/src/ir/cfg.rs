//! Control-flow graph queries
//!
//! Reverse postorder and a dominator tree over the blocks of one function.
//! Both the verifier (use-before-def checks) and the backend (block lowering
//! order) walk blocks in reverse postorder.

use super::block::BlockId;
use super::function::FunctionId;
use super::module::Module;
use rustc_hash::FxHashMap;

/// Blocks reachable from the entry, in reverse postorder.
///
/// Unreachable blocks are omitted. Successors that belong to a different
/// function are ignored here; the verifier reports them separately.
pub fn reverse_postorder(module: &Module, func: FunctionId) -> Vec<BlockId> {
    let Some(entry) = module.function(func).entry_block() else {
        return Vec::new();
    };

    let mut visited = vec![entry];
    let mut postorder = Vec::new();
    // (block, index of the next successor to visit)
    let mut stack = vec![(entry, 0usize)];

    while let Some(top) = stack.last_mut() {
        let (block, next) = *top;
        top.1 += 1;
        if let Some(&succ) = module.successors(block).get(next) {
            if module.block(succ).function == func && !visited.contains(&succ) {
                visited.push(succ);
                stack.push((succ, 0));
            }
        } else {
            postorder.push(block);
            stack.pop();
        }
    }

    postorder.reverse();
    postorder
}

/// Immediate-dominator tree of one function
#[derive(Debug, Clone)]
pub struct DominatorTree {
    entry: Option<BlockId>,
    idom: FxHashMap<BlockId, BlockId>,
    rpo_index: FxHashMap<BlockId, usize>,
}

impl DominatorTree {
    /// Compute dominators with the Cooper-Harvey-Kennedy iteration
    pub fn compute(module: &Module, func: FunctionId) -> Self {
        let rpo = reverse_postorder(module, func);
        let rpo_index: FxHashMap<BlockId, usize> =
            rpo.iter().enumerate().map(|(i, &b)| (b, i)).collect();

        let mut preds: FxHashMap<BlockId, Vec<BlockId>> = FxHashMap::default();
        for &block in &rpo {
            for succ in module.successors(block) {
                if rpo_index.contains_key(&succ) {
                    preds.entry(succ).or_default().push(block);
                }
            }
        }

        let entry = rpo.first().copied();
        let mut idom: FxHashMap<BlockId, BlockId> = FxHashMap::default();
        if let Some(entry) = entry {
            idom.insert(entry, entry);
        }

        let mut changed = true;
        while changed {
            changed = false;
            for &block in rpo.iter().skip(1) {
                let mut new_idom: Option<BlockId> = None;
                for &pred in preds.get(&block).map(Vec::as_slice).unwrap_or(&[]) {
                    if !idom.contains_key(&pred) {
                        continue;
                    }
                    new_idom = Some(match new_idom {
                        None => pred,
                        Some(current) => intersect(&idom, &rpo_index, pred, current),
                    });
                }
                if let Some(new_idom) = new_idom {
                    if idom.get(&block) != Some(&new_idom) {
                        idom.insert(block, new_idom);
                        changed = true;
                    }
                }
            }
        }

        Self {
            entry,
            idom,
            rpo_index,
        }
    }

    /// Whether `block` is reachable from the entry
    pub fn is_reachable(&self, block: BlockId) -> bool {
        self.rpo_index.contains_key(&block)
    }

    /// Immediate dominator (`None` for the entry and unreachable blocks)
    pub fn idom(&self, block: BlockId) -> Option<BlockId> {
        if Some(block) == self.entry {
            return None;
        }
        self.idom.get(&block).copied()
    }

    /// Whether `a` dominates `b` (reflexive)
    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        if !self.is_reachable(a) || !self.is_reachable(b) {
            return false;
        }
        let mut current = b;
        loop {
            if current == a {
                return true;
            }
            match self.idom(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }
}

fn intersect(
    idom: &FxHashMap<BlockId, BlockId>,
    rpo_index: &FxHashMap<BlockId, usize>,
    mut a: BlockId,
    mut b: BlockId,
) -> BlockId {
    while a != b {
        while rpo_index[&a] > rpo_index[&b] {
            a = idom[&a];
        }
        while rpo_index[&b] > rpo_index[&a] {
            b = idom[&b];
        }
    }
    a
}
