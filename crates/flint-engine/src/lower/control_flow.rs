//! Control-flow lowering
//!
//! if/else over numeric conditions. Both arms meet in a `continue` block; since
//! variables live in memory slots, no phi nodes are needed at the join.

use super::FunctionLowering;
use crate::ir::{FloatPredicate, ValueId};

impl<'m> FunctionLowering<'m> {
    /// Lower `if (cond) then_body else else_body`.
    ///
    /// `cond` is a numeric `0.0`/`1.0` value; it is tested against zero with an
    /// ordered not-equal comparison. Each arm falls through to the `continue`
    /// block unless it already terminated its own block. The cursor ends at the
    /// end of `continue`.
    ///
    /// When neither arm falls through, `continue` is discarded and the cursor
    /// stays on the terminated else arm, so nothing more lowers into it.
    pub fn build_if_else<T, E>(&mut self, cond: ValueId, then_body: T, else_body: E)
    where
        T: FnOnce(&mut FunctionLowering<'m>),
        E: FnOnce(&mut FunctionLowering<'m>),
    {
        let zero = self.build_number(0.0);
        let test = self
            .builder
            .build_fcmp(self.module, FloatPredicate::One, cond, zero, "if_cond");

        let then_block = self.append_block("then");
        let else_block = self.append_block("else");
        let merge_block = self.append_block("continue");
        self.builder
            .build_cond_br(self.module, test, then_block, else_block);

        let mut falls_through = false;
        self.position_at_end(then_block);
        then_body(self);
        if !self.current_block_is_terminated() {
            self.builder.build_br(self.module, merge_block);
            falls_through = true;
        }

        self.position_at_end(else_block);
        else_body(self);
        if !self.current_block_is_terminated() {
            self.builder.build_br(self.module, merge_block);
            falls_through = true;
        }

        if falls_through {
            self.position_at_end(merge_block);
        } else {
            log::debug!("both arms terminate; dropping merge block");
            self.module.discard_block(merge_block);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{InstKind, Module};

    #[test]
    fn test_if_else_structure() {
        let mut module = Module::new("test");
        let mut lowering = FunctionLowering::new(&mut module, "foo");
        let entry = lowering.current_block();
        let cond = lowering.build_number(1.0);

        lowering.build_if_else(
            cond,
            |l| {
                let v = l.build_number(2.0);
                l.build_assignment("c", v);
            },
            |l| {
                let v = l.build_number(3.0);
                l.build_assignment("c", v);
            },
        );

        let merge = lowering.current_block();
        let module = lowering.module();
        assert_eq!(module.block(merge).name, "continue");
        assert!(module.block(merge).is_empty());

        let func = module.function(lowering.function());
        let names: Vec<_> = func
            .blocks
            .iter()
            .map(|&b| module.block(b).name.clone())
            .collect();
        assert_eq!(names, vec!["entry", "then", "else", "continue"]);

        let successors = module.successors(entry);
        assert_eq!(successors.len(), 2);
        for arm in successors {
            assert_eq!(module.successors(arm), vec![merge]);
        }
    }

    #[test]
    fn test_terminated_arm_gets_no_branch() {
        let mut module = Module::new("test");
        let mut lowering = FunctionLowering::new(&mut module, "foo");
        let cond = lowering.build_number(0.0);

        lowering.build_if_else(
            cond,
            |l| {
                let v = l.build_number(1.0);
                l.build_return(v);
            },
            |_| {},
        );

        let module = lowering.module();
        let func = module.function(lowering.function());
        let then_block = func.blocks[1];
        let else_block = func.blocks[2];
        assert_eq!(module.block(then_block).len(), 1);
        assert!(matches!(
            module.terminator(then_block),
            Some(InstKind::Ret { .. })
        ));
        assert!(matches!(module.terminator(else_block), Some(InstKind::Br { .. })));
    }

    #[test]
    fn test_both_arms_terminated_drops_merge() {
        let mut module = Module::new("test");
        let mut lowering = FunctionLowering::new(&mut module, "foo");
        let cond = lowering.build_number(1.0);

        lowering.build_if_else(
            cond,
            |l| {
                let v = l.build_number(1.0);
                l.build_return(v);
            },
            |l| {
                let v = l.build_number(2.0);
                l.build_return(v);
            },
        );

        let else_block = lowering.current_block();
        assert!(lowering.current_block_is_terminated());
        let module = lowering.module();
        assert_eq!(module.block(else_block).name, "else");
        assert_eq!(module.function(lowering.function()).block_count(), 3);
    }

    #[test]
    fn test_undefined_condition_still_branches() {
        let mut module = Module::new("test");
        let mut lowering = FunctionLowering::new(&mut module, "foo");
        let cond = lowering.build_variable_val("missing");
        lowering.build_if_else(cond, |_| {}, |_| {});
        let zero = lowering.build_number(0.0);
        lowering.build_return(zero);
        assert_eq!(lowering.diagnostics().len(), 1);
        drop(lowering);

        assert_eq!(module.function_by_name("foo").unwrap().block_count(), 4);
        assert!(crate::verify::verify_module(module).is_ok());
    }
}
