//! Lowering Tests
//!
//! Exercises the primitive lowering operations and the IR they leave behind.
//! Run with: cargo test -p flint-engine --test lowering_tests

use flint_engine::ir::{InstKind, IrType, Module};
use flint_engine::lower::{FunctionLowering, LowerError};
use flint_engine::{evaluate, lower_function, verify_module, Expr, Stmt};

fn instruction_kinds(lowering: &FunctionLowering<'_>) -> Vec<InstKind> {
    let module = lowering.module();
    module
        .function(lowering.function())
        .blocks
        .iter()
        .flat_map(|&b| module.block_instructions(b).map(|(_, i)| i.kind.clone()))
        .collect()
}

// =============================================================================
// CONSTANTS AND ARITHMETIC
// =============================================================================

mod arithmetic {
    use super::*;

    #[test]
    fn test_number_round_trip() {
        let mut module = Module::new("test");
        let mut lowering = FunctionLowering::new(&mut module, "foo");
        for literal in [0.0f32, -1.5, 3.25, 1.0e-7, f32::MAX] {
            let v = lowering.build_number(literal);
            assert_eq!(lowering.module().as_const_f32(v), Some(literal));
        }
        assert!(instruction_kinds(&lowering).is_empty());
    }

    #[test]
    fn test_constant_expression_folds() {
        let mut module = Module::new("test");
        let mut lowering = FunctionLowering::new(&mut module, "foo");
        let four = lowering.build_number(4.0);
        let two = lowering.build_number(2.0);
        let eight = lowering.build_number(8.0);
        let product = lowering.build_binop(four, two, '*');
        let sum = lowering.build_binop(eight, product, '+');

        assert_eq!(lowering.module().as_const_f32(sum), Some(16.0));
        assert!(instruction_kinds(&lowering).is_empty());
    }

    #[test]
    fn test_constant_comparison_folds() {
        let mut module = Module::new("test");
        let mut lowering = FunctionLowering::new(&mut module, "foo");
        let one = lowering.build_number(1.0);
        let two = lowering.build_number(2.0);

        let less = lowering.build_binop(one, two, '<');
        let not_less = lowering.build_binop(two, one, '<');

        assert_eq!(lowering.module().as_const_f32(less), Some(1.0));
        assert_eq!(lowering.module().as_const_f32(not_less), Some(0.0));
        assert!(instruction_kinds(&lowering).is_empty());
    }

    #[test]
    fn test_operators_emit_float_instructions() {
        let mut module = Module::new("test");
        let mut lowering = FunctionLowering::new(&mut module, "foo");
        let one = lowering.build_number(1.0);
        lowering.build_assignment("x", one);

        let mut mnemonics = Vec::new();
        for op in ['+', '-', '*', '/'] {
            let x = lowering.build_variable_val("x");
            let three = lowering.build_number(3.0);
            let v = lowering.build_binop(x, three, op);
            let inst = lowering.module().defining_instruction(v).unwrap();
            match &lowering.module().instruction(inst).kind {
                InstKind::Binary { op, .. } => mnemonics.push(op.mnemonic()),
                other => panic!("expected binary, got {:?}", other),
            }
        }
        assert_eq!(mnemonics, vec!["fadd", "fsub", "fmul", "fdiv"]);
    }

    #[test]
    fn test_instruction_names() {
        let mut module = Module::new("test");
        let mut lowering = FunctionLowering::new(&mut module, "foo");
        let one = lowering.build_number(1.0);
        lowering.build_assignment("x", one);
        let x = lowering.build_variable_val("x");
        let two = lowering.build_number(2.0);
        let sum = lowering.build_binop(x, two, '+');

        let module = lowering.module();
        let inst = module.defining_instruction(sum).unwrap();
        assert_eq!(module.instruction(inst).name.as_deref(), Some("add_result"));
    }
}

// =============================================================================
// UNDEFINED VALUES AND DIAGNOSTICS
// =============================================================================

mod diagnostics {
    use super::*;

    #[test]
    fn test_undefined_operand_propagates_without_instructions() {
        let mut module = Module::new("test");
        let mut lowering = FunctionLowering::new(&mut module, "foo");
        let missing = lowering.build_variable_val("nope");
        let one = lowering.build_number(1.0);
        let before = instruction_kinds(&lowering).len();

        let left = lowering.build_binop(missing, one, '+');
        let right = lowering.build_binop(one, missing, '<');
        let chained = lowering.build_binop(left, right, '*');

        let module = lowering.module();
        assert!(module.is_undef(left));
        assert!(module.is_undef(right));
        assert!(module.is_undef(chained));
        assert_eq!(module.value_type(chained), IrType::F32);
        assert_eq!(instruction_kinds(&lowering).len(), before);
        // Only the unknown variable itself was reported
        assert_eq!(lowering.diagnostics().len(), 1);
    }

    #[test]
    fn test_invalid_operator_reports_once() {
        let mut module = Module::new("test");
        let mut lowering = FunctionLowering::new(&mut module, "foo");
        let a = lowering.build_number(7.0);
        let b = lowering.build_number(2.0);

        let v = lowering.build_binop(a, b, '%');

        assert!(lowering.module().is_undef(v));
        assert_eq!(lowering.diagnostics(), &[LowerError::InvalidOperator('%')]);
        assert_eq!(
            lowering.diagnostics()[0].to_string(),
            "invalid operator: %"
        );
        assert!(instruction_kinds(&lowering).is_empty());
    }

    #[test]
    fn test_unknown_variable() {
        let mut module = Module::new("test");
        let mut lowering = FunctionLowering::new(&mut module, "foo");

        let v = lowering.build_variable_val("ghost");

        assert!(lowering.module().is_undef(v));
        assert_eq!(
            lowering.diagnostics(),
            &[LowerError::UnknownVariable("ghost".to_string())]
        );
        assert!(instruction_kinds(&lowering).is_empty());
    }
}

// =============================================================================
// VARIABLES AND SLOTS
// =============================================================================

mod variables {
    use super::*;

    #[test]
    fn test_assignment_then_read() {
        let mut module = Module::new("test");
        let mut lowering = FunctionLowering::new(&mut module, "foo");
        let v = lowering.build_number(5.0);
        lowering.build_assignment("a", v);
        let read = lowering.build_variable_val("a");
        lowering.build_return(read);

        let kinds = instruction_kinds(&lowering);
        assert!(matches!(kinds[0], InstKind::Alloca { ty: IrType::F32 }));
        assert!(matches!(kinds[1], InstKind::Store { .. }));
        assert!(matches!(kinds[2], InstKind::Load { ty: IrType::F32, .. }));
        assert!(matches!(kinds[3], InstKind::Ret { value: Some(_) }));
        drop(lowering);
        assert!(verify_module(module).is_ok());
    }

    #[test]
    fn test_slot_hoisted_from_then_block() {
        let mut module = Module::new("test");
        let mut lowering = FunctionLowering::new(&mut module, "foo");
        let entry = lowering.current_block();
        let sixteen = lowering.build_number(16.0);
        lowering.build_assignment("a", sixteen);
        let cond = lowering.build_number(1.0);

        let mut then_block = None;
        lowering.build_if_else(
            cond,
            |l| {
                then_block = Some(l.current_block());
                let a = l.build_variable_val("a");
                l.build_assignment("c", a);
                // Cursor still in the then block after hoisting
                assert_eq!(Some(l.current_block()), then_block);
            },
            |_| {},
        );

        let module = lowering.module();
        let c_slot = lowering.symbols().get("c").unwrap().pointer();
        let first = module.block(entry).first_instruction().unwrap();
        assert_eq!(module.instruction(first).result, Some(c_slot));
        assert_eq!(module.instruction(first).block, entry);

        let then_block = then_block.unwrap();
        assert!(module
            .block_instructions(then_block)
            .all(|(_, i)| !matches!(i.kind, InstKind::Alloca { .. })));
    }
}

// =============================================================================
// CONTROL FLOW
// =============================================================================

mod control_flow {
    use super::*;

    #[test]
    fn test_if_else_blocks_and_join() {
        let mut module = Module::new("test");
        let mut lowering = FunctionLowering::new(&mut module, "foo");
        let entry = lowering.current_block();
        let four = lowering.build_number(4.0);
        lowering.build_assignment("b", four);
        let b = lowering.build_variable_val("b");
        let eight = lowering.build_number(8.0);
        let cond = lowering.build_binop(b, eight, '<');

        lowering.build_if_else(
            cond,
            |l| {
                let one = l.build_number(1.0);
                l.build_assignment("c", one);
            },
            |l| {
                let two = l.build_number(2.0);
                l.build_assignment("c", two);
            },
        );
        let c = lowering.build_variable_val("c");
        lowering.build_return(c);

        let ir = lowering.module();
        let func = ir.function(lowering.function());
        assert_eq!(func.block_count(), 4);
        let [_, then_block, else_block, merge] = [func.blocks[0], func.blocks[1], func.blocks[2], func.blocks[3]];

        match ir.terminator(entry) {
            Some(InstKind::CondBr {
                cond,
                then_dest,
                else_dest,
            }) => {
                assert_eq!((*then_dest, *else_dest), (then_block, else_block));
                // Condition re-normalized with `fcmp one`
                let test = ir.defining_instruction(*cond).unwrap();
                assert!(matches!(
                    ir.instruction(test).kind,
                    InstKind::FCmp {
                        pred: flint_engine::ir::FloatPredicate::One,
                        ..
                    }
                ));
            }
            other => panic!("expected condbr, got {:?}", other),
        }
        assert_eq!(ir.successors(then_block), vec![merge]);
        assert_eq!(ir.successors(else_block), vec![merge]);
        assert_eq!(lowering.symbols().len(), 2);

        drop(lowering);
        assert!(verify_module(module).is_ok());
    }

    #[test]
    fn test_nested_if_names_are_unique() {
        let mut module = Module::new("test");
        let mut lowering = FunctionLowering::new(&mut module, "foo");
        let cond = lowering.build_number(1.0);
        lowering.build_if_else(
            cond,
            |l| {
                let inner = l.build_number(0.0);
                l.build_if_else(inner, |_| {}, |_| {});
            },
            |_| {},
        );
        let zero = lowering.build_number(0.0);
        lowering.build_return(zero);

        let ir = lowering.module();
        let names: Vec<String> = ir
            .function(lowering.function())
            .blocks
            .iter()
            .map(|&b| ir.block(b).name.clone())
            .collect();
        assert_eq!(
            names,
            vec!["entry", "then", "else", "continue", "then1", "else1", "continue1"]
        );

        drop(lowering);
        assert!(verify_module(module).is_ok());
    }

    #[test]
    fn test_both_arms_return_verifies() {
        let mut module = Module::new("test");
        let body = vec![
            Stmt::IfElse {
                cond: Expr::binary('<', Expr::number(1.0), Expr::number(2.0)),
                then_body: vec![Stmt::Return(Expr::number(1.0))],
                else_body: vec![Stmt::Return(Expr::number(2.0))],
            },
            Stmt::assign("dead", Expr::number(3.0)),
        ];
        let lowered = lower_function(&mut module, "foo", &body);
        assert!(!lowered.has_errors());

        let func = module.function(lowered.function);
        let names: Vec<String> = func
            .blocks
            .iter()
            .map(|&b| module.block(b).name.clone())
            .collect();
        assert_eq!(names, vec!["entry", "then", "else"]);
        for &block in &func.blocks[1..] {
            assert!(matches!(module.terminator(block), Some(InstKind::Ret { .. })));
        }

        let verified = verify_module(module).unwrap();
        assert_eq!(evaluate(&verified, "foo"), Ok(1.0));
    }

    #[test]
    fn test_one_arm_returning_keeps_merge() {
        let mut module = Module::new("test");
        let body = vec![
            Stmt::assign("c", Expr::number(0.0)),
            Stmt::IfElse {
                cond: Expr::number(0.0),
                then_body: vec![Stmt::Return(Expr::number(1.0))],
                else_body: vec![Stmt::assign("c", Expr::number(5.0))],
            },
            Stmt::Return(Expr::var("c")),
        ];
        let lowered = lower_function(&mut module, "foo", &body);
        assert_eq!(module.function(lowered.function).block_count(), 4);

        let verified = verify_module(module).unwrap();
        assert_eq!(evaluate(&verified, "foo"), Ok(5.0));
    }
}
