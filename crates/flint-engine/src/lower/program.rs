//! Program trees
//!
//! A tiny expression/statement tree that drives [`FunctionLowering`]. There is
//! no parser; trees are built directly (see [`crate::demos`]).

use super::{FunctionLowering, LowerError};
use crate::ir::{FunctionId, Module, ValueId};

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Float literal
    Number(f32),
    /// Variable read
    Var(String),
    /// Binary operator (`+ - * / <`; anything else is reported)
    Binary {
        op: char,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn number(value: f32) -> Self {
        Expr::Number(value)
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn binary(op: char, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

/// Statement node
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `name = value`
    Assign { name: String, value: Expr },
    /// `if (cond) { then_body } else { else_body }`
    IfElse {
        cond: Expr,
        then_body: Vec<Stmt>,
        else_body: Vec<Stmt>,
    },
    /// `return value`
    Return(Expr),
}

impl Stmt {
    pub fn assign(name: impl Into<String>, value: Expr) -> Self {
        Stmt::Assign {
            name: name.into(),
            value,
        }
    }
}

/// Result of lowering one function
#[derive(Debug, Clone)]
pub struct Lowered {
    pub function: FunctionId,
    pub diagnostics: Vec<LowerError>,
}

impl Lowered {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Lower `body` into a new function `name() -> f32` of `module`
pub fn lower_function(module: &mut Module, name: &str, body: &[Stmt]) -> Lowered {
    let mut lowering = FunctionLowering::new(module, name);
    let function = lowering.function();
    lowering.lower_block(body);
    Lowered {
        function,
        diagnostics: lowering.finish(),
    }
}

impl FunctionLowering<'_> {
    /// Lower a statement list. Statements after a terminator are dropped.
    pub fn lower_block(&mut self, body: &[Stmt]) {
        for stmt in body {
            if self.current_block_is_terminated() {
                log::debug!("skipping unreachable statement {:?}", stmt);
                break;
            }
            self.lower_stmt(stmt);
        }
    }

    pub fn lower_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assign { name, value } => {
                let value = self.lower_expr(value);
                self.build_assignment(name, value);
            }
            Stmt::IfElse {
                cond,
                then_body,
                else_body,
            } => {
                let cond = self.lower_expr(cond);
                self.build_if_else(
                    cond,
                    |l| l.lower_block(then_body),
                    |l| l.lower_block(else_body),
                );
            }
            Stmt::Return(value) => {
                let value = self.lower_expr(value);
                self.build_return(value);
            }
        }
    }

    pub fn lower_expr(&mut self, expr: &Expr) -> ValueId {
        match expr {
            Expr::Number(value) => self.build_number(*value),
            Expr::Var(name) => self.build_variable_val(name),
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.lower_expr(lhs);
                let rhs = self.lower_expr(rhs);
                self.build_binop(lhs, rhs, *op)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::InstKind;

    #[test]
    fn test_lower_simple_return() {
        let mut module = Module::new("test");
        let body = vec![Stmt::Return(Expr::binary(
            '+',
            Expr::number(1.0),
            Expr::number(2.0),
        ))];
        let lowered = lower_function(&mut module, "foo", &body);

        assert!(!lowered.has_errors());
        let entry = module.function(lowered.function).blocks[0];
        assert_eq!(module.block(entry).len(), 1);
        match module.terminator(entry) {
            Some(InstKind::Ret { value: Some(v) }) => {
                assert_eq!(module.as_const_f32(*v), Some(3.0));
            }
            other => panic!("expected ret, got {:?}", other),
        }
    }

    #[test]
    fn test_statements_after_return_are_dropped() {
        let mut module = Module::new("test");
        let body = vec![
            Stmt::Return(Expr::number(1.0)),
            Stmt::assign("a", Expr::number(2.0)),
        ];
        let lowered = lower_function(&mut module, "foo", &body);
        let entry = module.function(lowered.function).blocks[0];
        assert_eq!(module.block(entry).len(), 1);
    }

    #[test]
    fn test_diagnostics_are_collected() {
        let mut module = Module::new("test");
        let body = vec![
            Stmt::assign("a", Expr::binary('%', Expr::number(1.0), Expr::number(2.0))),
            Stmt::Return(Expr::var("b")),
        ];
        let lowered = lower_function(&mut module, "foo", &body);
        assert_eq!(
            lowered.diagnostics,
            vec![
                LowerError::InvalidOperator('%'),
                LowerError::UnknownVariable("b".to_string()),
            ]
        );
    }
}
