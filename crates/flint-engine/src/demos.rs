//! Built-in demo programs
//!
//! Each demo lowers into a module `foo.code` holding one function
//! `foo() -> f32`.

use crate::ir::Module;
use crate::lower::{lower_function, Expr, Lowered, Stmt};
use std::fmt;
use std::str::FromStr;

/// Module name used by every demo
pub const DEMO_MODULE: &str = "foo.code";
/// Function name used by every demo
pub const DEMO_FUNCTION: &str = "foo";

/// `a = 8 + 4 * 2; return a`
pub fn arith() -> Vec<Stmt> {
    vec![
        Stmt::assign(
            "a",
            Expr::binary(
                '+',
                Expr::number(8.0),
                Expr::binary('*', Expr::number(4.0), Expr::number(2.0)),
            ),
        ),
        Stmt::Return(Expr::var("a")),
    ]
}

fn branching(cond: Expr) -> Vec<Stmt> {
    vec![
        Stmt::assign("a", Expr::number(16.0)),
        Stmt::assign("b", Expr::binary('/', Expr::var("a"), Expr::number(4.0))),
        Stmt::IfElse {
            cond,
            then_body: vec![Stmt::assign(
                "c",
                Expr::binary('*', Expr::var("a"), Expr::var("b")),
            )],
            else_body: vec![Stmt::assign(
                "c",
                Expr::binary('+', Expr::var("a"), Expr::var("b")),
            )],
        },
        Stmt::Return(Expr::var("c")),
    ]
}

fn b_less_than_8() -> Expr {
    Expr::binary('<', Expr::var("b"), Expr::number(8.0))
}

/// `a = 16; b = a / 4; if (b < 8) c = a * b else c = a + b; return c`
pub fn if_then() -> Vec<Stmt> {
    branching(b_less_than_8())
}

/// Like [`if_then`] with the condition negated as `1 - (b < 8)`
pub fn if_else() -> Vec<Stmt> {
    branching(Expr::binary('-', Expr::number(1.0), b_less_than_8()))
}

/// Selectable demo program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    Arith,
    IfThen,
    IfElse,
}

impl Demo {
    pub const ALL: [Demo; 3] = [Demo::Arith, Demo::IfThen, Demo::IfElse];

    pub fn name(self) -> &'static str {
        match self {
            Demo::Arith => "arith",
            Demo::IfThen => "if-then",
            Demo::IfElse => "if-else",
        }
    }

    pub fn program(self) -> Vec<Stmt> {
        match self {
            Demo::Arith => arith(),
            Demo::IfThen => if_then(),
            Demo::IfElse => if_else(),
        }
    }

    /// Value `foo()` returns
    pub fn expected(self) -> f32 {
        match self {
            Demo::Arith => 16.0,
            Demo::IfThen => 64.0,
            Demo::IfElse => 20.0,
        }
    }

    /// Lower the demo into a fresh module
    pub fn build(self) -> (Module, Lowered) {
        let mut module = Module::new(DEMO_MODULE);
        let lowered = lower_function(&mut module, DEMO_FUNCTION, &self.program());
        (module, lowered)
    }
}

impl fmt::Display for Demo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Demo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Demo::ALL
            .into_iter()
            .find(|demo| demo.name() == s)
            .ok_or_else(|| format!("unknown demo `{}` (expected arith, if-then or if-else)", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_names_round_trip() {
        for demo in Demo::ALL {
            assert_eq!(demo.name().parse::<Demo>(), Ok(demo));
        }
        assert!("loop".parse::<Demo>().is_err());
    }

    #[test]
    fn test_demos_lower_cleanly() {
        for demo in Demo::ALL {
            let (module, lowered) = demo.build();
            assert!(lowered.diagnostics.is_empty(), "{}", demo);
            assert_eq!(module.name, DEMO_MODULE);
            assert_eq!(module.function(lowered.function).name, DEMO_FUNCTION);
        }
    }
}
