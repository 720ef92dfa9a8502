//! Scripted expression drivers.
//!
//! A driver pairs a small arithmetic expression with a table of named
//! variables, each bound to a property path on a scene object (or the scene
//! itself). Bindings are dereferenced on every evaluation, so property edits
//! show up immediately without touching the driver.

use serde::{Deserialize, Serialize};

use crate::{ShakeRigError, Result};

/// Expression tree evaluated per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Const(f32),
    /// The current scene frame.
    Frame,
    /// A named variable from the driver's binding table.
    Var(String),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    /// Wrapping remainder with Python semantics: the result takes the sign
    /// of the divisor, so phases stay in [0, 1) for negative frames too.
    Rem(Box<Expr>, Box<Expr>),
    /// Selects `on_true` when `cond` is non-zero, `on_false` otherwise.
    Branch {
        cond: Box<Expr>,
        on_true: Box<Expr>,
        on_false: Box<Expr>,
    },
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    pub fn add(self, rhs: Expr) -> Self {
        Self::Add(Box::new(self), Box::new(rhs))
    }

    pub fn sub(self, rhs: Expr) -> Self {
        Self::Sub(Box::new(self), Box::new(rhs))
    }

    pub fn mul(self, rhs: Expr) -> Self {
        Self::Mul(Box::new(self), Box::new(rhs))
    }

    pub fn div(self, rhs: Expr) -> Self {
        Self::Div(Box::new(self), Box::new(rhs))
    }

    pub fn rem(self, rhs: Expr) -> Self {
        Self::Rem(Box::new(self), Box::new(rhs))
    }

    pub fn branch(cond: Expr, on_true: Expr, on_false: Expr) -> Self {
        Self::Branch {
            cond: Box::new(cond),
            on_true: Box::new(on_true),
            on_false: Box::new(on_false),
        }
    }

    fn eval(&self, frame: f32, lookup: &dyn Fn(&str) -> Result<f32>) -> Result<f32> {
        Ok(match self {
            Expr::Const(value) => *value,
            Expr::Frame => frame,
            Expr::Var(name) => lookup(name)?,
            Expr::Add(lhs, rhs) => lhs.eval(frame, lookup)? + rhs.eval(frame, lookup)?,
            Expr::Sub(lhs, rhs) => lhs.eval(frame, lookup)? - rhs.eval(frame, lookup)?,
            Expr::Mul(lhs, rhs) => lhs.eval(frame, lookup)? * rhs.eval(frame, lookup)?,
            Expr::Div(lhs, rhs) => {
                let divisor = rhs.eval(frame, lookup)?;
                if divisor == 0.0 {
                    // A zero divisor pins the driver to zero instead of
                    // poisoning the whole evaluation.
                    0.0
                } else {
                    lhs.eval(frame, lookup)? / divisor
                }
            }
            Expr::Rem(lhs, rhs) => {
                let divisor = rhs.eval(frame, lookup)?;
                if divisor == 0.0 {
                    0.0
                } else {
                    let value = lhs.eval(frame, lookup)?;
                    value - divisor * (value / divisor).floor()
                }
            }
            Expr::Branch {
                cond,
                on_true,
                on_false,
            } => {
                if cond.eval(frame, lookup)? != 0.0 {
                    on_true.eval(frame, lookup)?
                } else {
                    on_false.eval(frame, lookup)?
                }
            }
        })
    }
}

/// Field of a camera's shake slot that a variable can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotField {
    Influence,
    Scale,
    UseManualTiming,
    Time,
    Speed,
    Offset,
}

/// Property path on a scene object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyPath {
    /// A field of one entry in a camera's shake list.
    ShakeSlot { slot: usize, field: SlotField },
}

/// Property path on the scene itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenePath {
    UnitScale,
}

/// What a driver variable reads from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VarTarget {
    ObjectProperty { object: String, path: PropertyPath },
    SceneProperty { path: ScenePath },
}

/// One named binding in a driver's variable table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverVar {
    pub name: String,
    pub target: VarTarget,
}

impl DriverVar {
    pub fn new(name: impl Into<String>, target: VarTarget) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }
}

/// Resolves variable bindings against live scene state.
pub trait VarResolver {
    fn resolve(&self, target: &VarTarget) -> Option<f32>;
}

/// A scripted expression plus its variable bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub expr: Expr,
    pub vars: Vec<DriverVar>,
}

impl Driver {
    pub fn new(expr: Expr, vars: Vec<DriverVar>) -> Self {
        Self { expr, vars }
    }

    /// Evaluates the expression at the given frame, resolving every variable
    /// through `resolver` at call time.
    pub fn evaluate(&self, frame: f32, resolver: &dyn VarResolver) -> Result<f32> {
        let lookup = |name: &str| -> Result<f32> {
            let var = self
                .vars
                .iter()
                .find(|var| var.name == name)
                .ok_or_else(|| ShakeRigError::DriverVariable(name.to_string()))?;
            resolver
                .resolve(&var.target)
                .ok_or_else(|| ShakeRigError::DriverVariable(name.to_string()))
        };
        self.expr.eval(frame, &lookup)
    }
}
