//! Statement IR.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::{InvokeExpr, Value};

/// Stable identity of a statement within its owning chain.
///
/// Ids survive insertions, so they are the handle used for "insert before".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StmtId(pub u32);

impl fmt::Display for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Statement kinds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Stmt {
    /// Call evaluated for its side effects.
    Invoke { expr: InvokeExpr },
    /// Return with a value.
    Return { value: Value },
    /// Return from a void method.
    ReturnVoid,
    /// `local = value`.
    Assign { local: String, value: Value },
    /// Binds `this` or a parameter to a local.
    Identity { local: String, source: IdentitySource },
    /// Conditional branch.
    If { cond: Value, target: StmtId },
    /// Unconditional branch.
    Goto { target: StmtId },
    Throw { value: Value },
    Nop,
}

/// Right-hand side of an identity statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    This,
    Param(u8),
    CaughtException,
}

impl Stmt {
    /// Create an invoke statement.
    pub const fn invoke(expr: InvokeExpr) -> Self {
        Self::Invoke { expr }
    }

    /// Create a return-with-value statement.
    pub const fn ret(value: Value) -> Self {
        Self::Return { value }
    }

    /// Create an assignment.
    pub fn assign(local: &str, value: Value) -> Self {
        Self::Assign {
            local: local.to_string(),
            value,
        }
    }

    /// Call expression carried by this statement, if any.
    ///
    /// Covers both bare invoke statements and assignments whose right-hand
    /// side is a call.
    pub fn invoke_expr(&self) -> Option<&InvokeExpr> {
        match self {
            Self::Invoke { expr } => Some(expr),
            Self::Assign {
                value: Value::Invoke(expr),
                ..
            } => Some(&**expr),
            Self::Return { .. }
            | Self::ReturnVoid
            | Self::Assign { .. }
            | Self::Identity { .. }
            | Self::If { .. }
            | Self::Goto { .. }
            | Self::Throw { .. }
            | Self::Nop => None,
        }
    }

    /// Check if this statement exits the method normally.
    pub const fn is_return(&self) -> bool {
        matches!(self, Self::Return { .. } | Self::ReturnVoid)
    }

    /// Branch target, if this statement can jump.
    pub const fn target(&self) -> Option<StmtId> {
        match self {
            Self::If { target, .. } | Self::Goto { target } => Some(*target),
            _ => None,
        }
    }

    /// Retarget a branch from `from` to `to`. Returns true if changed.
    pub(crate) fn redirect(&mut self, from: StmtId, to: StmtId) -> bool {
        match self {
            Self::If { target, .. } | Self::Goto { target } if *target == from => {
                *target = to;
                true
            }
            _ => false,
        }
    }

    /// Check that calls only appear where three-address code allows them.
    ///
    /// A call may be a bare invoke statement or the whole right-hand side of
    /// an assignment, and its arguments may not be calls.
    pub fn is_three_address(&self) -> bool {
        match self {
            Self::Invoke { expr } => !expr.has_nested_invoke(),
            Self::Assign {
                value: Value::Invoke(expr),
                ..
            } => !expr.has_nested_invoke(),
            Self::Return { value }
            | Self::Assign { value, .. }
            | Self::Throw { value }
            | Self::If { cond: value, .. } => !value.contains_invoke(),
            Self::ReturnVoid | Self::Identity { .. } | Self::Goto { .. } | Self::Nop => true,
        }
    }

    pub(crate) fn collect_classes<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Invoke { expr } => expr.collect_classes(out),
            Self::Return { value }
            | Self::Assign { value, .. }
            | Self::Throw { value }
            | Self::If { cond: value, .. } => value.collect_classes(out),
            Self::ReturnVoid | Self::Identity { .. } | Self::Goto { .. } | Self::Nop => {}
        }
    }
}

/// Renders a statement with branch targets shown as raw ids.
///
/// `Body` rendering substitutes labels for ids.
impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invoke { expr } => write!(f, "{expr}"),
            Self::Return { value } => write!(f, "return {value}"),
            Self::ReturnVoid => f.write_str("return"),
            Self::Assign { local, value } => write!(f, "{local} = {value}"),
            Self::Identity { local, source } => match source {
                IdentitySource::This => write!(f, "{local} := @this"),
                IdentitySource::Param(n) => write!(f, "{local} := @parameter{n}"),
                IdentitySource::CaughtException => write!(f, "{local} := @caughtexception"),
            },
            Self::If { cond, target } => write!(f, "if {cond} goto {target}"),
            Self::Goto { target } => write!(f, "goto {target}"),
            Self::Throw { value } => write!(f, "throw {value}"),
            Self::Nop => f.write_str("nop"),
        }
    }
}
