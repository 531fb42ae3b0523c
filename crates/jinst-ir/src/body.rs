//! Method body IR.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chain::UnitChain;
use crate::stmt::{Stmt, StmtId};
use crate::types::MethodRef;
use crate::value::Local;

/// Statement-level body of one method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    /// Method this body belongs to.
    method: MethodRef,
    /// Declared locals.
    #[serde(default)]
    locals: Vec<Local>,
    /// Statements in order.
    units: UnitChain,
}

impl Body {
    /// Create an empty body for a method.
    pub const fn new(method: MethodRef) -> Self {
        Self {
            method,
            locals: Vec::new(),
            units: UnitChain::new(),
        }
    }

    /// Create a body from its parts.
    pub const fn from_parts(method: MethodRef, locals: Vec<Local>, units: UnitChain) -> Self {
        Self {
            method,
            locals,
            units,
        }
    }

    /// Owning method.
    pub const fn method(&self) -> &MethodRef {
        &self.method
    }

    /// Declared locals.
    pub fn locals(&self) -> &[Local] {
        &self.locals
    }

    /// Statement chain.
    pub const fn units(&self) -> &UnitChain {
        &self.units
    }

    /// Mutable statement chain.
    pub const fn units_mut(&mut self) -> &mut UnitChain {
        &mut self.units
    }

    /// Classes named by calls in this body, sorted and deduplicated.
    pub fn referenced_classes(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for stmt in self.units.stmts() {
            stmt.collect_classes(&mut out);
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    fn labels(&self) -> HashMap<StmtId, usize> {
        let mut targets: Vec<(usize, StmtId)> = self
            .units
            .stmts()
            .filter_map(Stmt::target)
            .filter_map(|t| self.units.position(t).map(|pos| (pos, t)))
            .collect();
        targets.sort_unstable();
        targets.dedup();
        targets
            .into_iter()
            .enumerate()
            .map(|(n, (_, id))| (id, n))
            .collect()
    }
}

fn write_stmt(f: &mut fmt::Formatter<'_>, stmt: &Stmt, labels: &HashMap<StmtId, usize>) -> fmt::Result {
    let label = |t: &StmtId| labels.get(t).map_or_else(|| t.to_string(), |n| format!("label{n}"));
    match stmt {
        Stmt::If { cond, target } => write!(f, "if {cond} goto {}", label(target)),
        Stmt::Goto { target } => write!(f, "goto {}", label(target)),
        other => write!(f, "{other}"),
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels = self.labels();
        writeln!(f, "    {{")?;
        for local in &self.locals {
            writeln!(f, "        {} {};", local.ty, local.name)?;
        }
        if !self.locals.is_empty() {
            writeln!(f)?;
        }
        for unit in self.units.iter() {
            if let Some(n) = labels.get(&unit.id) {
                writeln!(f, "     label{n}:")?;
            }
            f.write_str("        ")?;
            write_stmt(f, &unit.stmt, &labels)?;
            writeln!(f, ";")?;
        }
        writeln!(f, "    }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BodyBuilder, InvokeExpr, SubSignature, Type, Value};

    #[test]
    fn test_body_display_labels() {
        let method = MethodRef::new("Test", "int pick(boolean)".parse().unwrap());
        let body = BodyBuilder::new(method)
            .local("c", Type::Boolean)
            .if_goto(Value::local("c"), "other")
            .ret(Value::int(1))
            .label("other")
            .ret(Value::int(2))
            .build()
            .unwrap();

        let text = body.to_string();
        assert!(text.contains("boolean c;"));
        assert!(text.contains("if c goto label0;"));
        assert!(text.contains("     label0:\n        return 2;"));
    }

    #[test]
    fn test_referenced_classes() {
        let method = MethodRef::new("Test", SubSignature::main());
        let baz = MethodRef::new("Bar", "void baz()".parse().unwrap());
        let println = MethodRef::new("java.io.PrintStream", "void println(int)".parse().unwrap());
        let body = BodyBuilder::new(method)
            .invoke(InvokeExpr::new_static(baz.clone(), vec![]))
            .invoke(InvokeExpr::new_static(baz, vec![]))
            .invoke(InvokeExpr::new_virtual("out", println, vec![Value::int(1)]))
            .ret_void()
            .build()
            .unwrap();
        assert_eq!(body.referenced_classes(), vec!["Bar", "java.io.PrintStream"]);
    }
}
