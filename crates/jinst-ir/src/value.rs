//! Values and invoke expressions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{MethodRef, Type};

/// Local variable declared in a body.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Local {
    pub name: String,
    pub ty: Type,
}

impl Local {
    /// Create a new local.
    pub fn new(name: &str, ty: Type) -> Self {
        Self {
            name: name.to_string(),
            ty,
        }
    }
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    /// Operator symbol.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Dispatch kind of a call through a receiver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceKind {
    Virtual,
    Special,
    Interface,
}

impl InstanceKind {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Virtual => "virtualinvoke",
            Self::Special => "specialinvoke",
            Self::Interface => "interfaceinvoke",
        }
    }
}

/// Call expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvokeExpr {
    /// Receiver-less call resolved to a fixed target.
    Static { method: MethodRef, args: Vec<Value> },
    /// Call dispatched through a receiver.
    Instance {
        dispatch: InstanceKind,
        base: String,
        method: MethodRef,
        args: Vec<Value>,
    },
    /// Call site linked at run time by a bootstrap method.
    Dynamic {
        method: MethodRef,
        bootstrap: MethodRef,
        args: Vec<Value>,
    },
}

impl InvokeExpr {
    /// Create a static invoke expression.
    pub const fn new_static(method: MethodRef, args: Vec<Value>) -> Self {
        Self::Static { method, args }
    }

    /// Create a virtual invoke expression.
    pub fn new_virtual(base: &str, method: MethodRef, args: Vec<Value>) -> Self {
        Self::Instance {
            dispatch: InstanceKind::Virtual,
            base: base.to_string(),
            method,
            args,
        }
    }

    /// Target method.
    pub const fn method(&self) -> &MethodRef {
        match self {
            Self::Static { method, .. }
            | Self::Instance { method, .. }
            | Self::Dynamic { method, .. } => method,
        }
    }

    /// Call arguments.
    pub fn args(&self) -> &[Value] {
        match self {
            Self::Static { args, .. } | Self::Instance { args, .. } | Self::Dynamic { args, .. } => {
                args
            }
        }
    }

    /// Check if this is a receiver-less call.
    pub const fn is_static(&self) -> bool {
        matches!(self, Self::Static { .. })
    }

    /// Check if an argument is itself a call.
    pub fn has_nested_invoke(&self) -> bool {
        self.args().iter().any(Value::contains_invoke)
    }
}

/// Right-hand-side values and operands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Local(String),
    Int(i32),
    Long(i64),
    Str(String),
    Null,
    Binary {
        op: BinOp,
        lhs: Box<Value>,
        rhs: Box<Value>,
    },
    Invoke(Box<InvokeExpr>),
}

impl Value {
    /// Create an int constant.
    pub const fn int(v: i32) -> Self {
        Self::Int(v)
    }

    /// Create a local reference.
    pub fn local(name: &str) -> Self {
        Self::Local(name.to_string())
    }

    /// Create a binary expression.
    pub fn binary(op: BinOp, lhs: Self, rhs: Self) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Wrap an invoke expression.
    pub fn invoke(expr: InvokeExpr) -> Self {
        Self::Invoke(Box::new(expr))
    }

    /// Check if a call appears anywhere in this value.
    pub fn contains_invoke(&self) -> bool {
        match self {
            Self::Binary { lhs, rhs, .. } => lhs.contains_invoke() || rhs.contains_invoke(),
            Self::Invoke(_) => true,
            Self::Local(_) | Self::Int(_) | Self::Long(_) | Self::Str(_) | Self::Null => false,
        }
    }

    pub(crate) fn collect_classes<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_classes(out);
                rhs.collect_classes(out);
            }
            Self::Invoke(expr) => expr.collect_classes(out),
            Self::Local(_) | Self::Int(_) | Self::Long(_) | Self::Str(_) | Self::Null => {}
        }
    }
}

impl InvokeExpr {
    pub(crate) fn collect_classes<'a>(&'a self, out: &mut Vec<&'a str>) {
        out.push(&self.method().class);
        if let Self::Dynamic { bootstrap, .. } = self {
            out.push(&bootstrap.class);
        }
        for arg in self.args() {
            arg.collect_classes(out);
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Value]) -> fmt::Result {
    f.write_str("(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    f.write_str(")")
}

impl fmt::Display for InvokeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static { method, args } => {
                write!(f, "staticinvoke {method}")?;
                write_args(f, args)
            }
            Self::Instance {
                dispatch,
                base,
                method,
                args,
            } => {
                write!(f, "{} {base}.{method}", dispatch.keyword())?;
                write_args(f, args)
            }
            Self::Dynamic {
                method,
                bootstrap,
                args,
            } => {
                write!(f, "dynamicinvoke {method} {bootstrap}")?;
                write_args(f, args)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(name) => f.write_str(name),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}L"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Null => f.write_str("null"),
            Self::Binary { op, lhs, rhs } => write!(f, "{lhs} {} {rhs}", op.symbol()),
            Self::Invoke(expr) => write!(f, "{expr}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SubSignature;

    fn baz() -> MethodRef {
        MethodRef::new("Bar", "int baz(int)".parse().unwrap())
    }

    #[test]
    fn test_invoke_display() {
        let call = InvokeExpr::new_static(baz(), vec![Value::local("x")]);
        assert_eq!(call.to_string(), "staticinvoke <Bar: int baz(int)>(x)");

        let foo = MethodRef::new("Foo", SubSignature::new(Type::Int, "foo", vec![]));
        let call = InvokeExpr::new_virtual("this", foo, vec![]);
        assert_eq!(call.to_string(), "virtualinvoke this.<Foo: int foo()>()");
        assert!(!call.is_static());
    }

    #[test]
    fn test_nested_invoke() {
        let inner = Value::invoke(InvokeExpr::new_static(baz(), vec![Value::int(1)]));
        assert!(!Value::local("x").contains_invoke());
        assert!(Value::binary(BinOp::Add, Value::int(1), inner.clone()).contains_invoke());

        let flat = InvokeExpr::new_static(baz(), vec![Value::local("x")]);
        assert!(!flat.has_nested_invoke());
        let nested = InvokeExpr::new_static(baz(), vec![inner]);
        assert!(nested.has_nested_invoke());
    }

    #[test]
    fn test_invoke_json_shape() {
        let call = InvokeExpr::new_static(baz(), vec![Value::int(1)]);
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["kind"], "static");
        assert_eq!(json["method"]["sub_signature"], "int baz(int)");
        let back: InvokeExpr = serde_json::from_value(json).unwrap();
        assert_eq!(back, call);
    }
}
