//! Types, method sub-signatures and method references.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::IrError;

/// JVM value type in Java source spelling.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Type {
    Void,
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    /// Class or interface type, fully qualified (`java.lang.String`).
    Ref(String),
    Array(Box<Type>),
}

impl Type {
    /// Create a class reference type.
    pub fn class(name: &str) -> Self {
        Self::Ref(name.to_string())
    }

    /// Create an array type with this element type.
    #[must_use]
    pub fn array_of(self) -> Self {
        Self::Array(Box::new(self))
    }

    /// `java.lang.String[]`, the parameter type of an entry method.
    pub fn string_array() -> Self {
        Self::class("java.lang.String").array_of()
    }

    fn primitive(s: &str) -> Option<Self> {
        Some(match s {
            "void" => Self::Void,
            "boolean" => Self::Boolean,
            "byte" => Self::Byte,
            "char" => Self::Char,
            "short" => Self::Short,
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            _ => return None,
        })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Boolean => f.write_str("boolean"),
            Self::Byte => f.write_str("byte"),
            Self::Char => f.write_str("char"),
            Self::Short => f.write_str("short"),
            Self::Int => f.write_str("int"),
            Self::Long => f.write_str("long"),
            Self::Float => f.write_str("float"),
            Self::Double => f.write_str("double"),
            Self::Ref(name) => f.write_str(name),
            Self::Array(elem) => write!(f, "{elem}[]"),
        }
    }
}

impl FromStr for Type {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(elem) = s.strip_suffix("[]") {
            let elem: Self = elem.parse()?;
            if elem == Self::Void {
                return Err(IrError::InvalidType(s.to_string()));
            }
            return Ok(elem.array_of());
        }
        if let Some(prim) = Self::primitive(s) {
            return Ok(prim);
        }
        let valid = !s.is_empty()
            && s.split('.').all(|part| {
                !part.is_empty()
                    && part
                        .chars()
                        .all(|c| c.is_alphanumeric() || c == '_' || c == '$')
            });
        if valid {
            Ok(Self::Ref(s.to_string()))
        } else {
            Err(IrError::InvalidType(s.to_string()))
        }
    }
}

impl TryFrom<String> for Type {
    type Error = IrError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Type> for String {
    fn from(ty: Type) -> Self {
        ty.to_string()
    }
}

/// Method sub-signature: return type, name and parameter types.
///
/// Two sub-signatures are equal only if every component matches exactly.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubSignature {
    pub ret: Type,
    pub name: String,
    pub params: Vec<Type>,
}

impl SubSignature {
    /// Create a new sub-signature.
    pub fn new(ret: Type, name: &str, params: Vec<Type>) -> Self {
        Self {
            ret,
            name: name.to_string(),
            params,
        }
    }

    /// `void main(java.lang.String[])`.
    pub fn main() -> Self {
        Self::new(Type::Void, "main", vec![Type::string_array()])
    }
}

impl fmt::Display for SubSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.ret, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}

impl FromStr for SubSignature {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IrError::InvalidSubSignature(s.to_string());

        let (head, rest) = s.trim().split_once('(').ok_or_else(invalid)?;
        let params = rest.strip_suffix(')').ok_or_else(invalid)?;
        let (ret, name) = head.trim().rsplit_once(' ').ok_or_else(invalid)?;
        let name = name.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(invalid());
        }

        let ret: Type = ret.parse().map_err(|_| invalid())?;
        let params = if params.trim().is_empty() {
            Vec::new()
        } else {
            params
                .split(',')
                .map(|p| {
                    let ty: Type = p.parse().map_err(|_| invalid())?;
                    if ty == Type::Void {
                        return Err(invalid());
                    }
                    Ok(ty)
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(Self {
            ret,
            name: name.to_string(),
            params,
        })
    }
}

impl TryFrom<String> for SubSignature {
    type Error = IrError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SubSignature> for String {
    fn from(sig: SubSignature) -> Self {
        sig.to_string()
    }
}

/// Fully resolved reference to a method: declaring class plus sub-signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    pub class: String,
    pub sub_signature: SubSignature,
}

impl MethodRef {
    /// Create a new method reference.
    pub fn new(class: &str, sub_signature: SubSignature) -> Self {
        Self {
            class: class.to_string(),
            sub_signature,
        }
    }

    /// Method name.
    pub fn name(&self) -> &str {
        &self.sub_signature.name
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}: {}>", self.class, self.sub_signature)
    }
}
