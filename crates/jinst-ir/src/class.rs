//! Class and method definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::types::{MethodRef, SubSignature};
use crate::{IrError, Result};

/// Method modifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Final,
    Abstract,
    Native,
    Synchronized,
}

impl Modifier {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
            Self::Static => "static",
            Self::Final => "final",
            Self::Abstract => "abstract",
            Self::Native => "native",
            Self::Synchronized => "synchronized",
        }
    }
}

/// A method declared by a class, with its body if it has one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub sub_signature: SubSignature,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
}

impl MethodDef {
    /// Create a body-less method declaration.
    pub const fn new(sub_signature: SubSignature, modifiers: Vec<Modifier>) -> Self {
        Self {
            sub_signature,
            modifiers,
            body: None,
        }
    }

    /// Attach a body.
    #[must_use]
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }
}

/// A class in the program's class universe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    /// Referenced but never loaded; has no methods.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub phantom: bool,
    #[serde(default)]
    pub methods: Vec<MethodDef>,
}

impl ClassDef {
    /// Create an empty class.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            superclass: Some("java.lang.Object".to_string()),
            phantom: false,
            methods: Vec::new(),
        }
    }

    /// Create a phantom class standing in for an unresolved reference.
    pub fn phantom(name: &str) -> Self {
        Self {
            name: name.to_string(),
            superclass: None,
            phantom: true,
            methods: Vec::new(),
        }
    }

    /// Add a method.
    #[must_use]
    pub fn with_method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// Package name, empty for the default package.
    pub fn package(&self) -> &str {
        self.name.rsplit_once('.').map_or("", |(pkg, _)| pkg)
    }

    /// Find a method by exact sub-signature.
    pub fn method(&self, sub_signature: &SubSignature) -> Option<&MethodDef> {
        self.methods
            .iter()
            .find(|m| &m.sub_signature == sub_signature)
    }

    /// Reference to one of this class's methods.
    pub fn method_ref(&self, sub_signature: &SubSignature) -> MethodRef {
        MethodRef::new(&self.name, sub_signature.clone())
    }

    /// Mutable method bodies.
    pub fn bodies_mut(&mut self) -> impl Iterator<Item = &mut Body> {
        self.methods.iter_mut().filter_map(|m| m.body.as_mut())
    }

    /// Classes this class depends on: its superclass and every call target.
    pub fn referenced_classes(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .methods
            .iter()
            .filter_map(|m| m.body.as_ref())
            .flat_map(Body::referenced_classes)
            .chain(self.superclass.as_deref())
            .filter(|name| *name != self.name)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Check that every body belongs to the method that holds it.
    pub fn validate(&self) -> Result<()> {
        for method in &self.methods {
            let Some(body) = &method.body else {
                continue;
            };
            let expected = self.method_ref(&method.sub_signature);
            if body.method() != &expected {
                return Err(IrError::BodyOwnerMismatch {
                    expected: expected.to_string(),
                    found: body.method().to_string(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("    ")?;
        for m in &self.modifiers {
            write!(f, "{} ", m.keyword())?;
        }
        writeln!(f, "{}", self.sub_signature)?;
        match &self.body {
            Some(body) => write!(f, "{body}"),
            None => Ok(()),
        }
    }
}

impl fmt::Display for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.phantom {
            return writeln!(f, "phantom class {}", self.name);
        }
        write!(f, "public class {}", self.name)?;
        if let Some(sup) = &self.superclass {
            write!(f, " extends {sup}")?;
        }
        writeln!(f, "\n{{")?;
        for (i, method) in self.methods.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{method}")?;
        }
        writeln!(f, "}}")
    }
}
