//! Body builder fluent API.

use std::collections::{HashMap, HashSet};

use crate::body::Body;
use crate::chain::UnitChain;
use crate::stmt::{IdentitySource, Stmt, StmtId};
use crate::types::{MethodRef, Type};
use crate::value::{InvokeExpr, Local, Value};
use crate::{IrError, Result};

/// Builder for method bodies with named branch labels.
///
/// Labels may be referenced before they are bound; `label` binds a name to
/// the next statement appended.
pub struct BodyBuilder {
    method: MethodRef,
    locals: Vec<Local>,
    units: UnitChain,
    labels: HashMap<String, StmtId>,
    bound: HashSet<String>,
    pending: Vec<String>,
    error: Option<IrError>,
}

impl BodyBuilder {
    /// Create a new builder.
    pub fn new(method: MethodRef) -> Self {
        Self {
            method,
            locals: Vec::new(),
            units: UnitChain::new(),
            labels: HashMap::new(),
            bound: HashSet::new(),
            pending: Vec::new(),
            error: None,
        }
    }

    fn label_id(&mut self, name: &str) -> Result<StmtId> {
        if let Some(&id) = self.labels.get(name) {
            return Ok(id);
        }
        let id = self.units.reserve_id()?;
        self.labels.insert(name.to_string(), id);
        Ok(id)
    }

    /// Record the first error; `build` reports it.
    fn fail(&mut self, err: IrError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn append(&mut self, stmt: Stmt) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        for name in &pending {
            if !self.bound.insert(name.clone()) {
                return Err(IrError::DuplicateLabel(name.clone()));
            }
        }
        let Some((first, rest)) = pending.split_first() else {
            self.units.push(stmt)?;
            return Ok(());
        };

        let id = self.label_id(first)?;
        self.units.push_with_id(id, stmt);
        for alias in rest {
            let alias_id = self.label_id(alias)?;
            self.units.redirect_all(alias_id, id);
            self.labels.insert(alias.clone(), id);
        }
        Ok(())
    }

    /// Declare a local.
    #[must_use]
    pub fn local(mut self, name: &str, ty: Type) -> Self {
        self.locals.push(Local::new(name, ty));
        self
    }

    /// Bind a label to the next statement.
    #[must_use]
    pub fn label(mut self, name: &str) -> Self {
        self.pending.push(name.to_string());
        self
    }

    /// Append a raw statement.
    #[must_use]
    pub fn stmt(mut self, stmt: Stmt) -> Self {
        if self.error.is_some() {
            return self;
        }
        if let Err(err) = self.append(stmt) {
            self.fail(err);
        }
        self
    }

    /// Append `local := @parameterN`.
    #[must_use]
    pub fn identity_param(self, local: &str, index: u8) -> Self {
        self.stmt(Stmt::Identity {
            local: local.to_string(),
            source: IdentitySource::Param(index),
        })
    }

    /// Append `local = value`.
    #[must_use]
    pub fn assign(self, local: &str, value: Value) -> Self {
        self.stmt(Stmt::assign(local, value))
    }

    /// Append an invoke statement.
    #[must_use]
    pub fn invoke(self, expr: InvokeExpr) -> Self {
        self.stmt(Stmt::invoke(expr))
    }

    /// Append a conditional branch to a label.
    #[must_use]
    pub fn if_goto(mut self, cond: Value, label: &str) -> Self {
        match self.label_id(label) {
            Ok(target) => self.stmt(Stmt::If { cond, target }),
            Err(err) => {
                self.fail(err);
                self
            }
        }
    }

    /// Append an unconditional branch to a label.
    #[must_use]
    pub fn goto(mut self, label: &str) -> Self {
        match self.label_id(label) {
            Ok(target) => self.stmt(Stmt::Goto { target }),
            Err(err) => {
                self.fail(err);
                self
            }
        }
    }

    /// Append `return value`.
    #[must_use]
    pub fn ret(self, value: Value) -> Self {
        self.stmt(Stmt::ret(value))
    }

    /// Append `return`.
    #[must_use]
    pub fn ret_void(self) -> Self {
        self.stmt(Stmt::ReturnVoid)
    }

    /// Finish the body. Fails if a label was referenced or declared but
    /// never bound to a statement, or bound more than once.
    pub fn build(self) -> Result<Body> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if let Some(name) = self.pending.first() {
            return Err(IrError::UnboundLabel(name.clone()));
        }
        let mut unbound: Vec<&String> = self
            .labels
            .keys()
            .filter(|name| !self.bound.contains(*name))
            .collect();
        unbound.sort();
        if let Some(name) = unbound.first() {
            return Err(IrError::UnboundLabel((*name).clone()));
        }
        Ok(Body::from_parts(self.method, self.locals, self.units))
    }
}
