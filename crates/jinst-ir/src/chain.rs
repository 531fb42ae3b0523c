//! Ordered, mutable statement sequence of a method body.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::stmt::{Stmt, StmtId};
use crate::{IrError, Result};

/// A statement together with its identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: StmtId,
    pub stmt: Stmt,
}

/// Statement chain with stable identities.
///
/// Positions shift as statements are inserted; ids do not. Branches name
/// their targets by id, and inserting before a statement moves every branch
/// aimed at it onto the inserted statement, which then falls through.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Unit>", into = "Vec<Unit>")]
pub struct UnitChain {
    units: Vec<Unit>,
    next_id: u64,
}

impl UnitChain {
    /// Create an empty chain.
    pub const fn new() -> Self {
        Self {
            units: Vec::new(),
            next_id: 0,
        }
    }

    fn alloc_id(&mut self) -> Result<StmtId> {
        let id = u32::try_from(self.next_id).map_err(|_| IrError::IdsExhausted)?;
        self.next_id += 1;
        Ok(StmtId(id))
    }

    /// Reserve an id without placing a statement. Used for forward labels.
    pub(crate) fn reserve_id(&mut self) -> Result<StmtId> {
        self.alloc_id()
    }

    /// Append a statement with a previously reserved id.
    pub(crate) fn push_with_id(&mut self, id: StmtId, stmt: Stmt) {
        self.units.push(Unit { id, stmt });
    }

    /// Point every branch aimed at `from` to `to`.
    pub(crate) fn redirect_all(&mut self, from: StmtId, to: StmtId) {
        for unit in &mut self.units {
            unit.stmt.redirect(from, to);
        }
    }

    /// Append a statement, returning its id.
    pub fn push(&mut self, stmt: Stmt) -> Result<StmtId> {
        let id = self.alloc_id()?;
        self.units.push(Unit { id, stmt });
        Ok(id)
    }

    /// Number of statements.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Iterate statements in order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    /// Iterate statement bodies in order.
    pub fn stmts(&self) -> impl Iterator<Item = &Stmt> {
        self.units.iter().map(|u| &u.stmt)
    }

    /// Current position of a statement.
    pub fn position(&self, id: StmtId) -> Option<usize> {
        self.units.iter().position(|u| u.id == id)
    }

    /// Look up a statement by id.
    pub fn get(&self, id: StmtId) -> Option<&Stmt> {
        self.units.iter().find(|u| u.id == id).map(|u| &u.stmt)
    }

    /// Take an immutable ordered list of the current statement ids.
    ///
    /// Later insertions do not affect the returned list. Fails if ids repeat,
    /// a branch names a statement that is not in the chain, or a call is
    /// nested inside another value.
    pub fn snapshot(&self) -> Result<Vec<StmtId>> {
        let mut seen = HashSet::with_capacity(self.units.len());
        for unit in &self.units {
            if !seen.insert(unit.id) {
                return Err(IrError::DuplicateStmt(unit.id));
            }
            if !unit.stmt.is_three_address() {
                return Err(IrError::NestedInvoke(unit.id));
            }
        }
        for unit in &self.units {
            if let Some(target) = unit.stmt.target() {
                if !seen.contains(&target) {
                    return Err(IrError::DanglingTarget {
                        from: unit.id,
                        target,
                    });
                }
            }
        }
        Ok(self.units.iter().map(|u| u.id).collect())
    }

    /// Insert `stmt` immediately before `anchor`.
    ///
    /// Branches that targeted `anchor` now target the new statement.
    pub fn insert_before(&mut self, stmt: Stmt, anchor: StmtId) -> Result<StmtId> {
        let pos = self.position(anchor).ok_or(IrError::UnknownStmt(anchor))?;
        let id = self.alloc_id()?;
        self.units.insert(pos, Unit { id, stmt });
        for unit in &mut self.units {
            if unit.id != id {
                unit.stmt.redirect(anchor, id);
            }
        }
        Ok(id)
    }
}

impl PartialEq for UnitChain {
    fn eq(&self, other: &Self) -> bool {
        self.units == other.units
    }
}

impl Eq for UnitChain {}

impl From<Vec<Unit>> for UnitChain {
    fn from(units: Vec<Unit>) -> Self {
        let next_id = units.iter().map(|u| u64::from(u.id.0) + 1).max().unwrap_or(0);
        Self { units, next_id }
    }
}

impl From<UnitChain> for Vec<Unit> {
    fn from(chain: UnitChain) -> Self {
        chain.units
    }
}
