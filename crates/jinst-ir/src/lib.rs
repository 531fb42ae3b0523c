//! Statement-level IR for JVM method bodies.
//!
//! This crate provides the pure IR types the instrumentation passes operate
//! on. Loading classes and writing them back out lives in `jinst`.

mod body;
mod builder;
mod chain;
mod class;
mod stmt;
mod types;
mod value;

pub use body::*;
pub use builder::*;
pub use chain::*;
pub use class::*;
pub use stmt::*;
pub use types::*;
pub use value::*;

use thiserror::Error;

/// IR construction and mutation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IrError {
    #[error("statement {0} is not in the chain")]
    UnknownStmt(StmtId),
    #[error("statement id {0} appears more than once")]
    DuplicateStmt(StmtId),
    #[error("statement {from} branches to missing statement {target}")]
    DanglingTarget { from: StmtId, target: StmtId },
    #[error("statement {0} uses a call as an operand")]
    NestedInvoke(StmtId),
    #[error("no statement ids left in the chain")]
    IdsExhausted,
    #[error("label `{0}` was never bound")]
    UnboundLabel(String),
    #[error("label `{0}` is bound twice")]
    DuplicateLabel(String),
    #[error("body of {found} is attached to {expected}")]
    BodyOwnerMismatch { expected: String, found: String },
    #[error("invalid type `{0}`")]
    InvalidType(String),
    #[error("invalid method sub-signature `{0}`")]
    InvalidSubSignature(String),
}

pub type Result<T> = std::result::Result<T, IrError>;
