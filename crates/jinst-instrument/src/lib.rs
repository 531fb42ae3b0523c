//! Counting instrumentation for JVM method bodies.
//!
//! Inserts a call to a counter's `increase(1)` before every receiver-less
//! call and a call to its `report()` before every return of the entry method.

mod config;
mod resolver;
mod rewriter;
mod transform;

pub use config::*;
pub use resolver::*;
pub use rewriter::*;
pub use transform::*;

use jinst_ir::{IrError, SubSignature};
use thiserror::Error;

/// Counter symbol resolution errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("counter class `{0}` is not loadable")]
    ClassNotFound(String),
    #[error("counter class `{class}` has no method `{sub_signature}`")]
    MethodNotFound {
        class: String,
        sub_signature: SubSignature,
    },
}

/// Instrumentation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstrumentError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error("counter symbols used before the resolver was initialized")]
    UninitializedResolver,
    #[error("malformed body of {method}: {source}")]
    MalformedBody {
        method: String,
        #[source]
        source: IrError,
    },
}

impl InstrumentError {
    /// Check if the error must stop the whole run rather than one body.
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::MalformedBody { .. })
    }
}

pub type Result<T> = std::result::Result<T, InstrumentError>;
