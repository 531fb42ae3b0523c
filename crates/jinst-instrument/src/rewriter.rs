//! Static-invoke counting rewriter.

use std::sync::Arc;

use jinst_ir::{Body, InvokeExpr, IrError, Stmt, UnitChain, Value};
use tracing::{debug, info};

use crate::config::InstrumentConfig;
use crate::resolver::{CounterRefs, Resolver};
use crate::transform::{BodyTransform, TransformStats};
use crate::{InstrumentError, Result};

/// Phase name the rewriter is registered under.
pub const PHASE_NAME: &str = "jtp.instrumenter";

/// Counts receiver-less calls and reports the total when the entry method
/// returns.
///
/// Every statement carrying a static call gets an `increase(1)` call inserted
/// immediately before it. In the entry method every return additionally gets
/// a `report()` call inserted immediately before it.
pub struct StaticInvokeCounter {
    resolver: Arc<Resolver>,
    config: InstrumentConfig,
}

impl StaticInvokeCounter {
    /// Create a rewriter reading counter symbols from `resolver`.
    pub const fn new(resolver: Arc<Resolver>, config: InstrumentConfig) -> Self {
        Self { resolver, config }
    }

    /// Rewrite `body` with explicitly supplied counter references.
    pub fn instrument(&self, refs: &CounterRefs, body: &mut Body) -> Result<TransformStats> {
        let is_entry = self.config.is_entry(body.method());
        info!(method = %body.method(), entry = is_entry, "instrumenting method");

        let malformed = |body: &Body, source: IrError| InstrumentError::MalformedBody {
            method: body.method().to_string(),
            source,
        };

        let counted_calls =
            count_static_calls(refs, body.units_mut()).map_err(|e| malformed(body, e))?;
        let report_sites = if is_entry {
            report_before_returns(refs, body.units_mut()).map_err(|e| malformed(body, e))?
        } else {
            0
        };
        let stats = TransformStats {
            counted_calls,
            report_sites,
        };

        debug!(
            method = %body.method(),
            counted_calls = stats.counted_calls,
            report_sites = stats.report_sites,
            "instrumented"
        );
        Ok(stats)
    }
}

impl BodyTransform for StaticInvokeCounter {
    fn phase_name(&self) -> &str {
        PHASE_NAME
    }

    fn transform(&self, body: &mut Body) -> Result<TransformStats> {
        let refs = self.resolver.refs()?;
        self.instrument(refs, body)
    }
}

/// Insert `increase(1)` before every statement carrying a static call.
///
/// Positions come from a snapshot taken before the first insertion, so the
/// inserted calls, themselves static, are never visited.
fn count_static_calls(refs: &CounterRefs, units: &mut UnitChain) -> jinst_ir::Result<usize> {
    let snapshot = units.snapshot()?;
    let mut inserted = 0;
    for id in snapshot {
        let stmt = units.get(id).ok_or(IrError::UnknownStmt(id))?;
        if !stmt.invoke_expr().is_some_and(InvokeExpr::is_static) {
            continue;
        }

        let increase = InvokeExpr::new_static(refs.increase().clone(), vec![Value::int(1)]);
        units.insert_before(Stmt::invoke(increase), id)?;
        inserted += 1;
    }
    Ok(inserted)
}

/// Insert `report()` before every return, with or without a value.
fn report_before_returns(refs: &CounterRefs, units: &mut UnitChain) -> jinst_ir::Result<usize> {
    let snapshot = units.snapshot()?;
    let mut inserted = 0;
    for id in snapshot {
        if !units.get(id).ok_or(IrError::UnknownStmt(id))?.is_return() {
            continue;
        }

        let report = InvokeExpr::new_static(refs.report().clone(), Vec::new());
        units.insert_before(Stmt::invoke(report), id)?;
        inserted += 1;
    }
    Ok(inserted)
}
