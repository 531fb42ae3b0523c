//! Body transformation trait.

use std::ops::AddAssign;

use jinst_ir::Body;

use crate::Result;

/// Counts of statements inserted by one transformation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransformStats {
    /// `increase(1)` calls inserted before receiver-less calls.
    pub counted_calls: usize,
    /// `report()` calls inserted before returns.
    pub report_sites: usize,
}

impl TransformStats {
    /// Check if the transformation inserted nothing.
    pub const fn is_empty(&self) -> bool {
        self.counted_calls == 0 && self.report_sites == 0
    }
}

impl AddAssign for TransformStats {
    fn add_assign(&mut self, rhs: Self) {
        self.counted_calls += rhs.counted_calls;
        self.report_sites += rhs.report_sites;
    }
}

/// A pass that rewrites one method body at a time.
///
/// Implementations hold no per-body state, so one instance may be applied to
/// many bodies, including from several threads.
pub trait BodyTransform: Send + Sync {
    /// Phase name the transform is registered under.
    fn phase_name(&self) -> &str;

    /// Rewrite `body` in place.
    fn transform(&self, body: &mut Body) -> Result<TransformStats>;
}
