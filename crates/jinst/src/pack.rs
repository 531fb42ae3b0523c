//! Ordered transformation pack applied to every application body.

use jinst_instrument::{BodyTransform, TransformStats};
use jinst_ir::Body;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::program::Program;
use crate::{Error, Result};

/// Outcome of running the pack over a program.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PackReport {
    /// Bodies the pack ran on.
    pub bodies: usize,
    /// Bodies left unmodified after a non-fatal transform failure.
    pub skipped: usize,
    /// Statements inserted across all bodies.
    pub stats: TransformStats,
}

enum BodyOutcome {
    Transformed(TransformStats),
    Skipped,
    Fatal(Error),
}

/// Named sequence of body transforms.
pub struct Pack {
    name: String,
    transforms: Vec<Box<dyn BodyTransform>>,
    jobs: usize,
}

impl Pack {
    /// Create an empty pack that processes bodies on the calling thread.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            transforms: Vec::new(),
            jobs: 1,
        }
    }

    /// Process bodies on `jobs` threads (0 = one per CPU).
    #[must_use]
    pub const fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Register a transform. Transforms run in registration order.
    pub fn add(&mut self, transform: impl BodyTransform + 'static) {
        debug!(pack = %self.name, phase = transform.phase_name(), "registered transform");
        self.transforms.push(Box::new(transform));
    }

    /// Pack name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registered phase names, in order.
    pub fn phase_names(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.phase_name()).collect()
    }

    /// Run every transform on every application body.
    ///
    /// A body whose transform fails with a non-fatal error is restored to
    /// its original statements and the run continues. A fatal error stops
    /// the run.
    pub fn apply(&self, program: &mut Program) -> Result<PackReport> {
        let bodies = program.application_bodies_mut();
        let outcomes: Vec<BodyOutcome> = if self.jobs == 1 {
            bodies.into_iter().map(|b| self.apply_body(b)).collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.jobs)
                .build()?;
            pool.install(|| bodies.into_par_iter().map(|b| self.apply_body(b)).collect())
        };

        let mut report = PackReport::default();
        for outcome in outcomes {
            report.bodies += 1;
            match outcome {
                BodyOutcome::Transformed(stats) => report.stats += stats,
                BodyOutcome::Skipped => report.skipped += 1,
                BodyOutcome::Fatal(err) => return Err(err),
            }
        }
        Ok(report)
    }

    fn apply_body(&self, body: &mut Body) -> BodyOutcome {
        let original = body.clone();
        let mut stats = TransformStats::default();
        for transform in &self.transforms {
            match transform.transform(body) {
                Ok(s) => stats += s,
                Err(err) if !err.is_fatal() => {
                    warn!(
                        method = %body.method(),
                        phase = transform.phase_name(),
                        error = %err,
                        "leaving body unmodified"
                    );
                    *body = original;
                    return BodyOutcome::Skipped;
                }
                Err(source) => {
                    return BodyOutcome::Fatal(Error::Transform {
                        phase: transform.phase_name().to_string(),
                        method: body.method().to_string(),
                        source,
                    });
                }
            }
        }
        BodyOutcome::Transformed(stats)
    }
}

#[cfg(test)]
mod tests {
    use jinst_instrument::InstrumentError;
    use jinst_ir::{BodyBuilder, ClassDef, IrError, MethodDef, MethodRef, Stmt, StmtId, SubSignature};

    use super::*;
    use crate::classpath::ClassPath;

    /// Appends a nop to every body, failing on methods named `bad`.
    struct NopAppender {
        fatal: bool,
    }

    impl NopAppender {
        const fn new(fatal: bool) -> Self {
            Self { fatal }
        }
    }

    impl BodyTransform for NopAppender {
        fn phase_name(&self) -> &str {
            "jtp.nop"
        }

        fn transform(&self, body: &mut Body) -> jinst_instrument::Result<TransformStats> {
            body.units_mut().push(Stmt::Nop).unwrap();
            if body.method().name() == "bad" {
                if self.fatal {
                    return Err(InstrumentError::UninitializedResolver);
                }
                return Err(InstrumentError::MalformedBody {
                    method: body.method().to_string(),
                    source: IrError::UnknownStmt(StmtId(0)),
                });
            }
            Ok(TransformStats {
                counted_calls: 1,
                report_sites: 0,
            })
        }
    }

    fn program(names: &[&str]) -> Program {
        let class = names.iter().fold(ClassDef::new("Main"), |class, name| {
            let sig: SubSignature = format!("void {name}()").parse().unwrap();
            let body = BodyBuilder::new(MethodRef::new("Main", sig.clone()))
                .ret_void()
                .build()
                .unwrap();
            class.with_method(MethodDef::new(sig, vec![]).with_body(body))
        });
        let mut program = Program::new(ClassPath::default(), true);
        program.add_class(class);
        program.set_application("Main").unwrap();
        program
    }

    fn body_len(program: &Program, method: &str) -> usize {
        let class = program.classes().first().unwrap();
        let m = class
            .methods
            .iter()
            .find(|m| m.sub_signature.name == method)
            .unwrap();
        m.body.as_ref().unwrap().units().len()
    }

    #[test]
    fn test_failure_isolated_to_one_body() {
        let mut program = program(&["a", "bad", "b"]);
        let mut pack = Pack::new("jtp");
        pack.add(NopAppender::new(false));

        let report = pack.apply(&mut program).unwrap();
        assert_eq!(report.bodies, 3);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.stats.counted_calls, 2);
        assert_eq!(body_len(&program, "a"), 2);
        assert_eq!(body_len(&program, "bad"), 1);
        assert_eq!(body_len(&program, "b"), 2);
    }

    #[test]
    fn test_fatal_error_stops_run() {
        let mut program = program(&["a", "bad"]);
        let mut pack = Pack::new("jtp");
        pack.add(NopAppender::new(true));

        let err = pack.apply(&mut program).unwrap_err();
        assert!(matches!(
            err,
            Error::Transform {
                source: InstrumentError::UninitializedResolver,
                ..
            }
        ));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let names = ["a", "b", "c", "d", "bad", "e"];
        let mut sequential = program(&names);
        let mut parallel = program(&names);

        let mut pack = Pack::new("jtp");
        pack.add(NopAppender::new(false));
        let seq_report = pack.apply(&mut sequential).unwrap();

        let mut pack = Pack::new("jtp").with_jobs(4);
        pack.add(NopAppender::new(false));
        let par_report = pack.apply(&mut parallel).unwrap();

        assert_eq!(seq_report, par_report);
        assert_eq!(sequential.classes(), parallel.classes());
        assert_eq!(pack.phase_names(), vec!["jtp.nop"]);
    }
}
