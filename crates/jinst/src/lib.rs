//! JINST - static invocation counter for JVM classes
//!
//! Loads classes from a class path, inserts counter calls before every
//! receiver-less call and a report call before every return of the entry
//! method, then writes the instrumented classes out.
//!
//! # Example
//!
//! ```ignore
//! use jinst::{Options, run};
//!
//! let options = Options::new(vec!["TestInvoke".into()]);
//! let report = run(&options)?;
//! println!("{} static call sites instrumented", report.stats.counted_calls);
//! ```

mod classpath;
mod emit;
mod pack;
mod program;

pub use classpath::*;
pub use emit::*;
pub use pack::*;
pub use program::*;

// Re-export from sub-crates
pub use jinst_instrument::{
    BodyTransform, ClassRegistry, CounterRefs, DEFAULT_COUNTER_CLASS, EntryScope,
    InstrumentConfig, InstrumentError, PHASE_NAME, ResolutionError, Resolver,
    StaticInvokeCounter, TransformStats,
};
pub use jinst_ir::{Body, ClassDef, IrError, MethodDef, MethodRef, Stmt, SubSignature};

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

/// Driver errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid class in {path}: {source}")]
    InvalidClass {
        path: PathBuf,
        #[source]
        source: IrError,
    },
    #[error("{path} declares class `{found}`, expected `{expected}`")]
    ClassNameMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
    #[error("class `{0}` not found on the class path")]
    ClassNotFound(String),
    #[error("no classes given")]
    NoClasses,
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error("{phase} failed on {method}: {source}")]
    Transform {
        phase: String,
        method: String,
        #[source]
        source: InstrumentError,
    },
    #[error("failed to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Pack the instrumenter is registered in.
pub const PACK_NAME: &str = "jtp";

/// Options for one instrumentation run.
#[derive(Clone, Debug)]
pub struct Options {
    /// Application classes to instrument.
    pub classes: Vec<String>,
    /// Class path directories, searched in order.
    pub class_path: Vec<PathBuf>,
    /// Where instrumented classes are written.
    pub output_dir: PathBuf,
    /// Output file format.
    pub format: OutputFormat,
    /// Treat classes missing from the class path as phantom classes.
    pub allow_phantom_refs: bool,
    /// Worker threads for body transformation (0 = one per CPU).
    pub jobs: usize,
    /// Instrumentation settings.
    pub instrument: InstrumentConfig,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            classes: Vec::new(),
            class_path: vec![PathBuf::from(".")],
            output_dir: PathBuf::from("sootOutput"),
            format: OutputFormat::Json,
            allow_phantom_refs: true,
            jobs: 1,
            instrument: InstrumentConfig::default(),
        }
    }
}

impl Options {
    /// Default options for the given application classes.
    pub fn new(classes: Vec<String>) -> Self {
        Self {
            classes,
            ..Self::default()
        }
    }
}

/// Load, instrument and write out the application classes.
///
/// Counter symbols are resolved before any body is touched; failing to
/// resolve them aborts the run with nothing written.
pub fn run(options: &Options) -> Result<PackReport> {
    if options.classes.is_empty() {
        return Err(Error::NoClasses);
    }

    let mut program = Program::new(
        ClassPath::new(options.class_path.clone()),
        options.allow_phantom_refs,
    );
    for name in &options.classes {
        program.load_class_and_support(name)?;
        program.set_application(name)?;
    }

    let counter_class = &options.instrument.counter_class;
    program.load_class_and_support(counter_class)?;
    let resolver = Arc::new(Resolver::new(counter_class));
    let refs = resolver.initialize(&program)?;
    debug!(increase = %refs.increase(), report = %refs.report(), "resolved counter symbols");

    let mut pack = Pack::new(PACK_NAME).with_jobs(options.jobs);
    pack.add(StaticInvokeCounter::new(
        Arc::clone(&resolver),
        options.instrument.clone(),
    ));
    debug!(pack = pack.name(), phases = ?pack.phase_names(), "applying pack");
    let report = pack.apply(&mut program)?;

    for class in program.application_classes() {
        let path = write_class(&options.output_dir, class, options.format)?;
        debug!(class = %class.name, path = %path.display(), "wrote class");
    }

    info!(
        bodies = report.bodies,
        skipped = report.skipped,
        counted_calls = report.stats.counted_calls,
        report_sites = report.stats.report_sites,
        output = %options.output_dir.display(),
        "done"
    );
    Ok(report)
}
