//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use jinst::{DEFAULT_COUNTER_CLASS, EntryScope, InstrumentConfig, Options, OutputFormat};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "jinst")]
#[command(about = "Instruments JVM classes to count static invocations at run time")]
#[command(version)]
pub struct Cli {
    /// Classes to instrument (fully qualified names)
    #[arg(value_name = "CLASS", required = true)]
    pub classes: Vec<String>,

    /// Class path directory; repeat to search several in order
    #[arg(long = "cp", value_name = "DIR", default_value = ".")]
    pub class_path: Vec<PathBuf>,

    /// Output directory
    #[arg(short = 'd', long, default_value = "sootOutput")]
    pub output_dir: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    pub format: FormatArg,

    /// Counter class providing `void increase(int)` and `void report()`
    #[arg(long, default_value = DEFAULT_COUNTER_CLASS)]
    pub counter_class: String,

    /// Which `void main(java.lang.String[])` methods get report calls
    #[arg(long, value_enum, default_value = "any")]
    pub entry_scope: EntryScopeArg,

    /// Class whose main method is the entry; implies `--entry-scope main-class`
    /// (defaults to the first CLASS)
    #[arg(long, value_name = "CLASS")]
    pub main_class: Option<String>,

    /// Fail on classes missing from the class path instead of treating them as phantom
    #[arg(long)]
    pub no_phantom_refs: bool,

    /// Number of threads transforming bodies (0 = auto)
    #[arg(short = 'j', long, default_value = "1")]
    pub jobs: usize,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, conflicts_with = "verbose")]
    pub silent: bool,
}

/// Output format argument.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    Json,
    Jimple,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => Self::Json,
            FormatArg::Jimple => Self::Jimple,
        }
    }
}

/// Entry scope argument.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum EntryScopeArg {
    /// Every loaded class's main method
    Any,
    /// Only the main class's main method
    MainClass,
}

impl Cli {
    /// Default log filter for the chosen verbosity.
    pub const fn log_level(&self) -> &'static str {
        if self.verbose {
            "jinst=debug"
        } else if self.silent {
            "jinst=error"
        } else {
            "jinst=info"
        }
    }

    /// Build run options from the parsed arguments.
    pub fn to_options(&self) -> Options {
        let entry_scope = match (self.entry_scope, &self.main_class) {
            (_, Some(main)) => EntryScope::Class(main.clone()),
            (EntryScopeArg::MainClass, None) => {
                EntryScope::Class(self.classes.first().cloned().unwrap_or_default())
            }
            (EntryScopeArg::Any, None) => EntryScope::AnyClass,
        };

        Options {
            classes: self.classes.clone(),
            class_path: self.class_path.clone(),
            output_dir: self.output_dir.clone(),
            format: self.format.into(),
            allow_phantom_refs: !self.no_phantom_refs,
            jobs: self.jobs,
            instrument: InstrumentConfig::default()
                .with_counter_class(&self.counter_class)
                .with_entry_scope(entry_scope),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Options {
        Cli::parse_from(std::iter::once("jinst").chain(args.iter().copied())).to_options()
    }

    #[test]
    fn test_entry_scope_defaults_to_any() {
        let options = parse(&["app.Main", "app.Util"]);
        assert_eq!(options.instrument.entry_scope, EntryScope::AnyClass);
        assert_eq!(options.instrument.counter_class, DEFAULT_COUNTER_CLASS);
    }

    #[test]
    fn test_main_class_scope() {
        let options = parse(&["--entry-scope", "main-class", "app.Main", "app.Util"]);
        assert_eq!(options.instrument.entry_scope, EntryScope::Class("app.Main".into()));
    }

    #[test]
    fn test_main_class_implies_scope() {
        let options = parse(&["--main-class", "app.Util", "app.Main", "app.Util"]);
        assert_eq!(options.instrument.entry_scope, EntryScope::Class("app.Util".into()));
    }
}
