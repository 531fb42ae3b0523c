//! Writes transformed classes to the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use jinst_ir::ClassDef;

use crate::classpath::{CLASS_EXTENSION, ClassPath};
use crate::{Error, Result};

/// Output file format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Same format the class path is read in, so output can be fed back in.
    #[default]
    Json,
    /// Human-readable listing.
    Jimple,
}

impl OutputFormat {
    /// File extension for this format.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => CLASS_EXTENSION,
            Self::Jimple => "jimple",
        }
    }
}

/// Write one class below `output_dir`, returning the file written.
pub fn write_class(output_dir: &Path, class: &ClassDef, format: OutputFormat) -> Result<PathBuf> {
    let path = output_dir.join(ClassPath::relative_path(&class.name, format.extension()));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(class).map_err(|source| Error::Json {
                path: path.clone(),
                source,
            })?
        }
        OutputFormat::Jimple => class.to_string(),
    };
    fs::write(&path, text)?;
    Ok(path)
}
