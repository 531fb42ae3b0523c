//! Class path lookup.

use std::fs;
use std::path::{Path, PathBuf};

use jinst_ir::ClassDef;
use tracing::trace;

use crate::{Error, Result};

/// File extension of serialized classes.
pub const CLASS_EXTENSION: &str = "json";

/// Ordered list of directories searched for classes.
///
/// Class `a.b.C` lives at `<dir>/a/b/C.json`; the first directory that has
/// it wins.
#[derive(Clone, Debug, Default)]
pub struct ClassPath {
    dirs: Vec<PathBuf>,
}

impl ClassPath {
    /// Create a class path from directories, searched in order.
    pub const fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Path of a class relative to a class path directory.
    pub fn relative_path(class_name: &str, extension: &str) -> PathBuf {
        let mut path: PathBuf = class_name.split('.').collect();
        path.set_extension(extension);
        path
    }

    /// Locate the file for a class.
    pub fn find(&self, class_name: &str) -> Option<PathBuf> {
        let rel = Self::relative_path(class_name, CLASS_EXTENSION);
        self.dirs.iter().map(|d| d.join(&rel)).find(|p| p.is_file())
    }

    /// Load a class. Returns `Ok(None)` if no directory has it.
    pub fn load(&self, class_name: &str) -> Result<Option<ClassDef>> {
        let Some(path) = self.find(class_name) else {
            return Ok(None);
        };
        trace!(class = class_name, path = %path.display(), "reading class");
        let class = read_class(&path)?;
        if class.name != class_name {
            return Err(Error::ClassNameMismatch {
                path,
                expected: class_name.to_string(),
                found: class.name,
            });
        }
        Ok(Some(class))
    }
}

fn read_class(path: &Path) -> Result<ClassDef> {
    let text = fs::read_to_string(path)?;
    let class: ClassDef = serde_json::from_str(&text).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    class.validate().map_err(|source| Error::InvalidClass {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(class)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path() {
        assert_eq!(
            ClassPath::relative_path("a.b.Main", "json"),
            PathBuf::from("a").join("b").join("Main.json")
        );
        assert_eq!(ClassPath::relative_path("Main", "jimple"), PathBuf::from("Main.jimple"));
    }

    #[test]
    fn test_first_directory_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        for dir in [&first, &second] {
            let class = serde_json::to_string(&ClassDef::new("Main")).unwrap();
            fs::write(dir.path().join("Main.json"), class).unwrap();
        }
        let cp = ClassPath::new(vec![first.path().into(), second.path().into()]);
        assert_eq!(cp.find("Main").unwrap(), first.path().join("Main.json"));
        assert!(cp.find("Other").is_none());
        assert!(cp.load("Other").unwrap().is_none());
    }

    #[test]
    fn test_load_rejects_wrong_name_and_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let class = serde_json::to_string(&ClassDef::new("Other")).unwrap();
        fs::write(dir.path().join("Main.json"), class).unwrap();
        fs::write(dir.path().join("Broken.json"), "{ not json").unwrap();

        let cp = ClassPath::new(vec![dir.path().into()]);
        assert!(matches!(cp.load("Main"), Err(Error::ClassNameMismatch { .. })));
        assert!(matches!(cp.load("Broken"), Err(Error::Json { .. })));
    }
}
