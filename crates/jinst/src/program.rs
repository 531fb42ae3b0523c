//! The class universe of one run.

use std::collections::VecDeque;

use jinst_instrument::ClassRegistry;
use jinst_ir::{Body, ClassDef};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::classpath::ClassPath;
use crate::{Error, Result};

/// Every class loaded for a run, plus which of them are application classes.
///
/// Application classes are the ones whose bodies get transformed and written
/// out; the rest are only there to be referenced.
pub struct Program {
    class_path: ClassPath,
    allow_phantom_refs: bool,
    classes: Vec<ClassDef>,
    index: FxHashMap<String, usize>,
    application: FxHashSet<String>,
}

impl Program {
    /// Create an empty program.
    ///
    /// With `allow_phantom_refs`, classes missing from the class path are
    /// recorded as phantom classes instead of failing the load.
    pub fn new(class_path: ClassPath, allow_phantom_refs: bool) -> Self {
        Self {
            class_path,
            allow_phantom_refs,
            classes: Vec::new(),
            index: FxHashMap::default(),
            application: FxHashSet::default(),
        }
    }

    /// Add or replace a class.
    pub fn add_class(&mut self, class: ClassDef) {
        if let Some(&idx) = self.index.get(&class.name) {
            self.classes[idx] = class;
        } else {
            self.index.insert(class.name.clone(), self.classes.len());
            self.classes.push(class);
        }
    }

    /// Load a class and, transitively, every class it references.
    pub fn load_class_and_support(&mut self, name: &str) -> Result<&ClassDef> {
        let mut worklist = VecDeque::from([name.to_string()]);
        while let Some(next) = worklist.pop_front() {
            if self.index.contains_key(&next) {
                continue;
            }
            let class = match self.class_path.load(&next)? {
                Some(class) => class,
                None if self.allow_phantom_refs => {
                    debug!(class = %next, "not on class path, adding phantom class");
                    ClassDef::phantom(&next)
                }
                None => return Err(Error::ClassNotFound(next)),
            };
            worklist.extend(
                class
                    .referenced_classes()
                    .into_iter()
                    .filter(|r| !self.index.contains_key(*r))
                    .map(str::to_string),
            );
            self.add_class(class);
        }
        self.class(name)
            .ok_or_else(|| Error::ClassNotFound(name.to_string()))
    }

    /// Mark a loaded class as an application class.
    pub fn set_application(&mut self, name: &str) -> Result<()> {
        match self.class(name) {
            Some(class) if class.phantom => {
                warn!(class = name, "application class is phantom, nothing to transform");
                Err(Error::ClassNotFound(name.to_string()))
            }
            Some(_) => {
                self.application.insert(name.to_string());
                Ok(())
            }
            None => Err(Error::ClassNotFound(name.to_string())),
        }
    }

    /// All loaded classes, in load order.
    pub fn classes(&self) -> &[ClassDef] {
        &self.classes
    }

    /// Application classes, in load order.
    pub fn application_classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes
            .iter()
            .filter(|c| self.application.contains(&c.name))
    }

    /// Bodies of every application class method.
    pub fn application_bodies_mut(&mut self) -> Vec<&mut Body> {
        let application = &self.application;
        self.classes
            .iter_mut()
            .filter(|c| application.contains(&c.name))
            .flat_map(ClassDef::bodies_mut)
            .collect()
    }
}

impl ClassRegistry for Program {
    fn class(&self, name: &str) -> Option<&ClassDef> {
        self.index.get(name).map(|&idx| &self.classes[idx])
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use jinst_ir::{BodyBuilder, InvokeExpr, MethodDef, MethodRef, Modifier, SubSignature};

    use super::*;

    fn write_class(dir: &Path, class: &ClassDef) {
        let path = dir.join(ClassPath::relative_path(&class.name, "json"));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_string(class).unwrap()).unwrap();
    }

    fn main_calling(target: &str) -> ClassDef {
        let sig = SubSignature::main();
        let callee = MethodRef::new(target, "void run()".parse().unwrap());
        let body = BodyBuilder::new(MethodRef::new("app.Main", sig.clone()))
            .invoke(InvokeExpr::new_static(callee, vec![]))
            .ret_void()
            .build()
            .unwrap();
        ClassDef::new("app.Main").with_method(
            MethodDef::new(sig, vec![Modifier::Public, Modifier::Static]).with_body(body),
        )
    }

    #[test]
    fn test_load_transitive_with_phantoms() {
        let dir = tempfile::tempdir().unwrap();
        write_class(dir.path(), &main_calling("app.Util"));
        write_class(dir.path(), &ClassDef::new("app.Util"));

        let mut program = Program::new(ClassPath::new(vec![dir.path().into()]), true);
        program.load_class_and_support("app.Main").unwrap();

        let util = program.class("app.Util").unwrap();
        assert!(!util.phantom);
        let object = program.class("java.lang.Object").unwrap();
        assert!(object.phantom);
        assert_eq!(program.classes().len(), 3);
    }

    #[test]
    fn test_load_without_phantoms_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_class(dir.path(), &main_calling("app.Missing"));

        let mut program = Program::new(ClassPath::new(vec![dir.path().into()]), false);
        let err = program.load_class_and_support("app.Main").unwrap_err();
        assert!(matches!(err, Error::ClassNotFound(ref name) if name == "app.Missing" || name == "java.lang.Object"));
    }

    #[test]
    fn test_application_bodies() {
        let mut program = Program::new(ClassPath::default(), true);
        program.add_class(main_calling("app.Util"));
        program.add_class(ClassDef::phantom("app.Util"));

        assert!(program.application_bodies_mut().is_empty());
        program.set_application("app.Main").unwrap();
        assert!(program.set_application("app.Util").is_err());
        assert!(program.set_application("app.Nope").is_err());
        assert_eq!(program.application_bodies_mut().len(), 1);
        assert_eq!(program.application_classes().count(), 1);
    }
}
