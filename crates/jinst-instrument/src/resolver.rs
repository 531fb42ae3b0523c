//! Counter symbol resolution.

use std::sync::OnceLock;

use jinst_ir::{ClassDef, MethodRef, SubSignature, Type};
use tracing::debug;

use crate::{InstrumentError, ResolutionError};

/// Class universe the resolver looks symbols up in.
pub trait ClassRegistry {
    /// Find a class by fully qualified name.
    fn class(&self, name: &str) -> Option<&ClassDef>;
}

/// `void increase(int)`.
pub fn increase_sub_signature() -> SubSignature {
    SubSignature::new(Type::Void, "increase", vec![Type::Int])
}

/// `void report()`.
pub fn report_sub_signature() -> SubSignature {
    SubSignature::new(Type::Void, "report", Vec::new())
}

/// Resolved references to the counter's two operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CounterRefs {
    increase: MethodRef,
    report: MethodRef,
}

impl CounterRefs {
    /// Build from already-known references.
    pub const fn new(increase: MethodRef, report: MethodRef) -> Self {
        Self { increase, report }
    }

    /// Look up the counter class and both operations by exact sub-signature.
    pub fn resolve<R>(registry: &R, class_name: &str) -> Result<Self, ResolutionError>
    where
        R: ClassRegistry + ?Sized,
    {
        let class = registry
            .class(class_name)
            .filter(|c| !c.phantom)
            .ok_or_else(|| ResolutionError::ClassNotFound(class_name.to_string()))?;

        debug!(
            class = %class.name,
            package = class.package(),
            methods = class.methods.len(),
            "resolved counter class"
        );

        let lookup = |sub_signature: SubSignature| {
            if class.method(&sub_signature).is_some() {
                Ok(class.method_ref(&sub_signature))
            } else {
                Err(ResolutionError::MethodNotFound {
                    class: class.name.clone(),
                    sub_signature,
                })
            }
        };

        Ok(Self {
            increase: lookup(increase_sub_signature())?,
            report: lookup(report_sub_signature())?,
        })
    }

    /// `increase(int)` on the counter class.
    pub const fn increase(&self) -> &MethodRef {
        &self.increase
    }

    /// `report()` on the counter class.
    pub const fn report(&self) -> &MethodRef {
        &self.report
    }
}

/// Process-wide, initialize-once holder for the counter references.
///
/// After `initialize` succeeds the references never change and can be read
/// from any thread without locking.
#[derive(Debug)]
pub struct Resolver {
    class_name: String,
    refs: OnceLock<CounterRefs>,
}

impl Resolver {
    /// Create an uninitialized resolver for the named counter class.
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            refs: OnceLock::new(),
        }
    }

    /// Create a resolver that is already initialized with `refs`.
    pub fn with_refs(refs: CounterRefs) -> Self {
        let class_name = refs.increase.class.clone();
        Self {
            class_name,
            refs: OnceLock::from(refs),
        }
    }

    /// Resolve the counter symbols, or return the cached ones.
    ///
    /// Only the first successful call performs the lookup.
    pub fn initialize<R>(&self, registry: &R) -> Result<&CounterRefs, ResolutionError>
    where
        R: ClassRegistry + ?Sized,
    {
        if let Some(refs) = self.refs.get() {
            return Ok(refs);
        }
        let refs = CounterRefs::resolve(registry, &self.class_name)?;
        Ok(self.refs.get_or_init(|| refs))
    }

    /// Cached counter references.
    pub fn refs(&self) -> Result<&CounterRefs, InstrumentError> {
        self.refs.get().ok_or(InstrumentError::UninitializedResolver)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use jinst_ir::{MethodDef, Modifier};

    use super::*;

    #[derive(Default)]
    struct FakeRegistry {
        classes: HashMap<String, ClassDef>,
    }

    impl FakeRegistry {
        fn with(mut self, class: ClassDef) -> Self {
            self.classes.insert(class.name.clone(), class);
            self
        }
    }

    impl ClassRegistry for FakeRegistry {
        fn class(&self, name: &str) -> Option<&ClassDef> {
            self.classes.get(name)
        }
    }

    fn counter_with(sigs: &[&str]) -> ClassDef {
        sigs.iter().fold(ClassDef::new("MyCounter"), |class, sig| {
            class.with_method(MethodDef::new(
                sig.parse().unwrap(),
                vec![Modifier::Public, Modifier::Static],
            ))
        })
    }

    #[test]
    fn test_resolve_counter() {
        let registry = FakeRegistry::default().with(counter_with(&["void increase(int)", "void report()"]));
        let refs = CounterRefs::resolve(&registry, "MyCounter").unwrap();
        assert_eq!(refs.increase().to_string(), "<MyCounter: void increase(int)>");
        assert_eq!(refs.report().to_string(), "<MyCounter: void report()>");
    }

    #[test]
    fn test_missing_class() {
        let registry = FakeRegistry::default();
        let err = CounterRefs::resolve(&registry, "MyCounter").unwrap_err();
        assert_eq!(err, ResolutionError::ClassNotFound("MyCounter".into()));
    }

    #[test]
    fn test_phantom_class_is_not_loadable() {
        let registry = FakeRegistry::default().with(ClassDef::phantom("MyCounter"));
        let err = CounterRefs::resolve(&registry, "MyCounter").unwrap_err();
        assert_eq!(err, ResolutionError::ClassNotFound("MyCounter".into()));
    }

    #[test]
    fn test_report_with_wrong_signature() {
        let registry = FakeRegistry::default().with(counter_with(&["void increase(int)", "int report()"]));
        let err = CounterRefs::resolve(&registry, "MyCounter").unwrap_err();
        assert_eq!(
            err,
            ResolutionError::MethodNotFound {
                class: "MyCounter".into(),
                sub_signature: report_sub_signature(),
            }
        );
        assert_eq!(err.to_string(), "counter class `MyCounter` has no method `void report()`");
    }

    #[test]
    fn test_increase_with_wrong_parameter() {
        let registry = FakeRegistry::default().with(counter_with(&["void increase(long)", "void report()"]));
        let err = CounterRefs::resolve(&registry, "MyCounter").unwrap_err();
        assert!(matches!(err, ResolutionError::MethodNotFound { ref sub_signature, .. } if sub_signature.name == "increase"));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let registry = FakeRegistry::default().with(counter_with(&["void increase(int)", "void report()"]));
        let resolver = Resolver::new("MyCounter");
        assert_eq!(resolver.refs().unwrap_err(), InstrumentError::UninitializedResolver);

        let first = resolver.initialize(&registry).unwrap().clone();
        let second = resolver.initialize(&registry).unwrap();
        assert_eq!(&first, second);
        assert!(std::ptr::eq(resolver.refs().unwrap(), second));

        // Once cached, the registry is no longer consulted.
        let empty = FakeRegistry::default();
        assert_eq!(resolver.initialize(&empty).unwrap(), &first);
    }

    #[test]
    fn test_failed_initialize_leaves_resolver_empty() {
        let resolver = Resolver::new("MyCounter");
        assert!(resolver.initialize(&FakeRegistry::default()).is_err());
        assert!(resolver.refs().is_err());
    }
}
