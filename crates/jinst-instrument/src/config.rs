//! Instrumentation configuration.

use jinst_ir::{MethodRef, SubSignature};

/// Counter class looked up when no other is configured.
pub const DEFAULT_COUNTER_CLASS: &str = "MyCounter";

/// Which methods count as the designated entry method.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum EntryScope {
    /// Any method with the entry sub-signature, in any class.
    #[default]
    AnyClass,
    /// Only the entry sub-signature declared by this class.
    Class(String),
}

/// Instrumentation configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstrumentConfig {
    /// Fully qualified name of the counter class.
    pub counter_class: String,
    /// Sub-signature of the entry method.
    pub entry: SubSignature,
    /// Where the entry method may be declared.
    pub entry_scope: EntryScope,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            counter_class: DEFAULT_COUNTER_CLASS.to_string(),
            entry: SubSignature::main(),
            entry_scope: EntryScope::AnyClass,
        }
    }
}

impl InstrumentConfig {
    /// Set the counter class.
    #[must_use]
    pub fn with_counter_class(mut self, name: &str) -> Self {
        self.counter_class = name.to_string();
        self
    }

    /// Set the entry scope.
    #[must_use]
    pub fn with_entry_scope(mut self, scope: EntryScope) -> Self {
        self.entry_scope = scope;
        self
    }

    /// Check if `method` is the designated entry method.
    pub fn is_entry(&self, method: &MethodRef) -> bool {
        if method.sub_signature != self.entry {
            return false;
        }
        match &self.entry_scope {
            EntryScope::AnyClass => true,
            EntryScope::Class(name) => &method.class == name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_any_class() {
        let config = InstrumentConfig::default();
        assert!(config.is_entry(&MethodRef::new("A", SubSignature::main())));
        assert!(config.is_entry(&MethodRef::new("B", SubSignature::main())));
        let int_main = "int main(java.lang.String[])".parse().unwrap();
        assert!(!config.is_entry(&MethodRef::new("A", int_main)));
        let no_args = "void main()".parse().unwrap();
        assert!(!config.is_entry(&MethodRef::new("A", no_args)));
    }

    #[test]
    fn test_entry_scoped_to_class() {
        let config = InstrumentConfig::default().with_entry_scope(EntryScope::Class("A".into()));
        assert!(config.is_entry(&MethodRef::new("A", SubSignature::main())));
        assert!(!config.is_entry(&MethodRef::new("B", SubSignature::main())));
    }
}
