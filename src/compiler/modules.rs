//! Module loading for import statements.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::engine::{Namespace, Object};
use crate::error::ImportError;
use crate::types::Value;

/// Host capability that resolves a module name to its symbol table.
pub trait ModuleLoader {
    fn load(&self, module: &str) -> Result<Rc<Namespace>, ImportError>;
}

/// In-memory modules registered by the host.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: FxHashMap<String, Rc<Namespace>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, symbols: Namespace) -> &mut Self {
        self.modules.insert(name.to_string(), Rc::new(symbols));
        self
    }

    pub fn with_module(mut self, name: &str, symbols: Namespace) -> Self {
        self.register(name, symbols);
        self
    }
}

impl ModuleLoader for ModuleRegistry {
    fn load(&self, module: &str) -> Result<Rc<Namespace>, ImportError> {
        self.modules
            .get(module)
            .cloned()
            .ok_or_else(|| ImportError::UnknownModule(module.to_string()))
    }
}

/// Read-only object exposing a module's symbols as attributes.
pub(crate) fn module_object(name: &str, symbols: &Namespace) -> Value {
    Value::Object(Object::frozen(
        name,
        symbols.iter().map(|(k, v)| (k.to_string(), v.clone())),
    ))
}
