//! View Factory
//!
//! Compiles a document once and stamps out live views from it.
//!
//! ```ignore
//! let queue = Rc::new(TaskQueue::new());
//! let factory = ViewFactory::from_json(json, FactoryConfig::new(Toolkit::headless(), queue.clone()))?;
//! let view = factory.instantiate(Namespace::new().with("user", user))?;
//! view.resize(Size::new(640.0, 480.0));
//! queue.run_pending();
//! ```

use std::rc::Rc;

use tracing::debug;

use super::scheduler::Scheduler;
use crate::ast::Document;
use crate::binding::BindingFactories;
use crate::compiler::{compile, CompiledView, ModuleLoader, ModuleRegistry, Toolkit};
use crate::engine::{builtins, Component, Host, Namespace, Object, Scope};
use crate::error::ViewError;
use crate::layout::LayoutConfig;
use crate::types::{Size, Value};

/// Everything a factory needs, passed explicitly. There is no global
/// toolkit.
#[derive(Clone)]
pub struct FactoryConfig {
    pub toolkit: Toolkit,
    pub modules: Rc<dyn ModuleLoader>,
    pub factories: BindingFactories,
    pub scheduler: Rc<dyn Scheduler>,
    pub layout: LayoutConfig,
}

impl FactoryConfig {
    /// Config with no importable modules, the standard binding factories
    /// and the default layout strengths.
    pub fn new(toolkit: Toolkit, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            toolkit,
            modules: Rc::new(ModuleRegistry::new()),
            factories: BindingFactories::default(),
            scheduler,
            layout: LayoutConfig::default(),
        }
    }

    pub fn with_modules(mut self, modules: Rc<dyn ModuleLoader>) -> Self {
        self.modules = modules;
        self
    }

    pub fn with_factories(mut self, factories: BindingFactories) -> Self {
        self.factories = factories;
        self
    }

    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }
}

pub struct ViewFactory {
    compiled: CompiledView,
    host: Host,
}

impl ViewFactory {
    /// Compile `document`. All compile errors surface here.
    pub fn new(document: &Document, config: FactoryConfig) -> Result<Self, ViewError> {
        let compiled = compile(
            document,
            &config.toolkit,
            config.modules.as_ref(),
            &config.factories,
        )?;
        Ok(Self {
            compiled,
            host: Host {
                scheduler: config.scheduler,
                config: config.layout,
            },
        })
    }

    /// Compile a document serialized as JSON.
    pub fn from_json(json: &str, config: FactoryConfig) -> Result<Self, ViewError> {
        let document: Document = serde_json::from_str(json)?;
        Self::new(&document, config)
    }

    pub fn compiled(&self) -> &CompiledView {
        &self.compiled
    }

    /// Build a live view. Names resolve, lowest first, through imports,
    /// `context`, builtins, identifiers and finally `self`.
    pub fn instantiate(&self, context: Namespace) -> Result<View, ViewError> {
        let scope = Scope::new()
            .push(Rc::clone(&self.compiled.imports))
            .push(Rc::new(context))
            .push(builtins());
        let instance = self.compiled.root.instantiate(&scope, &self.host)?;
        instance.root.initialize_layout()?;
        debug!(
            root = %instance.root.label(),
            identifiers = instance.identifiers.len(),
            "view instantiated"
        );
        Ok(View {
            root: instance.root,
            identifiers: instance.identifiers,
        })
    }
}

/// One instantiated view. Dropping it disconnects every binding.
#[derive(Debug)]
pub struct View {
    root: Rc<Component>,
    identifiers: Rc<Namespace>,
}

impl View {
    pub fn root(&self) -> &Rc<Component> {
        &self.root
    }

    /// Component registered under `identifier`.
    pub fn component(&self, identifier: &str) -> Option<Rc<Component>> {
        self.root.find(identifier)
    }

    /// Object registered under `identifier`, metas included.
    pub fn object(&self, identifier: &str) -> Option<Object> {
        match self.identifiers.get(identifier) {
            Some(Value::Object(object)) => Some(object.clone()),
            _ => None,
        }
    }

    pub fn resize(&self, size: Size) {
        self.root.resize(size);
    }
}
