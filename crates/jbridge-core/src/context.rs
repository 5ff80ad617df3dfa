//! Bridge context
//!
//! Everything a bridge operation needs travels in one [`BridgeContext`]: the
//! foreign environment, the class resolver, configuration, the debug flag,
//! and the name to class cache. There is no process-wide state.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use jbridge_sdk::ForeignEnv;
use rustc_hash::FxHashMap;

use crate::class::{ScriptClass, ScriptClassRef};
use crate::config::BridgeConfig;
use crate::resolver::ClassResolver;

/// Execution context shared by every binding of one script runtime
pub struct BridgeContext {
    env: Rc<dyn ForeignEnv>,
    resolver: Rc<dyn ClassResolver>,
    config: BridgeConfig,
    debug: Cell<bool>,
    classes: RefCell<FxHashMap<String, ScriptClassRef>>,
    root: ScriptClassRef,
}

impl BridgeContext {
    /// Create a context with default configuration
    pub fn new(env: Rc<dyn ForeignEnv>, resolver: Rc<dyn ClassResolver>) -> Self {
        Self::with_config(env, resolver, BridgeConfig::default())
    }

    /// Create a context with explicit configuration
    pub fn with_config(
        env: Rc<dyn ForeignEnv>,
        resolver: Rc<dyn ClassResolver>,
        config: BridgeConfig,
    ) -> Self {
        Self {
            env,
            resolver,
            debug: Cell::new(config.debug),
            config,
            classes: RefCell::new(FxHashMap::default()),
            root: ScriptClass::new("JObject", "java.lang.Object", None),
        }
    }

    /// Replace the fallback class used for unknown runtime types
    pub fn with_root_class(mut self, root: ScriptClassRef) -> Self {
        self.root = root;
        self
    }

    /// The foreign environment
    #[inline]
    pub fn env(&self) -> &dyn ForeignEnv {
        &*self.env
    }

    /// The foreign environment, shared
    #[inline]
    pub fn env_rc(&self) -> &Rc<dyn ForeignEnv> {
        &self.env
    }

    /// Active configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Current debug flag
    pub fn is_debug(&self) -> bool {
        self.debug.get()
    }

    /// Set the debug flag
    pub fn set_debug(&self, on: bool) {
        self.debug.set(on);
    }

    /// Flip the debug flag and return the new value
    pub fn toggle_debug(&self) -> bool {
        let on = !self.debug.get();
        self.debug.set(on);
        on
    }

    /// Fallback class for runtime types the resolver does not know
    pub fn root_class(&self) -> &ScriptClassRef {
        &self.root
    }

    /// Resolve a dotted foreign type name to a script class.
    ///
    /// The resolver is consulted at most once per name that resolves; unknown
    /// names are asked again next time since they may be registered later.
    pub fn lookup_class(&self, name: &str) -> Option<ScriptClassRef> {
        if let Some(cls) = self.classes.borrow().get(name) {
            return Some(Rc::clone(cls));
        }
        tracing::trace!(name, "class cache miss");
        let cls = self.resolver.resolve(name).into_class()?;
        self.classes
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&cls));
        Some(cls)
    }

    /// Number of cached name to class entries
    pub fn cached_classes(&self) -> usize {
        self.classes.borrow().len()
    }

    /// Clear any pending foreign fault
    pub fn clear_foreign_fault(&self) {
        self.env.exception_clear();
    }
}

impl fmt::Debug for BridgeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeContext")
            .field("config", &self.config)
            .field("debug", &self.debug.get())
            .field("cached_classes", &self.cached_classes())
            .finish()
    }
}
