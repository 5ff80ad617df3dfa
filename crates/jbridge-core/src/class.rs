//! Script classes that mirror foreign types
//!
//! A [`ScriptClass`] names one foreign type and caches its [`ClassHandle`]
//! after the first successful binding. The handle slot is set once and never
//! replaced, so there is at most one long-lived class reference per class.

use std::fmt;
use std::rc::Rc;

use once_cell::unsync::OnceCell;

use crate::context::BridgeContext;
use crate::error::{BridgeError, BridgeResult};
use crate::handle::{ClassHandle, LocalRef};

/// Shared reference to a script class
pub type ScriptClassRef = Rc<ScriptClass>;

/// A script class bound (or bindable) to a foreign type
pub struct ScriptClass {
    name: String,
    foreign_name: String,
    superclass: Option<ScriptClassRef>,
    handle: OnceCell<ClassHandle>,
}

impl ScriptClass {
    /// Create a class. `foreign_name` is dotted (`java.util.ArrayList`).
    pub fn new(
        name: impl Into<String>,
        foreign_name: impl Into<String>,
        superclass: Option<ScriptClassRef>,
    ) -> ScriptClassRef {
        Rc::new(Self {
            name: name.into(),
            foreign_name: foreign_name.into(),
            superclass,
            handle: OnceCell::new(),
        })
    }

    /// Script-side name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dotted foreign type name
    pub fn foreign_name(&self) -> &str {
        &self.foreign_name
    }

    /// Slash-separated foreign type path
    pub fn path(&self) -> String {
        self.foreign_name.replace('.', "/")
    }

    /// Direct superclass
    pub fn superclass(&self) -> Option<&ScriptClassRef> {
        self.superclass.as_ref()
    }

    /// Cached class handle, if bound
    pub fn handle(&self) -> Option<&ClassHandle> {
        self.handle.get()
    }

    /// Cache `handle` unless one is already set. Returns false (and drops
    /// `handle`, releasing it) if the slot was taken.
    pub fn attach_handle(&self, handle: ClassHandle) -> bool {
        self.handle.set(handle).is_ok()
    }

    /// Check whether `self` is `target` or inherits from it
    pub fn is_kind_of(&self, target: &ScriptClass) -> bool {
        let mut cur = Some(self);
        while let Some(cls) = cur {
            if std::ptr::eq(cls, target) {
                return true;
            }
            cur = cls.superclass.as_deref();
        }
        false
    }

    /// Resolve the foreign type by path and cache its handle.
    ///
    /// Idempotent: an already bound class is left alone.
    pub fn bind_foreign(&self, ctx: &BridgeContext) -> BridgeResult<&ClassHandle> {
        if let Some(handle) = self.handle.get() {
            return Ok(handle);
        }
        let env = ctx.env();
        let path = self.path();
        let Some(local) = env.find_class(&path) else {
            env.exception_clear();
            return Err(BridgeError::NameResolution {
                name: self.foreign_name.clone(),
                descriptor: String::new(),
            });
        };
        let local = LocalRef::new(env, local);
        let handle = ClassHandle::promote(ctx.env_rc(), local.raw());
        tracing::trace!(class = %self.foreign_name, "bound foreign class");
        Ok(self.handle.get_or_init(|| handle))
    }
}

impl fmt::Debug for ScriptClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptClass")
            .field("name", &self.name)
            .field("foreign_name", &self.foreign_name)
            .field("bound", &self.handle.get().is_some())
            .finish()
    }
}
