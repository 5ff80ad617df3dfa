//! Foreign reference ownership
//!
//! Long-lived references are owned by [`ForeignHandle`] (objects) and
//! [`ClassHandle`] (types); each releases its reference exactly once, on
//! drop. Transient references obtained during a call are held by
//! [`LocalRef`] or collected in [`TransientRefs`] and released when the
//! guard goes out of scope, on success and failure paths alike.

use std::fmt;
use std::rc::Rc;

use jbridge_sdk::{ForeignEnv, RawRef};

/// Owned long-lived reference to a foreign object
pub struct ForeignHandle {
    raw: RawRef,
    env: Rc<dyn ForeignEnv>,
}

impl ForeignHandle {
    /// Promote a transient reference. The transient one is left untouched;
    /// the caller still owns it.
    pub fn promote(env: &Rc<dyn ForeignEnv>, local: RawRef) -> Self {
        let raw = env.new_global_ref(local);
        Self {
            raw,
            env: Rc::clone(env),
        }
    }

    /// The long-lived reference. Valid while `self` is alive.
    #[inline]
    pub fn raw(&self) -> RawRef {
        self.raw
    }
}

impl Drop for ForeignHandle {
    fn drop(&mut self) {
        self.env.delete_global_ref(self.raw);
    }
}

impl fmt::Debug for ForeignHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ForeignHandle").field(&self.raw).finish()
    }
}

/// Owned long-lived reference to a foreign type
pub struct ClassHandle(ForeignHandle);

impl ClassHandle {
    /// Promote a transient class reference
    pub fn promote(env: &Rc<dyn ForeignEnv>, local: RawRef) -> Self {
        Self(ForeignHandle::promote(env, local))
    }

    /// The long-lived class reference
    #[inline]
    pub fn raw(&self) -> RawRef {
        self.0.raw()
    }
}

impl fmt::Debug for ClassHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClassHandle").field(&self.0.raw).finish()
    }
}

/// Scoped transient reference, released on drop
pub struct LocalRef<'e> {
    raw: RawRef,
    env: &'e dyn ForeignEnv,
}

impl<'e> LocalRef<'e> {
    /// Take ownership of a transient reference
    pub fn new(env: &'e dyn ForeignEnv, raw: RawRef) -> Self {
        Self { raw, env }
    }

    /// Wrap an optional transient reference; null stays `None`
    pub fn from_option(env: &'e dyn ForeignEnv, raw: Option<RawRef>) -> Option<Self> {
        raw.map(|raw| Self::new(env, raw))
    }

    /// The transient reference
    #[inline]
    pub fn raw(&self) -> RawRef {
        self.raw
    }
}

impl Drop for LocalRef<'_> {
    fn drop(&mut self) {
        self.env.delete_local_ref(self.raw);
    }
}

/// Transient references created while marshalling one call's arguments
pub struct TransientRefs<'e> {
    env: &'e dyn ForeignEnv,
    refs: Vec<RawRef>,
}

impl<'e> TransientRefs<'e> {
    /// Create an empty tracker
    pub fn new(env: &'e dyn ForeignEnv) -> Self {
        Self {
            env,
            refs: Vec::new(),
        }
    }

    /// Take ownership of a transient reference
    pub fn track(&mut self, raw: RawRef) -> RawRef {
        self.refs.push(raw);
        raw
    }

    /// Number of references currently tracked
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Check if nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

impl Drop for TransientRefs<'_> {
    fn drop(&mut self) {
        for raw in self.refs.drain(..) {
            self.env.delete_local_ref(raw);
        }
    }
}
