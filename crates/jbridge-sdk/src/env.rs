//! ForeignEnv trait: abstract foreign runtime operations
//!
//! Defines the interface the embedding host implements on top of its object
//! runtime (a JNI `JNIEnv`, or the in-memory runtime in `jbridge-testkit`).
//! The bridge core programs against this trait only.
//!
//! # Reference discipline
//!
//! Every `RawRef` returned from this trait is transient unless it was
//! produced by [`ForeignEnv::new_global_ref`]. Callers release transient
//! references with [`ForeignEnv::delete_local_ref`] and long-lived ones with
//! [`ForeignEnv::delete_global_ref`], each exactly once.
//!
//! # Faults
//!
//! Entry points that fail leave a pending fault on the foreign side instead
//! of returning an error. [`ForeignEnv::exception_check`] observes it without
//! clearing it.

use crate::value::{CallKind, FieldId, MethodId, RawRef, WireValue};

/// Abstract foreign runtime for one execution context.
///
/// All methods take `&self`; implementations use interior mutability. The
/// model is single-threaded: an environment belongs to the thread that owns
/// the script runtime and is never shared across threads.
pub trait ForeignEnv {
    // ========================================================================
    // Types
    // ========================================================================

    /// Resolve a type by slash-separated path (`java/lang/String`).
    /// Returns a transient class reference, or `None` with a fault pending.
    fn find_class(&self, path: &str) -> Option<RawRef>;

    /// Get the runtime class of an object as a transient reference
    fn get_object_class(&self, obj: RawRef) -> RawRef;

    // ========================================================================
    // Member resolution
    // ========================================================================

    /// Resolve an instance method by name and wire descriptor
    fn get_method_id(&self, class: RawRef, name: &str, descriptor: &str) -> Option<MethodId>;

    /// Resolve a static method by name and wire descriptor
    fn get_static_method_id(&self, class: RawRef, name: &str, descriptor: &str)
        -> Option<MethodId>;

    /// Resolve a static field by name and wire descriptor
    fn get_static_field_id(&self, class: RawRef, name: &str, descriptor: &str) -> Option<FieldId>;

    // ========================================================================
    // Invocation
    // ========================================================================

    /// Invoke an instance method. Returns `kind.zero()` if the callee faulted.
    fn call_method(
        &self,
        kind: CallKind,
        receiver: RawRef,
        method: MethodId,
        args: &[WireValue],
    ) -> WireValue;

    /// Invoke a static method on `class`
    fn call_static_method(
        &self,
        kind: CallKind,
        class: RawRef,
        method: MethodId,
        args: &[WireValue],
    ) -> WireValue;

    /// Allocate an object and run the given constructor on it.
    /// Returns a transient reference, or `None` if allocation produced nothing.
    fn new_object(&self, class: RawRef, constructor: MethodId, args: &[WireValue])
        -> Option<RawRef>;

    /// Read a static field
    fn get_static_field(&self, kind: CallKind, class: RawRef, field: FieldId) -> WireValue;

    // ========================================================================
    // References
    // ========================================================================

    /// Promote any reference into a new long-lived reference
    fn new_global_ref(&self, obj: RawRef) -> RawRef;

    /// Release a long-lived reference
    fn delete_global_ref(&self, obj: RawRef);

    /// Release a transient reference
    fn delete_local_ref(&self, obj: RawRef);

    // ========================================================================
    // Strings
    // ========================================================================

    /// Create a foreign string from UTF-8. Returns a transient reference.
    fn new_string_utf(&self, s: &str) -> Option<RawRef>;

    /// Read the UTF-8 contents of a foreign string
    fn get_string_utf(&self, s: RawRef) -> String;

    // ========================================================================
    // Arrays
    // ========================================================================

    /// Get the length of any array
    fn get_array_length(&self, array: RawRef) -> usize;

    /// Copy out the elements of an `int[]`
    fn get_int_array_elements(&self, array: RawRef) -> Vec<i32>;

    /// Copy out the elements of a `long[]`
    fn get_long_array_elements(&self, array: RawRef) -> Vec<i64>;

    /// Copy out the elements of a `float[]`
    fn get_float_array_elements(&self, array: RawRef) -> Vec<f32>;

    /// Read one element of a reference array as a transient reference
    fn get_object_array_element(&self, array: RawRef, index: usize) -> Option<RawRef>;

    /// Create a `float[]` initialised from `elements`. Returns a transient reference.
    fn new_float_array(&self, elements: &[f32]) -> Option<RawRef>;

    // ========================================================================
    // Faults
    // ========================================================================

    /// Check for a pending fault without clearing it
    fn exception_check(&self) -> bool;

    /// Clear any pending fault
    fn exception_clear(&self);

    /// Raise a new fault of `class` carrying `message`. Returns false if the
    /// fault could not be constructed.
    fn throw_new(&self, class: RawRef, message: &str) -> bool;
}
