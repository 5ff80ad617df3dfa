//! Wire-level values, the `jvalue` analogue
//!
//! Everything that crosses the foreign boundary is one of these types.
//! References are opaque bit patterns handed out by the foreign runtime;
//! the SDK never dereferences them.
//!
//! # Reference kinds
//!
//! ```text
//! transient (local):   valid for the current call only, released with delete_local_ref
//! long-lived (global): valid until delete_global_ref, independent of call scope
//! ```
//!
//! Both kinds share the `RawRef` representation; which one a given value is
//! depends on the entry point that produced it.

use std::fmt;
use std::num::NonZeroU64;

/// Opaque, non-null foreign object reference.
///
/// A null reference is modelled as `Option<RawRef>::None`, so `Option<RawRef>`
/// has the same size as the raw handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct RawRef(NonZeroU64);

impl RawRef {
    /// Create from raw bits. Returns `None` for the null pattern.
    #[inline]
    pub const fn from_bits(bits: u64) -> Option<Self> {
        match NonZeroU64::new(bits) {
            Some(nz) => Some(Self(nz)),
            None => None,
        }
    }

    /// Get the raw bits of this reference
    #[inline(always)]
    pub const fn to_bits(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for RawRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawRef({:#x})", self.0.get())
    }
}

/// Resolved foreign method identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId(u64);

impl MethodId {
    /// Create from raw bits
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Get raw bits
    #[inline]
    pub const fn to_bits(self) -> u64 {
        self.0
    }
}

/// Resolved foreign field identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(u64);

impl FieldId {
    /// Create from raw bits
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Get raw bits
    #[inline]
    pub const fn to_bits(self) -> u64 {
        self.0
    }
}

/// One argument or return slot at the foreign boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WireValue {
    /// `Z`
    Boolean(bool),
    /// `I`
    Int(i32),
    /// `J`
    Long(i64),
    /// `F`
    Float(f32),
    /// Any reference type; `None` is the foreign null
    Object(Option<RawRef>),
}

impl WireValue {
    /// The foreign null reference
    #[inline]
    pub const fn null() -> Self {
        Self::Object(None)
    }

    /// Extract a boolean
    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract a 32-bit integer
    #[inline]
    pub const fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract a 64-bit integer
    #[inline]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Long(l) => Some(*l),
            _ => None,
        }
    }

    /// Extract a float
    #[inline]
    pub const fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Extract a reference slot. The outer `Option` is `None` when this is
    /// not a reference at all; the inner one is `None` for null.
    #[inline]
    pub const fn as_object(&self) -> Option<Option<RawRef>> {
        match self {
            Self::Object(r) => Some(*r),
            _ => None,
        }
    }

    /// Get type name for diagnostics
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Object(None) => "null",
            Self::Object(Some(_)) => "object",
        }
    }
}

impl Default for WireValue {
    fn default() -> Self {
        Self::null()
    }
}

/// Foreign call entry point family, chosen by the declared return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// `Call*VoidMethod`
    Void,
    /// `Call*BooleanMethod`
    Boolean,
    /// `Call*IntMethod`
    Int,
    /// `Call*LongMethod`
    Long,
    /// `Call*FloatMethod`
    Float,
    /// `Call*ObjectMethod`: strings, objects and arrays
    Object,
}

impl CallKind {
    /// The zero value a call of this kind yields when the callee faulted
    pub const fn zero(self) -> WireValue {
        match self {
            CallKind::Void | CallKind::Object => WireValue::null(),
            CallKind::Boolean => WireValue::Boolean(false),
            CallKind::Int => WireValue::Int(0),
            CallKind::Long => WireValue::Long(0),
            CallKind::Float => WireValue::Float(0.0),
        }
    }
}
