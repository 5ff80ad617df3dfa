//! Script-side values
//!
//! [`ScriptValue`] is what the script runtime hands to a binding and gets
//! back from it. Foreign objects appear as [`ScriptObject`] wrappers behind
//! an `Rc`; dropping the last clone is the wrapper's finalization and
//! releases its long-lived reference.

use std::fmt;
use std::rc::Rc;

use crate::class::ScriptClassRef;
use crate::handle::ForeignHandle;

/// A 64-bit foreign integer split into two 32-bit limbs.
///
/// The script runtime's native integer is 32 bits wide, so long results are
/// carried as a pair and reconstructed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JLong {
    /// Low 32 bits
    pub low: i32,
    /// High 32 bits
    pub high: i32,
}

impl JLong {
    /// Split a 64-bit value
    pub const fn from_i64(v: i64) -> Self {
        Self {
            low: v as i32,
            high: (v >> 32) as i32,
        }
    }

    /// Reconstruct `low | (high << 32)`
    pub const fn value(self) -> i64 {
        (self.low as u32 as i64) | ((self.high as i64) << 32)
    }
}

impl From<i64> for JLong {
    fn from(v: i64) -> Self {
        Self::from_i64(v)
    }
}

/// A wrapped foreign object
pub struct ScriptObject {
    class: ScriptClassRef,
    handle: ForeignHandle,
}

impl ScriptObject {
    /// Wrap a handle as an instance of `class`
    pub fn new(class: ScriptClassRef, handle: ForeignHandle) -> Rc<Self> {
        Rc::new(Self { class, handle })
    }

    /// Script class of the wrapper
    pub fn class(&self) -> &ScriptClassRef {
        &self.class
    }

    /// Owned foreign handle
    pub fn handle(&self) -> &ForeignHandle {
        &self.handle
    }
}

impl fmt::Debug for ScriptObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptObject")
            .field("class", &self.class.name())
            .field("handle", &self.handle)
            .finish()
    }
}

/// A value on the script side of the bridge
#[derive(Debug, Clone)]
pub enum ScriptValue {
    /// The absence marker
    Nil,
    /// Boolean
    Bool(bool),
    /// Native 32-bit integer
    Int(i32),
    /// Float
    Float(f64),
    /// Two-limb long
    Long(JLong),
    /// String
    Str(String),
    /// Ordered sequence
    Array(Vec<ScriptValue>),
    /// Wrapped foreign object
    Object(Rc<ScriptObject>),
    /// Script class
    Class(ScriptClassRef),
}

impl ScriptValue {
    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Nil => "nil",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Int(_) => "integer",
            ScriptValue::Float(_) => "float",
            ScriptValue::Long(_) => "long",
            ScriptValue::Str(_) => "string",
            ScriptValue::Array(_) => "array",
            ScriptValue::Object(_) => "object",
            ScriptValue::Class(_) => "class",
        }
    }

    /// Check for the absence marker
    pub fn is_nil(&self) -> bool {
        matches!(self, ScriptValue::Nil)
    }

    /// Extract a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScriptValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract an integer
    pub fn as_int(&self) -> Option<i32> {
        match self {
            ScriptValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ScriptValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Extract a reconstructed long
    pub fn as_long(&self) -> Option<i64> {
        match self {
            ScriptValue::Long(l) => Some(l.value()),
            _ => None,
        }
    }

    /// Extract a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Extract a sequence
    pub fn as_array(&self) -> Option<&[ScriptValue]> {
        match self {
            ScriptValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Extract a wrapped object
    pub fn as_object(&self) -> Option<&Rc<ScriptObject>> {
        match self {
            ScriptValue::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        ScriptValue::Bool(b)
    }
}

impl From<i32> for ScriptValue {
    fn from(i: i32) -> Self {
        ScriptValue::Int(i)
    }
}

impl From<f64> for ScriptValue {
    fn from(f: f64) -> Self {
        ScriptValue::Float(f)
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        ScriptValue::Str(s.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(s: String) -> Self {
        ScriptValue::Str(s)
    }
}

impl From<Rc<ScriptObject>> for ScriptValue {
    fn from(o: Rc<ScriptObject>) -> Self {
        ScriptValue::Object(o)
    }
}
