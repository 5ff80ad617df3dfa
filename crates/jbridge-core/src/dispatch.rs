//! Caller dispatch
//!
//! The return handling of a binding is chosen once, at bind time, from the
//! declared return type and the static flag. Every supported combination is
//! a variant of [`Dispatch`]; shapes with no variant are rejected by
//! [`Dispatch::select`] before any call is made.
//!
//! ```text
//! Constructor
//! Instance | Static  x  Void
//!                       Scalar(Boolean | Int | Long | Float | Str | Declared | Dynamic)
//!                       Array(Int | Long | Float | Str | Declared | Dynamic)
//! ```

use jbridge_sdk::{CallKind, ForeignEnv, MethodId, RawRef, WireValue};

use crate::class::ScriptClassRef;
use crate::context::BridgeContext;
use crate::error::{BridgeError, BridgeResult};
use crate::handle::{ForeignHandle, LocalRef};
use crate::marshal;
use crate::signature::TypeDecl;
use crate::value::{ScriptObject, ScriptValue};

/// Kind of a scalar result
#[derive(Debug, Clone)]
pub enum ValueKind {
    /// boolean
    Boolean,
    /// int
    Int,
    /// long, as two limbs
    Long,
    /// float
    Float,
    /// string
    Str,
    /// object wrapped as the declared class
    Declared(ScriptClassRef),
    /// object wrapped as its runtime class
    Dynamic,
}

/// Kind of an array element in a result
#[derive(Debug, Clone)]
pub enum ElementKind {
    /// `int[]`
    Int,
    /// `long[]`
    Long,
    /// `float[]`
    Float,
    /// `String[]`
    Str,
    /// array of the declared class
    Declared(ScriptClassRef),
    /// array of objects wrapped by runtime class
    Dynamic,
}

impl ElementKind {
    /// Scalar conversion used for one element of a reference array
    pub fn value_kind(&self) -> ValueKind {
        match self {
            ElementKind::Int => ValueKind::Int,
            ElementKind::Long => ValueKind::Long,
            ElementKind::Float => ValueKind::Float,
            ElementKind::Str => ValueKind::Str,
            ElementKind::Declared(cls) => ValueKind::Declared(cls.clone()),
            ElementKind::Dynamic => ValueKind::Dynamic,
        }
    }
}

/// What a call returns
#[derive(Debug, Clone)]
pub enum ReturnShape {
    /// Nothing; the receiver is handed back
    Void,
    /// One value
    Scalar(ValueKind),
    /// Single-level array
    Array(ElementKind),
}

impl ReturnShape {
    /// Foreign entry point family for this shape
    pub fn call_kind(&self) -> CallKind {
        match self {
            ReturnShape::Void => CallKind::Void,
            ReturnShape::Scalar(ValueKind::Boolean) => CallKind::Boolean,
            ReturnShape::Scalar(ValueKind::Int) => CallKind::Int,
            ReturnShape::Scalar(ValueKind::Long) => CallKind::Long,
            ReturnShape::Scalar(ValueKind::Float) => CallKind::Float,
            ReturnShape::Scalar(_) | ReturnShape::Array(_) => CallKind::Object,
        }
    }
}

/// Call strategy of one binding
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// Allocate and construct a new object of the owner class
    Constructor,
    /// Call on an object receiver
    Instance(ReturnShape),
    /// Call on the owner class
    Static(ReturnShape),
}

impl Dispatch {
    /// Choose the strategy for a declared return type
    pub fn select(ret: &TypeDecl, is_static: bool, constructor: bool) -> BridgeResult<Self> {
        if constructor {
            return Ok(Dispatch::Constructor);
        }
        let unsupported = || BridgeError::RuntimeUnsupported {
            modifiers: format!(
                "{}{}",
                if is_static { "static " } else { "" },
                if matches!(ret, TypeDecl::Array(_)) { "array " } else { "" }
            ),
            signature: ret.tag_text(),
        };
        let shape = match ret {
            TypeDecl::Void => ReturnShape::Void,
            TypeDecl::Boolean => ReturnShape::Scalar(ValueKind::Boolean),
            TypeDecl::Int => ReturnShape::Scalar(ValueKind::Int),
            TypeDecl::Long => ReturnShape::Scalar(ValueKind::Long),
            TypeDecl::Float => ReturnShape::Scalar(ValueKind::Float),
            TypeDecl::String => ReturnShape::Scalar(ValueKind::Str),
            TypeDecl::Object(cls) => ReturnShape::Scalar(ValueKind::Declared(cls.clone())),
            TypeDecl::Dynamic(_) => ReturnShape::Scalar(ValueKind::Dynamic),
            TypeDecl::Array(elem) => ReturnShape::Array(match elem.as_ref() {
                TypeDecl::Int => ElementKind::Int,
                TypeDecl::Long => ElementKind::Long,
                TypeDecl::Float => ElementKind::Float,
                TypeDecl::String => ElementKind::Str,
                TypeDecl::Object(cls) => ElementKind::Declared(cls.clone()),
                TypeDecl::Dynamic(_) => ElementKind::Dynamic,
                TypeDecl::Void | TypeDecl::Boolean | TypeDecl::Array(_) => {
                    return Err(unsupported())
                }
            }),
        };
        Ok(if is_static {
            Dispatch::Static(shape)
        } else {
            Dispatch::Instance(shape)
        })
    }

    /// Return shape, `None` for constructors
    pub fn shape(&self) -> Option<&ReturnShape> {
        match self {
            Dispatch::Constructor => None,
            Dispatch::Instance(shape) | Dispatch::Static(shape) => Some(shape),
        }
    }

    /// Check for a static strategy
    pub fn is_static(&self) -> bool {
        matches!(self, Dispatch::Static(_))
    }

    /// Check for the constructor strategy
    pub fn is_constructor(&self) -> bool {
        matches!(self, Dispatch::Constructor)
    }

    /// Invoke the foreign entry point. `receiver` is required for instance
    /// calls and ignored otherwise.
    pub fn invoke(
        &self,
        env: &dyn ForeignEnv,
        class: RawRef,
        receiver: Option<RawRef>,
        method: MethodId,
        args: &[WireValue],
    ) -> WireValue {
        match self {
            Dispatch::Constructor => WireValue::Object(env.new_object(class, method, args)),
            Dispatch::Static(shape) => env.call_static_method(shape.call_kind(), class, method, args),
            Dispatch::Instance(shape) => match receiver {
                Some(this) => env.call_method(shape.call_kind(), this, method, args),
                None => shape.call_kind().zero(),
            },
        }
    }

    /// Convert a raw result. Takes ownership of any transient reference in
    /// `raw`.
    pub fn convert(
        &self,
        ctx: &BridgeContext,
        owner: &ScriptClassRef,
        receiver: &ScriptValue,
        raw: WireValue,
    ) -> BridgeResult<ScriptValue> {
        match self {
            Dispatch::Constructor => {
                let local = match raw {
                    WireValue::Object(Some(r)) => LocalRef::new(ctx.env(), r),
                    _ => {
                        return Err(BridgeError::NullConstruction {
                            class: owner.name().to_string(),
                        })
                    }
                };
                let handle = ForeignHandle::promote(ctx.env_rc(), local.raw());
                Ok(ScriptValue::Object(ScriptObject::new(owner.clone(), handle)))
            }
            Dispatch::Instance(shape) | Dispatch::Static(shape) => match shape {
                ReturnShape::Void => Ok(receiver.clone()),
                ReturnShape::Scalar(kind) => marshal::from_wire(ctx, kind, raw),
                ReturnShape::Array(elem) => marshal::array_from_wire(ctx, elem, raw),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ScriptClass;

    fn unsupported(ret: TypeDecl, is_static: bool) -> (String, String) {
        match Dispatch::select(&ret, is_static, false) {
            Err(BridgeError::RuntimeUnsupported { modifiers, signature }) => (modifiers, signature),
            other => panic!("expected RuntimeUnsupported, got {:?}", other),
        }
    }

    #[test]
    fn test_select_scalars() {
        let cls = ScriptClass::new("P", "test.P", None);
        let cases = [
            (TypeDecl::Void, CallKind::Void),
            (TypeDecl::Boolean, CallKind::Boolean),
            (TypeDecl::Int, CallKind::Int),
            (TypeDecl::Long, CallKind::Long),
            (TypeDecl::Float, CallKind::Float),
            (TypeDecl::String, CallKind::Object),
            (TypeDecl::Object(cls.clone()), CallKind::Object),
            (TypeDecl::Dynamic(cls), CallKind::Object),
        ];
        for (ret, kind) in cases {
            let d = Dispatch::select(&ret, false, false).unwrap();
            assert_eq!(d.shape().unwrap().call_kind(), kind);
            assert!(!d.is_static());
            assert!(Dispatch::select(&ret, true, false).unwrap().is_static());
        }
    }

    #[test]
    fn test_select_arrays() {
        for elem in [TypeDecl::Int, TypeDecl::Long, TypeDecl::Float, TypeDecl::String] {
            let d = Dispatch::select(&TypeDecl::array_of(elem), true, false).unwrap();
            assert!(matches!(d, Dispatch::Static(ReturnShape::Array(_))));
        }
    }

    #[test]
    fn test_select_unsupported() {
        assert_eq!(
            unsupported(TypeDecl::array_of(TypeDecl::Boolean), false),
            ("array ".to_string(), "[Z".to_string())
        );
        assert_eq!(
            unsupported(TypeDecl::array_of(TypeDecl::array_of(TypeDecl::Int)), true),
            ("static array ".to_string(), "[[I".to_string())
        );
    }

    #[test]
    fn test_constructor_ignores_return() {
        let d = Dispatch::select(&TypeDecl::array_of(TypeDecl::Boolean), false, true).unwrap();
        assert!(d.is_constructor());
        assert!(d.shape().is_none());
    }
}
