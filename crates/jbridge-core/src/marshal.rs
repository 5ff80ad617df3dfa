//! Value marshalling between script values and wire values
//!
//! Arguments are converted by walking the parameter tags and the argument
//! list side by side. The same walk runs in two modes:
//!
//! - [`Mode::Check`] validates without touching the foreign runtime
//! - [`Mode::Materialize`] also allocates foreign strings and arrays and
//!   tracks them for release after the call
//!
//! Both modes go through [`to_wire`], so they accept exactly the same
//! arguments. The `c` tag only describes results; as a parameter it accepts
//! nothing. A passing check means materialize will not report a mismatch
//! (only a foreign allocation failure can still stop it).
//!
//! Results come back through [`from_wire`] and [`array_from_wire`], which
//! take ownership of the transient references they are given.

use jbridge_sdk::{CallKind, RawRef, WireValue};

use crate::class::ScriptClassRef;
use crate::context::BridgeContext;
use crate::dispatch::{ElementKind, ValueKind};
use crate::error::{ArgumentMismatch, BridgeError, BridgeResult, MismatchReason};
use crate::handle::{ClassHandle, ForeignHandle, LocalRef, TransientRefs};
use crate::signature::TypeTag;
use crate::value::{JLong, ScriptObject, ScriptValue};

/// Wire descriptor of `Class.getName`
const GET_NAME_DESCRIPTOR: &str = "()Ljava/lang/String;";

/// Conversion mode
pub enum Mode<'m, 'e> {
    /// Validate only
    Check,
    /// Validate and allocate, tracking new transient references
    Materialize(&'m mut TransientRefs<'e>),
}

impl<'e> Mode<'_, 'e> {
    fn reborrow(&mut self) -> Mode<'_, 'e> {
        match self {
            Mode::Check => Mode::Check,
            Mode::Materialize(refs) => Mode::Materialize(&mut **refs),
        }
    }
}

fn wrong_type(tag: &TypeTag, value: &ScriptValue) -> MismatchReason {
    MismatchReason::WrongType {
        expected: tag.to_string(),
        got: value.type_name(),
    }
}

fn new_string(ctx: &BridgeContext, s: &str, mode: Mode<'_, '_>) -> Result<WireValue, MismatchReason> {
    match mode {
        Mode::Check => Ok(WireValue::null()),
        Mode::Materialize(refs) => {
            let raw = ctx.env().new_string_utf(s).ok_or(MismatchReason::Allocation)?;
            Ok(WireValue::Object(Some(refs.track(raw))))
        }
    }
}

/// Convert one script value against one tag
pub fn to_wire(
    ctx: &BridgeContext,
    tag: &TypeTag,
    value: &ScriptValue,
    mut mode: Mode<'_, '_>,
) -> Result<WireValue, MismatchReason> {
    match (tag, value) {
        (TypeTag::Boolean, ScriptValue::Bool(b)) => Ok(WireValue::Boolean(*b)),
        (TypeTag::Int, ScriptValue::Int(i)) => Ok(WireValue::Int(*i)),
        (TypeTag::Long, ScriptValue::Long(l)) => Ok(WireValue::Long(l.value())),
        (TypeTag::Long, ScriptValue::Int(i)) => Ok(WireValue::Long(i64::from(*i))),
        (TypeTag::Float, ScriptValue::Float(f)) => Ok(WireValue::Float(*f as f32)),
        (TypeTag::Float, ScriptValue::Int(i)) => Ok(WireValue::Float(*i as f32)),
        (TypeTag::Str | TypeTag::Object(_), ScriptValue::Str(s)) => new_string(ctx, s, mode),
        (TypeTag::Object(_), ScriptValue::Nil) => Ok(WireValue::null()),
        (TypeTag::Object(name), ScriptValue::Object(obj)) => {
            let target = ctx
                .lookup_class(name)
                .ok_or_else(|| MismatchReason::UnknownClass {
                    class: name.to_string(),
                })?;
            if !obj.class().is_kind_of(&target) {
                return Err(MismatchReason::NotSubclass {
                    expected: target.name().to_string(),
                    got: obj.class().name().to_string(),
                });
            }
            Ok(WireValue::Object(Some(obj.handle().raw())))
        }
        (TypeTag::Array(elem), ScriptValue::Array(items)) => {
            if **elem != TypeTag::Float {
                return Err(wrong_type(tag, value));
            }
            let mut floats = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let wire = to_wire(ctx, elem, item, mode.reborrow()).map_err(|reason| {
                    MismatchReason::Element {
                        index,
                        reason: Box::new(reason),
                    }
                })?;
                floats.push(wire.as_f32().unwrap_or_default());
            }
            match mode {
                Mode::Check => Ok(WireValue::null()),
                Mode::Materialize(refs) => {
                    let raw = ctx
                        .env()
                        .new_float_array(&floats)
                        .ok_or(MismatchReason::Allocation)?;
                    Ok(WireValue::Object(Some(refs.track(raw))))
                }
            }
        }
        _ => Err(wrong_type(tag, value)),
    }
}

fn marshal_args(
    ctx: &BridgeContext,
    tags: &[TypeTag],
    args: &[ScriptValue],
    mut mode: Mode<'_, '_>,
    mut out: Option<&mut Vec<WireValue>>,
) -> Result<(), ArgumentMismatch> {
    if args.len() != tags.len() {
        return Err(ArgumentMismatch::Arity {
            given: args.len(),
            expected: tags.len(),
        });
    }
    for (index, (tag, arg)) in tags.iter().zip(args).enumerate() {
        let wire = to_wire(ctx, tag, arg, mode.reborrow())
            .map_err(|reason| ArgumentMismatch::Argument { index, reason })?;
        if let Some(out) = out.as_deref_mut() {
            out[index] = wire;
        }
    }
    Ok(())
}

/// Check an argument list against parameter tags without allocating
pub fn check_args(
    ctx: &BridgeContext,
    tags: &[TypeTag],
    args: &[ScriptValue],
) -> Result<(), ArgumentMismatch> {
    marshal_args(ctx, tags, args, Mode::Check, None)
}

/// Convert an argument list into `buffer`, which is resized to the arity.
/// Foreign strings and arrays created on the way are tracked in `refs`.
pub fn materialize_args(
    ctx: &BridgeContext,
    tags: &[TypeTag],
    args: &[ScriptValue],
    buffer: &mut Vec<WireValue>,
    refs: &mut TransientRefs<'_>,
) -> Result<(), ArgumentMismatch> {
    buffer.resize(tags.len(), WireValue::null());
    marshal_args(ctx, tags, args, Mode::Materialize(refs), Some(buffer))
}

fn expect_object(raw: WireValue, expected: &'static str) -> BridgeResult<Option<RawRef>> {
    raw.as_object().ok_or(BridgeError::WireMismatch {
        expected,
        got: raw.type_name(),
    })
}

/// Convert one result. A transient reference in `raw` is released.
pub fn from_wire(ctx: &BridgeContext, kind: &ValueKind, raw: WireValue) -> BridgeResult<ScriptValue> {
    let mismatch = |expected| BridgeError::WireMismatch {
        expected,
        got: raw.type_name(),
    };
    match kind {
        ValueKind::Boolean => raw.as_bool().map(ScriptValue::Bool).ok_or_else(|| mismatch("boolean")),
        ValueKind::Int => raw.as_i32().map(ScriptValue::Int).ok_or_else(|| mismatch("int")),
        ValueKind::Long => raw
            .as_i64()
            .map(|l| ScriptValue::Long(JLong::from_i64(l)))
            .ok_or_else(|| mismatch("long")),
        ValueKind::Float => raw
            .as_f32()
            .map(|f| ScriptValue::Float(f64::from(f)))
            .ok_or_else(|| mismatch("float")),
        ValueKind::Str => {
            let Some(local) = LocalRef::from_option(ctx.env(), expect_object(raw, "string")?) else {
                return Ok(ScriptValue::Nil);
            };
            Ok(ScriptValue::Str(ctx.env().get_string_utf(local.raw())))
        }
        ValueKind::Declared(cls) => {
            let Some(local) = LocalRef::from_option(ctx.env(), expect_object(raw, "object")?) else {
                return Ok(ScriptValue::Nil);
            };
            Ok(wrap(ctx, cls.clone(), &local))
        }
        ValueKind::Dynamic => {
            let Some(local) = LocalRef::from_option(ctx.env(), expect_object(raw, "object")?) else {
                return Ok(ScriptValue::Nil);
            };
            let cls = runtime_class(ctx, &local)?;
            Ok(wrap(ctx, cls, &local))
        }
    }
}

fn wrap(ctx: &BridgeContext, cls: ScriptClassRef, local: &LocalRef<'_>) -> ScriptValue {
    let handle = ForeignHandle::promote(ctx.env_rc(), local.raw());
    ScriptValue::Object(ScriptObject::new(cls, handle))
}

/// Script class for the runtime type of `obj`.
///
/// Reads the foreign class name, resolves it through the context cache and
/// caches the foreign class handle on the resolved class the first time.
/// Unknown names fall back to the root class.
fn runtime_class(ctx: &BridgeContext, obj: &LocalRef<'_>) -> BridgeResult<ScriptClassRef> {
    let env = ctx.env();
    let class = LocalRef::new(env, env.get_object_class(obj.raw()));
    let meta = LocalRef::new(env, env.get_object_class(class.raw()));
    let Some(get_name) = env.get_method_id(meta.raw(), "getName", GET_NAME_DESCRIPTOR) else {
        env.exception_clear();
        return Err(BridgeError::NameResolution {
            name: "getName".to_string(),
            descriptor: GET_NAME_DESCRIPTOR.to_string(),
        });
    };
    let name = env.call_method(CallKind::Object, class.raw(), get_name, &[]);
    if env.exception_check() {
        if let WireValue::Object(Some(r)) = name {
            env.delete_local_ref(r);
        }
        return Err(BridgeError::ForeignFault {
            method: "getName".to_string(),
        });
    }
    let name = match from_wire(ctx, &ValueKind::Str, name)? {
        ScriptValue::Str(name) => name,
        _ => return Ok(ctx.root_class().clone()),
    };

    match ctx.lookup_class(&name) {
        Some(cls) => {
            if cls.handle().is_none() {
                cls.attach_handle(ClassHandle::promote(ctx.env_rc(), class.raw()));
            }
            Ok(cls)
        }
        None => {
            tracing::debug!(name = %name, "unknown runtime class, using root class");
            Ok(ctx.root_class().clone())
        }
    }
}

/// Convert an array result. A null array is `Nil`; the array reference and
/// every element reference are released.
pub fn array_from_wire(
    ctx: &BridgeContext,
    elem: &ElementKind,
    raw: WireValue,
) -> BridgeResult<ScriptValue> {
    let env = ctx.env();
    let Some(array) = LocalRef::from_option(env, expect_object(raw, "array")?) else {
        return Ok(ScriptValue::Nil);
    };
    let items = match elem {
        ElementKind::Int => env
            .get_int_array_elements(array.raw())
            .into_iter()
            .map(ScriptValue::Int)
            .collect(),
        ElementKind::Long => env
            .get_long_array_elements(array.raw())
            .into_iter()
            .map(|l| ScriptValue::Long(JLong::from_i64(l)))
            .collect(),
        ElementKind::Float => env
            .get_float_array_elements(array.raw())
            .into_iter()
            .map(|f| ScriptValue::Float(f64::from(f)))
            .collect(),
        ElementKind::Str | ElementKind::Declared(_) | ElementKind::Dynamic => {
            let kind = elem.value_kind();
            let len = env.get_array_length(array.raw());
            let mut items = Vec::with_capacity(len);
            for index in 0..len {
                let element = env.get_object_array_element(array.raw(), index);
                items.push(from_wire(ctx, &kind, WireValue::Object(element))?);
            }
            items
        }
    };
    Ok(ScriptValue::Array(items))
}
