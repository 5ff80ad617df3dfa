//! Static field reads

use jbridge_sdk::CallKind;

use crate::class::ScriptClassRef;
use crate::context::BridgeContext;
use crate::dispatch::ValueKind;
use crate::error::{BridgeError, BridgeResult};
use crate::exception;
use crate::marshal;
use crate::signature::TypeDecl;
use crate::value::ScriptValue;

/// Read a static field of `owner` declared as `ty`.
///
/// Supported types are boolean, int, long, string and declared-class
/// objects. A null object field reads as `Nil`.
pub fn read_static_field(
    ctx: &BridgeContext,
    owner: &ScriptClassRef,
    name: &str,
    ty: &TypeDecl,
) -> BridgeResult<ScriptValue> {
    let (kind, call_kind) = match ty {
        TypeDecl::Boolean => (ValueKind::Boolean, CallKind::Boolean),
        TypeDecl::Int => (ValueKind::Int, CallKind::Int),
        TypeDecl::Long => (ValueKind::Long, CallKind::Long),
        TypeDecl::String => (ValueKind::Str, CallKind::Object),
        TypeDecl::Object(cls) => (ValueKind::Declared(cls.clone()), CallKind::Object),
        other => {
            return Err(BridgeError::RuntimeUnsupported {
                modifiers: "static field ".to_string(),
                signature: format!("{} ({} in {})", other.tag_text(), name, owner.name()),
            })
        }
    };
    let class = owner.handle().ok_or_else(|| BridgeError::UnboundClass {
        class: owner.name().to_string(),
    })?;
    let env = ctx.env();
    let descriptor = ty.descriptor();
    let Some(field) = env.get_static_field_id(class.raw(), name, &descriptor) else {
        env.exception_clear();
        return Err(BridgeError::NameResolution {
            name: name.to_string(),
            descriptor,
        });
    };
    let raw = env.get_static_field(call_kind, class.raw(), field);
    if let Err(err) = exception::check_foreign_fault(ctx, name) {
        if let Some(Some(r)) = raw.as_object() {
            env.delete_local_ref(r);
        }
        return Err(err);
    }
    marshal::from_wire(ctx, &kind, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ScriptClass;
    use crate::resolver::ClassRegistry;
    use jbridge_testkit::{MiniJvm, Value};
    use std::rc::Rc;

    fn setup() -> (Rc<MiniJvm>, BridgeContext, ScriptClassRef) {
        let jvm = Rc::new(MiniJvm::new());
        let id = jvm.define_class("test/Consts", None);
        jvm.static_field(id, "ENABLED", "Z", Value::Boolean(true));
        jvm.static_field(id, "COUNT", "I", Value::Int(12));
        jvm.static_field(id, "BIG", "J", Value::Long(1 << 40));
        jvm.static_field(id, "NONE", "Ltest/Consts;", Value::Ref(None));
        jvm.static_string_field(id, "NAME", "consts");
        let ctx = BridgeContext::new(jvm.clone(), Rc::new(ClassRegistry::new()));
        let cls = ScriptClass::new("Consts", "test.Consts", None);
        cls.bind_foreign(&ctx).unwrap();
        (jvm, ctx, cls)
    }

    #[test]
    fn test_supported_types() {
        let (jvm, ctx, cls) = setup();
        let read = |name, ty: TypeDecl| read_static_field(&ctx, &cls, name, &ty).unwrap();
        assert_eq!(read("ENABLED", TypeDecl::Boolean).as_bool(), Some(true));
        assert_eq!(read("COUNT", TypeDecl::Int).as_int(), Some(12));
        assert_eq!(read("BIG", TypeDecl::Long).as_long(), Some(1 << 40));
        assert_eq!(read("NAME", TypeDecl::String).as_str(), Some("consts"));
        assert!(read("NONE", TypeDecl::Object(cls.clone())).is_nil());
        assert_eq!(jvm.live_locals(), 0);
    }

    #[test]
    fn test_unsupported_type() {
        let (_jvm, ctx, cls) = setup();
        let err = read_static_field(&ctx, &cls, "RATIO", &TypeDecl::Float).unwrap_err();
        assert_eq!(
            err,
            BridgeError::RuntimeUnsupported {
                modifiers: "static field ".into(),
                signature: "F (RATIO in Consts)".into(),
            }
        );
    }

    #[test]
    fn test_missing_field() {
        let (_jvm, ctx, cls) = setup();
        let err = read_static_field(&ctx, &cls, "COUNT", &TypeDecl::Long).unwrap_err();
        assert_eq!(
            err,
            BridgeError::NameResolution {
                name: "COUNT".into(),
                descriptor: "J".into(),
            }
        );
    }
}
