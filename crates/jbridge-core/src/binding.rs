//! Method bindings
//!
//! A [`MethodBinding`] resolves one foreign method once and is then called
//! any number of times. Binding fixes the descriptor, the parameter tags, the
//! dispatch strategy and the arity; calling reuses one argument buffer.
//!
//! # Call sequence
//!
//! ```text
//! arity check -> marshal into buffer -> invoke -> release transients
//!             -> foreign fault check -> convert result
//! ```
//!
//! A wrong argument count or an argument that fails marshalling produces
//! [`CallOutcome::NoMatch`] without reaching the foreign runtime.

use std::cell::RefCell;
use std::fmt;

use jbridge_sdk::{MethodId, WireValue, CONSTRUCTOR_NAME};

use crate::class::ScriptClassRef;
use crate::context::BridgeContext;
use crate::dispatch::Dispatch;
use crate::error::{ArgumentMismatch, BridgeError, BridgeResult};
use crate::exception;
use crate::handle::TransientRefs;
use crate::marshal;
use crate::signature::{Signature, TypeDecl, TypeTag};
use crate::value::ScriptValue;

/// Declaration of a method to bind
#[derive(Debug, Clone)]
pub struct MethodDecl {
    name: String,
    ret: TypeDecl,
    params: Vec<TypeDecl>,
    is_static: bool,
}

impl MethodDecl {
    /// Instance method
    pub fn instance(name: impl Into<String>, ret: TypeDecl) -> Self {
        Self {
            name: name.into(),
            ret,
            params: Vec::new(),
            is_static: false,
        }
    }

    /// Static method
    pub fn class_method(name: impl Into<String>, ret: TypeDecl) -> Self {
        Self {
            is_static: true,
            ..Self::instance(name, ret)
        }
    }

    /// Constructor of the owner class
    pub fn constructor() -> Self {
        Self::instance(CONSTRUCTOR_NAME, TypeDecl::Void)
    }

    /// Append a parameter
    pub fn param(mut self, ty: TypeDecl) -> Self {
        self.params.push(ty);
        self
    }

    /// Append several parameters
    pub fn params(mut self, tys: impl IntoIterator<Item = TypeDecl>) -> Self {
        self.params.extend(tys);
        self
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Result of a call that did not fail hard
#[derive(Debug, Clone)]
pub enum CallOutcome {
    /// The call ran and produced a value
    Returned(ScriptValue),
    /// The arguments do not fit; nothing was called
    NoMatch(ArgumentMismatch),
}

impl CallOutcome {
    /// The returned value, if the call ran
    pub fn into_value(self) -> Option<ScriptValue> {
        match self {
            CallOutcome::Returned(v) => Some(v),
            CallOutcome::NoMatch(_) => None,
        }
    }

    /// Check whether the call ran
    pub fn is_match(&self) -> bool {
        matches!(self, CallOutcome::Returned(_))
    }
}

/// A resolved foreign method
pub struct MethodBinding {
    owner: ScriptClassRef,
    name: String,
    signature: Signature,
    method: MethodId,
    dispatch: Dispatch,
    buffer: RefCell<Vec<WireValue>>,
}

impl MethodBinding {
    /// Resolve `decl` against the foreign type of `owner`.
    ///
    /// `owner` must already be bound to its foreign class.
    #[tracing::instrument(level = "trace", skip_all, fields(method = %decl.name))]
    pub fn bind(ctx: &BridgeContext, owner: &ScriptClassRef, decl: &MethodDecl) -> BridgeResult<Self> {
        let class = owner.handle().ok_or_else(|| BridgeError::UnboundClass {
            class: owner.name().to_string(),
        })?;
        let constructor = decl.name == CONSTRUCTOR_NAME;
        let signature = Signature::build(&decl.ret, &decl.params, constructor)?;

        let env = ctx.env();
        let resolved = if decl.is_static && !constructor {
            env.get_static_method_id(class.raw(), &decl.name, signature.descriptor())
        } else {
            env.get_method_id(class.raw(), &decl.name, signature.descriptor())
        };
        let Some(method) = resolved else {
            env.exception_clear();
            return Err(BridgeError::NameResolution {
                name: decl.name.clone(),
                descriptor: signature.descriptor().to_string(),
            });
        };

        for tag in signature.params() {
            let modifiers = match tag {
                TypeTag::DynamicClass => "",
                TypeTag::Array(elem) if **elem != TypeTag::Float => "array ",
                _ => continue,
            };
            return Err(BridgeError::RuntimeUnsupported {
                modifiers: modifiers.to_string(),
                signature: tag.to_string(),
            });
        }
        let dispatch = Dispatch::select(&decl.ret, decl.is_static, constructor)?;

        tracing::debug!(
            class = %owner.foreign_name(),
            method = %decl.name,
            descriptor = %signature.descriptor(),
            dispatch = ?dispatch,
            "bound method"
        );
        let buffer = RefCell::new(vec![WireValue::null(); signature.arity()]);
        Ok(Self {
            owner: owner.clone(),
            name: decl.name.clone(),
            signature,
            method,
            dispatch,
            buffer,
        })
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owner class
    pub fn owner(&self) -> &ScriptClassRef {
        &self.owner
    }

    /// Parameter tag text
    pub fn types(&self) -> &str {
        self.signature.types()
    }

    /// Wire descriptor
    pub fn descriptor(&self) -> &str {
        self.signature.descriptor()
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.signature.arity()
    }

    /// Chosen strategy
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Check whether `args` would be accepted, without calling or allocating
    pub fn check(&self, ctx: &BridgeContext, args: &[ScriptValue]) -> Result<(), ArgumentMismatch> {
        marshal::check_args(ctx, self.signature.params(), args)
    }

    /// Call the method.
    ///
    /// `receiver` must be an object of the owner class or a subclass for
    /// instance methods. For static methods and constructors it is only handed
    /// back by void calls.
    pub fn call(
        &self,
        ctx: &BridgeContext,
        receiver: &ScriptValue,
        args: &[ScriptValue],
    ) -> BridgeResult<CallOutcome> {
        if args.len() != self.arity() {
            return Ok(CallOutcome::NoMatch(ArgumentMismatch::Arity {
                given: args.len(),
                expected: self.arity(),
            }));
        }
        let this = match (&self.dispatch, receiver) {
            (Dispatch::Instance(_), ScriptValue::Object(obj)) if obj.class().is_kind_of(&self.owner) => {
                Some(obj.handle().raw())
            }
            (Dispatch::Instance(_), other) => {
                let got = match other {
                    ScriptValue::Object(obj) => obj.class().name().to_string(),
                    _ => other.type_name().to_string(),
                };
                return Err(BridgeError::InvalidReceiver {
                    method: self.name.clone(),
                    class: self.owner.name().to_string(),
                    got,
                });
            }
            _ => None,
        };
        let class = self.owner.handle().ok_or_else(|| BridgeError::UnboundClass {
            class: self.owner.name().to_string(),
        })?;
        let mut buffer = self.buffer.try_borrow_mut().map_err(|_| BridgeError::Reentrant {
            method: self.name.clone(),
        })?;

        let env = ctx.env();
        let raw = {
            let mut refs = TransientRefs::new(env);
            if let Err(mismatch) =
                marshal::materialize_args(ctx, self.signature.params(), args, &mut buffer, &mut refs)
            {
                buffer.fill(WireValue::null());
                return Ok(CallOutcome::NoMatch(mismatch));
            }
            if ctx.is_debug() {
                tracing::debug!(method = %self.name, args = args.len(), transients = refs.len(), "calling");
            } else {
                tracing::trace!(method = %self.name, "calling");
            }
            self.dispatch.invoke(env, class.raw(), this, self.method, &buffer)
        };
        buffer.fill(WireValue::null());
        drop(buffer);

        if let Err(err) = exception::check_foreign_fault(ctx, &self.name) {
            if let WireValue::Object(Some(r)) = raw {
                env.delete_local_ref(r);
            }
            return Err(err);
        }
        let value = self.dispatch.convert(ctx, &self.owner, receiver, raw)?;
        if ctx.is_debug() {
            tracing::debug!(method = %self.name, result = value.type_name(), "returned");
        }
        Ok(CallOutcome::Returned(value))
    }
}

impl fmt::Debug for MethodBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodBinding")
            .field("owner", &self.owner.name())
            .field("name", &self.name)
            .field("descriptor", &self.signature.descriptor())
            .field("dispatch", &self.dispatch)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ScriptClass;
    use crate::handle::ForeignHandle;
    use crate::resolver::ClassRegistry;
    use crate::value::ScriptObject;
    use jbridge_sdk::ForeignEnv;
    use jbridge_testkit::{MiniJvm, Value};
    use std::rc::Rc;

    fn setup() -> (Rc<MiniJvm>, BridgeContext, ScriptClassRef) {
        let jvm = Rc::new(MiniJvm::new());
        let calc = jvm.define_class("test/Calc", None);
        jvm.static_method(calc, "add", "(II)I", |_, _, args| match args {
            [Value::Int(a), Value::Int(b)] => Ok(Value::Int(a + b)),
            _ => unreachable!(),
        });
        jvm.static_method(calc, "greet", "(Ljava/lang/String;)Ljava/lang/String;", |heap, _, args| {
            let name = heap.string_arg(&args[0]).unwrap_or_default();
            Ok(Value::Ref(Some(heap.new_string(&format!("hi {}", name)))))
        });
        let registry = Rc::new(ClassRegistry::new());
        let ctx = BridgeContext::new(jvm.clone(), registry);
        let cls = ScriptClass::new("Calc", "test.Calc", None);
        cls.bind_foreign(&ctx).unwrap();
        (jvm, ctx, cls)
    }

    #[test]
    fn test_bind_and_call() {
        let (jvm, ctx, cls) = setup();
        let add = MethodBinding::bind(
            &ctx,
            &cls,
            &MethodDecl::class_method("add", TypeDecl::Int).params([TypeDecl::Int, TypeDecl::Int]),
        )
        .unwrap();
        assert_eq!(add.descriptor(), "(II)I");
        assert_eq!(add.types(), "II");
        assert_eq!(add.arity(), 2);
        let out = add.call(&ctx, &ScriptValue::Nil, &[2.into(), 40.into()]).unwrap();
        assert_eq!(out.into_value().unwrap().as_int(), Some(42));
        assert_eq!(jvm.live_locals(), 0);
    }

    #[test]
    fn test_string_argument_released() {
        let (jvm, ctx, cls) = setup();
        let greet = MethodBinding::bind(
            &ctx,
            &cls,
            &MethodDecl::class_method("greet", TypeDecl::String).param(TypeDecl::String),
        )
        .unwrap();
        let out = greet.call(&ctx, &ScriptValue::Nil, &["bob".into()]).unwrap();
        assert_eq!(out.into_value().unwrap().as_str(), Some("hi bob"));
        assert_eq!(jvm.live_locals(), 0);
        assert_eq!(jvm.stats().invalid_deletes, 0);
    }

    #[test]
    fn test_unbound_owner() {
        let (_jvm, ctx, _) = setup();
        let loose = ScriptClass::new("Loose", "test.Calc", None);
        let err = MethodBinding::bind(&ctx, &loose, &MethodDecl::class_method("add", TypeDecl::Int))
            .unwrap_err();
        assert!(matches!(err, BridgeError::UnboundClass { .. }));
    }

    #[test]
    fn test_missing_method() {
        let (jvm, ctx, cls) = setup();
        let err = MethodBinding::bind(&ctx, &cls, &MethodDecl::class_method("sub", TypeDecl::Int))
            .unwrap_err();
        assert_eq!(
            err,
            BridgeError::NameResolution {
                name: "sub".into(),
                descriptor: "()I".into()
            }
        );
        assert!(!jvm.exception_check());
    }

    #[test]
    fn test_instance_needs_object() {
        let (jvm, ctx, cls) = setup();
        let id = jvm.class_id("test/Calc").unwrap();
        jvm.method(id, "size", "()I", |_, _, _| Ok(Value::Int(1)));
        let size =
            MethodBinding::bind(&ctx, &cls, &MethodDecl::instance("size", TypeDecl::Int)).unwrap();
        let err = size.call(&ctx, &ScriptValue::Int(3), &[]).unwrap_err();
        assert_eq!(
            err,
            BridgeError::InvalidReceiver {
                method: "size".into(),
                class: "Calc".into(),
                got: "integer".into()
            }
        );
    }

    #[test]
    fn test_instance_rejects_foreign_receiver() {
        let (jvm, ctx, cls) = setup();
        let id = jvm.class_id("test/Calc").unwrap();
        jvm.method(id, "size", "()I", |_, _, _| Ok(Value::Int(1)));
        let size =
            MethodBinding::bind(&ctx, &cls, &MethodDecl::instance("size", TypeDecl::Int)).unwrap();

        let text = ScriptClass::new("JString", "java.lang.String", None);
        text.bind_foreign(&ctx).unwrap();
        let raw = jvm.with_heap(|heap| heap.new_string("not a calc"));
        let local = jvm.new_local(raw);
        let handle = ForeignHandle::promote(ctx.env_rc(), local);
        jvm.delete_local_ref(local);
        let receiver = ScriptValue::Object(ScriptObject::new(text, handle));

        let calls = jvm.calls();
        let err = size.call(&ctx, &receiver, &[]).unwrap_err();
        assert_eq!(
            err,
            BridgeError::InvalidReceiver {
                method: "size".into(),
                class: "Calc".into(),
                got: "JString".into()
            }
        );
        assert_eq!(jvm.calls(), calls);
    }

    #[test]
    fn test_void_returns_receiver() {
        let (jvm, ctx, cls) = setup();
        let id = jvm.class_id("test/Calc").unwrap();
        jvm.static_method(id, "reset", "()V", |_, _, _| Ok(Value::Void));
        let reset =
            MethodBinding::bind(&ctx, &cls, &MethodDecl::class_method("reset", TypeDecl::Void))
                .unwrap();
        let out = reset.call(&ctx, &ScriptValue::Class(cls.clone()), &[]).unwrap();
        match out.into_value().unwrap() {
            ScriptValue::Class(c) => assert!(Rc::ptr_eq(&c, &cls)),
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_no_match_is_soft() {
        let (jvm, ctx, cls) = setup();
        let add = MethodBinding::bind(
            &ctx,
            &cls,
            &MethodDecl::class_method("add", TypeDecl::Int).params([TypeDecl::Int, TypeDecl::Int]),
        )
        .unwrap();
        let calls = jvm.calls();
        let out = add.call(&ctx, &ScriptValue::Nil, &[1.into(), "x".into()]).unwrap();
        assert!(!out.is_match());
        assert_eq!(jvm.calls(), calls);
        assert!(add.check(&ctx, &[1.into(), 2.into()]).is_ok());
    }

    #[test]
    fn test_no_match_clears_buffer() {
        let (jvm, ctx, cls) = setup();
        let id = jvm.class_id("test/Calc").unwrap();
        jvm.static_method(id, "repeat", "(Ljava/lang/String;I)I", |_, _, _| Ok(Value::Int(0)));
        let repeat = MethodBinding::bind(
            &ctx,
            &cls,
            &MethodDecl::class_method("repeat", TypeDecl::Int).params([TypeDecl::String, TypeDecl::Int]),
        )
        .unwrap();

        let out = repeat.call(&ctx, &ScriptValue::Nil, &["x".into(), "y".into()]).unwrap();
        assert!(!out.is_match());
        assert!(repeat.buffer.borrow().iter().all(|slot| *slot == WireValue::null()));
        assert_eq!(jvm.live_locals(), 0);
        assert_eq!(jvm.stats().invalid_deletes, 0);
    }

    #[test]
    fn test_dynamic_parameter_unsupported() {
        let (jvm, ctx, cls) = setup();
        let id = jvm.class_id("test/Calc").unwrap();
        jvm.static_method(id, "name", "(Ltest/Calc;)Ljava/lang/String;", |_, _, _| {
            Ok(Value::Ref(None))
        });
        let err = MethodBinding::bind(
            &ctx,
            &cls,
            &MethodDecl::class_method("name", TypeDecl::String).param(TypeDecl::Dynamic(cls.clone())),
        )
        .unwrap_err();
        assert_eq!(
            err,
            BridgeError::RuntimeUnsupported {
                modifiers: String::new(),
                signature: "c".into()
            }
        );
    }
}
