//! Shared fixture for integration tests
//!
//! A small geometry world on the in-memory runtime:
//!
//! ```text
//! test.Shape            sides()I = 0, label()Ljava/lang/String;
//!   test.Circle         <init>(F)V, radius()F, setRadius(F)V, sides()I = 1
//!   test.Square         sides()I = 4
//! test.Geometry         static helpers (scalars, arrays, faults)
//! test.Broken           constructor always throws
//! ```

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use jbridge_core::{
    BridgeConfig, BridgeContext, ClassRegistry, ClassResolver, MethodBinding, MethodDecl,
    Resolution, ScriptClass, ScriptClassRef, ScriptValue, TypeDecl,
};
use jbridge_testkit::{ClassId, Heap, MiniJvm, Thrown, Value};

/// Resolver that counts how often it is asked
pub struct CountingResolver {
    pub inner: ClassRegistry,
    pub calls: Cell<usize>,
}

impl CountingResolver {
    pub fn new() -> Self {
        Self {
            inner: ClassRegistry::new(),
            calls: Cell::new(0),
        }
    }
}

impl ClassResolver for CountingResolver {
    fn resolve(&self, name: &str) -> Resolution {
        self.calls.set(self.calls.get() + 1);
        self.inner.resolve(name)
    }
}

pub struct World {
    pub jvm: Rc<MiniJvm>,
    pub resolver: Rc<CountingResolver>,
    pub ctx: BridgeContext,
    pub shape: ScriptClassRef,
    pub circle: ScriptClassRef,
    pub square: ScriptClassRef,
    pub geometry: ScriptClassRef,
    pub broken: ScriptClassRef,
}

fn float_arg(v: &Value) -> f32 {
    match v {
        Value::Float(f) => *f,
        _ => 0.0,
    }
}

fn new_shape(heap: &mut Heap, class: ClassId) -> Value {
    Value::Ref(Some(heap.new_instance(class)))
}

fn define_runtime(jvm: &MiniJvm) {
    let shape = jvm.define_class("test/Shape", None);
    let circle = jvm.define_class("test/Circle", Some(shape));
    let square = jvm.define_class("test/Square", Some(shape));
    let geometry = jvm.define_class("test/Geometry", None);
    let broken = jvm.define_class("test/Broken", None);

    jvm.method(shape, "sides", "()I", |_, _, _| Ok(Value::Int(0)));
    jvm.method(square, "sides", "()I", |_, _, _| Ok(Value::Int(4)));
    jvm.method(circle, "sides", "()I", |_, _, _| Ok(Value::Int(1)));
    jvm.method(shape, "label", "()Ljava/lang/String;", |heap, this, _| {
        let sides = this.map(|id| heap.field(id, "sides")).unwrap_or(Value::Void);
        let label = format!("shape {:?}", sides);
        Ok(Value::Ref(Some(heap.new_string(&label))))
    });

    jvm.constructor(circle, "(F)V", |heap, this, args| {
        if let Some(id) = this {
            heap.set_field(id, "radius", args[0]);
        }
        Ok(Value::Void)
    });
    jvm.method(circle, "radius", "()F", |heap, this, _| {
        Ok(this.map(|id| heap.field(id, "radius")).unwrap_or(Value::Float(0.0)))
    });
    jvm.method(circle, "setRadius", "(F)V", |heap, this, args| {
        if let Some(id) = this {
            heap.set_field(id, "radius", args[0]);
        }
        Ok(Value::Void)
    });
    jvm.constructor(broken, "()V", |_, _, _| Err(Thrown::runtime("cannot build")));

    // Scalars
    jvm.static_method(geometry, "isBig", "(F)Z", |_, _, args| {
        Ok(Value::Boolean(float_arg(&args[0]) > 10.0))
    });
    jvm.static_method(geometry, "twice", "(I)I", |_, _, args| match args[0] {
        Value::Int(n) => Ok(Value::Int(n * 2)),
        _ => Err(Thrown::runtime("bad int")),
    });
    jvm.static_method(geometry, "half", "(F)F", |_, _, args| {
        Ok(Value::Float(float_arg(&args[0]) / 2.0))
    });
    jvm.static_method(geometry, "big", "()J", |_, _, _| Ok(Value::Long(0x1_2345_6789)));
    jvm.static_method(geometry, "negate", "(J)J", |_, _, args| match args[0] {
        Value::Long(l) => Ok(Value::Long(-l)),
        _ => Err(Thrown::runtime("bad long")),
    });
    jvm.static_method(geometry, "greet", "(Ljava/lang/String;)Ljava/lang/String;", |heap, _, args| {
        let name = heap.string_arg(&args[0]).unwrap_or_else(|| "nobody".to_string());
        Ok(Value::Ref(Some(heap.new_string(&format!("hello {}", name)))))
    });

    // Objects
    jvm.static_method(geometry, "describe", "(Ltest/Shape;)Ljava/lang/String;", |heap, _, args| {
        let text = match args[0] {
            Value::Ref(None) => "none".to_string(),
            Value::Ref(Some(_)) => "some".to_string(),
            _ => "?".to_string(),
        };
        Ok(Value::Ref(Some(heap.new_string(&text))))
    });
    jvm.static_method(geometry, "mix", "(Ltest/Shape;IF)F", |_, _, args| {
        let base = match args[1] {
            Value::Int(n) => n as f32,
            _ => 0.0,
        };
        let bonus = if matches!(args[0], Value::Ref(None)) { 0.5 } else { 100.0 };
        Ok(Value::Float(base + float_arg(&args[2]) + bonus))
    });
    jvm.static_method(geometry, "pick", "(I)Ltest/Shape;", move |heap, _, args| match args[0] {
        Value::Int(0) => Ok(new_shape(heap, circle)),
        Value::Int(1) => Ok(new_shape(heap, square)),
        _ => Ok(Value::Ref(None)),
    });
    jvm.static_method(geometry, "unit", "()Ltest/Circle;", move |heap, _, _| {
        let id = heap.new_instance(circle);
        heap.set_field(id, "radius", Value::Float(1.0));
        Ok(Value::Ref(Some(id)))
    });

    // Arrays
    jvm.static_method(geometry, "sum", "([F)F", |heap, _, args| {
        let items = heap.float_array(&args[0]).unwrap_or_default();
        Ok(Value::Float(items.iter().sum()))
    });
    jvm.static_method(geometry, "scale", "([FF)[F", |heap, _, args| {
        let k = float_arg(&args[1]);
        let items: Vec<f32> = heap
            .float_array(&args[0])
            .unwrap_or_default()
            .into_iter()
            .map(|x| x * k)
            .collect();
        Ok(Value::Ref(Some(heap.new_float_array(items))))
    });
    jvm.static_method(geometry, "missing", "()[F", |_, _, _| Ok(Value::Ref(None)));
    jvm.static_method(geometry, "ints", "(I)[I", |heap, _, args| {
        let n = match args[0] {
            Value::Int(n) => n,
            _ => 0,
        };
        Ok(Value::Ref(Some(heap.new_int_array((0..n).collect()))))
    });
    jvm.static_method(geometry, "longs", "()[J", |heap, _, _| {
        Ok(Value::Ref(Some(heap.new_long_array(vec![1 << 40, -1]))))
    });
    jvm.static_method(geometry, "names", "()[Ljava/lang/String;", |heap, _, _| {
        let a = heap.new_string("a");
        let b = heap.new_string("b");
        Ok(Value::Ref(Some(heap.new_object_array(vec![Some(a), None, Some(b)]))))
    });
    jvm.static_method(geometry, "shapes", "()[Ltest/Shape;", move |heap, _, _| {
        let c = heap.new_instance(circle);
        let s = heap.new_instance(square);
        Ok(Value::Ref(Some(heap.new_object_array(vec![Some(c), Some(s)]))))
    });
    jvm.static_method(geometry, "flags", "()[Z", |_, _, _| Ok(Value::Ref(None)));
    jvm.static_method(geometry, "total", "([I)I", |_, _, _| Ok(Value::Int(0)));

    // Faults
    jvm.static_method(geometry, "fail", "(Ljava/lang/String;)I", |heap, _, args| {
        Err(Thrown::runtime(heap.string_arg(&args[0]).unwrap_or_default()))
    });
    jvm.static_method(geometry, "failWithShape", "()Ltest/Shape;", |_, _, _| {
        Err(Thrown::runtime("no shape"))
    });
}

impl World {
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        let jvm = Rc::new(MiniJvm::new());
        define_runtime(&jvm);

        let resolver = Rc::new(CountingResolver::new());
        let shape = ScriptClass::new("Shape", "test.Shape", None);
        let circle = ScriptClass::new("Circle", "test.Circle", Some(shape.clone()));
        let square = ScriptClass::new("Square", "test.Square", Some(shape.clone()));
        let geometry = ScriptClass::new("Geometry", "test.Geometry", None);
        let broken = ScriptClass::new("Broken", "test.Broken", None);
        for cls in [&shape, &circle, &square, &geometry, &broken] {
            resolver.inner.register(cls.clone());
        }

        let ctx = BridgeContext::with_config(jvm.clone(), resolver.clone(), config);
        for cls in [&shape, &geometry, &broken] {
            cls.bind_foreign(&ctx).expect("fixture class binds");
        }
        // Circle is bound eagerly; Square is left for runtime-type resolution.
        circle.bind_foreign(&ctx).expect("fixture class binds");

        Self {
            jvm,
            resolver,
            ctx,
            shape,
            circle,
            square,
            geometry,
            broken,
        }
    }

    pub fn bind_static(&self, name: &str, ret: TypeDecl, params: Vec<TypeDecl>) -> MethodBinding {
        MethodBinding::bind(
            &self.ctx,
            &self.geometry,
            &MethodDecl::class_method(name, ret).params(params),
        )
        .expect("static method binds")
    }

    /// Call a static helper and unwrap the returned value
    pub fn call_static(&self, binding: &MethodBinding, args: &[ScriptValue]) -> ScriptValue {
        binding
            .call(&self.ctx, &ScriptValue::Class(self.geometry.clone()), args)
            .expect("call succeeds")
            .into_value()
            .expect("arguments match")
    }

    pub fn new_circle(&self, radius: f32) -> ScriptValue {
        let ctor = MethodBinding::bind(
            &self.ctx,
            &self.circle,
            &MethodDecl::constructor().param(TypeDecl::Float),
        )
        .expect("constructor binds");
        ctor.call(&self.ctx, &ScriptValue::Nil, &[ScriptValue::Float(f64::from(radius))])
            .expect("construction succeeds")
            .into_value()
            .expect("arguments match")
    }
}
