//! MiniJvm: an in-memory `ForeignEnv`
//!
//! Implements just enough of a JVM-shaped object runtime to drive the bridge
//! end to end: classes with single inheritance, virtual instance methods,
//! static methods and fields, strings, primitive and reference arrays,
//! pending faults, and separate local/global reference tables.
//!
//! Every reference operation is counted in [`RefStats`] so tests can assert
//! that nothing leaks and nothing is released twice. Using a reference after
//! it was released panics, the way a real runtime would crash.

use std::cell::RefCell;
use std::rc::Rc;

use jbridge_sdk::{CallKind, FieldId, ForeignEnv, MethodId, RawRef, WireValue};
use rustc_hash::FxHashMap;

use crate::heap::{ClassId, Heap, HeapObject, ObjId, Thrown, Value, CLASS_CLASS, OBJECT_CLASS, STRING_CLASS};

/// Method implementation: `(heap, this, args) -> result`
pub type MethodBody = Rc<dyn Fn(&mut Heap, Option<ObjId>, &[Value]) -> Result<Value, Thrown>>;

/// Reference accounting counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefStats {
    /// Transient references handed out
    pub locals_created: usize,
    /// Transient references released
    pub locals_deleted: usize,
    /// Long-lived references handed out
    pub globals_created: usize,
    /// Long-lived references released
    pub globals_deleted: usize,
    /// Releases of unknown, already released, or wrong-kind references
    pub invalid_deletes: usize,
    /// Method and constructor invocations
    pub calls: usize,
}

impl RefStats {
    /// Transient references still alive
    pub fn live_locals(&self) -> usize {
        self.locals_created - self.locals_deleted
    }

    /// Long-lived references still alive
    pub fn live_globals(&self) -> usize {
        self.globals_created - self.globals_deleted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefKind {
    Local,
    Global,
}

struct ClassDef {
    path: String,
    superclass: Option<ClassId>,
    object: ObjId,
}

struct MethodDef {
    class: ClassId,
    name: String,
    descriptor: String,
    is_static: bool,
    body: MethodBody,
}

struct FieldDef {
    class: ClassId,
    name: String,
    descriptor: String,
    value: Value,
}

struct State {
    classes: Vec<ClassDef>,
    by_path: FxHashMap<String, ClassId>,
    methods: Vec<MethodDef>,
    fields: Vec<FieldDef>,
    heap: Heap,
    refs: FxHashMap<u64, (ObjId, RefKind)>,
    next_ref: u64,
    pending: Option<ObjId>,
    stats: RefStats,
    fail_allocations: bool,
}

/// In-memory foreign runtime
pub struct MiniJvm {
    state: RefCell<State>,
}

impl MiniJvm {
    /// Create a runtime with the core `java.lang` classes defined
    pub fn new() -> Self {
        let jvm = Self {
            state: RefCell::new(State {
                classes: Vec::new(),
                by_path: FxHashMap::default(),
                methods: Vec::new(),
                fields: Vec::new(),
                heap: Heap::default(),
                refs: FxHashMap::default(),
                next_ref: 1,
                pending: None,
                stats: RefStats::default(),
                fail_allocations: false,
            }),
        };

        let object = jvm.define_class("java/lang/Object", None);
        let class = jvm.define_class("java/lang/Class", Some(object));
        let string = jvm.define_class("java/lang/String", Some(object));
        debug_assert_eq!((object, class, string), (OBJECT_CLASS, CLASS_CLASS, STRING_CLASS));

        let throwable = jvm.define_class("java/lang/Throwable", Some(object));
        let runtime = jvm.define_class("java/lang/RuntimeException", Some(throwable));
        jvm.define_class("java/lang/NoSuchMethodError", Some(throwable));
        jvm.define_class("java/lang/NoSuchFieldError", Some(throwable));
        jvm.define_class("java/lang/NoClassDefFoundError", Some(throwable));
        jvm.define_class("java/lang/IllegalStateException", Some(runtime));

        jvm.method(class, "getName", "()Ljava/lang/String;", |heap, this, _| {
            let name = match this.map(|id| heap.get(id)) {
                Some(HeapObject::Class { name, .. }) => name.clone(),
                _ => return Err(Thrown::runtime("getName on a non-class")),
            };
            Ok(Value::Ref(Some(heap.new_string(&name))))
        });
        jvm.method(string, "length", "()I", |heap, this, _| {
            let len = this.and_then(|id| heap.string(id)).map_or(0, str::len);
            Ok(Value::Int(len as i32))
        });
        jvm
    }

    // ========================================================================
    // Definition API
    // ========================================================================

    /// Define a class by slash-separated path
    pub fn define_class(&self, path: &str, superclass: Option<ClassId>) -> ClassId {
        let mut state = self.state.borrow_mut();
        let id = state.classes.len();
        let object = state.heap.alloc(HeapObject::Class {
            id,
            name: path.replace('/', "."),
        });
        state.classes.push(ClassDef {
            path: path.to_string(),
            superclass: superclass.or(if path == "java/lang/Object" { None } else { Some(OBJECT_CLASS) }),
            object,
        });
        state.by_path.insert(path.to_string(), id);
        id
    }

    /// Look up a class id by path
    pub fn class_id(&self, path: &str) -> Option<ClassId> {
        self.state.borrow().by_path.get(path).copied()
    }

    fn add_method(&self, class: ClassId, name: &str, descriptor: &str, is_static: bool, body: MethodBody) {
        self.state.borrow_mut().methods.push(MethodDef {
            class,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            is_static,
            body,
        });
    }

    /// Define a virtual instance method
    pub fn method(
        &self,
        class: ClassId,
        name: &str,
        descriptor: &str,
        body: impl Fn(&mut Heap, Option<ObjId>, &[Value]) -> Result<Value, Thrown> + 'static,
    ) {
        self.add_method(class, name, descriptor, false, Rc::new(body));
    }

    /// Define a static method
    pub fn static_method(
        &self,
        class: ClassId,
        name: &str,
        descriptor: &str,
        body: impl Fn(&mut Heap, Option<ObjId>, &[Value]) -> Result<Value, Thrown> + 'static,
    ) {
        self.add_method(class, name, descriptor, true, Rc::new(body));
    }

    /// Define a constructor; the body initialises `this`
    pub fn constructor(
        &self,
        class: ClassId,
        descriptor: &str,
        body: impl Fn(&mut Heap, Option<ObjId>, &[Value]) -> Result<Value, Thrown> + 'static,
    ) {
        self.add_method(class, "<init>", descriptor, false, Rc::new(body));
    }

    /// Define a static field holding `value`
    pub fn static_field(&self, class: ClassId, name: &str, descriptor: &str, value: Value) {
        self.state.borrow_mut().fields.push(FieldDef {
            class,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            value,
        });
    }

    /// Define a static `String` field
    pub fn static_string_field(&self, class: ClassId, name: &str, s: &str) {
        let id = self.with_heap(|heap| heap.new_string(s));
        self.static_field(class, name, "Ljava/lang/String;", Value::Ref(Some(id)));
    }

    // ========================================================================
    // Inspection API
    // ========================================================================

    /// Run a closure against the heap
    pub fn with_heap<R>(&self, f: impl FnOnce(&mut Heap) -> R) -> R {
        f(&mut self.state.borrow_mut().heap)
    }

    /// Snapshot of the reference counters
    pub fn stats(&self) -> RefStats {
        self.state.borrow().stats
    }

    /// Transient references still alive
    pub fn live_locals(&self) -> usize {
        self.stats().live_locals()
    }

    /// Long-lived references still alive
    pub fn live_globals(&self) -> usize {
        self.stats().live_globals()
    }

    /// Number of method and constructor invocations so far
    pub fn calls(&self) -> usize {
        self.stats().calls
    }

    /// The pending fault, if any, as class path and message
    pub fn pending_exception(&self) -> Option<Thrown> {
        let state = self.state.borrow();
        let id = state.pending?;
        let class = state.heap.class_of(id);
        let message = match state.heap.field(id, "message") {
            Value::Ref(Some(m)) => state.heap.string(m).unwrap_or_default().to_string(),
            _ => String::new(),
        };
        Some(Thrown::new(state.classes[class].path.clone(), message))
    }

    /// Make `new_object` return null without raising a fault
    pub fn fail_allocations(&self, on: bool) {
        self.state.borrow_mut().fail_allocations = on;
    }

    /// Raise a fault directly, as if a callee had thrown it
    pub fn raise(&self, thrown: Thrown) {
        self.state.borrow_mut().throw(thrown);
    }

    /// Hand out a new transient reference to a heap object
    pub fn new_local(&self, obj: ObjId) -> RawRef {
        self.state.borrow_mut().new_ref(obj, RefKind::Local)
    }

    /// Heap object behind a live reference
    pub fn object_of(&self, r: RawRef) -> ObjId {
        self.state.borrow().deref(r)
    }
}

impl Default for MiniJvm {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    fn new_ref(&mut self, obj: ObjId, kind: RefKind) -> RawRef {
        let bits = self.next_ref;
        self.next_ref += 1;
        self.refs.insert(bits, (obj, kind));
        match kind {
            RefKind::Local => self.stats.locals_created += 1,
            RefKind::Global => self.stats.globals_created += 1,
        }
        RawRef::from_bits(bits).unwrap_or_else(|| unreachable!("reference ids start at 1"))
    }

    fn deref(&self, r: RawRef) -> ObjId {
        match self.refs.get(&r.to_bits()) {
            Some((obj, _)) => *obj,
            None => panic!("use of released or unknown reference {:?}", r),
        }
    }

    fn delete_ref(&mut self, r: RawRef, kind: RefKind) {
        match self.refs.get(&r.to_bits()) {
            Some((_, k)) if *k == kind => {
                self.refs.remove(&r.to_bits());
                match kind {
                    RefKind::Local => self.stats.locals_deleted += 1,
                    RefKind::Global => self.stats.globals_deleted += 1,
                }
            }
            _ => self.stats.invalid_deletes += 1,
        }
    }

    fn class_ref(&self, r: RawRef) -> Option<ClassId> {
        match self.heap.get(self.deref(r)) {
            HeapObject::Class { id, .. } => Some(*id),
            _ => None,
        }
    }

    fn chain(&self, class: ClassId) -> Vec<ClassId> {
        let mut out = vec![class];
        let mut cur = self.classes[class].superclass;
        while let Some(c) = cur {
            out.push(c);
            cur = self.classes[c].superclass;
        }
        out
    }

    fn find_method(&self, class: ClassId, name: &str, descriptor: &str, is_static: bool) -> Option<usize> {
        for c in self.chain(class) {
            let found = self.methods.iter().position(|m| {
                m.class == c && m.name == name && m.descriptor == descriptor && m.is_static == is_static
            });
            if found.is_some() {
                return found;
            }
        }
        None
    }

    fn throw(&mut self, thrown: Thrown) {
        let class = self.by_path.get(&thrown.class).copied().unwrap_or_else(|| {
            self.by_path["java/lang/RuntimeException"]
        });
        let obj = self.heap.new_instance(class);
        let message = self.heap.new_string(&thrown.message);
        self.heap.set_field(obj, "message", Value::Ref(Some(message)));
        self.pending = Some(obj);
    }

    fn to_value(&self, wire: &WireValue) -> Value {
        match wire {
            WireValue::Boolean(b) => Value::Boolean(*b),
            WireValue::Int(i) => Value::Int(*i),
            WireValue::Long(l) => Value::Long(*l),
            WireValue::Float(f) => Value::Float(*f),
            WireValue::Object(r) => Value::Ref(r.map(|r| self.deref(r))),
        }
    }

    fn to_wire(&mut self, value: Value, kind: CallKind) -> WireValue {
        match value {
            Value::Void => kind.zero(),
            Value::Boolean(b) => WireValue::Boolean(b),
            Value::Int(i) => WireValue::Int(i),
            Value::Long(l) => WireValue::Long(l),
            Value::Float(f) => WireValue::Float(f),
            Value::Ref(None) => WireValue::null(),
            Value::Ref(Some(id)) => WireValue::Object(Some(self.new_ref(id, RefKind::Local))),
        }
    }

    fn invoke(&mut self, method: usize, this: Option<ObjId>, args: &[WireValue], kind: CallKind) -> WireValue {
        self.stats.calls += 1;
        let values: Vec<Value> = args.iter().map(|a| self.to_value(a)).collect();
        let body = Rc::clone(&self.methods[method].body);
        match body(&mut self.heap, this, &values) {
            Ok(v) => self.to_wire(v, kind),
            Err(thrown) => {
                self.throw(thrown);
                kind.zero()
            }
        }
    }
}

impl ForeignEnv for MiniJvm {
    fn find_class(&self, path: &str) -> Option<RawRef> {
        let mut state = self.state.borrow_mut();
        match state.by_path.get(path).copied() {
            Some(id) => {
                let obj = state.classes[id].object;
                Some(state.new_ref(obj, RefKind::Local))
            }
            None => {
                state.throw(Thrown::new("java/lang/NoClassDefFoundError", path));
                None
            }
        }
    }

    fn get_object_class(&self, obj: RawRef) -> RawRef {
        let mut state = self.state.borrow_mut();
        let class = state.heap.class_of(state.deref(obj));
        let class_obj = state.classes[class].object;
        state.new_ref(class_obj, RefKind::Local)
    }

    fn get_method_id(&self, class: RawRef, name: &str, descriptor: &str) -> Option<MethodId> {
        let mut state = self.state.borrow_mut();
        let found = state
            .class_ref(class)
            .and_then(|c| state.find_method(c, name, descriptor, false));
        if found.is_none() {
            state.throw(Thrown::new("java/lang/NoSuchMethodError", format!("{}{}", name, descriptor)));
        }
        found.map(|i| MethodId::from_bits(i as u64))
    }

    fn get_static_method_id(&self, class: RawRef, name: &str, descriptor: &str) -> Option<MethodId> {
        let mut state = self.state.borrow_mut();
        let found = state
            .class_ref(class)
            .and_then(|c| state.find_method(c, name, descriptor, true));
        if found.is_none() {
            state.throw(Thrown::new("java/lang/NoSuchMethodError", format!("{}{}", name, descriptor)));
        }
        found.map(|i| MethodId::from_bits(i as u64))
    }

    fn get_static_field_id(&self, class: RawRef, name: &str, descriptor: &str) -> Option<FieldId> {
        let mut state = self.state.borrow_mut();
        let found = state.class_ref(class).and_then(|c| {
            let chain = state.chain(c);
            state.fields.iter().position(|f| {
                chain.contains(&f.class) && f.name == name && f.descriptor == descriptor
            })
        });
        if found.is_none() {
            state.throw(Thrown::new("java/lang/NoSuchFieldError", name));
        }
        found.map(|i| FieldId::from_bits(i as u64))
    }

    fn call_method(&self, kind: CallKind, receiver: RawRef, method: MethodId, args: &[WireValue]) -> WireValue {
        let mut state = self.state.borrow_mut();
        let this = state.deref(receiver);
        let declared = method.to_bits() as usize;
        let (name, descriptor) = {
            let m = &state.methods[declared];
            (m.name.clone(), m.descriptor.clone())
        };
        let runtime_class = state.heap.class_of(this);
        let target = state
            .find_method(runtime_class, &name, &descriptor, false)
            .unwrap_or(declared);
        state.invoke(target, Some(this), args, kind)
    }

    fn call_static_method(&self, kind: CallKind, class: RawRef, method: MethodId, args: &[WireValue]) -> WireValue {
        let mut state = self.state.borrow_mut();
        let _ = state.deref(class);
        state.invoke(method.to_bits() as usize, None, args, kind)
    }

    fn new_object(&self, class: RawRef, constructor: MethodId, args: &[WireValue]) -> Option<RawRef> {
        let mut state = self.state.borrow_mut();
        let class = state.class_ref(class)?;
        if state.fail_allocations {
            state.stats.calls += 1;
            return None;
        }
        let obj = state.heap.new_instance(class);
        state.invoke(constructor.to_bits() as usize, Some(obj), args, CallKind::Void);
        if state.pending.is_some() {
            return None;
        }
        Some(state.new_ref(obj, RefKind::Local))
    }

    fn get_static_field(&self, kind: CallKind, class: RawRef, field: FieldId) -> WireValue {
        let mut state = self.state.borrow_mut();
        let _ = state.deref(class);
        let value = state.fields[field.to_bits() as usize].value;
        state.to_wire(value, kind)
    }

    fn new_global_ref(&self, obj: RawRef) -> RawRef {
        let mut state = self.state.borrow_mut();
        let id = state.deref(obj);
        state.new_ref(id, RefKind::Global)
    }

    fn delete_global_ref(&self, obj: RawRef) {
        self.state.borrow_mut().delete_ref(obj, RefKind::Global);
    }

    fn delete_local_ref(&self, obj: RawRef) {
        self.state.borrow_mut().delete_ref(obj, RefKind::Local);
    }

    fn new_string_utf(&self, s: &str) -> Option<RawRef> {
        let mut state = self.state.borrow_mut();
        let id = state.heap.new_string(s);
        Some(state.new_ref(id, RefKind::Local))
    }

    fn get_string_utf(&self, s: RawRef) -> String {
        let state = self.state.borrow();
        state.heap.string(state.deref(s)).unwrap_or_default().to_string()
    }

    fn get_array_length(&self, array: RawRef) -> usize {
        let state = self.state.borrow();
        match state.heap.get(state.deref(array)) {
            HeapObject::IntArray(v) => v.len(),
            HeapObject::LongArray(v) => v.len(),
            HeapObject::FloatArray(v) => v.len(),
            HeapObject::ObjectArray(v) => v.len(),
            _ => 0,
        }
    }

    fn get_int_array_elements(&self, array: RawRef) -> Vec<i32> {
        let state = self.state.borrow();
        match state.heap.get(state.deref(array)) {
            HeapObject::IntArray(v) => v.clone(),
            _ => Vec::new(),
        }
    }

    fn get_long_array_elements(&self, array: RawRef) -> Vec<i64> {
        let state = self.state.borrow();
        match state.heap.get(state.deref(array)) {
            HeapObject::LongArray(v) => v.clone(),
            _ => Vec::new(),
        }
    }

    fn get_float_array_elements(&self, array: RawRef) -> Vec<f32> {
        let state = self.state.borrow();
        match state.heap.get(state.deref(array)) {
            HeapObject::FloatArray(v) => v.clone(),
            _ => Vec::new(),
        }
    }

    fn get_object_array_element(&self, array: RawRef, index: usize) -> Option<RawRef> {
        let mut state = self.state.borrow_mut();
        let element = match state.heap.get(state.deref(array)) {
            HeapObject::ObjectArray(v) => v.get(index).copied().flatten(),
            _ => None,
        };
        element.map(|id| state.new_ref(id, RefKind::Local))
    }

    fn new_float_array(&self, elements: &[f32]) -> Option<RawRef> {
        let mut state = self.state.borrow_mut();
        let id = state.heap.new_float_array(elements.to_vec());
        Some(state.new_ref(id, RefKind::Local))
    }

    fn exception_check(&self) -> bool {
        self.state.borrow().pending.is_some()
    }

    fn exception_clear(&self) {
        self.state.borrow_mut().pending = None;
    }

    fn throw_new(&self, class: RawRef, message: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(class) = state.class_ref(class) else {
            return false;
        };
        let path = state.classes[class].path.clone();
        state.throw(Thrown::new(path, message));
        true
    }
}
