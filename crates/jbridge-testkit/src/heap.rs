//! Object heap of the in-memory runtime
//!
//! Objects are never collected; tests observe reference handles, not object
//! lifetimes. Method bodies receive `&mut Heap` to read arguments and
//! allocate results.

use rustc_hash::FxHashMap;

/// Index of an object on the heap
pub type ObjId = usize;

/// Index of a class definition
pub type ClassId = usize;

pub(crate) const OBJECT_CLASS: ClassId = 0;
pub(crate) const CLASS_CLASS: ClassId = 1;
pub(crate) const STRING_CLASS: ClassId = 2;

/// A value as seen by method bodies (heap ids instead of references)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// No value (void methods, uninitialised fields)
    Void,
    /// boolean
    Boolean(bool),
    /// int
    Int(i32),
    /// long
    Long(i64),
    /// float
    Float(f32),
    /// Reference, `None` for null
    Ref(Option<ObjId>),
}

/// A fault raised by a method body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thrown {
    /// Slash-separated class path of the fault
    pub class: String,
    /// Fault message
    pub message: String,
}

impl Thrown {
    /// Create a fault of the given class
    pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            message: message.into(),
        }
    }

    /// Shorthand for `java/lang/RuntimeException`
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new("java/lang/RuntimeException", message)
    }
}

/// One heap object
#[derive(Debug, Clone)]
pub enum HeapObject {
    /// Plain instance with named fields
    Instance {
        /// Runtime class
        class: ClassId,
        /// Instance fields
        fields: FxHashMap<String, Value>,
    },
    /// `java.lang.String`
    Str(String),
    /// `int[]`
    IntArray(Vec<i32>),
    /// `long[]`
    LongArray(Vec<i64>),
    /// `float[]`
    FloatArray(Vec<f32>),
    /// Reference array
    ObjectArray(Vec<Option<ObjId>>),
    /// `java.lang.Class` instance describing a class
    Class {
        /// Described class
        id: ClassId,
        /// Dotted class name, as `getName` reports it
        name: String,
    },
}

/// Heap storage
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<HeapObject>,
}

impl Heap {
    /// Allocate an object
    pub fn alloc(&mut self, obj: HeapObject) -> ObjId {
        self.objects.push(obj);
        self.objects.len() - 1
    }

    /// Borrow an object
    pub fn get(&self, id: ObjId) -> &HeapObject {
        &self.objects[id]
    }

    /// Runtime class of an object
    pub fn class_of(&self, id: ObjId) -> ClassId {
        match &self.objects[id] {
            HeapObject::Instance { class, .. } => *class,
            HeapObject::Str(_) => STRING_CLASS,
            HeapObject::Class { .. } => CLASS_CLASS,
            _ => OBJECT_CLASS,
        }
    }

    /// Allocate a plain instance
    pub fn new_instance(&mut self, class: ClassId) -> ObjId {
        self.alloc(HeapObject::Instance {
            class,
            fields: FxHashMap::default(),
        })
    }

    /// Allocate a string
    pub fn new_string(&mut self, s: &str) -> ObjId {
        self.alloc(HeapObject::Str(s.to_string()))
    }

    /// Read a string object
    pub fn string(&self, id: ObjId) -> Option<&str> {
        match &self.objects[id] {
            HeapObject::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Read a string argument, treating null as absent
    pub fn string_arg(&self, value: &Value) -> Option<String> {
        match value {
            Value::Ref(Some(id)) => self.string(*id).map(str::to_string),
            _ => None,
        }
    }

    /// Read an instance field (`Value::Void` when unset)
    pub fn field(&self, obj: ObjId, name: &str) -> Value {
        match &self.objects[obj] {
            HeapObject::Instance { fields, .. } => fields.get(name).copied().unwrap_or(Value::Void),
            _ => Value::Void,
        }
    }

    /// Write an instance field
    pub fn set_field(&mut self, obj: ObjId, name: &str, value: Value) {
        if let HeapObject::Instance { fields, .. } = &mut self.objects[obj] {
            fields.insert(name.to_string(), value);
        }
    }

    /// Allocate an `int[]`
    pub fn new_int_array(&mut self, elements: Vec<i32>) -> ObjId {
        self.alloc(HeapObject::IntArray(elements))
    }

    /// Allocate a `long[]`
    pub fn new_long_array(&mut self, elements: Vec<i64>) -> ObjId {
        self.alloc(HeapObject::LongArray(elements))
    }

    /// Allocate a `float[]`
    pub fn new_float_array(&mut self, elements: Vec<f32>) -> ObjId {
        self.alloc(HeapObject::FloatArray(elements))
    }

    /// Allocate a reference array
    pub fn new_object_array(&mut self, elements: Vec<Option<ObjId>>) -> ObjId {
        self.alloc(HeapObject::ObjectArray(elements))
    }

    /// Read a `float[]` argument
    pub fn float_array(&self, value: &Value) -> Option<Vec<f32>> {
        match value {
            Value::Ref(Some(id)) => match &self.objects[*id] {
                HeapObject::FloatArray(v) => Some(v.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Number of objects ever allocated
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if nothing was allocated
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
