//! jbridge testkit - in-memory foreign runtime
//!
//! [`MiniJvm`] implements [`jbridge_sdk::ForeignEnv`] over a small object heap
//! so the bridge can be exercised without a real virtual machine. It records
//! every reference it hands out and every release it receives.
//!
//! ```ignore
//! use jbridge_testkit::{MiniJvm, Value};
//!
//! let jvm = MiniJvm::new();
//! let calc = jvm.define_class("demo/Calc", None);
//! jvm.static_method(calc, "twice", "(I)I", |_, _, args| match args {
//!     [Value::Int(n)] => Ok(Value::Int(n * 2)),
//!     _ => unreachable!(),
//! });
//! ```

#![warn(rust_2018_idioms)]

pub mod heap;
pub mod jvm;

pub use heap::{ClassId, Heap, HeapObject, ObjId, Thrown, Value};
pub use jvm::{MethodBody, MiniJvm, RefStats};
