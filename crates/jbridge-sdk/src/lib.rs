//! jbridge SDK - foreign runtime ABI seam
//!
//! This crate provides the minimal types and the environment trait needed to
//! plug a foreign object runtime into the jbridge core without depending on
//! the core itself.
//!
//! # Example
//!
//! ```ignore
//! use jbridge_sdk::{CallKind, ForeignEnv, WireValue};
//!
//! fn string_length(env: &dyn ForeignEnv, s: &str) -> Option<i32> {
//!     let class = env.find_class("java/lang/String")?;
//!     let method = env.get_method_id(class, "length", "()I")?;
//!     let jstr = env.new_string_utf(s)?;
//!     let len = env.call_method(CallKind::Int, jstr, method, &[]);
//!     env.delete_local_ref(jstr);
//!     env.delete_local_ref(class);
//!     len.as_i32()
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod env;
pub mod value;

pub use env::ForeignEnv;
pub use value::{CallKind, FieldId, MethodId, RawRef, WireValue};

/// Wire descriptor of the foreign string type
pub const STRING_DESCRIPTOR: &str = "Ljava/lang/String;";

/// Name the foreign runtime gives constructors
pub const CONSTRUCTOR_NAME: &str = "<init>";
