//! jbridge core - method binding and value marshalling across runtimes
//!
//! Lets a script runtime call methods on objects that live in a foreign
//! object runtime (a JVM behind a JNI-style environment):
//!
//! - [`signature`]: declared types to wire descriptors and marshaller tags
//! - [`marshal`]: script values to wire values and back, including arrays
//! - [`handle`]: ownership of long-lived and transient foreign references
//! - [`binding`]: resolve once, call many times
//! - [`dispatch`]: the closed set of call strategies
//! - [`exception`]: fault translation in both directions
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use jbridge_core::{BridgeContext, ClassRegistry, MethodBinding, MethodDecl, ScriptClass, ScriptValue, TypeDecl};
//!
//! let ctx = BridgeContext::new(env, Rc::new(ClassRegistry::new()));
//! let math = ScriptClass::new("JMath", "java.lang.Math", None);
//! math.bind_foreign(&ctx)?;
//!
//! let abs = MethodBinding::bind(
//!     &ctx,
//!     &math,
//!     &MethodDecl::class_method("abs", TypeDecl::Int).param(TypeDecl::Int),
//! )?;
//! let out = abs.call(&ctx, &ScriptValue::Class(math.clone()), &[ScriptValue::Int(-3)])?;
//! ```

#![warn(rust_2018_idioms)]

pub mod binding;
pub mod class;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod exception;
pub mod field;
pub mod handle;
pub mod marshal;
pub mod overload;
pub mod resolver;
pub mod signature;
pub mod value;

pub use binding::{CallOutcome, MethodBinding, MethodDecl};
pub use class::{ScriptClass, ScriptClassRef};
pub use config::{BridgeConfig, ConfigError};
pub use context::BridgeContext;
pub use dispatch::{Dispatch, ElementKind, ReturnShape, ValueKind};
pub use error::{ArgumentMismatch, BridgeError, BridgeResult, MismatchReason};
pub use exception::{FaultTranslation, ScriptFault};
pub use field::read_static_field;
pub use handle::{ClassHandle, ForeignHandle};
pub use overload::OverloadSet;
pub use resolver::{ClassRegistry, ClassResolver, Resolution};
pub use signature::{Signature, SignatureError, TypeDecl, TypeTag};
pub use value::{JLong, ScriptObject, ScriptValue};

// Re-export the SDK so hosts need only one dependency
pub use jbridge_sdk as sdk;
