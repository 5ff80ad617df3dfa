//! Bridge error types.
//!
//! Hard failures are [`BridgeError`]. An argument list that does not fit a
//! binding is not an error: it is an [`ArgumentMismatch`], returned as data so
//! callers can try several overloads before committing to one.

use std::fmt;

use crate::signature::SignatureError;

/// Errors raised by binding, dispatch and field access
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BridgeError {
    /// A foreign member was not found at bind time
    #[error("can't find {name}{descriptor}")]
    NameResolution {
        /// Member or class name
        name: String,
        /// Wire descriptor used for the lookup (empty for classes)
        descriptor: String,
    },

    /// A signature shape has no dispatch variant
    #[error("runtime doesn't support {modifiers}{signature}")]
    RuntimeUnsupported {
        /// `"static "`, `"array "` or both, possibly empty
        modifiers: String,
        /// Tag text of the offending type
        signature: String,
    },

    /// A foreign fault was pending after a call
    #[error("Java exception is thrown in {method}")]
    ForeignFault {
        /// Invoked method or field name
        method: String,
    },

    /// A constructor produced no object
    #[error("constructor returns null for {class}")]
    NullConstruction {
        /// Class being constructed
        class: String,
    },

    /// The class has not been bound to a foreign type
    #[error("class {class} is not bound to a foreign class")]
    UnboundClass {
        /// Script class name
        class: String,
    },

    /// An instance call was made on something that is not an object of the
    /// binding's class or one of its subclasses
    #[error("{method} needs a receiver of class {class}, got {got}")]
    InvalidReceiver {
        /// Method name
        method: String,
        /// Owner class of the binding
        class: String,
        /// Script type name or class name of the receiver
        got: String,
    },

    /// A binding was called again while one of its calls was in progress
    #[error("reentrant call to {method}")]
    Reentrant {
        /// Method name
        method: String,
    },

    /// No candidate of an overload set accepted the arguments
    #[error("no overload of {name} accepts {given} argument(s)")]
    NoMatchingOverload {
        /// Overloaded method name
        name: String,
        /// Number of arguments given
        given: usize,
    },

    /// The foreign runtime returned a slot of the wrong kind
    #[error("expected {expected} from the foreign runtime, got {got}")]
    WireMismatch {
        /// Expected wire kind
        expected: &'static str,
        /// Wire kind received
        got: &'static str,
    },

    /// Malformed tag text
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Why one argument value failed the marshalling check
#[derive(Debug, Clone, PartialEq)]
pub enum MismatchReason {
    /// The value kind does not fit the tag
    WrongType {
        /// Tag text expected
        expected: String,
        /// Script type name given
        got: &'static str,
    },
    /// The declared parameter class is unknown to the resolver
    UnknownClass {
        /// Dotted foreign class name
        class: String,
    },
    /// The object's class is not the declared class or a subclass of it
    NotSubclass {
        /// Declared class
        expected: String,
        /// Object's class
        got: String,
    },
    /// An array element failed
    Element {
        /// Element index
        index: usize,
        /// Element failure
        reason: Box<MismatchReason>,
    },
    /// The foreign runtime could not allocate a string or array
    Allocation,
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchReason::WrongType { expected, got } => {
                write!(f, "expected {}, got {}", expected, got)
            }
            MismatchReason::UnknownClass { class } => write!(f, "unknown class {}", class),
            MismatchReason::NotSubclass { expected, got } => {
                write!(f, "{} is not a {}", got, expected)
            }
            MismatchReason::Element { index, reason } => {
                write!(f, "element {}: {}", index, reason)
            }
            MismatchReason::Allocation => write!(f, "foreign allocation failed"),
        }
    }
}

/// Soft "no match" result of checking arguments against a binding
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentMismatch {
    /// Wrong number of arguments
    Arity {
        /// Arguments given
        given: usize,
        /// Parameters declared
        expected: usize,
    },
    /// One argument did not fit its parameter
    Argument {
        /// Argument position
        index: usize,
        /// Failure detail
        reason: MismatchReason,
    },
}

impl fmt::Display for ArgumentMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentMismatch::Arity { given, expected } => {
                write!(f, "wrong number of arguments ({} for {})", given, expected)
            }
            ArgumentMismatch::Argument { index, reason } => {
                write!(f, "argument {}: {}", index, reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_method() {
        let err = BridgeError::NameResolution {
            name: "add".into(),
            descriptor: "(II)I".into(),
        };
        assert_eq!(err.to_string(), "can't find add(II)I");

        let err = BridgeError::ForeignFault { method: "add".into() };
        assert!(err.to_string().contains("add"));

        let err = BridgeError::RuntimeUnsupported {
            modifiers: "static array ".into(),
            signature: "[Z".into(),
        };
        assert_eq!(err.to_string(), "runtime doesn't support static array [Z");
    }

    #[test]
    fn test_mismatch_display() {
        let m = ArgumentMismatch::Argument {
            index: 1,
            reason: MismatchReason::Element {
                index: 2,
                reason: Box::new(MismatchReason::WrongType {
                    expected: "F".into(),
                    got: "string",
                }),
            },
        };
        assert_eq!(m.to_string(), "argument 1: element 2: expected F, got string");
        assert_eq!(
            ArgumentMismatch::Arity { given: 1, expected: 2 }.to_string(),
            "wrong number of arguments (1 for 2)"
        );
    }
}
