//! Fault bridging in both directions
//!
//! Foreign to script: after every foreign call, [`check_foreign_fault`] looks
//! for a pending foreign fault without clearing it and turns it into
//! [`BridgeError::ForeignFault`].
//!
//! Script to foreign: when a script-level operation fails, [`translate_script_fault`]
//! throws a runtime exception on the foreign side carrying the script error's
//! message and backtrace. A foreign fault that is already pending wins and
//! the script fault is dropped.

use std::fmt;

use crate::context::BridgeContext;
use crate::error::{BridgeError, BridgeResult};
use crate::handle::LocalRef;

/// An uncaught script error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFault {
    /// Error message
    pub message: String,
    /// Backtrace lines, innermost first
    pub backtrace: Vec<String>,
}

impl ScriptFault {
    /// Fault with an empty backtrace
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            backtrace: Vec::new(),
        }
    }

    /// Attach backtrace lines
    pub fn with_backtrace<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backtrace = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Message, a newline, then the backtrace joined by newlines
    pub fn formatted(&self) -> String {
        let mut out = self.message.clone();
        out.push('\n');
        out.push_str(&self.backtrace.join("\n"));
        out
    }
}

impl fmt::Display for ScriptFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<BridgeError> for ScriptFault {
    fn from(err: BridgeError) -> Self {
        ScriptFault::new(err.to_string())
    }
}

/// Raise [`BridgeError::ForeignFault`] if a foreign fault is pending.
///
/// The fault stays pending unless `clear_faults` is configured.
pub fn check_foreign_fault(ctx: &BridgeContext, method: &str) -> BridgeResult<()> {
    let env = ctx.env();
    if !env.exception_check() {
        return Ok(());
    }
    tracing::debug!(method, "foreign fault pending after call");
    if ctx.config().clear_faults {
        env.exception_clear();
    }
    Err(BridgeError::ForeignFault {
        method: method.to_string(),
    })
}

/// What [`translate_script_fault`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultTranslation {
    /// A foreign fault was already pending; the script fault was dropped
    ForeignPending,
    /// A new foreign runtime exception was thrown
    Thrown,
    /// The runtime exception class could not be found or thrown
    ClassUnavailable,
}

/// Surface a script fault to the foreign side
pub fn translate_script_fault(ctx: &BridgeContext, fault: &ScriptFault) -> FaultTranslation {
    let env = ctx.env();
    if env.exception_check() {
        tracing::debug!(message = %fault.message, "foreign fault pending, script fault dropped");
        return FaultTranslation::ForeignPending;
    }
    let class_path = &ctx.config().runtime_exception_class;
    let Some(class) = LocalRef::from_option(env, env.find_class(class_path)) else {
        env.exception_clear();
        return FaultTranslation::ClassUnavailable;
    };
    if env.throw_new(class.raw(), &fault.formatted()) {
        tracing::debug!(class = %class_path, message = %fault.message, "script fault thrown");
        FaultTranslation::Thrown
    } else {
        FaultTranslation::ClassUnavailable
    }
}

/// Finish a script-level operation: a failure is translated to a foreign
/// fault and `None` is returned.
pub fn finish<T>(ctx: &BridgeContext, result: Result<T, ScriptFault>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(fault) => {
            translate_script_fault(ctx, &fault);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use crate::resolver::ClassRegistry;
    use jbridge_sdk::ForeignEnv;
    use jbridge_testkit::{MiniJvm, Thrown};
    use std::rc::Rc;

    fn context(config: BridgeConfig) -> (Rc<MiniJvm>, BridgeContext) {
        let jvm = Rc::new(MiniJvm::new());
        let ctx = BridgeContext::with_config(jvm.clone(), Rc::new(ClassRegistry::new()), config);
        (jvm, ctx)
    }

    #[test]
    fn test_formatted() {
        let fault = ScriptFault::new("boom").with_backtrace(["a.rb:1", "b.rb:2"]);
        assert_eq!(fault.formatted(), "boom\na.rb:1\nb.rb:2");
        assert_eq!(ScriptFault::new("x").formatted(), "x\n");
    }

    #[test]
    fn test_check_is_non_destructive() {
        let (jvm, ctx) = context(BridgeConfig::default());
        assert!(check_foreign_fault(&ctx, "m").is_ok());
        jvm.raise(Thrown::runtime("bad"));
        let err = check_foreign_fault(&ctx, "m").unwrap_err();
        assert_eq!(err, BridgeError::ForeignFault { method: "m".into() });
        assert!(jvm.exception_check());
    }

    #[test]
    fn test_check_clears_when_configured() {
        let config = BridgeConfig {
            clear_faults: true,
            ..BridgeConfig::default()
        };
        let (jvm, ctx) = context(config);
        jvm.raise(Thrown::runtime("bad"));
        assert!(check_foreign_fault(&ctx, "m").is_err());
        assert!(!jvm.exception_check());
    }

    #[test]
    fn test_translate_throws_runtime_exception() {
        let (jvm, ctx) = context(BridgeConfig::default());
        let fault = ScriptFault::new("undefined method").with_backtrace(["main.rb:3"]);
        assert_eq!(translate_script_fault(&ctx, &fault), FaultTranslation::Thrown);
        assert_eq!(
            jvm.pending_exception(),
            Some(Thrown::runtime("undefined method\nmain.rb:3"))
        );
        assert_eq!(jvm.live_locals(), 0);
    }

    #[test]
    fn test_pending_foreign_fault_wins() {
        let (jvm, ctx) = context(BridgeConfig::default());
        jvm.raise(Thrown::new("java/lang/IllegalStateException", "first"));
        let out = translate_script_fault(&ctx, &ScriptFault::new("second"));
        assert_eq!(out, FaultTranslation::ForeignPending);
        let pending = jvm.pending_exception().unwrap();
        assert_eq!(pending.message, "first");
    }

    #[test]
    fn test_missing_exception_class() {
        let config = BridgeConfig {
            runtime_exception_class: "com/example/NoSuchError".into(),
            ..BridgeConfig::default()
        };
        let (jvm, ctx) = context(config);
        let out = translate_script_fault(&ctx, &ScriptFault::new("x"));
        assert_eq!(out, FaultTranslation::ClassUnavailable);
        assert!(!jvm.exception_check());
    }

    #[test]
    fn test_finish() {
        let (jvm, ctx) = context(BridgeConfig::default());
        assert_eq!(finish(&ctx, Ok::<_, ScriptFault>(3)), Some(3));
        let err: Result<i32, ScriptFault> = Err(BridgeError::NullConstruction {
            class: "Point".into(),
        }
        .into());
        assert_eq!(finish(&ctx, err), None);
        let pending = jvm.pending_exception().unwrap();
        assert!(pending.message.starts_with("constructor returns null for Point"));
    }
}
