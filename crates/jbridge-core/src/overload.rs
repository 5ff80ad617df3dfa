//! Overload sets
//!
//! Several bindings that share a name are linked into one [`OverloadSet`].
//! A call tries the candidates in order with the allocation-free check and
//! commits to the first one that accepts the arguments.

use std::fmt;

use crate::binding::{CallOutcome, MethodBinding, MethodDecl};
use crate::class::ScriptClassRef;
use crate::context::BridgeContext;
use crate::error::{BridgeError, BridgeResult};
use crate::value::ScriptValue;

/// Ordered candidate bindings sharing one name
pub struct OverloadSet {
    name: String,
    candidates: Vec<MethodBinding>,
}

impl fmt::Debug for OverloadSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverloadSet")
            .field("name", &self.name)
            .field("count", &self.candidates.len())
            .finish()
    }
}

impl OverloadSet {
    /// Bind every declaration against `owner`.
    ///
    /// Fails on the first declaration that cannot be bound.
    pub fn link(
        ctx: &BridgeContext,
        owner: &ScriptClassRef,
        name: impl Into<String>,
        decls: &[MethodDecl],
    ) -> BridgeResult<Self> {
        let mut candidates = Vec::with_capacity(decls.len());
        for decl in decls {
            candidates.push(MethodBinding::bind(ctx, owner, decl)?);
        }
        Ok(Self {
            name: name.into(),
            candidates,
        })
    }

    /// Build from already bound candidates
    pub fn from_bindings(name: impl Into<String>, candidates: Vec<MethodBinding>) -> Self {
        Self {
            name: name.into(),
            candidates,
        }
    }

    /// Index of the first candidate accepting `args`
    pub fn select(&self, ctx: &BridgeContext, args: &[ScriptValue]) -> Option<usize> {
        self.candidates
            .iter()
            .position(|binding| binding.check(ctx, args).is_ok())
    }

    /// Call the first candidate accepting `args`
    pub fn call(
        &self,
        ctx: &BridgeContext,
        receiver: &ScriptValue,
        args: &[ScriptValue],
    ) -> BridgeResult<ScriptValue> {
        let no_match = || BridgeError::NoMatchingOverload {
            name: self.name.clone(),
            given: args.len(),
        };
        let index = self.select(ctx, args).ok_or_else(no_match)?;
        tracing::trace!(name = %self.name, index, "overload selected");
        match self.candidates[index].call(ctx, receiver, args)? {
            CallOutcome::Returned(value) => Ok(value),
            CallOutcome::NoMatch(_) => Err(no_match()),
        }
    }

    /// Shared name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Candidate bindings in trial order
    pub fn candidates(&self) -> &[MethodBinding] {
        &self.candidates
    }

    /// Get the number of candidates
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Check if there are no candidates
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
