// ABOUTME: Error types and non-local-exit handling for evaluation failures

//! Error taxonomy and the non-local-exit channel ("Longjump-based
//! unwind").
//!
//! Conditions need *open* subtyping (`uw_register_subtype(child, parent)`),
//! which a closed Rust enum can't express, so this crate represents every
//! raised condition — programmatic errors and user `throw`s alike — as one
//! `Unwind::Throw` carrying a tag symbol and an argument value, matched
//! against a subtype table built at `Interp` construction (`interp.rs`).
//! This keeps exactly one non-local-exit mechanism instead of a separate
//! error enum racing a separate throw path.

use std::collections::HashMap;
use std::rc::Rc;

use crate::value::{SymbolData, Value};
use thiserror::Error;

/// Fixed exception tags, interned once at `Interp` construction.
pub const TAG_ERROR: &str = "error";
pub const TAG_EVAL_ERROR: &str = "eval-error";
pub const TAG_TYPE_ERROR: &str = "type-error";
pub const TAG_FILE_ERROR: &str = "file-error";
pub const TAG_PROCESS_ERROR: &str = "process-error";
pub const TAG_NUMERIC_ERROR: &str = "numeric-error";
pub const TAG_RANGE_ERROR: &str = "range-error";
pub const TAG_QUERY_ERROR: &str = "query-error";
pub const TAG_INTERNAL_ERROR: &str = "internal-error";

/// `uw_register_subtype`/`uw_exception_subtype_p`: a flat parent map
/// over tag names, since the tag set is fixed and interned in the `sys`
/// package (callers may still register further subtypes at runtime via
/// `register_subtype`, matching the built-in tags' own containment).
#[derive(Default)]
pub struct ExceptionTaxonomy {
    parents: HashMap<String, String>,
}

impl ExceptionTaxonomy {
    pub fn with_builtin_tree() -> Self {
        let mut t = ExceptionTaxonomy::default();
        for child in [
            TAG_EVAL_ERROR,
            TAG_TYPE_ERROR,
            TAG_FILE_ERROR,
            TAG_PROCESS_ERROR,
            TAG_NUMERIC_ERROR,
            TAG_RANGE_ERROR,
            TAG_QUERY_ERROR,
            TAG_INTERNAL_ERROR,
        ] {
            t.register_subtype(child, TAG_ERROR);
        }
        t.register_subtype(TAG_RANGE_ERROR, TAG_NUMERIC_ERROR);
        t
    }

    pub fn register_subtype(&mut self, child: &str, parent: &str) {
        self.parents.insert(child.to_string(), parent.to_string());
    }

    /// True if `tag` is `target` or a (possibly transitive) subtype of it.
    pub fn is_subtype(&self, tag: &str, target: &str) -> bool {
        if tag == target {
            return true;
        }
        let mut cur = tag;
        while let Some(parent) = self.parents.get(cur) {
            if parent == target {
                return true;
            }
            cur = parent;
        }
        false
    }
}

/// A source location recorded by the reader when available ("including
/// the source location recorded on the offending form").
#[derive(Clone, Debug, Default)]
pub struct SourceLoc {
    pub file: Option<String>,
    pub line: usize,
}

impl std::fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{file}:{}", self.line),
            None => write!(f, "line {}", self.line),
        }
    }
}

/// The single non-local-exit channel: every `block`/`return-from`,
/// `catch`/`throw`, and programmatic failure propagates as one of these two
/// variants through ordinary `Result::Err` ("an explicit stack of
/// dynamic frames" is realized here as the Rust call stack itself, walked
/// by `?` propagation rather than a hand-rolled frame stack).
#[derive(Clone, Debug)]
pub enum Unwind {
    /// `return-from name value` / bare `return value` (name = `None`).
    ReturnFrom { name: Option<Rc<SymbolData>>, value: Value },
    /// `throw tag arg`, and every programmatic error raised by the
    /// evaluator or a builtin (tag drawn from the fixed taxonomy above, or
    /// a user-chosen symbol).
    Throw { tag: Rc<SymbolData>, arg: Value, loc: Option<SourceLoc> },
}

impl Unwind {
    pub fn throw(tag: Rc<SymbolData>, arg: Value) -> Self {
        Unwind::Throw { tag, arg, loc: None }
    }

    pub fn with_loc(mut self, loc: Option<SourceLoc>) -> Self {
        if let Unwind::Throw { loc: slot, .. } = &mut self {
            *slot = loc;
        }
        self
    }

    pub fn tag_name(&self) -> Option<&str> {
        match self {
            Unwind::Throw { tag, .. } => Some(tag.name.as_str()),
            Unwind::ReturnFrom { .. } => None,
        }
    }
}

/// The `Display`-level wrapper surfaced to Rust callers (CLI/REPL) when an
/// `Unwind` escapes every handler: terminate with a non-zero exit code and
/// a printed message including the source location where available. A
/// `thiserror`-derived enum wrapping the tag-based condition rather than a
/// closed variant set.
#[derive(Error, Debug, Clone)]
pub enum LispError {
    #[error("{tag}: {message}{loc}", loc = .loc.as_ref().map(|l| format!(" ({l})")).unwrap_or_default())]
    Unhandled { tag: String, message: String, loc: Option<SourceLoc> },
    #[error("return-from: no enclosing block named {0:?}")]
    UnmatchedReturn(Option<String>),
}

pub fn describe_arg(arg: &Value) -> String {
    match arg {
        Value::Str(s) => s.borrow().clone(),
        other => other.to_string(),
    }
}

impl LispError {
    pub fn from_unwind(unwind: Unwind) -> Self {
        match unwind {
            Unwind::Throw { tag, arg, loc } => LispError::Unhandled {
                tag: tag.name.clone(),
                message: describe_arg(&arg),
                loc,
            },
            Unwind::ReturnFrom { name, .. } => {
                LispError::UnmatchedReturn(name.map(|s| s.name.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtype_tree_matches_builtin_hierarchy() {
        let t = ExceptionTaxonomy::with_builtin_tree();
        assert!(t.is_subtype(TAG_TYPE_ERROR, TAG_ERROR));
        assert!(t.is_subtype(TAG_RANGE_ERROR, TAG_NUMERIC_ERROR));
        assert!(t.is_subtype(TAG_RANGE_ERROR, TAG_ERROR));
        assert!(!t.is_subtype(TAG_TYPE_ERROR, TAG_FILE_ERROR));
    }

    #[test]
    fn custom_subtype_registration() {
        let mut t = ExceptionTaxonomy::with_builtin_tree();
        t.register_subtype("my-error", TAG_EVAL_ERROR);
        assert!(t.is_subtype("my-error", TAG_ERROR));
    }
}
