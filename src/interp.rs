// ABOUTME: Interp module tying environments, packages, and exception handling into one runtime

//! The `Interp` runtime ("External Interfaces"): ties together
//! environments, packages, and the exception taxonomy, and exposes `eval`,
//! `apply`, `expand`, `intern`, `reg_fun`, `reg_var`.
//!
//! Several operations (`dwim`, higher-order `map`/`filter`/`reduce`,
//! `generate`'s forcing) need to call back into evaluation from within a
//! builtin, so builtins take an explicit `&mut Interp` rather than a bare
//! `&[Value]` — a thread-local-singleton interpreter can't support that
//! cleanly once builtins themselves need to re-enter `eval`.

use std::rc::Rc;

use crate::env::Environment;
use crate::error::{ExceptionTaxonomy, LispError, SourceLoc, Unwind};
use crate::package::Packages;
use crate::value::{Arity, BuiltinFn, FunctionData, ParamList, Value};

pub struct Interp {
    pub global_env: Rc<Environment>,
    pub packages: Packages,
    pub taxonomy: ExceptionTaxonomy,
    /// Innermost-first stack of open block names, for `return`/
    /// `return-from`'s "nearest enclosing matching" rule.
    pub block_stack: Vec<Option<String>>,
    pub call_depth: usize,
}

impl Interp {
    pub fn new() -> Self {
        let mut interp = Interp {
            global_env: Environment::new_top_level(),
            packages: Packages::new(),
            taxonomy: ExceptionTaxonomy::with_builtin_tree(),
            block_stack: Vec::new(),
            call_depth: 0,
        };
        crate::builtins::register_all(&mut interp);
        interp
    }

    pub fn global_env(&self) -> Rc<Environment> {
        Rc::clone(&self.global_env)
    }

    /// `intern(name, package-or-nil)`.
    pub fn intern(&mut self, name: &str, package: Option<&str>) -> Value {
        Value::Symbol(self.packages.intern(name, package))
    }

    pub fn intern_keyword(&mut self, name: &str) -> Value {
        Value::Symbol(self.packages.intern_keyword(name))
    }

    /// `reg_fun(sym, fn-value)`.
    pub fn reg_fun(&mut self, name: &'static str, arity: Arity, func: BuiltinFn) {
        let value = Value::Function(Rc::new(FunctionData::Builtin { name, arity, func }));
        self.global_env.define_fn(name, value);
    }

    /// `reg_var(sym, external-cell)`; this crate has no FFI boundary
    /// to shadow, so registering a variable is just defining it at the
    /// top level (see `DESIGN.md`'s note on C-backed variables).
    pub fn reg_var(&mut self, name: &str, value: Value) {
        self.global_env.define_var(name, value);
    }

    /// Builds an `Unwind::Throw` for tag `tag` (one of the `error::TAG_*`
    /// constants or a user symbol name) carrying `message` as a string
    /// argument. Callers raise with a tag and a message; the location is
    /// attached separately by whoever catches or reports the unwind.
    pub fn make_error(&mut self, tag: &str, message: impl Into<String>) -> Unwind {
        let sym = self.packages.intern_system(tag);
        Unwind::throw(sym, Value::string(message.into()))
    }

    pub fn is_subtype(&self, tag: &str, target: &str) -> bool {
        self.taxonomy.is_subtype(tag, target)
    }

    /// `eval(form, env-or-nil)`: entry point used by callers outside
    /// the evaluator module itself.
    pub fn eval(&mut self, form: &Value, env: &Rc<Environment>) -> Result<Value, Unwind> {
        crate::eval::eval(self, form, env)
    }

    pub fn eval_top(&mut self, form: &Value) -> Result<Value, Unwind> {
        let env = self.global_env();
        self.eval(form, &env)
    }

    /// `apply(fun, args)`.
    pub fn apply(&mut self, fun: Value, args: &[Value]) -> Result<Value, Unwind> {
        crate::eval::apply(self, &fun, args)
    }

    /// `expand(form)`.
    pub fn expand(&mut self, form: &Value) -> Result<Value, Unwind> {
        crate::expand::expand(self, form)
    }

    /// Reads and expands a single form from source text; a small
    /// convenience used by the REPL/script runner and by tests that need a
    /// place-form or kernel-form shortcut without hand-building `Value`s.
    pub fn read_one(&mut self, src: &str) -> Result<Value, LispError> {
        crate::parser::parse_one(src, &mut self.packages)
            .map_err(|e| LispError::Unhandled { tag: "eval-error".into(), message: e, loc: None })
    }

    pub fn parse_params(&mut self, form: &Value) -> Result<ParamList, Unwind> {
        crate::eval::parse_param_list(self, form)
    }

    pub fn source_loc(&self) -> Option<SourceLoc> {
        None
    }

    /// Walks a list into a `Vec<Value>`, forcing lazy conses (`generate`,
    /// `range`, `repeat`) along the way. Unlike `Value::list_to_vec`, which
    /// is pure and bails out on an unresolved thunk, this can always resolve
    /// a well-formed lazy sequence since it has interpreter access.
    /// Fails with `eval-error` on an improper (non-nil-terminated) list.
    pub fn materialize_list(&mut self, list: &Value) -> Result<Vec<Value>, Unwind> {
        let mut out = Vec::new();
        let mut cur = list.clone();
        loop {
            match cur {
                Value::Nil => return Ok(out),
                Value::Cons(ref cell) => {
                    let cell = crate::lazy::force_with_interp(self, cell)?;
                    let (car, cdr) = {
                        let b = cell.borrow();
                        (b.car.clone(), b.cdr.clone())
                    };
                    out.push(car);
                    cur = cdr;
                }
                _ => return Err(self.make_error(crate::error::TAG_EVAL_ERROR, "expected a proper list")),
            }
        }
    }
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_interp_has_builtins_registered() {
        let interp = Interp::new();
        assert!(interp.global_env.get_fn("+").is_some());
        assert!(interp.global_env.get_fn("cons").is_some());
    }
}
