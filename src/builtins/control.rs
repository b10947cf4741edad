//! Control operations exposed as ordinary functions rather than kernel
//! special forms: `throw`, `apply`, `error`, `signal`, `functionp`-adjacent
//! `funcall`.
//!
//! `throw`/`apply` are absent from `eval.rs`'s `is_special_form` table —
//! both are plain calls, so `(apply f args)` and `(funcall f a b)` evaluate
//! their arguments the ordinary way before this code ever runs; only
//! `catch` itself is a kernel form (see `eval.rs::eval_catch`).

use crate::error::{Unwind, TAG_ERROR, TAG_TYPE_ERROR};
use crate::interp::Interp;
use crate::value::{Arity, Value};

fn one(args: &[Value]) -> &Value {
    args.first().unwrap_or(&Value::Nil)
}

/// `(throw tag arg)` — raises `Unwind::Throw`, caught by the nearest
/// enclosing `catch` whose clause tag is a supertype of `tag`.
fn builtin_throw(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let tag = one(args)
        .as_symbol()
        .cloned()
        .ok_or_else(|| interp.make_error(TAG_TYPE_ERROR, "throw: tag not a symbol"))?;
    let arg = args.get(1).cloned().unwrap_or(Value::Nil);
    Err(Unwind::throw(tag, arg).with_loc(interp.source_loc()))
}

/// `(apply fn arg... arg-list)` — the final argument is spread, matching
/// the kernel call convention's own spread rule for `@rest` arguments.
fn builtin_apply(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let fun = one(args).clone();
    let mut call_args = Vec::new();
    if args.len() > 1 {
        call_args.extend(args[1..args.len() - 1].iter().cloned());
        let spread = interp.materialize_list(&args[args.len() - 1])?;
        call_args.extend(spread);
    }
    interp.apply(fun, &call_args)
}

/// `(funcall fn arg...)` — no final-argument spread.
fn builtin_funcall(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let fun = one(args).clone();
    interp.apply(fun, &args[1.min(args.len())..])
}

/// `(error fmt-or-message arg...)` — raises the generic `error` tag with a
/// `format`-substituted message when given more than one argument.
fn builtin_error(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let message = match one(args) {
        Value::Str(s) => s.borrow().clone(),
        other => other.to_string(),
    };
    let sym = interp.packages.intern_system(TAG_ERROR);
    Err(Unwind::throw(sym, Value::string(message)).with_loc(interp.source_loc()))
}

/// `(signal tag arg)` — like `throw` but spelled for readability at
/// programmatic-error call sites; identical semantics.
fn builtin_signal(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    builtin_throw(interp, args)
}

pub fn register(interp: &mut Interp) {
    interp.reg_fun("throw", Arity::exact(2), builtin_throw);
    interp.reg_fun("apply", Arity::at_least(1), builtin_apply);
    interp.reg_fun("funcall", Arity::at_least(1), builtin_funcall);
    interp.reg_fun("error", Arity::at_least(1), builtin_error);
    interp.reg_fun("signal", Arity::exact(2), builtin_signal);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throw_raises_tagged_unwind() {
        let mut interp = Interp::new();
        let tag = interp.packages.intern_system(crate::error::TAG_EVAL_ERROR);
        let err = builtin_throw(&mut interp, &[Value::Symbol(tag), Value::int(1)]).unwrap_err();
        assert_eq!(err.tag_name(), Some(crate::error::TAG_EVAL_ERROR));
    }

    #[test]
    fn apply_spreads_final_argument() {
        let mut interp = Interp::new();
        let plus = interp.global_env.get_fn("+").unwrap();
        let list = Value::vec_to_list(vec![Value::int(2), Value::int(3)].into_iter());
        let r = builtin_apply(&mut interp, &[plus, Value::int(1), list]).unwrap();
        assert!(r.eql(&Value::int(6)));
    }

    #[test]
    fn funcall_does_not_spread() {
        let mut interp = Interp::new();
        let plus = interp.global_env.get_fn("+").unwrap();
        let r = builtin_funcall(&mut interp, &[plus, Value::int(1), Value::int(2)]).unwrap();
        assert!(r.eql(&Value::int(3)));
    }
}
