//! Type predicates and the `type` accessor. Total over their full
//! domain — every predicate returns `t` or `nil` for any `Value`, never
//! an error.
//!
//! Named in the `-p` convention (`consp`, `nullp`, ...) rather than a
//! Scheme-flavored `-?` one.

use crate::error::Unwind;
use crate::interp::Interp;
use crate::value::{Arity, Value};

fn one(args: &[Value]) -> &Value {
    args.first().unwrap_or(&Value::Nil)
}

fn builtin_consp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(Value::bool_val(one(args).is_cons()))
}

fn builtin_nullp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(Value::bool_val(one(args).is_nil()))
}

fn builtin_listp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(Value::bool_val(matches!(one(args), Value::Cons(_) | Value::Nil)))
}

fn builtin_stringp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(Value::bool_val(matches!(one(args), Value::Str(_))))
}

fn builtin_vectorp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(Value::bool_val(matches!(one(args), Value::Vector(_))))
}

fn builtin_hashp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(Value::bool_val(matches!(one(args), Value::Hash(_))))
}

fn builtin_symbolp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(Value::bool_val(matches!(one(args), Value::Symbol(_) | Value::T | Value::Nil)))
}

fn builtin_functionp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(Value::bool_val(matches!(one(args), Value::Function(_))))
}

fn builtin_characterp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(Value::bool_val(matches!(one(args), Value::Character(_))))
}

fn builtin_integerp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(Value::bool_val(matches!(one(args), Value::Integer(_))))
}

/// `(type v)` — the symbol naming `v`'s runtime type.
fn builtin_type(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(interp.intern(one(args).type_name(), None))
}

pub fn register(interp: &mut Interp) {
    interp.reg_fun("consp", Arity::exact(1), builtin_consp);
    interp.reg_fun("nullp", Arity::exact(1), builtin_nullp);
    interp.reg_fun("listp", Arity::exact(1), builtin_listp);
    interp.reg_fun("stringp", Arity::exact(1), builtin_stringp);
    interp.reg_fun("vectorp", Arity::exact(1), builtin_vectorp);
    interp.reg_fun("hashp", Arity::exact(1), builtin_hashp);
    interp.reg_fun("symbolp", Arity::exact(1), builtin_symbolp);
    interp.reg_fun("functionp", Arity::exact(1), builtin_functionp);
    interp.reg_fun("characterp", Arity::exact(1), builtin_characterp);
    interp.reg_fun("integerp", Arity::exact(1), builtin_integerp);
    interp.reg_fun("type", Arity::exact(1), builtin_type);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullp_true_only_for_nil() {
        let mut interp = Interp::new();
        assert!(builtin_nullp(&mut interp, &[Value::Nil]).unwrap().is_truthy());
        assert!(!builtin_nullp(&mut interp, &[Value::int(0)]).unwrap().is_truthy());
    }

    #[test]
    fn type_names_match_value_type_name() {
        let mut interp = Interp::new();
        let t = builtin_type(&mut interp, &[Value::string("hi")]).unwrap();
        assert!(matches!(&t, Value::Symbol(s) if s.name == "string"));
    }
}
