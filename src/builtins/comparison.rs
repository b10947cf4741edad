//! Comparisons and equality: =, <, >, <=, >=, eq, eql, equal, not.
//!
//! The three equality predicates mirror `Value`'s three equality relations
//!: `eq` is identity, `eql` is value-equal for numbers/characters and
//! identity otherwise, `equal` is fully structural.

use crate::error::{Unwind, TAG_TYPE_ERROR};
use crate::interp::Interp;
use crate::value::{Arity, Value};

fn ints(interp: &mut Interp, args: &[Value], who: &str) -> Result<Vec<i64>, Unwind> {
    args.iter()
        .map(|v| v.as_int().ok_or_else(|| interp.make_error(TAG_TYPE_ERROR, format!("{who}: not a number"))))
        .collect()
}

fn chain(nums: &[i64], cmp: impl Fn(i64, i64) -> bool) -> Value {
    Value::bool_val(nums.windows(2).all(|w| cmp(w[0], w[1])))
}

fn builtin_num_eq(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(chain(&ints(interp, args, "=")?, |a, b| a == b))
}

fn builtin_lt(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(chain(&ints(interp, args, "<")?, |a, b| a < b))
}

fn builtin_gt(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(chain(&ints(interp, args, ">")?, |a, b| a > b))
}

fn builtin_le(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(chain(&ints(interp, args, "<=")?, |a, b| a <= b))
}

fn builtin_ge(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(chain(&ints(interp, args, ">=")?, |a, b| a >= b))
}

/// `eq`: identity — the narrowest of the three equalities.
fn builtin_eq(_interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(Value::bool_val(args.first().unwrap_or(&Value::Nil).eq(args.get(1).unwrap_or(&Value::Nil))))
}

/// `eql`: value-equal for numbers/characters, identity otherwise.
fn builtin_eql(_interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(Value::bool_val(args.first().unwrap_or(&Value::Nil).eql(args.get(1).unwrap_or(&Value::Nil))))
}

/// `equal`: structural equality, recursing through conses and vectors.
fn builtin_equal(_interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(Value::bool_val(args.first().unwrap_or(&Value::Nil).equal(args.get(1).unwrap_or(&Value::Nil))))
}

fn builtin_not(_interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(Value::bool_val(!args.first().unwrap_or(&Value::Nil).is_truthy()))
}

pub fn register(interp: &mut Interp) {
    interp.reg_fun("=", Arity::at_least(1), builtin_num_eq);
    interp.reg_fun("<", Arity::at_least(1), builtin_lt);
    interp.reg_fun(">", Arity::at_least(1), builtin_gt);
    interp.reg_fun("<=", Arity::at_least(1), builtin_le);
    interp.reg_fun(">=", Arity::at_least(1), builtin_ge);
    interp.reg_fun("eq", Arity::exact(2), builtin_eq);
    interp.reg_fun("eql", Arity::exact(2), builtin_eql);
    interp.reg_fun("equal", Arity::exact(2), builtin_equal);
    interp.reg_fun("not", Arity::exact(1), builtin_not);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lt_chain_checks_every_adjacent_pair() {
        let mut interp = Interp::new();
        assert!(builtin_lt(&mut interp, &[Value::int(1), Value::int(2), Value::int(3)]).unwrap().is_truthy());
        assert!(!builtin_lt(&mut interp, &[Value::int(1), Value::int(3), Value::int(2)]).unwrap().is_truthy());
    }

    #[test]
    fn equal_is_structural_eq_is_identity() {
        let mut interp = Interp::new();
        let a = Value::cons(Value::int(1), Value::Nil);
        let b = Value::cons(Value::int(1), Value::Nil);
        assert!(builtin_equal(&mut interp, &[a.clone(), b.clone()]).unwrap().is_truthy());
        assert!(!builtin_eq(&mut interp, &[a, b]).unwrap().is_truthy());
    }
}
