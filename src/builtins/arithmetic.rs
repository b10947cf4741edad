//! Numeric operations: +, -, *, /, %, abs, min, max.
//!
//! All numbers in this value model are `i64` (`Value::Integer`); there is
//! no separate float variant to promote to. Division and modulo by zero
//! raise `numeric-error`.

use crate::error::TAG_NUMERIC_ERROR;
use crate::interp::Interp;
use crate::value::{Arity, Value};
use crate::error::Unwind;

fn arg_int(interp: &mut Interp, v: &Value, who: &str) -> Result<i64, Unwind> {
    v.as_int().ok_or_else(|| interp.make_error(crate::error::TAG_TYPE_ERROR, format!("{who}: not a number")))
}

/// `(+ n...)` — sum of all arguments, 0 if none given.
fn builtin_add(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let mut sum = 0i64;
    for a in args {
        sum += arg_int(interp, a, "+")?;
    }
    Ok(Value::Integer(sum))
}

/// `(- n...)` — subtracts the rest from the first; negates a lone argument.
fn builtin_sub(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    if args.is_empty() {
        return Ok(Value::Integer(0));
    }
    let first = arg_int(interp, &args[0], "-")?;
    if args.len() == 1 {
        return Ok(Value::Integer(-first));
    }
    let mut result = first;
    for a in &args[1..] {
        result -= arg_int(interp, a, "-")?;
    }
    Ok(Value::Integer(result))
}

/// `(* n...)` — product of all arguments, 1 if none given.
fn builtin_mul(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let mut product = 1i64;
    for a in args {
        product *= arg_int(interp, a, "*")?;
    }
    Ok(Value::Integer(product))
}

/// `(/ n...)` — integer division, first by the rest; reciprocal of a lone
/// argument is only meaningful for `1` and `-1` under integer division, but
/// is computed the same way the collaborator's arithmetic would: `1 / n`.
fn builtin_div(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    if args.is_empty() {
        return Err(interp.make_error(crate::error::TAG_TYPE_ERROR, "/: at least one argument required"));
    }
    let first = arg_int(interp, &args[0], "/")?;
    if args.len() == 1 {
        if first == 0 {
            return Err(interp.make_error(TAG_NUMERIC_ERROR, "/: division by zero"));
        }
        return Ok(Value::Integer(1 / first));
    }
    let mut result = first;
    for a in &args[1..] {
        let n = arg_int(interp, a, "/")?;
        if n == 0 {
            return Err(interp.make_error(TAG_NUMERIC_ERROR, "/: division by zero"));
        }
        result /= n;
    }
    Ok(Value::Integer(result))
}

/// `(% a b)` — remainder of `a` divided by `b`.
fn builtin_mod(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let a = arg_int(interp, args.first().unwrap_or(&Value::Nil), "%")?;
    let b = arg_int(interp, args.get(1).unwrap_or(&Value::Nil), "%")?;
    if b == 0 {
        return Err(interp.make_error(TAG_NUMERIC_ERROR, "%: division by zero"));
    }
    Ok(Value::Integer(a % b))
}

fn builtin_abs(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(Value::Integer(arg_int(interp, args.first().unwrap_or(&Value::Nil), "abs")?.abs()))
}

fn builtin_min(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let mut it = args.iter();
    let first = arg_int(interp, it.next().ok_or_else(|| interp.make_error(crate::error::TAG_TYPE_ERROR, "min: at least one argument required"))?, "min")?;
    let mut best = first;
    for a in it {
        best = best.min(arg_int(interp, a, "min")?);
    }
    Ok(Value::Integer(best))
}

fn builtin_max(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let mut it = args.iter();
    let first = arg_int(interp, it.next().ok_or_else(|| interp.make_error(crate::error::TAG_TYPE_ERROR, "max: at least one argument required"))?, "max")?;
    let mut best = first;
    for a in it {
        best = best.max(arg_int(interp, a, "max")?);
    }
    Ok(Value::Integer(best))
}

pub fn register(interp: &mut Interp) {
    interp.reg_fun("+", Arity::at_least(0), builtin_add);
    interp.reg_fun("-", Arity::at_least(0), builtin_sub);
    interp.reg_fun("*", Arity::at_least(0), builtin_mul);
    interp.reg_fun("/", Arity::at_least(1), builtin_div);
    interp.reg_fun("%", Arity::exact(2), builtin_mod);
    interp.reg_fun("abs", Arity::exact(1), builtin_abs);
    interp.reg_fun("min", Arity::at_least(1), builtin_min);
    interp.reg_fun("max", Arity::at_least(1), builtin_max);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sums_all_args() {
        let mut interp = Interp::new();
        let r = builtin_add(&mut interp, &[Value::int(1), Value::int(2), Value::int(3)]).unwrap();
        assert!(r.eql(&Value::int(6)));
    }

    #[test]
    fn sub_with_one_arg_negates() {
        let mut interp = Interp::new();
        let r = builtin_sub(&mut interp, &[Value::int(5)]).unwrap();
        assert!(r.eql(&Value::int(-5)));
    }

    #[test]
    fn div_by_zero_raises_numeric_error() {
        let mut interp = Interp::new();
        let err = builtin_div(&mut interp, &[Value::int(1), Value::int(0)]).unwrap_err();
        assert_eq!(err.tag_name(), Some(TAG_NUMERIC_ERROR));
    }

    #[test]
    fn mod_matches_rust_remainder() {
        let mut interp = Interp::new();
        let r = builtin_mod(&mut interp, &[Value::int(17), Value::int(5)]).unwrap();
        assert!(r.eql(&Value::int(2)));
    }
}
