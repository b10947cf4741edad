//! Character operations: char->int, int->char, char-upcase, char-downcase,
//! and the alpha/digit/whitespace predicates.

use crate::error::{Unwind, TAG_RANGE_ERROR, TAG_TYPE_ERROR};
use crate::interp::Interp;
use crate::value::{Arity, Value};

fn one(args: &[Value]) -> &Value {
    args.first().unwrap_or(&Value::Nil)
}

fn as_char(interp: &mut Interp, v: &Value, who: &str) -> Result<char, Unwind> {
    match v {
        Value::Character(c) => Ok(*c),
        _ => Err(interp.make_error(TAG_TYPE_ERROR, format!("{who}: not a character"))),
    }
}

fn builtin_char_to_int(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let c = as_char(interp, one(args), "char->int")?;
    Ok(Value::Integer(c as i64))
}

fn builtin_int_to_char(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let n = one(args)
        .as_int()
        .ok_or_else(|| interp.make_error(TAG_TYPE_ERROR, "int->char: not a number"))?;
    let c = u32::try_from(n)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| interp.make_error(TAG_RANGE_ERROR, "int->char: not a valid code point"))?;
    Ok(Value::Character(c))
}

fn builtin_char_upcase(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let c = as_char(interp, one(args), "char-upcase")?;
    Ok(Value::Character(c.to_ascii_uppercase()))
}

fn builtin_char_downcase(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let c = as_char(interp, one(args), "char-downcase")?;
    Ok(Value::Character(c.to_ascii_lowercase()))
}

fn builtin_alpha_char_p(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let c = as_char(interp, one(args), "alpha-char-p")?;
    Ok(Value::bool_val(c.is_alphabetic()))
}

fn builtin_digit_char_p(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let c = as_char(interp, one(args), "digit-char-p")?;
    Ok(Value::bool_val(c.is_ascii_digit()))
}

fn builtin_whitespace_char_p(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let c = as_char(interp, one(args), "whitespace-char-p")?;
    Ok(Value::bool_val(c.is_whitespace()))
}

fn builtin_upper_case_p(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let c = as_char(interp, one(args), "upper-case-p")?;
    Ok(Value::bool_val(c.is_uppercase()))
}

fn builtin_lower_case_p(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let c = as_char(interp, one(args), "lower-case-p")?;
    Ok(Value::bool_val(c.is_lowercase()))
}

pub fn register(interp: &mut Interp) {
    interp.reg_fun("char->int", Arity::exact(1), builtin_char_to_int);
    interp.reg_fun("int->char", Arity::exact(1), builtin_int_to_char);
    interp.reg_fun("char-upcase", Arity::exact(1), builtin_char_upcase);
    interp.reg_fun("char-downcase", Arity::exact(1), builtin_char_downcase);
    interp.reg_fun("alpha-char-p", Arity::exact(1), builtin_alpha_char_p);
    interp.reg_fun("digit-char-p", Arity::exact(1), builtin_digit_char_p);
    interp.reg_fun("whitespace-char-p", Arity::exact(1), builtin_whitespace_char_p);
    interp.reg_fun("upper-case-p", Arity::exact(1), builtin_upper_case_p);
    interp.reg_fun("lower-case-p", Arity::exact(1), builtin_lower_case_p);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_int_roundtrip() {
        let mut interp = Interp::new();
        let n = builtin_char_to_int(&mut interp, &[Value::Character('a')]).unwrap();
        let c = builtin_int_to_char(&mut interp, &[n]).unwrap();
        assert!(c.eql(&Value::Character('a')));
    }

    #[test]
    fn case_conversion() {
        let mut interp = Interp::new();
        let up = builtin_char_upcase(&mut interp, &[Value::Character('a')]).unwrap();
        assert!(up.eql(&Value::Character('A')));
        let down = builtin_char_downcase(&mut interp, &[Value::Character('A')]).unwrap();
        assert!(down.eql(&Value::Character('a')));
    }

    #[test]
    fn classification_predicates() {
        let mut interp = Interp::new();
        assert!(builtin_digit_char_p(&mut interp, &[Value::Character('5')]).unwrap().is_truthy());
        assert!(!builtin_digit_char_p(&mut interp, &[Value::Character('x')]).unwrap().is_truthy());
        assert!(builtin_whitespace_char_p(&mut interp, &[Value::Character(' ')]).unwrap().is_truthy());
    }
}
