//! String operations: split, join, trim, case conversion, search predicates,
//! append, string<->list, string<->symbol, string<->number conversions.

use crate::error::{Unwind, TAG_TYPE_ERROR};
use crate::interp::Interp;
use crate::value::{Arity, Value};

fn one(args: &[Value]) -> &Value {
    args.first().unwrap_or(&Value::Nil)
}

fn as_str<'a>(interp: &mut Interp, v: &'a Value, who: &str) -> Result<std::cell::Ref<'a, String>, Unwind> {
    match v {
        Value::Str(s) => Ok(s.borrow()),
        _ => Err(interp.make_error(TAG_TYPE_ERROR, format!("{who}: not a string"))),
    }
}

fn builtin_string_split(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let s = as_str(interp, one(args), "string-split")?;
    let delim = as_str(interp, args.get(1).unwrap_or(&Value::Nil), "string-split")?;
    let parts = s.split(delim.as_str()).map(Value::string).collect::<Vec<_>>();
    Ok(Value::vec_to_list(parts.into_iter()))
}

fn builtin_string_join(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let items = interp.materialize_list(one(args))?;
    let delim = as_str(interp, args.get(1).unwrap_or(&Value::Nil), "string-join")?.clone();
    let mut parts = Vec::with_capacity(items.len());
    for item in &items {
        parts.push(as_str(interp, item, "string-join")?.clone());
    }
    Ok(Value::string(parts.join(&delim)))
}

fn builtin_string_trim(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let s = as_str(interp, one(args), "string-trim")?;
    Ok(Value::string(s.trim().to_string()))
}

fn builtin_string_upcase(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let s = as_str(interp, one(args), "string-upcase")?;
    Ok(Value::string(s.to_uppercase()))
}

fn builtin_string_downcase(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let s = as_str(interp, one(args), "string-downcase")?;
    Ok(Value::string(s.to_lowercase()))
}

fn builtin_string_contains_p(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let s = as_str(interp, one(args), "string-contains-p")?;
    let sub = as_str(interp, args.get(1).unwrap_or(&Value::Nil), "string-contains-p")?;
    Ok(Value::bool_val(s.contains(sub.as_str())))
}

fn builtin_string_starts_with_p(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let s = as_str(interp, one(args), "string-starts-with-p")?;
    let prefix = as_str(interp, args.get(1).unwrap_or(&Value::Nil), "string-starts-with-p")?;
    Ok(Value::bool_val(s.starts_with(prefix.as_str())))
}

fn builtin_string_ends_with_p(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let s = as_str(interp, one(args), "string-ends-with-p")?;
    let suffix = as_str(interp, args.get(1).unwrap_or(&Value::Nil), "string-ends-with-p")?;
    Ok(Value::bool_val(s.ends_with(suffix.as_str())))
}

fn builtin_string_empty_p(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let s = as_str(interp, one(args), "string-empty-p")?;
    Ok(Value::bool_val(s.is_empty()))
}

fn builtin_string_to_number(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let s = as_str(interp, one(args), "string->number")?;
    s.trim()
        .parse::<i64>()
        .map(Value::Integer)
        .map_err(|_| interp.make_error(TAG_TYPE_ERROR, format!("string->number: not numeric: {}", *s)))
}

fn builtin_number_to_string(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let n = one(args)
        .as_int()
        .ok_or_else(|| interp.make_error(TAG_TYPE_ERROR, "number->string: not a number"))?;
    Ok(Value::string(n.to_string()))
}

fn builtin_string_to_list(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let s = as_str(interp, one(args), "string->list")?;
    Ok(Value::vec_to_list(s.chars().map(Value::Character)))
}

fn builtin_list_to_string(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let items = interp.materialize_list(one(args))?;
    let mut out = String::with_capacity(items.len());
    for item in items {
        match item {
            Value::Character(c) => out.push(c),
            _ => return Err(interp.make_error(TAG_TYPE_ERROR, "list->string: not a character")),
        }
    }
    Ok(Value::string(out))
}

fn builtin_string_append(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let mut out = String::new();
    for a in args {
        out.push_str(&as_str(interp, a, "string-append")?);
    }
    Ok(Value::string(out))
}

fn builtin_string_to_symbol(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let s = as_str(interp, one(args), "string->symbol")?.clone();
    Ok(interp.intern(&s, None))
}

fn builtin_symbol_to_string(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    match one(args) {
        Value::Symbol(s) => Ok(Value::string(s.name.clone())),
        Value::T => Ok(Value::string("t")),
        Value::Nil => Ok(Value::string("nil")),
        _ => Err(interp.make_error(TAG_TYPE_ERROR, "symbol->string: not a symbol")),
    }
}

pub fn register(interp: &mut Interp) {
    interp.reg_fun("string-split", Arity::exact(2), builtin_string_split);
    interp.reg_fun("string-join", Arity::exact(2), builtin_string_join);
    interp.reg_fun("string-trim", Arity::exact(1), builtin_string_trim);
    interp.reg_fun("string-upcase", Arity::exact(1), builtin_string_upcase);
    interp.reg_fun("string-downcase", Arity::exact(1), builtin_string_downcase);
    interp.reg_fun("string-contains-p", Arity::exact(2), builtin_string_contains_p);
    interp.reg_fun("string-starts-with-p", Arity::exact(2), builtin_string_starts_with_p);
    interp.reg_fun("string-ends-with-p", Arity::exact(2), builtin_string_ends_with_p);
    interp.reg_fun("string-empty-p", Arity::exact(1), builtin_string_empty_p);
    interp.reg_fun("string->number", Arity::exact(1), builtin_string_to_number);
    interp.reg_fun("number->string", Arity::exact(1), builtin_number_to_string);
    interp.reg_fun("string->list", Arity::exact(1), builtin_string_to_list);
    interp.reg_fun("list->string", Arity::exact(1), builtin_list_to_string);
    interp.reg_fun("string-append", Arity::at_least(0), builtin_string_append);
    interp.reg_fun("string->symbol", Arity::exact(1), builtin_string_to_symbol);
    interp.reg_fun("symbol->string", Arity::exact(1), builtin_symbol_to_string);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_join_roundtrip() {
        let mut interp = Interp::new();
        let parts = builtin_string_split(&mut interp, &[Value::string("a,b,c"), Value::string(",")]).unwrap();
        let joined = builtin_string_join(&mut interp, &[parts, Value::string(",")]).unwrap();
        match joined {
            Value::Str(s) => assert_eq!(*s.borrow(), "a,b,c"),
            _ => panic!("expected string"),
        }
    }

    #[test]
    fn string_to_list_and_back() {
        let mut interp = Interp::new();
        let chars = builtin_string_to_list(&mut interp, &[Value::string("abc")]).unwrap();
        let back = builtin_list_to_string(&mut interp, &[chars]).unwrap();
        match back {
            Value::Str(s) => assert_eq!(*s.borrow(), "abc"),
            _ => panic!("expected string"),
        }
    }

    #[test]
    fn number_roundtrip() {
        let mut interp = Interp::new();
        let s = builtin_number_to_string(&mut interp, &[Value::int(42)]).unwrap();
        let n = builtin_string_to_number(&mut interp, &[s]).unwrap();
        assert!(n.eql(&Value::int(42)));
    }
}
