//! Sub-range extraction and replacement over strings, vectors, and lists:
//! `sub`, `sub-str`, `sub-vec`, `sub-list`, `replace`, `replace-str`,
//! `replace-vec`, `replace-list`.
//!
//! `sub*` takes a half-open `[from, to)` pair with negative indices counting
//! from the end and an omitted `to` meaning the end of the sequence. The
//! type-specific variants are thin wrappers over `sub`/`replace` that fail
//! with a type error if handed the wrong container; `sub`/`replace`
//! dispatch on the runtime type of their first argument.

use crate::error::{Unwind, TAG_RANGE_ERROR, TAG_TYPE_ERROR};
use crate::interp::Interp;
use crate::place::normalize_index;
use crate::value::{Arity, Value};

fn range_args(interp: &mut Interp, args: &[Value], len: usize) -> Result<(usize, usize), Unwind> {
    let from = args
        .get(1)
        .and_then(|v| v.as_int())
        .ok_or_else(|| interp.make_error(TAG_TYPE_ERROR, "sub: from not a number"))?;
    let to = match args.get(2) {
        Some(v) if !v.is_nil() => v.as_int().ok_or_else(|| interp.make_error(TAG_TYPE_ERROR, "sub: to not a number"))?,
        _ => len as i64,
    };
    let from = normalize_index(from, len).ok_or_else(|| interp.make_error(TAG_RANGE_ERROR, "sub: from out of range"))?;
    let to = normalize_index(to, len).ok_or_else(|| interp.make_error(TAG_RANGE_ERROR, "sub: to out of range"))?;
    let to = to.max(from);
    Ok((from, to))
}

fn sub_str(interp: &mut Interp, s: &Value, args: &[Value]) -> Result<Value, Unwind> {
    let cell = match s {
        Value::Str(c) => c,
        _ => return Err(interp.make_error(TAG_TYPE_ERROR, "sub-str: not a string")),
    };
    let chars: Vec<char> = cell.borrow().chars().collect();
    let (from, to) = range_args(interp, args, chars.len())?;
    Ok(Value::string(chars[from..to].iter().collect::<String>()))
}

fn sub_vec(interp: &mut Interp, v: &Value, args: &[Value]) -> Result<Value, Unwind> {
    let cell = match v {
        Value::Vector(c) => c,
        _ => return Err(interp.make_error(TAG_TYPE_ERROR, "sub-vec: not a vector")),
    };
    let len = cell.borrow().len();
    let (from, to) = range_args(interp, args, len)?;
    Ok(Value::Vector(std::rc::Rc::new(std::cell::RefCell::new(cell.borrow()[from..to].to_vec()))))
}

fn sub_list(interp: &mut Interp, l: &Value, args: &[Value]) -> Result<Value, Unwind> {
    let items = interp.materialize_list(l)?;
    let (from, to) = range_args(interp, args, items.len())?;
    Ok(Value::vec_to_list(items[from..to].iter().cloned()))
}

fn builtin_sub(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    match args.first().unwrap_or(&Value::Nil) {
        v @ Value::Str(_) => sub_str(interp, v, args),
        v @ Value::Vector(_) => sub_vec(interp, v, args),
        v @ (Value::Cons(_) | Value::Nil) => sub_list(interp, v, args),
        _ => Err(interp.make_error(TAG_TYPE_ERROR, "sub: unsupported sequence")),
    }
}

fn builtin_sub_str(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    sub_str(interp, args.first().unwrap_or(&Value::Nil), args)
}
fn builtin_sub_vec(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    sub_vec(interp, args.first().unwrap_or(&Value::Nil), args)
}
fn builtin_sub_list(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    sub_list(interp, args.first().unwrap_or(&Value::Nil), args)
}

/// Normalizes the replace position argument: either an integer (insert
/// point, `from == to`) or a `(from . to)` pair.
fn replace_range(interp: &mut Interp, pos: &Value, len: usize) -> Result<(usize, usize), Unwind> {
    if let Some(n) = pos.as_int() {
        let i = normalize_index(n, len).ok_or_else(|| interp.make_error(TAG_RANGE_ERROR, "replace: index out of range"))?;
        return Ok((i, i));
    }
    if let Value::Cons(cell) = pos {
        let (from, to) = {
            let b = cell.borrow();
            (b.car.as_int(), b.cdr.as_int())
        };
        if let (Some(from), Some(to)) = (from, to) {
            let from = normalize_index(from, len).ok_or_else(|| interp.make_error(TAG_RANGE_ERROR, "replace: from out of range"))?;
            let to = normalize_index(to, len).ok_or_else(|| interp.make_error(TAG_RANGE_ERROR, "replace: to out of range"))?;
            return Ok((from, to.max(from)));
        }
    }
    Err(interp.make_error(TAG_TYPE_ERROR, "replace: position not an index or range"))
}

fn replace_str(interp: &mut Interp, s: &Value, args: &[Value]) -> Result<Value, Unwind> {
    let cell = match s {
        Value::Str(c) => c,
        _ => return Err(interp.make_error(TAG_TYPE_ERROR, "replace-str: not a string")),
    };
    let mut chars: Vec<char> = cell.borrow().chars().collect();
    let (from, to) = replace_range(interp, args.get(1).unwrap_or(&Value::Nil), chars.len())?;
    let replacement = match args.get(2) {
        Some(Value::Str(r)) => r.borrow().clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    chars.splice(from..to, replacement.chars());
    let result: String = chars.into_iter().collect();
    *cell.borrow_mut() = result.clone();
    Ok(Value::string(result))
}

fn replace_vec(interp: &mut Interp, v: &Value, args: &[Value]) -> Result<Value, Unwind> {
    let cell = match v {
        Value::Vector(c) => c,
        _ => return Err(interp.make_error(TAG_TYPE_ERROR, "replace-vec: not a vector")),
    };
    let len = cell.borrow().len();
    let (from, to) = replace_range(interp, args.get(1).unwrap_or(&Value::Nil), len)?;
    let replacement = match args.get(2) {
        Some(Value::Vector(r)) => r.borrow().clone(),
        Some(other) => other.list_to_vec().unwrap_or_else(|| vec![other.clone()]),
        None => Vec::new(),
    };
    cell.borrow_mut().splice(from..to, replacement);
    Ok(Value::Vector(std::rc::Rc::clone(cell)))
}

fn replace_list(interp: &mut Interp, l: &Value, args: &[Value]) -> Result<Value, Unwind> {
    let mut items = interp.materialize_list(l)?;
    let (from, to) = replace_range(interp, args.get(1).unwrap_or(&Value::Nil), items.len())?;
    let replacement = args
        .get(2)
        .cloned()
        .unwrap_or(Value::Nil)
        .list_to_vec()
        .unwrap_or_else(|| vec![args.get(2).cloned().unwrap_or(Value::Nil)]);
    items.splice(from..to, replacement);
    Ok(Value::vec_to_list(items.into_iter()))
}

fn builtin_replace(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    match args.first().unwrap_or(&Value::Nil) {
        v @ Value::Str(_) => replace_str(interp, v, args),
        v @ Value::Vector(_) => replace_vec(interp, v, args),
        v @ (Value::Cons(_) | Value::Nil) => replace_list(interp, v, args),
        _ => Err(interp.make_error(TAG_TYPE_ERROR, "replace: unsupported sequence")),
    }
}

fn builtin_replace_str(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    replace_str(interp, args.first().unwrap_or(&Value::Nil), args)
}
fn builtin_replace_vec(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    replace_vec(interp, args.first().unwrap_or(&Value::Nil), args)
}
fn builtin_replace_list(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    replace_list(interp, args.first().unwrap_or(&Value::Nil), args)
}

pub fn register(interp: &mut Interp) {
    interp.reg_fun("sub", Arity::range(2, 1), builtin_sub);
    interp.reg_fun("sub-str", Arity::range(2, 1), builtin_sub_str);
    interp.reg_fun("sub-vec", Arity::range(2, 1), builtin_sub_vec);
    interp.reg_fun("sub-list", Arity::range(2, 1), builtin_sub_list);
    interp.reg_fun("replace", Arity::range(2, 1), builtin_replace);
    interp.reg_fun("replace-str", Arity::range(2, 1), builtin_replace_str);
    interp.reg_fun("replace-vec", Arity::range(2, 1), builtin_replace_vec);
    interp.reg_fun("replace-list", Arity::range(2, 1), builtin_replace_list);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_str_half_open_range() {
        let mut interp = Interp::new();
        let r = builtin_sub(&mut interp, &[Value::string("hello"), Value::int(1), Value::int(4)]).unwrap();
        match r {
            Value::Str(s) => assert_eq!(*s.borrow(), "ell"),
            _ => panic!("expected string"),
        }
    }

    #[test]
    fn sub_negative_index_counts_from_end() {
        let mut interp = Interp::new();
        let r = builtin_sub(&mut interp, &[Value::string("hello"), Value::int(-2)]).unwrap();
        match r {
            Value::Str(s) => assert_eq!(*s.borrow(), "lo"),
            _ => panic!("expected string"),
        }
    }

    #[test]
    fn replace_list_splices_range() {
        let mut interp = Interp::new();
        let l = Value::vec_to_list(vec![Value::int(1), Value::int(2), Value::int(3)].into_iter());
        let pos = Value::cons(Value::int(1), Value::int(2));
        let repl = Value::vec_to_list(vec![Value::int(9), Value::int(8)].into_iter());
        let r = builtin_replace(&mut interp, &[l, pos, repl]).unwrap();
        let items = r.list_to_vec().unwrap();
        assert_eq!(items.len(), 4);
        assert!(items[1].eql(&Value::int(9)));
        assert!(items[2].eql(&Value::int(8)));
    }
}
