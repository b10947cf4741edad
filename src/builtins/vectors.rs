//! Vector construction and access: vector, make-vector, vecref, vec-set,
//! vec-push, vec-pop, vec-set-length, vector->list, list->vector.
//!
//! `vecref` doubles as a place head (`place.rs::resolve_place`) so its
//! ordinary-call behavior here must match what `get_loc` does for a
//! `(vecref v i)` place.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{Unwind, TAG_RANGE_ERROR, TAG_TYPE_ERROR};
use crate::interp::Interp;
use crate::place::normalize_index;
use crate::value::{Arity, Value};

fn one(args: &[Value]) -> &Value {
    args.first().unwrap_or(&Value::Nil)
}

fn as_vec(interp: &mut Interp, v: &Value, who: &str) -> Result<Rc<RefCell<Vec<Value>>>, Unwind> {
    match v {
        Value::Vector(c) => Ok(Rc::clone(c)),
        _ => Err(interp.make_error(TAG_TYPE_ERROR, format!("{who}: not a vector"))),
    }
}

fn builtin_vector(_interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(Value::Vector(Rc::new(RefCell::new(args.to_vec()))))
}

fn builtin_make_vector(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let n = one(args)
        .as_int()
        .ok_or_else(|| interp.make_error(TAG_TYPE_ERROR, "make-vector: size not a number"))?;
    if n < 0 {
        return Err(interp.make_error(TAG_RANGE_ERROR, "make-vector: negative size"));
    }
    let fill = args.get(1).cloned().unwrap_or(Value::Nil);
    Ok(Value::Vector(Rc::new(RefCell::new(vec![fill; n as usize]))))
}

fn builtin_vecref(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let cell = as_vec(interp, one(args), "vecref")?;
    let i = args
        .get(1)
        .and_then(|v| v.as_int())
        .ok_or_else(|| interp.make_error(TAG_TYPE_ERROR, "vecref: index not a number"))?;
    let len = cell.borrow().len();
    let idx = normalize_index(i, len).ok_or_else(|| interp.make_error(TAG_RANGE_ERROR, "vecref: index out of range"))?;
    if idx >= len {
        return Err(interp.make_error(TAG_RANGE_ERROR, "vecref: index out of range"));
    }
    Ok(cell.borrow()[idx].clone())
}

fn builtin_vec_set(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let cell = as_vec(interp, one(args), "vec-set")?;
    let i = args
        .get(1)
        .and_then(|v| v.as_int())
        .ok_or_else(|| interp.make_error(TAG_TYPE_ERROR, "vec-set: index not a number"))?;
    let len = cell.borrow().len();
    let idx = normalize_index(i, len).ok_or_else(|| interp.make_error(TAG_RANGE_ERROR, "vec-set: index out of range"))?;
    if idx >= len {
        return Err(interp.make_error(TAG_RANGE_ERROR, "vec-set: index out of range"));
    }
    let v = args.get(2).cloned().unwrap_or(Value::Nil);
    cell.borrow_mut()[idx] = v.clone();
    Ok(v)
}

fn builtin_vec_push(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let cell = as_vec(interp, one(args), "vec-push")?;
    let v = args.get(1).cloned().unwrap_or(Value::Nil);
    cell.borrow_mut().push(v);
    Ok(Value::Vector(cell))
}

fn builtin_vec_pop(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let cell = as_vec(interp, one(args), "vec-pop")?;
    cell.borrow_mut().pop().ok_or_else(|| interp.make_error(TAG_RANGE_ERROR, "vec-pop: empty vector"))
}

fn builtin_vec_set_length(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let cell = as_vec(interp, one(args), "vec-set-length")?;
    let n = args
        .get(1)
        .and_then(|v| v.as_int())
        .ok_or_else(|| interp.make_error(TAG_TYPE_ERROR, "vec-set-length: size not a number"))?;
    if n < 0 {
        return Err(interp.make_error(TAG_RANGE_ERROR, "vec-set-length: negative size"));
    }
    cell.borrow_mut().resize(n as usize, Value::Nil);
    Ok(Value::Vector(cell))
}

fn builtin_vector_to_list(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let cell = as_vec(interp, one(args), "vector->list")?;
    Ok(Value::vec_to_list(cell.borrow().iter().cloned()))
}

fn builtin_list_to_vector(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let items = interp.materialize_list(one(args))?;
    Ok(Value::Vector(Rc::new(RefCell::new(items))))
}

pub fn register(interp: &mut Interp) {
    interp.reg_fun("vector", Arity::at_least(0), builtin_vector);
    interp.reg_fun("make-vector", Arity::range(1, 1), builtin_make_vector);
    interp.reg_fun("vecref", Arity::exact(2), builtin_vecref);
    interp.reg_fun("vec-set", Arity::exact(3), builtin_vec_set);
    interp.reg_fun("vec-push", Arity::exact(2), builtin_vec_push);
    interp.reg_fun("vec-pop", Arity::exact(1), builtin_vec_pop);
    interp.reg_fun("vec-set-length", Arity::exact(2), builtin_vec_set_length);
    interp.reg_fun("vector->list", Arity::exact(1), builtin_vector_to_list);
    interp.reg_fun("list->vector", Arity::exact(1), builtin_list_to_vector);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vecref_and_vec_set_roundtrip() {
        let mut interp = Interp::new();
        let v = builtin_vector(&mut interp, &[Value::int(1), Value::int(2), Value::int(3)]).unwrap();
        builtin_vec_set(&mut interp, &[v.clone(), Value::int(1), Value::int(99)]).unwrap();
        let r = builtin_vecref(&mut interp, &[v, Value::int(1)]).unwrap();
        assert!(r.eql(&Value::int(99)));
    }

    #[test]
    fn negative_index_counts_from_end() {
        let mut interp = Interp::new();
        let v = builtin_vector(&mut interp, &[Value::int(1), Value::int(2), Value::int(3)]).unwrap();
        let r = builtin_vecref(&mut interp, &[v, Value::int(-1)]).unwrap();
        assert!(r.eql(&Value::int(3)));
    }

    #[test]
    fn vector_list_roundtrip() {
        let mut interp = Interp::new();
        let v = builtin_vector(&mut interp, &[Value::int(1), Value::int(2)]).unwrap();
        let l = builtin_vector_to_list(&mut interp, &[v]).unwrap();
        let back = builtin_list_to_vector(&mut interp, &[l]).unwrap();
        match back {
            Value::Vector(c) => assert_eq!(c.borrow().len(), 2),
            _ => panic!("expected vector"),
        }
    }
}
