//! List construction and access: cons, car, cdr, first..sixth, rest, length,
//! list, reverse, append, nth, rplaca, rplacd.
//!
//! `car`/`cdr`/`rest`/`nth` force a lazy cons before inspecting it ("Any
//! operation that inspects car or cdr must force first").

use std::rc::Rc;

use crate::error::{Unwind, TAG_TYPE_ERROR};
use crate::interp::Interp;
use crate::value::{Arity, ConsCell, Value};

fn one(args: &[Value]) -> &Value {
    args.first().unwrap_or(&Value::Nil)
}

fn forced_cons(interp: &mut Interp, v: &Value, who: &str) -> Result<Rc<std::cell::RefCell<ConsCell>>, Unwind> {
    let cell = v.as_cons().ok_or_else(|| interp.make_error(TAG_TYPE_ERROR, format!("{who}: not a cons")))?;
    crate::lazy::force_with_interp(interp, cell)
}

fn builtin_cons(_interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(Value::cons(one(args).clone(), args.get(1).cloned().unwrap_or(Value::Nil)))
}

/// `(car x)`: `nil` on `nil`, type-error otherwise ("total over their
/// declared domains").
fn builtin_car(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let v = one(args);
    if v.is_nil() {
        return Ok(Value::Nil);
    }
    Ok(forced_cons(interp, v, "car")?.borrow().car.clone())
}

fn builtin_cdr(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let v = one(args);
    if v.is_nil() {
        return Ok(Value::Nil);
    }
    Ok(forced_cons(interp, v, "cdr")?.borrow().cdr.clone())
}

fn nth_cdr(interp: &mut Interp, list: &Value, n: usize) -> Result<Value, Unwind> {
    let mut cur = list.clone();
    for _ in 0..n {
        if cur.is_nil() {
            return Ok(Value::Nil);
        }
        let cell = forced_cons(interp, &cur, "nth")?;
        let cdr = cell.borrow().cdr.clone();
        cur = cdr;
    }
    Ok(cur)
}

fn nth_car(interp: &mut Interp, list: &Value, n: usize) -> Result<Value, Unwind> {
    let tail = nth_cdr(interp, list, n)?;
    builtin_car(interp, &[tail])
}

fn builtin_first(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    builtin_car(interp, args)
}
fn builtin_second(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    nth_car(interp, one(args), 1)
}
fn builtin_third(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    nth_car(interp, one(args), 2)
}
fn builtin_fourth(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    nth_car(interp, one(args), 3)
}
fn builtin_fifth(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    nth_car(interp, one(args), 4)
}
fn builtin_sixth(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    nth_car(interp, one(args), 5)
}

fn builtin_rest(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    builtin_cdr(interp, args)
}

fn builtin_nth(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let n = args
        .get(1)
        .and_then(|v| v.as_int())
        .ok_or_else(|| interp.make_error(TAG_TYPE_ERROR, "nth: index not a number"))?;
    if n < 0 {
        return Err(interp.make_error(crate::error::TAG_RANGE_ERROR, "nth: negative index"));
    }
    nth_car(interp, one(args), n as usize)
}

/// `(length x)` — uniform over strings, vectors, and proper lists.
fn builtin_length(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let v = one(args);
    let n = match v {
        Value::Nil => 0,
        Value::Str(s) => s.borrow().chars().count(),
        Value::Vector(vec) => vec.borrow().len(),
        Value::Cons(_) => interp.materialize_list(v)?.len(),
        _ => return Err(interp.make_error(TAG_TYPE_ERROR, "length: not a sequence")),
    };
    Ok(Value::Integer(n as i64))
}

fn builtin_list(_interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    Ok(Value::vec_to_list(args.iter().cloned()))
}

fn builtin_reverse(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let mut items = interp.materialize_list(one(args))?;
    items.reverse();
    Ok(Value::vec_to_list(items.into_iter()))
}

fn builtin_append(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let mut out = Vec::new();
    for (i, a) in args.iter().enumerate() {
        if i + 1 == args.len() {
            // the final argument need not be a proper list; it becomes the tail.
            if let Some(items) = a.list_to_vec() {
                out.extend(items);
                return Ok(Value::vec_to_list(out.into_iter()));
            }
            let mut result = a.clone();
            for item in out.into_iter().rev() {
                result = Value::cons(item, result);
            }
            return Ok(result);
        }
        out.extend(interp.materialize_list(a)?);
    }
    Ok(Value::Nil)
}

fn builtin_rplaca(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let cell = forced_cons(interp, one(args), "rplaca")?;
    let v = args.get(1).cloned().unwrap_or(Value::Nil);
    cell.borrow_mut().car = v;
    Ok(Value::Cons(cell))
}

fn builtin_rplacd(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let cell = forced_cons(interp, one(args), "rplacd")?;
    let v = args.get(1).cloned().unwrap_or(Value::Nil);
    cell.borrow_mut().cdr = v;
    Ok(Value::Cons(cell))
}

pub fn register(interp: &mut Interp) {
    interp.reg_fun("cons", Arity::exact(2), builtin_cons);
    interp.reg_fun("car", Arity::exact(1), builtin_car);
    interp.reg_fun("cdr", Arity::exact(1), builtin_cdr);
    interp.reg_fun("first", Arity::exact(1), builtin_first);
    interp.reg_fun("second", Arity::exact(1), builtin_second);
    interp.reg_fun("third", Arity::exact(1), builtin_third);
    interp.reg_fun("fourth", Arity::exact(1), builtin_fourth);
    interp.reg_fun("fifth", Arity::exact(1), builtin_fifth);
    interp.reg_fun("sixth", Arity::exact(1), builtin_sixth);
    interp.reg_fun("rest", Arity::exact(1), builtin_rest);
    interp.reg_fun("nth", Arity::exact(2), builtin_nth);
    interp.reg_fun("length", Arity::exact(1), builtin_length);
    interp.reg_fun("list", Arity::at_least(0), builtin_list);
    interp.reg_fun("reverse", Arity::exact(1), builtin_reverse);
    interp.reg_fun("append", Arity::at_least(0), builtin_append);
    interp.reg_fun("rplaca", Arity::exact(2), builtin_rplaca);
    interp.reg_fun("rplacd", Arity::exact(2), builtin_rplacd);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list3() -> Value {
        Value::vec_to_list(vec![Value::int(1), Value::int(2), Value::int(3)].into_iter())
    }

    #[test]
    fn car_cdr_roundtrip() {
        let mut interp = Interp::new();
        let l = list3();
        assert!(builtin_car(&mut interp, &[l.clone()]).unwrap().eql(&Value::int(1)));
        let rest = builtin_cdr(&mut interp, &[l]).unwrap();
        assert!(builtin_car(&mut interp, &[rest]).unwrap().eql(&Value::int(2)));
    }

    #[test]
    fn length_and_reverse_law() {
        let mut interp = Interp::new();
        let l = list3();
        let len = builtin_length(&mut interp, &[l.clone()]).unwrap();
        let rev = builtin_reverse(&mut interp, &[l.clone()]).unwrap();
        let rev_len = builtin_length(&mut interp, &[rev.clone()]).unwrap();
        assert!(len.eql(&rev_len));
        let back = builtin_reverse(&mut interp, &[rev]).unwrap();
        assert!(back.equal(&l));
    }

    #[test]
    fn append_final_arg_can_be_improper() {
        let mut interp = Interp::new();
        let a = Value::vec_to_list(vec![Value::int(1)].into_iter());
        let r = builtin_append(&mut interp, &[a, Value::int(2)]).unwrap();
        assert!(builtin_car(&mut interp, &[r.clone()]).unwrap().eql(&Value::int(1)));
        let tail = builtin_cdr(&mut interp, &[r]).unwrap();
        assert!(tail.eql(&Value::int(2)));
    }

    #[test]
    fn rplaca_mutates_in_place() {
        let mut interp = Interp::new();
        let l = list3();
        builtin_rplaca(&mut interp, &[l.clone(), Value::int(99)]).unwrap();
        assert!(builtin_car(&mut interp, &[l]).unwrap().eql(&Value::int(99)));
    }
}
