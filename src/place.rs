// ABOUTME: Place module resolving settable locations for set/inc/dec/push/pop/flip/del

//! The place engine.
//!
//! A syntactic place is resolved to a [`Location`] — a tagged location value
//! standing in for a raw pointer-to-cell — and the
//! modplace operators (`set`, `inc`, `dec`, `push`, `pop`, `flip`, `del`)
//! all consume one. `dwim obj idx` dispatches on the runtime type of `obj`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::env::Environment;
use crate::error::{SourceLoc, Unwind, TAG_EVAL_ERROR, TAG_RANGE_ERROR, TAG_TYPE_ERROR};
use crate::interp::Interp;
use crate::value::{ConsCell, HashTable, Value};

pub enum Location {
    Variable { frame: Rc<Environment>, name: String },
    Car(Rc<RefCell<ConsCell>>),
    Cdr(Rc<RefCell<ConsCell>>),
    VectorSlot { vec: Rc<RefCell<Vec<Value>>>, index: usize },
    HashSlot { hash: Rc<RefCell<HashTable>>, key: Value },
    StringIndex { s: Rc<RefCell<String>>, index: usize },
    /// `[obj from..to]` dwim range: re-resolved on write since list
    /// ranges may reshape the spine.
    ListRange { container_loc: Box<Location>, from: i64, to: i64 },
    VectorRange { vec: Rc<RefCell<Vec<Value>>>, from: usize, to: usize },
    StringRange { s: Rc<RefCell<String>>, from: usize, to: usize },
}

fn eval_err(interp: &mut Interp, tag: &str, message: impl Into<String>) -> Unwind {
    interp.make_error(tag, message)
}

/// Normalizes a negative-from-end index against a length, per the
/// sub-range convention used throughout this crate's sequence builtins.
pub fn normalize_index(idx: i64, len: usize) -> Option<usize> {
    if idx >= 0 {
        let i = idx as usize;
        if i <= len { Some(i) } else { None }
    } else {
        let from_end = (-idx) as usize;
        if from_end <= len { Some(len - from_end) } else { None }
    }
}

/// Resolves the unevaluated place `form` (e.g. `x`, `(car x)`,
/// `(gethash h k dflt)`, `(vecref v i)`, `(dwim obj idx)`) against `env`.
pub fn resolve_place(interp: &mut Interp, form: &Value, env: &Rc<Environment>) -> Result<Location, Unwind> {
    if let Value::Symbol(sym) = form {
        if !form.is_bindable_symbol() {
            return Err(eval_err(interp, TAG_EVAL_ERROR, format!("not a place: {sym:?}")));
        }
        let frame = env
            .frame_defining_var(&sym.name)
            .unwrap_or_else(|| Rc::clone(env));
        return Ok(Location::Variable { frame, name: sym.name.clone() });
    }

    let items = form
        .list_to_vec()
        .ok_or_else(|| eval_err(interp, TAG_EVAL_ERROR, "not a place"))?;
    if items.is_empty() {
        return Err(eval_err(interp, TAG_EVAL_ERROR, "not a place"));
    }
    let head_name = items[0].as_symbol().map(|s| s.name.clone()).unwrap_or_default();

    match head_name.as_str() {
        "car" => {
            let target = interp.eval(&items[1], env)?;
            let cell = target
                .as_cons()
                .ok_or_else(|| eval_err(interp, TAG_TYPE_ERROR, "car: not a cons"))?;
            Ok(Location::Car(Rc::clone(cell)))
        }
        "cdr" => {
            let target = interp.eval(&items[1], env)?;
            let cell = target
                .as_cons()
                .ok_or_else(|| eval_err(interp, TAG_TYPE_ERROR, "cdr: not a cons"))?;
            Ok(Location::Cdr(Rc::clone(cell)))
        }
        "vecref" => {
            let v = interp.eval(&items[1], env)?;
            let idx = interp.eval(&items[2], env)?;
            let vec = match v {
                Value::Vector(v) => v,
                _ => return Err(eval_err(interp, TAG_TYPE_ERROR, "vecref: not a vector")),
            };
            let len = vec.borrow().len();
            let i = idx
                .as_int()
                .and_then(|n| normalize_index(n, len))
                .ok_or_else(|| eval_err(interp, TAG_RANGE_ERROR, "vecref: index out of range"))?;
            Ok(Location::VectorSlot { vec, index: i })
        }
        "gethash" => {
            let h = interp.eval(&items[1], env)?;
            let key = interp.eval(&items[2], env)?;
            let hash = match h {
                Value::Hash(h) => h,
                _ => return Err(eval_err(interp, TAG_TYPE_ERROR, "gethash: not a hash")),
            };
            if items.len() > 3 {
                let key_str = key.key_string();
                let already_present = hash.borrow().entries.contains_key(&key_str);
                if !already_present {
                    let default = interp.eval(&items[3], env)?;
                    hash.borrow_mut().entries.insert(key_str, (key.clone(), default));
                }
            }
            Ok(Location::HashSlot { hash, key })
        }
        "dwim" => {
            let obj = crate::eval::eval_lisp1(interp, &items[1], env)?;
            let idx_form = items.get(2).cloned().unwrap_or(Value::Nil);
            resolve_dwim_on(interp, &items[1], obj, &idx_form, env)
        }
        _ => Err(eval_err(interp, TAG_EVAL_ERROR, format!("not a place: {head_name}"))),
    }
}

/// Resolves a `dwim` container read/write place given an already-evaluated
/// object (`obj`). Split out from the place-form entry point so `eval.rs`'s
/// `dwim`-as-read branch, which must evaluate the object once to decide
/// call-vs-read, can reuse the container dispatch without a second
/// evaluation of `obj_form`.
pub fn resolve_dwim_on(
    interp: &mut Interp,
    obj_form: &Value,
    obj: Value,
    idx_form: &Value,
    env: &Rc<Environment>,
) -> Result<Location, Unwind> {
    let idx = interp.eval(idx_form, env)?;

    match &obj {
        Value::Str(s) => match range_or_index(&idx) {
            RangeOrIndex::Index(i) => {
                let len = s.borrow().chars().count();
                let i = normalize_index(i, len)
                    .ok_or_else(|| eval_err(interp, TAG_RANGE_ERROR, "string index out of range"))?;
                Ok(Location::StringIndex { s: Rc::clone(s), index: i })
            }
            RangeOrIndex::Range(from, to) => {
                let len = s.borrow().chars().count();
                let from = normalize_index(from, len).unwrap_or(0);
                let to = normalize_index(to, len).unwrap_or(len);
                Ok(Location::StringRange { s: Rc::clone(s), from, to })
            }
        },
        Value::Vector(v) => match range_or_index(&idx) {
            RangeOrIndex::Index(i) => {
                let len = v.borrow().len();
                let i = normalize_index(i, len)
                    .ok_or_else(|| eval_err(interp, TAG_RANGE_ERROR, "vector index out of range"))?;
                Ok(Location::VectorSlot { vec: Rc::clone(v), index: i })
            }
            RangeOrIndex::Range(from, to) => {
                let len = v.borrow().len();
                let from = normalize_index(from, len).unwrap_or(0);
                let to = normalize_index(to, len).unwrap_or(len);
                Ok(Location::VectorRange { vec: Rc::clone(v), from, to })
            }
        },
        Value::Cons(_) | Value::Nil => match range_or_index(&idx) {
            RangeOrIndex::Index(i) => {
                let cell = nth_cons_cell(interp, &obj, i)?;
                Ok(Location::Car(cell))
            }
            RangeOrIndex::Range(from, to) => {
                // Preserve the head: the list-range place wraps a variable
                // place when available so replacement can re-bind the
                // container's head ("the container symbol is
                // re-bound via a recursive modplace to preserve the
                // head"); when the base isn't a bare variable, splicing
                // mutates the existing spine's cells directly instead.
                let base_loc = if obj_form.is_bindable_symbol() {
                    resolve_place(interp, obj_form, env)?
                } else {
                    Location::Car(obj.as_cons().cloned().unwrap_or_else(|| {
                        Rc::new(RefCell::new(ConsCell { car: Value::Nil, cdr: Value::Nil, thunk: None }))
                    }))
                };
                Ok(Location::ListRange { container_loc: Box::new(base_loc), from, to })
            }
        },
        Value::Hash(h) => Ok(Location::HashSlot { hash: Rc::clone(h), key: idx }),
        Value::Function(_) | Value::Symbol(_) => {
            Err(eval_err(interp, TAG_TYPE_ERROR, "dwim: assignment not supported on this type"))
        }
        _ => Err(eval_err(interp, TAG_TYPE_ERROR, "dwim: unsupported container")),
    }
}

enum RangeOrIndex {
    Index(i64),
    Range(i64, i64),
}

fn range_or_index(v: &Value) -> RangeOrIndex {
    if let Some(n) = v.as_int() {
        return RangeOrIndex::Index(n);
    }
    if let Value::Cons(cell) = v {
        let b = cell.borrow();
        if let (Some(from), Some(to)) = (b.car.as_int(), b.cdr.as_int()) {
            return RangeOrIndex::Range(from, to);
        }
    }
    RangeOrIndex::Index(0)
}

fn nth_cons_cell(interp: &mut Interp, list: &Value, n: i64) -> Result<Rc<RefCell<ConsCell>>, Unwind> {
    if n < 0 {
        return Err(eval_err(interp, TAG_RANGE_ERROR, "list index out of range"));
    }
    let mut cur = list.clone();
    for _ in 0..n {
        let cell = cur
            .as_cons()
            .ok_or_else(|| eval_err(interp, TAG_RANGE_ERROR, "list index out of range"))?;
        let cell = crate::lazy::force_with_interp(interp, cell)?;
        let cdr = cell.borrow().cdr.clone();
        cur = cdr;
    }
    cur.as_cons()
        .cloned()
        .ok_or_else(|| eval_err(interp, TAG_RANGE_ERROR, "list index out of range"))
}

// ---- modplace operators ----

pub fn get_loc(interp: &mut Interp, loc: &Location) -> Result<Value, Unwind> {
    match loc {
        Location::Variable { frame, name } => Ok(frame.get_var(name).unwrap_or(Value::Nil)),
        Location::Car(cell) => Ok(cell.borrow().car.clone()),
        Location::Cdr(cell) => Ok(cell.borrow().cdr.clone()),
        Location::VectorSlot { vec, index } => Ok(vec.borrow()[*index].clone()),
        Location::HashSlot { hash, key } => {
            let key_str = key.key_string();
            Ok(hash.borrow().entries.get(&key_str).map(|(_, v)| v.clone()).unwrap_or(Value::Nil))
        }
        Location::StringIndex { s, index } => {
            let c = s.borrow().chars().nth(*index);
            Ok(c.map(Value::Character).unwrap_or(Value::Nil))
        }
        Location::ListRange { container_loc, from, to } => {
            let container = get_loc(interp, container_loc)?;
            let items = container.list_to_vec().unwrap_or_default();
            let slice = &items[(*from as usize).min(items.len())..(*to as usize).min(items.len())];
            Ok(Value::vec_to_list(slice.iter().cloned()))
        }
        Location::VectorRange { vec, from, to } => {
            let b = vec.borrow();
            Ok(Value::Vector(Rc::new(RefCell::new(b[*from..*to].to_vec()))))
        }
        Location::StringRange { s, from, to } => {
            let chars: Vec<char> = s.borrow().chars().collect();
            Ok(Value::string(chars[*from..*to].iter().collect::<String>()))
        }
    }
}

pub fn set_loc(interp: &mut Interp, loc: &Location, v: Value) -> Result<Value, Unwind> {
    match loc {
        Location::Variable { frame, name } => {
            frame.define_var(name, v.clone());
            Ok(v)
        }
        Location::Car(cell) => {
            cell.borrow_mut().car = v.clone();
            Ok(v)
        }
        Location::Cdr(cell) => {
            cell.borrow_mut().cdr = v.clone();
            Ok(v)
        }
        Location::VectorSlot { vec, index } => {
            vec.borrow_mut()[*index] = v.clone();
            Ok(v)
        }
        Location::HashSlot { hash, key } => {
            hash.borrow_mut().entries.insert(key.key_string(), (key.clone(), v.clone()));
            Ok(v)
        }
        Location::StringIndex { s, index } => {
            let ch = match &v {
                Value::Character(c) => *c,
                _ => return Err(eval_err(interp, TAG_TYPE_ERROR, "string index set: not a character")),
            };
            let mut chars: Vec<char> = s.borrow().chars().collect();
            if *index < chars.len() {
                chars[*index] = ch;
            }
            *s.borrow_mut() = chars.into_iter().collect();
            Ok(v)
        }
        Location::ListRange { container_loc, from, to } => {
            let container = get_loc(interp, container_loc)?;
            let mut items = container.list_to_vec().unwrap_or_default();
            let replacement = v.list_to_vec().unwrap_or_else(|| vec![v.clone()]);
            let from = (*from as usize).min(items.len());
            let to = (*to as usize).min(items.len()).max(from);
            items.splice(from..to, replacement);
            let new_list = Value::vec_to_list(items.into_iter());
            set_loc(interp, container_loc, new_list)?;
            Ok(v)
        }
        Location::VectorRange { vec, from, to } => {
            let replacement = match &v {
                Value::Vector(rv) => rv.borrow().clone(),
                other => other.list_to_vec().unwrap_or_else(|| vec![other.clone()]),
            };
            let mut b = vec.borrow_mut();
            b.splice(*from..*to, replacement);
            Ok(v)
        }
        Location::StringRange { s, from, to } => {
            let replacement = match &v {
                Value::Str(rs) => rs.borrow().clone(),
                other => other.to_string(),
            };
            let mut chars: Vec<char> = s.borrow().chars().collect();
            chars.splice(*from..*to, replacement.chars());
            *s.borrow_mut() = chars.into_iter().collect();
            Ok(v)
        }
    }
}

pub fn inc_loc(interp: &mut Interp, loc: &Location, delta: i64) -> Result<Value, Unwind> {
    let cur = get_loc(interp, loc)?;
    let n = cur
        .as_int()
        .ok_or_else(|| eval_err(interp, TAG_TYPE_ERROR, "inc: not a number"))?;
    set_loc(interp, loc, Value::Integer(n + delta))
}

pub fn dec_loc(interp: &mut Interp, loc: &Location, delta: i64) -> Result<Value, Unwind> {
    inc_loc(interp, loc, -delta)
}

pub fn push_loc(interp: &mut Interp, loc: &Location, value: Value) -> Result<Value, Unwind> {
    let cur = get_loc(interp, loc)?;
    let new_list = Value::cons(value, cur);
    set_loc(interp, loc, new_list)
}

pub fn pop_loc(interp: &mut Interp, loc: &Location) -> Result<Value, Unwind> {
    let cur = get_loc(interp, loc)?;
    let cell = cur
        .as_cons()
        .ok_or_else(|| eval_err(interp, TAG_TYPE_ERROR, "pop: not a list"))?;
    let cell = crate::lazy::force_with_interp(interp, cell)?;
    let (car, cdr) = {
        let b = cell.borrow();
        (b.car.clone(), b.cdr.clone())
    };
    set_loc(interp, loc, cdr)?;
    Ok(car)
}

pub fn flip_loc(interp: &mut Interp, loc: &Location) -> Result<Value, Unwind> {
    let cur = get_loc(interp, loc)?;
    set_loc(interp, loc, Value::bool_val(!cur.is_truthy()))
}

pub fn del_loc(interp: &mut Interp, loc: &Location) -> Result<Value, Unwind> {
    match loc {
        Location::HashSlot { hash, key } => {
            let key_str = key.key_string();
            Ok(hash.borrow_mut().entries.remove(&key_str).map(|(_, v)| v).unwrap_or(Value::Nil))
        }
        Location::Variable { .. } => Err(eval_err(interp, TAG_EVAL_ERROR, "del: not supported on a plain variable")),
        Location::VectorSlot { vec, index } => {
            let mut b = vec.borrow_mut();
            if *index < b.len() {
                Ok(b.remove(*index))
            } else {
                Err(eval_err(interp, TAG_RANGE_ERROR, "del: index out of range"))
            }
        }
        Location::Car(_) | Location::Cdr(_) | Location::StringIndex { .. }
        | Location::VectorRange { .. } | Location::StringRange { .. } => {
            Err(eval_err(interp, TAG_EVAL_ERROR, "del: not supported on this place"))
        }
        Location::ListRange { container_loc, from, to } => {
            let container = get_loc(interp, container_loc)?;
            let mut items = container.list_to_vec().unwrap_or_default();
            let from = (*from as usize).min(items.len());
            let to = (*to as usize).min(items.len()).max(from);
            let removed: Vec<Value> = items.splice(from..to, std::iter::empty()).collect();
            let new_list = Value::vec_to_list(items.into_iter());
            set_loc(interp, container_loc, new_list)?;
            Ok(Value::vec_to_list(removed.into_iter()))
        }
    }
}

#[allow(dead_code)]
pub fn unused_loc_helper(_: SourceLoc) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::Interp;

    #[test]
    fn place_identity_through_car_inc() {
        let mut interp = Interp::new();
        let env = interp.global_env();
        let list = Value::vec_to_list(vec![Value::int(1), Value::int(2), Value::int(3)].into_iter());
        env.define_var("x", list.clone());
        let place_form = interp.read_one("(car x)").unwrap();
        let loc = resolve_place(&mut interp, &place_form, &env).unwrap();
        inc_loc(&mut interp, &loc, 10).unwrap();
        let items = list.list_to_vec().unwrap();
        assert!(items[0].eql(&Value::int(11)));
        assert!(items[1].eql(&Value::int(2)));
    }

    #[test]
    fn del_on_list_range_removes_slice() {
        let mut interp = Interp::new();
        let env = interp.global_env();
        let list = Value::vec_to_list(vec![Value::int(10), Value::int(20), Value::int(30), Value::int(40)].into_iter());
        env.define_var("l", list);
        let place_form = interp.read_one("[l 1..3]").unwrap();
        let loc = resolve_place(&mut interp, &place_form, &env).unwrap();
        del_loc(&mut interp, &loc).unwrap();
        let remaining = env.get_var("l").unwrap().list_to_vec().unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(remaining[0].eql(&Value::int(10)));
        assert!(remaining[1].eql(&Value::int(40)));
    }
}
