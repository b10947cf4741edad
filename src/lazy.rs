// ABOUTME: Lazy sequence module for generate/range/repeat and delay/force promises

//! Lazy sequences: `generate`, `range`/`range*`, `repeat`, `delay`/
//! `force`.
//!
//! `generate` calls `gen-fun` once and returns a lazy cons whose car is that
//! value, so a lazy cons's `car` is always valid the
//! moment the cell exists — only `cdr` is deferred behind the thunk. For
//! `range`/`repeat` the next cell is pure arithmetic over already-known
//! values, so [`force_if_lazy`] can compute it without an interpreter. For
//! `generate`, producing the next cell calls back into a Lisp function
//! (`while-pred`/`gen-fun`), which needs [`crate::interp::Interp`]; that
//! path lives in [`force_with_interp`] instead. `value.rs::list_to_vec`
//! only calls the pure path and reports an unresolved cell (`None`) rather
//! than silently truncating a `generate`-backed list.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Unwind;
use crate::interp::Interp;
use crate::value::{ConsCell, LazyKind, Value};

/// Forces `cell` if its thunk can be resolved without calling into Lisp
/// code (`Range`/`Repeat`). Leaves `Generate`-backed cells thunked. Always
/// returns `cell` itself — forcing is in-place mutation, not a new cell.
pub fn force_if_lazy(cell: &Rc<RefCell<ConsCell>>) -> Rc<RefCell<ConsCell>> {
    let kind = cell.borrow().thunk.clone();
    match kind {
        None => {}
        Some(LazyKind::Generate { .. }) => {}
        Some(LazyKind::Range { next, to, step, inclusive }) => {
            let exhausted = match to {
                None => false,
                Some(to) => {
                    if step >= 0 {
                        if inclusive { next > to } else { next >= to }
                    } else if inclusive {
                        next < to
                    } else {
                        next <= to
                    }
                }
            };
            let mut b = cell.borrow_mut();
            if exhausted {
                b.cdr = Value::Nil;
            } else {
                let following = next + step;
                b.cdr = Value::lazy_cons(LazyKind::Range { next: following, to, step, inclusive });
                // car of the *next* cell is the next cell's own `next`.
                if let Value::Cons(ref next_cell) = b.cdr {
                    next_cell.borrow_mut().car = Value::Integer(following);
                }
            }
            b.thunk = None;
        }
        Some(LazyKind::Repeat { list, original, remaining }) => {
            let mut b = cell.borrow_mut();
            match list.clone() {
                Value::Cons(ref c) => {
                    let (car, cdr) = {
                        let cb = c.borrow();
                        (cb.car.clone(), cb.cdr.clone())
                    };
                    b.car = car;
                    if cdr.is_nil() {
                        // wrap around, consuming one cycle budget
                        let next_remaining = remaining.map(|r| r - 1);
                        if next_remaining == Some(0) {
                            b.cdr = Value::Nil;
                        } else {
                            b.cdr = Value::lazy_cons(LazyKind::Repeat {
                                list: original.clone(),
                                original: original.clone(),
                                remaining: next_remaining,
                            });
                        }
                    } else {
                        b.cdr = Value::lazy_cons(LazyKind::Repeat { list: cdr, original, remaining });
                    }
                }
                _ => {
                    b.car = Value::Nil;
                    b.cdr = Value::Nil;
                }
            }
            b.thunk = None;
        }
    }
    Rc::clone(cell)
}

/// Forces `cell`, calling into the interpreter when the thunk is a
/// `Generate`. Used by `force`-adjacent builtins and iteration forms
/// (`for`, `each`, `collect-each`, `dohash` are eager over plain lists, but
/// `map`/printing helpers over a `generate`d sequence funnel through here).
pub fn force_with_interp(interp: &mut Interp, cell: &Rc<RefCell<ConsCell>>) -> Result<Rc<RefCell<ConsCell>>, Unwind> {
    let kind = cell.borrow().thunk.clone();
    if let Some(LazyKind::Generate { while_pred, gen_fn }) = kind {
        let keep_going = interp.apply(while_pred.clone(), &[])?;
        let mut b = cell.borrow_mut();
        if !keep_going.is_truthy() {
            b.cdr = Value::Nil;
            b.thunk = None;
            drop(b);
            return Ok(Rc::clone(cell));
        }
        drop(b);
        let next_val = interp.apply(gen_fn.clone(), &[])?;
        let next_cell = Value::lazy_cons(LazyKind::Generate { while_pred, gen_fn });
        if let Value::Cons(ref nc) = next_cell {
            nc.borrow_mut().car = next_val;
        }
        let mut b = cell.borrow_mut();
        b.cdr = next_cell;
        b.thunk = None;
    } else {
        return Ok(force_if_lazy(cell));
    }
    Ok(Rc::clone(cell))
}

/// `generate(while-pred, gen-fun)`.
pub fn generate(interp: &mut Interp, while_pred: Value, gen_fn: Value) -> Result<Value, Unwind> {
    let keep_going = interp.apply(while_pred.clone(), &[])?;
    if !keep_going.is_truthy() {
        return Ok(Value::Nil);
    }
    let first = interp.apply(gen_fn.clone(), &[])?;
    let cell = Value::lazy_cons(LazyKind::Generate { while_pred, gen_fn });
    if let Value::Cons(ref c) = cell {
        c.borrow_mut().car = first;
    }
    Ok(cell)
}

/// `range(from, to, step)` (inclusive of `to`) / `range*` (exclusive).
/// `to = None` means open-ended. Defaults `step` to `-1` when
/// `from > to` and no step was given, per `eval.c`'s `range_common` helper.
pub fn range(from: i64, to: Option<i64>, step: Option<i64>, inclusive: bool) -> Value {
    let step = step.unwrap_or_else(|| match to {
        Some(t) if from > t => -1,
        _ => 1,
    });
    let exhausted = match to {
        None => false,
        Some(t) => {
            if step >= 0 {
                if inclusive { from > t } else { from >= t }
            } else if inclusive {
                from < t
            } else {
                from <= t
            }
        }
    };
    if exhausted {
        return Value::Nil;
    }
    let cell = Value::lazy_cons(LazyKind::Range { next: from + step, to, step, inclusive });
    if let Value::Cons(ref c) = cell {
        c.borrow_mut().car = Value::Integer(from);
    }
    cell
}

/// `repeat(list, [n])`. `n = None` cycles forever.
pub fn repeat(list: Value, n: Option<i64>) -> Value {
    if list.is_nil() || n == Some(0) {
        return Value::Nil;
    }
    match &list {
        Value::Cons(_) => {
            let cell = Value::lazy_cons(LazyKind::Repeat {
                list: list.clone(),
                original: list.clone(),
                remaining: n,
            });
            force_if_lazy(cell.as_cons().unwrap());
            cell
        }
        _ => Value::Nil,
    }
}

/// The promise sentinel symbol car, per the `delay` expansion
/// `(cons 'promise (lambda () body))`.
pub const PROMISE_MARKER: &str = "promise";

/// `force(promise)`: if `car == 'promise`, calls the thunk in `cdr`, stores
/// the result in `cdr`, flips `car` to nil. Otherwise returns the value
/// unchanged. Idempotent. Unlike `generate`'s lazy cons, this
/// operates on an *ordinary* cons produced by the `delay` expansion, not a
/// `ConsCell.thunk`.
pub fn force(interp: &mut Interp, promise: Value) -> Result<Value, Unwind> {
    let cell = match promise.as_cons() {
        Some(c) => Rc::clone(c),
        None => return Ok(promise),
    };
    let (is_promise, thunk_fn) = {
        let b = cell.borrow();
        let is_promise = matches!(&b.car, Value::Symbol(s) if s.name == PROMISE_MARKER);
        (is_promise, b.cdr.clone())
    };
    if !is_promise {
        return Ok(cell.borrow().cdr.clone());
    }
    let result = interp.apply(thunk_fn, &[])?;
    let mut b = cell.borrow_mut();
    b.car = Value::Nil;
    b.cdr = result.clone();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_first_three_are_0_1_2() {
        let r = range(0, None, Some(1), true);
        let cell = r.as_cons().unwrap().clone();
        force_if_lazy(&cell);
        let first = cell.borrow().car.clone();
        assert!(first.eql(&Value::int(0)));
        let second_val = cell.borrow().cdr.clone();
        let second_cell = second_val.as_cons().unwrap().clone();
        assert!(second_cell.borrow().car.eql(&Value::int(1)));
    }

    #[test]
    fn range_star_is_exclusive() {
        let r = range(0, Some(3), Some(1), false);
        let mut cur = r;
        let mut items = Vec::new();
        loop {
            match cur.clone() {
                Value::Nil => break,
                Value::Cons(c) => {
                    force_if_lazy(&c);
                    let (car, cdr) = {
                        let b = c.borrow();
                        (b.car.clone(), b.cdr.clone())
                    };
                    items.push(car);
                    cur = cdr;
                }
                _ => break,
            }
        }
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn repeat_cycles_n_times() {
        let list = Value::vec_to_list(vec![Value::int(1), Value::int(2)].into_iter());
        let rep = repeat(list, Some(2));
        let materialized = rep.list_to_vec().expect("repeat is pure-forceable");
        assert_eq!(materialized.len(), 4);
        assert!(materialized[0].eql(&Value::int(1)));
        assert!(materialized[3].eql(&Value::int(2)));
    }
}
