//! Builtin bindings for the lazy-sequence primitives in `lazy.rs`:
//! `generate`, `range`, `range*`, `repeat`, `force`.

use crate::error::{Unwind, TAG_TYPE_ERROR};
use crate::interp::Interp;
use crate::value::{Arity, Value};

fn one(args: &[Value]) -> &Value {
    args.first().unwrap_or(&Value::Nil)
}

fn opt_int(interp: &mut Interp, v: Option<&Value>, who: &str) -> Result<Option<i64>, Unwind> {
    match v {
        None => Ok(None),
        Some(v) if v.is_nil() => Ok(None),
        Some(v) => v
            .as_int()
            .map(Some)
            .ok_or_else(|| interp.make_error(TAG_TYPE_ERROR, format!("{who}: not a number"))),
    }
}

fn builtin_generate(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let while_pred = one(args).clone();
    let gen_fn = args.get(1).cloned().unwrap_or(Value::Nil);
    crate::lazy::generate(interp, while_pred, gen_fn)
}

fn range_common(interp: &mut Interp, args: &[Value], inclusive: bool) -> Result<Value, Unwind> {
    let from = one(args)
        .as_int()
        .ok_or_else(|| interp.make_error(TAG_TYPE_ERROR, "range: from not a number"))?;
    let to = opt_int(interp, args.get(1), "range")?;
    let step = opt_int(interp, args.get(2), "range")?;
    Ok(crate::lazy::range(from, to, step, inclusive))
}

fn builtin_range(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    range_common(interp, args, true)
}

fn builtin_range_star(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    range_common(interp, args, false)
}

fn builtin_repeat(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let n = opt_int(interp, args.get(1), "repeat")?;
    Ok(crate::lazy::repeat(one(args).clone(), n))
}

fn builtin_force(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    crate::lazy::force(interp, one(args).clone())
}

pub fn register(interp: &mut Interp) {
    interp.reg_fun("generate", Arity::exact(2), builtin_generate);
    interp.reg_fun("range", Arity::range(1, 2), builtin_range);
    interp.reg_fun("range*", Arity::range(1, 2), builtin_range_star);
    interp.reg_fun("repeat", Arity::range(1, 1), builtin_repeat);
    interp.reg_fun("force", Arity::exact(1), builtin_force);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_builtin_materializes() {
        let mut interp = Interp::new();
        let r = builtin_range_star(&mut interp, &[Value::int(0), Value::int(3)]).unwrap();
        let items = interp.materialize_list(&r).unwrap();
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn repeat_builtin_defaults_to_infinite_but_forceable_prefix() {
        let mut interp = Interp::new();
        let list = Value::vec_to_list(vec![Value::int(1), Value::int(2)].into_iter());
        let r = builtin_repeat(&mut interp, &[list, Value::int(3)]).unwrap();
        let items = interp.materialize_list(&r).unwrap();
        assert_eq!(items.len(), 6);
    }
}
