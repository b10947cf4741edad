// ABOUTME: Value types representing Lisp data structures and expressions

//! The tagged-union value model.
//!
//! Heap-backed variants share cells through `Rc<RefCell<_>>` handles, which
//! is how this crate realizes the "mutable car/cdr reachable by many
//! handles" requirement without a tracing collector: reference counting
//! plays the collaborator's role here since there is no embedding host to
//! hand GC duties to.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::env::Environment;
use crate::package::Package;

/// A cons cell. `thunk` is `Some` for a lazy cons not yet forced; forcing
/// fills `car`/`cdr` and sets it to `None` — a lazy cons's thunk is nil iff
/// car/cdr have been filled.
pub struct ConsCell {
    pub car: Value,
    pub cdr: Value,
    pub thunk: Option<LazyKind>,
}

/// The deferred-computation state behind an unforced lazy cons.
/// `delay`/`force` do not use this — the expander rewrites `delay` to lower
/// to an ordinary cons `(promise . fn)`, and `force` is a
/// plain builtin, not a lazy-cons forcing. This enum backs only
/// `generate`, `range`/`range*`, and `repeat`.
#[derive(Clone)]
pub enum LazyKind {
    Generate { while_pred: Value, gen_fn: Value },
    Range { next: i64, to: Option<i64>, step: i64, inclusive: bool },
    Repeat { list: Value, original: Value, remaining: Option<i64> },
}

/// Interned-symbol identity. Two `Value::Symbol` handles are `eq` iff they
/// point at the same `SymbolData`, which is identity-equal to every other
/// reference to the same name in the same package.
pub struct SymbolData {
    pub name: String,
    pub package: String,
}

impl fmt::Debug for SymbolData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.package, self.name)
    }
}

/// An interpreted closure or a native builtin ("Function").
pub enum FunctionData {
    Interpreted {
        name: Option<String>,
        params: ParamList,
        body: Vec<Value>,
        env: Rc<Environment>,
    },
    Builtin {
        name: &'static str,
        arity: Arity,
        func: BuiltinFn,
    },
}

/// Builtins take the full interpreter, not just their arguments, so that
/// ones needing evaluation (`dwim`, `map`/`filter`/`reduce` style
/// higher-order helpers) can call back into it.
pub type BuiltinFn = fn(&mut crate::interp::Interp, &[Value]) -> Result<Value, crate::error::Unwind>;

/// Fixed/optional/rest arity descriptor: each built-in records its required
/// parameter count, optional parameter count, and a variadic flag.
#[derive(Clone, Copy, Debug)]
pub struct Arity {
    pub required: usize,
    pub optional: usize,
    pub rest: bool,
}

impl Arity {
    pub const fn exact(n: usize) -> Self {
        Arity { required: n, optional: 0, rest: false }
    }
    pub const fn at_least(n: usize) -> Self {
        Arity { required: n, optional: 0, rest: true }
    }
    pub const fn range(required: usize, optional: usize) -> Self {
        Arity { required, optional, rest: false }
    }
    pub const fn range_rest(required: usize, optional: usize) -> Self {
        Arity { required, optional, rest: true }
    }
}

/// A parsed interpreted-function parameter list ("Parameter binding"):
/// required params, then params after a `:` marker (optional, nil-default),
/// then an optional rest parameter for a dotted tail.
#[derive(Clone, Debug, Default)]
pub struct ParamList {
    pub required: Vec<Rc<SymbolData>>,
    pub optional: Vec<Rc<SymbolData>>,
    pub rest: Option<Rc<SymbolData>>,
}

#[derive(Clone)]
pub enum Value {
    Nil,
    T,
    Integer(i64),
    Character(char),
    Str(Rc<RefCell<String>>),
    Symbol(Rc<SymbolData>),
    Cons(Rc<RefCell<ConsCell>>),
    Vector(Rc<RefCell<Vec<Value>>>),
    Hash(Rc<RefCell<HashTable>>),
    Function(Rc<FunctionData>),
}

/// Backs `make-hash`/`sethash`/`gethash`/`remhash`. Keyed by the
/// value's `equal`-based print form since `Value` has no total `Eq`/`Hash`
/// impl over floats-free-but-Rc-aliased cells; see `key_string` in
/// `builtins/hashes.rs`.
pub struct HashTable {
    pub entries: HashMap<String, (Value, Value)>,
    pub equal_based: bool,
}

impl HashTable {
    pub fn new(equal_based: bool) -> Self {
        HashTable { entries: HashMap::new(), equal_based }
    }
}

impl Value {
    pub fn cons(car: Value, cdr: Value) -> Value {
        Value::Cons(Rc::new(RefCell::new(ConsCell { car, cdr, thunk: None })))
    }

    pub fn lazy_cons(kind: LazyKind) -> Value {
        Value::Cons(Rc::new(RefCell::new(ConsCell {
            car: Value::Nil,
            cdr: Value::Nil,
            thunk: Some(kind),
        })))
    }

    pub fn string(s: impl Into<String>) -> Value {
        Value::Str(Rc::new(RefCell::new(s.into())))
    }

    pub fn int(n: i64) -> Value {
        Value::Integer(n)
    }

    pub fn bool_val(b: bool) -> Value {
        if b { Value::T } else { Value::Nil }
    }

    /// Canonical Lisp truthiness: everything but nil is true (nil is
    /// "the canonical false").
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil)
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_cons(&self) -> bool {
        matches!(self, Value::Cons(_))
    }

    /// True for `nil`, `t`, and keyword symbols — the non-bindable atoms.
    pub fn is_self_evaluating_atom(&self) -> bool {
        match self {
            Value::Nil | Value::T => true,
            Value::Symbol(s) => s.package == crate::package::KEYWORD_PACKAGE,
            Value::Integer(_) | Value::Character(_) | Value::Str(_) | Value::Vector(_)
            | Value::Hash(_) | Value::Function(_) => true,
            Value::Cons(_) => false,
        }
    }

    pub fn is_bindable_symbol(&self) -> bool {
        match self {
            Value::Symbol(s) => s.package != crate::package::KEYWORD_PACKAGE,
            _ => false,
        }
    }

    pub fn as_symbol(&self) -> Option<&Rc<SymbolData>> {
        match self {
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_cons(&self) -> Option<&Rc<RefCell<ConsCell>>> {
        match self {
            Value::Cons(c) => Some(c),
            _ => None,
        }
    }

    /// Structural (`equal`) equality.
    pub fn equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) | (Value::T, Value::T) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Character(a), Value::Character(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => *a.borrow() == *b.borrow(),
            (Value::Symbol(a), Value::Symbol(b)) => Rc::ptr_eq(a, b),
            (Value::Cons(a), Value::Cons(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let a = a.borrow();
                let b = b.borrow();
                a.car.equal(&b.car) && a.cdr.equal(&b.cdr)
            }
            (Value::Vector(a), Value::Vector(b)) => {
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equal(y))
            }
            (Value::Hash(a), Value::Hash(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Identity (`eq`) equality.
    pub fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) | (Value::T, Value::T) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Character(a), Value::Character(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => Rc::ptr_eq(a, b),
            (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b),
            (Value::Cons(a), Value::Cons(b)) => Rc::ptr_eq(a, b),
            (Value::Vector(a), Value::Vector(b)) => Rc::ptr_eq(a, b),
            (Value::Hash(a), Value::Hash(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `eql`: value equality for numbers/characters, identity otherwise.
    pub fn eql(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Character(a), Value::Character(b)) => a == b,
            _ => self.eq(other),
        }
    }

    /// Walks a proper list into a `Vec<Value>`. Returns `None` if the list
    /// is improper (a non-nil, non-cons terminator) — callers decide
    /// whether that's an error for their operation ("Cons cell").
    pub fn list_to_vec(&self) -> Option<Vec<Value>> {
        let mut out = Vec::new();
        let mut cur = self.clone();
        loop {
            match cur {
                Value::Nil => return Some(out),
                Value::Cons(ref cell) => {
                    let cell = crate::lazy::force_if_lazy(cell);
                    let (car, cdr, still_thunked) = {
                        let b = cell.borrow();
                        (b.car.clone(), b.cdr.clone(), b.thunk.is_some())
                    };
                    if still_thunked {
                        // A `generate`-backed cell: resolving its tail
                        // requires calling back into the interpreter, which
                        // this pure helper cannot do. Callers that may
                        // encounter lazily-generated lists use
                        // `Interp::materialize_list` instead.
                        return None;
                    }
                    out.push(car);
                    cur = cdr;
                }
                _ => return None,
            }
        }
    }

    pub fn vec_to_list(items: impl DoubleEndedIterator<Item = Value>) -> Value {
        let mut out = Value::Nil;
        for item in items.rev() {
            out = Value::cons(item, out);
        }
        out
    }

    /// The string key used to index `HashTable` from `make-hash`/
    /// `gethash`/`sethash`. Keyed by `equal`-based printed form so that
    /// structurally-equal keys (two distinct but `equal` lists, say) collide
    /// the way `equal`-based hash tables are documented to behave; `eql`-
    /// based tables key on `eq`/number/character identity instead, handled
    /// by callers checking `HashTable.equal_based` before choosing which
    /// key function to use (see `builtins/hashes.rs`).
    pub fn key_string(&self) -> String {
        match self {
            Value::Symbol(s) => format!("sym:{}:{}", s.package, s.name),
            other => format!("val:{other}"),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "null",
            Value::T => "symbol",
            Value::Integer(_) => "integer",
            Value::Character(_) => "character",
            Value::Str(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Cons(_) => "cons",
            Value::Vector(_) => "vector",
            Value::Hash(_) => "hash",
            Value::Function(_) => "function",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::T => write!(f, "t"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Character(c) => write!(f, "#\\{c}"),
            Value::Str(s) => write!(f, "\"{}\"", s.borrow()),
            Value::Symbol(s) => {
                if s.package == crate::package::KEYWORD_PACKAGE {
                    write!(f, ":{}", s.name)
                } else {
                    write!(f, "{}", s.name)
                }
            }
            Value::Cons(_) => {
                write!(f, "(")?;
                let mut first = true;
                let mut cur = self.clone();
                loop {
                    match cur {
                        Value::Cons(ref cell) => {
                            if !first {
                                write!(f, " ")?;
                            }
                            first = false;
                            let (car, cdr) = {
                                let b = cell.borrow();
                                (b.car.clone(), b.cdr.clone())
                            };
                            write!(f, "{car}")?;
                            cur = cdr;
                        }
                        Value::Nil => break,
                        other => {
                            write!(f, " . {other}")?;
                            break;
                        }
                    }
                }
                write!(f, ")")
            }
            Value::Vector(v) => {
                write!(f, "#(")?;
                for (i, item) in v.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Value::Hash(_) => write!(f, "#<hash>"),
            Value::Function(func) => match func.as_ref() {
                FunctionData::Interpreted { name, .. } => {
                    write!(f, "#<function {}>", name.as_deref().unwrap_or("lambda"))
                }
                FunctionData::Builtin { name, .. } => write!(f, "#<builtin {name}>"),
            },
        }
    }
}

#[allow(dead_code)]
fn assert_package_in_scope(_: &Package) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Packages;

    fn sym(name: &str) -> Value {
        let mut pkgs = Packages::new();
        Value::Symbol(pkgs.intern(name, None))
    }

    #[test]
    fn nil_is_falsy_and_empty_list() {
        assert!(!Value::Nil.is_truthy());
        assert_eq!(Value::Nil.list_to_vec().map(|v| v.len()), Some(0));
    }

    #[test]
    fn list_round_trip() {
        let items = vec![Value::int(1), Value::int(2), Value::int(3)];
        let list = Value::vec_to_list(items.into_iter());
        let back = list.list_to_vec().unwrap();
        assert_eq!(back.len(), 3);
        assert!(back[0].equal(&Value::int(1)));
        assert!(back[2].equal(&Value::int(3)));
    }

    #[test]
    fn equal_is_structural_eq_is_identity() {
        let a = Value::cons(Value::int(1), Value::Nil);
        let b = Value::cons(Value::int(1), Value::Nil);
        assert!(a.equal(&b));
        assert!(!a.eq(&b));
        assert!(a.eq(&a.clone()));
    }

    #[test]
    fn symbols_self_equal() {
        let a = sym("foo");
        assert!(a.equal(&a.clone()));
    }
}
