// ABOUTME: Environment module for chained lexical frames and variable/function bindings

//! Chained lexical frames and the top-level binding tables.
//!
//! Each frame holds two namespaces — variables and functions — backing
//! the Lisp-1/Lisp-2 dual lookup split between `eval` and `eval_lisp1`.
//! The root frame (no parent) doubles as the two global hash tables;
//! there is no separate top-level struct because a parentless
//! frame already has exactly their shape.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub struct Environment {
    vars: RefCell<HashMap<String, Value>>,
    funcs: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("vars", &self.vars.borrow().len())
            .field("funcs", &self.funcs.borrow().len())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

impl Environment {
    /// Creates a new top-level environment with no parent. Its two maps
    /// play the role of the two global hash tables.
    pub fn new_top_level() -> Rc<Self> {
        Rc::new(Environment {
            vars: RefCell::new(HashMap::new()),
            funcs: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a new child frame, as `let`/`lambda`-application/`each`/
    /// `for`/`dohash`/`catch` do on entry.
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            vars: RefCell::new(HashMap::new()),
            funcs: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }

    // ---- variable namespace ----

    pub fn define_var(&self, name: &str, value: Value) {
        self.vars.borrow_mut().insert(name.to_string(), value);
    }

    pub fn get_var(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.vars.borrow().get(name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get_var(name))
    }

    /// Finds the frame in which `name` is bound as a variable, walking
    /// parents. Used by the place engine to resolve a variable place
    /// without re-walking on every subsequent read/write.
    pub fn frame_defining_var(self: &Rc<Self>, name: &str) -> Option<Rc<Environment>> {
        if self.vars.borrow().contains_key(name) {
            return Some(Rc::clone(self));
        }
        self.parent.as_ref().and_then(|p| p.frame_defining_var(name))
    }

    /// Updates an existing variable binding in the frame that defines it
    /// ("re-defining it replaces the value in place, same cell").
    /// Returns `false` if unbound anywhere on the chain.
    pub fn set_var(&self, name: &str, value: Value) -> bool {
        if self.vars.borrow().contains_key(name) {
            self.vars.borrow_mut().insert(name.to_string(), value);
            return true;
        }
        match &self.parent {
            Some(p) => p.set_var(name, value),
            None => false,
        }
    }

    // ---- function namespace ----

    pub fn define_fn(&self, name: &str, value: Value) {
        self.funcs.borrow_mut().insert(name.to_string(), value);
    }

    pub fn get_fn(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.funcs.borrow().get(name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get_fn(name))
    }

    /// Lisp-1-style unified lookup used by `dwim` ("must find `f`
    /// whether it was bound as a variable or a function"): prefers a
    /// function binding, falling back to a variable binding.
    pub fn get_unified(&self, name: &str) -> Option<Value> {
        self.get_fn(name).or_else(|| self.get_var(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get_var() {
        let env = Environment::new_top_level();
        env.define_var("x", Value::int(42));
        assert!(env.get_var("x").unwrap().eql(&Value::int(42)));
    }

    #[test]
    fn undefined_var_is_none() {
        let env = Environment::new_top_level();
        assert!(env.get_var("nope").is_none());
    }

    #[test]
    fn child_shadows_parent() {
        let parent = Environment::new_top_level();
        parent.define_var("x", Value::int(1));
        let child = Environment::with_parent(parent);
        child.define_var("x", Value::int(2));
        assert!(child.get_var("x").unwrap().eql(&Value::int(2)));
    }

    #[test]
    fn child_sees_parent_binding() {
        let parent = Environment::new_top_level();
        parent.define_var("x", Value::int(1));
        let child = Environment::with_parent(parent);
        assert!(child.get_var("x").unwrap().eql(&Value::int(1)));
    }

    #[test]
    fn set_var_mutates_defining_frame() {
        let parent = Environment::new_top_level();
        parent.define_var("x", Value::int(1));
        let child = Environment::with_parent(parent.clone());
        assert!(child.set_var("x", Value::int(99)));
        assert!(parent.get_var("x").unwrap().eql(&Value::int(99)));
    }

    #[test]
    fn set_var_fails_when_unbound() {
        let env = Environment::new_top_level();
        assert!(!env.set_var("nope", Value::int(1)));
    }

    #[test]
    fn variables_and_functions_are_separate_namespaces() {
        let env = Environment::new_top_level();
        env.define_var("f", Value::int(1));
        assert!(env.get_fn("f").is_none());
        assert!(env.get_var("f").is_some());
    }

    #[test]
    fn multi_level_chain() {
        let grandparent = Environment::new_top_level();
        grandparent.define_var("a", Value::int(1));
        let parent = Environment::with_parent(grandparent);
        parent.define_var("b", Value::int(2));
        let child = Environment::with_parent(parent);
        child.define_var("c", Value::int(3));

        assert!(child.get_var("a").unwrap().eql(&Value::int(1)));
        assert!(child.get_var("b").unwrap().eql(&Value::int(2)));
        assert!(child.get_var("c").unwrap().eql(&Value::int(3)));
    }
}
