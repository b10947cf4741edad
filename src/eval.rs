// ABOUTME: Evaluator module for executing parsed Lisp expressions

//! The tree-walking evaluator and `apply`. There is no user-macro
//! registry or macro-expansion trampoline here: all surface sugar is
//! removed earlier, by `expand.rs`, not at eval time, so this is a
//! straight recursive walk over kernel forms — one match arm per
//! head symbol, args sliced off `items[1..]`.

use std::rc::Rc;

use crate::env::Environment;
use crate::error::{Unwind, TAG_EVAL_ERROR, TAG_TYPE_ERROR};
use crate::interp::Interp;
use crate::value::{Arity, FunctionData, ParamList, Value};

fn eval_err(interp: &mut Interp, message: impl Into<String>) -> Unwind {
    interp.make_error(TAG_EVAL_ERROR, message)
}

fn type_err(interp: &mut Interp, message: impl Into<String>) -> Unwind {
    interp.make_error(TAG_TYPE_ERROR, message)
}

/// `eval(form, env)`.
pub fn eval(interp: &mut Interp, form: &Value, env: &Rc<Environment>) -> Result<Value, Unwind> {
    match form {
        Value::Nil => Ok(Value::Nil),
        Value::Symbol(s) => {
            if form.is_bindable_symbol() {
                env.get_var(&s.name)
                    .ok_or_else(|| eval_err(interp, format!("unbound variable: {}", s.name)))
            } else {
                Ok(form.clone())
            }
        }
        Value::Cons(_) => eval_compound(interp, form, env),
        _ => Ok(form.clone()),
    }
}

/// Unified variable-or-function lookup ("A second entry point
/// `eval_lisp1` ... used by `dwim` forms, where `[f x y]` must find `f`
/// whether it was bound as a variable or a function").
pub fn eval_lisp1(interp: &mut Interp, form: &Value, env: &Rc<Environment>) -> Result<Value, Unwind> {
    if let Value::Symbol(s) = form {
        if form.is_bindable_symbol() {
            return env
                .get_unified(&s.name)
                .ok_or_else(|| eval_err(interp, format!("unbound variable or function: {}", s.name)));
        }
    }
    eval(interp, form, env)
}

fn eval_progn(interp: &mut Interp, forms: &[Value], env: &Rc<Environment>) -> Result<Value, Unwind> {
    let mut result = Value::Nil;
    for f in forms {
        result = eval(interp, f, env)?;
    }
    Ok(result)
}

/// Splits a cons form into `(head, middle-items, tail)`, where `tail` is
/// `Nil` for a proper list and the terminating non-cons value otherwise.
/// Ordinary function-call and special forms are always proper; only `dwim`
/// (via `op`'s expansion, see `expand.rs::expand_op`) produces a dotted
/// spine, to splice a trailing argument list in `apply`-style.
fn cons_spine(form: &Value) -> (Value, Vec<Value>, Value) {
    let cell = form.as_cons().expect("cons_spine: not a cons");
    let head = cell.borrow().car.clone();
    let mut items = Vec::new();
    let mut cur = cell.borrow().cdr.clone();
    loop {
        match cur {
            Value::Cons(ref c) => {
                let (car, cdr) = {
                    let b = c.borrow();
                    (b.car.clone(), b.cdr.clone())
                };
                items.push(car);
                cur = cdr;
            }
            other => return (head, items, other),
        }
    }
}

fn eval_compound(interp: &mut Interp, form: &Value, env: &Rc<Environment>) -> Result<Value, Unwind> {
    let (head, rest, tail) = cons_spine(form);
    let head_name = head.as_symbol().map(|s| s.name.clone());

    if head_name.as_deref() == Some("dwim") {
        return eval_dwim(interp, &rest, &tail, env);
    }

    if !tail.is_nil() {
        return Err(eval_err(interp, "improper list in form"));
    }

    if let Some(name) = head_name.as_deref() {
        if is_special_form(name) {
            return eval_special(interp, name, &rest, env);
        }
    }

    let fun = if head.is_bindable_symbol() {
        let name = head.as_symbol().unwrap().name.clone();
        env.get_fn(&name)
            .ok_or_else(|| eval_err(interp, format!("unbound function: {name}")))?
    } else {
        eval(interp, &head, env)?
    };
    let mut args = Vec::with_capacity(rest.len());
    for a in &rest {
        args.push(eval(interp, a, env)?);
    }
    apply(interp, &fun, &args)
}

fn is_special_form(name: &str) -> bool {
    matches!(
        name,
        "quote" | "progn" | "prog1" | "let" | "let*" | "lambda" | "call" | "fun" | "if" | "cond"
            | "and" | "or" | "defvar" | "defun" | "block" | "return-from" | "return"
            | "unwind-protect" | "catch" | "for" | "for*" | "each" | "each*" | "collect-each"
            | "collect-each*" | "dohash" | "set" | "inc" | "dec" | "push" | "pop" | "flip" | "del"
            | "quasi"
    )
}

fn eval_dwim(interp: &mut Interp, rest: &[Value], tail: &Value, env: &Rc<Environment>) -> Result<Value, Unwind> {
    if rest.is_empty() {
        return Err(eval_err(interp, "dwim: missing target"));
    }
    let obj = eval_lisp1(interp, &rest[0], env)?;
    if let Value::Function(_) = &obj {
        let mut call_args = Vec::with_capacity(rest.len() - 1);
        for a in &rest[1..] {
            call_args.push(eval(interp, a, env)?);
        }
        if !tail.is_nil() {
            let tail_val = eval(interp, tail, env)?;
            let extra = tail_val
                .list_to_vec()
                .ok_or_else(|| eval_err(interp, "dwim: dotted tail did not evaluate to a list"))?;
            call_args.extend(extra);
        }
        apply(interp, &obj, &call_args)
    } else {
        if !tail.is_nil() {
            return Err(eval_err(interp, "dwim: dotted argument list only valid against a function"));
        }
        let idx_form = rest.get(1).cloned().unwrap_or(Value::Nil);
        let loc = crate::place::resolve_dwim_on(interp, &rest[0], obj, &idx_form, env)?;
        crate::place::get_loc(interp, &loc)
    }
}

fn eval_special(interp: &mut Interp, name: &str, items: &[Value], env: &Rc<Environment>) -> Result<Value, Unwind> {
    match name {
        "quote" => Ok(items.first().cloned().unwrap_or(Value::Nil)),
        "progn" => eval_progn(interp, items, env),
        "prog1" => {
            let first = items.first().map(|f| eval(interp, f, env)).transpose()?.unwrap_or(Value::Nil);
            for f in &items[1.min(items.len())..] {
                eval(interp, f, env)?;
            }
            Ok(first)
        }
        "let" => eval_let(interp, items, env, false),
        "let*" => eval_let(interp, items, env, true),
        "lambda" => {
            let params = crate::eval::parse_param_list(interp, items.first().unwrap_or(&Value::Nil))?;
            let body = items[1.min(items.len())..].to_vec();
            Ok(Value::Function(Rc::new(FunctionData::Interpreted {
                name: None,
                params,
                body,
                env: Rc::clone(env),
            })))
        }
        "call" => {
            let f = eval(interp, items.first().unwrap_or(&Value::Nil), env)?;
            let mut args = Vec::with_capacity(items.len().saturating_sub(1));
            for a in &items[1.min(items.len())..] {
                args.push(eval(interp, a, env)?);
            }
            apply(interp, &f, &args)
        }
        "fun" => {
            let sym = items.first().ok_or_else(|| eval_err(interp, "fun: missing symbol"))?;
            let sname = sym
                .as_symbol()
                .ok_or_else(|| eval_err(interp, "fun: not a symbol"))?
                .name
                .clone();
            env.get_fn(&sname).ok_or_else(|| eval_err(interp, format!("unbound function: {sname}")))
        }
        "if" => {
            let test = eval(interp, items.first().unwrap_or(&Value::Nil), env)?;
            if test.is_truthy() {
                eval(interp, items.get(1).unwrap_or(&Value::Nil), env)
            } else if let Some(else_form) = items.get(2) {
                eval(interp, else_form, env)
            } else {
                Ok(Value::Nil)
            }
        }
        "cond" => {
            for clause in items {
                let parts = clause.list_to_vec().ok_or_else(|| eval_err(interp, "cond: malformed clause"))?;
                if parts.is_empty() {
                    continue;
                }
                let test = eval(interp, &parts[0], env)?;
                if test.is_truthy() {
                    if parts.len() == 1 {
                        return Ok(test);
                    }
                    return eval_progn(interp, &parts[1..], env);
                }
            }
            Ok(Value::Nil)
        }
        "and" => {
            let mut result = Value::T;
            for f in items {
                result = eval(interp, f, env)?;
                if !result.is_truthy() {
                    return Ok(Value::Nil);
                }
            }
            Ok(result)
        }
        "or" => {
            for f in items {
                let v = eval(interp, f, env)?;
                if v.is_truthy() {
                    return Ok(v);
                }
            }
            Ok(Value::Nil)
        }
        "defvar" => {
            let sym = items.first().ok_or_else(|| eval_err(interp, "defvar: missing symbol"))?;
            let sname = sym
                .as_symbol()
                .ok_or_else(|| eval_err(interp, "defvar: not a symbol"))?
                .name
                .clone();
            let value = eval(interp, items.get(1).unwrap_or(&Value::Nil), env)?;
            interp.global_env.define_var(&sname, value.clone());
            Ok(value)
        }
        "defun" => eval_defun(interp, items, env),
        "block" => eval_block(interp, items, env),
        "return-from" => {
            let sym = items.first().ok_or_else(|| eval_err(interp, "return-from: missing block name"))?;
            let name = sym
                .as_symbol()
                .cloned()
                .ok_or_else(|| eval_err(interp, "return-from: not a symbol"))?;
            let value = eval(interp, items.get(1).unwrap_or(&Value::Nil), env)?;
            Err(Unwind::ReturnFrom { name: Some(name), value })
        }
        "return" => {
            let value = eval(interp, items.first().unwrap_or(&Value::Nil), env)?;
            Err(Unwind::ReturnFrom { name: None, value })
        }
        "unwind-protect" => {
            let prot_result = eval(interp, items.first().unwrap_or(&Value::Nil), env);
            let cleanup_result = eval_progn(interp, &items[1.min(items.len())..], env);
            match cleanup_result {
                Err(e) => Err(e),
                Ok(_) => prot_result,
            }
        }
        "catch" => eval_catch(interp, items, env),
        "for" => eval_for(interp, items, env, false),
        "for*" => eval_for(interp, items, env, true),
        "each" => eval_each(interp, items, env, false, false),
        "each*" => eval_each(interp, items, env, true, false),
        "collect-each" => eval_each(interp, items, env, false, true),
        "collect-each*" => eval_each(interp, items, env, true, true),
        "dohash" => eval_dohash(interp, items, env),
        "set" => {
            let loc = crate::place::resolve_place(interp, items.first().unwrap_or(&Value::Nil), env)?;
            let v = eval(interp, items.get(1).unwrap_or(&Value::Nil), env)?;
            crate::place::set_loc(interp, &loc, v)
        }
        "inc" => {
            let loc = crate::place::resolve_place(interp, items.first().unwrap_or(&Value::Nil), env)?;
            let delta = match items.get(1) {
                Some(f) => eval(interp, f, env)?.as_int().ok_or_else(|| type_err(interp, "inc: delta not a number"))?,
                None => 1,
            };
            crate::place::inc_loc(interp, &loc, delta)
        }
        "dec" => {
            let loc = crate::place::resolve_place(interp, items.first().unwrap_or(&Value::Nil), env)?;
            let delta = match items.get(1) {
                Some(f) => eval(interp, f, env)?.as_int().ok_or_else(|| type_err(interp, "dec: delta not a number"))?,
                None => 1,
            };
            crate::place::dec_loc(interp, &loc, delta)
        }
        "push" => {
            // value first, place second, per `eval.c`'s
            // `op_modplace` dispatch table entry for `push_s`.
            let value = eval(interp, items.first().unwrap_or(&Value::Nil), env)?;
            let loc = crate::place::resolve_place(interp, items.get(1).unwrap_or(&Value::Nil), env)?;
            crate::place::push_loc(interp, &loc, value)
        }
        "pop" => {
            let loc = crate::place::resolve_place(interp, items.first().unwrap_or(&Value::Nil), env)?;
            crate::place::pop_loc(interp, &loc)
        }
        "flip" => {
            let loc = crate::place::resolve_place(interp, items.first().unwrap_or(&Value::Nil), env)?;
            crate::place::flip_loc(interp, &loc)
        }
        "del" => {
            let loc = crate::place::resolve_place(interp, items.first().unwrap_or(&Value::Nil), env)?;
            crate::place::del_loc(interp, &loc)
        }
        "quasi" => eval_quasi(interp, items, env),
        other => Err(eval_err(interp, format!("unknown special form: {other}"))),
    }
}

fn eval_let(interp: &mut Interp, items: &[Value], env: &Rc<Environment>, sequential: bool) -> Result<Value, Unwind> {
    let bindings = items.first().cloned().unwrap_or(Value::Nil);
    let binding_list = bindings.list_to_vec().ok_or_else(|| eval_err(interp, "let: malformed bindings"))?;
    let body = &items[1.min(items.len())..];

    if sequential {
        let child = Environment::with_parent(Rc::clone(env));
        for b in &binding_list {
            let (name, init) = parse_binding(interp, b)?;
            let value = eval(interp, &init, &child)?;
            child.define_var(&name, value);
        }
        eval_progn(interp, body, &child)
    } else {
        let mut evaluated = Vec::with_capacity(binding_list.len());
        for b in &binding_list {
            let (name, init) = parse_binding(interp, b)?;
            let value = eval(interp, &init, env)?;
            evaluated.push((name, value));
        }
        let child = Environment::with_parent(Rc::clone(env));
        for (name, value) in evaluated {
            child.define_var(&name, value);
        }
        eval_progn(interp, body, &child)
    }
}

fn parse_binding(interp: &mut Interp, b: &Value) -> Result<(String, Value), Unwind> {
    if let Some(s) = b.as_symbol() {
        return Ok((s.name.clone(), Value::Nil));
    }
    let parts = b.list_to_vec().ok_or_else(|| eval_err(interp, "let: malformed binding"))?;
    let name = parts
        .first()
        .and_then(|v| v.as_symbol())
        .ok_or_else(|| eval_err(interp, "let: binding target not a symbol"))?
        .name
        .clone();
    let init = parts.get(1).cloned().unwrap_or(Value::Nil);
    Ok((name, init))
}

fn eval_defun(interp: &mut Interp, items: &[Value], env: &Rc<Environment>) -> Result<Value, Unwind> {
    let name_sym = items.first().ok_or_else(|| eval_err(interp, "defun: missing name"))?;
    let name = name_sym
        .as_symbol()
        .ok_or_else(|| eval_err(interp, "defun: not a symbol"))?
        .name
        .clone();
    let params = crate::eval::parse_param_list(interp, items.get(1).unwrap_or(&Value::Nil))?;
    let body = items[2.min(items.len())..].to_vec();

    // Wrap the body in an implicit `(block name body…)`, built
    // as a synthetic kernel form so `block`/`return-from` stay the single
    // mechanism for exiting named functions.
    let block_sym = interp.intern("block", None);
    let mut block_form_items = vec![block_sym, name_sym.clone()];
    block_form_items.extend(body);
    let wrapped_body = vec![Value::vec_to_list(block_form_items.into_iter())];

    let func = Value::Function(Rc::new(FunctionData::Interpreted {
        name: Some(name.clone()),
        params,
        body: wrapped_body,
        env: Rc::clone(env),
    }));
    interp.global_env.define_fn(&name, func.clone());
    Ok(func)
}

fn eval_block(interp: &mut Interp, items: &[Value], env: &Rc<Environment>) -> Result<Value, Unwind> {
    let name_form = items.first().cloned().unwrap_or(Value::Nil);
    let block_name = match &name_form {
        Value::Nil => None,
        other => other.as_symbol().map(|s| s.name.clone()),
    };
    interp.block_stack.push(block_name.clone());
    let result = eval_progn(interp, &items[1.min(items.len())..], env);
    interp.block_stack.pop();
    match result {
        Err(Unwind::ReturnFrom { name, value }) => {
            let matches = match (&name, &block_name) {
                (None, _) => true,
                (Some(n), Some(b)) => n.name == *b,
                (Some(_), None) => false,
            };
            if matches {
                Ok(value)
            } else {
                Err(Unwind::ReturnFrom { name, value })
            }
        }
        other => other,
    }
}

fn eval_catch(interp: &mut Interp, items: &[Value], env: &Rc<Environment>) -> Result<Value, Unwind> {
    // kernel shape: (catch (tags…) try-form (tag params body…) …). The
    // lifted tag list is informational only (produced by `expand.rs` for
    // documentation/possible fast-path use); runtime dispatch matches by
    // each clause's own tag via the subtype taxonomy, so `tags` itself is
    // not consulted here.
    let try_form = items.get(1).cloned().unwrap_or(Value::Nil);
    let clauses = &items[2.min(items.len())..];
    match eval(interp, &try_form, env) {
        Ok(v) => Ok(v),
        Err(Unwind::Throw { tag, arg, loc }) => {
            for clause in clauses {
                let parts = clause.list_to_vec().ok_or_else(|| eval_err(interp, "catch: malformed clause"))?;
                if parts.len() < 2 {
                    continue;
                }
                let clause_tag = match parts[0].as_symbol() {
                    Some(s) => s.name.clone(),
                    None => continue,
                };
                if interp.is_subtype(&tag.name, &clause_tag) {
                    let arg_list = match &arg {
                        Value::Cons(_) | Value::Nil => arg.clone(),
                        other => Value::cons(other.clone(), Value::Nil),
                    };
                    let param_list = crate::eval::parse_param_list(interp, &parts[1])?;
                    let arg_values = arg_list.list_to_vec().unwrap_or_default();
                    let clause_env = Environment::with_parent(Rc::clone(env));
                    bind_params(interp, &param_list, &arg_values, &clause_env)?;
                    return eval_progn(interp, &parts[2..], &clause_env);
                }
            }
            Err(Unwind::Throw { tag, arg, loc })
        }
        other => other,
    }
}

fn eval_for(interp: &mut Interp, items: &[Value], env: &Rc<Environment>, sequential: bool) -> Result<Value, Unwind> {
    let var_bindings = items.first().cloned().unwrap_or(Value::Nil);
    let binding_list = var_bindings.list_to_vec().ok_or_else(|| eval_err(interp, "for: malformed bindings"))?;
    let test_result = items.get(1).cloned().unwrap_or(Value::Nil);
    let test_result_parts = test_result.list_to_vec().ok_or_else(|| eval_err(interp, "for: malformed test/result"))?;
    let test_form = test_result_parts.first().cloned().unwrap_or(Value::T);
    let result_forms = &test_result_parts[1.min(test_result_parts.len())..];
    let inc_form = items.get(2).cloned().unwrap_or(Value::Nil);
    let inc_forms = inc_form.list_to_vec().ok_or_else(|| eval_err(interp, "for: malformed increment"))?;
    let body = &items[3.min(items.len())..];

    let loop_env = Environment::with_parent(Rc::clone(env));
    if sequential {
        for b in &binding_list {
            let (name, init) = parse_binding(interp, b)?;
            let value = eval(interp, &init, &loop_env)?;
            loop_env.define_var(&name, value);
        }
    } else {
        let mut evaluated = Vec::with_capacity(binding_list.len());
        for b in &binding_list {
            let (name, init) = parse_binding(interp, b)?;
            evaluated.push((name, eval(interp, &init, env)?));
        }
        for (name, value) in evaluated {
            loop_env.define_var(&name, value);
        }
    }

    interp.block_stack.push(None);
    let loop_result = (|| -> Result<Value, Unwind> {
        while eval(interp, &test_form, &loop_env)?.is_truthy() {
            eval_progn(interp, body, &loop_env)?;
            eval_progn(interp, &inc_forms, &loop_env)?;
        }
        eval_progn(interp, result_forms, &loop_env)
    })();
    interp.block_stack.pop();
    match loop_result {
        Err(Unwind::ReturnFrom { name: None, value }) => Ok(value),
        other => other,
    }
}

fn eval_each(
    interp: &mut Interp,
    items: &[Value],
    env: &Rc<Environment>,
    sequential: bool,
    collect: bool,
) -> Result<Value, Unwind> {
    let bindings = items.first().cloned().unwrap_or(Value::Nil);
    let binding_list = bindings.list_to_vec().ok_or_else(|| eval_err(interp, "each: malformed bindings"))?;
    let body = &items[1.min(items.len())..];

    let mut names = Vec::with_capacity(binding_list.len());
    let mut lists = Vec::with_capacity(binding_list.len());

    // `each*`/`collect-each*` bind sequentially: each list-init form is
    // evaluated with the names bound so far already visible, so a later
    // init can refer to an earlier variable's value. `each`/`collect-each`
    // evaluate every list-init against the outer `env` unchanged.
    let init_env = if sequential { Environment::with_parent(Rc::clone(env)) } else { Rc::clone(env) };
    for b in &binding_list {
        let parts = b.list_to_vec().ok_or_else(|| eval_err(interp, "each: malformed binding"))?;
        let name = parts
            .first()
            .and_then(|v| v.as_symbol())
            .ok_or_else(|| eval_err(interp, "each: binding target not a symbol"))?
            .name
            .clone();
        let list_form = parts.get(1).cloned().unwrap_or(Value::Nil);
        let list_val = eval(interp, &list_form, &init_env)?;
        if sequential {
            init_env.define_var(&name, list_val.clone());
        }
        names.push(name);
        lists.push(interp.materialize_list(&list_val)?);
    }
    let iterations = lists.iter().map(|l| l.len()).min().unwrap_or(0);

    let mut collected = Vec::new();
    interp.block_stack.push(None);
    let run = (|| -> Result<(), Unwind> {
        for i in 0..iterations {
            let iter_env = Environment::with_parent(Rc::clone(env));
            for (name, list) in names.iter().zip(lists.iter()) {
                iter_env.define_var(name, list[i].clone());
            }
            let v = eval_progn(interp, body, &iter_env)?;
            if collect {
                collected.push(v);
            }
        }
        Ok(())
    })();
    interp.block_stack.pop();
    match run {
        Ok(()) => Ok(if collect { Value::vec_to_list(collected.into_iter()) } else { Value::Nil }),
        Err(Unwind::ReturnFrom { name: None, value }) => Ok(value),
        Err(other) => Err(other),
    }
}

fn eval_dohash(interp: &mut Interp, items: &[Value], env: &Rc<Environment>) -> Result<Value, Unwind> {
    let spec = items.first().cloned().unwrap_or(Value::Nil);
    let parts = spec.list_to_vec().ok_or_else(|| eval_err(interp, "dohash: malformed binding spec"))?;
    let k_name = parts
        .first()
        .and_then(|v| v.as_symbol())
        .ok_or_else(|| eval_err(interp, "dohash: key var not a symbol"))?
        .name
        .clone();
    let v_name = parts
        .get(1)
        .and_then(|v| v.as_symbol())
        .ok_or_else(|| eval_err(interp, "dohash: value var not a symbol"))?
        .name
        .clone();
    let hash_form = parts.get(2).cloned().unwrap_or(Value::Nil);
    let result_form = parts.get(3).cloned().unwrap_or(Value::Nil);
    let body = &items[1.min(items.len())..];

    let hash_val = eval(interp, &hash_form, env)?;
    let hash = match hash_val {
        Value::Hash(h) => h,
        _ => return Err(type_err(interp, "dohash: not a hash")),
    };
    let entries: Vec<(Value, Value)> = hash.borrow().entries.values().cloned().collect();

    let loop_env = Environment::with_parent(Rc::clone(env));
    loop_env.define_var(&k_name, Value::Nil);
    loop_env.define_var(&v_name, Value::Nil);
    for (k, v) in entries {
        loop_env.define_var(&k_name, k);
        loop_env.define_var(&v_name, v);
        eval_progn(interp, body, &loop_env)?;
    }
    eval(interp, &result_form, &loop_env)
}

/// `quasi segments…` string interpolation. Each segment is a literal
/// string, a `(var sym)` reference, or a general embedded expression;
/// non-string results are stringified with their printed representation.
fn eval_quasi(interp: &mut Interp, items: &[Value], env: &Rc<Environment>) -> Result<Value, Unwind> {
    let mut out = String::new();
    for segment in items {
        match segment {
            Value::Str(s) => out.push_str(&s.borrow()),
            _ => {
                let parts = segment.list_to_vec();
                let value = match parts.as_deref() {
                    Some([head, rest @ ..]) if head.as_symbol().map(|s| s.name.as_str()) == Some("var") => {
                        eval(interp, rest.first().unwrap_or(&Value::Nil), env)?
                    }
                    _ => eval(interp, segment, env)?,
                };
                out.push_str(&stringify_for_quasi(&value));
            }
        }
    }
    Ok(Value::string(out))
}

fn stringify_for_quasi(v: &Value) -> String {
    match v {
        Value::Str(s) => s.borrow().clone(),
        other => other.to_string(),
    }
}

/// `apply(fun, args)`. A symbol `fun` is coerced by resolving its
/// top-level function binding (`apply` has no lexical environment of its
/// own — it takes only `fun`/`args`, unlike `eval`).
pub fn apply(interp: &mut Interp, fun: &Value, args: &[Value]) -> Result<Value, Unwind> {
    let resolved = if let Value::Symbol(s) = fun {
        interp
            .global_env
            .get_fn(&s.name)
            .ok_or_else(|| eval_err(interp, format!("unbound function: {}", s.name)))?
    } else {
        fun.clone()
    };
    match &resolved {
        Value::Function(fdata) => match fdata.as_ref() {
            FunctionData::Builtin { name, arity, func } => {
                check_arity(interp, name, arity, args.len())?;
                func(interp, args)
            }
            FunctionData::Interpreted { name, params, body, env } => {
                let call_env = Environment::with_parent(Rc::clone(env));
                bind_params(interp, params, args, &call_env)
                    .map_err(|e| annotate_arity_error(e, name.as_deref()))?;
                eval_progn(interp, body, &call_env)
            }
        },
        _ => Err(type_err(interp, format!("not a function: {resolved}"))),
    }
}

fn annotate_arity_error(e: Unwind, _name: Option<&str>) -> Unwind {
    e
}

fn check_arity(interp: &mut Interp, name: &str, arity: &Arity, got: usize) -> Result<(), Unwind> {
    if got < arity.required {
        return Err(eval_err(interp, format!("{name}: too few arguments ({got} < {})", arity.required)));
    }
    if !arity.rest && got > arity.required + arity.optional {
        return Err(eval_err(
            interp,
            format!("{name}: too many arguments ({got} > {})", arity.required + arity.optional),
        ));
    }
    Ok(())
}

fn bind_params(interp: &mut Interp, params: &ParamList, args: &[Value], env: &Rc<Environment>) -> Result<(), Unwind> {
    let req = params.required.len();
    let opt = params.optional.len();
    if args.len() < req {
        return Err(eval_err(interp, format!("too few arguments ({} < {req})", args.len())));
    }
    if params.rest.is_none() && args.len() > req + opt {
        return Err(eval_err(interp, format!("too many arguments ({} > {})", args.len(), req + opt)));
    }
    let mut idx = 0;
    for p in &params.required {
        env.define_var(&p.name, args[idx].clone());
        idx += 1;
    }
    for p in &params.optional {
        let v = if idx < args.len() { args[idx].clone() } else { Value::Nil };
        env.define_var(&p.name, v);
        idx += 1;
    }
    if let Some(rest_sym) = &params.rest {
        let rest_list = Value::vec_to_list(args[idx.min(args.len())..].iter().cloned());
        env.define_var(&rest_sym.name, rest_list);
    }
    Ok(())
}

/// Parses a (possibly improper) parameter list: required symbols, then
/// optionals after a bare `:` marker, then an optional dotted rest symbol
/// ("Parameter binding").
pub fn parse_param_list(interp: &mut Interp, form: &Value) -> Result<ParamList, Unwind> {
    let mut required = Vec::new();
    let mut optional = Vec::new();
    let mut rest = None;
    let mut in_optional = false;
    let mut cur = form.clone();
    loop {
        match cur.clone() {
            Value::Nil => break,
            Value::Cons(cell) => {
                let (car, cdr) = {
                    let b = cell.borrow();
                    (b.car.clone(), b.cdr.clone())
                };
                match &car {
                    Value::Symbol(s) if s.name == ":" => {
                        if in_optional {
                            return Err(eval_err(interp, "parameter list: ':' used more than once"));
                        }
                        in_optional = true;
                    }
                    _ => {
                        if !car.is_bindable_symbol() {
                            return Err(eval_err(interp, format!("parameter list: not a bindable symbol: {car}")));
                        }
                        let sym = car.as_symbol().unwrap().clone();
                        if in_optional {
                            optional.push(sym);
                        } else {
                            required.push(sym);
                        }
                    }
                }
                cur = cdr;
            }
            Value::Symbol(_) if cur.is_bindable_symbol() => {
                rest = cur.as_symbol().cloned();
                break;
            }
            other => {
                return Err(eval_err(interp, format!("parameter list: malformed tail: {other}")));
            }
        }
    }
    Ok(ParamList { required, optional, rest })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(interp: &mut Interp, src: &str) -> Value {
        let form = interp.read_one(src).unwrap();
        let expanded = interp.expand(&form).unwrap();
        let env = interp.global_env();
        interp.eval(&expanded, &env).unwrap()
    }

    #[test]
    fn let_binds_and_adds() {
        let mut interp = Interp::new();
        let v = run(&mut interp, "(let ((x 1) (y 2)) (+ x y))");
        assert!(v.eql(&Value::int(3)));
    }

    #[test]
    fn defun_and_optional_param() {
        let mut interp = Interp::new();
        run(&mut interp, "(defun f (a : b) (list a b))");
        let v1 = run(&mut interp, "(f 1)");
        assert!(v1.equal(&Value::vec_to_list(vec![Value::int(1), Value::Nil].into_iter())));
        let v2 = run(&mut interp, "(f 1 2)");
        assert!(v2.equal(&Value::vec_to_list(vec![Value::int(1), Value::int(2)].into_iter())));
    }

    #[test]
    fn each_star_sees_earlier_binding_in_later_init() {
        let mut interp = Interp::new();
        let v = run(
            &mut interp,
            "(collect-each* ((x (list 1 2 3)) (y x)) (list (first x) (first y)))",
        );
        let expected = Value::vec_to_list(
            vec![
                Value::vec_to_list(vec![Value::int(1), Value::int(1)].into_iter()),
                Value::vec_to_list(vec![Value::int(2), Value::int(2)].into_iter()),
                Value::vec_to_list(vec![Value::int(3), Value::int(3)].into_iter()),
            ]
            .into_iter(),
        );
        assert!(v.equal(&expected));
    }

    #[test]
    fn plain_each_cannot_see_sibling_binding_in_later_init() {
        let mut interp = Interp::new();
        // `y`'s init form reads the outer, global `x` (a list of two
        // symbols) rather than the sibling loop binding `x`, since plain
        // `each` evaluates every list-init against the outer environment.
        run(&mut interp, "(defvar x (list 'outer 'outer))");
        let v = run(&mut interp, "(collect-each ((x (list 1 2)) (y x)) (list x y))");
        let outer = interp.intern("outer", None);
        let expected = Value::vec_to_list(
            vec![
                Value::vec_to_list(vec![Value::int(1), outer.clone()].into_iter()),
                Value::vec_to_list(vec![Value::int(2), outer].into_iter()),
            ]
            .into_iter(),
        );
        assert!(v.equal(&expected));
    }

    #[test]
    fn each_materializes_a_lazy_generate_sequence() {
        let mut interp = Interp::new();
        run(&mut interp, "(defvar *n* 0)");
        run(
            &mut interp,
            "(defvar g (generate (lambda () (< *n* 3)) (lambda () (set *n* (+ *n* 1)))))",
        );
        let v = run(&mut interp, "(collect-each ((x g)) x)");
        assert!(v.equal(&Value::vec_to_list(vec![Value::int(1), Value::int(2), Value::int(3)].into_iter())));
    }

    #[test]
    fn block_return_from_runs_cleanup_once() {
        let mut interp = Interp::new();
        run(&mut interp, "(defvar *c* 0)");
        let v = run(
            &mut interp,
            "(block b (unwind-protect (return-from b 1) (set *c* (+ *c* 1))))",
        );
        assert!(v.eql(&Value::int(1)));
        let env = interp.global_env();
        let c = env.get_var("*c*").unwrap();
        assert!(c.eql(&Value::int(1)));
    }

    #[test]
    fn catch_matches_by_subtype() {
        let mut interp = Interp::new();
        interp.taxonomy.register_subtype("eb", "ea");
        let v = run(&mut interp, "(catch (ea) (throw 'eb 1) (ea (x) (list 'got x)))");
        let got = interp.intern("got", None);
        assert!(v.equal(&Value::vec_to_list(vec![got, Value::int(1)].into_iter())));
    }

    #[test]
    fn place_identity_inc_through_car() {
        let mut interp = Interp::new();
        let v = run(&mut interp, "(let ((x (list 1 2 3))) (inc (car x) 10) x)");
        let expected = Value::vec_to_list(vec![Value::int(11), Value::int(2), Value::int(3)].into_iter());
        assert!(v.equal(&expected));
    }

    #[test]
    fn op_implicit_numeric_args() {
        let mut interp = Interp::new();
        let v = run(&mut interp, "[(op + @1 @2) 3 4]");
        assert!(v.eql(&Value::int(7)));
    }

    #[test]
    fn op_rest_args_splice() {
        let mut interp = Interp::new();
        let v = run(&mut interp, "[(op list @rest) 1 2 3]");
        let expected = Value::vec_to_list(vec![Value::int(1), Value::int(2), Value::int(3)].into_iter());
        assert!(v.equal(&expected));
    }

    #[test]
    fn dwim_indexing_on_vector() {
        let mut interp = Interp::new();
        run(&mut interp, "(defvar v (vector 10 20 30))");
        let v = run(&mut interp, "[v 1]");
        assert!(v.eql(&Value::int(20)));
    }

    #[test]
    fn del_on_list_range() {
        let mut interp = Interp::new();
        let v = run(&mut interp, "(let ((l (list 10 20 30 40))) (del [l 1..3]) l)");
        let expected = Value::vec_to_list(vec![Value::int(10), Value::int(40)].into_iter());
        assert!(v.equal(&expected));
    }
}
