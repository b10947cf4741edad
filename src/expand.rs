// ABOUTME: Expander module rewriting surface syntax into kernel forms before evaluation

//! The expander: `expand(form)`, a pure structural rewrite from
//! surface syntax to the evaluator's kernel form set. Quasiquote expansion
//! is depth-tracked at expand-time rather than eval-time: nested
//! quasiquotes add one level, and expanding always works from the
//! innermost quasiquote outward.

use crate::error::{Unwind, TAG_EVAL_ERROR};
use crate::interp::Interp;
use crate::value::Value;

fn err(interp: &mut Interp, message: impl Into<String>) -> Unwind {
    interp.make_error(TAG_EVAL_ERROR, message)
}

fn sym(interp: &mut Interp, name: &str) -> Value {
    interp.intern(name, None)
}

fn is_head(form: &Value, name: &str) -> bool {
    form.as_cons()
        .map(|c| matches!(&c.borrow().car, Value::Symbol(s) if s.name == name))
        .unwrap_or(false)
}

/// `expand(form)`. Atoms are returned unchanged; compound forms
/// are rewritten per the head-dispatch table below, recursing into
/// sub-forms for everything not handled as a special rewrite.
pub fn expand(interp: &mut Interp, form: &Value) -> Result<Value, Unwind> {
    match form {
        Value::Cons(_) => {}
        _ => return Ok(form.clone()),
    }
    let items = form
        .list_to_vec()
        .ok_or_else(|| err(interp, "improper list in source form"))?;
    if items.is_empty() {
        return Ok(Value::Nil);
    }
    let head_name = items[0].as_symbol().map(|s| s.name.clone());

    match head_name.as_deref() {
        Some("quote") | Some("fun") => Ok(form.clone()),
        Some("qquote") => expand_quasi(interp, &items[1], 1),
        Some("gen") => {
            let while_pred = items.get(1).cloned().unwrap_or(Value::Nil);
            let gen_expr = items.get(2).cloned().unwrap_or(Value::Nil);
            let lambda = sym(interp, "lambda");
            let generate = sym(interp, "generate");
            let wrap = |interp: &mut Interp, body: Value| -> Result<Value, Unwind> {
                let expanded_body = expand(interp, &body)?;
                Ok(Value::vec_to_list(
                    vec![lambda.clone(), Value::Nil, expanded_body].into_iter(),
                ))
            };
            let pred_lambda = wrap(interp, while_pred)?;
            let gen_lambda = wrap(interp, gen_expr)?;
            Ok(Value::vec_to_list(vec![generate, pred_lambda, gen_lambda].into_iter()))
        }
        Some("delay") => {
            let body = Value::vec_to_list(items[1..].iter().cloned());
            let expanded_body = expand(interp, &body)?;
            let lambda = sym(interp, "lambda");
            let progn = sym(interp, "progn");
            let thunk = Value::vec_to_list(
                vec![lambda, Value::Nil, Value::cons(progn, expanded_body)].into_iter(),
            );
            let cons_fn = sym(interp, "cons");
            let quote = sym(interp, "quote");
            let promise_sym = sym(interp, crate::lazy::PROMISE_MARKER);
            let quoted_promise = Value::vec_to_list(vec![quote, promise_sym].into_iter());
            Ok(Value::vec_to_list(vec![cons_fn, quoted_promise, thunk].into_iter()))
        }
        Some("op") => expand_op(interp, &items[1..]),
        Some("catch") => expand_catch(interp, &items[1..]),
        Some("let") | Some("let*") => expand_let(interp, &items, head_name.as_deref() == Some("let*")),
        Some("lambda") => expand_lambda(interp, &items),
        Some("defun") => expand_defun(interp, &items),
        Some("inc") | Some("dec") | Some("push") | Some("pop") | Some("flip") | Some("del") | Some("set") => {
            expand_place_form(interp, &items, head_name.as_deref().unwrap())
        }
        Some("dwim") => {
            let mut out = vec![items[0].clone()];
            for item in &items[1..] {
                out.push(expand(interp, item)?);
            }
            Ok(Value::vec_to_list(out.into_iter()))
        }
        _ => {
            let mut out = Vec::with_capacity(items.len());
            for item in &items {
                out.push(expand(interp, item)?);
            }
            Ok(Value::vec_to_list(out.into_iter()))
        }
    }
}

fn expand_let(interp: &mut Interp, items: &[Value], _star: bool) -> Result<Value, Unwind> {
    let bindings = items.get(1).cloned().unwrap_or(Value::Nil);
    let binding_list = bindings.list_to_vec().unwrap_or_default();
    let mut new_bindings = Vec::new();
    for b in binding_list {
        let pair = b.list_to_vec().unwrap_or_else(|| vec![b.clone()]);
        let name = pair.first().cloned().unwrap_or(Value::Nil);
        let init = pair.get(1).cloned().unwrap_or(Value::Nil);
        let expanded_init = expand(interp, &init)?;
        new_bindings.push(Value::vec_to_list(vec![name, expanded_init].into_iter()));
    }
    let mut out = vec![items[0].clone(), Value::vec_to_list(new_bindings.into_iter())];
    for body_form in &items[2..] {
        out.push(expand(interp, body_form)?);
    }
    Ok(Value::vec_to_list(out.into_iter()))
}

fn expand_lambda(interp: &mut Interp, items: &[Value]) -> Result<Value, Unwind> {
    let mut out = vec![items[0].clone(), items.get(1).cloned().unwrap_or(Value::Nil)];
    for body_form in &items[2..] {
        out.push(expand(interp, body_form)?);
    }
    Ok(Value::vec_to_list(out.into_iter()))
}

fn expand_defun(interp: &mut Interp, items: &[Value]) -> Result<Value, Unwind> {
    let mut out = vec![
        items[0].clone(),
        items.get(1).cloned().unwrap_or(Value::Nil),
        items.get(2).cloned().unwrap_or(Value::Nil),
    ];
    for body_form in &items[3..] {
        out.push(expand(interp, body_form)?);
    }
    Ok(Value::vec_to_list(out.into_iter()))
}

/// Place-taking operators: the place argument is expanded through a
/// place-specific sub-expander that only accepts `dwim`, `gethash`, `car`,
/// `cdr`, `vecref`, or a bare symbol, rejecting anything else at
/// expansion time.
fn expand_place_form(interp: &mut Interp, items: &[Value], op: &str) -> Result<Value, Unwind> {
    // `push` places the value first, the place second, per `eval.c`'s
    // `op_modplace` table for `push_s`.
    let place_index = if op == "push" { 2 } else { 1 };
    let mut out = vec![items[0].clone()];
    for (i, item) in items[1..].iter().enumerate() {
        let idx = i + 1;
        if idx == place_index {
            out.push(expand_place_arg(interp, item)?);
        } else {
            out.push(expand(interp, item)?);
        }
    }
    Ok(Value::vec_to_list(out.into_iter()))
}

fn expand_place_arg(interp: &mut Interp, place: &Value) -> Result<Value, Unwind> {
    if place.is_bindable_symbol() {
        return Ok(place.clone());
    }
    if is_head(place, "dwim") || is_head(place, "gethash") || is_head(place, "car")
        || is_head(place, "cdr") || is_head(place, "vecref")
    {
        return expand(interp, place);
    }
    Err(err(interp, "not a recognized place form"))
}

/// `qquote` structural rewrite. `depth` tracks nesting: `,`/`,@` only
/// take effect at depth 1; deeper quasiquotes re-wrap and recurse.
fn expand_quasi(interp: &mut Interp, form: &Value, depth: u32) -> Result<Value, Unwind> {
    match form {
        Value::Cons(_) => {}
        other => {
            let quote = sym(interp, "quote");
            return Ok(Value::vec_to_list(vec![quote, other.clone()].into_iter()));
        }
    }
    if is_head(form, "unquote") && depth == 1 {
        let items = form.list_to_vec().unwrap();
        return expand(interp, &items[1]);
    }
    if is_head(form, "unquote") {
        let items = form.list_to_vec().unwrap();
        let inner = expand_quasi(interp, &items[1], depth - 1)?;
        let uq = sym(interp, "unquote");
        let list_fn = sym(interp, "list");
        let quote = sym(interp, "quote");
        return Ok(Value::vec_to_list(
            vec![list_fn, Value::vec_to_list(vec![quote, uq].into_iter()), inner].into_iter(),
        ));
    }
    if is_head(form, "qquote") {
        let items = form.list_to_vec().unwrap();
        let inner = expand_quasi(interp, &items[1], depth + 1)?;
        let qq = sym(interp, "qquote");
        let list_fn = sym(interp, "list");
        let quote = sym(interp, "quote");
        return Ok(Value::vec_to_list(
            vec![list_fn, Value::vec_to_list(vec![quote, qq].into_iter()), inner].into_iter(),
        ));
    }

    let items = form.list_to_vec().ok_or_else(|| err(interp, "improper list in qquote"))?;
    let list_fn = sym(interp, "list");
    let append_fn = sym(interp, "append");
    let quote = sym(interp, "quote");

    let mut append_args: Vec<Value> = Vec::new();
    let mut current_list_items: Vec<Value> = Vec::new();

    let flush = |current_list_items: &mut Vec<Value>, append_args: &mut Vec<Value>| {
        if !current_list_items.is_empty() {
            let mut chunk = vec![list_fn.clone()];
            chunk.append(current_list_items);
            append_args.push(Value::vec_to_list(chunk.into_iter()));
        }
    };

    for item in &items {
        if is_head(item, "splice") && depth == 1 {
            flush(&mut current_list_items, &mut append_args);
            let sub = item.list_to_vec().unwrap();
            append_args.push(expand(interp, &sub[1])?);
        } else if is_head(item, "splice") {
            let sub = item.list_to_vec().unwrap();
            let inner = expand_quasi(interp, &sub[1], depth - 1)?;
            let sp = sym(interp, "splice");
            current_list_items.push(Value::vec_to_list(
                vec![list_fn.clone(), Value::vec_to_list(vec![quote.clone(), sp].into_iter()), inner]
                    .into_iter(),
            ));
        } else {
            current_list_items.push(expand_quasi(interp, item, depth)?);
        }
    }
    flush(&mut current_list_items, &mut append_args);

    if append_args.len() == 1 {
        Ok(append_args.remove(0))
    } else if append_args.is_empty() {
        Ok(Value::vec_to_list(vec![list_fn].into_iter()))
    } else {
        let mut out = vec![append_fn];
        out.extend(append_args);
        Ok(Value::vec_to_list(out.into_iter()))
    }
}

/// `op ...body`. `body`'s forms are the `(obj arg…)` spine of the
/// call `op` stands for — `(op + @1 @2)` means "call `+` on `@1`/`@2`",
/// matching `[(op + @1 @2) 3 4]` => 7 — so expansion wraps that spine as a
/// `dwim` call (with its tail dotted to a generated `@rest` so extra
/// call-site arguments splice through, `apply`-style) under a `lambda`
/// whose parameters are the referenced `@N` symbols plus `@rest`. `@1`,
/// `@2`, ... and `@rest` are ordinary symbols — the reader has no special
/// handling for them, see `parser.rs`'s `is_symbol_char` — so no
/// substitution pass is needed, just a scan for which ones occur.
/// The numeric-prefix validation is grounded on `eval.c`'s `op_dwim`: the
/// check only fires when at least one numeric var is referenced, and only
/// requires that the *maximum* referenced index have all of `1..=max`
/// present, not that `@1` specifically be used if `@2` alone appears.
fn expand_op(interp: &mut Interp, body: &[Value]) -> Result<Value, Unwind> {
    if body.is_empty() {
        return Err(err(interp, "op: empty body"));
    }
    let mut max_numeric = 0u32;
    let mut seen = std::collections::HashSet::new();
    let body_list = Value::vec_to_list(body.iter().cloned());
    scan_op_vars(&body_list, &mut max_numeric, &mut seen);

    if max_numeric > 0 {
        for n in 1..=max_numeric {
            if !seen.contains(&n) {
                return Err(err(interp, format!("op: missing numeric argument @{n}")));
            }
        }
    }

    let params: Vec<Value> = (1..=max_numeric).map(|n| interp.intern(&format!("@{n}"), None)).collect();
    let rest_param = interp.intern("@rest", None);

    let mut expanded_spine = Vec::with_capacity(body.len());
    for form in body {
        expanded_spine.push(expand(interp, form)?);
    }

    // `body`'s forms are themselves the `(obj arg…)` spine of the call this
    // `op` stands for, not a progn'd body — `(op + @1 @2)` is sugar for
    // calling `+` on `@1`/`@2`, matching `[(op + @1 @2) 3 4]` => 7.
    let user_wrote_rest = matches!(expanded_spine.last(), Some(Value::Symbol(s)) if s.name == "@rest");
    let dwim = sym(interp, "dwim");
    let mut proper_items = vec![dwim];
    proper_items.extend(expanded_spine.into_iter());
    let tail = if user_wrote_rest {
        proper_items.pop().unwrap()
    } else {
        rest_param.clone()
    };
    let mut dwim_call = tail;
    for item in proper_items.into_iter().rev() {
        dwim_call = Value::cons(item, dwim_call);
    }

    let lambda = sym(interp, "lambda");
    let mut param_list = rest_param;
    for p in params.into_iter().rev() {
        param_list = Value::cons(p, param_list);
    }

    Ok(Value::vec_to_list(vec![lambda, param_list, dwim_call].into_iter()))
}

fn scan_op_vars(form: &Value, max_numeric: &mut u32, seen: &mut std::collections::HashSet<u32>) {
    if let Value::Symbol(s) = form {
        if let Some(rest) = s.name.strip_prefix('@') {
            if let Ok(n) = rest.parse::<u32>() {
                if n > 0 {
                    seen.insert(n);
                    if n > *max_numeric {
                        *max_numeric = n;
                    }
                }
            }
        }
        return;
    }
    if let Some(items) = form.list_to_vec() {
        for item in &items {
            scan_op_vars(item, max_numeric, seen);
        }
    }
}

/// `catch clauses`: lifts the tag list out of the clauses. Accepts
/// both an explicit leading tag list (`(catch (tags...) try clause...)`,
/// the evaluator's kernel shape) and a bare
/// `(catch try clause...)` surface form, deriving the tag list from each
/// clause's leading tag symbol in the latter case.
fn expand_catch(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    if args.is_empty() {
        return Err(err(interp, "catch: missing try-form"));
    }
    let first_is_tag_list = args[0]
        .list_to_vec()
        .map(|items| !items.is_empty() && items.iter().all(|i| i.is_bindable_symbol()))
        .unwrap_or(false)
        && args.len() > 1;

    let (explicit_tags, try_form, clauses) = if first_is_tag_list {
        (Some(args[0].clone()), &args[1], &args[2..])
    } else {
        (None, &args[0], &args[1..])
    };

    let expanded_try = expand(interp, try_form)?;
    let mut expanded_clauses = Vec::new();
    let mut derived_tags = Vec::new();
    for clause in clauses {
        let parts = clause
            .list_to_vec()
            .ok_or_else(|| err(interp, "catch: malformed clause"))?;
        if parts.len() < 2 {
            return Err(err(interp, "catch: malformed clause"));
        }
        derived_tags.push(parts[0].clone());
        let params = parts[1].clone();
        let mut clause_out = vec![parts[0].clone(), params];
        for body_form in &parts[2..] {
            clause_out.push(expand(interp, body_form)?);
        }
        expanded_clauses.push(Value::vec_to_list(clause_out.into_iter()));
    }

    let tags = explicit_tags.unwrap_or_else(|| Value::vec_to_list(derived_tags.into_iter()));
    let catch_sym = sym(interp, "catch");
    let mut out = vec![catch_sym, tags, expanded_try];
    out.extend(expanded_clauses);
    Ok(Value::vec_to_list(out.into_iter()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_src(interp: &mut Interp, src: &str) -> Value {
        let form = interp.read_one(src).unwrap();
        expand(interp, &form).unwrap()
    }

    #[test]
    fn quasiquote_with_unquote_and_splice() {
        let mut interp = Interp::new();
        let expanded = expand_src(&mut interp, "`(1 ,(+ 1 1) ,@(list 3 4) 5)");
        assert!(is_head(&expanded, "append") || is_head(&expanded, "list"));
    }

    #[test]
    fn quote_is_unchanged() {
        let mut interp = Interp::new();
        let form = interp.read_one("(quote (a b c))").unwrap();
        let expanded = expand(&mut interp, &form).unwrap();
        assert!(expanded.equal(&form));
    }

    #[test]
    fn delay_lowers_to_cons_promise_lambda() {
        let mut interp = Interp::new();
        let expanded = expand_src(&mut interp, "(delay (+ 1 2))");
        assert!(is_head(&expanded, "cons"));
    }

    #[test]
    fn gen_lowers_to_generate_call() {
        let mut interp = Interp::new();
        let expanded = expand_src(&mut interp, "(gen (< i 3) i)");
        assert!(is_head(&expanded, "generate"));
    }

    #[test]
    fn op_numeric_params_lower_to_lambda_over_dotted_dwim() {
        let mut interp = Interp::new();
        let expanded = expand_src(&mut interp, "(op + @1 @2)");
        assert!(is_head(&expanded, "lambda"));
        // both the lambda's param list and its dwim-call body are dotted
        // (rest-parameter), so `list_to_vec` (proper-list-only) doesn't
        // apply — walk the spines manually instead.
        let spine = |mut cur: Value| -> (Vec<Value>, Value) {
            let mut items = Vec::new();
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
                    other => return (items, other),
                }
            }
        };
        let (top_items, _) = spine(expanded.clone());
        assert!(matches!(&top_items[0], Value::Symbol(s) if s.name == "lambda"));
        let (params, param_tail) = spine(top_items[1].clone());
        assert_eq!(params.len(), 2);
        assert!(matches!(&params[0], Value::Symbol(s) if s.name == "@1"));
        assert!(matches!(&param_tail, Value::Symbol(s) if s.name == "@rest"));
        let (_, dwim_tail) = spine(top_items[2].clone());
        assert!(matches!(&dwim_tail, Value::Symbol(s) if s.name == "@rest"));
    }

    #[test]
    fn op_missing_intermediate_numeric_arg_is_error() {
        let mut interp = Interp::new();
        let form = interp.read_one("(op + @2)").unwrap();
        assert!(expand(&mut interp, &form).is_err());
    }

    #[test]
    fn catch_derives_tags_from_clauses() {
        let mut interp = Interp::new();
        let expanded = expand_src(&mut interp, "(catch (throw 'eb 1) (ea (x) (list 'got x)))");
        assert!(is_head(&expanded, "catch"));
        let items = expanded.list_to_vec().unwrap();
        let tags = items[1].list_to_vec().unwrap();
        assert_eq!(tags.len(), 1);
        assert!(matches!(&tags[0], Value::Symbol(s) if s.name == "ea"));
    }
}
