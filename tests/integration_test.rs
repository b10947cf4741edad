// Whole-program scenarios: each evaluates a handful of top-level forms
// through the full read -> expand -> eval pipeline and checks the result.

use lispcore::interp::Interp;
use lispcore::value::Value;

fn run(interp: &mut Interp, src: &str) -> Value {
    let form = interp.read_one(src).expect("parse error");
    let expanded = interp.expand(&form).expect("expand error");
    interp.eval_top(&expanded).expect("eval error")
}

fn run_all(interp: &mut Interp, forms: &[&str]) -> Value {
    let mut last = Value::Nil;
    for f in forms {
        last = run(interp, f);
    }
    last
}

#[test]
fn scenario_let_and_arithmetic() {
    let mut interp = Interp::new();
    let r = run(&mut interp, "(let ((x 1) (y 2)) (+ x y))");
    assert!(r.eql(&Value::int(3)));
}

#[test]
fn scenario_optional_parameter_defaults_to_nil() {
    let mut interp = Interp::new();
    run(&mut interp, "(defun f (a : b) (list a b))");
    let one = run(&mut interp, "(f 1)");
    assert!(one.equal(&Value::vec_to_list(vec![Value::int(1), Value::Nil].into_iter())));
    let two = run(&mut interp, "(f 1 2)");
    assert!(two.equal(&Value::vec_to_list(vec![Value::int(1), Value::int(2)].into_iter())));
}

#[test]
fn scenario_push_onto_hash_slot_builds_a_list() {
    let mut interp = Interp::new();
    let result = run_all(
        &mut interp,
        &[
            "(defvar h (make-hash nil nil nil))",
            "(push 1 (gethash h 'xs))",
            "(push 2 (gethash h 'xs))",
            "(gethash h 'xs)",
        ],
    );
    assert!(result.equal(&Value::vec_to_list(vec![Value::int(2), Value::int(1)].into_iter())));
}

#[test]
fn scenario_catch_runs_unwind_protect_cleanup() {
    let mut interp = Interp::new();
    run(&mut interp, "(defvar *c* nil)");
    let result = run(
        &mut interp,
        "(catch (err) (unwind-protect (throw 'err 'a) (set *c* 'ran)) (err (x) x))",
    );
    let a = interp.intern("a", None);
    assert!(result.eq(&a));
    let c = run(&mut interp, "*c*");
    let ran = interp.intern("ran", None);
    assert!(c.eq(&ran));
}

#[test]
fn scenario_quasiquote_splice() {
    let mut interp = Interp::new();
    let result = run(&mut interp, "`(1 ,(+ 1 1) ,@(list 3 4) 5)");
    let expected = Value::vec_to_list(
        vec![Value::int(1), Value::int(2), Value::int(3), Value::int(4), Value::int(5)].into_iter(),
    );
    assert!(result.equal(&expected));
}

#[test]
fn scenario_del_on_list_range() {
    let mut interp = Interp::new();
    let result = run_all(
        &mut interp,
        &["(defvar l (list 10 20 30 40))", "(del [l 1..3])", "l"],
    );
    assert!(result.equal(&Value::vec_to_list(vec![Value::int(10), Value::int(40)].into_iter())));
}

#[test]
fn scenario_dwim_vector_index_read_and_write() {
    let mut interp = Interp::new();
    run(&mut interp, "(defvar v (vector 10 20 30))");
    let one = run(&mut interp, "[v 1]");
    assert!(one.eql(&Value::int(20)));
    run(&mut interp, "(set [v 0] 99)");
    let first = run(&mut interp, "[v 0]");
    assert!(first.eql(&Value::int(99)));
}

#[test]
fn scenario_hash_place_default_populates_and_increments() {
    let mut interp = Interp::new();
    run(&mut interp, "(defvar h (make-hash nil nil nil))");
    let first = run(&mut interp, "(inc (gethash h 'k 0))");
    assert!(first.eql(&Value::int(1)));
    let second = run(&mut interp, "(inc (gethash h 'k 0))");
    assert!(second.eql(&Value::int(2)));
}

#[test]
fn scenario_non_local_exit_runs_cleanup_once() {
    let mut interp = Interp::new();
    run(&mut interp, "(defvar *c* 0)");
    let result = run(
        &mut interp,
        "(block b (unwind-protect (return-from b 1) (set *c* (+ *c* 1))))",
    );
    assert!(result.eql(&Value::int(1)));
    let c = run(&mut interp, "*c*");
    assert!(c.eql(&Value::int(1)));
}

#[test]
fn law_length_reverse_roundtrip() {
    let mut interp = Interp::new();
    run(&mut interp, "(defvar l (list 1 2 3 4))");
    let len = run(&mut interp, "(length l)");
    let rev_len = run(&mut interp, "(length (reverse l))");
    assert!(len.eql(&rev_len));
    let double_reversed = run(&mut interp, "(equal (reverse (reverse l)) l)");
    assert!(double_reversed.is_truthy());
}

#[test]
fn law_force_delay_memoizes() {
    let mut interp = Interp::new();
    run(&mut interp, "(defvar *n* 0)");
    run(&mut interp, "(defvar p (delay (progn (set *n* (+ *n* 1)) *n*)))");
    let first = run(&mut interp, "(force p)");
    let second = run(&mut interp, "(force p)");
    assert!(first.eql(&second));
    let n = run(&mut interp, "*n*");
    assert!(n.eql(&Value::int(1)));
}

#[test]
fn law_place_identity_mutates_through_car() {
    let mut interp = Interp::new();
    let result = run(&mut interp, "(let ((x (list 1 2 3))) (inc (car x) 10) x)");
    assert!(result.equal(&Value::vec_to_list(vec![Value::int(11), Value::int(2), Value::int(3)].into_iter())));
}

#[test]
fn law_lazy_range_first_three_elements() {
    let mut interp = Interp::new();
    run(&mut interp, "(defvar r (range 0 nil 1))");
    let first_three = run(&mut interp, "(list (first r) (second r) (third r))");
    assert!(first_three.equal(&Value::vec_to_list(vec![Value::int(0), Value::int(1), Value::int(2)].into_iter())));
}
