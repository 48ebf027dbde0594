use beans::back::{self, CtorValue, Evaluator, Heap, HeapStats, HeapValue, Location, Value};
use beans::common::Map;
use beans::diagnostics::{Diagnostic, Files};
use beans::driver::Opts;
use beans::middle::{ir, transforms};
use beans::pp;

use structopt::StructOpt;

const SWAP: &str = "
(deftype One)
(deftype Two)
(deftype Pair fst snd)

(defn swap (p)
  (case p
    Pair (let (a (proj fst p) b (proj snd p) r (new Pair b a)) (ret r))))
";

const LISTS: &str = "
(deftype Nil)
(deftype Cons head tail)
(deftype Zero)
(deftype Succ pred)

(defn add (m n)
  (case m
    Zero (ret n)
    Succ (let (p (proj pred m) s (add p n) r (new Succ s)) (ret r))))

(defn rev-onto (xs acc)
  (case xs
    Nil (ret acc)
    Cons (let (h (proj head xs) t (proj tail xs) acc' (new Cons h acc) r (rev-onto t acc'))
           (ret r))))

(defn map (f xs)
  (case xs
    Nil (ret xs)
    Cons (let (h (proj head xs) t (proj tail xs) h' (f h) t' (map f t) r (new Cons h' t'))
           (ret r))))

(defn main ()
  (let (z (new Zero) one (new Succ z)
        z2 (new Zero) z3 (new Succ z2) two (new Succ z3)
        nil (new Nil) l1 (new Cons one nil) l2 (new Cons two l1)
        z4 (new Zero) one' (new Succ z4) plus-one (pap add one')
        mapped (map plus-one l2) empty (new Nil) r (rev-onto mapped empty))
    (ret r)))
";

fn opts() -> Opts {
    Opts::from_iter(&["beans", "-c", "test.beans"])
}

fn try_load(src: &str) -> Result<ir::Program, Diagnostic> {
    let mut files = Files::new();
    let file_id = files.add("test.beans", src);
    beans::load(&opts(), &files, file_id)
}

fn load(src: &str) -> ir::Program {
    try_load(src).unwrap()
}

fn transformed(src: &str) -> ir::Program {
    transforms::insert_reuse(&opts(), &load(src)).unwrap()
}

fn leaf(heap: &mut Heap, tag: &str) -> Location {
    heap.alloc(HeapValue::Ctor(CtorValue {
        tag: ir::CtorName::synthetic(tag),
        fields: Map::new(),
    }))
}

fn pair(heap: &mut Heap, fst: Location, snd: Location) -> Location {
    let mut fields = Map::new();
    fields.insert(ir::FieldName::synthetic("fst"), fst);
    fields.insert(ir::FieldName::synthetic("snd"), snd);
    heap.alloc(HeapValue::Ctor(CtorValue {
        tag: ir::CtorName::synthetic("Pair"),
        fields,
    }))
}

fn pair_value(fst: &str, snd: &str) -> Value {
    Value::ctor(
        "Pair",
        vec![("fst", Value::ctor(fst, vec![])), ("snd", Value::ctor(snd, vec![]))],
    )
}

fn call(program: &ir::Program, heap: &mut Heap, name: &str, args: Vec<Location>) -> Location {
    Evaluator::new(program, heap)
        .call(&ir::FnName::synthetic(name), args)
        .unwrap()
}

#[test]
fn unique_swap_happens_in_place() {
    let program = transformed(SWAP);
    let mut heap = Heap::new();
    let one = leaf(&mut heap, "One");
    let two = leaf(&mut heap, "Two");
    let p = pair(&mut heap, one, two);
    let allocations = heap.stats().allocations;

    let r = call(&program, &mut heap, "swap", vec![p]);

    assert_eq!(r, p);
    assert_eq!(heap.stats().allocations, allocations);
    assert_eq!(heap.stats().reuses, 1);
    assert_eq!(heap.snapshot(r), Ok(pair_value("Two", "One")));
    assert_eq!(heap.ref_count(one), Ok(1));
    assert_eq!(heap.ref_count(two), Ok(1));

    heap.dec(&[r]).unwrap();
    assert!(heap.is_empty());
}

#[test]
fn shared_swap_leaves_the_original_intact() {
    let program = transformed(SWAP);
    let mut heap = Heap::new();
    let one = leaf(&mut heap, "One");
    let two = leaf(&mut heap, "Two");
    let p = pair(&mut heap, one, two);
    heap.inc(&[p]).unwrap();

    let r = call(&program, &mut heap, "swap", vec![p]);

    assert_ne!(r, p);
    assert_eq!(heap.ref_count(p), Ok(1));
    assert_eq!(heap.snapshot(p), Ok(pair_value("One", "Two")));
    assert_eq!(heap.snapshot(r), Ok(pair_value("Two", "One")));
    assert_eq!(heap.stats().declined, 1);
    assert_eq!(heap.stats().reuses, 0);

    heap.dec(&[r, p]).unwrap();
    assert!(heap.is_empty());
}

#[test]
fn untransformed_swap_allocates() {
    let program = load(SWAP);
    let mut heap = Heap::new();
    let one = leaf(&mut heap, "One");
    let two = leaf(&mut heap, "Two");
    let p = pair(&mut heap, one, two);

    let r = call(&program, &mut heap, "swap", vec![p]);

    assert_ne!(r, p);
    assert_eq!(heap.snapshot(r), Ok(pair_value("Two", "One")));
    assert_eq!(heap.stats().allocations, 4);
}

#[test]
fn transformation_is_transparent() {
    let plain = load(LISTS);
    let mut plain_heap = Heap::new();
    let plain_result = back::run(&plain, &mut plain_heap, "main").unwrap();

    let reusing = transformed(LISTS);
    let mut reusing_heap = Heap::new();
    let reusing_result = back::run(&reusing, &mut reusing_heap, "main").unwrap();

    assert_eq!(
        plain_heap.snapshot(plain_result),
        reusing_heap.snapshot(reusing_result)
    );
    assert_eq!(
        back::render(&reusing, &reusing_heap, reusing_result).unwrap(),
        "(Cons (Succ (Succ Zero)) (Cons (Succ (Succ (Succ Zero))) Nil))"
    );
    assert!(reusing_heap.stats().reuses > 0);
    assert!(reusing_heap.stats().allocations < plain_heap.stats().allocations);
}

#[test]
fn transformed_programs_do_not_leak() {
    for src in [SWAP, LISTS].iter() {
        let program = transformed(src);
        if program.lookup_fn(&ir::FnName::synthetic("main")).is_none() {
            continue;
        }
        let mut heap = Heap::new();
        let result = back::run(&program, &mut heap, "main").unwrap();
        heap.dec(&[result]).unwrap();
        assert!(heap.is_empty(), "{:?}", heap.live_cells().collect::<Vec<_>>());
    }
}

#[test]
fn printed_programs_load_back_unchanged() {
    for program in [load(LISTS), transformed(LISTS), transformed(SWAP)].iter() {
        let reloaded = load(&pp::render(program));
        for def in program.fns() {
            let other = reloaded.lookup_fn(&def.name).unwrap();
            assert_eq!(def.params, other.params);
            assert_eq!(def.body, other.body);
        }
        for def in program.types() {
            let other = reloaded.lookup_type(&def.tag).unwrap();
            assert_eq!(def.fields, other.fields);
        }
    }
}

#[test]
fn applying_a_pap_retains_its_captured_arguments() {
    let program = load(
        "(deftype A)
         (defn first (x y) (ret x))
         (defn main () (let (a (new A) k (pap first a) u (new A) r1 (k u) r2 (k u)) (ret a)))",
    );
    let mut heap = Heap::new();
    let a = back::run(&program, &mut heap, "main").unwrap();
    // one reference from the allocation, one per application
    assert_eq!(heap.ref_count(a), Ok(3));
}

#[test]
fn resetting_a_captured_argument_is_declined() {
    let program = load(
        "(deftype A)
         (deftype B)
         (deftype Box val)
         (defn rebox (b u)
           (case b
             Box (let (v (proj val b))
                   (inc v (dec u (let (w (reset b) c (reuse w Box v)) (ret c)))))))
         (defn main ()
           (let (a (new A) b (new Box a) k (pap rebox b)
                 u1 (new B) c1 (k u1) u2 (new B) c2 (k u2))
             (ret b)))",
    );
    let mut heap = Heap::new();
    let b = back::run(&program, &mut heap, "main").unwrap();
    let boxed = Value::ctor("Box", vec![("val", Value::ctor("A", vec![]))]);
    assert_eq!(heap.snapshot(b), Ok(boxed));
    assert_eq!(heap.ref_count(b), Ok(1));
    assert_eq!(
        heap.stats(),
        HeapStats {
            allocations: 7,
            reuses: 0,
            frees: 2,
            declined: 2,
        }
    );
}

fn run_error(src: &str) -> String {
    let program = load(src);
    let mut heap = Heap::new();
    back::run(&program, &mut heap, "main").unwrap_err().message
}

#[test]
fn evaluation_errors_are_reported() {
    assert_eq!(
        run_error("(deftype A) (deftype B) (defn main () (let (a (new A)) (case a B (ret a))))"),
        "non-exhaustive match"
    );
    assert_eq!(
        run_error("(deftype A) (deftype Box val) (defn main () (let (a (new A) v (proj val a)) (ret v)))"),
        "unknown field"
    );
    assert_eq!(
        run_error("(deftype A) (defn main () (let (a (new A) r (a a)) (ret r)))"),
        "expected a partial application"
    );
    assert_eq!(
        run_error("(deftype A) (defn f (x) (ret x)) (defn main () (let (k (pap f) a (new A) r (k a a)) (ret r)))"),
        "arity mismatch"
    );
    assert_eq!(
        run_error("(deftype A) (defn start () (let (a (new A)) (ret a)))"),
        "invalid entry point"
    );
}

#[test]
fn load_errors_are_reported() {
    let message = |src: &str| try_load(src).unwrap_err().message;
    assert_eq!(message("(defn main () (ret x))"), "reference to unbound variable");
    assert_eq!(message("(defn main () (foo x))"), "unknown keyword");
    assert_eq!(message("(deftype A))"), "unbalanced parentheses");
    assert_eq!(
        message("(deftype Pair fst snd) (defn main () (let (a (new Pair)) (ret a)))"),
        "arity mismatch"
    );
    assert_eq!(
        message("(defn f (x) (ret x)) (defn main () (let (r (f)) (ret r)))"),
        "arity mismatch"
    );
    assert_eq!(
        message("(deftype A) (defn main () (let (a (new A) a (new A)) (ret a)))"),
        "attempt to rebind variable"
    );
    assert_eq!(
        message("(deftype A) (deftype B) (defn f (x) (case x A (ret x) B (ret x) A (ret x)))"),
        "duplicate case arm"
    );
}
