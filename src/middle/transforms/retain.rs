//! Explicit reference counting.
//!
//! Every owned variable is handed on exactly once or dropped where it dies; variables read out
//! of a record are retained before they are handed on, or before their record goes away while
//! they are still needed.

use crate::common::{Map, Set};
use crate::middle::analysis::{consumed, Binding, FreeVars};
use crate::middle::ir;

use super::LocalTransformCtx;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum RcOp {
    Inc,
    Dec,
}

#[derive(Clone, Debug, Default)]
struct Ownership {
    owned: Set<ir::Variable>,
    /// Projections, each with the record it was read from.
    borrowed: Map<ir::Variable, ir::Variable>,
}

impl Ownership {
    fn new(params: &[ir::Variable]) -> Ownership {
        Ownership {
            owned: params.iter().cloned().collect(),
            borrowed: Map::new(),
        }
    }

    /// Whether `var` is kept alive by `owner` alone once everything dead is gone: it was read
    /// from `owner` directly, or through records that are themselves dead projections.
    fn hangs_off(&self, var: &ir::Variable, owner: &ir::Variable, live: &Set<ir::Variable>) -> bool {
        let mut record = self.borrowed.get(var);
        while let Some(parent) = record {
            if parent == owner {
                return true;
            }
            if live.contains(parent) {
                return false;
            }
            record = self.borrowed.get(parent);
        }
        false
    }

    /// Prepares for `owner` giving up its reference: whatever still needs its fields takes a
    /// reference of its own first.
    fn release(&mut self, owner: &ir::Variable, live: &Set<ir::Variable>, ops: &mut Vec<(RcOp, ir::Variable)>) {
        let retained: Vec<ir::Variable> = self
            .borrowed
            .keys()
            .filter(|var| live.contains(var) && self.hangs_off(var, owner, live))
            .cloned()
            .collect();
        for var in retained {
            self.borrowed.remove(&var);
            self.owned.insert(var.clone());
            ops.push((RcOp::Inc, var));
        }
        self.owned.remove(owner);
    }

    /// Drops every owned variable that is not in `live`.
    fn drop_dead(&mut self, live: &Set<ir::Variable>, ops: &mut Vec<(RcOp, ir::Variable)>) {
        let dead: Vec<ir::Variable> = self
            .owned
            .iter()
            .filter(|var| !live.contains(var))
            .cloned()
            .collect();
        for var in dead {
            self.release(&var, live, ops);
            ops.push((RcOp::Dec, var));
        }
    }

    /// Accounts for `uses` each handing one reference to someone else, with `live` still needed
    /// afterwards.
    fn hand_over(&mut self, uses: Vec<&ir::Variable>, live: &Set<ir::Variable>, ops: &mut Vec<(RcOp, ir::Variable)>) {
        let mut counts: Map<&ir::Variable, usize> = Map::new();
        for var in uses {
            let count = counts.get(&var).copied().unwrap_or(0);
            counts.insert(var, count + 1);
        }
        for (var, count) in counts {
            let retains = if self.borrowed.contains_key(var) {
                count
            } else if self.owned.contains(var) {
                if live.contains(var) {
                    count
                } else {
                    self.release(var, live, ops);
                    count - 1
                }
            } else {
                0
            };
            for _ in 0..retains {
                ops.push((RcOp::Inc, var.clone()));
            }
        }
    }

    fn bind(&mut self, binding: &ir::Variable, expr: &ir::Expr) {
        match Binding::of(expr) {
            Binding::Owned => {
                self.owned.insert(binding.clone());
            }
            Binding::Borrowed(record) => {
                self.borrowed.insert(binding.clone(), record);
            }
            Binding::Token => {}
        }
    }
}

fn wrap(ops: Vec<(RcOp, ir::Variable)>, body: ir::FnBody) -> ir::FnBody {
    ops.into_iter().rev().fold(body, |body, (op, var)| match op {
        RcOp::Inc => bn_inc!(var => body),
        RcOp::Dec => bn_dec!(var => body),
    })
}

impl<'p, 'ctx> LocalTransformCtx<'p, 'ctx> {
    pub(super) fn retain(&self, body: &ir::FnBody) -> ir::FnBody {
        retain_body(body, Ownership::new(&self.def.params))
    }
}

fn retain_body(body: &ir::FnBody, mut ownership: Ownership) -> ir::FnBody {
    let mut ops = vec![];
    ownership.drop_dead(&body.free_vars(), &mut ops);
    let body = match body {
        ir::FnBody::Ret(var) => {
            if ownership.borrowed.contains_key(var) {
                ops.push((RcOp::Inc, var.clone()));
            }
            ir::FnBody::Ret(var.clone())
        }
        ir::FnBody::Let {
            binding,
            expr,
            body,
        } => {
            ownership.hand_over(consumed(expr), &body.free_vars(), &mut ops);
            ownership.bind(binding, expr);
            bn_let!(binding.clone(), expr.clone() => retain_body(body, ownership))
        }
        ir::FnBody::Case { scrutinee, arms } => ir::FnBody::Case {
            scrutinee: scrutinee.clone(),
            arms: arms
                .iter()
                .map(|(tag, arm)| (tag.clone(), retain_body(arm, ownership.clone())))
                .collect(),
        },
        ir::FnBody::Inc { var, body } => bn_inc!(var.clone() => retain_body(body, ownership)),
        ir::FnBody::Dec { var, body } => {
            ownership.hand_over(vec![var], &body.free_vars(), &mut ops);
            bn_dec!(var.clone() => retain_body(body, ownership))
        }
    };
    wrap(ops, body)
}

#[cfg(test)]
mod tests {
    use super::super::tests::{body_of, load, transform};

    const LIST: &str = "(deftype Nil) (deftype Cons head tail)";

    #[test]
    fn unused_bindings_are_dropped() {
        let program = transform(&format!(
            "{} (defn main () (let (n (new Nil) m (new Nil)) (ret m)))",
            LIST
        ));
        let expected = load(&format!(
            "{} (defn main () (let (n (new Nil)) (dec n (let (m (new Nil)) (ret m)))))",
            LIST
        ));
        assert_eq!(body_of(&program, "main"), body_of(&expected, "main"));
    }

    #[test]
    fn live_arguments_are_retained() {
        let program = transform(&format!(
            "{} (defn twice (x) (let (l (new Cons x x)) (ret l)))
             (defn main () (let (n (new Nil) l (twice n) m (new Cons n l)) (ret m)))",
            LIST
        ));
        let expected = load(&format!(
            "{} (defn twice (x) (inc x (let (l (new Cons x x)) (ret l))))
             (defn main () (let (n (new Nil)) (inc n (let (l (twice n) m (new Cons n l)) (ret m)))))",
            LIST
        ));
        assert_eq!(body_of(&program, "twice"), body_of(&expected, "twice"));
        assert_eq!(body_of(&program, "main"), body_of(&expected, "main"));
    }

    #[test]
    fn projections_outliving_their_record_are_retained() {
        let program = transform(&format!(
            "{} (defn tail (xs)
               (case xs
                 Nil (ret xs)
                 Cons (let (t (proj tail xs)) (ret t))))",
            LIST
        ));
        let expected = load(&format!(
            "{} (defn tail (xs)
               (case xs
                 Nil (ret xs)
                 Cons (let (t (proj tail xs)) (inc t (dec xs (ret t))))))",
            LIST
        ));
        assert_eq!(body_of(&program, "tail"), body_of(&expected, "tail"));
    }

    #[test]
    fn retained_projections_become_owners() {
        let program = transform(&format!(
            "{} (defn second (xs)
               (case xs
                 Nil (ret xs)
                 Cons (let (t (proj tail xs) h (proj head t)) (ret h))))",
            LIST
        ));
        let expected = load(&format!(
            "{} (defn second (xs)
               (case xs
                 Nil (ret xs)
                 Cons (let (t (proj tail xs))
                        (inc t (dec xs (let (h (proj head t)) (inc h (dec t (ret h)))))))))",
            LIST
        ));
        assert_eq!(body_of(&program, "second"), body_of(&expected, "second"));
    }

    #[test]
    fn projections_of_dead_projections_follow_the_root() {
        let program = transform(&format!(
            "{} (defn keep (xs) (ret xs))
             (defn pick (xs) (let (t (proj tail xs) h (proj head t) k (keep xs)) (ret h)))",
            LIST
        ));
        let expected = load(&format!(
            "{} (defn keep (xs) (ret xs))
             (defn pick (xs)
               (let (t (proj tail xs) h (proj head t)) (inc h (let (k (keep xs)) (dec k (ret h))))))",
            LIST
        ));
        assert_eq!(body_of(&program, "pick"), body_of(&expected, "pick"));
    }
}
