//! Drop and reuse insertion.
//!
//! Inside every arm of a `case` on a variable that owns its value, the variable is dropped as
//! soon as it is dead. When a constructor of the matched tag is built further down, the drop
//! becomes a `reset` whose token that construction `reuse`s.

use crate::middle::analysis::{consumed, FreeVars};
use crate::middle::ir;

use super::LocalTransformCtx;

impl<'p, 'ctx> LocalTransformCtx<'p, 'ctx> {
    pub(super) fn insert_reuse(&self, body: ir::FnBody) -> ir::FnBody {
        match body {
            ir::FnBody::Ret(_) => body,
            ir::FnBody::Let {
                binding,
                expr,
                body,
            } => bn_let!(binding, expr => self.insert_reuse(*body)),
            ir::FnBody::Case { scrutinee, arms } => {
                let arms = arms
                    .into_iter()
                    .map(|(tag, arm)| {
                        let arm = if self.owners.contains(&scrutinee) {
                            self.drop_dead(arm, &scrutinee, &tag)
                        } else {
                            arm
                        };
                        (tag, self.insert_reuse(arm))
                    })
                    .collect();
                ir::FnBody::Case { scrutinee, arms }
            }
            ir::FnBody::Inc { var, body } => bn_inc!(var => self.insert_reuse(*body)),
            ir::FnBody::Dec { var, body } => bn_dec!(var => self.insert_reuse(*body)),
        }
    }

    /// Walks `body` up to the point where `var` dies, and drops it there unless that last use
    /// took the reference over.
    fn drop_dead(&self, body: ir::FnBody, var: &ir::Variable, tag: &ir::CtorName) -> ir::FnBody {
        if !body.mentions(var) {
            return self.drop_before(body, var, tag);
        }
        match body {
            ir::FnBody::Ret(_) => body,
            ir::FnBody::Let {
                binding,
                expr,
                body,
            } => {
                if body.mentions(var) {
                    bn_let!(binding, expr => self.drop_dead(*body, var, tag))
                } else if consumed(&expr).contains(&var) {
                    bn_let!(binding, expr => *body)
                } else {
                    bn_let!(binding, expr => self.drop_before(*body, var, tag))
                }
            }
            ir::FnBody::Case { scrutinee, arms } => ir::FnBody::Case {
                scrutinee,
                arms: arms
                    .into_iter()
                    .map(|(arm_tag, arm)| (arm_tag, self.drop_dead(arm, var, tag)))
                    .collect(),
            },
            ir::FnBody::Inc { var: inced, body } => {
                if body.mentions(var) {
                    bn_inc!(inced => self.drop_dead(*body, var, tag))
                } else {
                    bn_inc!(inced => self.drop_before(*body, var, tag))
                }
            }
            ir::FnBody::Dec { var: deced, body } => {
                if body.mentions(var) {
                    bn_dec!(deced => self.drop_dead(*body, var, tag))
                } else {
                    bn_dec!(deced => *body)
                }
            }
        }
    }

    fn drop_before(&self, body: ir::FnBody, var: &ir::Variable, tag: &ir::CtorName) -> ir::FnBody {
        if !builds(&body, tag) {
            return bn_dec!(var.clone() => body);
        }
        let token = self.fresh_token();
        trace!("'{}': {} reset into {}", self.def.name, var, token);
        let body = reuse_first(body, &token, tag);
        bn_reset!(token, var.clone() => body)
    }
}

/// Whether some path through `body` builds a constructor tagged `tag`. One arm of a `case` is
/// enough.
fn builds(body: &ir::FnBody, tag: &ir::CtorName) -> bool {
    match body {
        ir::FnBody::Ret(_) => false,
        ir::FnBody::Let {
            expr: ir::Expr::Ctor(ctor),
            ..
        } if ctor.tag == *tag => true,
        ir::FnBody::Let { body, .. }
        | ir::FnBody::Inc { body, .. }
        | ir::FnBody::Dec { body, .. } => builds(body, tag),
        ir::FnBody::Case { arms, .. } => arms.values().any(|arm| builds(arm, tag)),
    }
}

/// Turns the first construction tagged `tag` along each path through `body` into a `reuse` of
/// `token`. Arms of a `case` are rewritten independently.
fn reuse_first(body: ir::FnBody, token: &ir::Variable, tag: &ir::CtorName) -> ir::FnBody {
    match body {
        ir::FnBody::Ret(_) => body,
        ir::FnBody::Let {
            binding,
            expr: ir::Expr::Ctor(ctor),
            body,
        } if ctor.tag == *tag => bn_let!(binding, bn_reuse!(token.clone(), ctor) => *body),
        ir::FnBody::Let {
            binding,
            expr,
            body,
        } => bn_let!(binding, expr => reuse_first(*body, token, tag)),
        ir::FnBody::Case { scrutinee, arms } => ir::FnBody::Case {
            scrutinee,
            arms: arms
                .into_iter()
                .map(|(arm_tag, arm)| (arm_tag, reuse_first(arm, token, tag)))
                .collect(),
        },
        ir::FnBody::Inc { var, body } => bn_inc!(var => reuse_first(*body, token, tag)),
        ir::FnBody::Dec { var, body } => bn_dec!(var => reuse_first(*body, token, tag)),
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{body_of, load};
    use super::super::TransformCtx;
    use crate::middle::ir;

    /// Drop and reuse insertion alone, without the reference count bookkeeping.
    fn reuse_only(src: &str, name: &str) -> ir::FnBody {
        let program = load(src);
        let ctx = TransformCtx::new(&program);
        let def = program.lookup_fn(&ir::FnName::synthetic(name)).unwrap();
        let local = super::super::LocalTransformCtx::new(&ctx, def);
        local.insert_reuse(def.body.clone())
    }

    const LIST: &str = "(deftype Nil) (deftype Cons head tail)";

    #[test]
    fn reuse_in_one_arm_is_enough() {
        let src = format!(
            "{} (deftype Some val) (deftype None)
             (defn first (xs)
               (case xs
                 Nil (let (n (new None)) (ret n))
                 Cons (let (h (proj head xs) t (proj tail xs)) (case h
                   Nil (let (c (new Cons h t)) (ret c))
                   Cons (ret t)))))",
            LIST
        );
        let expected = load(&format!(
            "{} (deftype Some val) (deftype None)
             (defn first (xs)
               (case xs
                 Nil (dec xs (let (n (new None)) (ret n)))
                 Cons (let (h (proj head xs) t (proj tail xs) _r0 (reset xs)) (case h
                   Nil (let (c (reuse _r0 Cons h t)) (ret c))
                   Cons (ret t)))))",
            LIST
        ));
        assert_eq!(reuse_only(&src, "first"), body_of(&expected, "first"));
    }

    #[test]
    fn consumed_scrutinees_are_not_dropped() {
        let src = format!(
            "{} (defn keep (xs)
               (case xs
                 Nil (ret xs)
                 Cons (let (ys (new Cons xs xs)) (ret ys))))",
            LIST
        );
        assert_eq!(reuse_only(&src, "keep"), body_of(&load(&src), "keep"));
    }

    #[test]
    fn projected_scrutinees_are_not_dropped() {
        let src = format!(
            "{} (defn second (xs)
               (case xs
                 Nil (ret xs)
                 Cons (let (t (proj tail xs)) (case t
                   Nil (ret xs)
                   Cons (let (u (proj tail t) c (new Cons u u)) (ret c))))))",
            LIST
        );
        let expected = load(&format!(
            "{} (defn second (xs)
               (case xs
                 Nil (ret xs)
                 Cons (let (t (proj tail xs)) (case t
                   Nil (ret xs)
                   Cons (let (_r0 (reset xs) u (proj tail t) c (reuse _r0 Cons u u)) (ret c))))))",
            LIST
        ));
        assert_eq!(reuse_only(&src, "second"), body_of(&expected, "second"));
    }

    #[test]
    fn unmatched_tags_fall_back_to_dec() {
        let src = "(deftype Pair fst snd) (deftype Box val)
             (defn unbox (p)
               (case p
                 Pair (let (a (proj fst p) b (new Box a)) (ret b))))";
        let expected = load(
            "(deftype Pair fst snd) (deftype Box val)
             (defn unbox (p)
               (case p
                 Pair (let (a (proj fst p)) (dec p (let (b (new Box a)) (ret b))))))",
        );
        assert_eq!(reuse_only(src, "unbox"), body_of(&expected, "unbox"));
    }
}
