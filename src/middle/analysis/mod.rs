//! Syntactic facts about function bodies that the transformations are driven by.

use crate::common::Set;
use crate::middle::ir;

mod ownership;

pub use ownership::{consumed, Binding};

/// The variables an expression or body reads without binding them itself. A variable is dead at
/// a point in a body exactly when it is not free in what remains to run from there.
pub trait FreeVars {
    fn free_vars(&self) -> Set<ir::Variable>;

    #[inline]
    fn mentions(&self, var: &ir::Variable) -> bool {
        self.free_vars().contains(var)
    }
}

impl FreeVars for ir::Ctor {
    fn free_vars(&self) -> Set<ir::Variable> {
        self.fields.iter().cloned().collect()
    }
}

impl FreeVars for ir::Expr {
    fn free_vars(&self) -> Set<ir::Variable> {
        match self {
            ir::Expr::ConstAppFull { args, .. } | ir::Expr::ConstAppPart { args, .. } => {
                args.iter().cloned().collect()
            }
            ir::Expr::VarPapFull { pap, args } | ir::Expr::VarPapPart { pap, args } => {
                let mut vars = Set::singleton(pap.clone());
                vars.union(args.iter().cloned().collect());
                vars
            }
            ir::Expr::Ctor(ctor) => ctor.free_vars(),
            ir::Expr::Proj { record, .. } => Set::singleton(record.clone()),
            ir::Expr::Reset(var) => Set::singleton(var.clone()),
            ir::Expr::Reuse { token, ctor } => {
                let mut vars = Set::singleton(token.clone());
                vars.union(ctor.free_vars());
                vars
            }
        }
    }
}

impl FreeVars for ir::FnBody {
    fn free_vars(&self) -> Set<ir::Variable> {
        match self {
            ir::FnBody::Ret(var) => Set::singleton(var.clone()),
            ir::FnBody::Let {
                binding,
                expr,
                body,
            } => {
                let mut vars = body.free_vars();
                vars.remove(binding);
                let mut used = expr.free_vars();
                used.union(vars);
                used
            }
            ir::FnBody::Case { scrutinee, arms } => {
                let mut vars = Set::singleton(scrutinee.clone());
                for arm in arms.values() {
                    vars.union(arm.free_vars());
                }
                vars
            }
            ir::FnBody::Inc { var, body } | ir::FnBody::Dec { var, body } => {
                let mut vars = Set::singleton(var.clone());
                vars.union(body.free_vars());
                vars
            }
        }
    }
}

/// Every variable a body binds or reads, for picking names that cannot collide.
pub fn all_vars(def: &ir::FnDef) -> Set<ir::Variable> {
    fn visit(body: &ir::FnBody, vars: &mut Set<ir::Variable>) {
        vars.union(body.free_vars());
        match body {
            ir::FnBody::Ret(_) => {}
            ir::FnBody::Let { binding, body, .. } => {
                vars.insert(binding.clone());
                visit(body, vars);
            }
            ir::FnBody::Case { arms, .. } => {
                for arm in arms.values() {
                    visit(arm, vars);
                }
            }
            ir::FnBody::Inc { body, .. } | ir::FnBody::Dec { body, .. } => visit(body, vars),
        }
    }

    let mut vars: Set<ir::Variable> = def.params.iter().cloned().collect();
    visit(&def.body, &mut vars);
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Map;

    fn var(name: &str) -> ir::Variable {
        ir::Variable::synthetic(name)
    }

    fn vars(names: &[&str]) -> Set<ir::Variable> {
        names.iter().map(|name| var(name)).collect()
    }

    #[test]
    fn let_hides_its_binding() {
        // (let (a (proj fst p)) (new Pair a q))
        let body = ir::FnBody::mk_let(
            var("a"),
            ir::Expr::Proj {
                field: ir::FieldName::synthetic("fst"),
                record: var("p"),
            },
            ir::FnBody::mk_let(
                var("r"),
                ir::Expr::Ctor(ir::Ctor {
                    tag: ir::CtorName::synthetic("Pair"),
                    fields: vec![var("a"), var("q")],
                }),
                ir::FnBody::Ret(var("r")),
            ),
        );
        assert_eq!(body.free_vars(), vars(&["p", "q"]));
        assert!(!body.mentions(&var("a")));
    }

    #[test]
    fn case_collects_every_arm() {
        let mut arms = Map::new();
        arms.insert(ir::CtorName::synthetic("Nil"), ir::FnBody::Ret(var("acc")));
        arms.insert(ir::CtorName::synthetic("Cons"), ir::FnBody::Ret(var("xs")));
        let body = ir::FnBody::Case {
            scrutinee: var("xs"),
            arms,
        };
        assert_eq!(body.free_vars(), vars(&["xs", "acc"]));
    }

    #[test]
    fn pap_heads_are_free() {
        let expr = ir::Expr::VarPapFull {
            pap: var("f"),
            args: vec![var("x"), var("x")],
        };
        assert_eq!(expr.free_vars(), vars(&["f", "x"]));
    }

    #[test]
    fn all_vars_includes_dead_bindings() {
        let def = ir::FnDef {
            name: ir::FnName::synthetic("f"),
            params: vec![var("x")],
            body: ir::FnBody::mk_let(
                var("unused"),
                ir::Expr::ConstAppFull {
                    target: ir::FnName::synthetic("g"),
                    args: vec![],
                },
                ir::FnBody::Ret(var("x")),
            ),
        };
        assert_eq!(all_vars(&def), vars(&["x", "unused"]));
    }
}
