use crate::diagnostics::{Diagnostic, FileId, Label, Result};
use crate::middle::ir;

/// Checks the arity rules of a program and re-checks scoping, which lowering guarantees but which
/// a transformation might break.
struct CheckCtx<'p> {
    program: &'p ir::Program,
    file_id: FileId,
}

struct LocalCheckCtx<'p, 'ctx> {
    ctx: &'ctx CheckCtx<'p>,
    def: &'p ir::FnDef,
    scope: Vec<&'p ir::Variable>,
}

impl<'p> CheckCtx<'p> {
    fn arity_mismatch(&self, span: crate::diagnostics::Span, msg: String) -> Diagnostic {
        Diagnostic::new_error("arity mismatch", Label::new(self.file_id, span, msg))
    }

    fn check_fn_arity(&self, target: &ir::FnName, supplied: usize, partial: bool) -> Result<()> {
        let def = self.program.lookup_fn(target).ok_or_else(|| {
            Diagnostic::new_error(
                "reference to unknown function",
                Label::new(
                    self.file_id,
                    target.span(),
                    &format!("'{}' is not a function", target),
                ),
            )
        })?;
        let expected = def.params.len();
        if partial && supplied >= expected {
            Err(self.arity_mismatch(
                target.span(),
                format!(
                    "a partial application of '{}' must supply fewer than {} argument(s), but {} were supplied",
                    target, expected, supplied
                ),
            ))
        } else if !partial && supplied != expected {
            Err(self.arity_mismatch(
                target.span(),
                format!(
                    "'{}' takes {} argument(s), but {} were supplied",
                    target, expected, supplied
                ),
            ))
        } else {
            Ok(())
        }
    }

    fn check_ctor(&self, ctor: &ir::Ctor) -> Result<()> {
        let def = self.program.lookup_type(&ctor.tag).ok_or_else(|| {
            Diagnostic::new_error(
                "reference to unknown constructor",
                Label::new(
                    self.file_id,
                    ctor.tag.span(),
                    &format!("'{}' is not declared by any 'deftype'", ctor.tag),
                ),
            )
        })?;
        if def.fields.len() != ctor.fields.len() {
            return Err(self.arity_mismatch(
                ctor.tag.span(),
                format!(
                    "'{}' has {} field(s), but {} were supplied",
                    ctor.tag,
                    def.fields.len(),
                    ctor.fields.len()
                ),
            )
            .with_secondary_labels(vec![Label::new(
                self.file_id,
                def.tag.span(),
                "declared here",
            )]));
        }
        Ok(())
    }

    fn check_program(program: &'p ir::Program) -> Result<()> {
        let ctx = CheckCtx {
            program,
            file_id: program.file_id(),
        };
        for def in program.fns() {
            LocalCheckCtx::check_def(&ctx, def)?;
        }
        Ok(())
    }
}

impl<'p, 'ctx> LocalCheckCtx<'p, 'ctx> {
    fn check_def(ctx: &'ctx CheckCtx<'p>, def: &'p ir::FnDef) -> Result<()> {
        let mut lcx = LocalCheckCtx {
            ctx,
            def,
            scope: vec![],
        };
        for param in def.params.iter() {
            lcx.bind(param)?;
        }
        lcx.check_body(&def.body)
    }

    fn bind(&mut self, var: &'p ir::Variable) -> Result<()> {
        if let Some(previous) = self.scope.iter().find(|bound| **bound == var) {
            return Err(Diagnostic::new_bug(
                "attempt to rebind variable",
                Label::new(
                    self.ctx.file_id,
                    var.span(),
                    &format!("'{}' is rebound in '{}'", var, self.def.name),
                ),
            )
            .with_secondary_labels(vec![Label::new(
                self.ctx.file_id,
                previous.span(),
                "previously bound here",
            )]));
        }
        self.scope.push(var);
        Ok(())
    }

    fn check_var(&self, var: &ir::Variable) -> Result<()> {
        if self.scope.iter().any(|bound| *bound == var) {
            Ok(())
        } else {
            Err(Diagnostic::new_bug(
                "reference to unbound variable",
                Label::new(
                    self.ctx.file_id,
                    var.span(),
                    &format!("'{}' is not bound here in '{}'", var, self.def.name),
                ),
            ))
        }
    }

    fn check_vars(&self, vars: &[ir::Variable]) -> Result<()> {
        vars.iter().try_for_each(|var| self.check_var(var))
    }

    fn check_expr(&self, expr: &ir::Expr) -> Result<()> {
        match expr {
            ir::Expr::ConstAppFull { target, args } => {
                self.ctx.check_fn_arity(target, args.len(), false)?;
                self.check_vars(args)
            }
            ir::Expr::ConstAppPart { target, args } => {
                self.ctx.check_fn_arity(target, args.len(), true)?;
                self.check_vars(args)
            }
            ir::Expr::VarPapFull { pap, args } | ir::Expr::VarPapPart { pap, args } => {
                self.check_var(pap)?;
                self.check_vars(args)
            }
            ir::Expr::Ctor(ctor) => {
                self.ctx.check_ctor(ctor)?;
                self.check_vars(&ctor.fields)
            }
            ir::Expr::Proj { field, record } => {
                if !self.ctx.program.declares_field(field) {
                    return Err(Diagnostic::new_error(
                        "reference to unknown field",
                        Label::new(
                            self.ctx.file_id,
                            field.span(),
                            &format!("no constructor declares a field named '{}'", field),
                        ),
                    ));
                }
                self.check_var(record)
            }
            ir::Expr::Reset(var) => self.check_var(var),
            ir::Expr::Reuse { token, ctor } => {
                self.check_var(token)?;
                self.ctx.check_ctor(ctor)?;
                self.check_vars(&ctor.fields)
            }
        }
    }

    fn check_body(&mut self, body: &'p ir::FnBody) -> Result<()> {
        match body {
            ir::FnBody::Ret(var) => self.check_var(var),
            ir::FnBody::Let {
                binding,
                expr,
                body,
            } => {
                self.check_expr(expr)?;
                self.bind(binding)?;
                self.check_body(body)?;
                self.scope.pop();
                Ok(())
            }
            ir::FnBody::Case { scrutinee, arms } => {
                self.check_var(scrutinee)?;
                for (tag, arm) in arms.iter() {
                    if self.ctx.program.lookup_type(tag).is_none() {
                        return Err(Diagnostic::new_error(
                            "reference to unknown constructor",
                            Label::new(
                                self.ctx.file_id,
                                tag.span(),
                                &format!("'{}' is not declared by any 'deftype'", tag),
                            ),
                        ));
                    }
                    self.check_body(arm)?;
                }
                Ok(())
            }
            ir::FnBody::Inc { var, body } | ir::FnBody::Dec { var, body } => {
                self.check_var(var)?;
                self.check_body(body)
            }
        }
    }
}

/// Enforces the load-time rules the evaluator relies on: full applications supply exactly the
/// declared parameters, partial ones strictly fewer, constructions exactly the declared fields,
/// projections a declared field name, and every variable is bound exactly once on its path.
pub fn check(program: &ir::Program) -> Result<()> {
    CheckCtx::check_program(program)?;
    debug!("checked {} function(s)", program.fns().count());
    Ok(())
}
