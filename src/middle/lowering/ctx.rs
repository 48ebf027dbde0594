use crate::common::Map;
use crate::diagnostics::{Diagnostic, Label, Result, Span, Spanned};
use crate::middle::ir;
use crate::syntax::ast;

use std::collections::HashMap;

use super::LoweringSess;

/// Name resolution for one function body. Every `case` arm gets a child context so that sibling
/// arms may bind the same names independently.
#[derive(Debug)]
pub(super) struct LoweringCtx<'lcx, 'ast> {
    sess: &'lcx LoweringSess<'ast>,
    parent: Option<&'lcx LoweringCtx<'lcx, 'ast>>,
    local_map: HashMap<&'ast ast::Ident, Span>,
}

impl<'lcx, 'ast> LoweringCtx<'lcx, 'ast> {
    pub(super) fn new(sess: &'lcx LoweringSess<'ast>) -> LoweringCtx<'lcx, 'ast> {
        LoweringCtx {
            sess,
            parent: None,
            local_map: HashMap::new(),
        }
    }

    fn mk_child<'c>(&'c self) -> LoweringCtx<'c, 'ast> {
        LoweringCtx {
            sess: self.sess,
            parent: Some(self),
            local_map: HashMap::new(),
        }
    }

    fn bind_point(&self, ident: &'ast ast::Ident) -> Option<Span> {
        if let Some(span) = self.local_map.get(ident) {
            Some(*span)
        } else {
            self.parent.and_then(|parent| parent.bind_point(ident))
        }
    }

    fn lookup(&self, ident: &'ast Spanned<ast::Ident>) -> Result<ir::Variable> {
        if self.bind_point(ident).is_some() {
            Ok(ir::Variable::new(ident.as_str(), ident.span()))
        } else {
            Err(Diagnostic::new_error(
                "reference to unbound variable",
                Label::new(
                    self.sess.file_id,
                    ident.span(),
                    &format!("'{}' is not bound here (while lowering)", &**ident),
                ),
            ))
        }
    }

    pub(super) fn bind(&mut self, ident: &'ast Spanned<ast::Ident>) -> Result<ir::Variable> {
        if let Some(previous) = self.bind_point(ident) {
            return Err(Diagnostic::new_error(
                "attempt to rebind variable",
                Label::new(
                    self.sess.file_id,
                    ident.span(),
                    &format!("'{}' is already bound in this scope", &**ident),
                ),
            )
            .with_secondary_labels(vec![Label::new(
                self.sess.file_id,
                previous,
                "previously bound here",
            )]));
        }
        self.local_map.insert(ident, ident.span());
        Ok(ir::Variable::new(ident.as_str(), ident.span()))
    }

    fn lookup_all(&self, idents: &'ast [Spanned<ast::Ident>]) -> Result<Vec<ir::Variable>> {
        idents.iter().map(|ident| self.lookup(ident)).collect()
    }

    fn lower_ctor(
        &self,
        tag: &'ast Spanned<ast::Ident>,
        fields: &'ast [Spanned<ast::Ident>],
    ) -> Result<ir::Ctor> {
        Ok(ir::Ctor {
            tag: self.sess.tys.lookup_ctor(tag, tag.span())?,
            fields: self.lookup_all(fields)?,
        })
    }

    fn lower_expr(&self, expr: &'ast ast::Expr) -> Result<ir::Expr> {
        Ok(match expr {
            ast::Expr::New { tag, fields } => ir::Expr::Ctor(self.lower_ctor(tag, fields)?),
            ast::Expr::Proj { field, record } => ir::Expr::Proj {
                field: self.sess.tys.lookup_field(field, field.span())?,
                record: self.lookup(record)?,
            },
            // a local shadows a global function of the same name
            ast::Expr::Pap { target, args } if self.bind_point(target).is_some() => {
                ir::Expr::VarPapPart {
                    pap: self.lookup(target)?,
                    args: self.lookup_all(args)?,
                }
            }
            ast::Expr::Pap { target, args } => ir::Expr::ConstAppPart {
                target: self.sess.lookup(target, target.span())?,
                args: self.lookup_all(args)?,
            },
            ast::Expr::App { target, args } if self.bind_point(target).is_some() => {
                ir::Expr::VarPapFull {
                    pap: self.lookup(target)?,
                    args: self.lookup_all(args)?,
                }
            }
            ast::Expr::App { target, args } => ir::Expr::ConstAppFull {
                target: self.sess.lookup(target, target.span())?,
                args: self.lookup_all(args)?,
            },
            ast::Expr::Reset(var) => ir::Expr::Reset(self.lookup(var)?),
            ast::Expr::Reuse { token, tag, fields } => ir::Expr::Reuse {
                token: self.lookup(token)?,
                ctor: self.lower_ctor(tag, fields)?,
            },
        })
    }

    fn lower_arms(
        &self,
        arms: &'ast [(Spanned<ast::Ident>, Spanned<ast::Body>)],
    ) -> Result<Map<ir::CtorName, ir::FnBody>> {
        let mut lowered: Map<ir::CtorName, ir::FnBody> = Map::with_capacity(arms.len());
        for (tag, body) in arms.iter() {
            let tag = self.sess.tys.lookup_ctor(tag, tag.span())?;
            if let Some((previous, _)) = lowered.iter().find(|(other, _)| **other == tag) {
                return Err(Diagnostic::new_error(
                    "duplicate case arm",
                    Label::new(
                        self.sess.file_id,
                        tag.span(),
                        &format!("'{}' is already matched by this case", tag),
                    ),
                )
                .with_secondary_labels(vec![Label::new(
                    self.sess.file_id,
                    previous.span(),
                    "first matched here",
                )]));
            }
            let body = self.mk_child().lower_body(body)?;
            lowered.insert(tag, body);
        }
        Ok(lowered)
    }

    pub(super) fn lower_body(&mut self, body: &'ast ast::Body) -> Result<ir::FnBody> {
        Ok(match body {
            ast::Body::Ret(var) => ir::FnBody::Ret(self.lookup(var)?),
            ast::Body::Let { bindings, body } => {
                let mut lowered = Vec::with_capacity(bindings.len());
                for (binder, expr) in bindings.iter() {
                    let expr = self.lower_expr(expr)?;
                    lowered.push((self.bind(binder)?, expr));
                }
                let mut body = self.lower_body(body)?;
                for (binding, expr) in lowered.into_iter().rev() {
                    body = ir::FnBody::mk_let(binding, expr, body);
                }
                body
            }
            ast::Body::Case { scrutinee, arms } => ir::FnBody::Case {
                scrutinee: self.lookup(scrutinee)?,
                arms: self.lower_arms(arms)?,
            },
            ast::Body::Inc { var, body } => {
                ir::FnBody::mk_inc(self.lookup(var)?, self.lower_body(body)?)
            }
            ast::Body::Dec { var, body } => {
                ir::FnBody::mk_dec(self.lookup(var)?, self.lower_body(body)?)
            }
        })
    }
}
