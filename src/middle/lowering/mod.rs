use crate::diagnostics::{Diagnostic, FileId, Label, Result, Span, Spanned};
use crate::driver::Opts;
use crate::middle::ir;
use crate::pp;
use crate::syntax::ast;

use std::collections::HashMap;
use std::ops::Deref;

use self::ctx::LoweringCtx;
use self::ty_ctx::TyLoweringCtx;

mod ctx;
mod ty_ctx;

#[derive(Debug)]
struct LoweringSess<'ast> {
    sess: &'ast Opts,
    file_id: FileId,
    tys: TyLoweringCtx<'ast>,
    fns: Vec<ir::FnDef>,
    global_map: HashMap<&'ast ast::Ident, Span>,
}

impl<'ast> LoweringSess<'ast> {
    fn new(sess: &'ast Opts, file_id: FileId, tys: TyLoweringCtx<'ast>) -> LoweringSess<'ast> {
        LoweringSess {
            sess,
            file_id,
            tys,
            fns: vec![],
            global_map: HashMap::new(),
        }
    }

    fn lookup(&self, ident: &'ast ast::Ident, span: Span) -> Result<ir::FnName> {
        if self.global_map.contains_key(ident) {
            Ok(ir::FnName::new(ident.as_str(), span))
        } else {
            Err(Diagnostic::new_error(
                "reference to unknown function",
                Label::new(
                    self.file_id,
                    span,
                    &format!("'{}' is neither a local nor a function", ident),
                ),
            ))
        }
    }

    fn bind(&mut self, ident: &'ast ast::Ident, span: Span) -> Result<()> {
        if let Some(previous) = self.global_map.get(ident) {
            Err(Diagnostic::new_error(
                "attempt to rebind function name",
                Label::new(
                    self.file_id,
                    span,
                    &format!("'{}' is already bound to a function", ident),
                ),
            )
            .with_secondary_labels(vec![Label::new(
                self.file_id,
                *previous,
                "previously bound here",
            )]))
        } else {
            self.global_map.insert(ident, span);
            Ok(())
        }
    }

    fn lower_decl(&self, decl: &'ast ast::FnDecl) -> Result<ir::FnDef> {
        let mut lcx = LoweringCtx::new(self);
        let mut params = Vec::with_capacity(decl.params.len());
        for param in decl.params.iter() {
            params.push(lcx.bind(param).map_err(|diagnostic| {
                Diagnostic::new_error(
                    "attempted to rebind formal parameter",
                    Label::new(
                        self.file_id,
                        param.span(),
                        "a formal parameter with this name already exists",
                    ),
                )
                .with_secondary_labels(diagnostic.secondary_labels)
            })?);
        }
        let body = lcx.lower_body(&decl.body)?;
        debug!("lowered '{}' ({} parameter(s))", &*decl.name, params.len());
        Ok(ir::FnDef {
            name: ir::FnName::new(decl.name.as_str(), decl.name.span()),
            params,
            body,
        })
    }

    fn register<T>(&mut self, items: T) -> Result<()>
    where
        T: Iterator<Item = &'ast ast::Item>,
    {
        for item in items {
            if let ast::Item::Fn(decl) = item {
                self.bind(&decl.name, decl.name.span())?;
            }
        }
        Ok(())
    }

    fn lower<T>(&mut self, items: T) -> Result<()>
    where
        T: Iterator<Item = &'ast ast::Item>,
    {
        for item in items {
            if let ast::Item::Fn(decl) = item {
                let def = self.lower_decl(decl)?;
                self.fns.push(def);
            }
        }
        Ok(())
    }

    fn complete(self) -> ir::Program {
        let program = ir::Program::new(self.file_id, self.tys.into_types(), self.fns);
        // with --reuse only the transformed program is dumped
        if self.sess.dump_ir && !self.sess.reuse {
            pp!(&program);
        }
        program
    }
}

/// Resolves every name in the tree and produces the program's definition tables. Types and
/// functions are registered before any body is lowered, so definitions may appear in any order.
pub fn lower(sess: &Opts, file_id: FileId, ast: &ast::Ast) -> Result<ir::Program> {
    let mut tys = TyLoweringCtx::new(sess, file_id);
    tys.register(ast.items.iter().map(Spanned::deref))?;
    let mut lowering_sess = LoweringSess::new(sess, file_id, tys);
    lowering_sess.register(ast.items.iter().map(Spanned::deref))?;
    lowering_sess.lower(ast.items.iter().map(Spanned::deref))?;
    Ok(lowering_sess.complete())
}
