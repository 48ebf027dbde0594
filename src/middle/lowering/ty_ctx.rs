use crate::diagnostics::{Diagnostic, FileId, Label, Result, Span};
use crate::driver::Opts;
use crate::middle::ir;
use crate::syntax::ast;

use std::collections::HashMap;

#[derive(Debug)]
pub(super) struct TyLoweringCtx<'ast> {
    #[allow(unused)]
    sess: &'ast Opts,
    file_id: FileId,
    types: Vec<ir::TypeDef>,
    tags: HashMap<&'ast ast::Ident, (usize, Span)>,
    fields: HashMap<&'ast ast::Ident, Span>,
}

impl<'ast> TyLoweringCtx<'ast> {
    pub(super) fn new(sess: &'ast Opts, file_id: FileId) -> TyLoweringCtx<'ast> {
        TyLoweringCtx {
            sess,
            file_id,
            types: vec![],
            tags: HashMap::new(),
            fields: HashMap::new(),
        }
    }

    fn bind(&mut self, decl: &'ast ast::TypeDecl) -> Result<()> {
        if let Some((_, span)) = self.tags.get(&*decl.tag) {
            return Err(Diagnostic::new_error(
                "previously bound type name",
                Label::new(
                    self.file_id,
                    decl.tag.span(),
                    &format!("attempt to rebind '{}' here", &*decl.tag),
                ),
            )
            .with_secondary_labels(vec![Label::new(
                self.file_id,
                *span,
                "previously bound here",
            )]));
        }
        let mut fields: Vec<ir::FieldName> = vec![];
        for field in decl.fields.iter() {
            let field_name = ir::FieldName::new(&**field, field.span());
            if let Some(previous) = fields.iter().find(|other| **other == field_name) {
                return Err(Diagnostic::new_error(
                    "malformed type declaration",
                    Label::new(
                        self.file_id,
                        field.span(),
                        &format!("'{}' is declared twice", &**field),
                    ),
                )
                .with_secondary_labels(vec![Label::new(
                    self.file_id,
                    previous.span(),
                    "first declared here",
                )]));
            }
            self.fields.entry(&**field).or_insert_with(|| field.span());
            fields.push(field_name);
        }
        debug!("bound constructor '{}' with {} field(s)", &*decl.tag, fields.len());
        self.tags
            .insert(&*decl.tag, (self.types.len(), decl.tag.span()));
        self.types.push(ir::TypeDef {
            tag: ir::CtorName::new(&*decl.tag, decl.tag.span()),
            fields,
        });
        Ok(())
    }

    pub(super) fn register<T>(&mut self, items: T) -> Result<()>
    where
        T: Iterator<Item = &'ast ast::Item>,
    {
        for item in items {
            if let ast::Item::Type(decl) = item {
                self.bind(decl)?;
            }
        }
        Ok(())
    }

    pub(super) fn lookup(&self, tag: &'ast ast::Ident, span: Span) -> Result<&ir::TypeDef> {
        if let Some((idx, _)) = self.tags.get(tag) {
            Ok(&self.types[*idx])
        } else {
            Err(Diagnostic::new_error(
                "reference to unknown constructor",
                Label::new(
                    self.file_id,
                    span,
                    &format!("'{}' is not declared by any 'deftype'", tag),
                ),
            ))
        }
    }

    #[inline]
    pub(super) fn lookup_ctor(&self, tag: &'ast ast::Ident, span: Span) -> Result<ir::CtorName> {
        Ok(self.lookup(tag, span)?.tag.with_span(span))
    }

    pub(super) fn lookup_field(&self, field: &'ast ast::Ident, span: Span) -> Result<ir::FieldName> {
        if self.fields.contains_key(field) {
            Ok(ir::FieldName::new(field.as_str(), span))
        } else {
            Err(Diagnostic::new_error(
                "reference to unknown field",
                Label::new(
                    self.file_id,
                    span,
                    &format!("no constructor declares a field named '{}'", field),
                ),
            ))
        }
    }

    pub(super) fn into_types(self) -> Vec<ir::TypeDef> {
        self.types
    }
}
