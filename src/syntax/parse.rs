use crate::diagnostics::{Diagnostic, FileId, Files, Label, Result, Span, Spanned};
use crate::driver::Opts;
use crate::syntax::ast;
use crate::syntax::lex::Lexer;
use crate::syntax::token::{Kind, Token};

use std::iter::FusedIterator;

pub(super) struct Parser<'a> {
    file_id: FileId,
    current: Option<Spanned<Token>>,
    last_span: Span,
    tokens: Lexer<'a>,
    _sess: &'a Opts,
}

impl<'a> Iterator for Parser<'a> {
    type Item = Result<Spanned<ast::Item>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            None
        } else {
            Some(self.next_item())
        }
    }
}

impl<'a> FusedIterator for Parser<'a> {}

impl<'a> Parser<'a> {
    pub fn new(sess: &'a Opts, files: &'a Files, file_id: FileId) -> Result<Parser<'a>> {
        let mut tokens = Lexer::new(files, file_id);
        let current = tokens.next().transpose()?;
        Ok(Parser {
            file_id,
            current,
            last_span: Span::dummy(),
            tokens,
            _sess: sess,
        })
    }

    fn multi_expectation_diagnostic(&self, expected: Vec<Kind>) -> Diagnostic {
        let mut label = String::from("expected ");
        for (i, kind) in expected.iter().enumerate() {
            if i + 1 < expected.len() {
                label.push_str(&format!("'{:?}', ", kind))
            } else {
                label.push_str(&format!("or '{:?}'", kind))
            }
        }
        let (span, msg) = if let Some(ref current) = self.current {
            label.push_str(&format!(", but got '{:?}'", current.kind()));
            (current.span(), "token type mismatch")
        } else {
            (self.last_span.clip(), "unexpected end of input")
        };
        Diagnostic::new_error(msg, Label::new(self.file_id, span, label.as_str()))
    }

    fn eat(&mut self, kind: Kind) -> Result<Spanned<Token>> {
        match self.current.take() {
            Some(current) if current.is(kind) => {
                self.current = self.tokens.next().transpose()?;
                self.last_span = current.span();
                Ok(current)
            }
            Some(current) => {
                let diagnostic = Diagnostic::new_error(
                    "token type mismatch",
                    Label::new(
                        self.file_id,
                        current.span(),
                        &format!("expected '{:?}', but got '{:?}'", kind, current.kind()),
                    ),
                );
                self.current = Some(current);
                Err(diagnostic)
            }
            None => Err(Diagnostic::new_error(
                "unexpected end of input",
                Label::new(
                    self.file_id,
                    self.last_span.clip(),
                    &format!("expected '{:?}', but reached end of input", kind),
                ),
            )),
        }
    }

    #[inline]
    fn next_is(&self, kind: Kind) -> bool {
        self.current
            .as_ref()
            .map_or(false, |current| current.is(kind))
    }

    fn next_ident(&mut self) -> Result<Spanned<ast::Ident>> {
        let token = self.eat(Kind::Ident)?;
        Ok(token
            .span()
            .span(token.value().unwrap_or_default().to_string()))
    }

    /// Identifiers up to (but not including) the closing parenthesis of the enclosing form.
    fn next_idents(&mut self) -> Result<Vec<Spanned<ast::Ident>>> {
        let mut idents = vec![];
        while !self.next_is(Kind::RParen) {
            idents.push(self.next_ident()?);
        }
        Ok(idents)
    }

    fn next_expr(&mut self) -> Result<Spanned<ast::Expr>> {
        let lo = self.eat(Kind::LParen)?.span();
        let expr = if self.next_is(Kind::New) {
            self.eat(Kind::New)?;
            ast::Expr::New {
                tag: self.next_ident()?,
                fields: self.next_idents()?,
            }
        } else if self.next_is(Kind::Proj) {
            self.eat(Kind::Proj)?;
            ast::Expr::Proj {
                field: self.next_ident()?,
                record: self.next_ident()?,
            }
        } else if self.next_is(Kind::Pap) {
            self.eat(Kind::Pap)?;
            ast::Expr::Pap {
                target: self.next_ident()?,
                args: self.next_idents()?,
            }
        } else if self.next_is(Kind::Reset) {
            self.eat(Kind::Reset)?;
            ast::Expr::Reset(self.next_ident()?)
        } else if self.next_is(Kind::Reuse) {
            self.eat(Kind::Reuse)?;
            ast::Expr::Reuse {
                token: self.next_ident()?,
                tag: self.next_ident()?,
                fields: self.next_idents()?,
            }
        } else if self.next_is(Kind::Ident) {
            ast::Expr::App {
                target: self.next_ident()?,
                args: self.next_idents()?,
            }
        } else {
            return Err(self
                .multi_expectation_diagnostic(vec![
                    Kind::New,
                    Kind::Proj,
                    Kind::Pap,
                    Kind::Reset,
                    Kind::Reuse,
                    Kind::Ident,
                ])
                .with_notes(vec!["this is in order to form a valid expression".to_owned()]));
        };
        let span = lo.merge(self.eat(Kind::RParen)?.span());
        Ok(span.span(expr))
    }

    fn next_let_body(&mut self) -> Result<ast::Body> {
        self.eat(Kind::Let)?;
        self.eat(Kind::LParen)?;
        let mut bindings = vec![];
        while !self.next_is(Kind::RParen) {
            let binder = self.next_ident()?;
            let expr = self.next_expr()?;
            bindings.push((binder, expr));
        }
        self.eat(Kind::RParen)?;
        Ok(ast::Body::Let {
            bindings,
            body: Box::new(self.next_body()?),
        })
    }

    fn next_case_body(&mut self) -> Result<ast::Body> {
        self.eat(Kind::Case)?;
        let scrutinee = self.next_ident()?;
        let mut arms = vec![];
        while !self.next_is(Kind::RParen) {
            let tag = self.next_ident()?;
            let body = self.next_body()?;
            arms.push((tag, body));
        }
        Ok(ast::Body::Case { scrutinee, arms })
    }

    fn next_body(&mut self) -> Result<Spanned<ast::Body>> {
        let lo = self.eat(Kind::LParen)?.span();
        let body = if self.next_is(Kind::Ret) {
            self.eat(Kind::Ret)?;
            ast::Body::Ret(self.next_ident()?)
        } else if self.next_is(Kind::Let) {
            self.next_let_body()?
        } else if self.next_is(Kind::Case) {
            self.next_case_body()?
        } else if self.next_is(Kind::Inc) {
            self.eat(Kind::Inc)?;
            ast::Body::Inc {
                var: self.next_ident()?,
                body: Box::new(self.next_body()?),
            }
        } else if self.next_is(Kind::Dec) {
            self.eat(Kind::Dec)?;
            ast::Body::Dec {
                var: self.next_ident()?,
                body: Box::new(self.next_body()?),
            }
        } else if self.next_is(Kind::Ident) {
            let ident = self.next_ident()?;
            return Err(Diagnostic::new_error(
                "unknown keyword",
                Label::new(
                    self.file_id,
                    ident.span(),
                    &format!("'{}' cannot start a function body", &*ident),
                ),
            )
            .with_notes(vec![
                "a function body starts with one of 'ret', 'let', 'case', 'inc' or 'dec'"
                    .to_owned(),
            ]));
        } else {
            return Err(self.multi_expectation_diagnostic(vec![
                Kind::Ret,
                Kind::Let,
                Kind::Case,
                Kind::Inc,
                Kind::Dec,
            ]));
        };
        let span = lo.merge(self.eat(Kind::RParen)?.span());
        Ok(span.span(body))
    }

    fn next_fn_item(&mut self) -> Result<ast::Item> {
        self.eat(Kind::Defn)?;
        let name = self.next_ident()?;
        self.eat(Kind::LParen)?;
        let params = self.next_idents()?;
        self.eat(Kind::RParen)?;
        let body = self.next_body()?;
        Ok(ast::Item::Fn(Box::new(ast::FnDecl { name, params, body })))
    }

    fn next_type_item(&mut self) -> Result<ast::Item> {
        self.eat(Kind::Deftype)?;
        Ok(ast::Item::Type(ast::TypeDecl {
            tag: self.next_ident()?,
            fields: self.next_idents()?,
        }))
    }

    fn next_item(&mut self) -> Result<Spanned<ast::Item>> {
        if let Some(ref current) = self.current {
            if current.is(Kind::RParen) {
                return Err(Diagnostic::new_error(
                    "unbalanced parentheses",
                    Label::new(self.file_id, current.span(), "this ')' has no matching '('"),
                ));
            }
        }
        let lo = self.eat(Kind::LParen)?.span();
        let item = if self.next_is(Kind::Defn) {
            self.next_fn_item()?
        } else if self.next_is(Kind::Deftype) {
            self.next_type_item()?
        } else {
            return Err(self.multi_expectation_diagnostic(vec![Kind::Defn, Kind::Deftype]));
        };
        let span = lo.merge(self.eat(Kind::RParen)?.span());
        Ok(span.span(item))
    }
}
