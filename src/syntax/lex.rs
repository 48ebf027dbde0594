use crate::diagnostics::{Diagnostic, FileId, Files, Label, Result, Span, Spanned};
use crate::syntax::token::{Kind, Token};

use std::iter::FusedIterator;
use std::str::Chars;

pub struct Lexer<'a> {
    file_id: FileId,
    initial_len: usize,
    chars: Chars<'a>,
}

#[inline]
fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '\''
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Spanned<Token>>;

    fn next(&mut self) -> Option<Self::Item> {
        let lo = self.index();
        let token = match self.chars.next()? {
            c if c.is_whitespace() => {
                self.skip_whitespace();
                return self.next();
            }
            ';' => {
                while self.chars.next()? != '\n' {}
                return self.next();
            }
            '(' => Kind::LParen.into(),
            ')' => Kind::RParen.into(),
            c if is_ident_char(c) => self.next_ident_or_keyword(c),
            c => {
                return Some(Err(Diagnostic::new_error(
                    "found invalid token",
                    Label::new(
                        self.file_id,
                        lo..self.index(),
                        &format!("'{}' is not valid here", c),
                    ),
                )))
            }
        };
        let hi = self.index();
        Some(Ok(Span::new(lo, hi).span(token)))
    }
}

impl<'a> FusedIterator for Lexer<'a> {}

impl<'a> Lexer<'a> {
    pub fn new(files: &Files, file_id: FileId) -> Lexer {
        Lexer {
            file_id,
            initial_len: files.source(file_id).as_bytes().len(),
            chars: files.source(file_id).chars(),
        }
    }

    fn index(&self) -> u32 {
        (self.initial_len - self.chars.as_str().as_bytes().len()) as u32
    }

    fn nth_char(&self, n: usize) -> char {
        self.chars.clone().nth(n).unwrap_or('\0')
    }

    fn skip_whitespace(&mut self) {
        while self.nth_char(0).is_whitespace() {
            self.chars.next();
        }
    }

    fn next_ident_or_keyword(&mut self, first: char) -> Token {
        let mut data = String::new();
        data.push(first);
        while is_ident_char(self.nth_char(0)) {
            data.push(self.nth_char(0));
            self.chars.next();
        }
        match data.as_str() {
            "defn" => Kind::Defn.into(),
            "deftype" => Kind::Deftype.into(),
            "let" => Kind::Let.into(),
            "case" => Kind::Case.into(),
            "ret" => Kind::Ret.into(),
            "inc" => Kind::Inc.into(),
            "dec" => Kind::Dec.into(),
            "new" => Kind::New.into(),
            "proj" => Kind::Proj.into(),
            "pap" => Kind::Pap.into(),
            "reset" => Kind::Reset.into(),
            "reuse" => Kind::Reuse.into(),
            data => Token::new(Kind::Ident, data),
        }
    }
}
