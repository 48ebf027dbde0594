use crate::diagnostics::Spanned;

pub type Ident = String;

#[derive(Debug)]
pub enum Expr {
    New {
        tag: Spanned<Ident>,
        fields: Vec<Spanned<Ident>>,
    },
    Proj {
        field: Spanned<Ident>,
        record: Spanned<Ident>,
    },
    /// `(pap f x ...)`; whether `f` names a function or a local is decided while lowering.
    Pap {
        target: Spanned<Ident>,
        args: Vec<Spanned<Ident>>,
    },
    /// `(f x ...)`, the full application counterpart of `Pap`.
    App {
        target: Spanned<Ident>,
        args: Vec<Spanned<Ident>>,
    },
    Reset(Spanned<Ident>),
    Reuse {
        token: Spanned<Ident>,
        tag: Spanned<Ident>,
        fields: Vec<Spanned<Ident>>,
    },
}

#[derive(Debug)]
pub enum Body {
    Ret(Spanned<Ident>),
    Let {
        bindings: Vec<(Spanned<Ident>, Spanned<Expr>)>,
        body: Box<Spanned<Body>>,
    },
    Case {
        scrutinee: Spanned<Ident>,
        arms: Vec<(Spanned<Ident>, Spanned<Body>)>,
    },
    Inc {
        var: Spanned<Ident>,
        body: Box<Spanned<Body>>,
    },
    Dec {
        var: Spanned<Ident>,
        body: Box<Spanned<Body>>,
    },
}

#[derive(Debug)]
pub struct FnDecl {
    pub name: Spanned<Ident>,
    pub params: Vec<Spanned<Ident>>,
    pub body: Spanned<Body>,
}

#[derive(Debug)]
pub struct TypeDecl {
    pub tag: Spanned<Ident>,
    pub fields: Vec<Spanned<Ident>>,
}

#[derive(Debug)]
pub enum Item {
    Fn(Box<FnDecl>),
    Type(TypeDecl),
}

#[derive(Debug)]
pub struct Ast {
    pub items: Vec<Spanned<Item>>,
}
