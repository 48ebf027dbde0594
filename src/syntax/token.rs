#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    LParen,
    RParen,
    Ident,
    Defn,
    Deftype,
    Let,
    Case,
    Ret,
    Inc,
    Dec,
    New,
    Proj,
    Pap,
    Reset,
    Reuse,
}

#[derive(Clone, Debug)]
pub struct Token(Kind, Option<String>);

impl From<Kind> for Token {
    fn from(kind: Kind) -> Token {
        Token(kind, None)
    }
}

impl Token {
    pub fn new(kind: Kind, value: &str) -> Token {
        Token(kind, Some(value.to_string()))
    }

    pub fn kind(&self) -> Kind {
        self.0
    }

    pub fn is(&self, kind: Kind) -> bool {
        self.0 == kind
    }

    pub fn value(&self) -> Option<&str> {
        self.1.as_deref()
    }
}
