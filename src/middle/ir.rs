use crate::common::{Idx, IdxVec, Map};
use crate::diagnostics::{FileId, Span};

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

macro_rules! ident {
    ( $( #[$attr:meta] )* $name:ident ) => {
        $( #[$attr] )*
        #[derive(Clone)]
        pub struct $name {
            name: String,
            span: Span,
        }

        impl $name {
            pub fn new(name: impl Into<String>, span: Span) -> $name {
                $name {
                    name: name.into(),
                    span,
                }
            }

            /// A name that does not originate from any source text.
            pub fn synthetic(name: impl Into<String>) -> $name {
                $name::new(name, Span::dummy())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.name
            }

            #[inline]
            pub fn span(&self) -> Span {
                self.span
            }

            pub fn with_span(&self, span: Span) -> $name {
                $name::new(self.name.clone(), span)
            }
        }

        impl PartialEq for $name {
            #[inline]
            fn eq(&self, other: &Self) -> bool {
                self.name == other.name
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            #[inline]
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.name.hash(state)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.name)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.name)
            }
        }
    };
}

ident! {
    /// A local name, scoped to one function body. Compared by name only; the span records
    /// where this particular occurrence was written.
    Variable
}

ident! {
    FnName
}

ident! {
    /// The tag of a constructor, i.e. which of a type's shapes a record has.
    CtorName
}

ident! {
    FieldName
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ctor {
    pub tag: CtorName,
    pub fields: Vec<Variable>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    ConstAppFull {
        target: FnName,
        args: Vec<Variable>,
    },
    ConstAppPart {
        target: FnName,
        args: Vec<Variable>,
    },
    VarPapFull {
        pap: Variable,
        args: Vec<Variable>,
    },
    VarPapPart {
        pap: Variable,
        args: Vec<Variable>,
    },
    Ctor(Ctor),
    Proj {
        field: FieldName,
        record: Variable,
    },
    Reset(Variable),
    Reuse {
        token: Variable,
        ctor: Ctor,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FnBody {
    Ret(Variable),
    Let {
        binding: Variable,
        expr: Expr,
        body: Box<FnBody>,
    },
    Case {
        scrutinee: Variable,
        arms: Map<CtorName, FnBody>,
    },
    Inc {
        var: Variable,
        body: Box<FnBody>,
    },
    Dec {
        var: Variable,
        body: Box<FnBody>,
    },
}

impl FnBody {
    pub fn mk_let(binding: Variable, expr: Expr, body: FnBody) -> FnBody {
        FnBody::Let {
            binding,
            expr,
            body: Box::new(body),
        }
    }

    pub fn mk_inc(var: Variable, body: FnBody) -> FnBody {
        FnBody::Inc {
            var,
            body: Box::new(body),
        }
    }

    pub fn mk_dec(var: Variable, body: FnBody) -> FnBody {
        FnBody::Dec {
            var,
            body: Box::new(body),
        }
    }

    /// Whether the body already manages reference counts itself.
    pub fn is_managed(&self) -> bool {
        match self {
            FnBody::Ret(_) => false,
            FnBody::Let { expr, body, .. } => match expr {
                Expr::Reset(_) | Expr::Reuse { .. } => true,
                _ => body.is_managed(),
            },
            FnBody::Case { arms, .. } => arms.values().any(FnBody::is_managed),
            FnBody::Inc { .. } | FnBody::Dec { .. } => true,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct FnIdx(usize);

impl fmt::Debug for FnIdx {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, ".{}", self.0)
    }
}

impl Idx for FnIdx {
    #[inline]
    fn index(&self) -> usize {
        self.0
    }

    #[inline]
    fn new(index: usize) -> Self {
        FnIdx(index)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeIdx(usize);

impl Idx for TypeIdx {
    #[inline]
    fn index(&self) -> usize {
        self.0
    }

    #[inline]
    fn new(index: usize) -> Self {
        TypeIdx(index)
    }
}

#[derive(Clone, Debug)]
pub struct FnDef {
    pub name: FnName,
    pub params: Vec<Variable>,
    pub body: FnBody,
}

#[derive(Clone, Debug)]
pub struct TypeDef {
    pub tag: CtorName,
    pub fields: Vec<FieldName>,
}

/// The function and type tables of a loaded program. Built once by lowering and never mutated
/// afterwards; transformations produce a new `Program`.
#[derive(Clone, Debug)]
pub struct Program {
    file_id: FileId,
    fns: IdxVec<FnIdx, FnDef>,
    types: IdxVec<TypeIdx, TypeDef>,
    fn_map: HashMap<FnName, FnIdx>,
    type_map: HashMap<CtorName, TypeIdx>,
}

impl Program {
    /// Callers are expected to have rejected duplicate names already; later definitions would
    /// otherwise shadow earlier ones in lookups.
    pub fn new(file_id: FileId, types: Vec<TypeDef>, fns: Vec<FnDef>) -> Program {
        let types: IdxVec<TypeIdx, TypeDef> = types.into_iter().collect();
        let fns: IdxVec<FnIdx, FnDef> = fns.into_iter().collect();
        let type_map = types
            .iter()
            .map(|(idx, def)| (def.tag.clone(), idx))
            .collect();
        let fn_map = fns.iter().map(|(idx, def)| (def.name.clone(), idx)).collect();
        Program {
            file_id,
            fns,
            types,
            fn_map,
            type_map,
        }
    }

    #[inline]
    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    #[inline]
    pub fn fns(&self) -> impl Iterator<Item = &FnDef> {
        self.fns.values()
    }

    #[inline]
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    pub fn lookup_fn(&self, name: &FnName) -> Option<&FnDef> {
        self.fn_map.get(name).map(|idx| &self.fns[*idx])
    }

    pub fn lookup_type(&self, tag: &CtorName) -> Option<&TypeDef> {
        self.type_map.get(tag).map(|idx| &self.types[*idx])
    }

    /// Whether any declared constructor has a field of this name.
    pub fn declares_field(&self, field: &FieldName) -> bool {
        self.types().any(|def| def.fields.contains(field))
    }

    /// Rebuilds the program with every function body passed through `f`.
    pub fn map_bodies<E>(
        &self,
        mut f: impl FnMut(&FnDef) -> Result<FnBody, E>,
    ) -> Result<Program, E> {
        let mut fns = Vec::with_capacity(self.fns.len());
        for def in self.fns() {
            fns.push(FnDef {
                name: def.name.clone(),
                params: def.params.clone(),
                body: f(def)?,
            });
        }
        Ok(Program::new(self.file_id, self.types().cloned().collect(), fns))
    }
}
