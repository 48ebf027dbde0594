use crate::middle::ir;

/// What the variable bound by a `let` holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    /// One reference of its own, which has to be handed on or dropped.
    Owned,
    /// A field read out of the given record; kept alive by the record, not by itself.
    Borrowed(ir::Variable),
    /// The result of a `reset`, only ever handed to `reuse`.
    Token,
}

impl Binding {
    pub fn of(expr: &ir::Expr) -> Binding {
        match expr {
            ir::Expr::Proj { record, .. } => Binding::Borrowed(record.clone()),
            ir::Expr::Reset(_) => Binding::Token,
            _ => Binding::Owned,
        }
    }
}

/// The occurrences in `expr` that hand a reference over to someone else, with repetitions.
///
/// Projected records, case scrutinees and the heads of PAP applications are only read; the
/// token of a `reuse` is accounted for by its `reset`.
pub fn consumed(expr: &ir::Expr) -> Vec<&ir::Variable> {
    match expr {
        ir::Expr::ConstAppFull { args, .. }
        | ir::Expr::ConstAppPart { args, .. }
        | ir::Expr::VarPapFull { args, .. }
        | ir::Expr::VarPapPart { args, .. } => args.iter().collect(),
        ir::Expr::Ctor(ctor) | ir::Expr::Reuse { ctor, .. } => ctor.fields.iter().collect(),
        ir::Expr::Reset(var) => vec![var],
        ir::Expr::Proj { .. } => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> ir::Variable {
        ir::Variable::synthetic(name)
    }

    #[test]
    fn projections_borrow_from_their_record() {
        let expr = ir::Expr::Proj {
            field: ir::FieldName::synthetic("head"),
            record: var("xs"),
        };
        assert_eq!(Binding::of(&expr), Binding::Borrowed(var("xs")));
        assert!(consumed(&expr).is_empty());
    }

    #[test]
    fn applications_consume_arguments_not_heads() {
        let expr = ir::Expr::VarPapFull {
            pap: var("f"),
            args: vec![var("x"), var("x")],
        };
        assert_eq!(Binding::of(&expr), Binding::Owned);
        assert_eq!(consumed(&expr), vec![&var("x"), &var("x")]);
    }

    #[test]
    fn reuse_consumes_fields_not_token() {
        let expr = ir::Expr::Reuse {
            token: var("w"),
            ctor: ir::Ctor {
                tag: ir::CtorName::synthetic("Pair"),
                fields: vec![var("b"), var("a")],
            },
        };
        assert_eq!(consumed(&expr), vec![&var("b"), &var("a")]);
        assert_eq!(Binding::of(&ir::Expr::Reset(var("p"))), Binding::Token);
    }
}
