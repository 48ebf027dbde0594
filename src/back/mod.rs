//! Direct evaluation of function bodies against a reference counted heap.
//!
//! Ordinary argument passing never touches reference counts; only the explicit `inc`, `dec`,
//! `reset` and `reuse` operations do. The one exception is forwarding the arguments captured by a
//! partial application: the PAP cell keeps its own references, so the callee (or the extended PAP)
//! is handed fresh ones.

use crate::diagnostics::{Diagnostic, FileId, Label, Result, Span};
use crate::middle::ir;

mod ctx;
mod heap;
mod value;

pub use ctx::Context;
pub use heap::{CtorValue, Heap, HeapStats, HeapValue, Location, MissingLocation, PapValue};
pub use value::Value;

pub struct Evaluator<'p, 'h> {
    program: &'p ir::Program,
    heap: &'h mut Heap,
}

impl<'p, 'h> Evaluator<'p, 'h> {
    pub fn new(program: &'p ir::Program, heap: &'h mut Heap) -> Evaluator<'p, 'h> {
        Evaluator { program, heap }
    }

    #[inline]
    fn file_id(&self) -> FileId {
        self.program.file_id()
    }

    #[inline]
    pub fn heap(&self) -> &Heap {
        self.heap
    }

    fn missing_location(&self, err: MissingLocation, span: Span) -> Diagnostic {
        Diagnostic::new_error(
            "missing heap location",
            Label::new(self.file_id(), span, err.to_string()),
        )
    }

    fn arity_mismatch(&self, target: &ir::FnName, expected: usize, supplied: usize) -> Diagnostic {
        Diagnostic::new_error(
            "arity mismatch",
            Label::new(
                self.file_id(),
                target.span(),
                &format!(
                    "'{}' takes {} argument(s), but {} were supplied",
                    target, expected, supplied
                ),
            ),
        )
    }

    fn lookup(&self, ctx: &Context, var: &ir::Variable) -> Result<Location> {
        ctx.lookup(var).ok_or_else(|| {
            Diagnostic::new_error(
                "reference to unbound variable",
                Label::new(
                    self.file_id(),
                    var.span(),
                    &format!("'{}' is not bound here (while evaluating)", var),
                ),
            )
        })
    }

    fn lookup_all(&self, ctx: &Context, vars: &[ir::Variable]) -> Result<Vec<Location>> {
        vars.iter().map(|var| self.lookup(ctx, var)).collect()
    }

    fn lookup_fn(&self, name: &ir::FnName) -> Result<&'p ir::FnDef> {
        self.program.lookup_fn(name).ok_or_else(|| {
            Diagnostic::new_error(
                "reference to unknown function",
                Label::new(
                    self.file_id(),
                    name.span(),
                    &format!("'{}' is not a function", name),
                ),
            )
        })
    }

    fn lookup_ctor(&self, ctx: &Context, var: &ir::Variable) -> Result<&CtorValue> {
        let loc = self.lookup(ctx, var)?;
        match self.heap.get(loc) {
            Ok(HeapValue::Ctor(value)) => Ok(value),
            Ok(HeapValue::Pap(_)) => Err(Diagnostic::new_error(
                "expected a constructor value",
                Label::new(
                    self.file_id(),
                    var.span(),
                    &format!("'{}' is bound to a partial application", var),
                ),
            )),
            Err(err) => Err(self.missing_location(err, var.span())),
        }
    }

    fn lookup_pap(&self, ctx: &Context, var: &ir::Variable) -> Result<PapValue> {
        let loc = self.lookup(ctx, var)?;
        match self.heap.get(loc) {
            Ok(HeapValue::Pap(value)) => Ok(value.clone()),
            Ok(HeapValue::Ctor(_)) => Err(Diagnostic::new_error(
                "expected a partial application",
                Label::new(
                    self.file_id(),
                    var.span(),
                    &format!("'{}' is bound to a constructor value", var),
                ),
            )),
            Err(err) => Err(self.missing_location(err, var.span())),
        }
    }

    fn build_ctor(&self, ctx: &Context, ctor: &ir::Ctor) -> Result<HeapValue> {
        let def = self.program.lookup_type(&ctor.tag).ok_or_else(|| {
            Diagnostic::new_error(
                "reference to unknown constructor",
                Label::new(
                    self.file_id(),
                    ctor.tag.span(),
                    &format!("'{}' is not declared by any 'deftype'", ctor.tag),
                ),
            )
        })?;
        if def.fields.len() != ctor.fields.len() {
            return Err(Diagnostic::new_error(
                "arity mismatch",
                Label::new(
                    self.file_id(),
                    ctor.tag.span(),
                    &format!(
                        "'{}' has {} field(s), but {} were supplied",
                        ctor.tag,
                        def.fields.len(),
                        ctor.fields.len()
                    ),
                ),
            ));
        }
        let locs = self.lookup_all(ctx, &ctor.fields)?;
        Ok(HeapValue::Ctor(CtorValue {
            tag: ctor.tag.clone(),
            fields: def.fields.iter().cloned().zip(locs).collect(),
        }))
    }

    /// Hands the captured arguments of `pap` on to a new owner, followed by `args`.
    fn forward_pap(&mut self, pap: &ir::Variable, value: PapValue, args: Vec<Location>) -> Result<Vec<Location>> {
        self.heap
            .inc(&value.args)
            .map_err(|err| self.missing_location(err, pap.span()))?;
        let mut combined = value.args;
        combined.extend(args);
        Ok(combined)
    }

    /// Evaluates `target` on `args`, which the callee takes ownership of.
    pub fn call(&mut self, target: &ir::FnName, args: Vec<Location>) -> Result<Location> {
        let def = self.lookup_fn(target)?;
        if def.params.len() != args.len() {
            return Err(self.arity_mismatch(target, def.params.len(), args.len()));
        }
        trace!("call {} {:?}", target, args);
        let ctx = Context::from_params(&def.params, &args);
        self.eval_body(&ctx, &def.body)
    }

    fn alloc_pap(&mut self, target: &ir::FnName, args: Vec<Location>) -> Result<Location> {
        let expected = self.lookup_fn(target)?.params.len();
        if args.len() >= expected {
            return Err(Diagnostic::new_error(
                "arity mismatch",
                Label::new(
                    self.file_id(),
                    target.span(),
                    &format!(
                        "a partial application of '{}' must supply fewer than {} argument(s)",
                        target, expected
                    ),
                ),
            ));
        }
        Ok(self.heap.alloc(HeapValue::Pap(PapValue {
            target: target.clone(),
            args,
        })))
    }

    pub fn eval_expr(&mut self, ctx: &Context, expr: &'p ir::Expr) -> Result<Location> {
        match expr {
            ir::Expr::ConstAppFull { target, args } => {
                let args = self.lookup_all(ctx, args)?;
                self.call(target, args)
            }
            ir::Expr::ConstAppPart { target, args } => {
                let args = self.lookup_all(ctx, args)?;
                self.alloc_pap(target, args)
            }
            ir::Expr::VarPapFull { pap, args } => {
                let value = self.lookup_pap(ctx, pap)?;
                let target = value.target.with_span(pap.span());
                let args = self.lookup_all(ctx, args)?;
                let args = self.forward_pap(pap, value, args)?;
                self.call(&target, args)
            }
            ir::Expr::VarPapPart { pap, args } => {
                let value = self.lookup_pap(ctx, pap)?;
                let target = value.target.with_span(pap.span());
                let args = self.lookup_all(ctx, args)?;
                let args = self.forward_pap(pap, value, args)?;
                self.alloc_pap(&target, args)
            }
            ir::Expr::Ctor(ctor) => {
                let value = self.build_ctor(ctx, ctor)?;
                Ok(self.heap.alloc(value))
            }
            ir::Expr::Proj { field, record } => {
                let value = self.lookup_ctor(ctx, record)?;
                value.fields.get(field).copied().ok_or_else(|| {
                    Diagnostic::new_error(
                        "unknown field",
                        Label::new(
                            self.file_id(),
                            field.span(),
                            &format!("'{}' values have no field '{}'", value.tag, field),
                        ),
                    )
                })
            }
            ir::Expr::Reset(var) => {
                let loc = self.lookup(ctx, var)?;
                self.heap
                    .reset(loc)
                    .map_err(|err| self.missing_location(err, var.span()))
            }
            ir::Expr::Reuse { token, ctor } => {
                let loc = self.lookup(ctx, token)?;
                let value = self.build_ctor(ctx, ctor)?;
                self.heap
                    .reuse(loc, value)
                    .map_err(|err| self.missing_location(err, token.span()))
            }
        }
    }

    pub fn eval_body(&mut self, ctx: &Context, body: &'p ir::FnBody) -> Result<Location> {
        match body {
            ir::FnBody::Ret(var) => self.lookup(ctx, var),
            ir::FnBody::Let {
                binding,
                expr,
                body,
            } => {
                let loc = self.eval_expr(ctx, expr)?;
                self.eval_body(&ctx.extend(binding, loc), body)
            }
            ir::FnBody::Case { scrutinee, arms } => {
                let tag = self.lookup_ctor(ctx, scrutinee)?.tag.clone();
                match arms.get(&tag) {
                    Some(arm) => self.eval_body(ctx, arm),
                    None => Err(Diagnostic::new_error(
                        "non-exhaustive match",
                        Label::new(
                            self.file_id(),
                            scrutinee.span(),
                            &format!("no arm matches '{}' here", tag),
                        ),
                    )),
                }
            }
            ir::FnBody::Inc { var, body } => {
                let loc = self.lookup(ctx, var)?;
                self.heap
                    .inc(&[loc])
                    .map_err(|err| self.missing_location(err, var.span()))?;
                self.eval_body(ctx, body)
            }
            ir::FnBody::Dec { var, body } => {
                let loc = self.lookup(ctx, var)?;
                self.heap
                    .dec(&[loc])
                    .map_err(|err| self.missing_location(err, var.span()))?;
                self.eval_body(ctx, body)
            }
        }
    }
}

/// Evaluates the zero-parameter function `entry`.
pub fn run(program: &ir::Program, heap: &mut Heap, entry: &str) -> Result<Location> {
    let entry = ir::FnName::synthetic(entry);
    match program.lookup_fn(&entry) {
        Some(def) if def.params.is_empty() => {
            debug!("evaluating '{}'", entry);
            Evaluator::new(program, heap).call(&def.name, vec![])
        }
        Some(def) => Err(Diagnostic::new_error(
            "invalid entry point",
            Label::new(
                program.file_id(),
                def.name.span(),
                &format!("'{}' must not take any parameters", entry),
            ),
        )),
        None => Err(Diagnostic::new_error(
            "invalid entry point",
            Label::new(
                program.file_id(),
                Span::dummy(),
                &format!("there is no function named '{}'", entry),
            ),
        )),
    }
}

/// Renders the value reachable from `loc`.
pub fn render(program: &ir::Program, heap: &Heap, loc: Location) -> Result<String> {
    heap.snapshot(loc).map(|value| value.render(program)).map_err(|err| {
        Diagnostic::new_bug(
            "missing heap location",
            Label::new(program.file_id(), Span::dummy(), err.to_string()),
        )
    })
}
