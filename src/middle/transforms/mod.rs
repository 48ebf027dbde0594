//! Rewrites that make memory management explicit in a program's function bodies.

use crate::common::{Idx, Idxr, Set};
use crate::diagnostics::Result;
use crate::driver::Opts;
use crate::middle::analysis::{self, Binding};
use crate::middle::{check, ir};
use crate::pp;

use std::ops::Deref;

macro_rules! bn_let {
    ( $binding:expr, $expr:expr => $body:expr ) => {
        ir::FnBody::mk_let($binding, $expr, $body)
    };
}

macro_rules! bn_reset {
    ( $token:expr, $var:expr => $body:expr ) => {
        bn_let!($token, ir::Expr::Reset($var) => $body)
    };
}

macro_rules! bn_reuse {
    ( $token:expr, $ctor:expr ) => {
        ir::Expr::Reuse {
            token: $token,
            ctor: $ctor,
        }
    };
}

macro_rules! bn_inc {
    ( $var:expr => $body:expr ) => {
        ir::FnBody::mk_inc($var, $body)
    };
}

macro_rules! bn_dec {
    ( $var:expr => $body:expr ) => {
        ir::FnBody::mk_dec($var, $body)
    };
}

mod retain;
mod reuse;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct TokenIdx(usize);

impl Idx for TokenIdx {
    #[inline]
    fn index(&self) -> usize {
        self.0
    }

    #[inline]
    fn new(index: usize) -> Self {
        TokenIdx(index)
    }
}

struct TransformCtx<'p> {
    program: &'p ir::Program,
}

struct LocalTransformCtx<'p, 'ctx> {
    ctx: &'ctx TransformCtx<'p>,
    def: &'ctx ir::FnDef,
    /// Names already in use in this function, which fresh tokens must avoid.
    taken: Set<ir::Variable>,
    /// Variables holding a reference of their own at their binding site: parameters and every
    /// `let` that neither projects nor resets.
    owners: Set<ir::Variable>,
    token_idxr: Idxr<TokenIdx>,
}

impl<'p> TransformCtx<'p> {
    fn new(program: &'p ir::Program) -> TransformCtx<'p> {
        TransformCtx { program }
    }

    fn transform(&self, def: &ir::FnDef) -> ir::FnBody {
        if def.body.is_managed() {
            debug!("'{}' manages its own references, leaving it alone", def.name);
            return def.body.clone();
        }
        let local = LocalTransformCtx::new(self, def);
        let body = local.insert_reuse(def.body.clone());
        trace!(
            "'{}': {} reuse token(s) considered",
            def.name,
            local.token_idxr.issued()
        );
        local.retain(&body)
    }
}

impl<'p, 'ctx> LocalTransformCtx<'p, 'ctx> {
    fn new(ctx: &'ctx TransformCtx<'p>, def: &'ctx ir::FnDef) -> LocalTransformCtx<'p, 'ctx> {
        let mut owners: Set<ir::Variable> = def.params.iter().cloned().collect();
        collect_owners(&def.body, &mut owners);
        LocalTransformCtx {
            ctx,
            def,
            taken: analysis::all_vars(def),
            owners,
            token_idxr: Idxr::new(),
        }
    }

    /// A variable named like no variable or function in sight.
    fn fresh_token(&self) -> ir::Variable {
        loop {
            let name = format!("_r{}", self.token_idxr.next().index());
            let var = ir::Variable::synthetic(name.as_str());
            if !self.taken.contains(&var)
                && self.program.lookup_fn(&ir::FnName::synthetic(name)).is_none()
            {
                return var;
            }
        }
    }
}

fn collect_owners(body: &ir::FnBody, owners: &mut Set<ir::Variable>) {
    match body {
        ir::FnBody::Ret(_) => {}
        ir::FnBody::Let {
            binding,
            expr,
            body,
        } => {
            if Binding::of(expr) == Binding::Owned {
                owners.insert(binding.clone());
            }
            collect_owners(body, owners);
        }
        ir::FnBody::Case { arms, .. } => {
            for arm in arms.values() {
                collect_owners(arm, owners);
            }
        }
        ir::FnBody::Inc { body, .. } | ir::FnBody::Dec { body, .. } => collect_owners(body, owners),
    }
}

impl<'p, 'ctx> Deref for LocalTransformCtx<'p, 'ctx> {
    type Target = TransformCtx<'p>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

/// Inserts `reset`/`reuse` pairs wherever a matched constructor dies before one of the same
/// shape is built, then makes every reference count adjustment explicit. Functions that already
/// contain `inc`, `dec`, `reset` or `reuse` are taken as they are.
pub fn insert_reuse(opts: &Opts, program: &ir::Program) -> Result<ir::Program> {
    let ctx = TransformCtx::new(program);
    let transformed = program.map_bodies(|def| -> Result<ir::FnBody> { Ok(ctx.transform(def)) })?;
    if opts.dump_ir {
        pp!(&transformed);
    }
    check(&transformed)?;
    Ok(transformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Files;

    use structopt::StructOpt;

    pub(super) fn load(src: &str) -> ir::Program {
        let opts = Opts::from_iter(&["beans", "-c", "test.beans"]);
        let mut files = Files::new();
        let file_id = files.add("test.beans", src);
        match crate::load(&opts, &files, file_id) {
            Ok(program) => program,
            Err(diagnostic) => panic!("failed to load test program: {:?}", diagnostic),
        }
    }

    pub(super) fn transform(src: &str) -> ir::Program {
        let program = load(src);
        let opts = Opts::from_iter(&["beans", "-c", "test.beans"]);
        insert_reuse(&opts, &program).unwrap()
    }

    pub(super) fn body_of(program: &ir::Program, name: &str) -> ir::FnBody {
        let def = program.lookup_fn(&ir::FnName::synthetic(name)).unwrap();
        def.body.clone()
    }

    pub(super) fn render_fn(program: &ir::Program, name: &str) -> String {
        let def = program.lookup_fn(&ir::FnName::synthetic(name)).unwrap();
        pp::render(def)
    }

    #[test]
    fn swap_reuses_its_argument() {
        let program = transform(
            "(deftype Pair fst snd)
             (defn swap (p)
               (case p
                 Pair (let (a (proj fst p) b (proj snd p) r (new Pair b a)) (ret r))))",
        );
        let expected = load(
            "(deftype Pair fst snd)
             (defn swap (p)
               (case p
                 Pair (let (a (proj fst p) b (proj snd p))
                        (inc a (inc b
                          (let (_r0 (reset p) r (reuse _r0 Pair b a)) (ret r)))))))",
        );
        assert_eq!(body_of(&program, "swap"), body_of(&expected, "swap"));
    }

    #[test]
    fn managed_functions_are_left_alone() {
        let src = "(deftype Box val)
                   (defn f (x) (inc x (let (b (new Box x)) (ret b))))";
        assert_eq!(body_of(&transform(src), "f"), body_of(&load(src), "f"));
    }

    #[test]
    fn fresh_tokens_avoid_existing_names() {
        let program = transform(
            "(deftype Unit)
             (deftype Box val)
             (defn _r0 () (let (u (new Unit)) (ret u)))
             (defn rebox (b)
               (case b
                 Box (let (_r1 (proj val b) c (new Box _r1)) (ret c))))",
        );
        let rendered = render_fn(&program, "rebox");
        assert!(rendered.contains("(_r2 (reset b)"), "{}", rendered);
    }
}
