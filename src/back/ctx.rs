use crate::back::Location;
use crate::middle::ir::Variable;

use std::collections::HashMap;

/// An immutable variable environment. Extending a context never disturbs the one it extends, so
/// sibling `case` arms can each hold onto the same parent.
#[derive(Debug)]
pub enum Context<'a> {
    Root(HashMap<&'a Variable, Location>),
    Child {
        parent: &'a Context<'a>,
        var: &'a Variable,
        loc: Location,
    },
}

impl<'a> Context<'a> {
    /// The environment a call starts from: parameters bound to the supplied locations and nothing
    /// else.
    pub fn from_params(params: &'a [Variable], args: &[Location]) -> Context<'a> {
        Context::Root(params.iter().zip(args.iter().copied()).collect())
    }

    pub fn extend(&'a self, var: &'a Variable, loc: Location) -> Context<'a> {
        Context::Child {
            parent: self,
            var,
            loc,
        }
    }

    pub fn lookup(&self, var: &Variable) -> Option<Location> {
        let mut ctx = self;
        loop {
            match ctx {
                Context::Root(bindings) => return bindings.get(var).copied(),
                Context::Child {
                    parent,
                    var: bound,
                    loc,
                } => {
                    if *bound == var {
                        return Some(*loc);
                    }
                    ctx = *parent;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Idx;

    #[test]
    fn extension_leaves_parent_untouched() {
        let params = vec![Variable::synthetic("x")];
        let y = Variable::synthetic("y");
        let root = Context::from_params(&params, &[Location::new(0)]);
        let left = root.extend(&y, Location::new(1));
        let right = root.extend(&y, Location::new(2));
        assert_eq!(left.lookup(&y), Some(Location::new(1)));
        assert_eq!(right.lookup(&y), Some(Location::new(2)));
        assert_eq!(root.lookup(&y), None);
        assert_eq!(left.lookup(&params[0]), Some(Location::new(0)));
    }
}
