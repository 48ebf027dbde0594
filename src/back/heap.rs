use crate::common::{Idx, IdxVec, Map};
use crate::middle::ir::{CtorName, FieldName, FnName};

use std::fmt;

/// Identifies a heap cell. Locations are handed out by a counter and never recycled for a
/// different cell; only `reset`/`reuse` put a new value at an old location.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Location(usize);

impl Location {
    const INVALID: usize = usize::max_value();

    /// The "no cell" sentinel produced by a declined `reset`.
    #[inline]
    pub fn invalid() -> Location {
        Location(Location::INVALID)
    }

    #[inline]
    pub fn is_invalid(self) -> bool {
        self.0 == Location::INVALID
    }
}

impl Idx for Location {
    #[inline]
    fn index(&self) -> usize {
        self.0
    }

    #[inline]
    fn new(index: usize) -> Self {
        Location(index)
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_invalid() {
            write!(f, "@invalid")
        } else {
            write!(f, "@{}", self.0)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PapValue {
    pub target: FnName,
    pub args: Vec<Location>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CtorValue {
    pub tag: CtorName,
    pub fields: Map<FieldName, Location>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeapValue {
    Pap(PapValue),
    Ctor(CtorValue),
}

impl HeapValue {
    /// The locations this value holds a reference to.
    pub fn children(&self) -> Vec<Location> {
        match self {
            HeapValue::Pap(pap) => pap.args.clone(),
            HeapValue::Ctor(ctor) => ctor.fields.values().copied().collect(),
        }
    }
}

#[derive(Debug)]
struct Cell {
    ref_count: usize,
    value: HeapValue,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
    pub allocations: usize,
    pub reuses: usize,
    pub frees: usize,
    pub declined: usize,
}

impl fmt::Display for HeapStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "allocations: {}, reuses: {}, frees: {}, declined resets: {}",
            self.allocations, self.reuses, self.frees, self.declined
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MissingLocation(pub Location);

impl fmt::Display for MissingLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "no heap cell at {:?}", self.0)
    }
}

impl std::error::Error for MissingLocation {}

/// Reference counted cells, indexed by `Location`.
///
/// Counts change only through `inc`, `dec` and `reset`. A cell whose count would drop to zero is
/// removed and the references it held are released in turn.
#[derive(Debug, Default)]
pub struct Heap {
    cells: IdxVec<Location, Option<Cell>>,
    live: usize,
    stats: HeapStats,
}

impl Heap {
    pub fn new() -> Heap {
        Heap::default()
    }

    fn cell(&self, loc: Location) -> Result<&Cell, MissingLocation> {
        self.cells
            .get(loc)
            .and_then(Option::as_ref)
            .ok_or(MissingLocation(loc))
    }

    fn cell_mut(&mut self, loc: Location) -> Result<&mut Cell, MissingLocation> {
        self.cells
            .get_mut(loc)
            .and_then(Option::as_mut)
            .ok_or(MissingLocation(loc))
    }

    /// Installs `value` in a fresh cell with a count of one.
    pub fn alloc(&mut self, value: HeapValue) -> Location {
        let loc = self.cells.push(Some(Cell {
            ref_count: 1,
            value,
        }));
        self.live += 1;
        self.stats.allocations += 1;
        trace!("alloc {:?}", loc);
        loc
    }

    pub fn get(&self, loc: Location) -> Result<&HeapValue, MissingLocation> {
        self.cell(loc).map(|cell| &cell.value)
    }

    pub fn ref_count(&self, loc: Location) -> Result<usize, MissingLocation> {
        self.cell(loc).map(|cell| cell.ref_count)
    }

    /// Overwrites the value of a live cell, keeping its count, or installs a cell with a count
    /// of one at a location that was previously handed out and has since been freed.
    pub fn set(&mut self, loc: Location, value: HeapValue) -> Result<(), MissingLocation> {
        match self.cells.get_mut(loc) {
            Some(Some(cell)) => {
                cell.value = value;
                Ok(())
            }
            Some(slot) => {
                *slot = Some(Cell {
                    ref_count: 1,
                    value,
                });
                self.live += 1;
                Ok(())
            }
            None => Err(MissingLocation(loc)),
        }
    }

    pub fn inc(&mut self, locs: &[Location]) -> Result<(), MissingLocation> {
        for loc in locs.iter().filter(|loc| !loc.is_invalid()) {
            self.cell_mut(*loc)?.ref_count += 1;
        }
        Ok(())
    }

    /// Releases one reference to each location, freeing cells whose last reference this was
    /// along with everything only they kept alive.
    pub fn dec(&mut self, locs: &[Location]) -> Result<(), MissingLocation> {
        let mut pending: Vec<Location> = locs.iter().rev().copied().collect();
        while let Some(loc) = pending.pop() {
            if loc.is_invalid() {
                continue;
            }
            let cell = self.cell_mut(loc)?;
            if cell.ref_count > 1 {
                cell.ref_count -= 1;
            } else {
                let children = self.free(loc)?.children();
                pending.extend(children.into_iter().rev());
            }
        }
        Ok(())
    }

    fn free(&mut self, loc: Location) -> Result<HeapValue, MissingLocation> {
        let cell = self
            .cells
            .get_mut(loc)
            .and_then(Option::take)
            .ok_or(MissingLocation(loc))?;
        self.live -= 1;
        self.stats.frees += 1;
        trace!("free {:?}", loc);
        Ok(cell.value)
    }

    /// Gives up one reference to `loc`. If it was the only one the cell's references are released
    /// and `loc` comes back as a token a later `reuse` can fill; otherwise the result is
    /// `Location::invalid()`.
    pub fn reset(&mut self, loc: Location) -> Result<Location, MissingLocation> {
        if self.ref_count(loc)? == 1 {
            let children = self.free(loc)?.children();
            self.dec(&children)?;
            Ok(loc)
        } else {
            self.dec(&[loc])?;
            self.stats.declined += 1;
            Ok(Location::invalid())
        }
    }

    /// Builds `value` at `token` if `reset` handed out a real location, or in a fresh cell
    /// otherwise.
    pub fn reuse(&mut self, token: Location, value: HeapValue) -> Result<Location, MissingLocation> {
        if token.is_invalid() {
            Ok(self.alloc(value))
        } else {
            self.set(token, value)?;
            self.stats.reuses += 1;
            trace!("reuse {:?}", token);
            Ok(token)
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    #[inline]
    pub fn stats(&self) -> HeapStats {
        self.stats
    }

    /// Every live location with its count, in allocation order.
    pub fn live_cells(&self) -> impl Iterator<Item = (Location, usize)> + '_ {
        self.cells
            .iter()
            .filter_map(|(loc, cell)| cell.as_ref().map(|cell| (loc, cell.ref_count)))
    }
}
