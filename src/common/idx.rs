use std::cell::Cell;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

pub trait Idx: 'static + Copy + Eq + Hash + fmt::Debug {
    fn index(&self) -> usize;

    fn new(index: usize) -> Self;
}

/// Hands out monotonically increasing indices through a shared reference.
#[derive(Clone, Debug)]
pub struct Idxr<T> {
    next: Cell<usize>,
    _phantom: PhantomData<T>,
}

impl<T: Idx> Idxr<T> {
    pub fn new() -> Idxr<T> {
        Idxr::from(0)
    }

    pub fn from(start: usize) -> Idxr<T> {
        Idxr {
            next: Cell::new(start),
            _phantom: PhantomData::default(),
        }
    }

    pub fn next(&self) -> T {
        let next = self.next.get();
        self.next.set(next + 1);
        T::new(next)
    }

    #[inline]
    pub fn issued(&self) -> usize {
        self.next.get()
    }
}

impl<T: Idx> Default for Idxr<T> {
    fn default() -> Idxr<T> {
        Idxr::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    struct TestIdx(usize);

    impl Idx for TestIdx {
        fn index(&self) -> usize {
            self.0
        }

        fn new(index: usize) -> Self {
            TestIdx(index)
        }
    }

    #[test]
    fn issues_indices_in_order() {
        let idxr: Idxr<TestIdx> = Idxr::from(3);
        assert_eq!(idxr.next(), TestIdx(3));
        assert_eq!(idxr.next(), TestIdx(4));
        assert_eq!(idxr.issued(), 5);
    }
}
