use std::default::Default;
use std::fmt;
use std::iter::FromIterator;

/// A small insertion-ordered set.
#[derive(Clone)]
pub struct Set<T> {
    raw: Vec<T>,
}

impl<T> Set<T>
where
    T: Eq,
{
    pub fn new() -> Set<T> {
        Set { raw: vec![] }
    }

    #[inline]
    pub fn singleton(t: T) -> Set<T> {
        let mut set = Set::new();
        set.insert(t);
        set
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.raw.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    #[inline]
    pub fn contains(&self, t: &T) -> bool {
        self.raw.contains(t)
    }

    pub fn remove(&mut self, t: &T) -> Option<T> {
        let idx = self.raw.iter().position(|elem| elem == t)?;
        Some(self.raw.remove(idx))
    }

    pub fn is_subset(&self, other: &Set<T>) -> bool {
        self.iter().all(|t| other.contains(t))
    }

    pub fn insert(&mut self, t: T) -> bool {
        if self.contains(&t) {
            false
        } else {
            self.raw.push(t);
            true
        }
    }

    pub fn union(&mut self, other: Set<T>) {
        for t in other {
            self.insert(t);
        }
    }
}

impl<T> Default for Set<T>
where
    T: Eq,
{
    fn default() -> Set<T> {
        Set::new()
    }
}

impl<T> PartialEq for Set<T>
where
    T: Eq,
{
    fn eq(&self, other: &Set<T>) -> bool {
        self.len() == other.len() && self.is_subset(other)
    }
}

impl<T> Eq for Set<T> where T: Eq {}

impl<T> IntoIterator for Set<T>
where
    T: Eq,
{
    type Item = T;
    type IntoIter = SetIterator<T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        SetIterator(self.raw.into_iter())
    }
}

impl<T> FromIterator<T> for Set<T>
where
    T: Eq,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut set = Set::new();
        for item in iter {
            set.insert(item);
        }
        set
    }
}

impl<T> fmt::Debug for Set<T>
where
    T: Eq + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

pub struct SetIterator<T>(std::vec::IntoIter<T>);

impl<T> Iterator for SetIterator<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.0.next()
    }
}
