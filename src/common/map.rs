use std::default::Default;
use std::fmt;
use std::iter::FromIterator;
use std::mem;

/// An association list that remembers insertion order.
///
/// Lookups are linear, which is the right trade for the handful of record fields and case arms
/// this is used for.
#[derive(Clone)]
pub struct Map<K, V> {
    keys: Vec<K>,
    values: Vec<V>,
}

impl<K, V> Map<K, V>
where
    K: Eq,
{
    pub fn new() -> Map<K, V> {
        Map {
            keys: vec![],
            values: vec![],
        }
    }

    pub fn with_capacity(capacity: usize) -> Map<K, V> {
        Map {
            keys: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.keys.iter()
    }

    #[inline]
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.values.iter()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.keys().zip(self.values())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn position_of(&self, k: &K) -> Option<usize> {
        self.keys.iter().position(|key| key == k)
    }

    #[inline]
    pub fn get(&self, k: &K) -> Option<&V> {
        self.position_of(k).map(|idx| &self.values[idx])
    }

    #[inline]
    pub fn contains_key(&self, k: &K) -> bool {
        self.position_of(k).is_some()
    }

    pub fn insert(&mut self, k: K, mut v: V) -> Option<V> {
        if let Some(idx) = self.position_of(&k) {
            mem::swap(&mut v, &mut self.values[idx]);
            Some(v)
        } else {
            self.keys.push(k);
            self.values.push(v);
            None
        }
    }

    pub fn remove(&mut self, k: &K) -> Option<V> {
        let idx = self.position_of(k)?;
        self.keys.remove(idx);
        Some(self.values.remove(idx))
    }
}

impl<K, V> IntoIterator for Map<K, V> {
    type Item = (K, V);
    type IntoIter = MapIterator<K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        MapIterator(self.keys.into_iter(), self.values.into_iter())
    }
}

impl<K, V> FromIterator<(K, V)> for Map<K, V>
where
    K: Eq,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Map::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Equality ignores insertion order.
impl<K, V> PartialEq for Map<K, V>
where
    K: Eq,
    V: PartialEq,
{
    fn eq(&self, other: &Map<K, V>) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |other_v| other_v == v))
    }
}

impl<K, V> Eq for Map<K, V>
where
    K: Eq,
    V: Eq,
{
}

impl<K, V> Default for Map<K, V>
where
    K: Eq,
{
    fn default() -> Map<K, V> {
        Map::new()
    }
}

impl<K, V> fmt::Debug for Map<K, V>
where
    K: Eq + fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

pub struct MapIterator<K, V>(std::vec::IntoIter<K>, std::vec::IntoIter<V>);

impl<K, V> Iterator for MapIterator<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        Some((self.0.next()?, self.1.next()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_first_position() {
        let mut map = Map::new();
        assert_eq!(map.insert("a", 1), None);
        assert_eq!(map.insert("b", 2), None);
        assert_eq!(map.insert("a", 3), Some(1));
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(map.get(&"a"), Some(&3));
    }

    #[test]
    fn equality_is_order_insensitive() {
        let left: Map<_, _> = vec![("a", 1), ("b", 2)].into_iter().collect();
        let right: Map<_, _> = vec![("b", 2), ("a", 1)].into_iter().collect();
        assert_eq!(left, right);
    }
}
