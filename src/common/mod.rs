mod idx;
mod idx_vec;
mod map;
mod set;

pub use idx::{Idx, Idxr};
pub use idx_vec::IdxVec;
pub use map::{Map, MapIterator};
pub use set::{Set, SetIterator};
