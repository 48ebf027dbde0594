mod check;
mod lowering;
mod pp;

pub mod analysis;
pub mod ir;
pub mod transforms;

pub use check::check;
pub use lowering::lower;
