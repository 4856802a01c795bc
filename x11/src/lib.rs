pub mod libx11;
pub mod wrap;

pub use libx11::*;
