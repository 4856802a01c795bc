mod libegl;
pub mod wrap;

pub use libegl::*;
