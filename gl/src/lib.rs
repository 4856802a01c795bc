mod libgl;
mod wrap;

pub use libgl::*;
pub use wrap::Adapter;
