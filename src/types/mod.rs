mod descriptor;
mod index;

pub use descriptor::*;
pub use index::*;
