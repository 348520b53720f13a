mod sort_order;
mod util;
mod value;

pub use sort_order::*;
pub use util::*;
pub use value::*;
