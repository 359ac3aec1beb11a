mod load;
mod types;
mod validate;

pub use load::*;
pub use types::*;
pub use validate::*;
