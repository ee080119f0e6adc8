mod arith;
mod compare;
mod ground;
mod lift;
mod list;
mod object;

pub use arith::*;
pub use compare::*;
pub use ground::*;
pub use lift::*;
pub use list::*;
pub use object::*;
