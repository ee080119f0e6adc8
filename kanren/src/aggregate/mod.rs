mod stream;
mod subquery;

pub use stream::*;
pub use subquery::*;
