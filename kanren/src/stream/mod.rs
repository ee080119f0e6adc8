mod observable;
mod ops;
mod share;

pub use observable::*;
pub use share::*;
