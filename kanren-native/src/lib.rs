mod limits;
mod log;

pub use limits::*;
pub use log::*;
