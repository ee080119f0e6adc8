mod canon;
mod subst;
mod suspend;
mod term;
mod unify;
mod var;
mod walk;

pub use canon::*;
pub use subst::*;
pub use suspend::*;
pub use term::*;
pub use unify::*;
pub use var::*;
pub use walk::*;
