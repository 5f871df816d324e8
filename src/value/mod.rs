//! Document value utilities: display rendering, identity detection and parsing.

mod formatter;
mod identity;
mod parser;

pub use formatter::*;
pub use identity::*;
pub use parser::*;
