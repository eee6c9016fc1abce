pub mod libs;

pub use crate::libs::finder::*;
pub use crate::libs::graph::*;
pub use crate::libs::io::*;
pub use crate::libs::matcher::*;
pub use crate::libs::nt::*;
pub use crate::libs::pipeline::*;
pub use crate::libs::pool::*;
pub use crate::libs::rainbow::*;
pub use crate::libs::read::*;
pub use crate::libs::singleton::*;
pub use crate::libs::wumanber::*;
