pub mod file;
pub mod memory;
pub mod model;
pub mod notify;

pub use file::*;
pub use memory::*;
pub use model::*;
pub use notify::*;
