pub mod task;
pub mod lists;
pub mod config;

pub use task::*;
pub use lists::*;
pub use config::*;
