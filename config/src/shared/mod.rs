mod application;
mod base;
mod coordinator;
mod server;
mod workers;

pub use application::*;
pub use base::*;
pub use coordinator::*;
pub use server::*;
pub use workers::*;
