mod agent;
mod aim;
pub mod movement;
mod pose;
mod prediction;

pub use agent::*;
pub use aim::*;
pub use pose::*;
pub use prediction::*;
