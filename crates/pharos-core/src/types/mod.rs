pub mod beacon;
pub mod preset;

pub use beacon::*;
pub use preset::*;
