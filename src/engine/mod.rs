pub mod container;
pub mod paper;
pub mod portfolio;
pub mod executor;
pub mod controller;

pub use container::*;
pub use paper::*;
pub use portfolio::*;
pub use executor::*;
pub use controller::*;
