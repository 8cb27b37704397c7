pub mod indicators;
pub mod pivots;


pub use indicators::*;
pub use pivots::*;
