pub mod engine;
pub mod rules;

#[cfg(test)]
mod tests;

pub use engine::*;
pub use rules::*;
