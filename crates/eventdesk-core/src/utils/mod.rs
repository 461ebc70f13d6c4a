/// Utility modules
pub mod logging;
pub mod sanitization;
pub mod validation;

pub use logging::*;
pub use sanitization::*;
pub use validation::*;
