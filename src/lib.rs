pub mod batch;
pub mod document;
pub mod error;
pub mod index;
pub mod math;
pub mod model;
pub mod pipeline;
pub mod relocation;

pub use error::{AppMoverError, Result};
