pub mod compositor;
pub mod config;
pub mod data_loader;
pub mod error;
pub mod estimation;
pub mod features;
pub mod io;
pub mod matching;
pub mod pipeline;
pub mod pose;
pub mod synthetic;
pub mod visualization;

pub use error::{ArError, Result};
pub use pipeline::Pipeline;
