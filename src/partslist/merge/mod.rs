pub mod assemble;
pub mod config;
pub mod dedup;
pub mod error;
pub mod io;
pub mod keys;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod run;

pub use error::{MergeError, Result};
