pub mod assembler;
pub mod cadence;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod jobs;
pub mod mail;
pub mod model;
pub mod object_store;
pub mod reader;
pub mod resolver;
pub mod response;
pub mod store;
pub mod template;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::{CrmError, Result};
