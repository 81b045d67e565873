//! Shared types for every ordered index in the workspace.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;

pub use api::{Key, OrderedIndex, Value};
pub use config::{cut, TreeConfig, DEFAULT_ORDER, MAX_ORDER, MIN_ORDER};
pub use error::{IndexError, Result};
