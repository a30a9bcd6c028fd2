// Core modules
pub mod args;
pub mod infrastructure;
pub mod models;
pub mod pipeline;
pub mod source;
