pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod present;
pub mod state;
