pub mod category;
pub mod config;
pub mod settings;
pub mod stats;
pub mod timer;
