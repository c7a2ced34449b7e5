pub mod config;
pub mod index;
