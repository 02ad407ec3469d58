pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod image;
pub mod review;
pub mod session;
