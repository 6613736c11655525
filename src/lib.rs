pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod model;
pub mod repo;
pub mod service;
pub mod util;
