pub mod api;
pub mod backend;
pub mod config;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
pub mod test_support;
