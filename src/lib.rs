pub mod config;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod paginator;
pub mod records;
pub mod redmine_client;
pub mod server;
pub mod tools;
