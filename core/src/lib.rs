pub mod aggregate;
pub mod dataset;
pub mod models;
pub mod resolver;
pub mod service;
pub mod store;
