pub mod auth;
pub mod config;
pub mod document;
pub mod error;
pub mod options;
pub mod pagination;
pub mod query;
pub mod routes;
pub mod state;
pub mod upload;
pub mod upstream;
