// Library exports for linkboard
// This allows integration tests and external code to use linkboard modules

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod feed;
pub mod pages;
pub mod remote;
pub mod routes;
pub mod session;
pub mod state;
