pub mod app;
pub mod builder;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod instance;
pub mod library;
pub mod output;
pub mod query;
pub mod remote;
pub mod resolver;
pub mod store;
pub mod table;
