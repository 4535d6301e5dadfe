//! Task API Library
//!
//! This module exports the core components for testing and integration.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod factory;
pub mod repository;
pub mod resources;
pub mod server;
pub mod types;
pub mod validation;
