// Core logging module - the dashboard's event log.

pub mod logging_models;
pub mod logging_service;

pub use logging_models::*;
pub use logging_service::*;
