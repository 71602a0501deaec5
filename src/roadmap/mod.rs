//! Roadmap subsystem — markdown ingestion, section state, persistence,
//! and the HTTP-facing service layer.

pub mod handlers;
pub mod model;
pub mod parser;
pub mod service;
pub mod storage;
pub mod view;
