//! product-lens — upload a product photo, get a structured Gemini analysis back.

pub mod config;
pub mod controller;
pub mod error;
pub mod gemini;
pub mod ingest;
pub mod page;
pub mod prompt;
pub mod server;
