//! HTTP contract of the book conversion service.

mod client;
mod error;
pub mod models;

pub use client::ApiClient;
