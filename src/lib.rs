// src/lib.rs

//! Restock monitor library
//!
//! Watches product searches for items that come back in stock and pushes
//! alerts for them.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
