// src/lib.rs

//! rentwatch library: rental listing lifecycle tracking.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
