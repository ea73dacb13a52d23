//! HTTP request handlers

pub mod audio;
pub mod calls;
pub mod health;
pub mod metrics;
pub mod voice;
