//! Command handlers

pub mod annotate;
pub mod config;
pub mod export;
pub mod reset;
pub mod show;
pub mod status;
