//! Data models

pub mod printer;
pub mod sale;
pub mod settings;
