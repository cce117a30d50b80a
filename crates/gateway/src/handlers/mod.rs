//! HTTP request handlers

pub mod articles;
pub mod health;
pub mod links;
pub mod platforms;
