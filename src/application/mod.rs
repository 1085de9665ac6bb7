//! Application services layer.

pub mod access;
pub mod error;
pub mod news;
pub mod repos;
