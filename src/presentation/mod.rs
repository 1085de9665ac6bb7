pub mod news;
pub mod views;
