pub mod app;
pub mod handler;
pub mod health_check;
