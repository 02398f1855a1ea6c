pub mod app;
pub mod bundle;
pub mod catalog;
pub mod config;
pub mod render;
pub mod service;
pub mod shared;
