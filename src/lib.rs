pub mod api;
pub mod config;
pub mod forms;
pub mod model;
pub mod pages;
pub mod render;
pub mod session;
pub mod style;
pub mod view;
