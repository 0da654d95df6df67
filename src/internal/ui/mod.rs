pub mod app;
pub mod log_viewer;
pub mod view;
