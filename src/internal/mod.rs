pub mod activity;
pub mod errors;
pub mod fetch_loop;
pub mod history;
pub mod models;
pub mod notification;
pub mod session;
pub mod stats;
pub mod ui;
