pub mod datetime;
pub mod logging;
pub mod storage_root;
pub mod url;
