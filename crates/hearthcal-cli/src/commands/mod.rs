pub mod annual;
pub mod delete;
pub mod list;
pub mod notify;
pub mod save;
pub mod status;
