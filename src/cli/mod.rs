pub mod commands;
pub mod dialog;
pub mod handlers;
pub mod notify;
pub mod output;
