//! Live adapters talking to real services.

pub mod discord;
pub mod http_avatar;
