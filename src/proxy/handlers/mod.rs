// Handlers that answer locally instead of forwarding to the backend

pub mod auth;
pub mod upload;
