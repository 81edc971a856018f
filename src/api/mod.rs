pub mod extract;
pub mod handler;
pub mod webhook;
