//! Shop Responder — canned auto-replies for marketplace customer chat.

pub mod channels;
pub mod config;
pub mod error;
pub mod pipeline;
