//! Forum entities and the pure rules that govern them.

pub mod auth;
pub mod category;
pub mod forum;
pub mod post;
pub mod subscription;
pub mod thread;
pub mod thread_view;
pub mod types;
pub mod vocabulary;
pub mod vote;
