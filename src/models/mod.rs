//! Diesel row models and their conversions into domain entities.

pub mod category;
pub mod config;
pub mod forum;
pub mod post;
pub mod post_thumb;
pub mod subscription;
pub mod thread;
pub mod thread_view;
pub mod vocabulary;
