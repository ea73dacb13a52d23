//! OpenAI-compatible chat-completions engine

mod client;

pub use client::OpenAiChatEngine;
