//! Completion backends.
//!
//! [`CompletionService`] is the seam the review pipeline is generic over: the
//! production implementation is [`open_ai_service::OpenAiService`], tests plug
//! in scripted fakes. Plain `async` via return-position `impl Future`, no boxing.

pub mod open_ai_service;

use std::future::Future;

use crate::error_handler::AiLlmError;

/// Single-turn text completion: one prompt in, one reply text out.
pub trait CompletionService {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String, AiLlmError>>;
}
