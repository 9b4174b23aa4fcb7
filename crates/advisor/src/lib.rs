//! Natural-language analysis of dashboard data.
//!
//! [`MistralClient`] implements [`perp_risk_core::MarketAnalyst`] on top of a
//! streamed chat-completions endpoint.

pub mod client;
pub mod error;
pub mod prompts;
pub mod sse;

pub use client::MistralClient;
pub use error::AdvisorError;
pub use prompts::{analysis_messages, chat_messages};
