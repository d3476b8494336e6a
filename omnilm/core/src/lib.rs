// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! omnilm core
//!
//! One OpenAI-compatible completion contract over many text-completion providers.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Model alias resolution, concurrent models x prompts fan-out and
//!   usage aggregation

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
pub use application::CompletionService;
pub use infrastructure::llm::{DefaultProviders, ProviderRegistry};
