// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Completion Provider Infrastructure - Anti-Corruption Layer Implementations
//
// Each adapter translates between the normalized completion request and one
// vendor's HTTP API.

pub mod cohere;
pub mod defaults;
pub(crate) mod http;
pub mod huggingface;
pub mod openai;
pub mod registry;

pub use cohere::CohereAdapter;
pub use defaults::DefaultProviders;
pub use huggingface::HuggingFaceAdapter;
pub use openai::OpenAIAdapter;
pub use registry::{ProviderRegistry, ResolvedModel};
