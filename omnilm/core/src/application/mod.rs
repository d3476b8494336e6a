// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod aggregator;
pub mod completion_service;
pub mod dispatcher;

pub use aggregator::{aggregate, total_usage};
pub use completion_service::CompletionService;
pub use dispatcher::{CompletionDispatcher, DispatchSettings};
