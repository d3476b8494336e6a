// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the omnilm CLI

pub mod complete;
pub mod config;
pub mod models;

pub use self::complete::CompleteArgs;
pub use self::config::ConfigCommand;
pub use self::models::ModelsArgs;
