// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mod
//!
//! Domain types shared by the registry, the dispatcher and the adapters.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Value types, provider trait and error taxonomy

pub mod client_config;
pub mod completion;
pub mod llm;
