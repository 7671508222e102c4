// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: GPL-3.0-only

pub mod changelog;
pub mod git;
pub mod heuristic;
pub mod llm;
pub mod orchestrator;
pub mod prompt;
pub mod registry;
pub mod response;
pub mod safety;
pub mod secrets;
