// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Library side of the `flatfs` command line tool: shared context plus one
//! module per subcommand. The binary in `main.rs` only parses arguments
//! and dispatches here.

pub mod commands;
pub mod common;

#[cfg(test)]
mod tests;
