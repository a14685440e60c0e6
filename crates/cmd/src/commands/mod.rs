// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod cat;
pub mod check;
pub mod copy;
pub mod init;
pub mod list;
pub mod mkdir;
pub mod remove;
pub mod repair;
pub mod show;
pub mod stat;

pub use cat::cat_command;
pub use check::check_command;
pub use copy::copy_command;
pub use init::init_command;
pub use list::list_command;
pub use mkdir::mkdir_command;
pub use remove::remove_command;
pub use repair::repair_command;
pub use show::show_command;
pub use stat::stat_command;
