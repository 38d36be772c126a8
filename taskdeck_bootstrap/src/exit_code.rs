// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Sysexits-style process exit codes, mapped heuristically from startup
//! errors so shell scripts and supervisors can tell a bad flag from a
//! missing database from a dead port.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    #[default]
    Success = 0,
    Error = 1,
    UsageError = 64,
    DataError = 65,
    NoInput = 66,
    Unavailable = 69,
    Software = 70,
    IoError = 74,
    Config = 78,
    Interrupted = 130,
    Terminated = 143,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Best-effort classification of an arbitrary startup error.
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        let text = error.to_string().to_lowercase();
        if text.contains("config") {
            ExitCode::Config
        } else if text.contains("not found") || text.contains("no such") {
            ExitCode::NoInput
        } else if text.contains("invalid") || text.contains("argument") {
            ExitCode::UsageError
        } else if text.contains("parse") || text.contains("format") || text.contains("migrat") {
            ExitCode::DataError
        } else if text.contains("address") || text.contains("bind") || text.contains("port") {
            ExitCode::Unavailable
        } else if text.contains("io") || text.contains("read") || text.contains("write") {
            ExitCode::IoError
        } else {
            ExitCode::Error
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::Error => "General error",
            ExitCode::UsageError => "Command line usage error",
            ExitCode::DataError => "Data format error",
            ExitCode::NoInput => "Cannot open input",
            ExitCode::Unavailable => "Service unavailable",
            ExitCode::Software => "Internal software error",
            ExitCode::IoError => "Input/output error",
            ExitCode::Config => "Configuration error",
            ExitCode::Interrupted => "Interrupted by SIGINT",
            ExitCode::Terminated => "Terminated by SIGTERM",
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_i32(), self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn codes_match_sysexits() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::UsageError.as_i32(), 64);
        assert_eq!(ExitCode::Config.as_i32(), 78);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
    }

    #[test]
    fn classification_is_keyword_driven() {
        let config = io::Error::other("Configuration error: cannot read config.toml");
        assert_eq!(ExitCode::from_error(&config), ExitCode::Config);

        let bind = io::Error::other("failed to bind address 0.0.0.0:8788");
        assert_eq!(ExitCode::from_error(&bind), ExitCode::Unavailable);

        let unknown = io::Error::other("something odd happened");
        assert_eq!(ExitCode::from_error(&unknown), ExitCode::Error);
    }
}
