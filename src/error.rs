// galaxy - CLI for the Galaxy console slot API
// Copyright (C) 2024 Mathias Uhl <mathiasuhl@gmx.de>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use thiserror::Error;

/// Exit code for failures outside the command taxonomy (transport, parsing, resolution).
pub const FATAL_EXIT_CODE: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success,
    NoAgents,
    /// Reserved; no command currently produces it.
    Unsupported,
    InvalidUsage,
}

impl ErrorCode {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorCode::Success => 0,
            ErrorCode::NoAgents => 1,
            ErrorCode::Unsupported => 3,
            ErrorCode::InvalidUsage => 64,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::Success => "success",
            ErrorCode::NoAgents => "no_agents",
            ErrorCode::Unsupported => "unsupported",
            ErrorCode::InvalidUsage => "invalid_usage",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct CommandError {
    pub code: ErrorCode,
    pub message: String,
}

impl CommandError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_usage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidUsage, message)
    }

    pub fn no_agents() -> Self {
        Self::new(
            ErrorCode::NoAgents,
            "No agents match the provided filters.",
        )
    }
}

/// Finds the `CommandError` carried by an error chain, if any.
pub fn command_error(err: &anyhow::Error) -> Option<&CommandError> {
    err.chain().find_map(|cause| cause.downcast_ref::<CommandError>())
}

pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    command_error(err)
        .map(|e| e.code.exit_code())
        .unwrap_or(FATAL_EXIT_CODE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, anyhow};

    #[test]
    fn exit_codes_match_the_documented_table() {
        assert_eq!(ErrorCode::Success.exit_code(), 0);
        assert_eq!(ErrorCode::NoAgents.exit_code(), 1);
        assert_eq!(ErrorCode::Unsupported.exit_code(), 3);
        assert_eq!(ErrorCode::InvalidUsage.exit_code(), 64);
    }

    #[test]
    fn command_error_survives_added_context() {
        let err = anyhow::Error::new(CommandError::no_agents()).context("running show");
        assert_eq!(exit_code_for(&err), 1);
        assert_eq!(
            command_error(&err).unwrap().message,
            "No agents match the provided filters."
        );
    }

    #[test]
    fn other_errors_are_fatal() {
        let err: anyhow::Error = Err::<(), _>(anyhow!("connection refused"))
            .context("sending request")
            .unwrap_err();
        assert!(command_error(&err).is_none());
        assert_eq!(exit_code_for(&err), FATAL_EXIT_CODE);
    }
}
