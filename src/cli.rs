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

use crate::config::Overrides;
use crate::error::CommandError;
use crate::filter::{FilterKey, SlotFilter, SlotSet, SlotState};
use clap::{CommandFactory, Parser};

const NOTES: &str = "\
Notes:
  - Filters are evaluated as: set | host | ip | state | (binary & config)
  - The HOST, BINARY, and CONFIG arguments are globs
  - BINARY format is groupId:artifactId[:packaging[:classifier]]:version
  - CONFIG format is @env:component[:pools]:version
  - The default filter selects all hosts

Commands:
  show
  assign <BINARY> <@CONFIG>
  clear
  start
  stop
  restart
  ssh";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "galaxy",
    about = "Show and drive Galaxy slots through the console",
    disable_version_flag = true,
    override_usage = "galaxy [OPTIONS] <COMMAND> [ARGS]...",
    after_help = NOTES
)]
pub struct Cli {
    /// Command to run, followed by its arguments
    #[arg(value_name = "COMMAND")]
    pub command: Option<String>,

    #[arg(value_name = "ARGS")]
    pub args: Vec<String>,

    #[arg(long, value_name = "CONSOLE", help = "Galaxy console host (overrides GALAXY_CONSOLE)")]
    pub console: Option<String>,

    #[arg(long, help = "Enable debug messages")]
    pub debug: bool,

    #[arg(short = 'v', long, help = "Display the Galaxy version number and exit")]
    pub version: bool,

    #[arg(
        short = 'b',
        long,
        value_name = "BINARY",
        help_heading = "Filters",
        help = "Select agents with a given binary"
    )]
    pub binary: Option<String>,

    #[arg(
        short = 'c',
        long,
        value_name = "CONFIG",
        help_heading = "Filters",
        help = "Select agents with given configuration"
    )]
    pub config: Option<String>,

    #[arg(
        short = 'i',
        long,
        value_name = "HOST",
        help_heading = "Filters",
        help = "Select a specific agent by hostname"
    )]
    pub host: Option<String>,

    #[arg(
        short = 'I',
        long,
        value_name = "IP",
        help_heading = "Filters",
        help = "Select a specific agent by IP address"
    )]
    pub ip: Option<String>,

    #[arg(
        short = 's',
        long,
        value_enum,
        value_name = "SET",
        help_heading = "Filters",
        help = "Select 'e{mpty}', 't{aken}' or 'a{ll}' hosts"
    )]
    pub set: Option<SlotSet>,

    #[arg(
        short = 'S',
        long,
        value_enum,
        value_name = "STATE",
        help_heading = "Filters",
        help = "Select 'r{unning}' or 's{topped}' hosts"
    )]
    pub state: Option<SlotState>,
}

impl Cli {
    pub fn filter(&self) -> Result<SlotFilter, CommandError> {
        let mut filter = SlotFilter::new();
        let globs = [
            (FilterKey::Binary, &self.binary),
            (FilterKey::Config, &self.config),
            (FilterKey::Host, &self.host),
            (FilterKey::Ip, &self.ip),
        ];
        for (key, value) in globs {
            if let Some(value) = value {
                filter.insert(key, value)?;
            }
        }
        if let Some(set) = self.set {
            filter.set(set);
        }
        if let Some(state) = self.state {
            filter.state(state);
        }
        Ok(filter)
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            console: self.console.clone(),
            debug: self.debug,
        }
    }
}

pub fn usage() -> String {
    Cli::command().render_help().to_string()
}

pub fn version_line() -> String {
    format!("Galaxy version {}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_command_args_and_filters_in_any_position() {
        let cli = Cli::try_parse_from([
            "galaxy", "-i", "web-*", "assign", "@prod:web:1", "--state", "r", "com.acme:web:2",
        ])
        .unwrap();
        assert_eq!(cli.command.as_deref(), Some("assign"));
        assert_eq!(cli.args, vec!["@prod:web:1", "com.acme:web:2"]);

        let filter = cli.filter().unwrap();
        assert_eq!(filter.get(FilterKey::Host), Some("web-*"));
        assert_eq!(filter.get(FilterKey::State), Some("running"));
    }

    #[test]
    fn set_and_state_accept_short_forms() {
        let cli = Cli::try_parse_from(["galaxy", "-s", "e", "-S", "s", "show"]).unwrap();
        assert_eq!(cli.set, Some(SlotSet::Empty));
        assert_eq!(cli.state, Some(SlotState::Stopped));

        let cli = Cli::try_parse_from(["galaxy", "--set", "taken", "show"]).unwrap();
        assert_eq!(cli.filter().unwrap().get(FilterKey::Set), Some("taken"));
    }

    #[test]
    fn rejects_unknown_set_token() {
        assert!(Cli::try_parse_from(["galaxy", "--set", "some", "show"]).is_err());
        assert!(Cli::try_parse_from(["galaxy", "--state", "paused", "show"]).is_err());
    }

    #[test]
    fn no_filters_means_empty_filter() {
        let cli = Cli::try_parse_from(["galaxy", "show"]).unwrap();
        assert!(cli.filter().unwrap().is_empty());
        assert!(cli.overrides().console.is_none());
    }

    #[test]
    fn console_and_debug_become_overrides() {
        let cli =
            Cli::try_parse_from(["galaxy", "--console", "http://c.test", "--debug", "show"])
                .unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.console.as_deref(), Some("http://c.test"));
        assert!(overrides.debug);
    }

    #[test]
    fn usage_lists_commands_and_notes() {
        let text = usage();
        assert!(text.contains("--console"));
        assert!(text.contains("Filters are evaluated as"));
        for command in ["show", "assign", "clear", "start", "stop", "restart", "ssh"] {
            assert!(text.contains(command));
        }
    }

    #[test]
    fn version_flag_is_lowercase_v() {
        let cli = Cli::try_parse_from(["galaxy", "-v"]).unwrap();
        assert!(cli.version);
        assert!(version_line().starts_with("Galaxy version "));
    }
}
