//! Command-line arguments.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::config::CONFIG_ENV;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub scenario: PathBuf,
    pub config: Option<PathBuf>,
    pub audit_log: Option<PathBuf>,
    pub cleanup: bool,
}

fn command() -> Command {
    Command::new("soar")
        .about("Runs a scenario's playbooks against a SOAR server")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("scenario")
                .long("scenario")
                .value_name("FILE")
                .help("Scenario TOML: the container, artifacts and playbooks to run")
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("Runner configuration TOML")
                .env(CONFIG_ENV)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("audit-log")
                .long("audit-log")
                .value_name("FILE")
                .help("Write every request/response exchange to FILE")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("cleanup")
                .long("cleanup")
                .help("Delete the container after the run")
                .action(ArgAction::SetTrue),
        )
}

impl CliArgs {
    /// Parses a full argument list, program name first.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        command().try_get_matches_from(args).map(Self::from_matches)
    }

    fn from_matches(matches: ArgMatches) -> Self {
        Self {
            scenario: matches
                .get_one::<PathBuf>("scenario")
                .cloned()
                .unwrap_or_default(),
            config: matches.get_one::<PathBuf>("config").cloned(),
            audit_log: matches.get_one::<PathBuf>("audit-log").cloned(),
            cleanup: matches.get_flag("cleanup"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(std::iter::once("soar").chain(args.iter().copied()))
    }

    #[test]
    fn command_definition_is_consistent() {
        command().debug_assert();
    }

    #[test]
    fn all_flags_parse() {
        let args = parse(&[
            "--config",
            "soar.toml",
            "--scenario",
            "phish.toml",
            "--audit-log",
            "audit.txt",
            "--cleanup",
        ])
        .unwrap();

        assert_eq!(args.scenario, PathBuf::from("phish.toml"));
        assert_eq!(args.config, Some(PathBuf::from("soar.toml")));
        assert_eq!(args.audit_log, Some(PathBuf::from("audit.txt")));
        assert!(args.cleanup);
    }

    #[test]
    fn scenario_is_required() {
        assert_eq!(
            parse(&["--cleanup"]).unwrap_err().kind(),
            ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn flag_without_value_is_rejected() {
        assert_eq!(
            parse(&["--scenario"]).unwrap_err().kind(),
            ErrorKind::InvalidValue
        );
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert_eq!(
            parse(&["--scenario", "a.toml", "--verbose"]).unwrap_err().kind(),
            ErrorKind::UnknownArgument
        );
    }
}
