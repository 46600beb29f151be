//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Pagecheck: run the login page UI suite and report the results
#[derive(Parser, Debug)]
#[command(name = "pagecheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the login scenarios
    Run(RunArgs),

    /// List the locator registry
    Locators(LocatorsArgs),

    /// Show the effective suite configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Suite configuration file (YAML)
    #[arg(short, long, env = "PAGECHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Browser backend
    #[arg(short, long, default_value = "chromium")]
    pub backend: Backend,

    /// Run only scenarios whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Stop after the first failed scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Default wait timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Allure results directory
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Output directory for the HTML, JSON and JUnit reports
    #[arg(short, long, default_value = "target/pagecheck")]
    pub output: PathBuf,
}

/// Browser backend for the run command
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    /// Headless Chromium over CDP
    #[default]
    Chromium,
    /// In-process scripted demo site
    Mock,
}

/// Arguments for the locators command
#[derive(Parser, Debug)]
pub struct LocatorsArgs {
    /// Only this page (login, common, dashboard, navigation)
    #[arg(short, long)]
    pub page: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: ListFormat,
}

/// Output format for listings
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Suite configuration file (YAML)
    #[arg(short, long, env = "PAGECHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the Chromium launch flags as well
    #[arg(long)]
    pub launch_args: bool,
}

/// Color argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pagecheck").chain(args.iter().copied())).unwrap()
    }

    mod run_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let cli = parse(&["run"]);
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert_eq!(args.backend, Backend::Chromium);
            assert!(!args.fail_fast);
            assert!(!args.headed);
            assert_eq!(args.output, PathBuf::from("target/pagecheck"));
        }

        #[test]
        fn test_all_flags() {
            let cli = parse(&[
                "-vv",
                "run",
                "--backend",
                "mock",
                "--filter",
                "empty",
                "--fail-fast",
                "--headed",
                "--timeout",
                "3",
                "--results-dir",
                "allure",
            ]);
            assert_eq!(cli.verbose, 2);
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert_eq!(args.backend, Backend::Mock);
            assert_eq!(args.filter.as_deref(), Some("empty"));
            assert!(args.fail_fast);
            assert!(args.headed);
            assert_eq!(args.timeout, Some(3));
            assert_eq!(args.results_dir, Some(PathBuf::from("allure")));
        }

        #[test]
        fn test_unknown_backend_rejected() {
            let result =
                Cli::try_parse_from(["pagecheck", "run", "--backend", "firefox"]);
            assert!(result.is_err());
        }
    }

    mod other_command_tests {
        use super::*;

        #[test]
        fn test_locators() {
            let cli = parse(&["locators", "--page", "login", "--format", "json"]);
            let Commands::Locators(args) = cli.command else {
                panic!("expected locators");
            };
            assert_eq!(args.page.as_deref(), Some("login"));
            assert_eq!(args.format, ListFormat::Json);
        }

        #[test]
        fn test_config() {
            let cli = parse(&["--quiet", "config", "--launch-args"]);
            assert!(cli.quiet);
            let Commands::Config(args) = cli.command else {
                panic!("expected config");
            };
            assert!(args.launch_args);
        }

        #[test]
        fn test_color_conversion() {
            use crate::config::ColorChoice;
            assert_eq!(ColorChoice::from(ColorArg::Never), ColorChoice::Never);
            assert_eq!(ColorChoice::from(ColorArg::Always), ColorChoice::Always);
        }
    }
}
