//! Pagecheck CLI: run the login page UI suite
//!
//! ## Usage
//!
//! ```bash
//! pagecheck run                          # All scenarios against headless Chromium
//! pagecheck run --filter empty           # Only the empty-field scenarios
//! pagecheck run --backend mock           # Against the in-process demo site
//! pagecheck locators --page login        # Show the login locators
//! pagecheck config --config suite.yaml   # Effective configuration
//! ```

use clap::Parser;
use pagecheck::scenarios::{self, Scenario};
use pagecheck::{registry, DemoSite, Driver, Locator, MockDriver, SuiteConfig};
use pagecheck_cli::{
    Backend, Cli, CliConfig, CliError, CliResult, Commands, ConfigArgs, ListFormat, LocatorsArgs,
    RunArgs, SuiteRunner, Verbosity,
};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(config.verbosity);

    match run(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(command: Commands, config: CliConfig) -> CliResult<()> {
    match command {
        Commands::Run(args) => run_suite(config, &args),
        Commands::Locators(args) => run_locators(&args),
        Commands::Config(args) => run_config(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.clone().into())
}

/// `RUST_LOG` wins over the `-v` count
fn init_tracing(verbosity: Verbosity) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_suite(path: Option<&Path>) -> CliResult<SuiteConfig> {
    let suite = match path {
        Some(path) => SuiteConfig::load(path)?,
        None => SuiteConfig::from_env()?,
    };
    Ok(suite)
}

fn select<D: Driver>(filter: Option<&str>) -> CliResult<Vec<Scenario<D>>> {
    let selected = match filter {
        Some(filter) => scenarios::matching(filter),
        None => scenarios::all(),
    };
    if selected.is_empty() {
        return Err(CliError::invalid_argument(format!(
            "no scenario matches '{}'",
            filter.unwrap_or_default()
        )));
    }
    Ok(selected)
}

fn run_suite(config: CliConfig, args: &RunArgs) -> CliResult<()> {
    let mut suite = load_suite(args.config.as_deref())?;
    if let Some(secs) = args.timeout {
        suite.default_timeout_secs = secs;
    }
    if let Some(ref dir) = args.results_dir {
        suite.results_dir.clone_from(dir);
    }
    if args.headed {
        suite.browser.headless = false;
    }
    suite.validate()?;

    let config = config
        .with_fail_fast(args.fail_fast)
        .with_output_dir(&args.output);
    let mut runner = SuiteRunner::new(config);

    let report = match args.backend {
        Backend::Mock => {
            let site = DemoSite {
                login_url: suite.login_url.clone(),
                projects_url: suite.projects_url.clone(),
                ..DemoSite::default()
            };
            let selected = select::<MockDriver>(args.filter.as_deref())?;
            runner.run(&suite, &selected, || Ok(site.driver()))?
        }
        Backend::Chromium => run_chromium(&mut runner, &suite, args.filter.as_deref())?,
    };

    let _ = runner.write_reports(&report)?;
    if report.all_passed() {
        Ok(())
    } else {
        Err(CliError::ScenariosFailed {
            failed: report.failed_count(),
            total: report.total_count(),
        })
    }
}

#[cfg(feature = "browser")]
fn run_chromium(
    runner: &mut SuiteRunner,
    suite: &SuiteConfig,
    filter: Option<&str>,
) -> CliResult<pagecheck::Reporter> {
    use pagecheck::ChromiumDriver;

    let selected = select::<ChromiumDriver>(filter)?;
    runner.run(suite, &selected, || Ok(ChromiumDriver::launch(&suite.browser)?))
}

#[cfg(not(feature = "browser"))]
fn run_chromium(
    _runner: &mut SuiteRunner,
    _suite: &SuiteConfig,
    _filter: Option<&str>,
) -> CliResult<pagecheck::Reporter> {
    Err(CliError::config(
        "the chromium backend needs the `browser` feature; rebuild with --features browser or use --backend mock",
    ))
}

fn run_locators(args: &LocatorsArgs) -> CliResult<()> {
    let pages: Vec<&(&str, &[Locator])> = registry::pages()
        .iter()
        .filter(|(page, _)| args.page.as_deref().map_or(true, |p| p == *page))
        .collect();
    if pages.is_empty() {
        return Err(CliError::invalid_argument(format!(
            "unknown page '{}'",
            args.page.as_deref().unwrap_or_default()
        )));
    }

    match args.format {
        ListFormat::Text => {
            for (page, locators) in pages {
                println!("{page}");
                for locator in locators.iter() {
                    println!("  {locator}");
                }
            }
        }
        ListFormat::Json => {
            let listing: Vec<serde_json::Value> = pages
                .iter()
                .flat_map(|(page, locators)| {
                    locators.iter().map(move |locator| {
                        serde_json::json!({
                            "page": page,
                            "name": locator.name(),
                            "strategy": locator.strategy().label(),
                            "fragments": locator.fragments(),
                            "query": locator.query().expression(),
                        })
                    })
                })
                .collect();
            let rendered = serde_json::to_string_pretty(&listing)
                .map_err(|e| CliError::report_generation(e.to_string()))?;
            println!("{rendered}");
        }
    }
    Ok(())
}

fn run_config(args: &ConfigArgs) -> CliResult<()> {
    let suite = load_suite(args.config.as_deref())?;
    print!("{}", suite.to_yaml()?);
    if args.launch_args {
        println!("launch_args:");
        for arg in suite.browser.launch_args() {
            println!("  - {arg}");
        }
    }
    Ok(())
}
