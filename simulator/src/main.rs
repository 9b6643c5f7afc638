use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use impact_access::{PageId, Role};
use impact_nav::NavConfig;
use impact_simulator::{run_simulator, SimulatorConfig};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let config_arg = Arg::new("config")
        .long("config")
        .value_parser(value_parser!(PathBuf))
        .help("Navigation config file (TOML)");

    Command::new("impact-sim")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Developer tooling for the impact navigation engine")
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("simulate")
                .about("Run the invariant simulator")
                .arg(
                    Arg::new("operations")
                        .long("ops")
                        .default_value("10000")
                        .value_parser(value_parser!(u64))
                        .help("Number of operations to simulate"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("stop-on-violation")
                        .long("stop-on-violation")
                        .action(ArgAction::SetTrue)
                        .help("Stop simulation on first violation"),
                )
                .arg(config_arg.clone()),
        )
        .subcommand(
            Command::new("matrix")
                .about("Print and validate the page permission matrix")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                )
                .arg(config_arg),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(args: &ArgMatches) -> Result<NavConfig> {
    match args.get_one::<PathBuf>("config") {
        Some(path) => NavConfig::load(path)
            .with_context(|| format!("loading navigation config from {}", path.display())),
        None => Ok(NavConfig::default()),
    }
}

fn simulate(args: &ArgMatches) -> Result<bool> {
    let config = SimulatorConfig {
        seed: args.get_one::<u64>("seed").copied().unwrap_or(42),
        total_operations: args.get_one::<u64>("operations").copied().unwrap_or(10_000),
        stop_on_first_violation: args.get_flag("stop-on-violation"),
        nav: load_config(args)?,
        ..SimulatorConfig::default()
    };

    let report = run_simulator(config).context("building navigation engine")?;
    println!("{}", report.generate_text());
    Ok(report.passed())
}

fn matrix(args: &ArgMatches) -> Result<bool> {
    let config = load_config(args)?.with_strict_matrix(false);
    let matrix = config.role_matrix()?;
    let verdict = matrix.validate();

    if args.get_flag("json") {
        let table: BTreeMap<PageId, Vec<Role>> = PageId::ALL
            .into_iter()
            .map(|page| {
                let roles = matrix
                    .roles_for(page)
                    .map(|roles| roles.iter().copied().collect())
                    .unwrap_or_default();
                (page, roles)
            })
            .collect();
        let output = serde_json::json!({
            "pages": table,
            "valid": verdict.is_ok(),
            "error": verdict.as_ref().err().map(ToString::to_string),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{:<28} roles", "page");
        for page in PageId::ALL {
            let roles = matrix.roles_for(page).map_or_else(String::new, |roles| {
                roles.iter().map(|r| r.as_str()).collect::<Vec<_>>().join(", ")
            });
            let roles = if roles.is_empty() { "-".to_string() } else { roles };
            println!("{:<28} {roles}", page.as_str());
        }
        println!();
        match &verdict {
            Ok(()) => println!("Matrix: VALID"),
            Err(err) => println!("Matrix: INVALID ({err})"),
        }
    }
    Ok(verdict.is_ok())
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let passed = match matches.subcommand() {
        Some(("simulate", args)) => simulate(args)?,
        Some(("matrix", args)) => matrix(args)?,
        _ => unreachable!("subcommand is required"),
    };

    std::process::exit(if passed { 0 } else { 1 });
}
