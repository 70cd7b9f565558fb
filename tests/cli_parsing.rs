use clap::Parser;
use fixloop::cli::commands::config::ConfigCommand;
use fixloop::cli::{Cli, Commands};
use std::path::PathBuf;

#[test]
fn test_parse_run_with_overrides() {
    let cli = Cli::try_parse_from([
        "fixloop",
        "run",
        "--max-iterations",
        "4",
        "--max-parallel",
        "2",
    ])
    .unwrap();

    match cli.command {
        Commands::Run(args) => {
            assert_eq!(args.max_iterations, Some(4));
            assert_eq!(args.max_parallel, Some(2));
            assert_eq!(args.agents_per_phase, None);
        }
        _ => panic!("Wrong top-level command"),
    }
    assert!(!cli.json);
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "fixloop",
        "check",
        "--list",
        "--json",
        "--project",
        "/work/app",
    ])
    .unwrap();

    assert!(cli.json);
    assert_eq!(cli.project, PathBuf::from("/work/app"));
    match cli.command {
        Commands::Check(args) => assert!(args.list),
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_config_subcommands() {
    let cli = Cli::try_parse_from(["fixloop", "config", "validate"]).unwrap();
    match cli.command {
        Commands::Config(args) => assert!(matches!(args.command, ConfigCommand::Validate)),
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_quiet_conflicts_with_verbose() {
    let result = Cli::try_parse_from(["fixloop", "--quiet", "--verbose", "check"]);
    assert!(result.is_err());
}

#[test]
fn test_rejects_non_numeric_iterations() {
    let result = Cli::try_parse_from(["fixloop", "run", "--max-iterations", "many"]);
    assert!(result.is_err());
}
