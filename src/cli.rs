// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::{env, path::PathBuf};

use crate::core::config::IntegrationOptions;
use crate::infra::t;

pub mod commands;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` argument.
fn pre_parse_language() -> String {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        if let Some(lang) = args.get(pos + 1) {
            return lang.clone();
        }
    }
    // Fallback to system language detection
    sys_locale::get_locale().unwrap_or_else(|| "en".to_string())
}

fn build_cli(locale: &str) -> Command {
    Command::new("channel-runner")
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli.about", locale = locale).to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli.lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("integration")
                .about(t!("cli.integration_about", locale = locale).to_string())
                .arg(
                    Arg::new("version")
                        .long("version")
                        .help(t!("arg.version", locale = locale).to_string())
                        .value_name("VERSION")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("python-only")
                        .long("python-only")
                        .help(t!("arg.python_only", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("scala-only")
                        .long("scala-only")
                        .help(t!("arg.scala_only", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("pip-only")
                        .long("pip-only")
                        .help(t!("arg.pip_only", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-pip")
                        .long("no-pip")
                        .help(t!("arg.no_pip", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("scala-version")
                        .long("scala-version")
                        .help(t!("arg.scala_version", locale = locale).to_string())
                        .value_name("SCALA_VERSION")
                        .default_value("2.12")
                        .value_parser(["2.12", "2.13"])
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("test")
                        .long("test")
                        .help(t!("arg.test", locale = locale).to_string())
                        .value_name("SUBSTRING")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("maven-repo")
                        .long("maven-repo")
                        .help(t!("arg.maven_repo", locale = locale).to_string())
                        .value_name("URL")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("use-testpypi")
                        .long("use-testpypi")
                        .help(t!("arg.use_testpypi", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("use-local")
                        .long("use-local")
                        .help(t!("arg.use_local", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("run-storage-s3-dynamodb-integration-tests")
                        .long("run-storage-s3-dynamodb-integration-tests")
                        .help(t!("arg.storage_tests", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("dbb-packages")
                        .long("dbb-packages")
                        .help(t!("arg.dbb_packages", locale = locale).to_string())
                        .value_name("CSV")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("dbb-conf")
                        .long("dbb-conf")
                        .help(t!("arg.dbb_conf", locale = locale).to_string())
                        .value_name("KEY=VALUE")
                        .num_args(1..)
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("project-dir")
                        .long("project-dir")
                        .help(t!("arg.project_dir", locale = locale).to_string())
                        .value_name("PROJECT_DIR")
                        .default_value(".")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("report")
                        .long("report")
                        .help(t!("arg.report", locale = locale).to_string())
                        .value_name("FILE")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("unit")
                .about(t!("cli.unit_about", locale = locale).to_string())
                .arg(
                    Arg::new("project-dir")
                        .long("project-dir")
                        .help(t!("arg.project_dir", locale = locale).to_string())
                        .value_name("PROJECT_DIR")
                        .default_value(".")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                ),
        )
}

pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let language = pre_parse_language();
    rust_i18n::set_locale(&language);

    let matches = build_cli(&language).get_matches();

    match matches.subcommand() {
        Some(("integration", sub_matches)) => {
            let options = IntegrationOptions {
                version: sub_matches.get_one::<String>("version").cloned(),
                python_only: sub_matches.get_flag("python-only"),
                scala_only: sub_matches.get_flag("scala-only"),
                pip_only: sub_matches.get_flag("pip-only"),
                no_pip: sub_matches.get_flag("no-pip"),
                scala_version: sub_matches
                    .get_one::<String>("scala-version")
                    .unwrap() // Has default
                    .clone(),
                test_filter: sub_matches.get_one::<String>("test").cloned(),
                maven_repo: sub_matches.get_one::<String>("maven-repo").cloned(),
                use_testpypi: sub_matches.get_flag("use-testpypi"),
                use_local: sub_matches.get_flag("use-local"),
                storage_integration: sub_matches
                    .get_flag("run-storage-s3-dynamodb-integration-tests"),
                dbb_packages: sub_matches.get_one::<String>("dbb-packages").cloned(),
                dbb_conf: sub_matches
                    .get_many::<String>("dbb-conf")
                    .map(|values| values.cloned().collect())
                    .unwrap_or_default(),
            };
            let project_dir = sub_matches
                .get_one::<PathBuf>("project-dir")
                .unwrap() // Has default
                .clone();
            let report = sub_matches.get_one::<PathBuf>("report").cloned();

            commands::integration::execute(options, project_dir, report).await
        }
        Some(("unit", sub_matches)) => {
            let project_dir = sub_matches
                .get_one::<PathBuf>("project-dir")
                .unwrap() // Has default
                .clone();
            commands::unit::execute(project_dir).await
        }
        _ => {
            // Unreachable: a subcommand is required and clap has already
            // printed the help text otherwise.
            Ok(())
        }
    }
}
