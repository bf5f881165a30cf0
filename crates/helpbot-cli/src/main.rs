// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use helpbot_app::HostPage;
use helpbot_client::Client;
use helpbot_testkit::StubEndpoint;
use helpbot_tui::Launch;
use runtime::ClientRuntime;
use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `helpbot --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let log_path = config.log_path()?;
    logging::init(&config.log_filter(), &log_path)?;

    let demo_endpoint = if options.demo {
        Some(StubEndpoint::demo().context("start demo analysis endpoint")?)
    } else {
        None
    };
    let mut widget_config = config.widget_config()?;
    if let Some(endpoint) = &demo_endpoint {
        widget_config.base_url = endpoint.base_url().to_owned();
    }

    let client = Client::new(&widget_config.base_url, config.timeout()?).with_context(|| {
        format!(
            "invalid [endpoint] config in {}; fix base_url/timeout values",
            options.config_path.display()
        )
    })?;
    if options.check_only {
        return Ok(());
    }

    tracing::info!(
        base_url = client.base_url(),
        demo = options.demo,
        log = %log_path.display(),
        "starting helpbot"
    );
    let launch = Launch {
        config: widget_config,
        auto_init: config.auto_init()?,
    };
    let mut page = HostPage::new();
    let mut runtime = ClientRuntime::new(client);
    helpbot_tui::run_app(&mut page, &launch, &mut runtime)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("helpbot - AI error assistant in your terminal");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Answer queries from a local canned endpoint");
    println!("  --check                  Validate config and endpoint settings, then exit");
    println!("  --help                   Show this help");
    println!();
    println!("Keys: F1 open/close  F2 widget/sidebar  Enter analyze  Esc close  Ctrl+C quit");
}
