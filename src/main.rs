use std::io;

use clap::{Command, CommandFactory, Parser};
use clap_complete::{generate, Generator};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use alfred_services::application::Feedback;
use alfred_services::cli::commands::execute_command;
use alfred_services::cli::{output, Cli, CliError};
use alfred_services::config::{Settings, WorkflowVariables};
use alfred_services::exitcode;
use alfred_services::infrastructure::AppContext;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

fn main() {
    let cli = Cli::parse();

    if let Some(generator) = cli.generator {
        let mut cmd = Cli::command();
        eprintln!("Generating completion file for {generator:?}...");
        print_completions(generator, &mut cmd);
        return;
    }
    if cli.config_template {
        print!("{}", Settings::template());
        return;
    }

    // Alfred's debugger sets alfred_debug=1 while open
    let alfred_debug = std::env::var("alfred_debug").is_ok_and(|v| v == "1");
    setup_logging(cli.debug, alfred_debug);

    let result = Settings::load()
        .map_err(CliError::from)
        .and_then(|settings| {
            AppContext::new(settings, WorkflowVariables::from_env()).map_err(CliError::from)
        })
        .and_then(|ctx| execute_command(&cli, &ctx));

    if let Err(e) = result {
        tracing::error!("{}", e);
        if cli.update {
            output::error(&e);
        } else {
            // Alfred only shows stdout; surface the failure as a result item
            let feedback =
                Feedback::error(&e.to_string(), "Check the workflow's debug log for details");
            if let Err(write_err) = output::feedback(&feedback) {
                output::error(&write_err);
            }
        }
        std::process::exit(e.exit_code());
    }
    std::process::exit(exitcode::OK);
}

fn setup_logging(verbosity: u8, alfred_debug: bool) {
    tracing::debug!("INIT: Attempting logger init from main.rs");

    let filter = match verbosity {
        0 if alfred_debug => LevelFilter::DEBUG,
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        3 => LevelFilter::TRACE,
        _ => {
            eprintln!("Don't be crazy, max is -d -d -d");
            LevelFilter::TRACE
        }
    };

    // HTTP client internals drown out our own debug output
    let noisy_modules = ["hyper", "reqwest", "rustls"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    // Alfred reads stdout as feedback, so logs must go to stderr
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_ansi(!alfred_debug)
        .with_span_events(FmtSpan::CLOSE);

    let filtered_layer = fmt_layer.with_filter(filter).with_filter(module_filter);

    tracing_subscriber::registry().with(filtered_layer).init();

    match filter {
        LevelFilter::INFO => tracing::info!("Debug mode: info"),
        LevelFilter::DEBUG => tracing::debug!("Debug mode: debug"),
        LevelFilter::TRACE => tracing::debug!("Debug mode: trace"),
        _ => {}
    }
}
