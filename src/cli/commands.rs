//! Command dispatch

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::application::feedback::{render_listing, MAGIC_HELP, MAGIC_UPDATE};
use crate::application::{Feedback, Item};
use crate::cli::args::Cli;
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::infrastructure::{AppContext, InfraError};

/// Run the mode selected on the command line.
pub fn execute_command(cli: &Cli, ctx: &AppContext) -> CliResult<()> {
    if cli.show_config {
        println!("{}", ctx.settings.to_toml()?);
        return Ok(());
    }
    if cli.update {
        return run_update(ctx);
    }
    let feedback = run_listing(ctx, cli.query())?;
    output::feedback(&feedback).map_err(|e| InfraError::io("write feedback", e))?;
    Ok(())
}

/// Check the release feed and record the result. Invoked in the background.
#[instrument(skip(ctx))]
fn run_update(ctx: &AppContext) -> CliResult<()> {
    let updates = ctx.update_service();
    let state = updates.check_for_update(Utc::now())?;
    if state.latest_version.is_none() {
        output::warning("no installable release found");
    } else if updates.update_available() {
        output::success("update available");
    } else {
        output::success("workflow is up to date");
    }
    Ok(())
}

/// Build the feedback for `query`.
#[instrument(skip(ctx))]
pub fn run_listing(ctx: &AppContext, query: &str) -> CliResult<Feedback> {
    info!("query={:?}", query);

    if query.starts_with("workflow:") {
        return run_magic(ctx, query);
    }

    let updates = ctx.update_service();
    let update_available = query.is_empty() && updates.update_available();

    if updates.check_due(Utc::now()) {
        // never let the update check break the listing
        match std::env::current_exe() {
            Ok(exe) => {
                if let Err(e) = updates.start_background(&exe) {
                    warn!("background update check: {}", e);
                }
            }
            Err(e) => warn!("cannot locate own executable: {}", e),
        }
    }

    let listing = ctx.listing_service().collect()?;
    debug!("listing: {:?}", listing);
    Ok(render_listing(&listing, query, update_available))
}

/// `workflow:*` queries trigger workflow maintenance instead of a listing.
fn run_magic(ctx: &AppContext, query: &str) -> CliResult<Feedback> {
    let mut feedback = Feedback::new();
    match query {
        MAGIC_UPDATE => {
            let path = ctx.update_service().install()?;
            info!("opened {}", path.display());
            feedback.push(
                Item::new("Installing Update")
                    .subtitle("Alfred will ask to replace the workflow"),
            );
        }
        MAGIC_HELP => {
            let url = ctx.settings.help_url.as_str();
            let out = ctx
                .cmd
                .run("open", &[url])
                .map_err(|e| InfraError::io(format!("open {url}"), e))?;
            if !out.status.success() {
                return Err(CliError::Infra(InfraError::io(
                    format!("open {url}"),
                    std::io::Error::new(
                        std::io::ErrorKind::Other,
                        format!("exit status {}", out.status),
                    ),
                )));
            }
            feedback.push(Item::new("Opening Help").subtitle(url));
        }
        _ => {
            feedback.push(
                Item::new(MAGIC_UPDATE)
                    .subtitle("Install the latest release")
                    .autocomplete(MAGIC_UPDATE),
            );
            feedback.push(
                Item::new(MAGIC_HELP)
                    .subtitle("Open the issue tracker")
                    .autocomplete(MAGIC_HELP),
            );
            feedback.filter(query.trim_start_matches("workflow:"));
            feedback.warn_empty("Unknown Workflow Action", query);
        }
    }
    Ok(feedback)
}
