//! `streamcord run`: the long-lived poll loop.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use streamcord_core::{
    CycleOutcome, DiscordDirectory, Poller, ReconcileTargets, TransportConfig, source,
};

use crate::cli::{GlobalOpts, RunArgs};
use crate::commands::{config_err, load};
use crate::error::CliError;

pub async fn handle(args: RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (config, path) = load(global)?;
    let runtime = config.to_runtime().map_err(config_err(&path))?;

    let source = Arc::from(source::connect(&runtime.upstream)?);
    let targets = ReconcileTargets::from_config(&runtime.discord, &runtime.display);
    let directory =
        DiscordDirectory::connect(&runtime.discord, &targets, &TransportConfig::default()).await?;
    info!(
        server = %runtime.upstream.url,
        kind = %runtime.upstream.kind,
        guild = runtime.discord.guild_id,
        bot = %directory.bot_user_id(),
        "connected"
    );

    let mut poller = Poller::new(
        source,
        Arc::new(directory),
        targets,
        runtime.display,
        runtime.poll,
    );

    if args.once {
        let report = poller.run_cycle().await?;
        info!(%report, "cycle finished");
        return match report.outcome() {
            CycleOutcome::Applied => Ok(()),
            CycleOutcome::PartiallyFailed => Err(report.into()),
        };
    }

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown(cancel.clone()));
    poller.run(cancel).await;
    Ok(())
}

/// Cancel `token` on Ctrl-C, or SIGTERM on unix.
async fn cancel_on_shutdown(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl-C, finishing current cycle"),
        () = terminate => info!("received SIGTERM, finishing current cycle"),
    }
    token.cancel();
}
