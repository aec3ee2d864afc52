use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use card_recommender::config::cli::{Cli, Command};
use card_recommender::utils::{logger, validation::Validate};
use card_recommender::{build_engine, AppConfig, AppError, CancelSignal, RecommendationRequest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    logger::init_from_config(&config.logging, cli.verbose);

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        tracing::error!("Suggestion: {}", e.recovery_suggestion());
        eprintln!("{}", e.user_friendly_message());
        std::process::exit(1);
    }
    tracing::debug!(?config, "configuration loaded");

    let engine = Arc::new(build_engine(&config));

    match cli.command {
        Command::Recommend { name, score, salary } => {
            let request = match RecommendationRequest::new(name, score, salary) {
                Ok(request) => request,
                Err(e) => {
                    eprintln!("{}", e.user_friendly_message());
                    std::process::exit(2);
                }
            };

            let (handle, signal) = CancelSignal::pair();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("interrupt received, cancelling request");
                    handle.cancel();
                }
            });

            let result = engine.get_recommendations_with_cancel(&request, signal).await;

            match result {
                Ok(recommendations) => {
                    for warning in &recommendations.warnings {
                        tracing::warn!("{}", warning);
                    }
                    if recommendations.provider_outage() {
                        eprintln!("Service unavailable: every card provider failed");
                        std::process::exit(3);
                    }
                    let output = serde_json::json!({
                        "fromCache": recommendations.from_cache,
                        "cards": recommendations.cards,
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                Err(AppError::Cancelled) => {
                    eprintln!("{}", AppError::Cancelled.user_friendly_message());
                    std::process::exit(130);
                }
                Err(e) => {
                    tracing::error!("Recommendation failed: {}", e);
                    tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());
                    return Err(e.into());
                }
            }
        }

        #[cfg(feature = "server")]
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            card_recommender::app::server::serve(engine, &bind)
                .await
                .context("server terminated with an error")?;
        }
    }

    Ok(())
}
