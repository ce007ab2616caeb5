use crate::cli::args::Command;
use crate::cli::params::{DownloadParams, ListParams};
use crate::config::load_config;
use crate::download::ExecuteOptions;
use crate::error::ModelPullError;
use crate::listing::ListingUrl;
use crate::plan::PlanPolicy;
use crate::utils::normalize_extension;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum ResolvedCommand {
    List(ListParams),
    Download(DownloadParams),
}

pub fn resolve_command(command: Command) -> Result<ResolvedCommand, ModelPullError> {
    match command {
        Command::List { config_path, url } => {
            let app_config = load_config(config_path.as_deref())?;
            validate_continuation_limit(app_config.mirror.max_continuation_pages)?;

            let listing_url = ListingUrl::parse(&url, &app_config.mirror)?;
            Ok(ResolvedCommand::List(ListParams {
                listing_url,
                mirror: app_config.mirror,
            }))
        }
        Command::Download {
            config_path,
            url,
            output_dir,
            assume_yes,
            no_update,
            exclude_extensions,
            parallelism,
            max_retries,
            transport,
        } => {
            let mut app_config = load_config(config_path.as_deref())?;
            validate_continuation_limit(app_config.mirror.max_continuation_pages)?;

            let download = &mut app_config.download;
            if no_update {
                download.update_existing = false;
            }
            if !exclude_extensions.is_empty() {
                download.exclude_extensions = exclude_extensions
                    .iter()
                    .map(|extension| normalize_extension(extension))
                    .collect();
            }
            if let Some(parallelism) = parallelism {
                download.parallelism = parallelism;
            }
            if let Some(max_retries) = max_retries {
                download.max_retries = max_retries;
            }
            if let Some(transport) = transport {
                download.transport = transport;
            }

            if download.parallelism == 0 {
                return Err(ModelPullError::CliArgumentValidation {
                    details: "parallelism must be greater than 0.".to_string(),
                });
            }

            let listing_url = ListingUrl::parse(&url, &app_config.mirror)?;
            let destination_root = output_dir
                .map(PathBuf::from)
                .unwrap_or_else(|| listing_url.default_destination());

            Ok(ResolvedCommand::Download(DownloadParams {
                listing_url,
                destination_root,
                policy: PlanPolicy::from(&app_config.download),
                options: ExecuteOptions::from(&app_config.download),
                transport: app_config.download.transport,
                mirror: app_config.mirror,
                assume_yes,
            }))
        }
    }
}

fn validate_continuation_limit(limit: usize) -> Result<(), ModelPullError> {
    if limit == 0 {
        return Err(ModelPullError::CliArgumentValidation {
            details: "mirror.max_continuation_pages must be greater than 0.".to_string(),
        });
    }
    Ok(())
}
