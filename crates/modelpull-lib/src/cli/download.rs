use crate::cli::DownloadParams;
use crate::cli::confirm::TerminalConfirm;
use crate::cli::list::{format_listing, resolve_listing};
use crate::config::{MirrorConfig, TransportKind};
use crate::download::{
    Confirm, DownloadExecutor, ExecutionReport, HttpTransport, Transport, WgetTransport,
};
use crate::error::ModelPullError;
use crate::plan::plan_downloads;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub fn build_transport(
    kind: TransportKind,
    mirror: &MirrorConfig,
) -> Result<Arc<dyn Transport>, ModelPullError> {
    let transport: Arc<dyn Transport> = match kind {
        TransportKind::Http => Arc::new(HttpTransport::new(Duration::from_secs(
            mirror.connect_timeout_secs,
        ))?),
        TransportKind::Wget => Arc::new(WgetTransport::new()),
    };
    Ok(transport)
}

pub async fn run_download(
    params: DownloadParams,
    cancel: CancellationToken,
) -> Result<ExecutionReport, ModelPullError> {
    let DownloadParams {
        listing_url,
        mirror,
        destination_root,
        policy,
        options,
        transport,
        assume_yes,
    } = params;

    let listing = resolve_listing(&listing_url, &mirror).await?;
    println!("{}", format_listing(&listing));

    let tasks = plan_downloads(&listing, &destination_root, &policy);
    tracing::info!(
        "Planned {} of {} files for {}",
        tasks.len(),
        listing.len(),
        destination_root.display()
    );

    let executor =
        DownloadExecutor::new(build_transport(transport, &mirror)?, options).with_cancellation(cancel);
    let confirm: &dyn Confirm = if assume_yes { &true } else { &TerminalConfirm };
    let report = executor.execute(&destination_root, tasks, confirm).await?;

    let report = report.into_result()?;
    tracing::info!(
        "Download completed successfully to {}",
        report.destination_root.display()
    );
    Ok(report)
}
