use modelpull_lib::cli::{ResolvedCommand, parse_args, resolve_command, run_download, run_list};
use modelpull_lib::error::ModelPullError;
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), ModelPullError> {
    color_eyre::install()?;

    let args = parse_args();
    let command = resolve_command(args.command)?;

    match command {
        ResolvedCommand::List(params) => {
            run_list(params).await?;
        }
        ResolvedCommand::Download(params) => {
            let cancel = CancellationToken::new();
            tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::warn!("Interrupted, partial files are kept and resume on the next run");
                        cancel.cancel();
                    }
                }
            });
            run_download(params, cancel).await?;
        }
    }

    Ok(())
}
