mod confirm;
mod executor;
mod transport;
mod types;

pub use confirm::Confirm;
pub use executor::DownloadExecutor;
pub use transport::{HttpTransport, TransferError, TransferReport, Transport, WgetTransport};
pub use types::{ExecuteOptions, ExecutionReport, RunState, TaskOutcome, TaskReport};
