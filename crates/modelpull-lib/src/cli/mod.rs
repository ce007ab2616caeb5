mod args;
mod confirm;
mod download;
mod list;
mod params;
mod resolved_command;

pub use args::{Args, Command, parse_args};
pub use confirm::TerminalConfirm;
pub use download::{build_transport, run_download};
pub use list::{format_listing, resolve_listing, run_list};
pub use params::{DownloadParams, ListParams};
pub use resolved_command::{ResolvedCommand, resolve_command};
