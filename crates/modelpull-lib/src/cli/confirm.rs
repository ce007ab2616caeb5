use crate::download::Confirm;
use std::io::{BufRead, Write};
use std::path::Path;

/// Asks on the terminal before downloading. Anything but y/n asks again;
/// a closed stdin counts as "no".
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConfirm;

impl TerminalConfirm {
    fn ask(destination: &Path, task_count: usize) -> std::io::Result<bool> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            write!(
                stdout,
                "Saving {} files to {}\nContinue downloading? Y/N\n",
                task_count,
                destination.display()
            )?;
            stdout.flush()?;

            let mut answer = String::new();
            if stdin.lock().read_line(&mut answer)? == 0 {
                return Ok(false);
            }
            match answer.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(stdout, "Please answer y or n")?,
            }
        }
    }
}

impl Confirm for TerminalConfirm {
    fn confirm(&self, destination: &Path, task_count: usize) -> bool {
        tokio::task::block_in_place(|| Self::ask(destination, task_count)).unwrap_or_else(|e| {
            tracing::warn!("Failed to read confirmation: {}", e);
            false
        })
    }
}
