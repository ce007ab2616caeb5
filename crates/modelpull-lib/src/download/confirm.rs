use std::path::Path;

/// Last chance for the operator to stop a run before any bytes move.
pub trait Confirm: Send + Sync {
    fn confirm(&self, destination: &Path, task_count: usize) -> bool;
}

/// A pre-supplied answer, e.g. from `--yes`.
impl Confirm for bool {
    fn confirm(&self, _destination: &Path, _task_count: usize) -> bool {
        *self
    }
}

impl<F> Confirm for F
where
    F: Fn(&Path, usize) -> bool + Send + Sync,
{
    fn confirm(&self, destination: &Path, task_count: usize) -> bool {
        self(destination, task_count)
    }
}
