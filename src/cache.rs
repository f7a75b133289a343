use anyhow::{Context, Result};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::info;

/// Delete the collected export at `path` once `confirm` agrees.
///
/// Returns `Ok(false)` when the file does not exist or the deletion was declined.
pub fn remove_cache<F>(path: &Path, confirm: F) -> Result<bool>
where
    F: FnOnce(&Path) -> Result<bool>,
{
    if !path.is_file() {
        return Ok(false);
    }
    if !confirm(path)? {
        info!(path = %path.display(), "Cache removal declined");
        return Ok(false);
    }

    fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    info!(path = %path.display(), "Cache removed");
    Ok(true)
}

/// Ask a yes/no question on `output`, reading the answer from `input`.
pub fn prompt_confirm<R: BufRead, W: Write>(path: &Path, mut input: R, mut output: W) -> Result<bool> {
    write!(output, "Remove {}? [y/N] ", path.display())?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Confirmation backed by the terminal.
pub fn stdin_confirm(path: &Path) -> Result<bool> {
    prompt_confirm(path, io::stdin().lock(), io::stderr())
}
