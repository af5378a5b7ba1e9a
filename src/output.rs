//! Writing framed images to disk.

use std::path::Path;

use crate::error::BotError;

/// Write PNG bytes to `output_path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the directories or the file cannot be written.
pub fn save_png(data: &[u8], output_path: &Path) -> Result<(), BotError> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output_path, data)?;
    Ok(())
}

/// Read a local source image.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_source(path: &Path) -> Result<Vec<u8>, BotError> {
    Ok(std::fs::read(path)?)
}
