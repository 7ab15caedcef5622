//! Whole-device imaging with GNU ddrescue.
//!
//! ddrescue owns progress display and resumability (via its map file), so it runs in the
//! foreground and only its exit code is kept.

use crate::errors::RepairError;
use crate::session::Session;
use crate::ui::confirm::approve;
use serde::Serialize;
use std::path::Path;

/// Binary names tried in order.
const DDRESCUE_CANDIDATES: [&str; 2] = ["ddrescue", "gddrescue"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageOutcome {
    /// Imaging did not start (or could not be launched).
    Error { error: String },
    /// The operator declined; ddrescue never ran.
    Aborted,
    Finished { rc: Option<i32> },
}

fn find_ddrescue(session: &Session<'_>) -> Option<&'static str> {
    DDRESCUE_CANDIDATES
        .into_iter()
        .find(|name| session.hal.which(name).is_some())
}

/// Image `source` into `dest`, keeping ddrescue's map at `mapfile`.
///
/// Only [`RepairError::PrivilegeRequired`] is an error; everything else is an [`ImageOutcome`].
pub fn image(
    session: &Session<'_>,
    source: &str,
    dest: &Path,
    mapfile: &Path,
    auto_yes: bool,
) -> Result<ImageOutcome, RepairError> {
    session.require_root()?;

    if !session.hal.path_exists(Path::new(source)) {
        return Ok(ImageOutcome::Error {
            error: format!("source does not exist: {}", source),
        });
    }
    let Some(ddrescue) = find_ddrescue(session) else {
        return Ok(ImageOutcome::Error {
            error: "ddrescue (gddrescue) not found; install package 'gddrescue'.".to_string(),
        });
    };

    let prompt = format!(
        "Proceed to image {} -> {}? This may take a long time.",
        source,
        dest.display()
    );
    match approve(session.prompter, auto_yes, &prompt) {
        Ok(true) => {}
        Ok(false) => return Ok(ImageOutcome::Aborted),
        Err(err) => {
            log::warn!("no answer to imaging prompt: {}", err);
            return Ok(ImageOutcome::Aborted);
        }
    }

    let dest_dir = dest
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if let Err(err) = session.hal.create_dir_all(dest_dir) {
        return Ok(ImageOutcome::Error {
            error: format!("could not create {}: {}", dest_dir.display(), err),
        });
    }

    let dest_text = dest.to_string_lossy();
    let map_text = mapfile.to_string_lossy();
    session.log.append(&format!(
        "ddrescue start {} -> {} map {}",
        source, dest_text, map_text
    ));
    let args: [&str; 5] = ["-f", "--logfile", &map_text, source, &dest_text];
    log::debug!("running {} {}", ddrescue, args.join(" "));

    Ok(match session.hal.command_foreground(ddrescue, &args) {
        Ok(status) => ImageOutcome::Finished { rc: status.code() },
        Err(err) => ImageOutcome::Error {
            error: err.to_string(),
        },
    })
}
