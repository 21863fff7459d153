//! Merge resolution: reconcile a template with pre-existing remote history.
//!
//! When the user picks the merge resolution, the remote's clone replaces
//! the fresh template copy, and template entries are then folded in
//! without clobbering anything the remote already has. The one exception
//! is the instructions file, which always comes from the template so
//! every knowledge directory agrees on the contract with AI assistants.

use std::fs;
use std::io;
use std::path::Path;

use crate::knowledge::INSTRUCTIONS_FILE;
use crate::template::copy_dir;

/// Copies top-level template entries into `target`.
///
/// An entry is copied only when `target` has no entry of that name,
/// except [`INSTRUCTIONS_FILE`], which is always copied and overwrites
/// any existing version. Running this twice over the same target yields
/// the same file set. Returns the names of the entries copied, sorted.
pub fn merge_template(template_dir: &Path, target: &Path) -> io::Result<Vec<String>> {
    let mut copied = Vec::new();

    for entry in fs::read_dir(template_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name == ".git" {
            continue;
        }

        let destination = target.join(&name);
        let is_instructions = name == INSTRUCTIONS_FILE;
        if destination.exists() && !is_instructions {
            continue;
        }

        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &destination)?;
        } else {
            fs::copy(entry.path(), &destination)?;
        }
        copied.push(name);
    }

    copied.sort();
    Ok(copied)
}
