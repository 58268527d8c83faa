//! Decide which operations make a destination mirror its source.
//!
//! Pure: nothing here reads or writes the filesystem. Fingerprint equality is
//! the only notion of "same content" and filename equality the only notion of
//! "same location".

use std::path::Path;

use mirror_core::types::{FileIndex, FileOperation};

/// Compute the operations that reconcile `dest` to `source`.
///
/// Two passes over the same snapshot:
/// 1. each source entry becomes a `Copy` (content missing from the destination),
///    a `Move` (content present under another name) or nothing;
/// 2. each destination entry whose content is gone from the source becomes a
///    `Delete`.
///
/// Results follow index iteration order, pass 1 before pass 2. Neither index
/// is modified.
pub fn reconcile(
    source: &FileIndex,
    dest: &FileIndex,
    source_root: &Path,
    dest_root: &Path,
) -> Vec<FileOperation> {
    let mut ops = Vec::new();

    for (fingerprint, filename) in source.iter() {
        match dest.get(fingerprint) {
            None => ops.push(FileOperation::copy(
                source_root.join(filename),
                dest_root.join(filename),
            )),
            Some(dest_name) if dest_name != filename => ops.push(FileOperation::move_file(
                dest_root.join(dest_name),
                dest_root.join(filename),
            )),
            Some(_) => {}
        }
    }

    for (fingerprint, filename) in dest.iter() {
        if !source.contains(fingerprint) {
            ops.push(FileOperation::delete(dest_root.join(filename)));
        }
    }

    ops
}
