//! Order reconciled operations so that every write lands on a free path.
//!
//! [`reconcile`](crate::reconcile::reconcile) decides *what* to do but not in
//! which order it is safe to do it: a `Copy` can target the name of a file
//! that is about to be deleted, and a `Move` can target a name that another
//! move is about to vacate. The schedule is:
//!
//! 1. every `Delete`, in reconciled order;
//! 2. every `Move`, each one after the move that vacates its target;
//! 3. every `Copy`, in reconciled order.
//!
//! Paths conflict when they are equal or when one lies beneath the other: a
//! file cannot be written where a directory of kept files stands, nor beneath
//! a kept file. A write that conflicts with a destination file which is
//! neither deleted nor moved away first is rejected with
//! [`SyncError::DestinationCollision`] before anything is applied. So is a
//! cycle of moves, such as two files swapping names or a file moving beneath
//! its own current name.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::ops::Bound;
use std::path::{Path, PathBuf};

use mirror_core::types::{FileIndex, FileOperation};

use crate::SyncError;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Placed,
}

/// Order `ops` for application against the destination described by `dest`.
pub fn schedule(
    ops: Vec<FileOperation>,
    dest: &FileIndex,
    dest_root: &Path,
) -> Result<Vec<FileOperation>, SyncError> {
    let occupied: BTreeSet<PathBuf> = dest.iter().map(|(_, name)| dest_root.join(name)).collect();

    let mut deletes = Vec::new();
    let mut moves = Vec::new();
    let mut copies = Vec::new();
    for op in ops {
        match op {
            FileOperation::Delete { .. } => deletes.push(op),
            FileOperation::Move { .. } => moves.push(op),
            FileOperation::Copy { .. } => copies.push(op),
        }
    }

    let deleted: HashSet<&Path> = deletes
        .iter()
        .filter_map(|op| match op {
            FileOperation::Delete { path } => Some(path.as_path()),
            _ => None,
        })
        .collect();
    let vacated_by: HashMap<&Path, usize> = moves
        .iter()
        .enumerate()
        .filter_map(|(i, op)| match op {
            FileOperation::Move { from, .. } => Some((from.as_path(), i)),
            _ => None,
        })
        .collect();

    // after[i]: moves that must run before move i.
    let mut after: Vec<Vec<usize>> = vec![Vec::new(); moves.len()];
    let mut claimed: BTreeSet<&Path> = BTreeSet::new();
    for (i, op) in moves.iter().chain(copies.iter()).enumerate() {
        let Some(target) = op.target() else { continue };
        let collision = || SyncError::DestinationCollision {
            path: target.to_path_buf(),
        };

        if overlaps_any(&claimed, target) {
            return Err(collision());
        }
        claimed.insert(target);

        for obstacle in obstacles(&occupied, target) {
            if deleted.contains(obstacle) {
                continue;
            }
            match vacated_by.get(obstacle) {
                // Copies run after every move, so only moves need ordering.
                Some(&j) if i < moves.len() => after[i].push(j),
                Some(_) => {}
                None => return Err(collision()),
            }
        }
    }

    let mut marks = vec![Mark::Unvisited; moves.len()];
    let mut move_order = Vec::with_capacity(moves.len());
    for i in 0..moves.len() {
        place_move(i, &moves, &after, &mut marks, &mut move_order)?;
    }

    let mut scheduled = Vec::with_capacity(deletes.len() + moves.len() + copies.len());
    scheduled.extend(deletes.iter().cloned());
    scheduled.extend(move_order.into_iter().map(|i| moves[i].clone()));
    scheduled.extend(copies);

    tracing::debug!(
        "scheduled {} operation(s): {} delete, {} move, {} copy",
        scheduled.len(),
        deletes.len(),
        moves.len(),
        scheduled.len() - deletes.len() - moves.len(),
    );
    Ok(scheduled)
}

/// Destination files in the way of writing `target`: the path itself, a file
/// where `target` needs a parent directory, or files beneath `target`.
fn obstacles<'a>(
    occupied: &'a BTreeSet<PathBuf>,
    target: &'a Path,
) -> impl Iterator<Item = &'a Path> + 'a {
    let at_or_above = target
        .ancestors()
        .filter_map(move |ancestor| occupied.get(ancestor))
        .map(PathBuf::as_path);
    let beneath = occupied
        .range::<Path, _>((Bound::Excluded(target), Bound::Unbounded))
        .take_while(move |path| path.starts_with(target))
        .map(PathBuf::as_path);
    at_or_above.chain(beneath)
}

fn overlaps_any(claimed: &BTreeSet<&Path>, target: &Path) -> bool {
    target.ancestors().any(|ancestor| claimed.contains(ancestor))
        || claimed
            .range::<Path, _>((Bound::Excluded(target), Bound::Unbounded))
            .next()
            .is_some_and(|path| path.starts_with(target))
}

/// Place move `i` after every move that frees a path it conflicts with.
fn place_move(
    i: usize,
    moves: &[FileOperation],
    after: &[Vec<usize>],
    marks: &mut [Mark],
    order: &mut Vec<usize>,
) -> Result<(), SyncError> {
    match marks[i] {
        Mark::Placed => return Ok(()),
        Mark::Visiting => {
            let path = moves[i].target().map(Path::to_path_buf).unwrap_or_default();
            return Err(SyncError::DestinationCollision { path });
        }
        Mark::Unvisited => {}
    }

    marks[i] = Mark::Visiting;
    for &blocker in &after[i] {
        place_move(blocker, moves, after, marks, order)?;
    }
    marks[i] = Mark::Placed;
    order.push(i);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::reconcile;

    fn index(entries: &[(&str, &str)]) -> FileIndex {
        entries.iter().copied().collect()
    }

    fn plan(source: &[(&str, &str)], dest: &[(&str, &str)]) -> Result<Vec<FileOperation>, SyncError> {
        let (source, dest) = (index(source), index(dest));
        let ops = reconcile(&source, &dest, Path::new("/s"), Path::new("/d"));
        schedule(ops, &dest, Path::new("/d"))
    }

    #[test]
    fn independent_operations_are_grouped_delete_move_copy() {
        let ops = plan(
            &[("h1", "new"), ("h2", "b")],
            &[("h0", "old"), ("h2", "a")],
        )
        .expect("schedule");
        assert_eq!(
            ops,
            vec![
                FileOperation::delete("/d/old"),
                FileOperation::move_file("/d/a", "/d/b"),
                FileOperation::copy("/s/new", "/d/new"),
            ]
        );
    }

    #[test]
    fn copy_over_modified_file_deletes_first() {
        let ops = plan(&[("new", "notes.txt")], &[("old", "notes.txt")]).expect("schedule");
        assert_eq!(
            ops,
            vec![
                FileOperation::delete("/d/notes.txt"),
                FileOperation::copy("/s/notes.txt", "/d/notes.txt"),
            ]
        );
    }

    #[test]
    fn move_chain_runs_from_the_free_end() {
        // a -> b while b -> c: b must be vacated first.
        let ops = plan(&[("h1", "b"), ("h2", "c")], &[("h1", "a"), ("h2", "b")]).expect("schedule");
        assert_eq!(
            ops,
            vec![
                FileOperation::move_file("/d/b", "/d/c"),
                FileOperation::move_file("/d/a", "/d/b"),
            ]
        );
    }

    #[test]
    fn copy_into_name_vacated_by_move_runs_after_move() {
        let ops = plan(&[("h1", "b"), ("h2", "a")], &[("h1", "a")]).expect("schedule");
        assert_eq!(
            ops,
            vec![
                FileOperation::move_file("/d/a", "/d/b"),
                FileOperation::copy("/s/a", "/d/a"),
            ]
        );
    }

    #[test]
    fn swapped_names_are_a_collision() {
        let err = plan(&[("h1", "a"), ("h2", "b")], &[("h1", "b"), ("h2", "a")]).unwrap_err();
        assert!(matches!(err, SyncError::DestinationCollision { .. }), "got: {err}");
    }

    #[test]
    fn move_onto_kept_file_is_a_collision() {
        // Index built by hand: a real directory cannot hold two names for one
        // path, but an index can claim `b` is kept while `a` is renamed onto it.
        let source = index(&[("h1", "b"), ("h2", "b")]);
        let dest = index(&[("h1", "a"), ("h2", "b")]);
        let ops = reconcile(&source, &dest, Path::new("/s"), Path::new("/d"));
        let err = schedule(ops, &dest, Path::new("/d")).unwrap_err();
        match err {
            SyncError::DestinationCollision { path } => assert_eq!(path, PathBuf::from("/d/b")),
            other => panic!("expected collision, got {other:?}"),
        }
    }

    #[test]
    fn empty_plan_schedules_nothing() {
        assert!(plan(&[("h1", "a")], &[("h1", "a")]).expect("schedule").is_empty());
    }

    #[test]
    fn file_replacing_a_directory_is_written_after_its_contents_go() {
        let ops = plan(&[("h1", "x")], &[("h2", "x/y")]).expect("schedule");
        assert_eq!(
            ops,
            vec![
                FileOperation::delete("/d/x/y"),
                FileOperation::copy("/s/x", "/d/x"),
            ]
        );
    }

    #[test]
    fn move_onto_a_former_directory_waits_for_it_to_empty() {
        let ops = plan(
            &[("h1", "x"), ("h2", "z/y")],
            &[("h1", "w"), ("h2", "x/y")],
        )
        .expect("schedule");
        assert_eq!(
            ops,
            vec![
                FileOperation::move_file("/d/x/y", "/d/z/y"),
                FileOperation::move_file("/d/w", "/d/x"),
            ]
        );
    }

    #[test]
    fn move_beneath_a_file_being_moved_away_runs_second() {
        let ops = plan(
            &[("h1", "x/y"), ("h2", "z")],
            &[("h1", "w"), ("h2", "x")],
        )
        .expect("schedule");
        assert_eq!(
            ops,
            vec![
                FileOperation::move_file("/d/x", "/d/z"),
                FileOperation::move_file("/d/w", "/d/x/y"),
            ]
        );
    }

    #[test]
    fn write_beneath_a_kept_file_is_a_collision() {
        // Hand-built source: `x` and `x/y` cannot coexist on disk.
        let source = index(&[("h1", "x"), ("h2", "x/y")]);
        let dest = index(&[("h1", "x")]);
        let ops = reconcile(&source, &dest, Path::new("/s"), Path::new("/d"));
        let err = schedule(ops, &dest, Path::new("/d")).unwrap_err();
        match err {
            SyncError::DestinationCollision { path } => assert_eq!(path, PathBuf::from("/d/x/y")),
            other => panic!("expected collision, got {other:?}"),
        }
    }

    #[test]
    fn file_moving_beneath_its_own_name_is_a_collision() {
        let err = plan(&[("h1", "x/y")], &[("h1", "x")]).unwrap_err();
        assert!(matches!(err, SyncError::DestinationCollision { .. }), "got: {err}");
    }
}
