//! # mirror-sync
//!
//! One-way directory synchronization.
//!
//! [`reconcile`] compares two fingerprint indexes and decides which copies,
//! moves and deletes make the destination mirror the source. [`schedule`]
//! orders them so no write clobbers a file the plan keeps. [`sync`] runs the
//! whole thing against an injected [`IndexReader`] and [`FileOperations`]
//! sink; [`sync_paths`] and [`pipeline::run`] wire in the real filesystem.

pub mod error;
pub mod fileops;
pub mod pipeline;
pub mod reader;
pub mod reconcile;
pub mod schedule;

pub use error::SyncError;
pub use fileops::{FileOperations, FsFileOps, RecordingFileOps};
pub use pipeline::{sync, sync_paths, sync_profile, SyncOptions, SyncReport};
pub use reader::{hash_file, FsReader, IndexReader};
pub use reconcile::reconcile;
pub use schedule::schedule;
