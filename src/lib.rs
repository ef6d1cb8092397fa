//! In-memory project model for the U-Engine ecosystem.
//!
//! Holds the unified representation that project-file readers populate
//! and writers, schedulers and UIs consume. File-format codecs are
//! outside this crate; it provides the task model they build on.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Task`, `TaskField`, `FieldValue`,
//!   `FieldStore`, `ChangeNotifier`, `Relation`, `Duration`,
//!   `ProjectCalendar`, `ProjectFile`
//! - **`hierarchy`**: Outline tree mutation, WBS and outline numbering
//! - **`relations`**: Mirrored predecessor/successor links
//! - **`derived`**: Lazily cached slack, criticality, variances and progress
//! - **`validation`**: Structural integrity checks (IDs, tree, relations, cycles)
//! - **`config`**: Automation flags and project-wide properties
//!
//! # Architecture
//!
//! Tasks live in a [`models::ProjectFile`] arena and refer to each other by
//! [`models::TaskKey`]. Every attribute write goes through a per-task
//! change notifier that clears dependent cached values before the write
//! lands and then informs registered listeners.
//!
//! # Example
//!
//! ```
//! use u_project::models::{Duration, ProjectFile, RelationType};
//!
//! let mut project = ProjectFile::new();
//! let design = project.add_task(None).unwrap();
//! let build = project.add_task(None).unwrap();
//! project.link(build, design, RelationType::FinishToStart, None).unwrap();
//! assert!(project.is_successor(design, build).unwrap());
//!
//! let task = project.task_mut(build).unwrap();
//! task.set_duration(Some(Duration::days(5.0)));
//! task.set_baseline_duration(Some(Duration::days(3.0)));
//! assert_eq!(project.duration_variance(build).unwrap(), Some(Duration::days(2.0)));
//! ```

pub mod config;
pub mod derived;
pub mod error;
pub mod hierarchy;
pub mod models;
pub mod relations;
pub mod validation;

pub use error::{ProjectError, Result};
