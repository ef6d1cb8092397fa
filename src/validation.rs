//! Structural validation of a project.
//!
//! The hierarchy, relation and identity operations keep these invariants
//! on their own. Validation exists for data that arrives by other routes:
//! readers writing fields directly, or tasks edited through raw
//! [`Task::set`](crate::models::Task::set) calls. Detects:
//! - Duplicate unique IDs or position IDs
//! - IDs that disagree with the container registries
//! - Summary flags that disagree with the child list
//! - Parent/child links that are not mutual
//! - Relations without their mirrored entry, or pointing at removed tasks
//! - Circular predecessor networks (DAG validation)
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use crate::models::{ProjectFile, Relation, Task, TaskKey};
use std::collections::{HashMap, HashSet};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two tasks share a unique ID or a position ID.
    DuplicateId,
    /// A task's ID is not the one registered for it.
    UnregisteredId,
    /// Summary flag set without children, or children without the flag.
    SummaryMismatch,
    /// A child does not point back at its parent, or vice versa.
    BrokenHierarchy,
    /// A relation has no mirrored entry on the other task.
    UnmirroredRelation,
    /// A relation refers to a task that no longer exists.
    DanglingRelation,
    /// Predecessor network contains a cycle.
    CyclicDependency,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the structure of a project.
///
/// Checks:
/// 1. No duplicate unique IDs or IDs
/// 2. Every ID is registered to its task
/// 3. `summary` holds exactly when a task has children
/// 4. Parent and child links agree, and unparented tasks are top-level
/// 5. Every relation points at a live task and has its mirror
/// 6. No circular predecessor dependencies
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_project(project: &ProjectFile) -> ValidationResult {
    let mut errors = Vec::new();

    check_identity(project, &mut errors);

    let top_level: HashSet<TaskKey> = project.top_level_tasks().iter().copied().collect();
    for task in project.tasks() {
        if task.summary() != !task.children().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::SummaryMismatch,
                format!(
                    "Task {} has summary={} with {} children",
                    task.key(),
                    task.summary(),
                    task.child_count()
                ),
            ));
        }

        for &child in task.children() {
            let back = project.task(child).ok().and_then(Task::parent);
            if back != Some(task.key()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::BrokenHierarchy,
                    format!("Child {child} of task {} does not point back to it", task.key()),
                ));
            }
        }

        match task.parent() {
            Some(parent) => {
                let listed = project
                    .task(parent)
                    .is_ok_and(|p| p.children().contains(&task.key()));
                if !listed {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::BrokenHierarchy,
                        format!("Task {} is missing from its parent {parent}", task.key()),
                    ));
                }
            }
            None if !top_level.contains(&task.key()) => {
                errors.push(ValidationError::new(
                    ValidationErrorKind::BrokenHierarchy,
                    format!("Task {} has no parent and is not top-level", task.key()),
                ));
            }
            None => {}
        }

        check_relations(project, task, &mut errors);
    }

    if let Some(cycle_err) = detect_cycles(project) {
        errors.push(cycle_err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_identity(project: &ProjectFile, errors: &mut Vec<ValidationError>) {
    let mut unique_ids = HashSet::new();
    let mut ids = HashSet::new();

    for task in project.tasks() {
        if let Some(uid) = task.unique_id() {
            if !unique_ids.insert(uid) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateId,
                    format!("Duplicate task unique ID: {uid}"),
                ));
            }
            if project.unique_id_registry().get(&uid) != Some(&task.key()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnregisteredId,
                    format!("Unique ID {uid} of task {} is not registered to it", task.key()),
                ));
            }
        }
        if let Some(id) = task.id() {
            if !ids.insert(id) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateId,
                    format!("Duplicate task ID: {id}"),
                ));
            }
            if project.id_registry().get(&id) != Some(&task.key()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnregisteredId,
                    format!("ID {id} of task {} is not registered to it", task.key()),
                ));
            }
        }
    }
}

fn check_relations(project: &ProjectFile, task: &Task, errors: &mut Vec<ValidationError>) {
    let sides: [(&[Relation], fn(&Task) -> &[Relation], &str); 2] = [
        (task.predecessors(), Task::successors, "predecessor"),
        (task.successors(), Task::predecessors, "successor"),
    ];
    for (relations, mirror_list, label) in sides {
        for relation in relations {
            let Ok(other) = project.task(relation.target_task) else {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DanglingRelation,
                    format!("Task {} has a {label} relation to removed task {}", task.key(), relation.target_task),
                ));
                continue;
            };
            let mirrored = mirror_list(other).iter().any(|m| {
                m.target_task == task.key()
                    && m.kind == relation.kind
                    && m.lag.same_as(&relation.lag, project.properties())
            });
            if !mirrored {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnmirroredRelation,
                    format!("{label} relation {relation} has no mirror on task {}", other.key()),
                ));
            }
        }
    }
}

/// Detects cycles in the predecessor network using DFS.
///
/// # Algorithm
/// Topological sort via DFS. If a back-edge is found (visiting a node
/// currently in the recursion stack), a cycle exists.
///
/// # Reference
/// Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4
fn detect_cycles(project: &ProjectFile) -> Option<ValidationError> {
    // Build adjacency list: predecessor → dependents
    let mut adj: HashMap<TaskKey, Vec<TaskKey>> = HashMap::new();
    for task in project.tasks() {
        for relation in task.predecessors() {
            adj.entry(relation.target_task)
                .or_default()
                .push(task.key());
        }
    }

    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    for node in project.task_keys() {
        if !visited.contains(&node) && has_cycle_dfs(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!("Circular dependency detected involving task {node}"),
            ));
        }
    }

    None
}

fn has_cycle_dfs(
    node: TaskKey,
    adj: &HashMap<TaskKey, Vec<TaskKey>>,
    visited: &mut HashSet<TaskKey>,
    in_stack: &mut HashSet<TaskKey>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(neighbors) = adj.get(&node) {
        for &next in neighbors {
            if in_stack.contains(&next) {
                return true; // Back edge → cycle
            }
            if !visited.contains(&next) && has_cycle_dfs(next, adj, visited, in_stack) {
                return true;
            }
        }
    }

    in_stack.remove(&node);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Duration, FieldValue, RelationType, TaskField};

    fn sample_project() -> (ProjectFile, Vec<TaskKey>) {
        let mut project = ProjectFile::new();
        let phase = project.add_task(None).unwrap();
        let design = project.add_task(Some(phase)).unwrap();
        let build = project.add_task(Some(phase)).unwrap();
        let release = project.add_task(None).unwrap();
        project
            .link(build, design, RelationType::FinishToStart, None)
            .unwrap();
        project
            .link(release, build, RelationType::FinishToStart, Some(Duration::days(1.0)))
            .unwrap();
        (project, vec![phase, design, build, release])
    }

    fn kinds(project: &ProjectFile) -> Vec<ValidationErrorKind> {
        validate_project(project)
            .unwrap_err()
            .into_iter()
            .map(|e| e.kind)
            .collect()
    }

    #[test]
    fn test_valid_project() {
        let (project, _) = sample_project();
        assert!(validate_project(&project).is_ok());
    }

    #[test]
    fn test_valid_after_removal() {
        let (mut project, keys) = sample_project();
        project.remove_task(keys[2]).unwrap();
        assert!(validate_project(&project).is_ok());
    }

    #[test]
    fn test_duplicate_unique_id() {
        let (mut project, keys) = sample_project();
        // Bypasses the registry.
        project
            .task_mut(keys[3])
            .unwrap()
            .set(TaskField::UNIQUE_ID, FieldValue::Integer(1));

        let kinds = kinds(&project);
        assert!(kinds.contains(&ValidationErrorKind::DuplicateId));
        assert!(kinds.contains(&ValidationErrorKind::UnregisteredId));
    }

    #[test]
    fn test_summary_mismatch() {
        let (mut project, keys) = sample_project();
        project
            .task_mut(keys[3])
            .unwrap()
            .set(TaskField::SUMMARY, FieldValue::Boolean(true));

        let errors = validate_project(&project).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::SummaryMismatch);
    }

    #[test]
    fn test_broken_hierarchy() {
        let (mut project, keys) = sample_project();
        project.task_mut(keys[1]).unwrap().parent = None;

        let kinds = kinds(&project);
        assert!(kinds.contains(&ValidationErrorKind::BrokenHierarchy));
    }

    #[test]
    fn test_unmirrored_relation() {
        let (mut project, keys) = sample_project();
        let (design, release) = (keys[1], keys[3]);
        project
            .task_mut(design)
            .unwrap()
            .with_relations(TaskField::PREDECESSORS, |list| {
                list.push(Relation::new(design, release, RelationType::StartToStart, Duration::days(0.0)))
            });

        let errors = validate_project(&project).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::UnmirroredRelation && e.message.contains("predecessor")));
    }

    #[test]
    fn test_dangling_relation() {
        let (mut project, keys) = sample_project();
        let design = keys[1];
        project
            .task_mut(design)
            .unwrap()
            .with_relations(TaskField::SUCCESSORS, |list| {
                list.push(Relation::new(design, TaskKey(99), RelationType::FinishToStart, Duration::days(0.0)))
            });

        let kinds = kinds(&project);
        assert_eq!(kinds, vec![ValidationErrorKind::DanglingRelation]);
    }

    #[test]
    fn test_cyclic_dependency() {
        // design → build → release → design
        let (mut project, keys) = sample_project();
        project
            .link(keys[1], keys[3], RelationType::FinishToStart, None)
            .unwrap();

        let kinds = kinds(&project);
        assert!(kinds.contains(&ValidationErrorKind::CyclicDependency));
    }

    #[test]
    fn test_no_cycle_in_chain() {
        let mut project = ProjectFile::new();
        let keys: Vec<_> = (0..4).map(|_| project.add_task(None).unwrap()).collect();
        for pair in keys.windows(2) {
            project
                .link(pair[1], pair[0], RelationType::FinishToStart, None)
                .unwrap();
        }
        assert!(validate_project(&project).is_ok());
    }

    #[test]
    fn test_multiple_errors() {
        let (mut project, keys) = sample_project();
        project
            .task_mut(keys[3])
            .unwrap()
            .set(TaskField::SUMMARY, FieldValue::Boolean(true));
        project
            .link(keys[1], keys[3], RelationType::FinishToStart, None)
            .unwrap();

        let errors = validate_project(&project).unwrap_err();
        assert!(errors.len() >= 2);
    }
}
