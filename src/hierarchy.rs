//! Outline hierarchy.
//!
//! Maintains parent/child membership between tasks and generates the WBS
//! and outline-number codes and outline levels that describe the tree.
//!
//! # Code generation
//!
//! Codes are generated once, when a task is added, from the state of the
//! tree at that moment:
//!
//! - top level: `"0"` for the unique-ID-0 project root, otherwise the
//!   number of top-level tasks plus one
//! - below a parent: the parent's code with any trailing `".0"` removed,
//!   then `"." + (children + 1)`, or just `children + 1` when the parent
//!   code is `"0"`
//!
//! Moving tasks afterwards does not rewrite codes;
//! [`ProjectFile::regenerate_outline_numbers`] and
//! [`ProjectFile::regenerate_wbs`] rebuild them from the current tree.

use log::{debug, warn};
use std::collections::HashSet;

use crate::error::{ProjectError, Result};
use crate::models::{FieldValue, ProjectFile, Task, TaskField, TaskKey};

impl ProjectFile {
    /// Adds a task at the top level or below `parent`.
    ///
    /// Identity, codes and outline level are assigned according to
    /// [`ProjectConfig`](crate::config::ProjectConfig).
    pub fn add_task(&mut self, parent: Option<TaskKey>) -> Result<TaskKey> {
        if let Some(parent) = parent {
            self.task(parent)?;
        }
        let unique_id = if self.config().auto_task_unique_id {
            Some(self.allocate_unique_id())
        } else {
            None
        };
        self.create_task(parent, unique_id)
    }

    /// Adds a task with an explicit unique ID, as readers do when the
    /// source file carries one. Unique ID 0 denotes the project root.
    ///
    /// # Errors
    /// [`ProjectError::DuplicateUniqueId`] if the ID is taken.
    pub fn add_task_with_unique_id(
        &mut self,
        parent: Option<TaskKey>,
        unique_id: i32,
    ) -> Result<TaskKey> {
        if let Some(parent) = parent {
            self.task(parent)?;
        }
        if self.task_by_unique_id(unique_id).is_some() {
            return Err(ProjectError::DuplicateUniqueId(unique_id));
        }
        self.create_task(parent, Some(unique_id))
    }

    fn create_task(&mut self, parent: Option<TaskKey>, unique_id: Option<i32>) -> Result<TaskKey> {
        let key = self.insert_task();
        if let Some(uid) = unique_id {
            self.set_unique_id(key, uid)?;
        }
        if self.config().auto_task_id {
            let id = self.allocate_id();
            self.set_id(key, id)?;
        }
        // Codes count the siblings present before this task joins them.
        if self.config().auto_wbs {
            let wbs = self.generate_wbs(key, parent)?;
            self.task_mut(key)?.set_wbs(Some(&wbs));
        }
        if self.config().auto_outline_number {
            let number = self.generate_outline_number(key, parent)?;
            self.task_mut(key)?.set_outline_number(Some(&number));
        }

        match parent {
            Some(parent) => self.attach(key, parent)?,
            None => {
                self.child_tasks.push(key);
                if self.config().auto_outline_level {
                    self.task_mut(key)?.set_outline_level(Some(1));
                }
            }
        }
        debug!("added task {key} (unique ID {unique_id:?}, parent {parent:?})");
        Ok(key)
    }

    /// WBS code `key` would receive if added below `parent` now.
    pub fn generate_wbs(&self, key: TaskKey, parent: Option<TaskKey>) -> Result<String> {
        self.generate_code(key, parent, Task::wbs)
    }

    /// Outline number `key` would receive if added below `parent` now.
    pub fn generate_outline_number(&self, key: TaskKey, parent: Option<TaskKey>) -> Result<String> {
        self.generate_code(key, parent, Task::outline_number)
    }

    fn generate_code(
        &self,
        key: TaskKey,
        parent: Option<TaskKey>,
        code: fn(&Task) -> Option<&str>,
    ) -> Result<String> {
        match parent {
            None => {
                if self.task(key)?.unique_id() == Some(0) {
                    Ok("0".to_string())
                } else {
                    Ok((self.child_tasks.len() + 1).to_string())
                }
            }
            Some(parent) => {
                let parent = self.task(parent)?;
                Ok(child_code(code(parent), parent.child_count() + 1))
            }
        }
    }

    // ================================
    // Attachment
    // ================================

    /// Makes `child` the last child of `parent`, moving it from wherever
    /// it was. Marks `parent` as a summary task.
    ///
    /// # Errors
    /// [`ProjectError::HierarchyCycle`] if `parent` is `child` or one of
    /// its descendants.
    pub fn attach(&mut self, child: TaskKey, parent: TaskKey) -> Result<()> {
        self.task(child)?;
        if self.is_in_subtree(parent, child)? {
            return Err(ProjectError::HierarchyCycle { child, parent });
        }
        self.unlink_from_parent(child)?;

        let parent_task = self.task_mut(parent)?;
        let level = parent_task.outline_level().unwrap_or(0) + 1;
        parent_task.children.push(child);
        if !parent_task.summary() {
            parent_task.set_summary(true);
        }
        self.task_mut(child)?.parent = Some(parent);

        if self.config().auto_outline_level {
            self.assign_outline_levels(child, level)?;
        }
        Ok(())
    }

    /// Streaming attachment by outline level.
    ///
    /// Starting at `parent`, attaches `child` where the level is exactly
    /// one deeper, otherwise descends into the most recently attached
    /// child and tries again. Levels that skip or regress are accepted
    /// without error: when the descent runs out of children the task is
    /// left where it is and `false` is returned.
    pub fn attach_at_outline_level(
        &mut self,
        parent: TaskKey,
        child: TaskKey,
        level: i32,
    ) -> Result<bool> {
        let mut current = parent;
        loop {
            let task = self.task(current)?;
            if task.outline_level().unwrap_or(0) + 1 == level {
                self.attach(child, current)?;
                return Ok(true);
            }
            match task.children().last() {
                Some(&last) if last != child => current = last,
                _ => {
                    warn!(
                        "no task at outline level {} below task {parent} for task {child}; left unattached",
                        level - 1
                    );
                    return Ok(false);
                }
            }
        }
    }

    /// Removes `child` from its parent, returning it to the top level.
    /// The parent stops being a summary task when its last child leaves.
    /// Top-level tasks are left alone.
    pub fn detach(&mut self, child: TaskKey) -> Result<()> {
        if self.task(child)?.parent().is_none() {
            return Ok(());
        }
        self.unlink_from_parent(child)?;
        self.child_tasks.push(child);
        if self.config().auto_outline_level {
            self.assign_outline_levels(child, 1)?;
        }
        Ok(())
    }

    /// Empties a task's child list, moving the children to the top level.
    pub fn clear_child_tasks(&mut self, parent: TaskKey) -> Result<()> {
        let task = self.task_mut(parent)?;
        let children = std::mem::take(&mut task.children);
        if task.summary() {
            task.set_summary(false);
        }
        for child in children {
            self.task_mut(child)?.parent = None;
            self.child_tasks.push(child);
        }
        Ok(())
    }

    /// Deletes a task and all its descendants.
    ///
    /// Both IDs of every removed task are unregistered, and relations
    /// held by surviving tasks that point at a removed task are dropped.
    pub fn remove_task(&mut self, key: TaskKey) -> Result<()> {
        let doomed = self.subtree(key)?;
        self.unlink_from_parent(key)?;

        let doomed_set: HashSet<TaskKey> = doomed.iter().copied().collect();
        for removed in doomed {
            let Some(task) = self.take_task(removed) else {
                continue;
            };
            self.unregister(&task);

            let mirrors = task
                .predecessors()
                .iter()
                .map(|r| (r.target_task, TaskField::SUCCESSORS))
                .chain(
                    task.successors()
                        .iter()
                        .map(|r| (r.target_task, TaskField::PREDECESSORS)),
                );
            for (other, field) in mirrors {
                if doomed_set.contains(&other) {
                    continue;
                }
                if let Ok(other) = self.task_mut(other) {
                    other.retain_relations(field, |r| r.target_task != removed);
                }
            }
            debug!("removed task {removed}");
        }
        Ok(())
    }

    // ================================
    // Renumbering
    // ================================

    /// All live tasks in depth-first outline order.
    pub fn hierarchy_order(&self) -> Result<Vec<TaskKey>> {
        let mut order = Vec::with_capacity(self.task_count());
        for &top in self.top_level_tasks() {
            order.extend(self.subtree(top)?);
        }
        Ok(order)
    }

    /// Reassigns position IDs in outline order: 0 for a leading
    /// unique-ID-0 root, then consecutive values.
    pub fn renumber_task_ids(&mut self) -> Result<()> {
        let order = self.hierarchy_order()?;
        let root_first = match order.first() {
            Some(&first) => self.task(first)?.unique_id() == Some(0),
            None => false,
        };
        let mut id = if root_first { 0 } else { 1 };
        self.reset_ids(id);
        for key in order {
            self.set_id(key, id)?;
            id += 1;
        }
        Ok(())
    }

    /// Rebuilds outline numbers and outline levels from the current tree.
    pub fn regenerate_outline_numbers(&mut self) -> Result<()> {
        self.regenerate_codes(TaskField::OUTLINE_NUMBER, true)
    }

    /// Rebuilds WBS codes from the current tree.
    pub fn regenerate_wbs(&mut self) -> Result<()> {
        self.regenerate_codes(TaskField::WBS, false)
    }

    fn regenerate_codes(&mut self, field: TaskField, levels: bool) -> Result<()> {
        let top = self.child_tasks.clone();
        for (index, key) in top.into_iter().enumerate() {
            let code = if self.task(key)?.unique_id() == Some(0) {
                "0".to_string()
            } else {
                (index + 1).to_string()
            };
            self.regenerate_subtree(key, code, 1, field, levels)?;
        }
        Ok(())
    }

    fn regenerate_subtree(
        &mut self,
        key: TaskKey,
        code: String,
        level: i32,
        field: TaskField,
        levels: bool,
    ) -> Result<()> {
        let task = self.task_mut(key)?;
        if levels {
            task.set_outline_level(Some(level));
        }
        let children = task.children().to_vec();
        for (index, child) in children.into_iter().enumerate() {
            let child_code = child_code(Some(&code), index + 1);
            self.regenerate_subtree(child, child_code, level + 1, field, levels)?;
        }
        self.task_mut(key)?.set(field, FieldValue::from(code));
        Ok(())
    }

    // ================================
    // Helpers
    // ================================

    fn unlink_from_parent(&mut self, key: TaskKey) -> Result<()> {
        match self.task(key)?.parent() {
            Some(parent) => {
                let parent_task = self.task_mut(parent)?;
                parent_task.children.retain(|&c| c != key);
                if parent_task.children.is_empty() && parent_task.summary() {
                    parent_task.set_summary(false);
                }
                self.task_mut(key)?.parent = None;
            }
            None => self.child_tasks.retain(|&c| c != key),
        }
        Ok(())
    }

    /// Whether `key` is `root` or below it.
    fn is_in_subtree(&self, key: TaskKey, root: TaskKey) -> Result<bool> {
        let mut current = Some(key);
        while let Some(k) = current {
            if k == root {
                return Ok(true);
            }
            current = self.task(k)?.parent();
        }
        Ok(false)
    }

    /// `key` and its descendants, depth-first pre-order.
    fn subtree(&self, key: TaskKey) -> Result<Vec<TaskKey>> {
        let mut out = Vec::new();
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            out.push(k);
            stack.extend(self.task(k)?.children().iter().rev());
        }
        Ok(out)
    }

    fn assign_outline_levels(&mut self, key: TaskKey, level: i32) -> Result<()> {
        let task = self.task_mut(key)?;
        task.set_outline_level(Some(level));
        let children = task.children().to_vec();
        for child in children {
            self.assign_outline_levels(child, level + 1)?;
        }
        Ok(())
    }
}

/// Code of the `position`-th child (1-based) of a parent with `parent_code`.
fn child_code(parent_code: Option<&str>, position: usize) -> String {
    let prefix = parent_code.map(|c| c.strip_suffix(".0").unwrap_or(c));
    match prefix {
        None | Some("") | Some("0") => position.to_string(),
        Some(prefix) => format!("{prefix}.{position}"),
    }
}
