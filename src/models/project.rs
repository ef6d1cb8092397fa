//! Project container.
//!
//! [`ProjectFile`] owns every task in an arena and maintains the
//! registries the task model depends on: unique-ID and position-ID
//! reverse lookups, the calendar registry, and field aliases.
//!
//! Hierarchy, relation and derived-field operations are implemented in
//! [`crate::hierarchy`], [`crate::relations`] and [`crate::derived`] as
//! further `impl ProjectFile` blocks.

use log::debug;
use std::collections::HashMap;

use super::{CalendarRegistry, FieldValue, ProjectCalendar, Task, TaskField, TaskKey};
use crate::config::{ProjectConfig, ProjectProperties};
use crate::error::{ProjectError, Result};

/// In-memory project: tasks plus the services they rely on.
///
/// # Examples
/// ```
/// use u_project::models::ProjectFile;
///
/// let mut project = ProjectFile::new();
/// let phase = project.add_task(None).unwrap();
/// let step = project.add_task(Some(phase)).unwrap();
/// assert_eq!(project.task(step).unwrap().wbs(), Some("1.1"));
/// assert!(project.task(phase).unwrap().summary());
/// ```
#[derive(Debug)]
pub struct ProjectFile {
    tasks: Vec<Option<Task>>,
    pub(crate) child_tasks: Vec<TaskKey>,
    unique_id_map: HashMap<i32, TaskKey>,
    id_map: HashMap<i32, TaskKey>,
    next_unique_id: i32,
    next_id: i32,
    config: ProjectConfig,
    properties: ProjectProperties,
    calendars: CalendarRegistry,
    alias_to_field: HashMap<String, TaskField>,
    field_to_alias: HashMap<TaskField, String>,
}

impl ProjectFile {
    /// Creates an empty project with default configuration and a standard
    /// default calendar.
    pub fn new() -> Self {
        let properties = ProjectProperties::default();
        let mut calendars = CalendarRegistry::new();
        calendars.add(ProjectCalendar::standard(properties.default_calendar));
        Self {
            tasks: Vec::new(),
            child_tasks: Vec::new(),
            unique_id_map: HashMap::new(),
            id_map: HashMap::new(),
            next_unique_id: 1,
            next_id: 1,
            config: ProjectConfig::default(),
            properties,
            calendars,
            alias_to_field: HashMap::new(),
            field_to_alias: HashMap::new(),
        }
    }

    /// Sets the automation flags.
    pub fn with_config(mut self, config: ProjectConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the project properties, registering a standard calendar under
    /// the default calendar ID if none exists yet.
    pub fn with_properties(mut self, properties: ProjectProperties) -> Self {
        if self.calendars.get(properties.default_calendar).is_none() {
            self.calendars
                .add(ProjectCalendar::standard(properties.default_calendar));
        }
        self.properties = properties;
        self
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ProjectConfig {
        &mut self.config
    }

    pub fn properties(&self) -> &ProjectProperties {
        &self.properties
    }

    /// Mutable properties. Cached derived values are not invalidated;
    /// call [`invalidate_derived_fields`](Self::invalidate_derived_fields)
    /// after changing unit conversion factors.
    pub fn properties_mut(&mut self) -> &mut ProjectProperties {
        &mut self.properties
    }

    pub fn calendars(&self) -> &CalendarRegistry {
        &self.calendars
    }

    pub fn calendars_mut(&mut self) -> &mut CalendarRegistry {
        &mut self.calendars
    }

    /// The project default calendar, if registered.
    pub fn default_calendar(&self) -> Option<&ProjectCalendar> {
        self.calendars.get(self.properties.default_calendar)
    }

    /// Calendar governing a task: its own if set and registered, otherwise
    /// the project default.
    pub fn task_calendar(&self, key: TaskKey) -> Result<Option<&ProjectCalendar>> {
        let own = self.task(key)?.calendar_unique_id();
        Ok(own
            .and_then(|uid| self.calendars.get(uid))
            .or_else(|| self.default_calendar()))
    }

    /// Points a task at a registered calendar. `None` reverts it to the
    /// project default.
    ///
    /// # Errors
    /// [`ProjectError::UnknownCalendar`] if no calendar has `unique_id`.
    pub fn assign_calendar(&mut self, key: TaskKey, unique_id: Option<i32>) -> Result<()> {
        if let Some(uid) = unique_id {
            if self.calendars.get(uid).is_none() {
                return Err(ProjectError::UnknownCalendar(uid));
            }
        }
        self.task_mut(key)?.set_calendar_unique_id(unique_id);
        Ok(())
    }

    // ================================
    // Task arena
    // ================================

    /// Looks up a live task.
    pub fn task(&self, key: TaskKey) -> Result<&Task> {
        self.tasks
            .get(key.index())
            .and_then(Option::as_ref)
            .ok_or(ProjectError::UnknownTask(key))
    }

    /// Looks up a live task for modification.
    pub fn task_mut(&mut self, key: TaskKey) -> Result<&mut Task> {
        self.tasks
            .get_mut(key.index())
            .and_then(Option::as_mut)
            .ok_or(ProjectError::UnknownTask(key))
    }

    /// Whether the key refers to a live task.
    pub fn contains(&self, key: TaskKey) -> bool {
        self.task(key).is_ok()
    }

    /// All live tasks in creation order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().flatten()
    }

    /// Keys of all live tasks in creation order.
    pub fn task_keys(&self) -> impl Iterator<Item = TaskKey> + '_ {
        self.tasks().map(Task::key)
    }

    /// Number of live tasks.
    pub fn task_count(&self) -> usize {
        self.tasks().count()
    }

    /// Top-level tasks in outline order.
    pub fn top_level_tasks(&self) -> &[TaskKey] {
        &self.child_tasks
    }

    /// Live tasks sorted by position ID (unset IDs sort as 0).
    pub fn tasks_in_id_order(&self) -> Vec<TaskKey> {
        let mut tasks: Vec<&Task> = self.tasks().collect();
        tasks.sort_by(|a, b| a.cmp_by_id(b));
        tasks.into_iter().map(Task::key).collect()
    }

    /// Allocates an empty arena slot.
    pub(crate) fn insert_task(&mut self) -> TaskKey {
        let key = TaskKey(self.tasks.len() as u32);
        self.tasks.push(Some(Task::new(key)));
        key
    }

    /// Frees an arena slot. Keys are never reused.
    pub(crate) fn take_task(&mut self, key: TaskKey) -> Option<Task> {
        self.tasks.get_mut(key.index()).and_then(Option::take)
    }

    // ================================
    // Identity registries
    // ================================

    /// Task registered under a unique ID.
    pub fn task_by_unique_id(&self, unique_id: i32) -> Option<TaskKey> {
        self.unique_id_map.get(&unique_id).copied()
    }

    /// Task registered under a position ID.
    pub fn task_by_id(&self, id: i32) -> Option<TaskKey> {
        self.id_map.get(&id).copied()
    }

    /// Assigns and registers a unique ID, unregistering the task's
    /// previous one. Allocation continues above the highest value seen.
    ///
    /// # Errors
    /// [`ProjectError::DuplicateUniqueId`] if another task holds the value.
    pub fn set_unique_id(&mut self, key: TaskKey, unique_id: i32) -> Result<()> {
        let previous = self.task(key)?.unique_id();
        if matches!(self.unique_id_map.get(&unique_id), Some(&owner) if owner != key) {
            return Err(ProjectError::DuplicateUniqueId(unique_id));
        }
        if let Some(previous) = previous {
            if self.unique_id_map.get(&previous) == Some(&key) {
                self.unique_id_map.remove(&previous);
            }
        }
        self.task_mut(key)?
            .set(TaskField::UNIQUE_ID, FieldValue::Integer(unique_id));
        self.unique_id_map.insert(unique_id, key);
        if unique_id >= self.next_unique_id {
            self.next_unique_id = unique_id + 1;
        }
        Ok(())
    }

    /// Assigns and registers a position ID, unregistering the task's
    /// previous one.
    ///
    /// # Errors
    /// [`ProjectError::DuplicateId`] if another task holds the value.
    pub fn set_id(&mut self, key: TaskKey, id: i32) -> Result<()> {
        let previous = self.task(key)?.id();
        if matches!(self.id_map.get(&id), Some(&owner) if owner != key) {
            return Err(ProjectError::DuplicateId(id));
        }
        if let Some(previous) = previous {
            if self.id_map.get(&previous) == Some(&key) {
                self.id_map.remove(&previous);
            }
        }
        self.task_mut(key)?
            .set(TaskField::ID, FieldValue::Integer(id));
        self.id_map.insert(id, key);
        if id >= self.next_id {
            self.next_id = id + 1;
        }
        Ok(())
    }

    /// Next unique ID; never returns a value already handed out.
    pub(crate) fn allocate_unique_id(&mut self) -> i32 {
        let uid = self.next_unique_id;
        self.next_unique_id += 1;
        uid
    }

    /// Next position ID, skipping values currently registered.
    pub(crate) fn allocate_id(&mut self) -> i32 {
        while self.id_map.contains_key(&self.next_id) {
            self.next_id += 1;
        }
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Removes a task's identity registrations.
    pub(crate) fn unregister(&mut self, task: &Task) {
        if let Some(uid) = task.unique_id() {
            if self.unique_id_map.get(&uid) == Some(&task.key()) {
                self.unique_id_map.remove(&uid);
            }
        }
        if let Some(id) = task.id() {
            if self.id_map.get(&id) == Some(&task.key()) {
                self.id_map.remove(&id);
            }
        }
    }

    /// Clears the position-ID registry ahead of renumbering.
    pub(crate) fn reset_ids(&mut self, first: i32) {
        self.id_map.clear();
        self.next_id = first;
    }

    pub(crate) fn unique_id_registry(&self) -> &HashMap<i32, TaskKey> {
        &self.unique_id_map
    }

    pub(crate) fn id_registry(&self) -> &HashMap<i32, TaskKey> {
        &self.id_map
    }

    // ================================
    // Field aliases
    // ================================

    /// Gives a field a user-defined display name, replacing any previous
    /// alias of that field.
    pub fn set_task_field_alias(&mut self, field: TaskField, alias: impl Into<String>) {
        let alias = alias.into();
        if let Some(old) = self.field_to_alias.insert(field, alias.clone()) {
            self.alias_to_field.remove(&old);
        }
        if let Some(displaced) = self.alias_to_field.insert(alias.clone(), field) {
            if displaced != field {
                debug!("alias '{alias}' moved from {displaced} to {field}");
                self.field_to_alias.remove(&displaced);
            }
        }
    }

    /// Alias of a field, if any.
    pub fn task_field_alias(&self, field: TaskField) -> Option<&str> {
        self.field_to_alias.get(&field).map(String::as_str)
    }

    /// Field carrying an alias.
    pub fn task_field_by_alias(&self, alias: &str) -> Option<TaskField> {
        self.alias_to_field.get(alias).copied()
    }

    /// Reads a task field addressed by alias.
    ///
    /// # Errors
    /// [`ProjectError::UnknownAlias`] if no field has the alias.
    pub fn get_field_by_alias(&self, key: TaskKey, alias: &str) -> Result<Option<&FieldValue>> {
        let field = self
            .task_field_by_alias(alias)
            .ok_or_else(|| ProjectError::UnknownAlias(alias.to_string()))?;
        Ok(self.task(key)?.get(field))
    }

    /// Writes a task field addressed by alias.
    pub fn set_field_by_alias(
        &mut self,
        key: TaskKey,
        alias: &str,
        value: impl Into<Option<FieldValue>>,
    ) -> Result<()> {
        let field = self
            .task_field_by_alias(alias)
            .ok_or_else(|| ProjectError::UnknownAlias(alias.to_string()))?;
        self.task_mut(key)?.set(field, value);
        Ok(())
    }

    // ================================
    // Cache control
    // ================================

    /// Clears every cached derived value of every task.
    ///
    /// Needed after project-wide changes that do not pass through a task
    /// write, such as editing a calendar or the unit conversion factors.
    pub fn invalidate_derived_fields(&mut self) {
        for task in self.tasks.iter_mut().flatten() {
            task.invalidate_derived();
        }
    }
}

impl Default for ProjectFile {
    fn default() -> Self {
        Self::new()
    }
}
