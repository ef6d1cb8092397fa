//! Predecessor/successor network.
//!
//! `link(source, target, ..)` records that `target` is a predecessor of
//! `source`. The relation is stored in `source`'s predecessor list and,
//! reversed, in `target`'s successor list. Both lists are updated in one
//! call, and at most one relation exists per ordered task pair.

use log::{debug, warn};

use crate::config::ProjectProperties;
use crate::error::Result;
use crate::models::{
    Duration, ProjectFile, Relation, RelationType, Task, TaskField, TaskKey, TimeUnit,
};

/// Result of merging a relation into one side's list.
enum Merge {
    Unchanged(Relation),
    Replaced,
    Added,
}

fn merge(list: &mut Vec<Relation>, relation: Relation, props: &ProjectProperties) -> Merge {
    match list.iter_mut().find(|r| r.target_task == relation.target_task) {
        Some(existing)
            if existing.kind == relation.kind && existing.lag.same_as(&relation.lag, props) =>
        {
            Merge::Unchanged(*existing)
        }
        Some(existing) => {
            *existing = relation;
            Merge::Replaced
        }
        None => {
            list.push(relation);
            Merge::Added
        }
    }
}

fn matches_exactly(
    r: &Relation,
    target: TaskKey,
    kind: RelationType,
    lag: &Duration,
    props: &ProjectProperties,
) -> bool {
    r.target_task == target && r.kind == kind && r.lag.same_as(lag, props)
}

impl ProjectFile {
    /// Makes `target` a predecessor of `source`. A missing lag means zero
    /// days.
    ///
    /// Linking an already-linked pair with the same kind and lag returns
    /// the existing relation; a different kind or lag replaces it.
    pub fn link(
        &mut self,
        source: TaskKey,
        target: TaskKey,
        kind: RelationType,
        lag: Option<Duration>,
    ) -> Result<Relation> {
        self.task(source)?;
        self.task(target)?;
        let props = self.properties().clone();
        let lag = lag.unwrap_or_else(|| Duration::zero(TimeUnit::Days));
        let relation = Relation::new(source, target, kind, lag);

        let merged = self
            .task_mut(source)?
            .with_relations(TaskField::PREDECESSORS, |list| merge(list, relation, &props));
        self.task_mut(target)?
            .with_relations(TaskField::SUCCESSORS, |list| {
                merge(list, relation.reversed(), &props)
            });

        Ok(match merged {
            Merge::Unchanged(existing) => existing,
            Merge::Replaced => {
                debug!("replaced relation {source} -> {target} with {}", relation);
                relation
            }
            Merge::Added => relation,
        })
    }

    /// Removes the relation making `target` a predecessor of `source`,
    /// if one exists with exactly this kind and lag. Both sides are
    /// removed together. Returns whether a relation was found.
    pub fn unlink(
        &mut self,
        source: TaskKey,
        target: TaskKey,
        kind: RelationType,
        lag: Option<Duration>,
    ) -> Result<bool> {
        self.task(source)?;
        self.task(target)?;
        let props = self.properties().clone();
        let lag = lag.unwrap_or_else(|| Duration::zero(TimeUnit::Days));

        let removed = self
            .task_mut(source)?
            .retain_relations(TaskField::PREDECESSORS, |r| {
                !matches_exactly(r, target, kind, &lag, &props)
            });
        if removed == 0 {
            return Ok(false);
        }
        let mirrored = self
            .task_mut(target)?
            .retain_relations(TaskField::SUCCESSORS, |r| {
                !matches_exactly(r, source, kind, &lag, &props)
            });
        if mirrored == 0 {
            warn!("relation {source} -> {target} had no successor entry on task {target}");
        }
        debug!("removed relation {source} -> {target} {} {lag}", kind.code());
        Ok(true)
    }

    /// The relation making `target` a predecessor of `source`, if any.
    pub fn find_predecessor(&self, source: TaskKey, target: TaskKey) -> Result<Option<Relation>> {
        Ok(self
            .task(source)?
            .predecessors()
            .iter()
            .find(|r| r.target_task == target)
            .copied())
    }

    /// Whether `other` appears in `task`'s predecessor list, compared by
    /// unique ID.
    pub fn is_predecessor(&self, task: TaskKey, other: TaskKey) -> Result<bool> {
        self.is_related(task, other, Task::predecessors)
    }

    /// Whether `other` appears in `task`'s successor list, compared by
    /// unique ID.
    pub fn is_successor(&self, task: TaskKey, other: TaskKey) -> Result<bool> {
        self.is_related(task, other, Task::successors)
    }

    fn is_related(
        &self,
        task: TaskKey,
        other: TaskKey,
        relations: fn(&Task) -> &[Relation],
    ) -> Result<bool> {
        let list = relations(self.task(task)?);
        let other_uid = self.task(other)?.unique_id();
        Ok(list.iter().any(|r| {
            // Tasks without a unique ID fall back to key identity.
            match (other_uid, self.task(r.target_task).ok().and_then(|t| t.unique_id())) {
                (Some(a), Some(b)) => a == b,
                _ => r.target_task == other,
            }
        }))
    }
}
