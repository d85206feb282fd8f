// Task store: ordered collection with filtering, stats, and persistence

use crate::error::{PersistenceError, StoreError};
use crate::filter::FilterKind;
use crate::models::{MAX_TEXT_LEN, Priority, Stats, StoreMeta, Task, TaskId, now_ms};
use crate::persist::PersistenceAdapter;
use crate::transfer::{self, ExportEnvelope, ImportMode};
use tracing::{debug, info, warn};

/// Result of a delete request.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Deleted(Task),
    /// The task is high-priority and still active: the caller must obtain
    /// confirmation and re-invoke with it granted.
    ConfirmationRequired,
}

/// Result of a clear-completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    Cleared(usize),
    /// Completed tasks exist: the caller must obtain confirmation and
    /// re-invoke with it granted. Carries the count that would be removed.
    ConfirmationRequired(usize),
    NothingToClear,
}

/// Owns the ordered task collection, the id counter, and the current
/// filter. New tasks sit at the front; completing a task moves it to the
/// back. All operations are synchronous and atomic: no operation ever
/// observes a partially-mutated collection.
pub struct TaskStore {
    tasks: Vec<Task>,
    filter: FilterKind,
    next_id: TaskId,
    adapter: Box<dyn PersistenceAdapter>,
    save_error: Option<PersistenceError>,
}

impl TaskStore {
    /// Open a store backed by the given adapter.
    ///
    /// A failed or corrupt load is treated as "no saved data": the store
    /// starts empty rather than failing. The id counter resumes from the
    /// persisted settings, clamped so it can never fall below
    /// `max existing id + 1`.
    pub fn open(adapter: Box<dyn PersistenceAdapter>) -> Self {
        let (tasks, meta) = match adapter.load() {
            Ok(Some(state)) => (state.tasks, state.meta),
            Ok(None) => (Vec::new(), StoreMeta::default()),
            Err(e) => {
                warn!(error = %e, "failed to load saved tasks, starting empty");
                (Vec::new(), StoreMeta::default())
            }
        };

        let max_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
        let next_id = meta.id_counter.max(max_id + 1);
        debug!(count = tasks.len(), next_id, "store opened");

        Self {
            tasks,
            filter: meta.filter,
            next_id,
            adapter,
            save_error: None,
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Add a new task at the front of the collection.
    pub fn add(&mut self, text: &str, priority: Priority) -> Result<Task, StoreError> {
        let text = Self::validate_text(text)?;
        self.check_duplicate(&text, None)?;

        let task = Task::new(self.allocate_id(), text, priority);
        info!(id = task.id, "task added");
        self.tasks.insert(0, task.clone());
        self.persist();
        Ok(task)
    }

    /// Delete a task. High-priority tasks that are still active require an
    /// external confirmation signal; without it nothing is mutated.
    pub fn delete(&mut self, id: TaskId, confirmed: bool) -> Result<DeleteOutcome, StoreError> {
        let idx = self.index_of(id)?;

        let task = &self.tasks[idx];
        if task.priority == Priority::High && !task.completed && !confirmed {
            return Ok(DeleteOutcome::ConfirmationRequired);
        }

        let task = self.tasks.remove(idx);
        info!(id, "task deleted");
        self.persist();
        Ok(DeleteOutcome::Deleted(task))
    }

    /// Flip a task's completion state.
    ///
    /// Completing sets `completed_at` and moves the task to the end of the
    /// collection. Un-completing clears `completed_at` and leaves the task
    /// wherever it currently is.
    pub fn toggle_complete(&mut self, id: TaskId) -> Result<Task, StoreError> {
        let idx = self.index_of(id)?;
        let completing = !self.tasks[idx].completed;

        let snapshot = {
            let task = &mut self.tasks[idx];
            task.completed = completing;
            task.completed_at = completing.then(now_ms);
            task.clone()
        };

        if completing {
            let task = self.tasks.remove(idx);
            self.tasks.push(task);
        }

        self.persist();
        Ok(snapshot)
    }

    /// Rewrite a task's text. Same validation as `add`; the duplicate
    /// check skips the task being edited. Never changes `id` or
    /// `created_at`.
    pub fn edit(&mut self, id: TaskId, new_text: &str) -> Result<Task, StoreError> {
        let idx = self.index_of(id)?;
        let text = Self::validate_text(new_text)?;
        self.check_duplicate(&text, Some(id))?;

        let snapshot = {
            let task = &mut self.tasks[idx];
            task.text = text;
            task.edited_at = Some(now_ms());
            task.clone()
        };

        self.persist();
        Ok(snapshot)
    }

    /// Remove every completed task. Requires confirmation when there is
    /// anything to remove.
    pub fn clear_completed(&mut self, confirmed: bool) -> ClearOutcome {
        let count = self.tasks.iter().filter(|t| t.completed).count();
        if count == 0 {
            return ClearOutcome::NothingToClear;
        }
        if !confirmed {
            return ClearOutcome::ConfirmationRequired(count);
        }

        self.tasks.retain(|t| !t.completed);
        info!(count, "cleared completed tasks");
        self.persist();
        ClearOutcome::Cleared(count)
    }

    /// Set the process-wide filter. Persisted with the id counter.
    pub fn set_filter(&mut self, kind: FilterKind) {
        self.filter = kind;
        self.persist();
    }

    // ========================================================================
    // Import / export
    // ========================================================================

    /// Serialize the collection into an export envelope.
    pub fn export(&self) -> Result<ExportEnvelope, StoreError> {
        if self.tasks.is_empty() {
            return Err(StoreError::EmptyExport);
        }
        Ok(ExportEnvelope::new(self.tasks.clone()))
    }

    /// Import tasks from a raw JSON payload (export envelope or bare
    /// array). Every accepted entry gets a fresh id. `Merge` prepends the
    /// imported block ahead of existing tasks, payload order preserved;
    /// `Replace` discards the existing collection. A payload that fails to
    /// decode leaves the store untouched.
    pub fn import(&mut self, raw: &str, mode: ImportMode) -> Result<usize, StoreError> {
        let incoming = transfer::decode_payload(raw)?;

        let now = now_ms();
        let mut block: Vec<Task> = Vec::with_capacity(incoming.len());
        for entry in incoming {
            let id = self.allocate_id();
            block.push(entry.into_task(id, now));
        }
        let count = block.len();

        match mode {
            ImportMode::Merge => {
                block.append(&mut self.tasks);
                self.tasks = block;
            }
            ImportMode::Replace => self.tasks = block,
        }

        info!(count, ?mode, "imported tasks");
        self.persist();
        Ok(count)
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// The collection in storage order, newest-added first.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// The current filter.
    pub fn filter(&self) -> FilterKind {
        self.filter
    }

    /// Lazy, restartable view of the collection under a filter. Does not
    /// reorder storage.
    pub fn view(&self, kind: FilterKind) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.iter().filter(move |t| kind.matches(t))
    }

    /// View under the store's current filter.
    pub fn current_view(&self) -> impl Iterator<Item = &Task> + '_ {
        self.view(self.filter)
    }

    /// Task counts, derived from the collection.
    pub fn stats(&self) -> Stats {
        let completed = self.tasks.iter().filter(|t| t.completed).count();
        Stats {
            total: self.tasks.len(),
            active: self.tasks.len() - completed,
            completed,
        }
    }

    /// The last persistence failure, if the most recent save did not reach
    /// storage. The store keeps operating in memory; the presentation
    /// layer decides how to warn the user.
    pub fn save_warning(&self) -> Option<&PersistenceError> {
        self.save_error.as_ref()
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn allocate_id(&mut self) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn index_of(&self, id: TaskId) -> Result<usize, StoreError> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    fn validate_text(text: &str) -> Result<String, StoreError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(StoreError::EmptyText);
        }
        let len = trimmed.chars().count();
        if len > MAX_TEXT_LEN {
            return Err(StoreError::TextTooLong { len, max: MAX_TEXT_LEN });
        }
        Ok(trimmed.to_string())
    }

    /// Duplicate texts are only a conflict while both tasks are active;
    /// any number of completed tasks may share a text.
    fn check_duplicate(&self, text: &str, exclude: Option<TaskId>) -> Result<(), StoreError> {
        let needle = text.to_lowercase();
        let clash = self
            .tasks
            .iter()
            .filter(|t| !t.completed && Some(t.id) != exclude)
            .any(|t| t.text.to_lowercase() == needle);
        if clash {
            return Err(StoreError::DuplicateText);
        }
        Ok(())
    }

    fn meta(&self) -> StoreMeta {
        StoreMeta {
            filter: self.filter,
            id_counter: self.next_id,
        }
    }

    fn persist(&mut self) {
        let meta = self.meta();
        match self.adapter.save(&self.tasks, &meta) {
            Ok(()) => self.save_error = None,
            Err(e) => {
                warn!(error = %e, "failed to save tasks, changes held in memory only");
                self.save_error = Some(e);
            }
        }
    }
}

impl Drop for TaskStore {
    /// Best-effort resave on teardown.
    fn drop(&mut self) {
        let meta = self.meta();
        if let Err(e) = self.adapter.save(&self.tasks, &meta) {
            warn!(error = %e, "final save on shutdown failed");
        }
    }
}
