use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::task::{Filter, Task};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("task text is empty")]
    EmptyText,
    #[error("no task with id {0}")]
    NotFound(Uuid),
}

/// In-progress input values, not yet committed to the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub due_date: Option<NaiveDate>,
}

/// What a submit will do: append a new task, or rewrite the targeted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Composing,
    Editing(Uuid),
}

#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    draft: Draft,
    mode: Mode,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            ..Self::default()
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    pub fn create(
        &mut self,
        text: &str,
        due_date: Option<NaiveDate>,
    ) -> Result<&Task, StoreError> {
        let idx = self.insert(text, due_date)?;
        Ok(&self.tasks[idx])
    }

    pub fn update(
        &mut self,
        id: Uuid,
        text: &str,
        due_date: Option<NaiveDate>,
    ) -> Result<&Task, StoreError> {
        let idx = self.replace(id, text, due_date)?;
        Ok(&self.tasks[idx])
    }

    pub fn toggle_completed(&mut self, id: Uuid) -> Result<&Task, StoreError> {
        let idx = self.position(id).ok_or(StoreError::NotFound(id))?;
        self.tasks[idx].completed = !self.tasks[idx].completed;
        Ok(&self.tasks[idx])
    }

    /// Removes the task if present. A missing id is not an error.
    pub fn remove(&mut self, id: Uuid) {
        self.tasks.retain(|t| t.id != id);
    }

    pub fn filtered(&self, filter: Filter) -> Vec<&Task> {
        self.tasks.iter().filter(|t| filter.matches(t)).collect()
    }

    /// Copies the task's fields into the draft and targets it for the next
    /// submit.
    pub fn begin_edit(&mut self, id: Uuid) -> Result<(), StoreError> {
        let task = self.get(id).ok_or(StoreError::NotFound(id))?;
        self.draft = Draft {
            text: task.text.clone(),
            due_date: task.due_date,
        };
        self.mode = Mode::Editing(id);
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.draft = Draft::default();
        self.mode = Mode::Composing;
    }

    /// Commits the draft: creates when composing, rewrites the target when
    /// editing. On success the draft is cleared and the mode returns to
    /// `Composing`. An empty draft changes nothing, so the user can keep
    /// correcting it.
    pub fn submit(&mut self) -> Result<&Task, StoreError> {
        let text = self.draft.text.clone();
        let due_date = self.draft.due_date;
        let idx = match self.mode {
            Mode::Composing => self.insert(&text, due_date)?,
            Mode::Editing(id) => match self.replace(id, &text, due_date) {
                Ok(idx) => idx,
                Err(err) => {
                    if matches!(err, StoreError::NotFound(_)) {
                        // edit target deleted mid-session; drop the stale draft
                        self.cancel_edit();
                    }
                    return Err(err);
                }
            },
        };
        self.draft = Draft::default();
        self.mode = Mode::Composing;
        Ok(&self.tasks[idx])
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    fn insert(&mut self, text: &str, due_date: Option<NaiveDate>) -> Result<usize, StoreError> {
        if text.trim().is_empty() {
            return Err(StoreError::EmptyText);
        }
        self.tasks.push(Task::new(text.to_string(), due_date));
        Ok(self.tasks.len() - 1)
    }

    fn replace(
        &mut self,
        id: Uuid,
        text: &str,
        due_date: Option<NaiveDate>,
    ) -> Result<usize, StoreError> {
        if text.trim().is_empty() {
            return Err(StoreError::EmptyText);
        }
        let idx = self.position(id).ok_or(StoreError::NotFound(id))?;
        let task = &mut self.tasks[idx];
        task.text = text.to_string();
        task.due_date = due_date;
        Ok(idx)
    }
}
