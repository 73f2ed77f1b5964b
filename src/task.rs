use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: Uuid,
    pub text: String,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
}

impl Task {
    pub fn new(text: String, due_date: Option<NaiveDate>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            completed: false,
            due_date,
        }
    }
}

/// Which tasks the list shows. Never changes the stored collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Done,
    Todo,
}

impl Filter {
    pub const TABS: [Filter; 3] = [Filter::All, Filter::Done, Filter::Todo];

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Done => task.completed,
            Filter::Todo => !task.completed,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Done => "Done",
            Filter::Todo => "Todo",
        }
    }

    pub fn next(&self) -> Filter {
        match self {
            Filter::All => Filter::Done,
            Filter::Done => Filter::Todo,
            Filter::Todo => Filter::All,
        }
    }
}
