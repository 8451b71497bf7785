use crate::domain::ticket::{Category, NewTicket, Priority, TITLE_MAX_CHARS};
use crate::error::{AppError, AppResult};

/// Classification hint for a description. Either field may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Suggestion {
    pub category: Option<Category>,
    pub priority: Option<Priority>,
}

impl Suggestion {
    /// Values outside the known enumerations count as no suggestion.
    pub fn from_labels(category: Option<&str>, priority: Option<&str>) -> Self {
        Self {
            category: category.and_then(Category::from_str),
            priority: priority.and_then(Priority::from_str),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.priority.is_none()
    }
}

/// Pre-submission form state owned by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftTicket {
    pub title: String,
    pub description: String,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
}

impl DraftTicket {
    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }

    /// Fills only the fields the user has not set. Returns whether anything changed.
    pub fn apply_suggestion(&mut self, suggestion: &Suggestion) -> bool {
        let mut changed = false;
        if self.category.is_none() {
            if let Some(category) = suggestion.category {
                self.category = Some(category);
                changed = true;
            }
        }
        if self.priority.is_none() {
            if let Some(priority) = suggestion.priority {
                self.priority = Some(priority);
                changed = true;
            }
        }
        changed
    }

    pub fn validate(&self) -> AppResult<NewTicket> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::InvalidDraft("title must not be empty".to_string()));
        }
        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(AppError::InvalidDraft(format!(
                "title must be at most {TITLE_MAX_CHARS} characters"
            )));
        }
        if !self.has_description() {
            return Err(AppError::InvalidDraft(
                "description must not be empty".to_string(),
            ));
        }
        let category = self
            .category
            .ok_or_else(|| AppError::InvalidDraft("category must be selected".to_string()))?;
        let priority = self
            .priority
            .ok_or_else(|| AppError::InvalidDraft("priority must be selected".to_string()))?;

        Ok(NewTicket {
            title: title.to_string(),
            description: self.description.clone(),
            category,
            priority,
        })
    }
}
