//! Request/response types and validation for notes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub(super) const TITLE_MAX_CHARS: usize = 200;
pub(super) const BODY_MAX_CHARS: usize = 10_000;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateNoteRequest {
    /// Required; a missing title is reported like a blank one.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteResponse {
    pub id: String,
    pub title: String,
    pub body: String,
    pub created_at_unix: i64,
    pub updated_at_unix: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrors {
    pub errors: Vec<String>,
}

/// Validated attributes for a new note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub body: String,
}

/// Validated partial update; `None` keeps the stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl CreateNoteRequest {
    pub(super) fn validate(self) -> Result<NewNote, Vec<String>> {
        let mut errors = Vec::new();
        let title = validate_title(self.title.as_deref().unwrap_or_default(), &mut errors);
        validate_body(&self.body, &mut errors);
        match title {
            Some(title) if errors.is_empty() => Ok(NewNote {
                title,
                body: self.body,
            }),
            _ => Err(errors),
        }
    }
}

impl UpdateNoteRequest {
    pub(super) fn validate(self) -> Result<NoteChanges, Vec<String>> {
        if self.title.is_none() && self.body.is_none() {
            return Err(vec!["No updates provided.".to_string()]);
        }

        let mut errors = Vec::new();
        let title = self
            .title
            .as_deref()
            .and_then(|title| validate_title(title, &mut errors));
        if let Some(body) = &self.body {
            validate_body(body, &mut errors);
        }

        if errors.is_empty() {
            Ok(NoteChanges {
                title,
                body: self.body,
            })
        } else {
            Err(errors)
        }
    }
}

fn validate_title(title: &str, errors: &mut Vec<String>) -> Option<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        errors.push("Title can't be blank.".to_string());
        return None;
    }
    if trimmed.chars().count() > TITLE_MAX_CHARS {
        errors.push(format!(
            "Title is too long (maximum is {TITLE_MAX_CHARS} characters)."
        ));
        return None;
    }
    Some(trimmed.to_string())
}

fn validate_body(body: &str, errors: &mut Vec<String>) {
    if body.chars().count() > BODY_MAX_CHARS {
        errors.push(format!(
            "Body is too long (maximum is {BODY_MAX_CHARS} characters)."
        ));
    }
}
