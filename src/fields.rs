use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::models::NewFormField;
use crate::rsvp::FieldView;
use crate::store::Repository;

pub const FIELD_TYPES: &[&str] = &["text", "textarea", "select", "radio", "checkbox", "number", "email"];
const CHOICE_TYPES: &[&str] = &["select", "radio", "checkbox"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInput {
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_section")]
    pub section: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub position: i32,
}

fn default_section() -> String {
    "general".to_string()
}

impl FieldInput {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut messages = Vec::new();
        if self.label.trim().is_empty() {
            messages.push("label must not be blank".to_string());
        }
        if !FIELD_TYPES.contains(&self.field_type.as_str()) {
            messages.push(format!(
                "type `{}` must be one of {}",
                self.field_type,
                FIELD_TYPES.join(", ")
            ));
        } else if CHOICE_TYPES.contains(&self.field_type.as_str())
            && self.options.iter().all(|o| o.trim().is_empty())
        {
            messages.push(format!("a {} field needs at least one option", self.field_type));
        }
        if self.section.trim().is_empty() {
            messages.push("section must not be blank".to_string());
        }

        if messages.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(messages))
        }
    }
}

pub async fn create<R: Repository + ?Sized>(
    repo: &mut R,
    wedding_id: i32,
    input: FieldInput,
    now: NaiveDateTime,
) -> Result<FieldView, AppError> {
    input.validate()?;
    repo.wedding(wedding_id)
        .await?
        .ok_or(AppError::NotFound("wedding"))?;

    let field = repo
        .insert_field(NewFormField {
            wedding_id,
            label: input.label.trim().to_string(),
            field_type: input.field_type,
            required: input.required,
            section: input.section.trim().to_string(),
            options: input
                .options
                .into_iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            position: input.position,
            created_at: now,
        })
        .await?;

    info!(wedding_id, field_id = field.id, "form field created");
    Ok(FieldView::from(field))
}

/// Soft-deletes a field; answers already given to it become obsolete.
pub async fn remove<R: Repository + ?Sized>(
    repo: &mut R,
    wedding_id: i32,
    field_id: i32,
    now: NaiveDateTime,
) -> Result<(), AppError> {
    match repo.soft_delete_field(wedding_id, field_id, now).await? {
        0 => Err(AppError::NotFound("form field")),
        _ => {
            info!(wedding_id, field_id, "form field deleted");
            Ok(())
        }
    }
}
