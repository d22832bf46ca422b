//! # RSVP reconciliation
//!
//! The public flow behind a guest's token.
//!
//! A submission rewrites the guest's attendance, reconciles the single
//! dependent plus-one row and replaces every stored answer:
//!
//! 1. resolve the guest by token
//! 2. set `confirmed` / `declined`
//! 3. attending with an attending plus-one: reuse or create the dependent,
//!    revive it, replace its answers
//! 4. otherwise: decline and soft-delete any live dependent
//! 5. delete all of the guest's answers
//! 6. attending: insert the new answers
//!
//! A declared plus-one is checked against the same name and address rules as
//! invited guests before anything is written.
//!
//! Answers pointing at a field that does not exist, was soft-deleted, or
//! belongs to another wedding are dropped silently.
//!
//! The caller is expected to run [`submit`] inside a single transaction.
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AppError;
use crate::guests::check_person;
use crate::models::{FormField, Guest, GuestStatus, NewGuest, NewResponse, Response};
use crate::notify::RsvpNotice;
use crate::store::Repository;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpSubmission {
    pub attending: bool,
    #[serde(default)]
    pub responses: Vec<ResponseInput>,
    #[serde(default)]
    pub plus_one: Option<PlusOneInput>,
    #[serde(default)]
    pub dietary_restrictions: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInput {
    pub field_id: i32,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlusOneInput {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub attending: bool,
    #[serde(default)]
    pub dietary_restrictions: Option<String>,
    #[serde(default)]
    pub responses: Vec<ResponseInput>,
}

/// Result of a committed submission.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub guest: Guest,
    pub plus_one: Option<Guest>,
    /// the guest had answers before this submission
    pub is_update: bool,
}

impl SubmitOutcome {
    pub fn notice(&self) -> RsvpNotice {
        RsvpNotice {
            guest_name: self.guest.full_name(),
            attending: self.guest.status == GuestStatus::Confirmed,
            dietary_restrictions: self.guest.dietary_restrictions.clone(),
            plus_one: self
                .plus_one
                .as_ref()
                .map(|p| (p.full_name(), p.dietary_restrictions.clone())),
            is_update: self.is_update,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReply {
    pub message: &'static str,
    pub status: GuestStatus,
    pub is_update: bool,
    pub plus_one: Option<GuestDetails>,
}

impl From<&SubmitOutcome> for SubmitReply {
    fn from(outcome: &SubmitOutcome) -> Self {
        Self {
            message: if outcome.is_update {
                "RSVP updated"
            } else {
                "RSVP recorded"
            },
            status: outcome.guest.status,
            is_update: outcome.is_update,
            plus_one: outcome.plus_one.as_ref().map(GuestDetails::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestDetails {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub status: GuestStatus,
    pub category: Option<String>,
    pub dietary_restrictions: Option<String>,
}

impl From<&Guest> for GuestDetails {
    fn from(g: &Guest) -> Self {
        Self {
            id: g.id,
            first_name: g.first_name.clone(),
            last_name: g.last_name.clone(),
            email: g.email.clone(),
            status: g.status,
            category: g.category.clone(),
            dietary_restrictions: g.dietary_restrictions.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseView {
    pub field_id: i32,
    pub value: String,
    pub is_obsolete: bool,
    pub field_label: Option<String>,
}

impl ResponseView {
    fn new(response: Response, field: Option<FormField>) -> Self {
        Self {
            field_id: response.field_id,
            value: response.value,
            is_obsolete: field.is_none(),
            field_label: field.map(|f| f.label),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlusOneView {
    #[serde(flatten)]
    pub guest: GuestDetails,
    pub responses: Vec<ResponseView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestView {
    pub guest: GuestDetails,
    pub wedding_title: String,
    pub responses: Vec<ResponseView>,
    pub plus_one: Option<PlusOneView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub id: i32,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
    pub section: String,
    pub options: Vec<String>,
    pub position: i32,
}

impl From<FormField> for FieldView {
    fn from(f: FormField) -> Self {
        Self {
            id: f.id,
            label: f.label,
            field_type: f.field_type,
            required: f.required,
            section: f.section,
            options: f.options,
            position: f.position,
        }
    }
}

/// Strips separators from a token as printed on invitations (`ABCD-EFGH-JKLM`).
pub fn normalize_token(raw: &str) -> String {
    raw.trim().chars().filter(|c| *c != '-').collect()
}

async fn resolve<R: Repository + ?Sized>(repo: &mut R, token: &str) -> Result<Guest, AppError> {
    repo.guest_by_token(token)
        .await?
        .ok_or(AppError::NotFound("guest"))
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn submit<R: Repository + ?Sized>(
    repo: &mut R,
    token: &str,
    submission: RsvpSubmission,
    now: NaiveDateTime,
) -> Result<SubmitOutcome, AppError> {
    let mut guest = resolve(repo, token).await?;
    let attending = submission.attending;
    let declared = submission.plus_one.filter(|p| attending && p.attending);
    if let Some(p) = &declared {
        check_person(&p.first_name, &p.last_name, p.email.as_deref())?;
    }
    let is_update = repo.count_responses(guest.id).await? > 0;

    guest.status = GuestStatus::from_attending(submission.attending);
    if let Some(dietary) = submission.dietary_restrictions {
        guest.dietary_restrictions = blank_to_none(Some(dietary));
    }
    guest.updated_at = Some(now);
    repo.update_guest(&guest).await?;

    let plus_one = match declared {
        Some(declared) => Some(upsert_plus_one(repo, &guest, declared, now).await?),
        None => {
            let withdrawn = repo.soft_delete_plus_ones(guest.id, now).await?;
            if withdrawn > 0 {
                debug!(guest_id = guest.id, withdrawn, "plus-one withdrawn");
            }
            None
        }
    };

    repo.delete_responses(guest.id).await?;
    if attending {
        write_responses(repo, &guest, &submission.responses, now).await?;
    }

    info!(
        guest_id = guest.id,
        status = %guest.status,
        plus_one = plus_one.is_some(),
        is_update,
        "rsvp submitted"
    );

    Ok(SubmitOutcome {
        guest,
        plus_one,
        is_update,
    })
}

async fn upsert_plus_one<R: Repository + ?Sized>(
    repo: &mut R,
    primary: &Guest,
    declared: PlusOneInput,
    now: NaiveDateTime,
) -> Result<Guest, AppError> {
    let mut plus_one = match repo.plus_one_of(primary.id).await? {
        Some(existing) => existing,
        None => {
            repo.insert_guest(NewGuest {
                wedding_id: primary.wedding_id,
                first_name: declared.first_name.trim().to_string(),
                last_name: declared.last_name.trim().to_string(),
                email: None,
                status: GuestStatus::Confirmed,
                category: primary.category.clone(),
                dietary_restrictions: None,
                rsvp_token: None,
                plus_one_of: Some(primary.id),
                created_at: now,
            })
            .await?
        }
    };

    plus_one.first_name = declared.first_name.trim().to_string();
    plus_one.last_name = declared.last_name.trim().to_string();
    plus_one.email = blank_to_none(declared.email);
    if declared.dietary_restrictions.is_some() {
        plus_one.dietary_restrictions = blank_to_none(declared.dietary_restrictions);
    }
    plus_one.status = GuestStatus::Confirmed;
    plus_one.deleted_at = None;
    plus_one.updated_at = Some(now);
    repo.update_guest(&plus_one).await?;

    repo.delete_responses(plus_one.id).await?;
    write_responses(repo, &plus_one, &declared.responses, now).await?;

    Ok(plus_one)
}

async fn write_responses<R: Repository + ?Sized>(
    repo: &mut R,
    owner: &Guest,
    inputs: &[ResponseInput],
    now: NaiveDateTime,
) -> Result<usize, AppError> {
    let mut rows = Vec::with_capacity(inputs.len());
    for input in inputs {
        match repo.field(input.field_id).await? {
            Some(field) if field.wedding_id == owner.wedding_id => rows.push(NewResponse {
                guest_id: owner.id,
                field_id: field.id,
                value: input.value.clone(),
                created_at: now,
            }),
            _ => debug!(guest_id = owner.id, field_id = input.field_id, "skipping answer"),
        }
    }
    Ok(repo.insert_responses(&rows).await?)
}

async fn response_views<R: Repository + ?Sized>(
    repo: &mut R,
    guest_id: i32,
) -> Result<Vec<ResponseView>, AppError> {
    Ok(repo
        .responses_for(guest_id)
        .await?
        .into_iter()
        .map(|(response, field)| ResponseView::new(response, field))
        .collect())
}

/// Everything the RSVP form needs to render a guest's current answers.
pub async fn guest_view<R: Repository + ?Sized>(repo: &mut R, token: &str) -> Result<GuestView, AppError> {
    let guest = resolve(repo, token).await?;
    let wedding = repo
        .wedding(guest.wedding_id)
        .await?
        .ok_or(AppError::NotFound("wedding"))?;
    let responses = response_views(repo, guest.id).await?;

    let plus_one = match repo.plus_one_of(guest.id).await? {
        Some(p) if !p.is_deleted() => Some(PlusOneView {
            guest: GuestDetails::from(&p),
            responses: response_views(repo, p.id).await?,
        }),
        _ => None,
    };

    Ok(GuestView {
        guest: GuestDetails::from(&guest),
        wedding_title: wedding.title,
        responses,
        plus_one,
    })
}

/// Live questions of the guest's wedding.
pub async fn fields<R: Repository + ?Sized>(repo: &mut R, token: &str) -> Result<Vec<FieldView>, AppError> {
    let guest = resolve(repo, token).await?;
    Ok(repo
        .fields_for_wedding(guest.wedding_id)
        .await?
        .into_iter()
        .map(FieldView::from)
        .collect())
}
