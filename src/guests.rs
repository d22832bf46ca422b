use chrono::{NaiveDate, NaiveDateTime};
use lettre::Address;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::models::{Guest, GuestStatus, NewGuest, NewWedding, Wedding};
use crate::store::Repository;

pub const TOKEN_LENGTH: usize = 12;

/// A fresh invitation code: uppercase alphanumerics from the thread CSPRNG.
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect::<String>()
        .to_ascii_uppercase()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeddingInput {
    pub title: String,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestInput {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl GuestInput {
    pub fn validate(&self) -> Result<(), AppError> {
        check_person(&self.first_name, &self.last_name, self.email.as_deref())
    }
}

const NAME_LIMIT: usize = 100;
const EMAIL_LIMIT: usize = 180;

/// Name and address rules shared by invited guests and their plus-ones.
pub(crate) fn check_person(first_name: &str, last_name: &str, email: Option<&str>) -> Result<(), AppError> {
    let mut messages = Vec::new();
    if first_name.trim().is_empty() {
        messages.push("firstName must not be blank".to_string());
    }
    if last_name.trim().is_empty() {
        messages.push("lastName must not be blank".to_string());
    }
    if first_name.trim().chars().count() > NAME_LIMIT || last_name.trim().chars().count() > NAME_LIMIT {
        messages.push(format!("names are limited to {NAME_LIMIT} characters"));
    }
    if let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) {
        if email.parse::<Address>().is_err() {
            messages.push(format!("email `{email}` is not a valid address"));
        } else if email.chars().count() > EMAIL_LIMIT {
            messages.push(format!("email is limited to {EMAIL_LIMIT} characters"));
        }
    }

    if messages.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(messages))
    }
}

/// A primary guest as shown to administrators.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestListing {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub status: GuestStatus,
    pub category: Option<String>,
    pub dietary_restrictions: Option<String>,
    pub rsvp_token: Option<String>,
    pub table_id: Option<i32>,
    pub plus_one: Option<String>,
}

impl GuestListing {
    fn new(guest: &Guest, plus_one: Option<&Guest>) -> Self {
        Self {
            id: guest.id,
            first_name: guest.first_name.clone(),
            last_name: guest.last_name.clone(),
            email: guest.email.clone(),
            status: guest.status,
            category: guest.category.clone(),
            dietary_restrictions: guest.dietary_restrictions.clone(),
            rsvp_token: guest.rsvp_token.clone(),
            table_id: guest.table_id,
            plus_one: plus_one.map(Guest::full_name),
        }
    }
}

impl From<&Guest> for GuestListing {
    fn from(guest: &Guest) -> Self {
        Self::new(guest, None)
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestSummary {
    pub attending: Vec<GuestListing>,
    pub declined: Vec<GuestListing>,
    pub pending: Vec<GuestListing>,
    pub plus_one_count: usize,
}

pub async fn create_wedding<R: Repository + ?Sized>(
    repo: &mut R,
    input: WeddingInput,
    now: NaiveDateTime,
) -> Result<Wedding, AppError> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(AppError::invalid("title must not be blank"));
    }
    let wedding = repo
        .insert_wedding(NewWedding {
            title: title.to_string(),
            event_date: input.event_date,
            created_at: now,
        })
        .await?;
    info!(wedding_id = wedding.id, "wedding created");
    Ok(wedding)
}

pub async fn create_guest<R: Repository + ?Sized>(
    repo: &mut R,
    wedding_id: i32,
    input: GuestInput,
    now: NaiveDateTime,
) -> Result<Guest, AppError> {
    input.validate()?;
    repo.wedding(wedding_id)
        .await?
        .ok_or(AppError::NotFound("wedding"))?;

    let mut token = generate_token();
    while repo.token_exists(&token).await? {
        token = generate_token();
    }

    let guest = repo
        .insert_guest(NewGuest {
            wedding_id,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email: input.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
            status: GuestStatus::Pending,
            category: input.category.filter(|c| !c.trim().is_empty()),
            dietary_restrictions: None,
            rsvp_token: Some(token),
            plus_one_of: None,
            created_at: now,
        })
        .await?;

    info!(wedding_id, guest_id = guest.id, "guest created");
    Ok(guest)
}

/// Primary guests of a wedding split by answer, with the number of plus-ones coming.
pub async fn summary<R: Repository + ?Sized>(repo: &mut R, wedding_id: i32) -> Result<GuestSummary, AppError> {
    repo.wedding(wedding_id)
        .await?
        .ok_or(AppError::NotFound("wedding"))?;

    let guests = repo.guests_for_wedding(wedding_id).await?;
    let (dependents, primaries): (Vec<&Guest>, Vec<&Guest>) = guests.iter().partition(|g| g.is_plus_one());

    let mut summary = GuestSummary::default();
    for guest in primaries {
        let plus_one = dependents
            .iter()
            .copied()
            .find(|d| d.plus_one_of == Some(guest.id));
        let listing = GuestListing::new(guest, plus_one);
        match guest.status {
            GuestStatus::Confirmed => {
                if plus_one.is_some_and(|p| p.status == GuestStatus::Confirmed) {
                    summary.plus_one_count += 1;
                }
                summary.attending.push(listing);
            }
            GuestStatus::Declined => summary.declined.push(listing),
            GuestStatus::Pending => summary.pending.push(listing),
        }
    }
    Ok(summary)
}
