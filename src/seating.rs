//! Table capacity checks.
//!
//! Assignment and the dry run share [`plan`]; assignment only writes when the
//! plan fits.
use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::models::{NewWeddingTable, WeddingTable};
use crate::store::Repository;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingRequest {
    pub guest_ids: Vec<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInput {
    pub name: String,
    pub capacity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityReport {
    pub table_id: i32,
    pub capacity: i32,
    /// guests already at the table
    pub seated: usize,
    /// requested guests not yet at the table
    pub requested: usize,
    pub resulting: usize,
    pub overflow: usize,
    pub fits: bool,
    /// problems with the request other than capacity
    pub errors: Vec<String>,
}

impl CapacityReport {
    fn into_messages(self, table: &WeddingTable) -> Vec<String> {
        let mut messages = self.errors;
        if !self.fits && self.overflow > 0 {
            messages.push(format!(
                "table `{}` seats {} but would hold {} guests",
                table.name, self.capacity, self.resulting
            ));
        }
        messages
    }
}

async fn load_table<R: Repository + ?Sized>(
    repo: &mut R,
    wedding_id: i32,
    table_id: i32,
) -> Result<WeddingTable, AppError> {
    repo.table(table_id)
        .await?
        .filter(|t| t.wedding_id == wedding_id)
        .ok_or(AppError::NotFound("table"))
}

async fn plan<R: Repository + ?Sized>(
    repo: &mut R,
    table: &WeddingTable,
    guest_ids: &[i32],
) -> Result<(CapacityReport, Vec<i32>), AppError> {
    let requested: BTreeSet<i32> = guest_ids.iter().copied().collect();
    let ids: Vec<i32> = requested.iter().copied().collect();

    let mut errors = Vec::new();
    let guests = repo.guests_by_ids(&ids).await?;
    for id in &ids {
        match guests.iter().find(|g| g.id == *id) {
            None => errors.push(format!("guest {id} does not exist")),
            Some(g) if g.wedding_id != table.wedding_id => {
                errors.push(format!("guest {id} belongs to another wedding"))
            }
            Some(_) => {}
        }
    }

    let seated: BTreeSet<i32> = repo.seated_guest_ids(table.id).await?.into_iter().collect();
    let incoming: Vec<i32> = ids.into_iter().filter(|id| !seated.contains(id)).collect();

    let capacity = usize::try_from(table.capacity).unwrap_or(0);
    let resulting = seated.len() + incoming.len();
    let overflow = resulting.saturating_sub(capacity);

    let report = CapacityReport {
        table_id: table.id,
        capacity: table.capacity,
        seated: seated.len(),
        requested: incoming.len(),
        resulting,
        overflow,
        fits: overflow == 0 && errors.is_empty(),
        errors,
    };
    Ok((report, incoming))
}

pub async fn create_table<R: Repository + ?Sized>(
    repo: &mut R,
    wedding_id: i32,
    input: TableInput,
    now: NaiveDateTime,
) -> Result<WeddingTable, AppError> {
    let name = input.name.trim();
    let mut messages = Vec::new();
    if name.is_empty() {
        messages.push("name must not be blank".to_string());
    } else if name.chars().count() > 100 {
        messages.push("name is limited to 100 characters".to_string());
    }
    if input.capacity < 1 {
        messages.push("capacity must be at least 1".to_string());
    }
    if !messages.is_empty() {
        return Err(AppError::Validation(messages));
    }

    repo.wedding(wedding_id)
        .await?
        .ok_or(AppError::NotFound("wedding"))?;
    let table = repo
        .insert_table(NewWeddingTable {
            wedding_id,
            name: name.to_string(),
            capacity: input.capacity,
            created_at: now,
        })
        .await?;
    info!(wedding_id, table_id = table.id, capacity = table.capacity, "table created");
    Ok(table)
}

/// Dry run: what assigning `guest_ids` would do, without writing anything.
pub async fn validate<R: Repository + ?Sized>(
    repo: &mut R,
    wedding_id: i32,
    table_id: i32,
    guest_ids: &[i32],
) -> Result<CapacityReport, AppError> {
    let table = load_table(repo, wedding_id, table_id).await?;
    let (report, _) = plan(repo, &table, guest_ids).await?;
    Ok(report)
}

/// Seats guests at a table, rejecting the whole request if it does not fit.
pub async fn assign<R: Repository + ?Sized>(
    repo: &mut R,
    wedding_id: i32,
    table_id: i32,
    guest_ids: &[i32],
    now: NaiveDateTime,
) -> Result<CapacityReport, AppError> {
    let table = load_table(repo, wedding_id, table_id).await?;
    let (report, incoming) = plan(repo, &table, guest_ids).await?;
    if !report.fits {
        return Err(AppError::Validation(report.into_messages(&table)));
    }

    if !incoming.is_empty() {
        repo.assign_table(&incoming, table.id, now).await?;
    }
    info!(table_id, seated = report.resulting, "guests assigned to table");
    Ok(report)
}
