use std::cmp::Reverse;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use diesel::QueryResult;

use super::Repository;
use crate::models::{
    FormField, Guest, GuestStatus, NewFormField, NewGuest, NewResponse, NewWedding,
    NewWeddingTable, Response, Wedding, WeddingTable,
};

/// In-process [`Repository`] with the same filtering rules as the Postgres one.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    weddings: Vec<Wedding>,
    guests: Vec<Guest>,
    fields: Vec<FormField>,
    responses: Vec<Response>,
    tables: Vec<WeddingTable>,
    next_id: i32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    /// Every guest row, soft-deleted ones included.
    pub fn all_guests(&self) -> &[Guest] {
        &self.guests
    }

    /// Every stored response row.
    pub fn all_responses(&self) -> &[Response] {
        &self.responses
    }
}

#[async_trait]
impl Repository for MemoryStore {
    async fn wedding(&mut self, id: i32) -> QueryResult<Option<Wedding>> {
        Ok(self.weddings.iter().find(|w| w.id == id).cloned())
    }

    async fn insert_wedding(&mut self, new: NewWedding) -> QueryResult<Wedding> {
        let wedding = Wedding {
            id: self.next_id(),
            title: new.title,
            event_date: new.event_date,
            created_at: new.created_at,
        };
        self.weddings.push(wedding.clone());
        Ok(wedding)
    }

    async fn guest_by_token(&mut self, token: &str) -> QueryResult<Option<Guest>> {
        Ok(self
            .guests
            .iter()
            .find(|g| !g.is_deleted() && g.rsvp_token.as_deref() == Some(token))
            .cloned())
    }

    async fn token_exists(&mut self, token: &str) -> QueryResult<bool> {
        Ok(self.guests.iter().any(|g| g.rsvp_token.as_deref() == Some(token)))
    }

    async fn insert_guest(&mut self, new: NewGuest) -> QueryResult<Guest> {
        let guest = Guest {
            id: self.next_id(),
            wedding_id: new.wedding_id,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            status: new.status,
            category: new.category,
            dietary_restrictions: new.dietary_restrictions,
            rsvp_token: new.rsvp_token,
            plus_one_of: new.plus_one_of,
            table_id: None,
            created_at: new.created_at,
            updated_at: None,
            deleted_at: None,
        };
        self.guests.push(guest.clone());
        Ok(guest)
    }

    async fn update_guest(&mut self, guest: &Guest) -> QueryResult<()> {
        if let Some(stored) = self.guests.iter_mut().find(|g| g.id == guest.id) {
            *stored = guest.clone();
        }
        Ok(())
    }

    async fn guests_for_wedding(&mut self, wedding_id: i32) -> QueryResult<Vec<Guest>> {
        let mut guests: Vec<Guest> = self
            .guests
            .iter()
            .filter(|g| g.wedding_id == wedding_id && !g.is_deleted())
            .cloned()
            .collect();
        guests.sort_by(|a, b| {
            (&a.last_name, &a.first_name, a.id).cmp(&(&b.last_name, &b.first_name, b.id))
        });
        Ok(guests)
    }

    async fn guests_by_ids(&mut self, ids: &[i32]) -> QueryResult<Vec<Guest>> {
        Ok(self
            .guests
            .iter()
            .filter(|g| ids.contains(&g.id) && !g.is_deleted())
            .cloned()
            .collect())
    }

    async fn plus_one_of(&mut self, parent_id: i32) -> QueryResult<Option<Guest>> {
        Ok(self
            .guests
            .iter()
            .filter(|g| g.plus_one_of == Some(parent_id))
            .min_by_key(|g| (g.deleted_at.is_some(), Reverse(g.deleted_at), g.id))
            .cloned())
    }

    async fn soft_delete_plus_ones(&mut self, parent_id: i32, now: NaiveDateTime) -> QueryResult<usize> {
        let mut count = 0;
        for g in self
            .guests
            .iter_mut()
            .filter(|g| g.plus_one_of == Some(parent_id) && g.deleted_at.is_none())
        {
            g.status = GuestStatus::Declined;
            g.deleted_at = Some(now);
            g.updated_at = Some(now);
            count += 1;
        }
        Ok(count)
    }

    async fn field(&mut self, id: i32) -> QueryResult<Option<FormField>> {
        Ok(self
            .fields
            .iter()
            .find(|f| f.id == id && f.deleted_at.is_none())
            .cloned())
    }

    async fn fields_for_wedding(&mut self, wedding_id: i32) -> QueryResult<Vec<FormField>> {
        let mut fields: Vec<FormField> = self
            .fields
            .iter()
            .filter(|f| f.wedding_id == wedding_id && f.deleted_at.is_none())
            .cloned()
            .collect();
        fields.sort_by(|a, b| (&a.section, a.position, a.id).cmp(&(&b.section, b.position, b.id)));
        Ok(fields)
    }

    async fn insert_field(&mut self, new: NewFormField) -> QueryResult<FormField> {
        let field = FormField {
            id: self.next_id(),
            wedding_id: new.wedding_id,
            label: new.label,
            field_type: new.field_type,
            required: new.required,
            section: new.section,
            options: new.options,
            position: new.position,
            created_at: new.created_at,
            deleted_at: None,
        };
        self.fields.push(field.clone());
        Ok(field)
    }

    async fn soft_delete_field(&mut self, wedding_id: i32, id: i32, now: NaiveDateTime) -> QueryResult<usize> {
        match self
            .fields
            .iter_mut()
            .find(|f| f.id == id && f.wedding_id == wedding_id && f.deleted_at.is_none())
        {
            Some(field) => {
                field.deleted_at = Some(now);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn responses_for(&mut self, guest_id: i32) -> QueryResult<Vec<(Response, Option<FormField>)>> {
        let pairs = self
            .responses
            .iter()
            .filter(|r| r.guest_id == guest_id)
            .map(|r| {
                let field = self
                    .fields
                    .iter()
                    .find(|f| f.id == r.field_id && f.deleted_at.is_none())
                    .cloned();
                (r.clone(), field)
            })
            .collect();
        Ok(pairs)
    }

    async fn count_responses(&mut self, guest_id: i32) -> QueryResult<i64> {
        Ok(self.responses.iter().filter(|r| r.guest_id == guest_id).count() as i64)
    }

    async fn delete_responses(&mut self, guest_id: i32) -> QueryResult<usize> {
        let before = self.responses.len();
        self.responses.retain(|r| r.guest_id != guest_id);
        Ok(before - self.responses.len())
    }

    async fn insert_responses(&mut self, rows: &[NewResponse]) -> QueryResult<usize> {
        for row in rows {
            let response = Response {
                id: self.next_id(),
                guest_id: row.guest_id,
                field_id: row.field_id,
                value: row.value.clone(),
                created_at: row.created_at,
            };
            self.responses.push(response);
        }
        Ok(rows.len())
    }

    async fn table(&mut self, id: i32) -> QueryResult<Option<WeddingTable>> {
        Ok(self.tables.iter().find(|t| t.id == id).cloned())
    }

    async fn insert_table(&mut self, new: NewWeddingTable) -> QueryResult<WeddingTable> {
        let table = WeddingTable {
            id: self.next_id(),
            wedding_id: new.wedding_id,
            name: new.name,
            capacity: new.capacity,
            created_at: new.created_at,
        };
        self.tables.push(table.clone());
        Ok(table)
    }

    async fn seated_guest_ids(&mut self, table_id: i32) -> QueryResult<Vec<i32>> {
        Ok(self
            .guests
            .iter()
            .filter(|g| g.table_id == Some(table_id) && !g.is_deleted())
            .map(|g| g.id)
            .collect())
    }

    async fn assign_table(&mut self, guest_ids: &[i32], table_id: i32, now: NaiveDateTime) -> QueryResult<usize> {
        let mut count = 0;
        for g in self.guests.iter_mut().filter(|g| guest_ids.contains(&g.id)) {
            g.table_id = Some(table_id);
            g.updated_at = Some(now);
            count += 1;
        }
        Ok(count)
    }
}
