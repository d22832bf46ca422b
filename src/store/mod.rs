//! Persistence seam for guests, weddings, form fields, responses and seating.
//!
//! Every read path skips soft-deleted rows except [`Repository::plus_one_of`],
//! which has to see withdrawn plus-ones so they can be revived.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use diesel::QueryResult;

use crate::models::{
    FormField, Guest, NewFormField, NewGuest, NewResponse, NewWedding, NewWeddingTable, Response,
    Wedding, WeddingTable,
};

mod memory;
mod pg;

pub use memory::MemoryStore;

#[async_trait]
pub trait Repository: Send {
    /// find a wedding by id
    async fn wedding(&mut self, id: i32) -> QueryResult<Option<Wedding>>;
    async fn insert_wedding(&mut self, new: NewWedding) -> QueryResult<Wedding>;

    /// resolve a live guest by RSVP token
    async fn guest_by_token(&mut self, token: &str) -> QueryResult<Option<Guest>>;
    /// whether any guest row, live or not, already holds this token
    async fn token_exists(&mut self, token: &str) -> QueryResult<bool>;
    async fn insert_guest(&mut self, new: NewGuest) -> QueryResult<Guest>;
    /// write every column of the guest back
    async fn update_guest(&mut self, guest: &Guest) -> QueryResult<()>;
    /// live guests of a wedding ordered by last name, then first name
    async fn guests_for_wedding(&mut self, wedding_id: i32) -> QueryResult<Vec<Guest>>;
    /// live guests among `ids`
    async fn guests_by_ids(&mut self, ids: &[i32]) -> QueryResult<Vec<Guest>>;
    /// the dependent of `parent_id`: a live one if any, else the most recently withdrawn
    async fn plus_one_of(&mut self, parent_id: i32) -> QueryResult<Option<Guest>>;
    /// decline and soft-delete every live dependent of `parent_id`
    async fn soft_delete_plus_ones(&mut self, parent_id: i32, now: NaiveDateTime) -> QueryResult<usize>;

    /// find a live form field
    async fn field(&mut self, id: i32) -> QueryResult<Option<FormField>>;
    /// live fields of a wedding ordered by section, position and id
    async fn fields_for_wedding(&mut self, wedding_id: i32) -> QueryResult<Vec<FormField>>;
    async fn insert_field(&mut self, new: NewFormField) -> QueryResult<FormField>;
    async fn soft_delete_field(&mut self, wedding_id: i32, id: i32, now: NaiveDateTime) -> QueryResult<usize>;

    /// responses of a guest, each paired with its field unless that field was soft-deleted
    async fn responses_for(&mut self, guest_id: i32) -> QueryResult<Vec<(Response, Option<FormField>)>>;
    async fn count_responses(&mut self, guest_id: i32) -> QueryResult<i64>;
    async fn delete_responses(&mut self, guest_id: i32) -> QueryResult<usize>;
    async fn insert_responses(&mut self, rows: &[NewResponse]) -> QueryResult<usize>;

    async fn table(&mut self, id: i32) -> QueryResult<Option<WeddingTable>>;
    async fn insert_table(&mut self, new: NewWeddingTable) -> QueryResult<WeddingTable>;
    /// ids of live guests seated at a table
    async fn seated_guest_ids(&mut self, table_id: i32) -> QueryResult<Vec<i32>>;
    async fn assign_table(&mut self, guest_ids: &[i32], table_id: i32, now: NaiveDateTime) -> QueryResult<usize>;
}
