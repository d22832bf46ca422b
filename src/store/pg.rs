use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use diesel::dsl::exists;
use rocket_db_pools::diesel::prelude::*;
use rocket_db_pools::diesel::AsyncPgConnection;

use super::Repository;
use crate::models::{
    FormField, Guest, GuestStatus, NewFormField, NewGuest, NewResponse, NewWedding,
    NewWeddingTable, Response, Wedding, WeddingTable,
};
use crate::schema::{guest, guest_response, wedding, wedding_form_field, wedding_table};

#[async_trait]
impl Repository for AsyncPgConnection {
    async fn wedding(&mut self, id: i32) -> QueryResult<Option<Wedding>> {
        wedding::table
            .find(id)
            .select(Wedding::as_select())
            .first(self)
            .await
            .optional()
    }

    async fn insert_wedding(&mut self, new: NewWedding) -> QueryResult<Wedding> {
        diesel::insert_into(wedding::table)
            .values(&new)
            .returning(Wedding::as_returning())
            .get_result(self)
            .await
    }

    async fn guest_by_token(&mut self, token: &str) -> QueryResult<Option<Guest>> {
        guest::table
            .filter(guest::rsvp_token.eq(token))
            .filter(guest::deleted_at.is_null())
            .select(Guest::as_select())
            .first(self)
            .await
            .optional()
    }

    async fn token_exists(&mut self, token: &str) -> QueryResult<bool> {
        diesel::select(exists(guest::table.filter(guest::rsvp_token.eq(token))))
            .get_result(self)
            .await
    }

    async fn insert_guest(&mut self, new: NewGuest) -> QueryResult<Guest> {
        diesel::insert_into(guest::table)
            .values(&new)
            .returning(Guest::as_returning())
            .get_result(self)
            .await
    }

    async fn update_guest(&mut self, g: &Guest) -> QueryResult<()> {
        diesel::update(guest::table.find(g.id))
            .set(g)
            .execute(self)
            .await
            .map(|_| ())
    }

    async fn guests_for_wedding(&mut self, wedding_id: i32) -> QueryResult<Vec<Guest>> {
        guest::table
            .filter(guest::wedding_id.eq(wedding_id))
            .filter(guest::deleted_at.is_null())
            .order((guest::last_name, guest::first_name, guest::id))
            .select(Guest::as_select())
            .load(self)
            .await
    }

    async fn guests_by_ids(&mut self, ids: &[i32]) -> QueryResult<Vec<Guest>> {
        guest::table
            .filter(guest::id.eq_any(ids.to_vec()))
            .filter(guest::deleted_at.is_null())
            .select(Guest::as_select())
            .load(self)
            .await
    }

    async fn plus_one_of(&mut self, parent_id: i32) -> QueryResult<Option<Guest>> {
        // NULLs sort first under DESC, so a live row wins over withdrawn ones
        guest::table
            .filter(guest::plus_one_of.eq(parent_id))
            .order((guest::deleted_at.desc(), guest::id.asc()))
            .select(Guest::as_select())
            .first(self)
            .await
            .optional()
    }

    async fn soft_delete_plus_ones(&mut self, parent_id: i32, now: NaiveDateTime) -> QueryResult<usize> {
        diesel::update(
            guest::table
                .filter(guest::plus_one_of.eq(parent_id))
                .filter(guest::deleted_at.is_null()),
        )
        .set((
            guest::status.eq(GuestStatus::Declined),
            guest::deleted_at.eq(Some(now)),
            guest::updated_at.eq(Some(now)),
        ))
        .execute(self)
        .await
    }

    async fn field(&mut self, id: i32) -> QueryResult<Option<FormField>> {
        wedding_form_field::table
            .find(id)
            .filter(wedding_form_field::deleted_at.is_null())
            .select(FormField::as_select())
            .first(self)
            .await
            .optional()
    }

    async fn fields_for_wedding(&mut self, wedding_id: i32) -> QueryResult<Vec<FormField>> {
        wedding_form_field::table
            .filter(wedding_form_field::wedding_id.eq(wedding_id))
            .filter(wedding_form_field::deleted_at.is_null())
            .order((
                wedding_form_field::section,
                wedding_form_field::position,
                wedding_form_field::id,
            ))
            .select(FormField::as_select())
            .load(self)
            .await
    }

    async fn insert_field(&mut self, new: NewFormField) -> QueryResult<FormField> {
        diesel::insert_into(wedding_form_field::table)
            .values(&new)
            .returning(FormField::as_returning())
            .get_result(self)
            .await
    }

    async fn soft_delete_field(&mut self, wedding_id: i32, id: i32, now: NaiveDateTime) -> QueryResult<usize> {
        diesel::update(
            wedding_form_field::table
                .filter(wedding_form_field::id.eq(id))
                .filter(wedding_form_field::wedding_id.eq(wedding_id))
                .filter(wedding_form_field::deleted_at.is_null()),
        )
        .set(wedding_form_field::deleted_at.eq(Some(now)))
        .execute(self)
        .await
    }

    async fn responses_for(&mut self, guest_id: i32) -> QueryResult<Vec<(Response, Option<FormField>)>> {
        let responses: Vec<Response> = guest_response::table
            .filter(guest_response::guest_id.eq(guest_id))
            .order(guest_response::id)
            .select(Response::as_select())
            .load(self)
            .await?;

        let field_ids: Vec<i32> = responses.iter().map(|r| r.field_id).collect();
        let fields: HashMap<i32, FormField> = wedding_form_field::table
            .filter(wedding_form_field::id.eq_any(field_ids))
            .filter(wedding_form_field::deleted_at.is_null())
            .select(FormField::as_select())
            .load(self)
            .await?
            .into_iter()
            .map(|f| (f.id, f))
            .collect();

        Ok(responses
            .into_iter()
            .map(|r| {
                let field = fields.get(&r.field_id).cloned();
                (r, field)
            })
            .collect())
    }

    async fn count_responses(&mut self, guest_id: i32) -> QueryResult<i64> {
        guest_response::table
            .filter(guest_response::guest_id.eq(guest_id))
            .count()
            .get_result(self)
            .await
    }

    async fn delete_responses(&mut self, guest_id: i32) -> QueryResult<usize> {
        diesel::delete(guest_response::table.filter(guest_response::guest_id.eq(guest_id)))
            .execute(self)
            .await
    }

    async fn insert_responses(&mut self, rows: &[NewResponse]) -> QueryResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        diesel::insert_into(guest_response::table)
            .values(rows)
            .execute(self)
            .await
    }

    async fn table(&mut self, id: i32) -> QueryResult<Option<WeddingTable>> {
        wedding_table::table
            .find(id)
            .select(WeddingTable::as_select())
            .first(self)
            .await
            .optional()
    }

    async fn insert_table(&mut self, new: NewWeddingTable) -> QueryResult<WeddingTable> {
        diesel::insert_into(wedding_table::table)
            .values(&new)
            .returning(WeddingTable::as_returning())
            .get_result(self)
            .await
    }

    async fn seated_guest_ids(&mut self, table_id: i32) -> QueryResult<Vec<i32>> {
        guest::table
            .filter(guest::table_id.eq(table_id))
            .filter(guest::deleted_at.is_null())
            .select(guest::id)
            .load(self)
            .await
    }

    async fn assign_table(&mut self, guest_ids: &[i32], table_id: i32, now: NaiveDateTime) -> QueryResult<usize> {
        diesel::update(guest::table.filter(guest::id.eq_any(guest_ids.to_vec())))
            .set((guest::table_id.eq(Some(table_id)), guest::updated_at.eq(Some(now))))
            .execute(self)
            .await
    }
}
