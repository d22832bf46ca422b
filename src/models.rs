use std::fmt;
use std::io::Write;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};

use super::schema::{guest, guest_response, wedding, wedding_form_field, wedding_table};

/// Attendance state of a guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum GuestStatus {
    Pending,
    Confirmed,
    Declined,
}

impl GuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuestStatus::Pending => "pending",
            GuestStatus::Confirmed => "confirmed",
            GuestStatus::Declined => "declined",
        }
    }

    pub fn from_attending(attending: bool) -> Self {
        if attending {
            GuestStatus::Confirmed
        } else {
            GuestStatus::Declined
        }
    }
}

impl fmt::Display for GuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GuestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(GuestStatus::Pending),
            "confirmed" => Ok(GuestStatus::Confirmed),
            "declined" => Ok(GuestStatus::Declined),
            other => Err(format!("unknown guest status `{other}`")),
        }
    }
}

impl ToSql<Text, Pg> for GuestStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for GuestStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let raw = std::str::from_utf8(bytes.as_bytes())?;
        raw.parse().map_err(Into::into)
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = wedding)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Wedding {
    pub id: i32,
    pub title: String,
    pub event_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = wedding)]
pub struct NewWedding {
    pub title: String,
    pub event_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

/// A guest row. Rows with `plus_one_of` set are dependents of another guest.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, AsChangeset)]
#[diesel(table_name = guest)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct Guest {
    pub id: i32,
    pub wedding_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub status: GuestStatus,
    pub category: Option<String>,
    pub dietary_restrictions: Option<String>,
    pub rsvp_token: Option<String>,
    pub plus_one_of: Option<i32>,
    pub table_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
    pub deleted_at: Option<NaiveDateTime>,
}

impl Guest {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_plus_one(&self) -> bool {
        self.plus_one_of.is_some()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = guest)]
pub struct NewGuest {
    pub wedding_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub status: GuestStatus,
    pub category: Option<String>,
    pub dietary_restrictions: Option<String>,
    pub rsvp_token: Option<String>,
    pub plus_one_of: Option<i32>,
    pub created_at: NaiveDateTime,
}

/// A wedding-scoped RSVP question.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = wedding_form_field)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FormField {
    pub id: i32,
    pub wedding_id: i32,
    pub label: String,
    pub field_type: String,
    pub required: bool,
    pub section: String,
    pub options: Vec<String>,
    pub position: i32,
    pub created_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = wedding_form_field)]
pub struct NewFormField {
    pub wedding_id: i32,
    pub label: String,
    pub field_type: String,
    pub required: bool,
    pub section: String,
    pub options: Vec<String>,
    pub position: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = guest_response)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Response {
    pub id: i32,
    pub guest_id: i32,
    pub field_id: i32,
    pub value: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = guest_response)]
pub struct NewResponse {
    pub guest_id: i32,
    pub field_id: i32,
    pub value: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = wedding_table)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct WeddingTable {
    pub id: i32,
    pub wedding_id: i32,
    pub name: String,
    pub capacity: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = wedding_table)]
pub struct NewWeddingTable {
    pub wedding_id: i32,
    pub name: String,
    pub capacity: i32,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_attendance() {
        assert_eq!(GuestStatus::from_attending(true), GuestStatus::Confirmed);
        assert_eq!(GuestStatus::from_attending(false), GuestStatus::Declined);
    }

    #[test]
    fn status_parses_stored_text() {
        assert_eq!("declined".parse::<GuestStatus>(), Ok(GuestStatus::Declined));
        assert!("maybe".parse::<GuestStatus>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&GuestStatus::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");
    }
}
