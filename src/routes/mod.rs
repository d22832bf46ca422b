pub mod admin;
pub mod rsvp;

use chrono::{NaiveDateTime, Utc};

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}
