use chrono::{NaiveDate, NaiveDateTime};
use wedding_rsvp::error::AppError;
use wedding_rsvp::fields::{self, FieldInput};
use wedding_rsvp::guests::{self, GuestInput, WeddingInput, TOKEN_LENGTH};
use wedding_rsvp::models::{Guest, GuestStatus, WeddingTable};
use wedding_rsvp::rsvp::{self, PlusOneInput, RsvpSubmission};
use wedding_rsvp::seating::{self, TableInput};
use wedding_rsvp::store::{MemoryStore, Repository};

fn at(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 1)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

async fn wedding(store: &mut MemoryStore, title: &str) -> i32 {
    guests::create_wedding(
        store,
        WeddingInput {
            title: title.into(),
            event_date: NaiveDate::from_ymd_opt(2025, 9, 20),
        },
        at(0),
    )
    .await
    .unwrap()
    .id
}

async fn guest(store: &mut MemoryStore, wedding_id: i32, first: &str, last: &str) -> Guest {
    guests::create_guest(
        store,
        wedding_id,
        GuestInput {
            first_name: first.into(),
            last_name: last.into(),
            email: None,
            category: None,
        },
        at(0),
    )
    .await
    .unwrap()
}

async fn table(store: &mut MemoryStore, wedding_id: i32, capacity: i32) -> WeddingTable {
    let input = TableInput {
        name: " Table 1 ".into(),
        capacity,
    };
    seating::create_table(store, wedding_id, input, at(0)).await.unwrap()
}

#[rocket::async_test]
async fn created_guest_gets_a_pending_token() {
    let mut store = MemoryStore::new();
    let wedding_id = wedding(&mut store, "Ada & Charles").await;
    let ada = guest(&mut store, wedding_id, " Ada ", "Lovelace").await;

    assert_eq!(ada.first_name, "Ada");
    assert_eq!(ada.status, GuestStatus::Pending);
    let token = ada.rsvp_token.clone().unwrap();
    assert_eq!(token.len(), TOKEN_LENGTH);

    let found = store.guest_by_token(&token).await.unwrap().unwrap();
    assert_eq!(found.id, ada.id);
}

#[rocket::async_test]
async fn guest_for_missing_wedding_is_not_found() {
    let mut store = MemoryStore::new();
    let input = GuestInput {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: None,
        category: None,
    };
    let err = guests::create_guest(&mut store, 42, input, at(0)).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound("wedding")));
}

#[rocket::async_test]
async fn summary_groups_guests_and_counts_plus_ones() {
    let mut store = MemoryStore::new();
    let wedding_id = wedding(&mut store, "Ada & Charles").await;
    let ada = guest(&mut store, wedding_id, "Ada", "Lovelace").await;
    let alan = guest(&mut store, wedding_id, "Alan", "Turing").await;
    guest(&mut store, wedding_id, "Grace", "Hopper").await;

    let with_plus_one = RsvpSubmission {
        attending: true,
        responses: vec![],
        plus_one: Some(PlusOneInput {
            first_name: "Charles".into(),
            last_name: "Babbage".into(),
            email: None,
            attending: true,
            dietary_restrictions: None,
            responses: vec![],
        }),
        dietary_restrictions: None,
    };
    rsvp::submit(&mut store, ada.rsvp_token.as_deref().unwrap(), with_plus_one, at(1))
        .await
        .unwrap();
    let decline = RsvpSubmission {
        attending: false,
        responses: vec![],
        plus_one: None,
        dietary_restrictions: None,
    };
    rsvp::submit(&mut store, alan.rsvp_token.as_deref().unwrap(), decline, at(1))
        .await
        .unwrap();

    let summary = guests::summary(&mut store, wedding_id).await.unwrap();
    assert_eq!(summary.attending.len(), 1);
    assert_eq!(summary.attending[0].plus_one.as_deref(), Some("Charles Babbage"));
    assert_eq!(summary.declined.len(), 1);
    assert_eq!(summary.pending.len(), 1);
    assert_eq!(summary.pending[0].first_name, "Grace");
    assert_eq!(summary.plus_one_count, 1);
}

#[rocket::async_test]
async fn field_lifecycle() {
    let mut store = MemoryStore::new();
    let wedding_id = wedding(&mut store, "Ada & Charles").await;
    let input = FieldInput {
        label: "Meal".into(),
        field_type: "select".into(),
        required: true,
        section: "general".into(),
        options: vec!["chicken".into(), " ".into(), "fish".into()],
        position: 1,
    };
    let field = fields::create(&mut store, wedding_id, input, at(0)).await.unwrap();
    assert_eq!(field.options, vec!["chicken", "fish"]);

    fields::remove(&mut store, wedding_id, field.id, at(1)).await.unwrap();
    let again = fields::remove(&mut store, wedding_id, field.id, at(2)).await;
    assert!(matches!(again, Err(AppError::NotFound("form field"))));
}

#[rocket::async_test]
async fn assignment_within_capacity_is_written() {
    let mut store = MemoryStore::new();
    let wedding_id = wedding(&mut store, "Ada & Charles").await;
    let t = table(&mut store, wedding_id, 2).await;
    let ada = guest(&mut store, wedding_id, "Ada", "Lovelace").await;
    let alan = guest(&mut store, wedding_id, "Alan", "Turing").await;

    let report = seating::assign(&mut store, wedding_id, t.id, &[ada.id, alan.id], at(1))
        .await
        .unwrap();
    assert!(report.fits);
    assert_eq!(report.resulting, 2);
    assert_eq!(store.seated_guest_ids(t.id).await.unwrap().len(), 2);

    // already seated guests are not counted twice
    let report = seating::assign(&mut store, wedding_id, t.id, &[ada.id], at(2))
        .await
        .unwrap();
    assert_eq!(report.requested, 0);
    assert_eq!(report.resulting, 2);
}

#[rocket::async_test]
async fn assignment_over_capacity_writes_nothing() {
    let mut store = MemoryStore::new();
    let wedding_id = wedding(&mut store, "Ada & Charles").await;
    let t = table(&mut store, wedding_id, 1).await;
    let ada = guest(&mut store, wedding_id, "Ada", "Lovelace").await;
    let alan = guest(&mut store, wedding_id, "Alan", "Turing").await;

    let err = seating::assign(&mut store, wedding_id, t.id, &[ada.id, alan.id], at(1))
        .await
        .unwrap_err();
    match err {
        AppError::Validation(messages) => assert!(messages[0].contains("seats 1")),
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert!(store.seated_guest_ids(t.id).await.unwrap().is_empty());
}

#[rocket::async_test]
async fn dry_run_reports_overflow_without_writing() {
    let mut store = MemoryStore::new();
    let wedding_id = wedding(&mut store, "Ada & Charles").await;
    let t = table(&mut store, wedding_id, 2).await;
    let ada = guest(&mut store, wedding_id, "Ada", "Lovelace").await;
    let alan = guest(&mut store, wedding_id, "Alan", "Turing").await;
    let grace = guest(&mut store, wedding_id, "Grace", "Hopper").await;
    seating::assign(&mut store, wedding_id, t.id, &[ada.id], at(1)).await.unwrap();

    let report = seating::validate(&mut store, wedding_id, t.id, &[alan.id, grace.id])
        .await
        .unwrap();
    assert_eq!(report.seated, 1);
    assert_eq!(report.requested, 2);
    assert_eq!(report.resulting, 3);
    assert_eq!(report.overflow, 1);
    assert!(!report.fits);
    assert_eq!(store.seated_guest_ids(t.id).await.unwrap(), vec![ada.id]);
}

#[rocket::async_test]
async fn guests_of_another_wedding_cannot_be_seated() {
    let mut store = MemoryStore::new();
    let ours = wedding(&mut store, "Ada & Charles").await;
    let theirs = wedding(&mut store, "Someone else").await;
    let t = table(&mut store, ours, 10).await;
    let stranger = guest(&mut store, theirs, "Grace", "Hopper").await;

    let report = seating::validate(&mut store, ours, t.id, &[stranger.id, 777])
        .await
        .unwrap();
    assert!(!report.fits);
    assert_eq!(report.errors.len(), 2);

    let err = seating::assign(&mut store, ours, t.id, &[stranger.id], at(1)).await;
    assert!(matches!(err, Err(AppError::Validation(_))));

    let wrong_wedding = seating::validate(&mut store, theirs, t.id, &[]).await;
    assert!(matches!(wrong_wedding, Err(AppError::NotFound("table"))));
}

#[rocket::async_test]
async fn created_table_belongs_to_its_wedding() {
    let mut store = MemoryStore::new();
    let wedding_id = wedding(&mut store, "Ada & Charles").await;
    let t = table(&mut store, wedding_id, 8).await;

    assert_eq!(t.name, "Table 1");
    assert_eq!(t.capacity, 8);
    assert_eq!(store.table(t.id).await.unwrap(), Some(t));
}

#[rocket::async_test]
async fn table_input_is_checked() {
    let mut store = MemoryStore::new();
    let wedding_id = wedding(&mut store, "Ada & Charles").await;

    let bad = TableInput {
        name: "  ".into(),
        capacity: 0,
    };
    match seating::create_table(&mut store, wedding_id, bad, at(1)).await {
        Err(AppError::Validation(messages)) => assert_eq!(messages.len(), 2),
        other => panic!("expected validation failure, got {other:?}"),
    }

    let orphan = TableInput {
        name: "Table 9".into(),
        capacity: 4,
    };
    let err = seating::create_table(&mut store, 42, orphan, at(1)).await;
    assert!(matches!(err, Err(AppError::NotFound("wedding"))));
}
