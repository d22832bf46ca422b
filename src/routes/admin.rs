use rocket::http::Status;
use rocket::response::status::Created;
use rocket::serde::json::{self, Json};
use rocket::{delete, get, post, put, routes, Route};
use rocket_db_pools::Connection;

use super::now;
use crate::auth::Admin;
use crate::error::AppError;
use crate::fields::{self, FieldInput};
use crate::guests::{self, GuestInput, GuestListing, GuestSummary, WeddingInput};
use crate::models::{Wedding, WeddingTable};
use crate::rsvp::FieldView;
use crate::seating::{self, CapacityReport, SeatingRequest, TableInput};
use crate::Db;

pub fn routes() -> Vec<Route> {
    routes![
        create_wedding,
        create_guest,
        list_guests,
        create_field,
        delete_field,
        create_table,
        assign_table,
        validate_table
    ]
}

#[post("/weddings", data = "<input>")]
async fn create_wedding(
    _admin: Admin,
    input: Result<Json<WeddingInput>, json::Error<'_>>,
    mut db: Connection<Db>,
) -> Result<Created<Json<Wedding>>, AppError> {
    let wedding = guests::create_wedding(&mut **db, input?.into_inner(), now()).await?;
    let location = format!("/api/weddings/{}", wedding.id);
    Ok(Created::new(location).body(Json(wedding)))
}

#[post("/weddings/<wedding_id>/guests", data = "<input>")]
async fn create_guest(
    _admin: Admin,
    wedding_id: i32,
    input: Result<Json<GuestInput>, json::Error<'_>>,
    mut db: Connection<Db>,
) -> Result<Created<Json<GuestListing>>, AppError> {
    let guest = guests::create_guest(&mut **db, wedding_id, input?.into_inner(), now()).await?;
    let location = format!("/api/weddings/{wedding_id}/guests/{}", guest.id);
    Ok(Created::new(location).body(Json(GuestListing::from(&guest))))
}

#[get("/weddings/<wedding_id>/guests")]
async fn list_guests(_admin: Admin, wedding_id: i32, mut db: Connection<Db>) -> Result<Json<GuestSummary>, AppError> {
    guests::summary(&mut **db, wedding_id).await.map(Json)
}

#[post("/weddings/<wedding_id>/fields", data = "<input>")]
async fn create_field(
    _admin: Admin,
    wedding_id: i32,
    input: Result<Json<FieldInput>, json::Error<'_>>,
    mut db: Connection<Db>,
) -> Result<Created<Json<FieldView>>, AppError> {
    let field = fields::create(&mut **db, wedding_id, input?.into_inner(), now()).await?;
    let location = format!("/api/weddings/{wedding_id}/fields/{}", field.id);
    Ok(Created::new(location).body(Json(field)))
}

#[delete("/weddings/<wedding_id>/fields/<field_id>")]
async fn delete_field(
    _admin: Admin,
    wedding_id: i32,
    field_id: i32,
    mut db: Connection<Db>,
) -> Result<Status, AppError> {
    fields::remove(&mut **db, wedding_id, field_id, now()).await?;
    Ok(Status::NoContent)
}

#[post("/weddings/<wedding_id>/tables", data = "<input>")]
async fn create_table(
    _admin: Admin,
    wedding_id: i32,
    input: Result<Json<TableInput>, json::Error<'_>>,
    mut db: Connection<Db>,
) -> Result<Created<Json<WeddingTable>>, AppError> {
    let table = seating::create_table(&mut **db, wedding_id, input?.into_inner(), now()).await?;
    let location = format!("/api/weddings/{wedding_id}/tables/{}", table.id);
    Ok(Created::new(location).body(Json(table)))
}

#[put("/weddings/<wedding_id>/tables/<table_id>/guests", data = "<request>")]
async fn assign_table(
    _admin: Admin,
    wedding_id: i32,
    table_id: i32,
    request: Result<Json<SeatingRequest>, json::Error<'_>>,
    mut db: Connection<Db>,
) -> Result<Json<CapacityReport>, AppError> {
    let request = request?.into_inner();
    seating::assign(&mut **db, wedding_id, table_id, &request.guest_ids, now())
        .await
        .map(Json)
}

#[post("/weddings/<wedding_id>/tables/<table_id>/validate", data = "<request>")]
async fn validate_table(
    _admin: Admin,
    wedding_id: i32,
    table_id: i32,
    request: Result<Json<SeatingRequest>, json::Error<'_>>,
    mut db: Connection<Db>,
) -> Result<Json<CapacityReport>, AppError> {
    let request = request?.into_inner();
    seating::validate(&mut **db, wedding_id, table_id, &request.guest_ids)
        .await
        .map(Json)
}
