//! Public RSVP routes, reached with the token printed on an invitation.
use std::net::IpAddr;

use rocket::serde::json::{self, Json};
use rocket::{get, post, routes, Route, State};
use rocket_db_pools::diesel::scoped_futures::ScopedFutureExt;
use rocket_db_pools::diesel::{AsyncConnection, AsyncPgConnection};
use rocket_db_pools::Connection;
use tracing::error;

use super::now;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::notify::Notifier;
use crate::rsvp::{self, normalize_token, FieldView, GuestView, RsvpSubmission, SubmitOutcome, SubmitReply};
use crate::{throttle, Db, Redis};

pub fn routes() -> Vec<Route> {
    routes![guest, fields, submit]
}

#[get("/rsvp/<token>/guest")]
async fn guest(
    token: &str,
    mut db: Connection<Db>,
    mut r: Connection<Redis>,
    client_ip: Option<IpAddr>,
    config: &State<AppConfig>,
) -> Result<Json<GuestView>, AppError> {
    let client = throttle::client_key(client_ip);
    throttle::ensure_not_banned(&mut r, &client, &config.throttle).await?;

    let token = normalize_token(token);
    let view = rsvp::guest_view(&mut **db, &token).await;
    throttle::observe(&mut r, &client, &config.throttle, view)
        .await
        .map(Json)
}

#[get("/rsvp/<token>/fields")]
async fn fields(
    token: &str,
    mut db: Connection<Db>,
    mut r: Connection<Redis>,
    client_ip: Option<IpAddr>,
    config: &State<AppConfig>,
) -> Result<Json<Vec<FieldView>>, AppError> {
    let client = throttle::client_key(client_ip);
    throttle::ensure_not_banned(&mut r, &client, &config.throttle).await?;

    let token = normalize_token(token);
    let fields = rsvp::fields(&mut **db, &token).await;
    throttle::observe(&mut r, &client, &config.throttle, fields)
        .await
        .map(Json)
}

#[post("/rsvp/<token>", data = "<submission>")]
async fn submit(
    token: &str,
    submission: Result<Json<RsvpSubmission>, json::Error<'_>>,
    mut db: Connection<Db>,
    mut r: Connection<Redis>,
    client_ip: Option<IpAddr>,
    config: &State<AppConfig>,
    notifier: &State<Notifier>,
) -> Result<Json<SubmitReply>, AppError> {
    let submission = submission?.into_inner();
    let client = throttle::client_key(client_ip);
    throttle::ensure_not_banned(&mut r, &client, &config.throttle).await?;

    let token = normalize_token(token);
    throttle::count_submission(&mut r, &token, &config.throttle).await?;

    let at = now();
    let token_ref = token.as_str();
    let conn: &mut AsyncPgConnection = &mut db;
    let result: Result<SubmitOutcome, AppError> = conn
        .transaction(|conn| async move { rsvp::submit(conn, token_ref, submission, at).await }.scope_boxed())
        .await;

    let outcome = match throttle::observe(&mut r, &client, &config.throttle, result).await {
        Ok(outcome) => outcome,
        Err(e @ AppError::Database(_)) => {
            error!(error = ?e, "rsvp submission rolled back");
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    notifier.notify(&outcome.notice()).await;
    Ok(Json(SubmitReply::from(&outcome)))
}
