//! # Redis counters against token guessing and submission spam
//!
//! - `rsvp:fail:<client>`: failed token lookups per client, IPv6 clients
//!   grouped by /64
//! - `rsvp:submit:<token>`: submissions per invitation
//!
//! Both keys expire after the configured window. Redis errors fail open.
use std::net::IpAddr;

use rocket_db_pools::deadpool_redis::redis::{self, AsyncCommands, RedisResult};
use rocket_db_pools::Connection;
use tracing::warn;

use crate::config::ThrottleConfig;
use crate::error::AppError;
use crate::Redis;

/// Counter key for a client address.
pub fn client_key(client_ip: Option<IpAddr>) -> String {
    match client_ip {
        Some(IpAddr::V4(ip4)) => ip4.to_string(),
        Some(IpAddr::V6(ip6)) => {
            let ipb = ip6.segments();
            format!("{:04x}:{:04x}:{:04x}:{:04x}::/64", ipb[0], ipb[1], ipb[2], ipb[3])
        }
        None => "unknown".to_string(),
    }
}

fn failure_key(client: &str) -> String {
    format!("rsvp:fail:{client}")
}

fn submission_key(token: &str) -> String {
    format!("rsvp:submit:{token}")
}

async fn bump(r: &mut Connection<Redis>, key: &str, window_secs: i64) -> RedisResult<i64> {
    let count: i64 = r.incr(key, 1).await?;
    if count == 1 {
        redis::cmd("EXPIRE")
            .arg(key)
            .arg(window_secs)
            .query_async::<_, ()>(&mut **r)
            .await?;
    }
    Ok(count)
}

/// A client is banned once its failures reach the limit.
pub fn is_banned(failures: i64, config: &ThrottleConfig) -> bool {
    failures >= config.max_failures
}

/// A token may be submitted `max_submissions` times per window.
pub fn over_limit(submissions: i64, config: &ThrottleConfig) -> bool {
    submissions > config.max_submissions
}

/// Only an unknown token counts against the client.
pub fn counts_as_failure<T>(result: &Result<T, AppError>) -> bool {
    matches!(result, Err(AppError::NotFound("guest")))
}

/// Rejects clients that already failed too many token lookups.
pub async fn ensure_not_banned(
    r: &mut Connection<Redis>,
    client: &str,
    config: &ThrottleConfig,
) -> Result<(), AppError> {
    let failures: RedisResult<Option<i64>> = r.get(failure_key(client)).await;
    match failures {
        Ok(Some(f)) if is_banned(f, config) => {
            warn!(client, failures = f, "client banned");
            Err(AppError::TooManyRequests)
        }
        Ok(_) => Ok(()),
        Err(e) => {
            warn!("failure counter unavailable: {e}");
            Ok(())
        }
    }
}

pub async fn record_failure(r: &mut Connection<Redis>, client: &str, config: &ThrottleConfig) {
    match bump(r, &failure_key(client), config.window_secs).await {
        Ok(count) => warn!(client, failures = count, "unknown rsvp token"),
        Err(e) => warn!("could not record failed lookup: {e}"),
    }
}

/// Counts a submission against its token, rejecting it past the limit.
pub async fn count_submission(
    r: &mut Connection<Redis>,
    token: &str,
    config: &ThrottleConfig,
) -> Result<(), AppError> {
    match bump(r, &submission_key(token), config.window_secs).await {
        Ok(count) if over_limit(count, config) => {
            warn!(submissions = count, "rsvp submission limit reached");
            Err(AppError::TooManyRequests)
        }
        Ok(_) => Ok(()),
        Err(e) => {
            warn!("submission counter unavailable: {e}");
            Ok(())
        }
    }
}

/// Records a failed lookup when `result` is a missing guest, then passes it through.
pub async fn observe<T>(
    r: &mut Connection<Redis>,
    client: &str,
    config: &ThrottleConfig,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    if counts_as_failure(&result) {
        record_failure(r, client, config).await;
    }
    result
}
