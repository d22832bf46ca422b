use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use subtle::ConstantTimeEq;

use crate::config::AppConfig;
use crate::error::AppError;

pub const ADMIN_HEADER: &str = "X-Admin-Token";

/// Request guard for administrative routes.
///
/// A missing header is a 401, a wrong one a 403. An empty configured token
/// rejects everything.
#[derive(Debug)]
pub struct Admin;

fn tokens_match(given: &str, expected: &str) -> bool {
    !expected.is_empty() && bool::from(given.as_bytes().ct_eq(expected.as_bytes()))
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Admin {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let Some(config) = req.rocket().state::<AppConfig>() else {
            return Outcome::Error((
                Status::InternalServerError,
                AppError::Internal("configuration not loaded".into()),
            ));
        };

        match req.headers().get_one(ADMIN_HEADER) {
            None => Outcome::Error((Status::Unauthorized, AppError::Unauthorized)),
            Some(given) if tokens_match(given, &config.admin_token) => Outcome::Success(Admin),
            Some(_) => Outcome::Error((Status::Forbidden, AppError::Forbidden)),
        }
    }
}

#[cfg(test)]
mod tests {
    use rocket::http::Header;
    use rocket::local::blocking::Client;
    use rocket::{get, routes};

    use super::*;
    use crate::config::ThrottleConfig;

    #[get("/secret")]
    fn secret(_admin: Admin) -> &'static str {
        "ok"
    }

    fn client(token: &str) -> Client {
        let config = AppConfig {
            admin_token: token.to_string(),
            throttle: ThrottleConfig::default(),
            notify: None,
        };
        let rocket = rocket::build()
            .manage(config)
            .mount("/", routes![secret])
            .register("/", crate::catchers());
        Client::tracked(rocket).unwrap()
    }

    #[test]
    fn token_comparison() {
        assert!(tokens_match("letmein", "letmein"));
        assert!(!tokens_match("letmei", "letmein"));
        assert!(!tokens_match("letmein!", "letmein"));
        assert!(!tokens_match("letmeout", "letmein"));
        assert!(!tokens_match("", ""));
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let client = client("letmein");
        assert_eq!(client.get("/secret").dispatch().status(), Status::Unauthorized);
    }

    #[test]
    fn wrong_token_is_forbidden() {
        let client = client("letmein");
        let response = client.get("/secret").header(Header::new(ADMIN_HEADER, "guess")).dispatch();
        assert_eq!(response.status(), Status::Forbidden);
    }

    #[test]
    fn matching_token_passes() {
        let client = client("letmein");
        let response = client.get("/secret").header(Header::new(ADMIN_HEADER, "letmein")).dispatch();
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_string().unwrap(), "ok");
    }

    #[test]
    fn empty_configured_token_rejects_everything() {
        let client = client("");
        let response = client.get("/secret").header(Header::new(ADMIN_HEADER, "")).dispatch();
        assert_eq!(response.status(), Status::Forbidden);
    }
}
