use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::{self, Json};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("validation failed")]
    Validation(Vec<String>),

    #[error("missing admin token")]
    Unauthorized,

    #[error("admin token rejected")]
    Forbidden,

    #[error("too many requests")]
    TooManyRequests,

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }

    pub fn status(&self) -> Status {
        match self {
            AppError::NotFound(_) => Status::NotFound,
            AppError::Validation(_) => Status::BadRequest,
            AppError::Unauthorized => Status::Unauthorized,
            AppError::Forbidden => Status::Forbidden,
            AppError::TooManyRequests => Status::TooManyRequests,
            AppError::Database(_) | AppError::Internal(_) => Status::InternalServerError,
        }
    }
}

impl From<json::Error<'_>> for AppError {
    fn from(e: json::Error<'_>) -> Self {
        match e {
            json::Error::Io(e) => AppError::invalid(format!("unreadable body: {e}")),
            json::Error::Parse(_, e) => AppError::invalid(format!("malformed payload: {e}")),
        }
    }
}

/// JSON body of every error reply.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub messages: Vec<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            messages: Vec::new(),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for AppError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        if status.code >= 500 {
            error!(error = ?self, uri = %req.uri(), "request failed");
        }

        let body = match self {
            AppError::Validation(messages) => ErrorBody {
                error: "validation failed".to_string(),
                messages,
            },
            AppError::Database(_) | AppError::Internal(_) => ErrorBody::new("internal error"),
            other => ErrorBody::new(other.to_string()),
        };

        (status, Json(body)).respond_to(req)
    }
}

#[cfg(test)]
mod tests {
    use rocket::local::blocking::Client;
    use rocket::serde::json::Json;
    use rocket::{get, post, routes};

    use super::*;

    #[get("/missing")]
    fn missing() -> Result<(), AppError> {
        Err(AppError::NotFound("guest"))
    }

    #[get("/invalid")]
    fn invalid() -> Result<(), AppError> {
        Err(AppError::Validation(vec!["capacity exceeded".into(), "unknown guest 4".into()]))
    }

    #[get("/broken")]
    fn broken() -> Result<(), AppError> {
        Err(AppError::Database(diesel::result::Error::RollbackTransaction))
    }

    #[post("/ids", data = "<ids>")]
    fn ids(ids: Result<Json<Vec<i32>>, json::Error<'_>>) -> Result<Json<usize>, AppError> {
        Ok(Json(ids?.len()))
    }

    fn client() -> Client {
        Client::tracked(rocket::build().mount("/", routes![missing, invalid, broken, ids])).unwrap()
    }

    #[test]
    fn not_found_maps_to_404() {
        let client = client();
        let response = client.get("/missing").dispatch();
        assert_eq!(response.status(), Status::NotFound);
        let body: serde_json::Value = response.into_json().unwrap();
        assert_eq!(body["error"], "guest not found");
    }

    #[test]
    fn validation_lists_every_message() {
        let client = client();
        let response = client.get("/invalid").dispatch();
        assert_eq!(response.status(), Status::BadRequest);
        let body: serde_json::Value = response.into_json().unwrap();
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn database_failure_hides_details() {
        let client = client();
        let response = client.get("/broken").dispatch();
        assert_eq!(response.status(), Status::InternalServerError);
        let body: serde_json::Value = response.into_json().unwrap();
        assert_eq!(body["error"], "internal error");
    }

    #[test]
    fn malformed_body_is_a_bad_request() {
        let client = client();
        let response = client.post("/ids").body("not json").dispatch();
        assert_eq!(response.status(), Status::BadRequest);
        let body: serde_json::Value = response.into_json().unwrap();
        assert!(!body["messages"].as_array().unwrap().is_empty());
    }

    #[test]
    fn body_without_content_type_still_reaches_the_route() {
        let client = client();
        let response = client.post("/ids").body("[1, 2, 3]").dispatch();
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_string().unwrap(), "3");
    }
}
