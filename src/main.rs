use rocket::launch;
use tracing_subscriber::{fmt, EnvFilter};

#[launch]
fn rocket() -> _ {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    wedding_rsvp::build()
}
