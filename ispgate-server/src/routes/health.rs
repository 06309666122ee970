use crate::error::Envelope;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct Health {
    status: &'static str,
    version: &'static str,
}

pub(crate) async fn health() -> Json<Envelope<Health>> {
    Json(Envelope::data(Health {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    }))
}
