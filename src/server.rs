//! HTTP surface: `POST /add`, `GET /get`, `GET /list`.

use crate::service::{Envelope, ServiceFacade};

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::header,
    response::Json,
    routing::{get, post},
    Form, Router,
};
use log::{debug, info, warn};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::{TcpListener, ToSocketAddrs};

#[derive(Debug, Deserialize)]
pub struct AddForm {
    /// JSON array of raw `host:port` strings.
    #[serde(default)]
    pub proxies: String,
}

pub fn router(facade: Arc<ServiceFacade>) -> Router {
    Router::new()
        .route("/add", post(add))
        .route("/get", get(get_proxy))
        .route("/list", get(list))
        .with_state(facade)
}

/// Bind `addr` and serve the router until the process exits.
pub async fn serve(addr: impl ToSocketAddrs, facade: Arc<ServiceFacade>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP service listening on {}", listener.local_addr()?);
    axum::serve(listener, router(facade)).await
}

/// Every request gets an envelope: a body without a usable `proxies` field is
/// read as an empty payload, which the facade reports with code 2.
async fn add(State(facade): State<Arc<ServiceFacade>>, request: Request) -> Json<Envelope<String>> {
    let proxies = proxies_field(request).await;
    Json(facade.add(&proxies))
}

/// The `proxies` field of a urlencoded or multipart form body.
async fn proxies_field(request: Request) -> String {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));
    if !is_multipart {
        return match Form::<AddForm>::from_request(request, &()).await {
            Ok(Form(form)) => form.proxies,
            Err(rejection) => {
                debug!("Unreadable /add form: {}", rejection);
                String::new()
            }
        };
    }

    let mut multipart = match Multipart::from_request(request, &()).await {
        Ok(multipart) => multipart,
        Err(rejection) => {
            warn!("Unreadable /add multipart body: {}", rejection);
            return String::new();
        }
    };
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("proxies") => {
                return field.text().await.unwrap_or_default();
            }
            Ok(Some(_)) => continue,
            Ok(None) => return String::new(),
            Err(e) => {
                warn!("Broken /add multipart body: {}", e);
                return String::new();
            }
        }
    }
}

async fn get_proxy(State(facade): State<Arc<ServiceFacade>>) -> Json<Envelope<String>> {
    Json(facade.get())
}

async fn list(State(facade): State<Arc<ServiceFacade>>) -> Json<Envelope<Vec<String>>> {
    Json(facade.list())
}
