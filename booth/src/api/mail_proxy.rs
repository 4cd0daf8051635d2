//! Browser-facing proxies to the mail provider.
//!
//! These keep the provider credentials server-side. Unlike the rest of the
//! API they answer with a small fixed contract:
//!
//! | outcome                     | status | body                                  |
//! |-----------------------------|--------|---------------------------------------|
//! | success                     | 200    | `{"success": true, ...}`              |
//! | missing required field      | 400    | `{"error": "Missing required fields"}` |
//! | credentials or ids absent   | 500    | `{"error": "Server configuration error"}` |
//! | provider call failed        | 500    | `{"error": "<reason>"}`               |
//! | `OPTIONS`                   | 200    | empty                                 |
//! | any other method            | 405    | `{"error": "Method not allowed"}`     |

use crate::lifecycle::effects;
use crate::server::state::AppState;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{MethodRouter, post},
};
use booth_core::MailError;
use booth_core::mail::{MailingList, SubscriberUpsert, TemplateFields, Trigger};
use serde::Deserialize;
use serde_json::{Value, json};

/// Routes for every proxy, relative to `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/send-confirmation", proxy(post(send_confirmation)))
        .route("/notify-update", proxy(post(notify_update)))
        .route("/notify-cancel", proxy(post(notify_cancel)))
        .route("/notify-admin", proxy(post(notify_admin)))
        .route("/delete-subscriber", proxy(post(delete_subscriber)))
}

fn proxy(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.options(preflight).fallback(method_not_allowed)
}

#[allow(clippy::unused_async)]
async fn preflight() -> StatusCode {
    StatusCode::OK
}

#[allow(clippy::unused_async)]
async fn method_not_allowed() -> (StatusCode, Json<Value>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
}

// ============================================================================
// Errors
// ============================================================================

/// Why a proxy call failed.
#[derive(Debug)]
pub enum ProxyError {
    /// Body absent, unparseable, or lacking a required field.
    MissingFields,
    /// A credential, list id or trigger URL is not configured.
    NotConfigured(MailError),
    /// The provider call failed.
    Failed(MailError),
}

impl From<MailError> for ProxyError {
    fn from(err: MailError) -> Self {
        if matches!(err, MailError::NotConfigured(_)) {
            Self::NotConfigured(err)
        } else {
            Self::Failed(err)
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingFields => (StatusCode::BAD_REQUEST, "Missing required fields".to_string()),
            Self::NotConfigured(error) => {
                tracing::error!(%error, "Mail proxy is not configured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server configuration error".to_string(),
                )
            },
            Self::Failed(error) => {
                tracing::error!(%error, "Mail proxy call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
            },
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ProxyResult = Result<Json<Value>, ProxyError>;

/// Trimmed value of a field, `None` when absent or blank.
fn present(field: Option<&String>) -> Option<&str> {
    field.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn insert_present(fields: &mut TemplateFields, key: &str, value: Option<&String>) {
    if let Some(value) = present(value) {
        fields.insert(key.to_string(), value.to_string());
    }
}

// ============================================================================
// Request Types
// ============================================================================

/// Body of `POST /api/send-confirmation`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfirmationRequest {
    /// Visitor email.
    pub subscriber: Option<String>,
    /// Visitor name.
    pub name: Option<String>,
    /// Company.
    pub company: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// Meeting purpose.
    pub inquiry_type: Option<String>,
    /// Human date, e.g. "February 9, 2026".
    pub meeting_date: Option<String>,
    /// Slot start, `HH:MM`.
    pub meeting_time: Option<String>,
    /// Link to the booking page.
    pub manage_link: Option<String>,
}

/// Body of `POST /api/notify-update`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateNoticeRequest {
    /// Visitor email.
    pub email: Option<String>,
    /// Visitor name.
    pub name: Option<String>,
    /// New meeting date.
    pub date: Option<String>,
    /// New meeting time.
    pub time: Option<String>,
}

/// Body of `POST /api/notify-cancel` and `POST /api/delete-subscriber`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EmailRequest {
    /// Visitor email.
    pub email: Option<String>,
}

/// Body of `POST /api/notify-admin`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdminNoticeRequest {
    /// What happened, e.g. `create`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Visitor name.
    pub name: Option<String>,
    /// Company.
    pub company: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// Meeting date.
    pub date: Option<String>,
    /// Meeting time.
    pub time: Option<String>,
    /// Meeting purpose.
    #[serde(rename = "inquiryType")]
    pub inquiry_type: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Subscribe the visitor, send the confirmation and copy the admins.
///
/// Only the subscribe step can fail the call; the confirmation trigger and
/// the admin fan-out are logged when they fail.
pub async fn send_confirmation(
    State(state): State<AppState>,
    body: Option<Json<ConfirmationRequest>>,
) -> ProxyResult {
    let Json(request) = body.ok_or(ProxyError::MissingFields)?;
    let (Some(email), Some(name), Some(meeting_date), Some(meeting_time)) = (
        present(request.subscriber.as_ref()),
        present(request.name.as_ref()),
        present(request.meeting_date.as_ref()),
        present(request.meeting_time.as_ref()),
    ) else {
        return Err(ProxyError::MissingFields);
    };
    state
        .mail
        .ensure_configured(&[MailingList::Customers], &[Trigger::Creation])?;

    let mut fields = TemplateFields::new();
    fields.insert("name".into(), name.to_string());
    fields.insert("meeting_date".into(), meeting_date.to_string());
    fields.insert("meeting_time".into(), meeting_time.to_string());
    fields.insert(
        "manage_link".into(),
        present(request.manage_link.as_ref()).unwrap_or_default().to_string(),
    );

    state
        .mail
        .upsert_subscriber(
            MailingList::Customers,
            SubscriberUpsert {
                email: email.to_string(),
                name: name.to_string(),
                fields: fields.clone(),
            },
        )
        .await?;

    if let Err(error) = state
        .mail
        .fire_trigger(Trigger::Creation, email.to_string(), TemplateFields::new())
        .await
    {
        tracing::warn!(%error, "Confirmation trigger failed");
    }

    if state
        .mail
        .ensure_configured(&[MailingList::Admins], &[Trigger::AdminNotify])
        .is_ok()
    {
        insert_present(&mut fields, "company", request.company.as_ref());
        insert_present(&mut fields, "country", request.country.as_ref());
        insert_present(&mut fields, "inquiry_type", request.inquiry_type.as_ref());
        fields.insert("manage_link".into(), state.template.admin_link());
        if let Err(error) = effects::notify_admins(state.mail.as_ref(), fields).await {
            tracing::warn!(%error, "Admin copy of confirmation failed");
        }
    } else {
        tracing::debug!("Admin notifications not configured, skipping");
    }

    Ok(Json(json!({ "success": true, "message": "Confirmation processed" })))
}

/// Refresh the visitor's fields and send the update notice.
///
/// A failed refresh is logged and the notice is still sent.
pub async fn notify_update(
    State(state): State<AppState>,
    body: Option<Json<UpdateNoticeRequest>>,
) -> ProxyResult {
    let Json(request) = body.ok_or(ProxyError::MissingFields)?;
    let (Some(email), Some(date), Some(time)) = (
        present(request.email.as_ref()),
        present(request.date.as_ref()),
        present(request.time.as_ref()),
    ) else {
        return Err(ProxyError::MissingFields);
    };
    state
        .mail
        .ensure_configured(&[MailingList::Customers], &[Trigger::Update])?;

    let mut fields = TemplateFields::new();
    insert_present(&mut fields, "name", request.name.as_ref());
    fields.insert("meeting_date".into(), date.to_string());
    fields.insert("meeting_time".into(), time.to_string());

    let upsert = SubscriberUpsert {
        email: email.to_string(),
        name: present(request.name.as_ref()).unwrap_or_default().to_string(),
        fields: fields.clone(),
    };
    if let Err(error) = state
        .mail
        .upsert_subscriber(MailingList::Customers, upsert)
        .await
    {
        tracing::warn!(%error, "Subscriber refresh failed, sending update anyway");
    }

    state
        .mail
        .fire_trigger(Trigger::Update, email.to_string(), fields)
        .await?;

    Ok(Json(json!({ "success": true })))
}

/// Send the cancellation notice.
pub async fn notify_cancel(
    State(state): State<AppState>,
    body: Option<Json<EmailRequest>>,
) -> ProxyResult {
    let Json(request) = body.ok_or(ProxyError::MissingFields)?;
    let email = present(request.email.as_ref()).ok_or(ProxyError::MissingFields)?;
    state
        .mail
        .ensure_configured(&[], &[Trigger::Cancellation])?;

    state
        .mail
        .fire_trigger(Trigger::Cancellation, email.to_string(), TemplateFields::new())
        .await?;

    Ok(Json(json!({ "success": true })))
}

/// Copy every admin on a booking event.
///
/// Fan-out failures answer 200 with a warning: the caller's booking change
/// has already happened and there is nothing for it to retry.
pub async fn notify_admin(
    State(state): State<AppState>,
    body: Option<Json<AdminNoticeRequest>>,
) -> ProxyResult {
    let Json(request) = body.ok_or(ProxyError::MissingFields)?;
    let (Some(name), Some(date), Some(time)) = (
        present(request.name.as_ref()),
        present(request.date.as_ref()),
        present(request.time.as_ref()),
    ) else {
        return Err(ProxyError::MissingFields);
    };
    state
        .mail
        .ensure_configured(&[MailingList::Admins], &[Trigger::AdminNotify])?;

    let mut fields = TemplateFields::new();
    fields.insert("name".into(), name.to_string());
    fields.insert("meeting_date".into(), date.to_string());
    fields.insert("meeting_time".into(), time.to_string());
    fields.insert("manage_link".into(), state.template.admin_link());
    insert_present(&mut fields, "type", request.kind.as_ref());
    insert_present(&mut fields, "company", request.company.as_ref());
    insert_present(&mut fields, "country", request.country.as_ref());
    insert_present(&mut fields, "inquiry_type", request.inquiry_type.as_ref());

    match effects::notify_admins(state.mail.as_ref(), fields).await {
        Ok(0) => Ok(Json(json!({ "message": "No admins to notify" }))),
        Ok(notified) => Ok(Json(json!({ "success": true, "notified": notified }))),
        Err(error) => {
            tracing::warn!(%error, "Admin notification failed");
            Ok(Json(json!({
                "warning": "Admin notification failed",
                "details": error.to_string(),
            })))
        },
    }
}

/// Remove the visitor from the customer list.
pub async fn delete_subscriber(
    State(state): State<AppState>,
    body: Option<Json<EmailRequest>>,
) -> ProxyResult {
    let Json(request) = body.ok_or(ProxyError::MissingFields)?;
    let email = present(request.email.as_ref()).ok_or(ProxyError::MissingFields)?;
    state.mail.ensure_configured(&[MailingList::Customers], &[])?;

    state
        .mail
        .delete_subscriber(MailingList::Customers, email.to_string())
        .await?;

    Ok(Json(json!({ "success": true })))
}
