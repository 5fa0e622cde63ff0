use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State as AxumState},
    http::StatusCode,
    response::IntoResponse,
};
use catalog::models::{ProcessedProject, ProcessedUser, Student};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use store::models::{NewTicket, TicketKind};
use tracing::info;

use crate::{
    discord::{WebhookRequest, build_message, now, send},
    error::AppError,
    state::State,
};

type AppState = AxumState<Arc<State>>;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TicketRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub project_id: Option<String>,
    pub user_ids: Option<Value>,
    pub notes: Option<Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketCreated {
    pub success: bool,
    pub ticket_id: String,
}

#[derive(Serialize)]
pub struct Success {
    pub success: bool,
}

pub async fn students_handler(
    AxumState(state): AppState,
) -> Result<Json<Vec<Student>>, AppError> {
    let students = state
        .catalog
        .students()
        .await
        .map_err(AppError::store("Failed to fetch students"))?;

    Ok(Json(students))
}

pub async fn users_handler(
    AxumState(state): AppState,
) -> Result<Json<Vec<ProcessedUser>>, AppError> {
    let users = state
        .catalog
        .all_users()
        .await
        .map_err(AppError::store("Failed to fetch users"))?;

    Ok(Json(users))
}

pub async fn projects_handler(
    AxumState(state): AppState,
) -> Result<Json<Vec<ProcessedProject>>, AppError> {
    let projects = state
        .catalog
        .all_projects()
        .await
        .map_err(AppError::store("Failed to fetch projects"))?;

    Ok(Json(projects))
}

pub async fn project_handler(
    AxumState(state): AppState,
    Path(slug): Path<String>,
) -> Result<Json<ProcessedProject>, AppError> {
    state
        .catalog
        .project_by_slug(&slug)
        .await
        .map_err(AppError::store("Failed to fetch project"))?
        .map(Json)
        .ok_or(AppError::NotFound("Project not found"))
}

/// Only a list made entirely of string ids counts; any other shape is ignored.
fn user_ids(value: Option<Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::String(id) => Some(id),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default()
}

fn notes(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

pub fn parse_ticket(body: &[u8]) -> Result<NewTicket, AppError> {
    let request: TicketRequest = serde_json::from_slice(body)
        .map_err(|e| AppError::ValidationFailed(format!("Malformed request body: {e}")))?;

    let (Some(kind), Some(project_id)) = (
        request.kind.filter(|s| !s.is_empty()),
        request.project_id.filter(|s| !s.is_empty()),
    ) else {
        return Err(AppError::ValidationFailed(
            "Missing required fields: type and projectId".to_string(),
        ));
    };

    let kind: TicketKind = kind
        .parse()
        .map_err(|_| AppError::ValidationFailed("Invalid type".to_string()))?;

    Ok(NewTicket::new(kind, project_id)
        .with_users(user_ids(request.user_ids))
        .with_notes(notes(request.notes).unwrap_or_default()))
}

pub async fn tickets_handler(
    AxumState(state): AppState,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let ticket = parse_ticket(&body)?;

    let ticket_id = state
        .catalog
        .create_ticket(&ticket)
        .await
        .map_err(AppError::store("Failed to create ticket"))?;

    Ok((
        StatusCode::OK,
        Json(TicketCreated {
            success: true,
            ticket_id,
        }),
    ))
}

pub async fn webhook_handler(
    AxumState(state): AppState,
    body: Bytes,
) -> Result<Json<Success>, AppError> {
    let webhook_url = state
        .config
        .discord_webhook_url
        .as_deref()
        .ok_or(AppError::WebhookNotConfigured)?;

    let request: WebhookRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::ValidationFailed(format!("Malformed webhook payload: {e}")))?;

    let message = build_message(&request.payload, now());
    send(&state.http_client, webhook_url, &message).await?;

    info!(
        "Forwarded {} deploy event to Discord",
        request.payload.kind.as_deref().unwrap_or("unknown")
    );

    Ok(Json(Success { success: true }))
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fields(body: Value) -> Value {
        let ticket = parse_ticket(body.to_string().as_bytes()).unwrap();
        serde_json::to_value(ticket).unwrap()
    }

    #[test]
    fn test_user_ids_kept_only_as_string_list() {
        let kept = fields(json!({ "type": "update-users", "projectId": "p1", "userIds": ["u1", "u2"] }));
        assert_eq!(kept["update-users"], json!(["u1", "u2"]));

        for user_ids in [json!("u1"), json!([1, 2]), json!(["u1", null]), json!([]), json!({ "id": "u1" })] {
            let ignored = fields(json!({ "type": "update-users", "projectId": "p1", "userIds": user_ids.clone() }));
            assert!(ignored.get("update-users").is_none(), "{user_ids} should be ignored");
        }
    }

    #[test]
    fn test_truthy_notes_written() {
        let base = || json!({ "type": "update-images", "projectId": "p1" });

        let mut text = base();
        text["notes"] = json!("Faltan fotos");
        assert_eq!(fields(text)["notes"], "Faltan fotos");

        let mut number = base();
        number["notes"] = json!(3);
        assert_eq!(fields(number)["notes"], "3");

        for falsy in [json!(""), json!(0), json!(false), Value::Null] {
            let mut body = base();
            body["notes"] = falsy.clone();
            assert!(fields(body).get("notes").is_none(), "{falsy} should be dropped");
        }
    }

    #[test]
    fn test_required_fields_still_enforced() {
        let missing = parse_ticket(br#"{"type":"update-users","userIds":["u1"]}"#);
        assert!(matches!(missing, Err(AppError::ValidationFailed(_))));

        let invalid = parse_ticket(br#"{"type":"rename","projectId":"p1"}"#);
        assert!(matches!(invalid, Err(AppError::ValidationFailed(message)) if message == "Invalid type"));
    }
}
