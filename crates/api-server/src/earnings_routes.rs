use anyhow::anyhow;
use axum::{
    extract::{DefaultBodyLimit, FromRequest, Multipart, Query, Request, State},
    http::{header, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use earnings_agent::{AgentError, AgentReply, AgentRequest, ChatMessage, PdfAttachment};
use serde::Deserialize;

use crate::db::{db_timestamp, Transcript};
use crate::request_id::RequestId;
use crate::{ApiResponse, AppError, AppState};

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const DEFAULT_TRANSCRIPTS: i64 = 20;
const MAX_TRANSCRIPTS: i64 = 100;

#[derive(Debug, Deserialize)]
struct ChatBody {
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct TranscriptQuery {
    limit: Option<i64>,
}

pub fn earnings_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/earnings-agent",
            post(analyze).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/earnings-agent/transcripts", get(list_transcripts))
}

fn bad_request(err: impl std::fmt::Display) -> AppError {
    AppError::with_status(StatusCode::BAD_REQUEST, anyhow!("{}", err))
}

/// Reads the `text` and `pdf` fields of an upload form.
async fn read_upload(mut multipart: Multipart) -> Result<AgentRequest, AppError> {
    let mut text = None;
    let mut pdf = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        match field.name() {
            Some("text") => text = Some(field.text().await.map_err(bad_request)?),
            Some("pdf") => {
                let filename = field.file_name().unwrap_or("report.pdf").to_string();
                let bytes = field.bytes().await.map_err(bad_request)?;
                if !bytes.is_empty() {
                    pdf = Some(PdfAttachment {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(AgentRequest::upload(text, pdf))
}

async fn analyze(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<ApiResponse<AgentReply>>, AppError> {
    let request_id = request.extensions().get::<RequestId>().map(|id| id.0.clone());
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    let agent_request = if is_multipart {
        let multipart = Multipart::from_request(request, &state).await.map_err(bad_request)?;
        read_upload(multipart).await?
    } else {
        let Json(body) = Json::<ChatBody>::from_request(request, &state)
            .await
            .map_err(bad_request)?;
        AgentRequest::Messages(body.messages)
    };

    let has_pdf = matches!(agent_request, AgentRequest::Prompt { pdf: Some(_), .. });
    let reply = match state.agent.analyze(&agent_request).await {
        Ok(reply) => reply,
        Err(AgentError::InvalidRequest(msg)) => return Err(bad_request(msg)),
        Err(e) => {
            return Err(AppError::with_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                anyhow!("Error processing request"),
            )
            .details(e.to_string()));
        }
    };

    if let Some(db) = &state.db {
        let transcript = Transcript {
            id: uuid::Uuid::new_v4().to_string(),
            request_id,
            model: state.agent.model().to_string(),
            prompt: agent_request.prompt_text(),
            response: reply.text.clone(),
            reasoning: reply.reasoning.clone(),
            has_pdf: i64::from(has_pdf),
            created_at: db_timestamp(Utc::now()),
        };
        if let Err(e) = db.save_transcript(&transcript).await {
            tracing::warn!("Failed to store earnings transcript: {}", e);
        }
    }

    Ok(ApiResponse::success(reply))
}

async fn list_transcripts(
    State(state): State<AppState>,
    Query(query): Query<TranscriptQuery>,
) -> Result<Json<ApiResponse<Vec<Transcript>>>, AppError> {
    let db = state.db.as_ref().ok_or_else(|| {
        AppError::with_status(
            StatusCode::SERVICE_UNAVAILABLE,
            anyhow!("Transcript storage is not configured"),
        )
    })?;
    let limit = query.limit.unwrap_or(DEFAULT_TRANSCRIPTS).clamp(1, MAX_TRANSCRIPTS);
    Ok(ApiResponse::success(db.recent_transcripts(limit).await?))
}
