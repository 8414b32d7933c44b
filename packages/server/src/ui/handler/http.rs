//! HTTP API endpoint handlers.
//!
//! `/api/emit` is the inbound surface for the portal's REST layer: called
//! after a database commit, it hands the event to the dispatcher and always
//! answers 200 for valid requests. Delivery failures are logged, never
//! propagated back into the triggering write.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use crate::domain::{CohortId, EventContext, UserId};
use crate::infrastructure::dto::http::{
    ChannelSummaryDto, EmitRequestDto, EmitResponseDto, RegistrySnapshotDto,
};
use crate::ui::state::AppState;
use crate::usecase::DispatchEventUseCase;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Debug endpoint: current connection/channel state (for testing purposes)
pub async fn get_registry(State(state): State<Arc<AppState>>) -> Json<RegistrySnapshotDto> {
    let snapshot = state.registry.snapshot().await;

    Json(RegistrySnapshotDto {
        connections: snapshot.connections,
        channels: snapshot
            .channels
            .into_iter()
            .map(|(name, members)| ChannelSummaryDto { name, members })
            .collect(),
    })
}

/// Push delivery API for the REST layer, called after a commit.
///
/// 422 means the context ids were malformed (a caller bug); anything about
/// delivery itself is reported in the body, never as an error status.
pub async fn emit_event(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EmitRequestDto>,
) -> Result<Json<EmitResponseDto>, StatusCode> {
    let context = build_context(&request).ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;

    let dispatcher = DispatchEventUseCase::new(state.registry.clone());
    let report = dispatcher
        .emit(request.r#type, &context, request.payload)
        .await;

    Ok(Json(EmitResponseDto {
        resolved: report.resolved,
        delivered: report.delivered,
        failed: report.failed,
    }))
}

fn build_context(request: &EmitRequestDto) -> Option<EventContext> {
    let ctx = &request.context;
    Some(EventContext {
        actor: UserId::new(ctx.actor).ok()?,
        owner: match ctx.owner {
            Some(id) => Some(UserId::new(id).ok()?),
            None => None,
        },
        mentor: match ctx.mentor {
            Some(id) => Some(UserId::new(id).ok()?),
            None => None,
        },
        cohort: match ctx.cohort {
            Some(id) => Some(CohortId::new(id).ok()?),
            None => None,
        },
    })
}
