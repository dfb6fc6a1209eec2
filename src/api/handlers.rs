use crate::auth::{AuthUser, ReviewerUser};
use crate::error::{AppError, AppResult};
use crate::models::{BasicVote, SecondDecision};
use crate::services::DevlogInput;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

type ApiResult = AppResult<Json<Value>>;

/// Unwrap a JSON body, turning malformed input into a validation error
fn body<T: DeserializeOwned>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| AppError::Validation(e.body_text()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub hackatime_hours: Decimal,
    #[serde(default)]
    pub art_hours: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    pub project_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicVoteRequest {
    pub project_id: String,
    pub vote: BasicVote,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondDecisionRequest {
    pub project_id: String,
    pub decision: SecondDecision,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlackholeDecisionRequest {
    pub submission_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBetRequest {
    pub amount: i64,
    pub hours_goal: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimBetRequest {
    pub bet_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDevlogRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub code_hours: Decimal,
    #[serde(default)]
    pub art_hours: Decimal,
    #[serde(default)]
    pub project_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimQuestRequest {
    pub quest_id: String,
}

pub async fn me(State(state): State<Arc<AppState>>, AuthUser(user): AuthUser) -> ApiResult {
    let stats = state.quests.devlog_stats(&user.id, Utc::now()).await?;
    Ok(Json(json!({ "success": true, "user": user, "stats": stats })))
}

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    let project = state
        .projects
        .create_project(&user.id, &req.name, req.hackatime_hours, req.art_hours)
        .await?;
    Ok(Json(json!({ "success": true, "project": project })))
}

pub async fn submit_project(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    payload: Result<Json<ProjectRequest>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    let project = state.projects.submit_for_review(&user.id, &req.project_id).await?;
    Ok(Json(json!({ "success": true, "project": project })))
}

pub async fn basic_queue(
    State(state): State<Arc<AppState>>,
    ReviewerUser(reviewer): ReviewerUser,
) -> ApiResult {
    let projects = state.reviews.basic_queue(&reviewer.id).await?;
    Ok(Json(json!({ "success": true, "projects": projects })))
}

pub async fn basic_vote(
    State(state): State<Arc<AppState>>,
    ReviewerUser(reviewer): ReviewerUser,
    payload: Result<Json<BasicVoteRequest>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    let result = state
        .reviews
        .submit_basic_vote(&req.project_id, &reviewer.id, req.vote)
        .await?;
    Ok(Json(json!({
        "success": true,
        "project": result.project,
        "result": result.outcome,
    })))
}

pub async fn second_queue(
    State(state): State<Arc<AppState>>,
    ReviewerUser(_reviewer): ReviewerUser,
) -> ApiResult {
    let projects = state.reviews.second_queue().await?;
    Ok(Json(json!({ "success": true, "projects": projects })))
}

pub async fn second_decision(
    State(state): State<Arc<AppState>>,
    ReviewerUser(reviewer): ReviewerUser,
    payload: Result<Json<SecondDecisionRequest>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    let result = state
        .reviews
        .submit_second_decision(&req.project_id, &reviewer.id, req.decision)
        .await?;
    Ok(Json(json!({
        "success": true,
        "project": result.project,
        "result": result.outcome,
    })))
}

pub async fn blackhole_submit(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    payload: Result<Json<ProjectRequest>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    let submission = state
        .blackhole
        .submit_to_blackhole(&user.username, &req.project_id)
        .await?;
    Ok(Json(json!({ "success": true, "submission": submission })))
}

pub async fn blackhole_pending(
    State(state): State<Arc<AppState>>,
    ReviewerUser(_reviewer): ReviewerUser,
) -> ApiResult {
    let submissions = state.blackhole.pending().await?;
    Ok(Json(json!({ "success": true, "submissions": submissions })))
}

pub async fn blackhole_approve(
    State(state): State<Arc<AppState>>,
    ReviewerUser(reviewer): ReviewerUser,
    payload: Result<Json<BlackholeDecisionRequest>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    let submission = state
        .blackhole
        .approve_blackhole_submission(&req.submission_id, &reviewer.username)
        .await?;
    Ok(Json(json!({ "success": true, "submission": submission })))
}

pub async fn blackhole_reject(
    State(state): State<Arc<AppState>>,
    ReviewerUser(reviewer): ReviewerUser,
    payload: Result<Json<BlackholeDecisionRequest>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    let submission = state
        .blackhole
        .reject_blackhole_submission(
            &req.submission_id,
            &reviewer.username,
            req.reason.as_deref(),
        )
        .await?;
    Ok(Json(json!({ "success": true, "submission": submission })))
}

pub async fn list_bets(State(state): State<Arc<AppState>>, AuthUser(user): AuthUser) -> ApiResult {
    let bets = state.betting.list_bets(&user.id, Utc::now()).await?;
    Ok(Json(json!({ "success": true, "bets": bets })))
}

pub async fn place_bet(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    payload: Result<Json<PlaceBetRequest>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    let bet = state
        .betting
        .place_bet(&user.id, req.amount, req.hours_goal, Utc::now())
        .await?;
    Ok(Json(json!({ "success": true, "bet": bet })))
}

pub async fn claim_bet(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    payload: Result<Json<ClaimBetRequest>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    let claim = state.betting.claim_bet(&user.id, &req.bet_id, Utc::now()).await?;
    Ok(Json(json!({
        "success": true,
        "bet": claim.bet,
        "coinsEarned": claim.coins_earned,
    })))
}

pub async fn create_devlog(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreateDevlogRequest>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    let devlog = state
        .devlogs
        .create_devlog(
            &user.id,
            DevlogInput {
                content: req.content,
                code_hours: req.code_hours,
                art_hours: req.art_hours,
                project_ids: req.project_ids,
            },
            Utc::now(),
        )
        .await?;
    Ok(Json(json!({ "success": true, "devlog": devlog })))
}

pub async fn quests(State(state): State<Arc<AppState>>, AuthUser(user): AuthUser) -> ApiResult {
    let progress = state.quests.progress(&user.id, Utc::now()).await?;
    Ok(Json(json!({ "success": true, "quests": progress })))
}

pub async fn claim_quest(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    payload: Result<Json<ClaimQuestRequest>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    let claim = state
        .quests
        .claim_quest(&user.id, &req.quest_id, Utc::now())
        .await?;
    info!("Quest claim by {}: {:?}", user.username, claim);
    Ok(Json(json!({ "success": true, "claim": claim })))
}
