//! REST API.
//!
//! Endpoints:
//! - `GET /health`
//! - `POST /webhooks/:provider` (signed with `X-Signature`)
//! - `POST /accounts`, `GET /accounts/:id`, `GET /accounts/:id/ledger`
//! - `GET|POST /accounts/:id/orders`, `GET /accounts/:id/referrals`
//! - `GET /products`
//! - `/admin/...` management endpoints, authorised by `X-Admin-Id`

mod error;

pub use error::{ErrorBody, INTERNAL_ERROR, PROVIDER_UNAVAILABLE};

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::model::{Account, CreditStatus, LedgerEntry, Order, Product, SlaConfig, SlaCredit};
use crate::services::{
    require_admin, App, Job, JobOutcome, NewProduct, Purchase, PurchaseRequest, ReferralSummary,
    Registration, WebhookOutcome,
};

/// Header identifying the acting administrator.
pub const ADMIN_HEADER: &str = "x-admin-id";
/// Header carrying the payment provider's signature.
pub const SIGNATURE_HEADER: &str = "x-signature";
/// Client address as reported by the load balancer.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

type AppState = Arc<App>;

/// Start the REST server on `addr` and run until Ctrl+C.
pub async fn serve(
    app: Arc<App>,
    addr: &str,
) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %listener.local_addr()?, "REST API listening");
    axum::serve(listener, router(app))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;
    Ok(())
}

/// Build the axum router (separated for testing).
pub fn router(app: Arc<App>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/webhooks/:provider", post(webhook))
        .route("/accounts", post(register))
        .route("/accounts/:id", get(account))
        .route("/accounts/:id/ledger", get(ledger))
        .route("/accounts/:id/orders", get(orders).post(purchase))
        .route("/accounts/:id/referrals", get(referrals))
        .route("/products", get(products))
        .route("/admin/products", post(create_product))
        .route("/admin/products/:id", put(update_product))
        .route("/admin/accounts/:id/adjust", post(adjust))
        .route("/admin/accounts/:id/ban", post(ban))
        .route("/admin/accounts/:id/referral-rate", put(set_referral_rate))
        .route("/admin/sla", get(sla_configs))
        .route("/admin/sla/:proxy_type", put(upsert_sla))
        .route("/admin/sla-credits", get(sla_credits))
        .route("/admin/sla-credits/:id/:action", post(review_sla_credit))
        .route("/admin/jobs/:job", post(run_job))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app)
}

/// The administrator named by `X-Admin-Id`. Role checks happen in the
/// services.
fn admin_id(headers: &HeaderMap) -> Result<Uuid> {
    headers
        .get(ADMIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or_else(|| ServiceError::forbidden("missing or invalid X-Admin-Id header"))
}

/// Resolve `X-Admin-Id` and require the admin role, for endpoints that do
/// not reach an admin-checking service call.
async fn authorize(app: &App, headers: &HeaderMap) -> Result<Uuid> {
    let admin = admin_id(headers)?;
    require_admin(app.store.as_ref(), admin).await?;
    Ok(admin)
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn webhook(
    State(app): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookOutcome>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let outcome = app
        .payments
        .handle_webhook(&provider, &body, signature)
        .await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
struct RegisterBody {
    email: String,
    #[serde(default)]
    referral_code: Option<String>,
}

async fn register(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<Account>)> {
    let account = app
        .accounts
        .register(Registration {
            email: body.email,
            referral_code: body.referral_code,
            registration_ip: client_ip(&headers),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn account(State(app): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Account>> {
    Ok(Json(app.accounts.get(id).await?))
}

async fn ledger(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<LedgerEntry>>> {
    Ok(Json(app.ledger.statement(id).await?))
}

async fn orders(State(app): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Vec<Order>>> {
    app.accounts.get(id).await?;
    Ok(Json(app.fulfillment.orders(id).await?))
}

#[derive(Debug, Deserialize)]
struct PurchaseBody {
    product_id: Uuid,
    quantity: u32,
    #[serde(default)]
    geo: Option<String>,
}

async fn purchase(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PurchaseBody>,
) -> Result<(StatusCode, Json<Purchase>)> {
    let purchase = app
        .fulfillment
        .purchase(PurchaseRequest {
            account_id: id,
            product_id: body.product_id,
            quantity: body.quantity,
            geo: body.geo,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

async fn referrals(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReferralSummary>> {
    app.accounts.get(id).await?;
    Ok(Json(app.referral.summary(id).await?))
}

async fn products(State(app): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(app.catalog.list_products(true).await?))
}

async fn create_product(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = app.catalog.create_product(admin_id(&headers)?, body).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<NewProduct>,
) -> Result<Json<Product>> {
    Ok(Json(
        app.catalog
            .update_product(admin_id(&headers)?, id, body)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
struct AdjustBody {
    delta: Decimal,
    reason: String,
}

async fn adjust(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<AdjustBody>,
) -> Result<impl IntoResponse> {
    let receipt = app
        .ledger
        .adjust(admin_id(&headers)?, id, body.delta, &body.reason)
        .await?;
    Ok(Json(serde_json::json!({
        "entry": receipt.entry,
        "balance": receipt.balance,
        "audit": receipt.audit,
    })))
}

async fn ban(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Account>> {
    Ok(Json(app.accounts.ban(admin_id(&headers)?, id).await?))
}

#[derive(Debug, Deserialize)]
struct ReferralRateBody {
    rate: Option<Decimal>,
}

async fn set_referral_rate(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<ReferralRateBody>,
) -> Result<Json<Account>> {
    Ok(Json(
        app.accounts
            .set_referral_rate(admin_id(&headers)?, id, body.rate)
            .await?,
    ))
}

async fn sla_configs(
    State(app): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<SlaConfig>>> {
    authorize(&app, &headers).await?;
    Ok(Json(app.sla.configs().await?))
}

#[derive(Debug, Deserialize)]
struct SlaConfigBody {
    guaranteed_uptime: Decimal,
    credit_per_percent: Decimal,
    #[serde(default = "default_window_hours")]
    measurement_window_hours: u32,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_window_hours() -> u32 {
    24
}

fn default_active() -> bool {
    true
}

async fn upsert_sla(
    State(app): State<AppState>,
    Path(proxy_type): Path<String>,
    headers: HeaderMap,
    Json(body): Json<SlaConfigBody>,
) -> Result<Json<SlaConfig>> {
    let config = SlaConfig {
        proxy_type,
        guaranteed_uptime: body.guaranteed_uptime,
        credit_per_percent: body.credit_per_percent,
        measurement_window_hours: body.measurement_window_hours,
        active: body.active,
    };
    Ok(Json(app.sla.upsert_config(admin_id(&headers)?, config).await?))
}

#[derive(Debug, Deserialize)]
struct CreditFilter {
    status: Option<String>,
}

async fn sla_credits(
    State(app): State<AppState>,
    headers: HeaderMap,
    Query(filter): Query<CreditFilter>,
) -> Result<Json<Vec<SlaCredit>>> {
    authorize(&app, &headers).await?;
    let status = filter
        .status
        .map(|s| s.parse::<CreditStatus>())
        .transpose()
        .map_err(|e| ServiceError::invalid(e.to_string()))?;
    Ok(Json(app.sla.credits(status).await?))
}

async fn review_sla_credit(
    State(app): State<AppState>,
    Path((id, action)): Path<(Uuid, String)>,
    headers: HeaderMap,
) -> Result<Json<SlaCredit>> {
    let admin = admin_id(&headers)?;
    let credit = match action.as_str() {
        "approve" => app.sla.approve(admin, id).await?,
        "reject" => app.sla.reject(admin, id).await?,
        "apply" => app.sla.apply(admin, id).await?,
        other => {
            return Err(ServiceError::invalid(format!(
                "unknown action {}, expected approve, reject or apply",
                other
            )))
        }
    };
    Ok(Json(credit))
}

async fn run_job(
    State(app): State<AppState>,
    Path(job): Path<String>,
    headers: HeaderMap,
) -> Result<Json<JobOutcome>> {
    let admin = authorize(&app, &headers).await?;
    let job: Job = job.parse()?;
    info!(%admin, job = %job, "Job triggered");
    Ok(Json(app.scheduler.run_job(job, Utc::now()).await?))
}
