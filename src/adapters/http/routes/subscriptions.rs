use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::{
        app_state::AppState,
        auth::{current_actor, require_admin, require_fighter},
    },
    app_error::AppResult,
    domain::entities::{
        payment_method::PaymentMethod, plan_type::PlanType, subscription::PlanChange,
        subscription_status::SubscriptionStatus,
    },
    use_cases::{
        Pagination,
        subscription::{AdminCreateSubscription, CheckoutRequest, GatewayPayment, SubscriptionFilter},
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plans", get(list_plans))
        .route("/admin-create", post(admin_create))
        .route("/create-order", post(create_order))
        .route("/verify-payment", post(verify_payment))
        .route("/all", get(list_all))
        .route("/me", get(list_mine))
        .route("/{id}", get(get_subscription))
        .route("/{id}/update-plan", put(update_plan))
        .route("/{id}/cancel", put(cancel))
        .route("/{id}/installments", post(record_installment))
        .route("/{id}/installment-order", post(installment_order))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminCreatePayload {
    fighter_id: Uuid,
    plan_type: PlanType,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    status: Option<SubscriptionStatus>,
    total_fee: Option<i64>,
    initial_payment: Option<i64>,
    payment_method: Option<PaymentMethod>,
    max_installments: Option<i32>,
    #[serde(default)]
    force_create: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderPayload {
    plan_type: PlanType,
    start_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyPaymentPayload {
    razorpay_order_id: String,
    razorpay_payment_id: String,
    razorpay_signature: String,
    subscription_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePlanPayload {
    plan_type: Option<PlanType>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    total_fee: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstallmentPayload {
    amount: i64,
    payment_method: PaymentMethod,
}

#[derive(Deserialize)]
struct InstallmentOrderPayload {
    amount: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    page: Option<i64>,
    limit: Option<i64>,
    plan_type: Option<PlanType>,
    status: Option<SubscriptionStatus>,
}

async fn list_plans(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(app_state.subscription_use_cases.plans())
}

async fn admin_create(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<AdminCreatePayload>,
) -> AppResult<impl IntoResponse> {
    require_admin(&headers, &jar, &app_state)?;
    let view = app_state
        .subscription_use_cases
        .admin_create(AdminCreateSubscription {
            fighter_id: payload.fighter_id,
            plan_type: payload.plan_type,
            start_date: payload.start_date,
            end_date: payload.end_date,
            status: payload.status,
            total_fee: payload.total_fee,
            initial_payment: payload.initial_payment,
            payment_method: payload.payment_method,
            max_installments: payload.max_installments,
            force_create: payload.force_create,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn create_order(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<CreateOrderPayload>,
) -> AppResult<impl IntoResponse> {
    let actor = require_fighter(&headers, &jar, &app_state)?;
    let order = app_state
        .subscription_use_cases
        .create_order(
            actor.id,
            CheckoutRequest {
                plan_type: payload.plan_type,
                start_date: payload.start_date,
            },
        )
        .await?;
    Ok(Json(order))
}

async fn verify_payment(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<VerifyPaymentPayload>,
) -> AppResult<impl IntoResponse> {
    let actor = require_fighter(&headers, &jar, &app_state)?;
    let view = app_state
        .subscription_use_cases
        .verify_payment(
            actor,
            GatewayPayment {
                order_id: payload.razorpay_order_id,
                payment_id: payload.razorpay_payment_id,
                signature: payload.razorpay_signature,
                subscription_id: payload.subscription_id,
            },
        )
        .await?;
    Ok(Json(view))
}

async fn list_all(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    require_admin(&headers, &jar, &app_state)?;
    let filter = SubscriptionFilter {
        plan_type: query.plan_type,
        status: query.status,
    };
    let page = app_state
        .subscription_use_cases
        .list_all(filter, Pagination::new(query.page, query.limit))
        .await?;
    Ok(Json(page))
}

async fn list_mine(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let actor = require_fighter(&headers, &jar, &app_state)?;
    let subscriptions = app_state
        .subscription_use_cases
        .list_for_fighter(actor.id)
        .await?;
    Ok(Json(subscriptions))
}

async fn get_subscription(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let actor = current_actor(&headers, &jar, &app_state)?;
    let view = app_state.subscription_use_cases.get(actor, id).await?;
    Ok(Json(view))
}

async fn update_plan(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlanPayload>,
) -> AppResult<impl IntoResponse> {
    require_admin(&headers, &jar, &app_state)?;
    let view = app_state
        .subscription_use_cases
        .update_plan(
            id,
            PlanChange {
                plan_type: payload.plan_type,
                start_date: payload.start_date,
                end_date: payload.end_date,
                total_fee: payload.total_fee,
            },
        )
        .await?;
    Ok(Json(view))
}

async fn cancel(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    require_admin(&headers, &jar, &app_state)?;
    let view = app_state.subscription_use_cases.cancel(id).await?;
    Ok(Json(view))
}

async fn record_installment(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Json(payload): Json<InstallmentPayload>,
) -> AppResult<impl IntoResponse> {
    require_admin(&headers, &jar, &app_state)?;
    let view = app_state
        .subscription_use_cases
        .record_installment(id, payload.amount, payload.payment_method)
        .await?;
    Ok(Json(view))
}

async fn installment_order(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Json(payload): Json<InstallmentOrderPayload>,
) -> AppResult<impl IntoResponse> {
    let actor = require_fighter(&headers, &jar, &app_state)?;
    let order = app_state
        .subscription_use_cases
        .installment_order(actor, id, payload.amount)
        .await?;
    Ok(Json(order))
}
