use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, put},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::{
        app_state::AppState,
        auth::{current_actor, require_admin, require_fighter},
    },
    app_error::AppResult,
    domain::entities::fighter::{Assessment, FighterProfileUpdate},
    use_cases::Pagination,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_fighters))
        .route("/me", get(get_me))
        .route("/without-subscription", get(list_without_subscription))
        .route(
            "/{id}",
            get(get_fighter).put(update_fighter).delete(delete_fighter),
        )
        .route("/{id}/assessment", put(update_assessment))
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    page: Option<i64>,
    limit: Option<i64>,
    search: Option<String>,
}

async fn list_fighters(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    require_admin(&headers, &jar, &app_state)?;
    let page = app_state
        .fighter_use_cases
        .list(query.search, Pagination::new(query.page, query.limit))
        .await?;
    Ok(Json(page))
}

async fn get_me(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let actor = require_fighter(&headers, &jar, &app_state)?;
    let fighter = app_state.fighter_use_cases.get(actor.id).await?;
    Ok(Json(fighter))
}

async fn list_without_subscription(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    require_admin(&headers, &jar, &app_state)?;
    let page = app_state
        .fighter_use_cases
        .without_subscription(Pagination::new(query.page, query.limit))
        .await?;
    Ok(Json(page))
}

async fn get_fighter(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    current_actor(&headers, &jar, &app_state)?.ensure_can_access(id)?;
    let fighter = app_state.fighter_use_cases.get(id).await?;
    Ok(Json(fighter))
}

async fn update_fighter(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Json(mut update): Json<FighterProfileUpdate>,
) -> AppResult<impl IntoResponse> {
    let actor = current_actor(&headers, &jar, &app_state)?;
    actor.ensure_can_access(id)?;
    // Belt rank is awarded by staff.
    if !actor.role.is_admin() {
        update.belt_rank = None;
    }
    let fighter = app_state
        .fighter_use_cases
        .update_profile(id, update)
        .await?;
    Ok(Json(fighter))
}

async fn update_assessment(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Json(assessment): Json<Assessment>,
) -> AppResult<impl IntoResponse> {
    require_admin(&headers, &jar, &app_state)?;
    let fighter = app_state
        .fighter_use_cases
        .update_assessment(id, assessment)
        .await?;
    Ok(Json(fighter))
}

async fn delete_fighter(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&headers, &jar, &app_state)?;
    app_state.fighter_use_cases.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;
    use serde_json::json;

    use crate::domain::entities::role::Role;
    use crate::test_utils::{
        TestAppStateBuilder, create_test_fighter, create_test_subscription, test_token,
    };

    fn build_test_router(app_state: AppState) -> Router<()> {
        router().with_state(app_state)
    }

    fn admin_bearer() -> String {
        format!("Bearer {}", test_token(Uuid::new_v4(), Role::Admin))
    }

    fn fighter_bearer(id: Uuid) -> String {
        format!("Bearer {}", test_token(id, Role::Fighter))
    }

    // =========================================================================
    // GET /
    // =========================================================================

    #[tokio::test]
    async fn list_requires_token() {
        let app_state = TestAppStateBuilder::new().build();
        let server = TestServer::new(build_test_router(app_state)).unwrap();

        server.get("/").await.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn list_is_admin_only() {
        let fighter = create_test_fighter(|_| {});
        let fighter_id = fighter.id;
        let app_state = TestAppStateBuilder::new().with_fighter(fighter).build();
        let server = TestServer::new(build_test_router(app_state)).unwrap();

        server
            .get("/")
            .add_header("Authorization", fighter_bearer(fighter_id))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn list_searches_and_paginates() {
        let app_state = TestAppStateBuilder::new()
            .with_fighter(create_test_fighter(|f| f.name = "Asha Menon".into()))
            .with_fighter(create_test_fighter(|f| f.name = "Kiran Rao".into()))
            .with_fighter(create_test_fighter(|f| f.name = "Ashwin Pillai".into()))
            .build();
        let server = TestServer::new(build_test_router(app_state)).unwrap();

        let response = server
            .get("/")
            .add_query_params(json!({ "search": "ash", "page": 1, "limit": 1 }))
            .add_header("Authorization", admin_bearer())
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["total"], 2);
        assert_eq!(body["totalPages"], 2);
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
    }

    // =========================================================================
    // GET /me, GET /{id}
    // =========================================================================

    #[tokio::test]
    async fn me_returns_own_profile() {
        let fighter = create_test_fighter(|f| f.name = "Asha Menon".into());
        let fighter_id = fighter.id;
        let app_state = TestAppStateBuilder::new().with_fighter(fighter).build();
        let server = TestServer::new(build_test_router(app_state)).unwrap();

        let response = server
            .get("/me")
            .add_header("Authorization", fighter_bearer(fighter_id))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "Asha Menon");
    }

    #[tokio::test]
    async fn fighter_cannot_read_someone_else() {
        let me = create_test_fighter(|_| {});
        let other = create_test_fighter(|_| {});
        let (me_id, other_id) = (me.id, other.id);
        let app_state = TestAppStateBuilder::new()
            .with_fighter(me)
            .with_fighter(other)
            .build();
        let server = TestServer::new(build_test_router(app_state)).unwrap();

        server
            .get(&format!("/{other_id}"))
            .add_header("Authorization", fighter_bearer(me_id))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .get(&format!("/{me_id}"))
            .add_header("Authorization", fighter_bearer(me_id))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn unknown_fighter_returns_404() {
        let app_state = TestAppStateBuilder::new().build();
        let server = TestServer::new(build_test_router(app_state)).unwrap();

        server
            .get(&format!("/{}", Uuid::new_v4()))
            .add_header("Authorization", admin_bearer())
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    // =========================================================================
    // GET /without-subscription
    // =========================================================================

    #[tokio::test]
    async fn without_subscription_excludes_subscribed_fighters() {
        let subscribed = create_test_fighter(|f| f.name = "Subscribed".into());
        let idle = create_test_fighter(|f| f.name = "Idle".into());
        let subscription = create_test_subscription(subscribed.id, |_| {});
        let app_state = TestAppStateBuilder::new()
            .with_fighter(subscribed)
            .with_fighter(idle)
            .with_subscription(subscription)
            .build();
        let server = TestServer::new(build_test_router(app_state)).unwrap();

        let response = server
            .get("/without-subscription")
            .add_header("Authorization", admin_bearer())
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["total"], 1);
        assert_eq!(body["items"][0]["name"], "Idle");
    }

    // =========================================================================
    // PUT /{id}, PUT /{id}/assessment
    // =========================================================================

    #[tokio::test]
    async fn fighter_updates_own_profile_but_not_belt() {
        let fighter = create_test_fighter(|f| f.belt_rank = Some("white".into()));
        let fighter_id = fighter.id;
        let app_state = TestAppStateBuilder::new().with_fighter(fighter).build();
        let server = TestServer::new(build_test_router(app_state)).unwrap();

        let response = server
            .put(&format!("/{fighter_id}"))
            .add_header("Authorization", fighter_bearer(fighter_id))
            .json(&json!({ "address": "12 MG Road, Bengaluru", "beltRank": "black" }))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["address"], "12 MG Road, Bengaluru");
        assert_eq!(body["beltRank"], "white");
    }

    #[tokio::test]
    async fn assessment_scores_are_range_checked() {
        let fighter = create_test_fighter(|_| {});
        let fighter_id = fighter.id;
        let app_state = TestAppStateBuilder::new().with_fighter(fighter).build();
        let server = TestServer::new(build_test_router(app_state)).unwrap();

        let scores = json!({
            "striking": 7, "grappling": 6, "cardio": 8, "strength": 5,
            "flexibility": 4, "technique": 6, "discipline": 11
        });
        server
            .put(&format!("/{fighter_id}/assessment"))
            .add_header("Authorization", admin_bearer())
            .json(&scores)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let mut valid = scores.clone();
        valid["discipline"] = json!(9);
        let response = server
            .put(&format!("/{fighter_id}/assessment"))
            .add_header("Authorization", admin_bearer())
            .json(&valid)
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["assessment"]["discipline"], 9);
    }

    #[tokio::test]
    async fn fighter_cannot_assess_themselves() {
        let fighter = create_test_fighter(|_| {});
        let fighter_id = fighter.id;
        let app_state = TestAppStateBuilder::new().with_fighter(fighter).build();
        let server = TestServer::new(build_test_router(app_state)).unwrap();

        server
            .put(&format!("/{fighter_id}/assessment"))
            .add_header("Authorization", fighter_bearer(fighter_id))
            .json(&json!({
                "striking": 10, "grappling": 10, "cardio": 10, "strength": 10,
                "flexibility": 10, "technique": 10, "discipline": 10
            }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    // =========================================================================
    // DELETE /{id}
    // =========================================================================

    #[tokio::test]
    async fn delete_cascades_to_subscriptions() {
        let fighter = create_test_fighter(|_| {});
        let fighter_id = fighter.id;
        let (app_state, mocks) = TestAppStateBuilder::new()
            .with_fighter(fighter)
            .with_subscription(create_test_subscription(fighter_id, |_| {}))
            .build_with_mocks();
        let server = TestServer::new(build_test_router(app_state)).unwrap();

        server
            .delete(&format!("/{fighter_id}"))
            .add_header("Authorization", admin_bearer())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        assert!(mocks.fighters.get_all().is_empty());
        assert!(mocks.subscriptions.get_all().is_empty());
    }
}
