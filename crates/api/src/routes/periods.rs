//! Accounting period close/reopen routes.
//!
//! The tenant and the acting user always come from the bearer token.

use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use periodlock_core::period::PeriodError;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::{AppState, middleware::AuthUser};

/// Creates the period routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/periods/close", post(close_period))
        .route("/periods/reopen", post(reopen_period))
        .route("/periods/closed", get(list_closed_periods))
        .route("/periods/years/{year}", get(year_view))
        .route("/periods/{year}/{month}/history", get(period_history))
}

/// Request body naming a period.
#[derive(Debug, Deserialize)]
pub struct PeriodRequest {
    /// Calendar year.
    pub year: i32,
    /// Month number (1-12).
    pub month: u32,
}

/// POST `/periods/close` - Close a period.
async fn close_period(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<PeriodRequest>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return invalid_period_response(&rejection.body_text()),
    };
    match state
        .periods
        .close(auth.tenant_id(), auth.user_id(), payload.year, payload.month)
        .await
    {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => period_error_response(&e),
    }
}

/// POST `/periods/reopen` - Reopen a period.
async fn reopen_period(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<PeriodRequest>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return invalid_period_response(&rejection.body_text()),
    };
    match state
        .periods
        .reopen(auth.tenant_id(), auth.user_id(), payload.year, payload.month)
        .await
    {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => period_error_response(&e),
    }
}

/// GET `/periods/closed` - List closed periods in chronological order.
async fn list_closed_periods(State(state): State<AppState>, auth: AuthUser) -> Response {
    match state.periods.closed_periods(auth.tenant_id()).await {
        Ok(periods) => {
            (StatusCode::OK, Json(json!({ "closed_periods": periods }))).into_response()
        }
        Err(e) => period_error_response(&e),
    }
}

/// GET `/periods/years/{year}` - Twelve-month view with allowed actions.
async fn year_view(
    State(state): State<AppState>,
    auth: AuthUser,
    year: Result<Path<i32>, PathRejection>,
) -> Response {
    let Path(year) = match year {
        Ok(path) => path,
        Err(rejection) => return invalid_period_response(&rejection.body_text()),
    };
    match state.periods.year_view(auth.tenant_id(), year).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => period_error_response(&e),
    }
}

/// GET `/periods/{year}/{month}/history` - Audit trail of one period.
async fn period_history(
    State(state): State<AppState>,
    auth: AuthUser,
    period: Result<Path<(i32, u32)>, PathRejection>,
) -> Response {
    let Path((year, month)) = match period {
        Ok(path) => path,
        Err(rejection) => return invalid_period_response(&rejection.body_text()),
    };
    match state.periods.history(auth.tenant_id(), year, month).await {
        Ok(events) => (StatusCode::OK, Json(json!({ "events": events }))).into_response(),
        Err(e) => period_error_response(&e),
    }
}

/// Year or month that could not be read as integers never reaches the service.
fn invalid_period_response(detail: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "invalid_month_or_year",
            "message": format!("Invalid period: {detail}")
        })),
    )
        .into_response()
}

fn period_error_response(err: &PeriodError) -> Response {
    if let PeriodError::Storage(detail) = err {
        error!(error = %detail, "Period storage failure");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": err.error_code(),
                "message": "An error occurred"
            })),
        )
            .into_response();
    }

    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string()
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, header::AUTHORIZATION},
        middleware::from_fn_with_state,
    };
    use chrono::NaiveDate;
    use http_body_util::BodyExt;
    use periodlock_core::period::{
        InMemoryCompanyDirectory, InMemoryPeriodLedger, PeriodLifecycleService, PeriodPolicy,
    };
    use periodlock_shared::types::{TenantId, UserId};
    use periodlock_shared::{JwtConfig, JwtService};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::middleware::auth::auth_middleware;

    struct TestApp {
        state: AppState,
        tenant: TenantId,
        user: UserId,
    }

    fn test_app() -> TestApp {
        let tenant = TenantId::new();
        let directory = InMemoryCompanyDirectory::new();
        directory.register(tenant, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());

        let periods = PeriodLifecycleService::new(
            Arc::new(InMemoryPeriodLedger::new()),
            Arc::new(directory),
            PeriodPolicy::default(),
        );

        TestApp {
            state: AppState {
                periods: Arc::new(periods),
                jwt_service: Arc::new(JwtService::new(JwtConfig::default())),
            },
            tenant,
            user: UserId::new(),
        }
    }

    impl TestApp {
        fn router(&self) -> Router {
            Router::new()
                .merge(routes())
                .layer(from_fn_with_state(self.state.clone(), auth_middleware))
                .with_state(self.state.clone())
        }

        fn token_for(&self, tenant: TenantId) -> String {
            self.state
                .jwt_service
                .generate_access_token(self.user, tenant, "accountant")
                .expect("should generate token")
        }

        async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            self.send_as(self.tenant, method, uri, body).await
        }

        async fn send_as(
            &self,
            tenant: TenantId,
            method: &str,
            uri: &str,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .header(AUTHORIZATION, format!("Bearer {}", self.token_for(tenant)))
                .header("Content-Type", "application/json")
                .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
                .unwrap();

            let response = self.router().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }
    }

    fn period(year: i32, month: u32) -> Option<Value> {
        Some(json!({ "year": year, "month": month }))
    }

    #[tokio::test]
    async fn test_requires_bearer_token() {
        let app = test_app();

        let response = app
            .router()
            .oneshot(
                Request::builder()
                    .uri("/periods/closed")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_rejects_invalid_token() {
        let app = test_app();

        let response = app
            .router()
            .oneshot(
                Request::builder()
                    .uri("/periods/closed")
                    .header(AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "invalid_token");
    }

    #[tokio::test]
    async fn test_close_returns_period_view() {
        let app = test_app();

        let (status, json) = app.send("POST", "/periods/close", period(2024, 6)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["year"], 2024);
        assert_eq!(json["month"], 6);
        assert_eq!(json["status"], "closed");
        assert_eq!(json["closed_by"], app.user.to_string());
        assert_eq!(json["can_reopen"], true);
        assert_eq!(json["can_close"], false);
    }

    #[tokio::test]
    async fn test_close_error_kinds() {
        let app = test_app();

        let (status, json) = app.send("POST", "/periods/close", period(2024, 5)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"], "period_before_operations_start");

        let (status, json) = app.send("POST", "/periods/close", period(2024, 7)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"], "predecessor_not_closed");
        assert_eq!(
            json["message"],
            "Cannot close 2024-07: previous period 2024-06 must be closed first"
        );

        let (status, json) = app.send("POST", "/periods/close", period(2024, 13)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_month_or_year");

        app.send("POST", "/periods/close", period(2024, 6)).await;
        let (status, json) = app.send("POST", "/periods/close", period(2024, 6)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"], "period_already_closed");
    }

    #[tokio::test]
    async fn test_unparseable_period_keeps_error_shape() {
        let app = test_app();

        for body in [
            json!({ "year": 2024, "month": -1 }),
            json!({ "year": 2024, "month": "june" }),
            json!({ "year": 2024 }),
        ] {
            for uri in ["/periods/close", "/periods/reopen"] {
                let (status, json) = app.send("POST", uri, Some(body.clone())).await;
                assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {body}");
                assert_eq!(json["error"], "invalid_month_or_year");
                assert!(json["message"].is_string());
            }
        }

        let (status, json) = app.send("GET", "/periods/2024/-1/history", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_month_or_year");

        let (status, json) = app.send("GET", "/periods/years/next", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_month_or_year");

        let (status, json) = app.send("GET", "/periods/2024/13/history", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_month_or_year");
    }

    #[tokio::test]
    async fn test_reopen_error_kinds() {
        let app = test_app();

        let (status, json) = app.send("POST", "/periods/reopen", period(2024, 6)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"], "period_already_open");

        app.send("POST", "/periods/close", period(2024, 6)).await;
        app.send("POST", "/periods/close", period(2024, 7)).await;
        let (status, json) = app.send("POST", "/periods/reopen", period(2024, 6)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"], "successor_still_closed");

        let (status, json) = app.send("POST", "/periods/reopen", period(2024, 7)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "open");
    }

    #[tokio::test]
    async fn test_unknown_tenant_is_not_found() {
        let app = test_app();

        let (status, json) = app
            .send_as(TenantId::new(), "GET", "/periods/closed", None)
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "tenant_not_found");
    }

    #[tokio::test]
    async fn test_list_closed_periods() {
        let app = test_app();
        app.send("POST", "/periods/close", period(2024, 6)).await;
        app.send("POST", "/periods/close", period(2024, 7)).await;

        let (status, json) = app.send("GET", "/periods/closed", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["closed_periods"],
            json!([{ "year": 2024, "month": 6 }, { "year": 2024, "month": 7 }])
        );
    }

    #[tokio::test]
    async fn test_year_view() {
        let app = test_app();
        app.send("POST", "/periods/close", period(2024, 6)).await;

        let (status, json) = app.send("GET", "/periods/years/2024", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["year"], 2024);
        assert_eq!(json["operations_start"], json!({ "year": 2024, "month": 6 }));
        let periods = json["periods"].as_array().unwrap();
        assert_eq!(periods.len(), 12);
        assert_eq!(periods[5]["status"], "closed");
        assert_eq!(periods[5]["can_reopen"], true);
        assert_eq!(periods[6]["can_close"], true);
        assert_eq!(periods[4]["can_close"], false);
    }

    #[tokio::test]
    async fn test_period_history() {
        let app = test_app();
        app.send("POST", "/periods/close", period(2024, 6)).await;
        app.send("POST", "/periods/reopen", period(2024, 6)).await;

        let (status, json) = app.send("GET", "/periods/2024/6/history", None).await;

        assert_eq!(status, StatusCode::OK);
        let events = json["events"].as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["action"], "closed");
        assert_eq!(events[1]["action"], "reopened");
        assert_eq!(events[1]["actor"], app.user.to_string());
    }

    #[test]
    fn test_storage_errors_hide_detail() {
        let response = period_error_response(&PeriodError::Storage("connection reset".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
