use actix_web::{HttpResponse, post, web};
use pagewatch_service::monitoring::PassSummary;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::state::AppState;

macros_utils::routes! {
    route trigger_check,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TriggerRequest {
    pub secret: Option<String>,
    /// Check every active site regardless of dueness
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct TriggerResponse {
    success: bool,
    #[serde(flatten)]
    summary: PassSummary,
}

/// Run one monitoring pass on behalf of an external scheduler
#[post("/api/monitor/check")]
pub async fn trigger_check(
    state: web::Data<AppState>,
    body: Option<web::Json<TriggerRequest>>,
) -> Result<HttpResponse, ApiError> {
    let request = body.map(web::Json::into_inner).unwrap_or_default();

    if !state.authorize(request.secret.as_deref()) {
        warn!("Rejected monitoring trigger with an invalid secret");
        return Err(ApiError::Unauthorized);
    }

    let pass = if request.force {
        state.orchestrator.run_all_checks().await
    } else {
        state.orchestrator.run_due_checks().await
    };
    let summary = pass.inspect_err(|err| error!("Triggered monitoring pass failed: {err}"))?;

    info!(
        "Triggered pass checked {} sites, {} incident-worthy",
        summary.checks_performed, summary.incidents_created
    );
    Ok(HttpResponse::Ok().json(TriggerResponse { success: true, summary }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use pagewatch_service::Orchestrator;
    use pagewatch_service::config::Config;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    use super::*;

    async fn state(secret: Option<&str>) -> (web::Data<AppState>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database.path = dir.path().join("server.db").to_string_lossy().into_owned();
        let orchestrator = Orchestrator::open(config).await.unwrap();
        let state = AppState::new(Arc::new(orchestrator), secret.map(str::to_string));
        (web::Data::new(state), dir)
    }

    #[actix_web::test]
    async fn test_wrong_secret_is_unauthorized() {
        let (state, _dir) = state(Some("s3cret")).await;
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/monitor/check")
            .set_json(json!({ "secret": "nope" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Unauthorized" }));
    }

    #[actix_web::test]
    async fn test_missing_body_is_unauthorized() {
        let (state, _dir) = state(Some("s3cret")).await;
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post().uri("/api/monitor/check").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_unset_secret_rejects_everything() {
        let (state, _dir) = state(None).await;
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/monitor/check")
            .set_json(json!({ "secret": "" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_valid_secret_runs_pass() {
        let (state, _dir) = state(Some("s3cret")).await;
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/monitor/check")
            .set_json(json!({ "secret": "s3cret", "force": true }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["checksPerformed"], 0);
        assert_eq!(body["incidentsCreated"], 0);
        assert_eq!(body["results"], json!([]));
    }
}
