//! HTTP front end.
//!
//! `GET /gen` deals a random level and redirects to its page. `GET /state`
//! shows a level together with the first step of a shortest solution and a
//! link to the level after that step, so following the links plays the
//! solution one pour at a time. `POST /api/solve` returns a whole solution as
//! JSON.

use crate::codec;
use crate::engine::{Bottle, State, Step};
use crate::error::{ParseError, PourError, SolveError, ValidationError};
use crate::solver::{self, Solution, SolverConfig};
use axum::extract::{self, Query};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error};

/// Settings shared by all handlers.
#[derive(Clone, Debug)]
pub struct WebConfig {
    /// Number of colors of generated levels.
    pub colors: u8,
    /// Slots per bottle of generated levels.
    pub size: usize,
    pub solver: SolverConfig,
}

impl Default for WebConfig {
    fn default() -> Self {
        WebConfig {
            colors: 10,
            size: 4,
            solver: SolverConfig::default(),
        }
    }
}

/// Errors a handler can answer with.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("the required 'state' parameter is missing")]
    MissingState,

    #[error("failed to parse the 'state' parameter: {0}")]
    BadState(ParseError),

    #[error("invalid level: {0}")]
    InvalidLevel(#[from] ValidationError),

    #[error(transparent)]
    Solve(#[from] SolveError),

    #[error("solver produced an inapplicable step: {0}")]
    Pour(#[from] PourError),

    #[error("solver task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::MissingState | AppError::BadState(_) | AppError::InvalidLevel(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Solve(SolveError::NoSolution { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Solve(SolveError::BudgetExhausted { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Pour(_) | AppError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            error!(error = %self, "request failed");
            return (status, "Internal server error").into_response();
        }
        debug!(error = %self, %status, "rejecting request");
        (status, self.to_string()).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct StateQuery {
    state: Option<String>,
}

/// Builds the router with all routes.
///
/// # Errors
/// `ValidationError::ZeroCapacity` if `config.size` is zero, since `/gen`
/// could not deal a level with it.
pub fn router(config: WebConfig) -> Result<Router, ValidationError> {
    if config.size == 0 {
        return Err(ValidationError::ZeroCapacity);
    }
    Ok(Router::new()
        .route("/", get(|| async { Redirect::to("/gen") }))
        .route("/gen", get(generate_state))
        .route("/state", get(show_state))
        .route("/api/solve", post(solve_level))
        .with_state(Arc::new(config)))
}

/// Path of the page showing `state`.
///
/// The compact text form only uses digits, `-` and `_`, so it needs no
/// percent-encoding.
pub fn state_url(state: &State) -> String {
    format!("/state?state={}", codec::state_to_text(state))
}

async fn generate_state(extract::State(config): extract::State<Arc<WebConfig>>) -> Redirect {
    let mut rng = SmallRng::from_entropy();
    let state = State::new_random(config.colors, config.size, &mut rng);
    debug!(colors = config.colors, size = config.size, "generated level");
    Redirect::to(&state_url(&state))
}

async fn show_state(
    extract::State(config): extract::State<Arc<WebConfig>>,
    Query(query): Query<StateQuery>,
) -> Result<Html<String>, AppError> {
    let text = query
        .state
        .filter(|s| !s.is_empty())
        .ok_or(AppError::MissingState)?;
    let state = codec::state_from_text(&text).map_err(AppError::BadState)?;

    if state.is_solved() {
        return Ok(Html(render_state_page(&state, None)));
    }

    let solution = solve_blocking(state.clone(), config.solver.clone()).await?;
    let Some(&step) = solution.steps.first() else {
        return Ok(Html(render_state_page(&state, None)));
    };
    let mut next = state.clone();
    next.apply(&step)?;

    Ok(Html(render_state_page(&state, Some((step, &next)))))
}

async fn solve_level(
    extract::State(config): extract::State<Arc<WebConfig>>,
    Json(level): Json<Vec<Bottle>>,
) -> Result<Json<Solution>, AppError> {
    let state = State::new(level)?;
    let solution = solve_blocking(state, config.solver.clone()).await?;
    Ok(Json(solution))
}

/// Runs the search on the blocking thread pool.
async fn solve_blocking(state: State, config: SolverConfig) -> Result<Solution, AppError> {
    let solution =
        tokio::task::spawn_blocking(move || solver::find_solution_with_config(&state, &config))
            .await??;
    Ok(solution)
}

fn render_state_page(state: &State, next: Option<(Step, &State)>) -> String {
    let mut page = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Water Sort</title>\n\
         <style>\n\
         .bottles { display: flex; gap: 1em; }\n\
         .bottle { display: flex; flex-direction: column; border: 2px solid #444; \
         border-top: none; border-radius: 0 0 1em 1em; overflow: hidden; }\n\
         .slot { width: 2.5em; height: 2.5em; }\n\
         .number { text-align: center; }\n\
         </style>\n</head>\n<body>\n<div class=\"bottles\">\n",
    );

    for (i, bottle) in state.bottles().iter().enumerate() {
        page.push_str("<div>\n<div class=\"bottle\">\n");
        for color in bottle.colors().iter().rev() {
            page.push_str(&format!(
                "<div class=\"slot\" title=\"{}\" style=\"background: {}\"></div>\n",
                color,
                color.css()
            ));
        }
        page.push_str(&format!(
            "</div>\n<div class=\"number\">{}</div>\n</div>\n",
            i + 1
        ));
    }
    page.push_str("</div>\n");

    match next {
        Some((step, next_state)) => {
            page.push_str(&format!(
                "<p>Pour bottle {} onto bottle {} ({}).</p>\n<p><a href=\"{}\">Next move</a></p>\n",
                step.from + 1,
                step.to + 1,
                step.color,
                state_url(next_state)
            ));
        }
        None => page.push_str("<p>Solved!</p>\n<p><a href=\"/gen\">New puzzle</a></p>\n"),
    }

    page.push_str("</body>\n</html>\n");
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::state_from_str_array;
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn get_path(app: &Router, uri: &str) -> Response {
        app.clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(response: &Response) -> String {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    /// Extracts the target of the "Next move" link.
    fn next_link(page: &str) -> Option<String> {
        let end = page.find("\">Next move</a>")?;
        let start = page[..end].rfind("href=\"")? + "href=\"".len();
        Some(page[start..end].to_string())
    }

    #[tokio::test]
    async fn test_root_redirects_to_generator() {
        let app = router(WebConfig::default()).unwrap();
        let response = get_path(&app, "/").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/gen");
    }

    #[tokio::test]
    async fn test_generate_redirects_to_valid_state() {
        let app = router(WebConfig {
            colors: 6,
            size: 3,
            ..WebConfig::default()
        })
        .unwrap();
        let response = get_path(&app, "/gen").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let target = location(&response);
        let text = target.strip_prefix("/state?state=").unwrap();
        let state = codec::state_from_text(text).unwrap();
        assert_eq!(state.len(), 8);
        assert_eq!(state.bottle_size(), 3);
    }

    #[tokio::test]
    async fn test_following_next_links_solves_the_level() {
        let app = router(WebConfig::default()).unwrap();
        let start = state_from_str_array(&["RB", "BR", "..", ".."]).unwrap();

        let mut url = state_url(&start);
        let mut moves = 0;
        loop {
            let response = get_path(&app, &url).await;
            assert_eq!(response.status(), StatusCode::OK);
            let page = body_string(response).await;
            match next_link(&page) {
                Some(next) => {
                    assert!(page.contains("Pour bottle"));
                    url = next;
                    moves += 1;
                }
                None => {
                    assert!(page.contains("Solved!"));
                    break;
                }
            }
            assert!(moves <= 3, "more moves than the shortest solution");
        }
        assert_eq!(moves, 3);
    }

    #[tokio::test]
    async fn test_state_page_renders_bottles() {
        let app = router(WebConfig::default()).unwrap();
        let response = get_path(&app, "/state?state=12-12_6-6_0-0_0-0").await;
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_string(response).await;
        assert_eq!(page.matches("class=\"slot\"").count(), 8);
        assert!(page.contains("title=\"Red\""));
        assert!(page.contains("Solved!"));
        assert!(next_link(&page).is_none());
    }

    #[tokio::test]
    async fn test_bad_state_parameter() {
        let app = router(WebConfig::default()).unwrap();
        for uri in [
            "/state",
            "/state?state=",
            "/state?state=1-x_0-0",
            "/state?state=12-12_0-0",
        ] {
            let response = get_path(&app, uri).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        }

        let response = get_path(&app, "/state").await;
        assert!(body_string(response).await.contains("'state' parameter is missing"));
    }

    #[tokio::test]
    async fn test_budget_exhausted_is_reported() {
        let app = router(WebConfig {
            solver: SolverConfig {
                max_states: Some(1),
                ..SolverConfig::default()
            },
            ..WebConfig::default()
        })
        .unwrap();
        let response = get_path(&app, "/state?state=12-1_1-12_0-0_0-0").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_zero_bottle_size_is_rejected() {
        let config = WebConfig {
            size: 0,
            ..WebConfig::default()
        };
        assert!(matches!(router(config), Err(ValidationError::ZeroCapacity)));
    }

    #[test]
    fn test_unsolvable_maps_to_unprocessable_entity() {
        let response = AppError::from(SolveError::NoSolution { explored_states: 7 }).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_api_solve() {
        let app = router(WebConfig::default()).unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/api/solve")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"[["Red","Blue"],["Blue","Red"],[0,0],[0,0]]"#))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["steps"].as_array().unwrap().len(), 3);
        assert!(body["explored_states"].as_u64().unwrap() > 0);
        assert!(body["steps"][0]["color"].is_string());

        let request = Request::builder()
            .method("POST")
            .uri("/api/solve")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"[["Red","Blue"],[0,0]]"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
