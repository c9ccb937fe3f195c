use std::sync::Arc;

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use super::page::{render_page, Outcome};
use super::AppState;
use crate::classifier::{Article, ArticlePreview, Category, Classification, ClassifierError, NewsClassifier};

/// Fields posted by the HTML form.
#[derive(Debug, Default, Deserialize)]
pub struct ClassifyForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl From<ClassifyForm> for Article {
    fn from(form: ClassifyForm) -> Self {
        Article::new(form.description).with_title(form.title)
    }
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub label: i64,
    pub category: Option<Category>,
    pub category_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<std::collections::BTreeMap<Category, f32>>,
    pub preview: ArticlePreview,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler for GET /health
pub async fn health_handler() -> &'static str {
    "OK"
}

/// Handler for GET /
pub async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_page(None, None, state.preview_chars))
}

/// Handler for POST /classify (HTML form)
pub async fn classify_form_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ClassifyForm>,
) -> Html<String> {
    let article = Article::from(form);
    let outcome = match run_classification(Arc::clone(&state.classifier), article.clone()).await {
        Ok(classification) => Outcome::Classified(classification),
        Err(e) => Outcome::Failed(e),
    };
    Html(render_page(Some(&article), Some(&outcome), state.preview_chars))
}

/// Handler for POST /api/classify (JSON)
pub async fn classify_api_handler(State(state): State<Arc<AppState>>, Json(article): Json<Article>) -> Response {
    let preview = article.preview(state.preview_chars);
    match run_classification(Arc::clone(&state.classifier), article).await {
        Ok(classification) => Json(ClassifyResponse {
            label: classification.label,
            category: classification.category,
            category_name: classification.category_name(),
            probabilities: classification.probabilities,
            preview,
        })
        .into_response(),
        Err(e) => {
            let status = status_for(&e);
            (status, Json(ErrorResponse { error: e.to_string() })).into_response()
        }
    }
}

/// Maps a classification failure to an HTTP status.
pub fn status_for(error: &ClassifierError) -> StatusCode {
    match error {
        ClassifierError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ClassifierError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Runs the classifier off the async executor. Inference failures, including
/// a panicked worker, come back as errors.
async fn run_classification(
    classifier: Arc<NewsClassifier>,
    article: Article,
) -> Result<Classification, ClassifierError> {
    let result = tokio::task::spawn_blocking(move || classifier.classify(&article))
        .await
        .unwrap_or_else(|e| Err(ClassifierError::PredictionError(format!("Classification task failed: {}", e))));

    match &result {
        Ok(classification) => info!("Request classified as {}", classification.category_name()),
        Err(e) if e.is_validation() => warn!("Rejected submission: {}", e),
        Err(e) => error!("Classification unavailable: {}", e),
    }
    result
}
