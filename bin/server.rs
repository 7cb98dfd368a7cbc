// Plant Linker - Web Server
// JSON API over the canonical datasets, insights and linking table

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use plant_linker::breakdown::{iso_breakdown, pnid_breakdown, LineSortOrder};
use plant_linker::export::{self, ExportDataset, ExportFormat};
use plant_linker::{
    compute_insights, filter_iso, filter_pnid, init_logging, link, Config, Dataset,
    FilterOptions, Filters, VERSION,
};

#[derive(Parser)]
#[command(name = "plant-linker-server")]
#[command(about = "HTTP API for PNID / isometric linking")]
#[command(version)]
struct Cli {
    /// Config file (default: $PLANT_LINKER_CONFIG or ./plant-linker.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override [server] bind
    #[arg(long)]
    bind: Option<String>,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    dataset: Arc<RwLock<Dataset>>,
}

impl AppState {
    fn new(config: Config, dataset: Dataset) -> Self {
        Self {
            config: Arc::new(config),
            dataset: Arc::new(RwLock::new(dataset)),
        }
    }

    fn load_from_config(&self) -> Result<Dataset> {
        Dataset::load(
            self.config.input.pnid_path.as_deref(),
            self.config.input.iso_path.as_deref(),
        )
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message.into()),
        }
    }
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::err(message))).into_response()
}

/// Filter query parameters shared by the data endpoints
#[derive(Debug, Default, Deserialize)]
struct FilterQuery {
    material: Option<String>,
    equipment_type: Option<String>,
    element_type: Option<String>,
}

impl FilterQuery {
    fn to_filters(&self) -> Filters {
        Filters::new(
            self.material.as_deref(),
            self.equipment_type.as_deref(),
            self.element_type.as_deref(),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SortQuery {
    sort: Option<String>,
    #[serde(flatten)]
    filters: FilterQuery,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    loaded_at: String,
    errors: Vec<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check plus load status
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let dataset = state.dataset.read().await;
    Json(ApiResponse::ok(HealthResponse {
        status: "OK",
        version: VERSION,
        loaded_at: dataset.loaded_at.to_rfc3339(),
        errors: dataset.errors.clone(),
    }))
}

/// GET /api/pnid - Filtered PNID dataset
async fn get_pnid(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> impl IntoResponse {
    let dataset = state.dataset.read().await;
    Json(ApiResponse::ok(filter_pnid(&dataset.pnid, &query.to_filters())))
}

/// GET /api/iso - Filtered ISO dataset
async fn get_iso(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> impl IntoResponse {
    let dataset = state.dataset.read().await;
    Json(ApiResponse::ok(filter_iso(&dataset.iso, &query.to_filters())))
}

/// GET /api/insights - Insights over the filtered view
async fn get_insights(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> impl IntoResponse {
    let dataset = state.dataset.read().await;
    let filters = query.to_filters();
    let pnid = filter_pnid(&dataset.pnid, &filters);
    let iso = filter_iso(&dataset.iso, &filters);

    Json(ApiResponse::ok(compute_insights(
        &pnid,
        &iso,
        state.config.insights.top_materials,
    )))
}

#[derive(Serialize)]
struct LinkingResponse {
    summary: plant_linker::LinkingSummary,
    rows: Vec<plant_linker::LinkRow>,
}

/// GET /api/linking?search= - Linking table, optionally searched
async fn get_linking(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let dataset = state.dataset.read().await;
    let report = link(&dataset.pnid.lines, &dataset.iso.elements);
    let rows = match query.search.as_deref() {
        Some(text) => report.search(text),
        None => report.rows(),
    };

    Json(ApiResponse::ok(LinkingResponse {
        summary: report.summary(),
        rows,
    }))
}

/// GET /api/linking/:line_id - Rows for one line id
///
/// `Path` has already percent-decoded the segment; decoding again would
/// mangle ids containing a literal '%'.
async fn get_linking_for_line(
    State(state): State<AppState>,
    Path(line_id): Path<String>,
) -> Response {
    let dataset = state.dataset.read().await;
    let rows = link(&dataset.pnid.lines, &dataset.iso.elements).rows_for_line(&line_id);

    if rows.is_empty() {
        return failure(StatusCode::NOT_FOUND, format!("No line or element references {}", line_id));
    }
    (StatusCode::OK, Json(ApiResponse::ok(rows))).into_response()
}

/// GET /api/breakdown/pnid?sort= - PNID breakdown tables
async fn get_pnid_breakdown(
    State(state): State<AppState>,
    Query(query): Query<SortQuery>,
) -> Response {
    let order = match query.sort.as_deref() {
        Some(raw) => match raw.parse::<LineSortOrder>() {
            Ok(order) => order,
            Err(e) => return failure(StatusCode::BAD_REQUEST, e.to_string()),
        },
        None => LineSortOrder::default(),
    };

    let dataset = state.dataset.read().await;
    let pnid = filter_pnid(&dataset.pnid, &query.filters.to_filters());
    (StatusCode::OK, Json(ApiResponse::ok(pnid_breakdown(&pnid, order)))).into_response()
}

/// GET /api/breakdown/iso - ISO breakdown tables
async fn get_iso_breakdown(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> impl IntoResponse {
    let dataset = state.dataset.read().await;
    let iso = filter_iso(&dataset.iso, &query.to_filters());
    Json(ApiResponse::ok(iso_breakdown(&iso)))
}

/// GET /api/filters/options - Values the UI can filter on
async fn get_filter_options(State(state): State<AppState>) -> impl IntoResponse {
    let dataset = state.dataset.read().await;
    Json(ApiResponse::ok(FilterOptions::collect(&dataset.pnid, &dataset.iso)))
}

/// GET /api/export/:dataset/:format - Raw CSV / JSON download
async fn export_dataset(
    State(state): State<AppState>,
    Path((dataset_name, format_name)): Path<(String, String)>,
    Query(query): Query<FilterQuery>,
) -> Response {
    let which = match dataset_name.parse::<ExportDataset>() {
        Ok(which) => which,
        Err(e) => return failure(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let format = match format_name.parse::<ExportFormat>() {
        Ok(format) => format,
        Err(e) => return failure(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let dataset = state.dataset.read().await;
    let filters = query.to_filters();
    let records = match which {
        ExportDataset::Pnid => export::pnid_records(&filter_pnid(&dataset.pnid, &filters)),
        ExportDataset::Iso => export::iso_records(&filter_iso(&dataset.iso, &filters)),
    };

    match records.and_then(|records| export::render(&records, format)) {
        Ok(body) => {
            let disposition = format!(
                "attachment; filename=\"{}.{}\"",
                which.file_stem(),
                format.extension()
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, format.content_type().to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Export failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// POST /api/reload - Re-read input files and replace the dataset
async fn reload(State(state): State<AppState>) -> Response {
    let loader = state.clone();
    let loaded = tokio::task::spawn_blocking(move || loader.load_from_config()).await;

    match loaded {
        Ok(Ok(dataset)) => {
            let summary = compute_insights(
                &dataset.pnid,
                &dataset.iso,
                state.config.insights.top_materials,
            )
            .summary();
            tracing::info!("Reloaded: {}", summary);

            let errors = dataset.errors.clone();
            *state.dataset.write().await = dataset;
            (StatusCode::OK, Json(ApiResponse::ok(errors))).into_response()
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Reload failed, keeping previous dataset");
            failure(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
        }
        Err(e) => failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

// ============================================================================
// Router
// ============================================================================

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/pnid", get(get_pnid))
        .route("/iso", get(get_iso))
        .route("/insights", get(get_insights))
        .route("/linking", get(get_linking))
        .route("/linking/:line_id", get(get_linking_for_line))
        .route("/breakdown/pnid", get(get_pnid_breakdown))
        .route("/breakdown/iso", get(get_iso_breakdown))
        .route("/filters/options", get(get_filter_options))
        .route("/export/:dataset/:format", get(export_dataset))
        .route("/reload", post(reload))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = Config::resolve_path(cli.config.as_deref());
    let mut config = Config::load(&config_path)?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    init_logging(&config.logging)?;

    println!("🌐 Plant Linker - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Upstream failures still start the server with empty data
    let dataset = Dataset::load(
        config.input.pnid_path.as_deref(),
        config.input.iso_path.as_deref(),
    )?;
    for error in &dataset.errors {
        eprintln!("⚠️  {}", error);
    }

    let bind = config.server.bind.clone();
    let app = build_router(AppState::new(config, dataset));

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;

    println!("\n🚀 Server running on http://{}", bind);
    println!("   API: http://{}/api/insights", bind);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use plant_linker::{normalize_iso_value, normalize_pnid_value};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn state() -> AppState {
        let pnid = normalize_pnid_value(&json!({
            "equipment": [{"id": "P-1", "type": "Pump", "material": "CS"}],
            "lines": [
                {"line_id": "L/100", "size": "DN150", "material": "CS"},
                {"line_id": "L-101", "size": "2 in", "material": "SS"},
                {"line_id": "L%41", "size": "4 in", "material": "CS"}
            ]
        }));
        let iso = normalize_iso_value(&json!({
            "rows": [
                {"id": "el-1", "type": "pipe", "material": "CS", "quantity": 6, "line_number": "L/100"},
                {"id": "el-2", "type": "weld", "material": "CS", "line_number": "L-999"}
            ]
        }));

        let dataset = Dataset {
            pnid,
            iso,
            ..Dataset::default()
        };
        AppState::new(Config::default(), dataset)
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let response = build_router(state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["status"], json!("OK"));
    }

    #[tokio::test]
    async fn test_insights_endpoint() {
        let (status, body) = get_json("/api/insights").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["linking"]["linked_lines"], json!(1));
        assert_eq!(body["data"]["linking"]["coverage_percent"], json!(33));
    }

    #[tokio::test]
    async fn test_linking_summary_and_search() {
        let (_, body) = get_json("/api/linking").await;
        assert_eq!(body["data"]["summary"]["total"], json!(4));

        let (_, body) = get_json("/api/linking?search=weld").await;
        assert_eq!(body["data"]["rows"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"]["rows"][0]["status"], json!("unlinked-iso"));
    }

    #[tokio::test]
    async fn test_linking_by_encoded_line_id() {
        let (status, body) = get_json("/api/linking/L%2F100").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["line_id"], json!("L/100"));

        // A literal '%' in the id survives exactly one decode
        let (status, body) = get_json("/api/linking/L%2541").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["line_id"], json!("L%41"));

        let (status, body) = get_json("/api/linking/NOPE").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_bad_sort_is_rejected() {
        let (status, _) = get_json("/api/breakdown/pnid?sort=sideways").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_export_csv_headers() {
        let response = build_router(state())
            .oneshot(
                Request::builder()
                    .uri("/api/export/iso/csv?material=CS")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}
