//! The HTTP face of the editor. Every mutating route funnels its event
//! through the single [`Session`] behind a mutex, then pushes the fresh
//! state to all subscribed browsers over SSE. The bundled optimisation
//! service also lives here, mounted at `POST /optimize` so a default
//! setup needs exactly one process.

mod assets;

use std::{
    collections::BTreeMap,
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use anyhow::{Context as _, Result};
use axum::body::Body;
use axum::http::StatusCode;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{info, warn};

use crate::{
    catalog::{BuildingKind, TerrainKind},
    client::{OptimiseRequest, OptimiserClient},
    codec,
    grid::{City, Coord},
    overlay::MarketEntry,
    session::{OverlayOutcome, PointerEvent, Session, Tool},
    solver,
};

/// Everything a browser needs to draw one frame of the editor.
#[derive(Debug, Clone, Serialize)]
pub struct StateView {
    pub rows: u32,
    pub cols: u32,
    pub tiles: BTreeMap<String, TerrainKind>,
    pub cities: Vec<City>,
    pub active_tool: Option<String>,
    pub pointer_engaged: bool,
    pub revision: u64,
    pub overlay: OverlayView,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverlayView {
    pub placements: BTreeMap<String, BuildingKind>,
    pub markets: Vec<MarketEntry>,
    pub total_income: i64,
    pub burns: Vec<String>,
}

fn state_view(session: &Session) -> StateView {
    let grid = session.grid();
    let overlay = session.overlay();
    let mut burns: Vec<String> = overlay.burns().iter().map(|c| codec::tile_key(*c)).collect();
    burns.sort();
    StateView {
        rows: grid.rows(),
        cols: grid.cols(),
        tiles: grid
            .tiles()
            .iter()
            .map(|(coord, kind)| (codec::tile_key(*coord), *kind))
            .collect(),
        cities: grid.cities().to_vec(),
        active_tool: session.active_tool().map(|tool| tool.id().to_string()),
        pointer_engaged: session.pointer_engaged(),
        revision: session.revision(),
        overlay: OverlayView {
            placements: overlay
                .placements()
                .iter()
                .map(|(coord, building)| (codec::tile_key(*coord), *building))
                .collect(),
            markets: overlay.markets().to_vec(),
            total_income: overlay.total_income(),
            burns,
        },
    }
}

struct AppState {
    session: Mutex<Session>,
    client: OptimiserClient,
    broadcaster: broadcast::Sender<String>,
}

fn lock_session(state: &AppState) -> MutexGuard<'_, Session> {
    state.session.lock().expect("session lock poisoned")
}

fn broadcast_view(state: &AppState, view: &StateView) {
    if let Ok(payload) = serde_json::to_string(view) {
        let _ = state.broadcaster.send(payload);
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: message.into() })).into_response()
}

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// External optimisation service; defaults to the bundled one on
    /// this server's own address.
    pub optimiser_url: Option<String>,
    pub session: Session,
}

pub struct EditorServer {
    listener: TcpListener,
    router: Router,
    addr: SocketAddr,
}

impl EditorServer {
    /// Binds the listener without serving yet, so callers can learn the
    /// actual address when the config asked for port 0.
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let requested: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;
        let listener = TcpListener::bind(requested)
            .await
            .with_context(|| format!("failed to bind {requested}"))?;
        let addr = listener.local_addr().context("listener has no local address")?;

        let optimiser_url = config
            .optimiser_url
            .unwrap_or_else(|| format!("http://{addr}"));
        let client = OptimiserClient::new(&optimiser_url)?;
        info!(url = %optimiser_url, "optimisation service endpoint");

        let (tx, _) = broadcast::channel::<String>(64);
        let state = Arc::new(AppState {
            session: Mutex::new(config.session),
            client,
            broadcaster: tx,
        });

        let router = Router::new()
            .route("/", get(index))
            .route("/styles.css", get(styles))
            .route("/app.js", get(script))
            .route("/api/state", get(current_state))
            .route("/api/tool", post(select_tool))
            .route("/api/pointer", post(pointer_event))
            .route("/api/resize", post(resize_grid))
            .route("/api/optimize", post(run_optimise))
            .route("/api/overlay/clear", post(clear_overlay))
            .route("/api/save", get(save_map))
            .route("/api/load", post(load_map))
            .route("/api/events", get(stream_events))
            .route("/optimize", post(optimize_service))
            .with_state(state);

        Ok(Self {
            listener,
            router,
            addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn serve(self) -> Result<()> {
        info!("editor live at http://{} (Ctrl+C to stop)", self.addr);
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

pub async fn run(config: ServerConfig) -> Result<()> {
    EditorServer::bind(config).await?.serve().await
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down editor");
}

async fn index() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

async fn styles() -> impl IntoResponse {
    Response::builder()
        .header(header::CONTENT_TYPE, "text/css; charset=utf-8")
        .body(assets::STYLES_CSS.to_string())
        .unwrap()
}

async fn script() -> impl IntoResponse {
    Response::builder()
        .header(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )
        .body(assets::APP_JS.to_string())
        .unwrap()
}

async fn current_state(State(state): State<Arc<AppState>>) -> Json<StateView> {
    Json(state_view(&lock_session(&state)))
}

#[derive(Debug, Deserialize)]
struct ToolSelect {
    tool: Option<String>,
}

async fn select_tool(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ToolSelect>,
) -> Response {
    let tool = match body.tool.as_deref() {
        None => None,
        Some(id) => match Tool::from_id(id) {
            Some(tool) => Some(tool),
            None => {
                return error_response(StatusCode::BAD_REQUEST, format!("unknown tool `{id}`"))
            }
        },
    };
    let view = {
        let mut session = lock_session(&state);
        session.select_tool(tool);
        state_view(&session)
    };
    broadcast_view(&state, &view);
    Json(view).into_response()
}

#[derive(Debug, Deserialize)]
struct PointerBody {
    event: String,
    row: Option<u32>,
    col: Option<u32>,
}

async fn pointer_event(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PointerBody>,
) -> Response {
    let coord = match (body.row, body.col) {
        (Some(row), Some(col)) => Some(Coord::new(row, col)),
        _ => None,
    };
    let event = match (body.event.as_str(), coord) {
        ("press", Some(coord)) => PointerEvent::Press(coord),
        ("enter", Some(coord)) => PointerEvent::Enter(coord),
        ("context", Some(coord)) => PointerEvent::Context(coord),
        ("release", _) => PointerEvent::Release,
        ("press" | "enter" | "context", None) => {
            return error_response(StatusCode::BAD_REQUEST, "pointer event needs row and col")
        }
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("unknown pointer event `{}`", body.event),
            )
        }
    };
    let view = {
        let mut session = lock_session(&state);
        session.pointer(event);
        state_view(&session)
    };
    broadcast_view(&state, &view);
    Json(view).into_response()
}

#[derive(Debug, Deserialize)]
struct ResizeBody {
    rows: i64,
    cols: i64,
}

async fn resize_grid(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ResizeBody>, JsonRejection>,
) -> Response {
    // Non-numeric dimensions never reach the session; they die at the parse.
    let Ok(Json(body)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "rows and cols must be numbers");
    };
    let (Ok(rows), Ok(cols)) = (u32::try_from(body.rows), u32::try_from(body.cols)) else {
        return error_response(StatusCode::BAD_REQUEST, "rows and cols out of range");
    };
    let view = {
        let mut session = lock_session(&state);
        match session.resize(rows, cols) {
            Ok(_) => state_view(&session),
            Err(err) => return error_response(StatusCode::BAD_REQUEST, err.to_string()),
        }
    };
    broadcast_view(&state, &view);
    Json(view).into_response()
}

#[derive(Debug, Serialize)]
struct OptimiseReply {
    outcome: &'static str,
    state: StateView,
}

async fn run_optimise(State(state): State<Arc<AppState>>) -> Response {
    let (ticket, request) = {
        let mut session = lock_session(&state);
        let request = OptimiseRequest::from_grid(session.grid());
        (session.begin_optimise(), request)
    };
    info!(
        tiles = request.tiles.len(),
        cities = request.cities.len(),
        "optimisation requested"
    );

    // The session lock is released while the request is in flight;
    // editing carries on and stale responses are dropped on return.
    let response = match state.client.optimise(&request).await {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "optimisation failed");
            return error_response(StatusCode::BAD_GATEWAY, err.to_string());
        }
    };

    let (outcome, view) = {
        let mut session = lock_session(&state);
        let outcome = session.apply_optimisation(ticket, response.into_result());
        (outcome, state_view(&session))
    };
    let label = match outcome {
        OverlayOutcome::Applied => "applied",
        OverlayOutcome::Superseded => "superseded",
        OverlayOutcome::StaleGrid => "stale_grid",
    };
    if outcome == OverlayOutcome::Applied {
        broadcast_view(&state, &view);
    } else {
        info!(outcome = label, "optimisation response dropped");
    }
    Json(OptimiseReply {
        outcome: label,
        state: view,
    })
    .into_response()
}

async fn clear_overlay(State(state): State<Arc<AppState>>) -> Response {
    let view = {
        let mut session = lock_session(&state);
        session.clear_overlay();
        state_view(&session)
    };
    broadcast_view(&state, &view);
    Json(view).into_response()
}

async fn save_map(State(state): State<Arc<AppState>>) -> Response {
    let text = lock_session(&state).save();
    let filename = format!("map-{}.json", chrono::Local::now().format("%Y-%m-%d_%H-%M-%S"));
    Response::builder()
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from(text))
        .unwrap()
}

async fn load_map(State(state): State<Arc<AppState>>, body: String) -> Response {
    let result = {
        let mut session = lock_session(&state);
        session.load(&body).map(|()| state_view(&session))
    };
    match result {
        Ok(view) => {
            info!(
                rows = view.rows,
                cols = view.cols,
                cities = view.cities.len(),
                "map loaded"
            );
            broadcast_view(&state, &view);
            Json(view).into_response()
        }
        Err(err) => {
            warn!(error = %err, "map load rejected");
            error_response(StatusCode::BAD_REQUEST, err.to_string())
        }
    }
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}

/// The bundled optimisation service. Stateless: solves exactly the grid
/// it is handed, so it also serves external callers.
async fn optimize_service(payload: Result<Json<OptimiseRequest>, JsonRejection>) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            warn!(error = %rejection, "rejected optimiser request body");
            return error_response(StatusCode::BAD_REQUEST, "invalid JSON body");
        }
    };
    let response = solver::solve(&request);
    info!(
        placements = response.placements.len(),
        total_income = response.total_income,
        "optimiser solved request"
    );
    Json(response).into_response()
}
