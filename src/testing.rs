//! In-process mercado service for tests
//!
//! An axum server on an ephemeral port with the same routes, status codes and
//! body shapes as the hosted API. Runs on its own thread and runtime so it
//! works under any test flavor.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::net::TcpListener as StdTcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use tokio::runtime::Builder;
use tokio::sync::oneshot;

#[derive(Default)]
struct StubState {
    next_id: u64,
    mercados: BTreeMap<u64, Value>,
    fail_creates: bool,
    corrupt_ids: bool,
}

type Shared = Arc<Mutex<StubState>>;

/// Handle for the stub server; shuts it down on drop
pub struct MercadoStub {
    base_url: String,
    state: Shared,
    shutdown: Option<oneshot::Sender<()>>,
    join: Option<thread::JoinHandle<()>>,
}

impl MercadoStub {
    pub async fn start() -> Self {
        let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();

        let state: Shared = Arc::new(Mutex::new(StubState {
            next_id: 1,
            ..StubState::default()
        }));
        let app = Router::new()
            .route("/mercado", get(list).post(create))
            .route("/mercado/:id", get(fetch).put(update).delete(remove))
            .with_state(Arc::clone(&state));

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let join = thread::spawn(move || {
            let runtime = Builder::new_current_thread().enable_all().build().unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                let _ = axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown_rx.await;
                    })
                    .await;
            });
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            shutdown: Some(shutdown_tx),
            join: Some(join),
        }
    }

    pub fn base_url(&self) -> String {
        self.base_url.clone()
    }

    /// Insert `n` mercados with the next ids
    pub fn seed(&self, n: usize) {
        let mut state = self.state.lock().unwrap();
        for i in 0..n {
            let id = state.next_id;
            state.next_id += 1;
            state.mercados.insert(
                id,
                json!({
                    "id": id,
                    "nome": format!("Mercado Semente {i}"),
                    "endereco": "Rua das Flores, 1",
                    "cnpj": "11222333000181",
                }),
            );
        }
    }

    /// Store a row without a cnpj, bypassing validation
    pub fn seed_malformed(&self) {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.mercados.insert(
            id,
            json!({"id": id, "nome": "Mercado Incompleto", "endereco": "Rua Sem Numero"}),
        );
    }

    /// Answer every create with 500
    pub fn fail_creates(&self) {
        self.state.lock().unwrap().fail_creates = true;
    }

    /// Answer fetch by id with the wrong id
    pub fn corrupt_ids(&self) {
        self.state.lock().unwrap().corrupt_ids = true;
    }

    pub fn count(&self) -> usize {
        self.state.lock().unwrap().mercados.len()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.state.lock().unwrap().mercados.contains_key(&id)
    }
}

impl Drop for MercadoStub {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Accepts connections and never answers, so every request times out
pub struct SilentServer {
    base_url: String,
    task: tokio::task::JoinHandle<()>,
}

impl SilentServer {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            task,
        }
    }

    pub fn base_url(&self) -> String {
        self.base_url.clone()
    }
}

impl Drop for SilentServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn invalid(body: &Value) -> Option<&'static str> {
    match body.get("nome").and_then(Value::as_str) {
        Some(nome) if !nome.trim().is_empty() => {}
        _ => return Some("nome is required"),
    }
    match body.get("cnpj").and_then(Value::as_str) {
        Some(cnpj) if cnpj.len() == 14 && cnpj.chars().all(|c| c.is_ascii_digit()) => {}
        _ => return Some("cnpj must have 14 digits"),
    }
    if body.get("endereco").and_then(Value::as_str).is_none() {
        return Some("endereco is required");
    }
    None
}

fn stored(id: u64, body: &Value) -> Value {
    json!({
        "id": id,
        "nome": body["nome"],
        "endereco": body["endereco"],
        "cnpj": body["cnpj"],
    })
}

fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"message": "Mercado não encontrado"})),
    )
}

async fn list(State(state): State<Shared>) -> Json<Value> {
    let state = state.lock().unwrap();
    Json(Value::Array(state.mercados.values().cloned().collect()))
}

async fn create(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    if state.fail_creates {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "internal error"})),
        );
    }
    if let Some(reason) = invalid(&body) {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": reason})));
    }

    let id = state.next_id;
    state.next_id += 1;
    let mercado = stored(id, &body);
    state.mercados.insert(id, mercado.clone());

    (
        StatusCode::CREATED,
        Json(json!({"message": "Mercado criado com sucesso", "mercado": mercado})),
    )
}

async fn fetch(State(state): State<Shared>, Path(id): Path<u64>) -> (StatusCode, Json<Value>) {
    let state = state.lock().unwrap();
    match state.mercados.get(&id) {
        Some(mercado) => {
            let mut mercado = mercado.clone();
            if state.corrupt_ids {
                mercado["id"] = json!(id + 1000);
            }
            (StatusCode::OK, Json(mercado))
        }
        None => not_found(),
    }
}

async fn update(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    if !state.mercados.contains_key(&id) {
        return not_found();
    }
    if let Some(reason) = invalid(&body) {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": reason})));
    }

    let mercado = stored(id, &body);
    state.mercados.insert(id, mercado.clone());
    (StatusCode::OK, Json(mercado))
}

async fn remove(State(state): State<Shared>, Path(id): Path<u64>) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    match state.mercados.remove(&id) {
        Some(_) => (
            StatusCode::OK,
            Json(json!({"message": "Mercado removido com sucesso"})),
        ),
        None => not_found(),
    }
}
