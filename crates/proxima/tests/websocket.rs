//! End-to-end tests over a real WebSocket: JWT cookie in the handshake,
//! JSON event frames both ways.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::{SinkExt, StreamExt};
use jsonwebtoken::{EncodingKey, Header, encode};
use proxima::prelude::*;
use serde_json::{Value, json};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;

const SECRET: &[u8] = b"integration-secret";

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

// =========================================================================
// Helpers
// =========================================================================

fn token_for(id: &str) -> String {
    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        + 3600;
    encode(
        &Header::default(),
        &json!({ "id": id, "exp": exp }),
        &EncodingKey::from_secret(SECRET),
    )
    .unwrap()
}

fn seed() -> SeedData {
    SeedData::from_json(
        r#"{
            "principals": [{ "id": "u1", "displayName": "Ada" }],
            "locations": [
                {
                    "id": "town-hall",
                    "name": "Town Hall",
                    "description": "Gothic, 15th century",
                    "coordinates": { "type": "Point", "coordinates": [4.7009, 50.8789] },
                    "audioFiles": [
                        { "title": "Facade", "fileUrl": "https://cdn.example/facade.mp3", "duration": 94.5 }
                    ]
                },
                {
                    "id": "library",
                    "name": "University Library",
                    "coordinates": { "type": "Point", "coordinates": [4.7079, 50.8787] }
                }
            ]
        }"#,
    )
    .expect("valid seed")
}

struct Running {
    addr: String,
    store: Arc<MemoryStore>,
    registry: Arc<ConnectionRegistry>,
    stop: oneshot::Sender<()>,
    server: tokio::task::JoinHandle<Result<(), ProximaError>>,
}

async fn start_server() -> Running {
    start_server_with(|builder| builder).await
}

async fn start_server_with(
    configure: impl FnOnce(ProximaServerBuilder) -> ProximaServerBuilder,
) -> Running {
    let store = Arc::new(MemoryStore::from_seed(seed()));
    let server = configure(ProximaServer::builder().bind("127.0.0.1:0"))
        .build(
            JwtVerifier::hs256(SECRET),
            Arc::new(MemoryCacheTier::new()),
            Arc::clone(&store),
        )
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let registry = server.registry();

    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(server.run_until(async move {
        let _ = stopped.await;
    }));

    Running {
        addr,
        store,
        registry,
        stop,
        server,
    }
}

async fn connect(addr: &str, cookie: Option<&str>) -> ClientWs {
    let mut request = format!("ws://{addr}")
        .into_client_request()
        .expect("valid request");
    if let Some(cookie) = cookie {
        request
            .headers_mut()
            .insert("Cookie", HeaderValue::from_str(cookie).expect("valid header"));
    }
    let (ws, _) = tokio_tungstenite::connect_async(request)
        .await
        .expect("should connect");
    ws
}

async fn send_update(ws: &mut ClientWs, longitude: f64, latitude: f64) {
    let frame = json!({
        "event": "updateLocation",
        "data": { "longitude": longitude, "latitude": latitude },
    });
    ws.send(Message::text(frame.to_string()))
        .await
        .expect("send update");
}

/// Next JSON frame, skipping control frames; `None` once closed.
async fn next_event(ws: &mut ClientWs) -> Option<Value> {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("server should answer or close");
        match msg {
            Some(Ok(frame @ (Message::Text(_) | Message::Binary(_)))) => {
                let data = frame.into_data();
                return Some(serde_json::from_slice(&data).expect("server frames are JSON"));
            }
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return None,
            Some(Ok(_)) => continue,
        }
    }
}

async fn wait_until<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if condition().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_cookie_authenticated_update_gets_nearby_locations() {
    let running = start_server().await;
    let cookie = format!("lang=en; token={}", token_for("u1"));
    let mut ws = connect(&running.addr, Some(&cookie)).await;

    send_update(&mut ws, 4.70, 50.88).await;
    let event = next_event(&mut ws).await.expect("an answer");

    assert_eq!(event["event"], "nearbyLocations");
    let records = event["data"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["id"], "town-hall");
    assert_eq!(records[0]["coordinates"]["type"], "Point");
    assert_eq!(records[0]["audioFiles"][0]["fileUrl"], "https://cdn.example/facade.mp3");
    assert_eq!(records[1]["id"], "library");

    assert_eq!(running.store.is_online(&PrincipalId::new("u1")).await, Some(true));
    assert_eq!(running.registry.active_count().await, 1);

    ws.close(None).await.expect("client close");
    let store = Arc::clone(&running.store);
    wait_until(|| {
        let store = Arc::clone(&store);
        async move { store.is_online(&PrincipalId::new("u1")).await == Some(false) }
    })
    .await;
    assert_eq!(running.registry.active_count().await, 0);
}

#[tokio::test]
async fn test_missing_cookie_is_refused_with_connect_error() {
    let running = start_server().await;
    let mut ws = connect(&running.addr, None).await;

    let event = next_event(&mut ws).await.expect("a refusal");
    assert_eq!(event["event"], "connectError");
    assert_eq!(event["data"]["message"], "authentication required");

    assert!(next_event(&mut ws).await.is_none(), "closed after refusal");
    assert_eq!(running.store.is_online(&PrincipalId::new("u1")).await, Some(false));
    assert_eq!(running.registry.active_count().await, 0);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_refused() {
    let running = start_server().await;
    let forged = encode(
        &Header::default(),
        &json!({ "id": "u1", "exp": 4_102_444_800_u64 }),
        &EncodingKey::from_secret(b"not-the-secret"),
    )
    .unwrap();
    let mut ws = connect(&running.addr, Some(&format!("token={forged}"))).await;

    let event = next_event(&mut ws).await.expect("a refusal");
    assert_eq!(event["event"], "connectError");
}

#[tokio::test]
async fn test_query_token_is_accepted() {
    let running = start_server().await;
    let url = format!("{}/?token={}", running.addr, token_for("u1"));
    let mut ws = connect(&url, None).await;

    send_update(&mut ws, 4.70, 50.88).await;
    let event = next_event(&mut ws).await.expect("an answer");

    assert_eq!(event["event"], "nearbyLocations");
}

#[tokio::test]
async fn test_run_until_stops_accepting() {
    let running = start_server().await;
    running.stop.send(()).expect("server still running");

    let result = tokio::time::timeout(Duration::from_secs(5), running.server)
        .await
        .expect("server should stop")
        .expect("server task should not panic");
    assert!(result.is_ok());

    let refused = tokio_tungstenite::connect_async(format!("ws://{}", running.addr)).await;
    assert!(refused.is_err(), "listener is gone after shutdown");
}

#[tokio::test]
async fn test_silent_socket_does_not_delay_other_clients() {
    let running = start_server().await;

    // Opens TCP and never sends the upgrade request.
    let _silent = tokio::net::TcpStream::connect(&running.addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let cookie = format!("token={}", token_for("u1"));
    let mut ws = tokio::time::timeout(Duration::from_secs(3), connect(&running.addr, Some(&cookie)))
        .await
        .expect("healthy client should connect while another socket stalls");

    send_update(&mut ws, 4.70, 50.88).await;
    assert_eq!(next_event(&mut ws).await.unwrap()["event"], "nearbyLocations");
}

#[tokio::test]
async fn test_stalled_handshake_is_dropped_after_timeout() {
    use tokio::io::AsyncReadExt;

    let running =
        start_server_with(|builder| builder.handshake_timeout(Duration::from_millis(200))).await;
    let mut silent = tokio::net::TcpStream::connect(&running.addr).await.unwrap();

    let mut buf = [0u8; 16];
    let read = tokio::time::timeout(Duration::from_secs(3), silent.read(&mut buf))
        .await
        .expect("server should drop the stalled socket");
    // EOF, or a reset if the kernel got there first.
    assert!(matches!(read, Ok(0) | Err(_)));
    assert_eq!(running.registry.active_count().await, 0);
}
