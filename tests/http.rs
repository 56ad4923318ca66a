use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct Counters {
    total_co2_saved: String,
    refusal_count: u64,
    bought_count: u64,
    monthly_goal: u32,
}

#[derive(Debug, Deserialize)]
struct StateResponse {
    counters: Counters,
    graph_mode: String,
    screen: String,
    #[serde(default)]
    action_message: Option<String>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    graph: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Summary {
    total_kwh: f64,
    total_co2_kg_text: String,
}

#[derive(Debug, Deserialize)]
struct ElectricityResponse {
    months: Vec<f64>,
    summary: Summary,
    saved: bool,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("co2_tracker_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/state")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_co2_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("CO2_PER_REFUSAL", "61")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn send_action(
    client: &Client,
    server: &TestServer,
    body: serde_json::Value,
) -> reqwest::Response {
    client
        .post(format!("{}/api/action", server.base_url))
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn current_state(client: &Client, server: &TestServer) -> StateResponse {
    client
        .get(format!("{}/api/state", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_refuse_updates_counters_and_shows_result() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = current_state(&client, &server).await;

    let response = send_action(&client, &server, json!({ "action": "refuse" })).await;
    assert!(response.status().is_success());
    let after: StateResponse = response.json().await.unwrap();

    assert_eq!(after.counters.refusal_count, before.counters.refusal_count + 1);
    assert_eq!(after.counters.bought_count, before.counters.bought_count);
    let expected_co2 = (after.counters.refusal_count * 61).to_string();
    assert_eq!(after.counters.total_co2_saved, expected_co2);
    assert_eq!(after.screen, "result");
    assert_eq!(after.action_message.as_deref(), Some("61g of CO2 saved!"));
}

#[tokio::test]
async fn http_mode_change_redraws_current_result() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = send_action(&client, &server, json!({ "action": "buy" })).await;
    assert!(response.status().is_success());

    let response = send_action(
        &client,
        &server,
        json!({ "action": "selectMode", "mode": "impact" }),
    )
    .await;
    assert!(response.status().is_success());
    let state: StateResponse = response.json().await.unwrap();
    assert_eq!(state.graph_mode, "impact");
    assert_eq!(state.screen, "result");
    assert_eq!(state.mode.as_deref(), Some("impact"));
    assert_eq!(state.action_message.as_deref(), Some("Maybe next time!"));
    let graph = state.graph.expect("graph missing");
    assert_eq!(graph["kind"], "impact");

    let response = send_action(
        &client,
        &server,
        json!({ "action": "selectMode", "mode": "pie" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    send_action(&client, &server, json!({ "action": "selectMode", "mode": "goal" })).await;
}

#[tokio::test]
async fn http_invalid_goal_is_rejected() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = current_state(&client, &server).await;
    for goal in [json!(0), json!(-5), json!("ten")] {
        let response = send_action(
            &client,
            &server,
            json!({ "action": "saveGoal", "goal": goal }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    let unchanged = current_state(&client, &server).await;
    assert_eq!(unchanged.counters.monthly_goal, before.counters.monthly_goal);

    let response = send_action(&client, &server, json!({ "action": "saveGoal", "goal": 15 })).await;
    assert!(response.status().is_success());
    let state: StateResponse = response.json().await.unwrap();
    assert_eq!(state.counters.monthly_goal, 15);
    assert_eq!(state.screen, "main");
}

#[tokio::test]
async fn http_electricity_clamps_and_saves() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    for month in 1..=12 {
        let response = client
            .put(format!("{}/api/electricity/{month}", server.base_url))
            .json(&json!({ "value": 100.0 }))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    let response = client
        .put(format!("{}/api/electricity/3", server.base_url))
        .json(&json!({ "value": -5.0 }))
        .send()
        .await
        .unwrap();
    let ledger: ElectricityResponse = response.json().await.unwrap();
    assert_eq!(ledger.months[2], 0.0);
    assert_eq!(ledger.summary.total_kwh, 1100.0);

    let response = client
        .put(format!("{}/api/electricity/13", server.base_url))
        .json(&json!({ "value": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    client
        .put(format!("{}/api/electricity/3", server.base_url))
        .json(&json!({ "value": 100.0 }))
        .send()
        .await
        .unwrap();
    let saved: ElectricityResponse = client
        .post(format!("{}/api/electricity/save", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(saved.saved);
    assert_eq!(saved.summary.total_kwh, 1200.0);
    assert_eq!(saved.summary.total_co2_kg_text, "812.4");
}

#[tokio::test]
async fn http_reset_needs_confirmation() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    send_action(&client, &server, json!({ "action": "refuse" })).await;

    let response = send_action(&client, &server, json!({ "action": "reset", "confirmed": false })).await;
    let declined: StateResponse = response.json().await.unwrap();
    assert!(declined.counters.refusal_count > 0);

    let response = send_action(&client, &server, json!({ "action": "reset", "confirmed": true })).await;
    let cleared: StateResponse = response.json().await.unwrap();
    assert_eq!(cleared.counters.refusal_count, 0);
    assert_eq!(cleared.counters.bought_count, 0);
    assert_eq!(cleared.counters.total_co2_saved, "0");
    assert_eq!(cleared.counters.monthly_goal, 20);
    assert_eq!(cleared.graph_mode, "goal");
    assert_eq!(cleared.screen, "main");

    let ledger: ElectricityResponse = client
        .get(format!("{}/api/electricity", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ledger.summary.total_kwh, 0.0);
}

#[tokio::test]
async fn http_electricity_form_zeroes_bad_fields() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/electricity/save", server.base_url))
        .form(&[("month-1", "10"), ("month-3", "-5"), ("month-4", "abc")])
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let ledger: ElectricityResponse = client
        .get(format!("{}/api/electricity", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ledger.months[0], 10.0);
    assert_eq!(ledger.months[2], 0.0);
    assert_eq!(ledger.months[3], 0.0);
    assert_eq!(ledger.months[11], 0.0);
    assert_eq!(ledger.summary.total_kwh, 10.0);
}

#[tokio::test]
async fn http_goal_form_rejects_zero() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = current_state(&client, &server).await;
    let response = client
        .post(format!("{}/settings/goal", server.base_url))
        .form(&[("goal", "0")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let after = current_state(&client, &server).await;
    assert_eq!(after.counters.monthly_goal, before.counters.monthly_goal);

    let response = client
        .post(format!("{}/settings/goal", server.base_url))
        .form(&[("goal", "12")])
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(current_state(&client, &server).await.counters.monthly_goal, 12);
}

#[tokio::test]
async fn http_mode_route_switches_and_rejects_unknown() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/mode/whatIf", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(current_state(&client, &server).await.graph_mode, "whatIf");

    let response = client
        .post(format!("{}/mode/pie", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(current_state(&client, &server).await.graph_mode, "whatIf");

    client
        .post(format!("{}/mode/goal", server.base_url))
        .send()
        .await
        .unwrap();
}

#[tokio::test]
async fn http_reset_form_asks_before_clearing() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    send_action(&client, &server, json!({ "action": "refuse" })).await;

    let response = client
        .post(format!("{}/reset", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let html = response.text().await.unwrap();
    assert!(html.contains(r#"id="confirm-reset-view""#));
    let asking = current_state(&client, &server).await;
    assert_eq!(asking.screen, "confirmReset");
    assert!(asking.counters.refusal_count > 0);

    client
        .post(format!("{}/reset/confirm", server.base_url))
        .form(&[("confirm", "no")])
        .send()
        .await
        .unwrap();
    let declined = current_state(&client, &server).await;
    assert_eq!(declined.screen, "main");
    assert!(declined.counters.refusal_count > 0);

    client
        .post(format!("{}/reset", server.base_url))
        .send()
        .await
        .unwrap();
    client
        .post(format!("{}/reset/confirm", server.base_url))
        .form(&[("confirm", "yes")])
        .send()
        .await
        .unwrap();
    let cleared = current_state(&client, &server).await;
    assert_eq!(cleared.screen, "main");
    assert_eq!(cleared.counters.refusal_count, 0);
}
