use fibo_server::{
    AppState, CacheProvider, CacheSettings, MemoryCache, RangeComputer, RangeResponse, Shutdown,
    create_http_router, init_metrics, serve,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Helper to spawn the HTTP listener with the given cache and request timeout
async fn spawn_http_server(provider: CacheProvider, timeout: Duration) -> String {
    init_metrics();
    let computer = Arc::new(RangeComputer::new(
        Arc::new(provider),
        CacheSettings::default(),
    ));
    let app = create_http_router(AppState::new(computer, timeout));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = format!("http://{}", addr);

    let (trigger, shutdown) = Shutdown::channel();
    tokio::spawn(async move {
        // Dropping the trigger would stop the server
        let _trigger = trigger;
        serve(listener, app, shutdown).await.unwrap();
    });

    // Give server time to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    url
}

async fn spawn_test_server() -> String {
    spawn_http_server(
        CacheProvider::Memory(MemoryCache::new()),
        Duration::from_secs(10),
    )
    .await
}

async fn get_range(client: &Client, base_url: &str, body: &str) -> (u16, RangeResponse) {
    let res = client
        .get(format!("{}/", base_url))
        .body(body.to_string())
        .send()
        .await
        .unwrap();
    let status = res.status().as_u16();
    (status, res.json().await.unwrap())
}

fn strings(values: &[i64]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
async fn test_health_check() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let res = client
        .get(format!("{}/health", base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["cache"]["backend"], "memory");
    assert_eq!(body["cache"]["enabled"], true);
}

#[tokio::test]
async fn test_positive_range() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let (status, body) = get_range(&client, &base_url, "0,10").await;
    assert_eq!(status, 200);
    assert_eq!(body.data, strings(&[0, 1, 1, 2, 3, 5, 8, 13, 21, 34, 55]));
    assert!(body.error.is_none());
}

#[tokio::test]
async fn test_negative_range() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let (status, body) = get_range(&client, &base_url, "-10,0").await;
    assert_eq!(status, 200);
    assert_eq!(
        body.data,
        strings(&[-55, 34, -21, 13, -8, 5, -3, 2, -1, 1, 0])
    );
}

#[tokio::test]
async fn test_range_across_zero_and_reversed_bounds() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let expected = strings(&[5, -3, 2, -1, 1, 0, 1, 1, 2, 3, 5]);

    let (_, forward) = get_range(&client, &base_url, "-5,5").await;
    assert_eq!(forward.data, expected);

    let (_, reversed) = get_range(&client, &base_url, " 5 , -5 ").await;
    assert_eq!(reversed.data, expected);
}

#[tokio::test]
async fn test_single_index() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let (status, body) = get_range(&client, &base_url, "1,1").await;
    assert_eq!(status, 200);
    assert_eq!(body.data, vec!["1".to_string()]);
}

#[tokio::test]
async fn test_large_index_keeps_precision() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let (_, body) = get_range(&client, &base_url, "100,100").await;
    assert_eq!(body.data, vec!["354224848179261915075".to_string()]);
}

#[tokio::test]
async fn test_malformed_body() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let (status, body) = get_range(&client, &base_url, "10 20").await;
    assert_eq!(status, 400);
    assert!(body.data.is_empty());
    assert_eq!(
        body.error.as_deref(),
        Some("request's body should has two int values through a comma")
    );
}

#[tokio::test]
async fn test_non_numeric_body() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let (status, body) = get_range(&client, &base_url, "test,test").await;
    assert_eq!(status, 400);
    assert!(body.data.is_empty());
    assert!(body.error.unwrap().contains("test"));
}

#[tokio::test]
async fn test_non_utf8_body_is_malformed() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let res = client
        .get(format!("{}/", base_url))
        .body(vec![0xff, 0xfe, b',', b'1'])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let body: RangeResponse = res.json().await.unwrap();
    assert!(body.data.is_empty());
    assert_eq!(
        body.error.as_deref(),
        Some("request's body should has two int values through a comma")
    );
}

#[tokio::test]
async fn test_method_not_allowed() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let res = client
        .post(format!("{}/", base_url))
        .body("0,10")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 405);

    let body: RangeResponse = res.json().await.unwrap();
    assert!(body.data.is_empty());
    assert_eq!(body.error.as_deref(), Some("method POST not supported on uri /"));
}

#[tokio::test]
async fn test_unknown_path() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let res = client
        .get(format!("{}/fibonacci", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_timeout_returns_partial_data() {
    let base_url = spawn_http_server(CacheProvider::Disabled, Duration::from_millis(20)).await;
    let client = Client::new();

    let (status, body) = get_range(&client, &base_url, "0,1000000").await;
    assert_eq!(status, 200);
    assert!(body.data.len() < 1_000_001);

    let error = body.error.unwrap();
    assert_eq!(
        error,
        format!("timeout exit: returned {} values from 1000001", body.data.len())
    );
    // Whatever came back is a correct prefix
    for (i, value) in body.data.iter().take(3).enumerate() {
        assert_eq!(value, ["0", "1", "1"][i]);
    }
}

#[tokio::test]
async fn test_repeated_request_is_served_from_cache() {
    let store = MemoryCache::new();
    let base_url =
        spawn_http_server(CacheProvider::Memory(store.clone()), Duration::from_secs(10)).await;
    let client = Client::new();

    let (_, first) = get_range(&client, &base_url, "0,20").await;
    let after_first = store.stats();
    assert_eq!(after_first.hits, 0);
    assert_eq!(after_first.sets, 21);

    let (_, second) = get_range(&client, &base_url, "0,20").await;
    assert_eq!(first, second);

    let after_second = store.stats();
    assert_eq!(after_second.hits, 21);
    assert_eq!(after_second.sets, 21);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    get_range(&client, &base_url, "0,5").await;

    let res = client
        .get(format!("{}/metrics", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let text = res.text().await.unwrap();
    assert!(text.contains("fibonacci_requests_total"));
    assert!(text.contains("fibonacci_values_total"));
}
