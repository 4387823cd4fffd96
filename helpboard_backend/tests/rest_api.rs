use helpboard_backend::api;
use helpboard_backend::bootstrap;
use helpboard_backend::config::{HelpboardConfig, HelpboardPaths, StatsConfig};
use helpboard_backend::listings::{CreateHelpOfferInput, CreateHelpRequestInput};
use std::time::Duration;
use tempfile::tempdir;
use tokio::time::{sleep, timeout};

fn next_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("bind ephemeral port")
        .local_addr()
        .unwrap()
        .port()
}

async fn wait_for_health(base_url: &str) {
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if let Ok(resp) = client.get(format!("{base_url}/health")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        sleep(Duration::from_millis(100)).await;
    }
    panic!("server did not become healthy in time");
}

async fn wait_until<F, Fut, T>(mut check: F) -> T
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Option<T>>,
{
    timeout(Duration::from_secs(10), async {
        loop {
            if let Some(value) = check().await {
                break value;
            }
            sleep(Duration::from_millis(100)).await;
        }
    })
    .await
    .expect("condition not met in time")
}

async fn fetch_stats(client: &reqwest::Client, base_url: &str) -> Option<serde_json::Value> {
    let resp = client.get(format!("{base_url}/stats")).send().await.ok()?;
    if !resp.status().is_success() {
        return None;
    }
    resp.json().await.ok()
}

fn summary_counts(stats: &serde_json::Value) -> Option<(u64, u64)> {
    let data = stats.get("data")?;
    Some((
        data.get("open_request_count")?.as_u64()?,
        data.get("available_offer_count")?.as_u64()?,
    ))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rest_roundtrip_with_stats_refresh() {
    let temp = tempdir().expect("tempdir");
    let port = next_port();
    let config = HelpboardConfig::with_stats(
        port,
        HelpboardPaths::from_base_dir(temp.path()).expect("paths"),
        StatsConfig {
            refresh_interval: Duration::from_millis(200),
        },
    );

    let bootstrap = bootstrap::initialize(&config).expect("bootstrap");
    let server_config = config.clone();
    let server_database = bootstrap.database.clone();
    let server = tokio::spawn(async move {
        let _ = api::serve_http(server_config, server_database).await;
    });

    let base_url = format!("http://127.0.0.1:{port}");
    wait_for_health(&base_url).await;

    let client = reqwest::Client::new();

    // missing required fields are rejected before anything is stored
    let bad = client
        .post(format!("{base_url}/requests"))
        .json(&serde_json::json!({
            "title": "   ",
            "description": "roof gone",
            "contact_name": "Nok"
        }))
        .send()
        .await
        .expect("bad request response");
    assert_eq!(bad.status(), reqwest::StatusCode::BAD_REQUEST);

    let request_resp: serde_json::Value = client
        .post(format!("{base_url}/requests"))
        .json(&CreateHelpRequestInput {
            title: "Need sandbags".to_string(),
            description: "River overflowing near the school".to_string(),
            help_types: vec!["labor".to_string()],
            budget: None,
            contact_name: "Nok".to_string(),
            contact_phone: "081-123-4567, 02-765-4321".to_string(),
            contact_method: Some("phone".to_string()),
            location_address: Some("Riverside school".to_string()),
        })
        .send()
        .await
        .expect("create request response")
        .json()
        .await
        .expect("request json");

    let request_id = request_resp
        .get("id")
        .and_then(|id| id.as_str())
        .expect("request id")
        .to_string();
    assert_eq!(
        request_resp.get("status").and_then(|s| s.as_str()),
        Some("open")
    );
    assert_eq!(
        request_resp
            .get("contact_phone")
            .and_then(|p| p.as_array())
            .map(|p| p.len()),
        Some(2)
    );

    let offer_resp: serde_json::Value = client
        .post(format!("{base_url}/offers"))
        .json(&CreateHelpOfferInput {
            name: "Somchai".to_string(),
            description: "Truck and two volunteers".to_string(),
            services_offered: vec!["transport".to_string()],
            capacity: Some("500kg".to_string()),
            contact_info: "081-999-9999".to_string(),
            contact_method: None,
            availability: Some("daily".to_string()),
            location_area: None,
            skills: None,
        })
        .send()
        .await
        .expect("create offer response")
        .json()
        .await
        .expect("offer json");

    assert_eq!(
        offer_resp.get("status").and_then(|s| s.as_str()),
        Some("available")
    );

    // created records show up in the listings
    let listed: serde_json::Value = client
        .get(format!("{base_url}/requests"))
        .send()
        .await
        .expect("list requests")
        .json()
        .await
        .expect("requests json");
    assert_eq!(listed.as_array().map(|a| a.len()), Some(1));

    let fetched: serde_json::Value = client
        .get(format!("{base_url}/requests/{request_id}"))
        .send()
        .await
        .expect("get request")
        .json()
        .await
        .expect("request json");
    assert_eq!(
        fetched.get("title").and_then(|t| t.as_str()),
        Some("Need sandbags")
    );

    // the stats poller picks the new records up on its next cycle
    wait_until(|| async {
        let stats = fetch_stats(&client, &base_url).await?;
        if summary_counts(&stats)? == (1, 1) {
            Some(())
        } else {
            None
        }
    })
    .await;

    // closing the request is reflected by a later cycle
    let closed = client
        .post(format!("{base_url}/requests/{request_id}/status"))
        .json(&serde_json::json!({ "status": "fulfilled" }))
        .send()
        .await
        .expect("status update response");
    assert!(closed.status().is_success());

    let rejected = client
        .post(format!("{base_url}/requests/{request_id}/status"))
        .json(&serde_json::json!({ "status": "abandoned" }))
        .send()
        .await
        .expect("invalid status response");
    assert_eq!(rejected.status(), reqwest::StatusCode::BAD_REQUEST);

    wait_until(|| async {
        let stats = fetch_stats(&client, &base_url).await?;
        if summary_counts(&stats)? == (0, 1) {
            Some(())
        } else {
            None
        }
    })
    .await;

    server.abort();
    let _ = server.await;
}
