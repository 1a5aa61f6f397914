//! Availability probe for a deployed bridge instance.
//!
//! Fires one GET per endpoint and reports whether the server answered at
//! all. Any HTTP status counts as reachable (POST-only routes answer the
//! probe with 404/405); only transport failures count as down. Exits 0 when
//! every endpoint answered.

use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const ENDPOINTS: [(&str, &str); 6] = [
    ("Health", "/health"),
    ("System Status", "/api/status"),
    ("Gupshup Test", "/api/test/gupshup"),
    ("AmoCRM Test", "/api/test/amocrm"),
    ("OAuth Callback", "/api/amo/callback"),
    ("Webhook Receiver", "/webhook/gupshup"),
];

async fn check_endpoint(client: &reqwest::Client, name: &str, url: &str) -> bool {
    match client.get(url).send().await {
        Ok(response) => {
            println!("✅ {name}: {url} (status: {})", response.status().as_u16());
            true
        }
        Err(err) => {
            println!("❌ {name}: {url} ({err})");
            false
        }
    }
}

#[ntex::main]
async fn main() -> anyhow::Result<()> {
    let base_url =
        std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string());
    let client = reqwest::Client::builder().timeout(PROBE_TIMEOUT).build()?;

    println!("Checking endpoint availability at {base_url}:\n");

    let mut all_reachable = true;
    for (name, path) in ENDPOINTS {
        let url = format!("{base_url}{path}");
        all_reachable &= check_endpoint(&client, name, &url).await;
    }

    if !all_reachable {
        std::process::exit(1);
    }

    Ok(())
}
