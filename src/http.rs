use std::time::Duration;

use anyhow::Context;
use serde_json::Value;
use url::Url;

const USER_AGENT: &str = concat!("scholar-sync/", env!("CARGO_PKG_VERSION"));

/// Blocking GET of a text body. Non-2xx responses are errors.
pub trait Fetch {
    fn get(&self, url: &Url, accept: Option<&str>) -> anyhow::Result<String>;

    fn get_json(&self, url: &Url, accept: Option<&str>) -> anyhow::Result<Value> {
        let body = self.get(url, accept)?;
        serde_json::from_str(&body).with_context(|| format!("invalid JSON from {url}"))
    }
}

/// `ureq` agent shared by every request of a run.
pub struct HttpClient {
    agent: ureq::Agent,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        let cfg = ureq::Agent::config_builder()
            .timeout_connect(Some(Duration::from_secs(5)))
            .timeout_global(Some(timeout))
            .build();
        HttpClient {
            agent: ureq::Agent::new_with_config(cfg),
        }
    }
}

impl Fetch for HttpClient {
    fn get(&self, url: &Url, accept: Option<&str>) -> anyhow::Result<String> {
        let mut req = self.agent.get(url.as_str()).header("User-Agent", USER_AGENT);
        if let Some(accept) = accept {
            req = req.header("Accept", accept);
        }
        let body = req
            .call()
            .with_context(|| format!("failed request for URL {url}"))?
            .into_body()
            .read_to_string()
            .with_context(|| format!("failed to read response body from {url}"))?;
        Ok(body)
    }
}
