use std::time::Duration;

use serde_json::json;
use tracing::warn;

use crate::projection;
use crate::record::CameraRecord;

const FALLBACK_MESSAGE: &str =
    "AI analysis is unavailable right now. Check the network connection and try again.";

/// Opaque text-analysis collaborator: summarize the roster, ask a generative
/// text service for a coverage assessment, hand back whatever text comes out.
///
/// The surface is infallible: any transport or service error degrades to a
/// fixed fallback message instead of propagating.
pub struct SiteAnalyst {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl SiteAnalyst {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(
            api_key,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent",
        )
    }

    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("camwatch")
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    pub async fn analyze_coverage(&self, records: &[CameraRecord]) -> String {
        let prompt = coverage_prompt(records);

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let result = async {
            let response = self
                .client
                .post(&self.endpoint)
                .query(&[("key", self.api_key.as_str())])
                .json(&body)
                .send()
                .await?;
            response.error_for_status_ref()?;
            let parsed: serde_json::Value = response.json().await?;
            Ok::<serde_json::Value, reqwest::Error>(parsed)
        }
        .await;

        match result {
            Ok(parsed) => parsed["candidates"][0]["content"]["parts"][0]["text"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
            Err(err) => {
                warn!(error = %err, "coverage analysis call failed");
                FALLBACK_MESSAGE.to_string()
            }
        }
    }
}

/// Prompt over the active roster. Only name, address and status go out; ips
/// and coordinates stay local.
fn coverage_prompt(records: &[CameraRecord]) -> String {
    let summary: Vec<serde_json::Value> = projection::active(records)
        .map(|r| {
            json!({
                "name": r.name,
                "address": r.address,
                "status": r.status.as_str(),
            })
        })
        .collect();

    format!(
        "Given this list of surveillance cameras in the district:\n{}\n\n\
         1. Assess the current security coverage.\n\
         2. Point out blind spots or key areas that may lack monitoring \
         (small alleys, parks, markets).\n\
         3. Suggest 3 specific locations where adding a camera would improve \
         coverage the most.\n\n\
         Answer in professional Markdown with clear headings.",
        serde_json::to_string(&summary).unwrap_or_default()
    )
}
