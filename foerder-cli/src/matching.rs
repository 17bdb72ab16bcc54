//! Client for the external matching service.
//!
//! The service scores programs against a school profile. We only send the
//! request and validate the response; scoring itself happens remotely.

use anyhow::{Context, Result, bail};
use foerder_core::{FundingProgram, MatchResult, SchoolProfile};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use std::time::Duration;

use crate::config::MatchingSection;

#[derive(Debug, Serialize)]
struct MatchRequest<'a> {
    profile: &'a SchoolProfile,
    programs: &'a [FundingProgram],
}

pub async fn request_matches(
    cfg: &MatchingSection,
    profile: &SchoolProfile,
    programs: &[FundingProgram],
) -> Result<Vec<MatchResult>> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(key) = std::env::var(&cfg.api_key_env) {
        if !key.trim().is_empty() {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", key.trim()))?,
            );
        }
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .build()
        .context("build http client")?;

    tracing::info!(endpoint = %cfg.endpoint, programs = programs.len(), "requesting matches");
    let resp = client
        .post(&cfg.endpoint)
        .headers(headers)
        .json(&MatchRequest { profile, programs })
        .send()
        .await
        .context("matching request")?;

    let status = resp.status();
    if !status.is_success() {
        let txt = resp.text().await.unwrap_or_default();
        bail!("matching service error: {status} {txt}");
    }

    let body = resp.text().await.context("read matching response")?;
    let results = foerder_ingest::parse_match_results_json(&body)?;
    Ok(keep_known_programs(results, programs))
}

/// Drop results for programs we did not send.
fn keep_known_programs(results: Vec<MatchResult>, programs: &[FundingProgram]) -> Vec<MatchResult> {
    let before = results.len();
    let kept: Vec<_> = results
        .into_iter()
        .filter(|r| programs.iter().any(|p| p.id == r.program_id))
        .collect();
    if kept.len() < before {
        tracing::warn!(dropped = before - kept.len(), "matching service returned unknown program ids");
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_known_programs() {
        let programs = vec![FundingProgram::new("p1", "A")];
        let results = vec![
            MatchResult {
                program_id: "p1".into(),
                score: 50.0,
                reasoning: String::new(),
            },
            MatchResult {
                program_id: "ghost".into(),
                score: 90.0,
                reasoning: String::new(),
            },
        ];
        let kept = keep_known_programs(results, &programs);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].program_id, "p1");
    }

    #[test]
    fn test_request_body_shape() {
        let profile = SchoolProfile {
            name: "GS".into(),
            state: "BY".into(),
            ..Default::default()
        };
        let programs = vec![FundingProgram::new("p1", "A")];
        let body = serde_json::to_value(MatchRequest {
            profile: &profile,
            programs: &programs,
        })
        .unwrap();
        assert_eq!(body["profile"]["state"], "BY");
        assert_eq!(body["programs"][0]["id"], "p1");
    }
}
