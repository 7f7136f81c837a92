// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Allocation advice from a generative-AI service.
//!
//! The service is an opaque collaborator: any failure (no API key, network,
//! unexpected payload) degrades to an empty list through [`Recommender`].

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{BudgetError, Result};
use crate::models::{Bucket, Goal, Recommendation};

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

pub trait Recommender {
    fn recommend(&self, income: Decimal, goals: &[Goal], buckets: &[Bucket])
    -> Vec<Recommendation>;
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
}

impl GeminiConfig {
    /// `None` when `GEMINI_API_KEY` is unset or blank.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let model = std::env::var("BUCKETWISE_GEMINI_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Some(Self {
            api_key,
            model,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }
}

pub struct GeminiRecommender {
    config: Option<GeminiConfig>,
}

impl GeminiRecommender {
    pub fn new(config: Option<GeminiConfig>) -> Self {
        Self { config }
    }

    pub fn try_recommend(
        &self,
        income: Decimal,
        goals: &[Goal],
        buckets: &[Bucket],
    ) -> Result<Vec<Recommendation>> {
        let cfg = self.config.as_ref().ok_or_else(|| {
            BudgetError::RecommendationUnavailable("GEMINI_API_KEY is not set".into())
        })?;
        let url = format!("{}/models/{}:generateContent", cfg.endpoint, cfg.model);
        let body = request_body(&build_prompt(income, goals, buckets));

        let unavailable = |e: reqwest::Error| BudgetError::RecommendationUnavailable(e.to_string());
        let client = crate::utils::http_client(Duration::from_secs(30)).map_err(unavailable)?;
        let text = client
            .post(url)
            .header("x-goog-api-key", &cfg.api_key)
            .json(&body)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(unavailable)?;
        parse_generate_response(&text)
    }
}

impl Recommender for GeminiRecommender {
    fn recommend(
        &self,
        income: Decimal,
        goals: &[Goal],
        buckets: &[Bucket],
    ) -> Vec<Recommendation> {
        match self.try_recommend(income, goals, buckets) {
            Ok(recs) => recs,
            Err(err) => {
                tracing::warn!("allocation advice unavailable: {err}");
                Vec::new()
            }
        }
    }
}

pub fn build_prompt(income: Decimal, goals: &[Goal], buckets: &[Bucket]) -> String {
    let goals_json = serde_json::to_string(goals).unwrap_or_else(|_| "[]".into());
    let buckets_json = serde_json::to_string(buckets).unwrap_or_else(|_| "[]".into());
    format!(
        "You are a personal finance advisor reviewing an envelope budget.\n\
         Monthly income: {income}\n\
         Savings goals: {goals_json}\n\
         Existing buckets: {buckets_json}\n\n\
         Recommend how to split the monthly income across buckets. Answer with a JSON \
         array; each element names a bucket, its suggested percentage of income, and a \
         one-sentence reason."
    )
}

fn request_body(prompt: &str) -> serde_json::Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "bucketName": { "type": "STRING" },
                        "suggestedPercentage": { "type": "NUMBER" },
                        "reasoning": { "type": "STRING" }
                    },
                    "required": ["bucketName", "suggestedPercentage", "reasoning"]
                }
            }
        }
    })
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecommendation {
    bucket_name: String,
    suggested_percentage: f64,
    #[serde(default)]
    reasoning: String,
}

/// Extracts the recommendation array from a `generateContent` response body.
pub fn parse_generate_response(body: &str) -> Result<Vec<Recommendation>> {
    let malformed = |msg: String| BudgetError::RecommendationUnavailable(msg);
    let resp: GenerateResponse =
        serde_json::from_str(body).map_err(|e| malformed(format!("bad response: {e}")))?;
    let text: String = match resp.candidates.into_iter().next() {
        Some(c) => c.content.parts.into_iter().map(|p| p.text).collect(),
        None => return Err(malformed("response had no candidates".into())),
    };
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let raw: Vec<RawRecommendation> =
        serde_json::from_str(&text).map_err(|e| malformed(format!("bad recommendation list: {e}")))?;
    Ok(raw
        .into_iter()
        .map(|r| Recommendation {
            bucket_name: r.bucket_name,
            suggested_percentage: r.suggested_percentage.round().clamp(0.0, 100.0) as u8,
            reasoning: r.reasoning,
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationMatch {
    pub recommendation: Recommendation,
    /// `None` means no bucket carries the recommended name.
    pub bucket_id: Option<String>,
}

impl RecommendationMatch {
    pub fn is_applicable(&self) -> bool {
        self.bucket_id.is_some()
    }
}

/// Matches by case-insensitive bucket name, never by id.
pub fn match_recommendations(
    recs: &[Recommendation],
    buckets: &[Bucket],
) -> Vec<RecommendationMatch> {
    recs.iter()
        .map(|rec| {
            let wanted = rec.bucket_name.trim().to_lowercase();
            RecommendationMatch {
                recommendation: rec.clone(),
                bucket_id: buckets
                    .iter()
                    .find(|b| b.name.trim().to_lowercase() == wanted)
                    .map(|b| b.id.clone()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_buckets;

    fn wrap(text: &str) -> String {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }).to_string()
    }

    #[test]
    fn parses_candidate_text() {
        let body = wrap(
            r#"[{"bucketName":"Emergency","suggestedPercentage":22.6,"reasoning":"Buffer"}]"#,
        );
        let recs = parse_generate_response(&body).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].bucket_name, "Emergency");
        assert_eq!(recs[0].suggested_percentage, 23);
    }

    #[test]
    fn out_of_range_percentages_are_clamped() {
        let body = wrap(r#"[{"bucketName":"A","suggestedPercentage":140,"reasoning":""}]"#);
        assert_eq!(parse_generate_response(&body).unwrap()[0].suggested_percentage, 100);
    }

    #[test]
    fn malformed_payload_is_unavailable() {
        let err = parse_generate_response(&wrap("not json")).unwrap_err();
        assert!(matches!(err, BudgetError::RecommendationUnavailable(_)));
        assert!(parse_generate_response("{}").is_err());
    }

    #[test]
    fn missing_key_degrades_to_empty() {
        let r = GeminiRecommender::new(None);
        assert!(r.try_recommend(Decimal::from(1000), &[], &[]).is_err());
        assert!(r.recommend(Decimal::from(1000), &[], &[]).is_empty());
    }

    #[test]
    fn matches_ignore_case_and_flag_unknown_names() {
        let recs = vec![
            Recommendation {
                bucket_name: "daily expenses".into(),
                suggested_percentage: 45,
                reasoning: String::new(),
            },
            Recommendation {
                bucket_name: "Vacation".into(),
                suggested_percentage: 5,
                reasoning: String::new(),
            },
        ];
        let matched = match_recommendations(&recs, &default_buckets());
        assert_eq!(matched[0].bucket_id.as_deref(), Some("3"));
        assert!(!matched[1].is_applicable());
    }

    #[test]
    fn prompt_mentions_income_and_buckets() {
        let p = build_prompt(Decimal::from(2500), &[], &default_buckets());
        assert!(p.contains("2500"));
        assert!(p.contains("Dream Car"));
    }
}
