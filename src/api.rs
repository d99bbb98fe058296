use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::coupon::{CouponDraft, CouponError, CouponReceipt, CouponSelection, CouponStore};
use crate::http_client::http_client;
use crate::state::{Fixture, MarketLine};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub fixture_id: String,
    pub home_win_probability: f64,
    pub draw_probability: f64,
    pub away_win_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueBet {
    #[serde(rename = "match")]
    pub match_label: String,
    pub market: String,
    pub odds: f64,
    pub model_probability: f64,
    pub expected_value: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LiveOddsRow {
    pub market: String,
    pub home: f64,
    pub draw: f64,
    pub away: f64,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct LiveOdds {
    #[serde(default)]
    pub outrights: Vec<LiveOddsRow>,
    #[serde(default)]
    pub markets: HashMap<String, Vec<MarketLine>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CouponSummary {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub total_odds: f64,
    pub total_prob: f64,
    pub total_ev: f64,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoredSelection {
    #[serde(flatten)]
    pub selection: CouponSelection,
    #[serde(default)]
    pub ev: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CouponDetail {
    #[serde(flatten)]
    pub summary: CouponSummary,
    #[serde(default)]
    pub selections: Vec<StoredSelection>,
}

#[derive(Debug, Deserialize)]
struct CouponListEnvelope {
    #[serde(default)]
    items: Vec<CouponSummary>,
}

/// Blocking client for the prediction service's REST surface.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base: String,
}

impl ApiClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(cfg.request_timeout_secs)?.clone(),
            base: cfg.api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn fetch_fixtures(&self) -> Result<Vec<Fixture>> {
        self.get_json("/fixtures", self.client.get(self.url("/fixtures")))
    }

    pub fn fetch_predictions(&self) -> Result<Vec<Prediction>> {
        self.get_json("/predictions", self.client.get(self.url("/predictions")))
    }

    pub fn fetch_value_bets(&self) -> Result<Vec<ValueBet>> {
        self.get_json("/value-bets", self.client.get(self.url("/value-bets")))
    }

    pub fn fetch_live_odds(&self, token: &str) -> Result<LiveOdds> {
        let req = self.client.get(self.url("/live-odds")).bearer_auth(token);
        self.get_json("/live-odds", req)
    }

    pub fn list_coupons(&self, token: &str) -> Result<Vec<CouponSummary>> {
        let req = self
            .client
            .get(self.url("/coupon/list"))
            .query(&[("token", token)]);
        let envelope: CouponListEnvelope = self.get_json("/coupon/list", req)?;
        Ok(envelope.items)
    }

    pub fn get_coupon(&self, id: i64, token: &str) -> Result<CouponDetail> {
        let path = format!("/coupon/{id}");
        let req = self.client.get(self.url(&path)).query(&[("token", token)]);
        self.get_json(&path, req)
    }

    pub fn delete_coupon(&self, id: i64, token: &str) -> Result<()> {
        let path = format!("/coupon/{id}");
        let resp = self
            .client
            .delete(self.url(&path))
            .query(&[("token", token)])
            .send()
            .with_context(|| format!("{path} request failed"))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(anyhow!("{path} http {}: {}", status, body_snippet(&body)));
        }
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, req: RequestBuilder) -> Result<T> {
        let resp = req
            .send()
            .with_context(|| format!("{path} request failed"))?;
        let status = resp.status();
        let body = resp
            .text()
            .with_context(|| format!("failed reading {path} body"))?;
        if !status.is_success() {
            return Err(anyhow!("{path} http {}: {}", status, body_snippet(&body)));
        }
        serde_json::from_str(&body).with_context(|| format!("invalid {path} json"))
    }
}

impl CouponStore for ApiClient {
    fn create_coupon(&self, draft: &CouponDraft<'_>) -> Result<CouponReceipt, CouponError> {
        let resp: Response = self
            .client
            .post(self.url("/coupon/create"))
            .json(draft)
            .send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(CouponError::Rejected {
                status: status.as_u16(),
                message: detail_message(&body),
            });
        }
        parse_coupon_receipt(&body)
    }
}

pub fn parse_coupon_receipt(raw: &str) -> Result<CouponReceipt, CouponError> {
    serde_json::from_str(raw).map_err(|err| CouponError::Decode(err.to_string()))
}

// Error bodies look like {"detail": "..."}; fall back to the raw text.
fn detail_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body_snippet(body))
}

fn body_snippet(body: &str) -> String {
    body.trim()
        .replace(['\n', '\r'], " ")
        .chars()
        .take(220)
        .collect()
}
