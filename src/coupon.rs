use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::observer::{Observers, SubscriptionId};

/// One leg of a coupon. Fixture details are copied in at selection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponSelection {
    pub fixture_id: String,
    pub league: String,
    pub league_id: String,
    pub home: String,
    pub away: String,
    pub market: String,
    pub outcome: String,
    /// Decimal odds. Values <= 1.0 are accepted as-is.
    pub odds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prob: Option<f64>,
}

/// Body of a coupon create request.
#[derive(Debug, Clone, Serialize)]
pub struct CouponDraft<'a> {
    pub token: &'a str,
    pub name: &'a str,
    pub selections: &'a [CouponSelection],
}

/// What the persistence service assigned to a stored coupon.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CouponReceipt {
    pub id: i64,
    #[serde(default)]
    pub total_odds: f64,
    #[serde(default)]
    pub total_prob: f64,
    pub total_ev: f64,
}

#[derive(Debug, Error)]
pub enum CouponError {
    #[error("login required to save coupons")]
    MissingCredential,
    #[error("coupon has no selections")]
    EmptyCoupon,
    #[error("coupon rejected (http {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("coupon request failed")]
    Transport(#[from] reqwest::Error),
    #[error("unusable coupon response: {0}")]
    Decode(String),
}

/// Persistence collaborator that stores a finished coupon.
pub trait CouponStore {
    fn create_coupon(&self, draft: &CouponDraft<'_>) -> Result<CouponReceipt, CouponError>;
}

impl<S: CouponStore + ?Sized> CouponStore for &S {
    fn create_coupon(&self, draft: &CouponDraft<'_>) -> Result<CouponReceipt, CouponError> {
        (**self).create_coupon(draft)
    }
}

type Observer = dyn Fn(&[CouponSelection], f64) + Send + Sync;

/// Ordered list of selections plus their combined decimal odds.
pub struct CouponAccumulator {
    selections: Vec<CouponSelection>,
    total_odds: f64,
    observers: Observers<Observer>,
}

impl Default for CouponAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl CouponAccumulator {
    pub fn new() -> Self {
        Self {
            selections: Vec::new(),
            total_odds: 1.0,
            observers: Observers::default(),
        }
    }

    pub fn selections(&self) -> &[CouponSelection] {
        &self.selections
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Product of all leg odds; 1.0 for an empty coupon.
    pub fn total_odds(&self) -> f64 {
        self.total_odds
    }

    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: Fn(&[CouponSelection], f64) + Send + Sync + 'static,
    {
        self.observers.add(Box::new(observer))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.remove(id)
    }

    pub fn add(&mut self, selection: CouponSelection) {
        self.selections.push(selection);
        self.changed();
    }

    /// Out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) {
        if index >= self.selections.len() {
            return;
        }
        self.selections.remove(index);
        self.changed();
    }

    pub fn clear(&mut self) {
        self.selections.clear();
        self.changed();
    }

    /// Hands the coupon to `store`; the list is cleared only when the store accepts it.
    pub fn submit<S: CouponStore>(
        &mut self,
        store: &S,
        token: Option<&str>,
        name: &str,
    ) -> Result<CouponReceipt, CouponError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(CouponError::MissingCredential)?;
        if self.selections.is_empty() {
            return Err(CouponError::EmptyCoupon);
        }

        let draft = CouponDraft {
            token,
            name,
            selections: &self.selections,
        };
        match store.create_coupon(&draft) {
            Ok(receipt) => {
                info!(
                    id = receipt.id,
                    legs = self.selections.len(),
                    total_ev = receipt.total_ev,
                    "coupon saved"
                );
                self.clear();
                Ok(receipt)
            }
            Err(err) => {
                warn!("coupon submit failed: {err}");
                Err(err)
            }
        }
    }

    // Recomputed from scratch on every change, never adjusted incrementally.
    fn changed(&mut self) {
        self.total_odds = self.selections.iter().map(|s| s.odds).product();
        for observer in self.observers.iter() {
            observer(&self.selections, self.total_odds);
        }
    }
}
