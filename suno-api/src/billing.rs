//! Credits API.
//!
//! Endpoint: `GET /api/billing/info/`
//!
//! Response (abridged):
//! ```json
//! {
//!   "total_credits_left": 40,
//!   "period": "day",
//!   "monthly_limit": 50,
//!   "monthly_usage": 10
//! }
//! ```

use crate::client::{ApiRequest, SunoClient};
use crate::error::{Result, SunoError};
use crate::normalize::to_credit;
use crate::types::CreditInfo;

impl SunoClient {
    /// Current credit balance and usage.
    ///
    /// # Errors
    ///
    /// [`SunoError::Upstream`] if the billing payload has no balance.
    pub async fn credits(&self) -> Result<CreditInfo> {
        let resp = self.execute(&ApiRequest::get("/api/billing/info/")).await?;
        let credit = to_credit(&resp);
        if credit.is_fallback() {
            return Err(SunoError::Upstream {
                status: 200,
                message: "billing response has no credit balance".into(),
            });
        }
        Ok(credit)
    }
}
