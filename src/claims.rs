//! Claim eligibility tracking
//!
//! Pending L2→L1 withdrawals become claimable once the challenge period
//! elapses. Eligibility is recomputed on a fixed interval against
//! wall-clock time and a timelock duration read once from the contract;
//! a withdrawal marked processed is terminal and leaves the polling set.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::client::{ChainClient, ClientError};
use crate::poll::Poller;

/// A withdrawal observed on L2, awaiting release on L1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWithdrawal {
    pub withdrawal_id: u64,
    /// Address the withdrawal belongs to.
    pub owner: Address,
    /// Token address on L1; the zero address denotes the native asset.
    pub token: Address,
    /// Amount in smallest units.
    pub amount: U256,
    /// Source-chain timestamp, unix seconds.
    pub timestamp: u64,
    /// Set once released on L1. Terminal: never recomputed afterwards.
    pub processed: bool,
    /// Computed: the challenge period has elapsed and the withdrawal is
    /// unprocessed.
    pub claimable: bool,
    /// Computed: seconds until claimable, zero when ready.
    pub time_remaining: u64,
}

impl PendingWithdrawal {
    pub fn is_native(&self) -> bool {
        self.token == Address::ZERO
    }
}

/// Whether a withdrawal can be claimed at `now` (unix seconds).
pub fn is_claimable(withdrawal: &PendingWithdrawal, timelock_secs: u64, now: u64) -> bool {
    !withdrawal.processed && now >= withdrawal.timestamp.saturating_add(timelock_secs)
}

/// Seconds remaining until a withdrawal becomes claimable. Never negative.
pub fn time_remaining(withdrawal: &PendingWithdrawal, timelock_secs: u64, now: u64) -> u64 {
    withdrawal
        .timestamp
        .saturating_add(timelock_secs)
        .saturating_sub(now)
}

/// Human-readable remaining time. Days/hours once at least an hour is
/// left, minutes below that; exactly zero renders "ready", never
/// "0m remaining".
pub fn format_time_remaining(secs: u64) -> String {
    if secs == 0 {
        return "ready".to_string();
    }
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    if days > 0 {
        format!("{days}d {hours}h remaining")
    } else if hours > 0 {
        format!("{hours}h {minutes}m remaining")
    } else {
        format!("{minutes}m remaining")
    }
}

fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// External source of pending withdrawals for an address.
#[async_trait]
pub trait WithdrawalSource: Send + Sync {
    async fn withdrawals_for(&self, owner: Address) -> Result<Vec<PendingWithdrawal>, ClientError>;
}

/// Wire format served by the indexer backend.
#[derive(Debug, Deserialize)]
struct WithdrawalsResponse {
    success: bool,
    #[serde(default)]
    withdrawals: Vec<WithdrawalRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WithdrawalRecord {
    withdraw_id: u64,
    user: String,
    token: String,
    amount: String,
    timestamp: u64,
    is_processed: bool,
}

impl WithdrawalRecord {
    fn into_pending(self) -> Result<PendingWithdrawal, ClientError> {
        let owner = Address::from_str(&self.user)
            .map_err(|e| ClientError::Rpc(format!("bad withdrawal owner: {e}")))?;
        let token = Address::from_str(&self.token)
            .map_err(|e| ClientError::Rpc(format!("bad withdrawal token: {e}")))?;
        let amount = U256::from_str(&self.amount)
            .map_err(|e| ClientError::Rpc(format!("bad withdrawal amount: {e}")))?;
        Ok(PendingWithdrawal {
            withdrawal_id: self.withdraw_id,
            owner,
            token,
            amount,
            timestamp: self.timestamp,
            processed: self.is_processed,
            claimable: false,
            time_remaining: 0,
        })
    }
}

/// HTTP implementation against the indexer backend.
pub struct HttpWithdrawalSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpWithdrawalSource {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| ClientError::Rpc(e.to_string()))?;
        Ok(HttpWithdrawalSource {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl WithdrawalSource for HttpWithdrawalSource {
    async fn withdrawals_for(&self, owner: Address) -> Result<Vec<PendingWithdrawal>, ClientError> {
        let url = format!("{}/api/bridge/withdrawals/{:#x}", self.base_url, owner);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Rpc(e.to_string()))?
            .json::<WithdrawalsResponse>()
            .await
            .map_err(|e| ClientError::Rpc(e.to_string()))?;

        if !response.success {
            return Err(ClientError::Rpc(
                "withdrawal source reported failure".to_string(),
            ));
        }
        response
            .withdrawals
            .into_iter()
            .map(WithdrawalRecord::into_pending)
            .collect()
    }
}

/// Tracks the claim readiness of a set of pending withdrawals.
pub struct ClaimTracker {
    /// Challenge-period duration in seconds, read once and cached.
    timelock_secs: u64,
    withdrawals: Mutex<Vec<PendingWithdrawal>>,
}

impl ClaimTracker {
    /// Read the timelock from the L1 bridge contract and start empty.
    pub async fn from_chain(client: &dyn ChainClient) -> Result<Self, ClientError> {
        let timelock_secs = client.timelock_duration().await?;
        info!(timelock_secs, "claim timelock loaded from contract");
        Ok(Self::with_timelock(timelock_secs))
    }

    pub fn with_timelock(timelock_secs: u64) -> Self {
        ClaimTracker {
            timelock_secs,
            withdrawals: Mutex::new(Vec::new()),
        }
    }

    pub fn timelock_secs(&self) -> u64 {
        self.timelock_secs
    }

    /// Replace the tracked set and recompute readiness immediately.
    pub fn set_withdrawals(&self, records: Vec<PendingWithdrawal>) {
        {
            let mut slot = self.withdrawals.lock().expect("withdrawals lock");
            *slot = records;
        }
        self.refresh_at(unix_now());
    }

    /// Recompute readiness for every unprocessed withdrawal.
    pub fn refresh(&self) {
        self.refresh_at(unix_now());
    }

    /// Recompute readiness against an explicit clock (tests).
    pub fn refresh_at(&self, now: u64) {
        let mut slot = self.withdrawals.lock().expect("withdrawals lock");
        for withdrawal in slot.iter_mut() {
            if withdrawal.processed {
                // Terminal: excluded from further recomputation.
                withdrawal.claimable = false;
                withdrawal.time_remaining = 0;
                continue;
            }
            withdrawal.claimable = is_claimable(withdrawal, self.timelock_secs, now);
            withdrawal.time_remaining = time_remaining(withdrawal, self.timelock_secs, now);
        }
        debug!(
            total = slot.len(),
            claimable = slot.iter().filter(|w| w.claimable).count(),
            "claim eligibility refreshed"
        );
    }

    /// Snapshot of the tracked set.
    pub fn snapshot(&self) -> Vec<PendingWithdrawal> {
        self.withdrawals.lock().expect("withdrawals lock").clone()
    }

    pub fn get(&self, withdrawal_id: u64) -> Option<PendingWithdrawal> {
        self.withdrawals
            .lock()
            .expect("withdrawals lock")
            .iter()
            .find(|w| w.withdrawal_id == withdrawal_id)
            .cloned()
    }

    /// Mark a withdrawal released. It becomes terminal.
    pub fn mark_processed(&self, withdrawal_id: u64) {
        let mut slot = self.withdrawals.lock().expect("withdrawals lock");
        if let Some(withdrawal) = slot.iter_mut().find(|w| w.withdrawal_id == withdrawal_id) {
            withdrawal.processed = true;
            withdrawal.claimable = false;
            withdrawal.time_remaining = 0;
        }
    }

    /// Pull the latest withdrawal set from `source` for `owner`, then
    /// recompute readiness. Source failures keep the previous set.
    pub async fn sync(&self, source: &dyn WithdrawalSource, owner: Address) {
        match source.withdrawals_for(owner).await {
            Ok(records) => self.set_withdrawals(records),
            Err(e) => warn!(error = %e, "failed to refresh pending withdrawals"),
        }
    }
}

/// Periodic eligibility refresh owned by the session lifetime.
pub fn spawn_claim_polling(
    tracker: Arc<ClaimTracker>,
    source: Arc<dyn WithdrawalSource>,
    owner: Address,
    interval: Duration,
) -> Poller {
    Poller::spawn(interval, move || {
        let tracker = tracker.clone();
        let source = source.clone();
        async move {
            tracker.sync(source.as_ref(), owner).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn withdrawal(id: u64, timestamp: u64, processed: bool) -> PendingWithdrawal {
        PendingWithdrawal {
            withdrawal_id: id,
            owner: Address::ZERO,
            token: Address::ZERO,
            amount: U256::from(1_000u64),
            timestamp,
            processed,
            claimable: false,
            time_remaining: 0,
        }
    }

    #[test]
    fn test_claimable_boundary() {
        let timelock = 600;
        let now = 10_000;

        // Exactly at the deadline: claimable.
        let w = withdrawal(1, now - 600, false);
        assert!(is_claimable(&w, timelock, now));
        assert_eq!(time_remaining(&w, timelock, now), 0);

        // One second short: not yet.
        let w = withdrawal(2, now - 599, false);
        assert!(!is_claimable(&w, timelock, now));
        assert_eq!(time_remaining(&w, timelock, now), 1);
    }

    #[test]
    fn test_time_remaining_monotonic_and_non_negative() {
        let timelock = 600;
        let w = withdrawal(1, 10_000, false);

        let mut previous = u64::MAX;
        for now in [10_000, 10_100, 10_300, 10_599, 10_600, 11_000] {
            let remaining = time_remaining(&w, timelock, now);
            assert!(remaining <= previous);
            previous = remaining;
        }
        assert_eq!(time_remaining(&w, timelock, 20_000), 0);
    }

    #[test]
    fn test_processed_never_claimable() {
        let timelock = 600;
        let w = withdrawal(1, 0, true);
        // Timestamp math says ready long ago; processed still wins.
        assert!(!is_claimable(&w, timelock, 1_000_000));
    }

    #[test]
    fn test_format_time_remaining() {
        assert_eq!(format_time_remaining(0), "ready");
        assert_eq!(format_time_remaining(59), "0m remaining");
        assert_eq!(format_time_remaining(60), "1m remaining");
        assert_eq!(format_time_remaining(59 * 60), "59m remaining");
        assert_eq!(format_time_remaining(3_600), "1h 0m remaining");
        assert_eq!(format_time_remaining(3_660), "1h 1m remaining");
        assert_eq!(format_time_remaining(86_400), "1d 0h remaining");
        assert_eq!(format_time_remaining(90_000), "1d 1h remaining");
    }

    #[test]
    fn test_tracker_refresh_and_terminal_processed() {
        let tracker = ClaimTracker::with_timelock(600);
        tracker.set_withdrawals(vec![
            withdrawal(1, 0, false),
            withdrawal(2, u64::MAX - 1_000, false),
            withdrawal(3, 0, true),
        ]);
        tracker.refresh_at(10_000);

        let snapshot = tracker.snapshot();
        assert!(snapshot[0].claimable);
        assert!(!snapshot[1].claimable);
        assert!(snapshot[1].time_remaining > 0);
        assert!(!snapshot[2].claimable, "processed stays excluded");

        tracker.mark_processed(1);
        tracker.refresh_at(20_000);
        assert!(!tracker.get(1).unwrap().claimable);
    }

    #[test]
    fn test_wire_record_conversion() {
        let record = WithdrawalRecord {
            withdraw_id: 9,
            user: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
            token: "0x0000000000000000000000000000000000000000".to_string(),
            amount: "1500000000000000000".to_string(),
            timestamp: 1_700_000_000,
            is_processed: false,
        };
        let pending = record.into_pending().unwrap();
        assert_eq!(pending.withdrawal_id, 9);
        assert!(pending.is_native());
        assert_eq!(pending.amount, U256::from(1_500_000_000_000_000_000u128));
    }

    #[test]
    fn test_wire_response_deserializes() {
        let body = r#"{
            "success": true,
            "withdrawals": [{
                "withdrawId": 3,
                "user": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
                "token": "0x7169D38820dfd117C3FA1f22a697dba58d90BA06",
                "amount": "2500000",
                "timestamp": 1700000000,
                "isProcessed": true
            }]
        }"#;
        let response: WithdrawalsResponse = serde_json::from_str(body).unwrap();
        assert!(response.success);
        assert_eq!(response.withdrawals.len(), 1);

        let pending = response
            .withdrawals
            .into_iter()
            .next()
            .unwrap()
            .into_pending()
            .unwrap();
        assert_eq!(pending.withdrawal_id, 3);
        assert!(pending.processed);
        assert!(!pending.is_native());
    }

    #[test]
    fn test_wire_record_rejects_garbage() {
        let record = WithdrawalRecord {
            withdraw_id: 1,
            user: "not-an-address".to_string(),
            token: "0x0000000000000000000000000000000000000000".to_string(),
            amount: "10".to_string(),
            timestamp: 0,
            is_processed: false,
        };
        assert!(record.into_pending().is_err());
    }
}
