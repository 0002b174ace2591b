use crate::chain::{
    Address,
    ChainError,
    ChainReader,
};

/// Snapshot of the two on-chain day counters for one address.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DayStatus {
    pub current_day: u64,
    pub last_claim_day: u64,
}

impl DayStatus {
    /// "Today" is whatever the contract says it is; no local clock is involved.
    pub fn has_claimed_today(&self) -> bool {
        self.last_claim_day == self.current_day
    }
}

/// Read failures are transient: callers keep whatever state they already had.
#[derive(Debug, thiserror::Error)]
#[error("claim eligibility unavailable: {0}")]
pub struct OracleError(#[from] pub ChainError);

#[derive(Clone, Debug)]
pub struct ClaimEligibilityOracle<R> {
    reader: R,
}

impl<R: ChainReader> ClaimEligibilityOracle<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Issues both view calls concurrently and joins them.
    pub async fn check(&self, owner: Address) -> Result<DayStatus, OracleError> {
        let (current_day, last_claim_day) = futures::try_join!(
            self.reader.current_day(),
            self.reader.last_claim_day(owner)
        )?;
        tracing::info!(%owner, current_day, last_claim_day, "claim status");
        Ok(DayStatus {
            current_day,
            last_claim_day,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::chain::rpc::RpcError;
    use std::{
        future::Future,
        sync::{
            Arc,
            Mutex,
        },
    };

    #[derive(Clone, Default)]
    struct ScriptedReader {
        current_day: Arc<Mutex<u64>>,
        last_claim_day: Arc<Mutex<u64>>,
        fail: Arc<Mutex<bool>>,
    }

    impl ChainReader for ScriptedReader {
        fn current_day(&self) -> impl Future<Output = Result<u64, ChainError>> + Send {
            let day = *self.current_day.lock().unwrap();
            let fail = *self.fail.lock().unwrap();
            async move {
                if fail {
                    Err(ChainError::Rpc(RpcError::InvalidResponse("timeout".into())))
                } else {
                    Ok(day)
                }
            }
        }

        fn last_claim_day(
            &self,
            _owner: Address,
        ) -> impl Future<Output = Result<u64, ChainError>> + Send {
            let day = *self.last_claim_day.lock().unwrap();
            async move { Ok(day) }
        }
    }

    #[tokio::test]
    async fn check__claimed_today_when_days_match() {
        // given
        let reader = ScriptedReader::default();
        *reader.current_day.lock().unwrap() = 20_000;
        *reader.last_claim_day.lock().unwrap() = 20_000;
        let oracle = ClaimEligibilityOracle::new(reader);

        // when
        let status = oracle.check(Address::new([1; 20])).await.unwrap();

        // then
        assert!(status.has_claimed_today());
    }

    #[tokio::test]
    async fn check__day_rollover_clears_claimed_today() {
        // given
        let reader = ScriptedReader::default();
        *reader.current_day.lock().unwrap() = 20_000;
        *reader.last_claim_day.lock().unwrap() = 20_000;
        let oracle = ClaimEligibilityOracle::new(reader.clone());
        let owner = Address::new([1; 20]);
        assert!(oracle.check(owner).await.unwrap().has_claimed_today());

        // when
        *reader.current_day.lock().unwrap() = 20_001;
        let status = oracle.check(owner).await.unwrap();

        // then
        assert!(!status.has_claimed_today());
    }

    #[tokio::test]
    async fn check__reports_read_failures_as_errors() {
        // given
        let reader = ScriptedReader::default();
        *reader.fail.lock().unwrap() = true;
        let oracle = ClaimEligibilityOracle::new(reader);

        // when
        let result = oracle.check(Address::new([1; 20])).await;

        // then
        assert!(result.is_err());
    }

    #[test]
    fn has_claimed_today__never_claimed_address_is_eligible() {
        let status = DayStatus {
            current_day: 5,
            last_claim_day: 0,
        };
        assert!(!status.has_claimed_today());
    }
}
