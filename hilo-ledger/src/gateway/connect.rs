use super::{GatewayConfig, GatewayConnector, LedgerGateway};
use crate::error::LedgerError;
use std::fmt;
use std::sync::Arc;

/// Result of gateway establishment. `Offline` is a degraded mode, not a failure.
#[derive(Clone)]
pub enum GatewayStatus {
    Online(Arc<dyn LedgerGateway>),
    Offline { reason: String },
}

impl GatewayStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, GatewayStatus::Online(_))
    }

    pub fn handle(&self) -> Option<Arc<dyn LedgerGateway>> {
        match self {
            GatewayStatus::Online(handle) => Some(handle.clone()),
            GatewayStatus::Offline { .. } => None,
        }
    }
}

impl fmt::Debug for GatewayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayStatus::Online(handle) => f
                .debug_struct("Online")
                .field("account_id", &handle.account_id())
                .finish(),
            GatewayStatus::Offline { reason } => {
                f.debug_struct("Offline").field("reason", reason).finish()
            }
        }
    }
}

/// Connect once, bounded by `config.connect_timeout`.
///
/// Never fails: an invalid config, a connector error, or a timeout all
/// degrade to [`GatewayStatus::Offline`].
pub async fn establish(connector: &dyn GatewayConnector, config: &GatewayConfig) -> GatewayStatus {
    if let Err(e) = config.validate() {
        tracing::warn!("Ledger gateway disabled: {}", e);
        return GatewayStatus::Offline {
            reason: e.to_string(),
        };
    }

    match tokio::time::timeout(config.connect_timeout, connector.connect(config)).await {
        Ok(Ok(handle)) => {
            tracing::info!(
                "Connected to ledger gateway on {} (account: {})",
                config.network,
                handle.account_id().as_deref().unwrap_or("none")
            );
            GatewayStatus::Online(handle)
        }
        Ok(Err(e)) => {
            let err = LedgerError::unavailable(e.to_string());
            tracing::warn!("{}; continuing offline", err);
            GatewayStatus::Offline {
                reason: err.to_string(),
            }
        }
        Err(_) => {
            let err = LedgerError::timeout(format!(
                "gateway not available after {:?}",
                config.connect_timeout
            ));
            tracing::warn!("{}; continuing offline", err);
            GatewayStatus::Offline {
                reason: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::types::{Amount, FunctionCall, Receipt, ViewCall};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::time::Duration;

    struct NullGateway;

    #[async_trait]
    impl LedgerGateway for NullGateway {
        fn account_id(&self) -> Option<String> {
            Some("alice.testnet".to_string())
        }

        async fn view_method(&self, _call: ViewCall) -> Result<Value> {
            Ok(Value::Null)
        }

        async fn call_method(&self, _call: FunctionCall) -> Result<Receipt> {
            Err(LedgerError::rpc("not supported"))
        }

        async fn transfer(&self, _receiver_id: &str, _amount: Amount) -> Result<Receipt> {
            Err(LedgerError::rpc("not supported"))
        }
    }

    enum Behaviour {
        Ready,
        Fail,
        Hang,
    }

    struct TestConnector(Behaviour);

    #[async_trait]
    impl GatewayConnector for TestConnector {
        async fn connect(&self, _config: &GatewayConfig) -> Result<Arc<dyn LedgerGateway>> {
            match self.0 {
                Behaviour::Ready => Ok(Arc::new(NullGateway)),
                Behaviour::Fail => Err(LedgerError::rpc("node refused connection")),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(Arc::new(NullGateway))
                }
            }
        }
    }

    fn fast_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.connect_timeout = Duration::from_millis(50);
        config
    }

    #[tokio::test]
    async fn test_establish_online() {
        let status = establish(&TestConnector(Behaviour::Ready), &fast_config()).await;
        assert!(status.is_online());
        assert_eq!(
            status.handle().and_then(|h| h.account_id()),
            Some("alice.testnet".to_string())
        );
    }

    #[tokio::test]
    async fn test_establish_degrades_on_error() {
        let status = establish(&TestConnector(Behaviour::Fail), &fast_config()).await;
        match status {
            GatewayStatus::Offline { reason } => assert!(reason.contains("node refused")),
            other => panic!("expected offline, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_establish_degrades_on_timeout() {
        let status = establish(&TestConnector(Behaviour::Hang), &fast_config()).await;
        match status {
            GatewayStatus::Offline { reason } => assert!(reason.contains("timeout")),
            other => panic!("expected offline, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_establish_rejects_invalid_config() {
        let mut config = fast_config();
        config.contract_id.clear();
        let status = establish(&TestConnector(Behaviour::Ready), &config).await;
        assert!(!status.is_online());
    }
}
