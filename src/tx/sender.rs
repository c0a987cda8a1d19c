//! Transaction submission to the node
//!
//! Two paths:
//! - Pre-signed transactions via `eth_sendRawTransaction`
//! - Node-signed transactions via `eth_sendTransaction`, wrapped in an
//!   unlock / send / lock sequence for password-protected node accounts
//!
//! The unlock / send / lock sequence is not atomic on the node. Callers must
//! serialize submissions for the same account; this module holds no locks.

use super::builder::SendParams;
use crate::codec::Address;
use crate::error::{ClientError, ClientResult, JsonKind, ResultExt};
use crate::rpc::value::expect_string;
use crate::rpc::RpcClient;

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Unlocks and relocks node-held accounts. Key management itself lives
/// outside this crate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountLocker: Send + Sync {
    async fn unlock(&self, address: &Address, password: &str, ttl_secs: u64) -> ClientResult<()>;

    async fn lock(&self, address: &Address) -> ClientResult<()>;
}

/// `personal_unlockAccount` / `personal_lockAccount` on the node
#[derive(Debug, Clone)]
pub struct NodeAccountLocker {
    rpc: Arc<RpcClient>,
}

impl NodeAccountLocker {
    pub fn new(rpc: Arc<RpcClient>) -> Self {
        Self { rpc }
    }
}

fn expect_confirmation(result: &Value, refused: impl FnOnce() -> String) -> ClientResult<()> {
    match result {
        Value::Bool(true) => Ok(()),
        Value::Bool(false) => Err(ClientError::InvalidArgument(refused())),
        other => Err(ClientError::shape(JsonKind::Bool, other)),
    }
}

#[async_trait]
impl AccountLocker for NodeAccountLocker {
    async fn unlock(&self, address: &Address, password: &str, ttl_secs: u64) -> ClientResult<()> {
        let ctx = || format!("unlock {}", address.to_fm());
        let result = self
            .rpc
            .call(
                "personal_unlockAccount",
                vec![json!(address.to_fm()), json!(password), json!(ttl_secs)],
            )
            .await
            .with_context(ctx)?;

        expect_confirmation(&result, || format!("node refused to unlock {}", address.to_fm()))
            .with_context(ctx)
    }

    async fn lock(&self, address: &Address) -> ClientResult<()> {
        let ctx = || format!("lock {}", address.to_fm());
        let result = self
            .rpc
            .call("personal_lockAccount", vec![json!(address.to_fm())])
            .await
            .with_context(ctx)?;

        expect_confirmation(&result, || format!("node refused to lock {}", address.to_fm()))
            .with_context(ctx)
    }
}

/// Outcome of an unlock / send / lock sequence whose send succeeded
#[derive(Debug)]
pub struct SendReceipt {
    pub tx_id: String,
    /// Set when relocking the account failed after the send
    pub lock_error: Option<ClientError>,
}

impl SendReceipt {
    pub fn is_clean(&self) -> bool {
        self.lock_error.is_none()
    }
}

/// Submits transactions and returns their ids
#[derive(Debug, Clone)]
pub struct Submitter {
    rpc: Arc<RpcClient>,
    unlock_ttl_secs: u64,
}

impl Submitter {
    pub fn new(rpc: Arc<RpcClient>, unlock_ttl_secs: u64) -> Self {
        Self {
            rpc,
            unlock_ttl_secs,
        }
    }

    pub async fn send_raw_transaction(&self, signed_hex: &str) -> ClientResult<String> {
        let result = self
            .rpc
            .call("eth_sendRawTransaction", vec![json!(signed_hex)])
            .await
            .context("send raw transaction")?;

        let tx_id = expect_string(&result).context("send raw transaction")?;
        info!("Raw transaction submitted: {}", tx_id);
        Ok(tx_id.to_string())
    }

    /// Node-signed send; the `from` account must already be unlocked
    pub async fn send_transaction(&self, params: &SendParams) -> ClientResult<String> {
        let ctx = || format!("send transaction from {} to {}", params.from, params.to);
        let result = self
            .rpc
            .call("eth_sendTransaction", vec![json!(params)])
            .await
            .with_context(ctx)?;

        let tx_id = expect_string(&result).with_context(ctx)?;
        info!("Transaction submitted: {} ({} -> {})", tx_id, params.from, params.to);
        Ok(tx_id.to_string())
    }

    /// Unlock the sender, send, then lock again.
    ///
    /// An unlock failure aborts before sending. The lock is attempted
    /// whether or not the send succeeded; a send error wins over a lock
    /// error, and a lock error after a successful send is reported in the
    /// receipt next to the txid.
    pub async fn send_with_unlock(
        &self,
        locker: &dyn AccountLocker,
        params: &SendParams,
        password: &str,
    ) -> ClientResult<SendReceipt> {
        let address = Address::parse(&params.from).context("sender address")?;

        locker
            .unlock(&address, password, self.unlock_ttl_secs)
            .await?;
        debug!("Unlocked {} for {}s", address.to_fm(), self.unlock_ttl_secs);

        let sent = self.send_transaction(params).await;
        let locked = locker.lock(&address).await;

        match (sent, locked) {
            (Ok(tx_id), Ok(())) => Ok(SendReceipt {
                tx_id,
                lock_error: None,
            }),
            (Ok(tx_id), Err(e)) => {
                error!("Failed to lock {} after sending {}: {}", address.to_fm(), tx_id, e);
                Ok(SendReceipt {
                    tx_id,
                    lock_error: Some(e),
                })
            }
            (Err(send_err), Ok(())) => Err(send_err),
            (Err(send_err), Err(lock_err)) => {
                error!(
                    "Failed to lock {} after failed send: {}",
                    address.to_fm(),
                    lock_err
                );
                Err(send_err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenGenerator;
    use crate::config::{ClassifierKind, ClientConfig};
    use mockall::predicate::{always, eq};
    use mockall::Sequence;
    use tokio_test::{assert_err, assert_ok};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FROM: &str = "FMa8cc6864cbd7f7e06dc4405ce04bb27abb91403b";
    const TO: &str = "FMd35f9ea14d063af9b3567064fab567275b09f03d";
    const TXID: &str = "0x5d2e5d7b6d5e2f1f0cce1c6f3f7c4f1ab1c9f51f0e07f6d3f2f3dbbe1d3e7a11";

    fn rpc_for(server: &MockServer) -> Arc<RpcClient> {
        let config = ClientConfig {
            base_url: format!("{}/exchange/", server.uri()),
            rpc_url: Some(format!("{}/rpc", server.uri())),
            debug: false,
            classifier: ClassifierKind::Status,
        };
        Arc::new(RpcClient::new(&config, TokenGenerator::new("k").unwrap()).unwrap())
    }

    fn params() -> SendParams {
        SendParams {
            from: FROM.to_string(),
            to: TO.to_string(),
            value: Some("0x3e8".to_string()),
            gas: "0x5208".to_string(),
            gas_price: "0x3b9aca00".to_string(),
            data: None,
        }
    }

    async fn mount_send(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/rpc"))
            .and(body_partial_json(json!({"method": "eth_sendTransaction"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn rejected() -> serde_json::Value {
        json!({"status": "fail", "code": 12, "msg": "insufficient funds"})
    }

    fn accepted() -> serde_json::Value {
        json!({"status": "success", "data": {}, "result": TXID})
    }

    #[tokio::test]
    async fn test_send_raw_transaction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rpc"))
            .and(body_partial_json(json!({
                "method": "eth_sendRawTransaction",
                "params": ["0xf86b01"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(accepted()))
            .mount(&server)
            .await;

        let submitter = Submitter::new(rpc_for(&server), 300);
        let tx_id = assert_ok!(submitter.send_raw_transaction("0xf86b01").await);
        assert_eq!(tx_id, TXID);
    }

    #[tokio::test]
    async fn test_send_transaction_body_uses_fm_notation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rpc"))
            .and(body_partial_json(json!({
                "method": "eth_sendTransaction",
                "params": [{"from": FROM, "to": TO, "gasPrice": "0x3b9aca00"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(accepted()))
            .expect(1)
            .mount(&server)
            .await;

        let submitter = Submitter::new(rpc_for(&server), 300);
        assert_eq!(submitter.send_transaction(&params()).await.unwrap(), TXID);
    }

    #[tokio::test]
    async fn test_unlock_send_lock_in_order() {
        let server = MockServer::start().await;
        mount_send(&server, accepted()).await;

        let mut seq = Sequence::new();
        let mut locker = MockAccountLocker::new();
        locker
            .expect_unlock()
            .with(always(), eq("secret"), eq(120u64))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        locker
            .expect_lock()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let submitter = Submitter::new(rpc_for(&server), 120);
        let receipt = submitter
            .send_with_unlock(&locker, &params(), "secret")
            .await
            .unwrap();
        assert_eq!(receipt.tx_id, TXID);
        assert!(receipt.is_clean());
    }

    #[tokio::test]
    async fn test_unlock_failure_skips_send() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(accepted()))
            .expect(0)
            .mount(&server)
            .await;

        let mut locker = MockAccountLocker::new();
        locker
            .expect_unlock()
            .returning(|_, _, _| Err(ClientError::InvalidArgument("bad password".into())));
        locker.expect_lock().times(0);

        let submitter = Submitter::new(rpc_for(&server), 300);
        let err = assert_err!(submitter.send_with_unlock(&locker, &params(), "x").await);
        assert!(matches!(err, ClientError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_send_failure_still_locks() {
        let server = MockServer::start().await;
        mount_send(&server, rejected()).await;

        let mut locker = MockAccountLocker::new();
        locker.expect_unlock().returning(|_, _, _| Ok(()));
        locker.expect_lock().times(1).returning(|_| Ok(()));

        let submitter = Submitter::new(rpc_for(&server), 300);
        let err = submitter
            .send_with_unlock(&locker, &params(), "secret")
            .await
            .unwrap_err();
        assert!(matches!(err.root(), ClientError::Protocol { code: 12, .. }));
    }

    #[tokio::test]
    async fn test_send_error_wins_over_lock_error() {
        let server = MockServer::start().await;
        mount_send(&server, rejected()).await;

        let mut locker = MockAccountLocker::new();
        locker.expect_unlock().returning(|_, _, _| Ok(()));
        locker
            .expect_lock()
            .times(1)
            .returning(|_| Err(ClientError::InvalidArgument("lock refused".into())));

        let submitter = Submitter::new(rpc_for(&server), 300);
        let err = submitter
            .send_with_unlock(&locker, &params(), "secret")
            .await
            .unwrap_err();
        assert!(matches!(err.root(), ClientError::Protocol { code: 12, .. }));
    }

    #[tokio::test]
    async fn test_lock_failure_keeps_txid() {
        let server = MockServer::start().await;
        mount_send(&server, accepted()).await;

        let mut locker = MockAccountLocker::new();
        locker.expect_unlock().returning(|_, _, _| Ok(()));
        locker
            .expect_lock()
            .returning(|_| Err(ClientError::InvalidArgument("lock refused".into())));

        let submitter = Submitter::new(rpc_for(&server), 300);
        let receipt = submitter
            .send_with_unlock(&locker, &params(), "secret")
            .await
            .unwrap();
        assert_eq!(receipt.tx_id, TXID);
        assert!(matches!(
            receipt.lock_error,
            Some(ClientError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_node_locker() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rpc"))
            .and(body_partial_json(json!({
                "method": "personal_unlockAccount",
                "params": [FROM, "secret", 300]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success", "data": {}, "result": true
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rpc"))
            .and(body_partial_json(json!({"method": "personal_lockAccount"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success", "data": {}, "result": false
            })))
            .mount(&server)
            .await;

        let locker = NodeAccountLocker::new(rpc_for(&server));
        let address = Address::parse(FROM).unwrap();
        assert_ok!(locker.unlock(&address, "secret", 300).await);

        let err = locker.lock(&address).await.unwrap_err();
        assert!(matches!(err.root(), ClientError::InvalidArgument(_)));
        assert!(err.to_string().starts_with("lock FMa8cc"));
    }
}
