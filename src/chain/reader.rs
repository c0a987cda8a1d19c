//! Typed chain reads over the node and the exchange API

use super::txpool::TxpoolContent;
use super::types::{Block, BlockTag, BlockTransaction, RawBlock, TransactionReceipt, TxpoolStatus};
use crate::codec::abi::balance_of_data;
use crate::codec::address::{append_0x_to_address, append_fm_to_address, Address};
use crate::codec::hex::{parse_big, parse_u64};
use crate::error::{ClientResult, ResultExt};
use crate::rpc::value::{
    decode_object, expect_array, expect_number_text, expect_string, field,
};
use crate::rpc::RpcClient;

use num_bigint::BigUint;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Read-only operations against the chain
#[derive(Debug, Clone)]
pub struct ChainReader {
    rpc: Arc<RpcClient>,
}

impl ChainReader {
    pub fn new(rpc: Arc<RpcClient>) -> Self {
        Self { rpc }
    }

    pub fn rpc(&self) -> &Arc<RpcClient> {
        &self.rpc
    }

    /// Latest block height (exchange API `blocknumber`)
    pub async fn block_number(&self) -> ClientResult<u64> {
        let data = self
            .rpc
            .signed_api_call("blocknumber", &json!({}))
            .await
            .context("get block number")?;

        let text = expect_number_text(field(&data, "block_number")).context("get block number")?;
        parse_u64(&text, 10, "block number").context("get block number")
    }

    /// Block with its transaction list (exchange API `blocktxs`)
    pub async fn block_by_number(&self, height: u64) -> ClientResult<Block> {
        let ctx = || format!("get block {}", height);
        let data = self
            .rpc
            .signed_api_call("blocktxs", &json!({ "number": height }))
            .await
            .with_context(ctx)?;

        let mut raw: RawBlock = decode_object(&data, "block").with_context(ctx)?;
        // The API does not echo the height back
        raw.number = Some(height.to_string());
        let block = Block::from_raw(raw, 10).with_context(ctx)?;
        debug!("Block {} has {} transactions", height, block.transactions.len());
        Ok(block)
    }

    /// Block by hash (`eth_getBlockByHash`)
    pub async fn block_by_hash(&self, hash: &str, full_transactions: bool) -> ClientResult<Block> {
        let ctx = || format!("get block {}", hash);
        let result = self
            .rpc
            .call("eth_getBlockByHash", vec![json!(hash), json!(full_transactions)])
            .await
            .with_context(ctx)?;

        let raw: RawBlock = decode_object(&result, "block").with_context(ctx)?;
        Block::from_raw(raw, 16).with_context(ctx)
    }

    /// Transaction by id; the node expects the id in `FM` notation
    pub async fn transaction_by_hash(&self, txid: &str) -> ClientResult<BlockTransaction> {
        let txid = append_fm_to_address(txid);
        let ctx = || format!("get transaction {}", txid);
        let result = self
            .rpc
            .call("eth_getTransactionByHash", vec![json!(txid)])
            .await
            .with_context(ctx)?;

        decode_object(&result, "transaction").with_context(ctx)
    }

    pub async fn transaction_receipt(&self, txid: &str) -> ClientResult<TransactionReceipt> {
        let ctx = || format!("get receipt of {}", txid);
        let result = self
            .rpc
            .call("eth_getTransactionReceipt", vec![json!(txid)])
            .await
            .with_context(ctx)?;

        decode_object(&result, "transaction receipt").with_context(ctx)
    }

    /// Native balance (exchange API `balance`, decimal string)
    pub async fn balance(&self, address: &Address) -> ClientResult<BigUint> {
        let ctx = || format!("get balance of {}", address.to_fm());
        let data = self
            .rpc
            .signed_api_call("balance", &json!({ "address": address.to_fm() }))
            .await
            .with_context(ctx)?;

        let balance = expect_string(field(&data, "balance")).with_context(ctx)?;
        parse_big(balance, 10, "balance").with_context(ctx)
    }

    /// Token balance through `balanceOf` on `contract`
    pub async fn token_balance(
        &self,
        owner: &Address,
        contract: &str,
        tag: BlockTag,
    ) -> ClientResult<BigUint> {
        let ctx = || format!("get token balance of {} at {}", owner, contract);
        let contract = append_0x_to_address(contract);
        let data = balance_of_data(&owner.to_rpc()).with_context(ctx)?;

        let result = self
            .rpc
            .call(
                "eth_call",
                vec![json!({ "to": contract, "data": data }), json!(tag.as_str())],
            )
            .await
            .with_context(ctx)?;

        let balance = expect_string(&result).with_context(ctx)?;
        parse_big(balance, 16, "token balance").with_context(ctx)
    }

    /// Account nonce (exchange API `getnonce`, hex string)
    pub async fn nonce(&self, address: &Address) -> ClientResult<u64> {
        let ctx = || format!("get nonce of {}", address.to_fm());
        let data = self
            .rpc
            .signed_api_call("getnonce", &json!({ "address": address.to_fm() }))
            .await
            .with_context(ctx)?;

        let nonce = expect_string(field(&data, "nonce")).with_context(ctx)?;
        parse_u64(nonce, 16, "nonce").with_context(ctx)
    }

    pub async fn gas_price(&self) -> ClientResult<BigUint> {
        let result = self
            .rpc
            .call("eth_gasPrice", vec![])
            .await
            .context("get gas price")?;

        let price = expect_string(&result).context("get gas price")?;
        parse_big(price, 16, "gas price").context("get gas price")
    }

    /// Accounts held by the node
    pub async fn accounts(&self) -> ClientResult<Vec<String>> {
        let result = self
            .rpc
            .call("eth_accounts", vec![])
            .await
            .context("get accounts")?;

        expect_array(&result)
            .context("get accounts")?
            .iter()
            .map(|acc| expect_string(acc).map(str::to_string).context("get accounts"))
            .collect()
    }

    pub async fn txpool_content(&self) -> ClientResult<TxpoolContent> {
        let result = self
            .rpc
            .call("txpool_content", vec![])
            .await
            .context("get txpool content")?;

        TxpoolContent::from_value(&result).context("get txpool content")
    }

    pub async fn txpool_status(&self) -> ClientResult<TxpoolStatus> {
        #[derive(Deserialize)]
        struct RawStatus {
            pending: Value,
            queued: Value,
        }

        let result = self
            .rpc
            .call("txpool_status", vec![])
            .await
            .context("get txpool status")?;

        let raw: RawStatus = decode_object(&result, "txpool status").context("get txpool status")?;
        let pending = expect_string(&raw.pending).context("get txpool status")?;
        let queued = expect_string(&raw.queued).context("get txpool status")?;

        Ok(TxpoolStatus {
            pending: parse_u64(pending, 16, "pending count").context("get txpool status")?,
            queued: parse_u64(queued, 16, "queued count").context("get txpool status")?,
        })
    }

    /// Whether `address` is among the node's accounts
    pub async fn is_node_account(&self, address: &Address) -> ClientResult<bool> {
        let accounts = self.accounts().await?;
        Ok(accounts
            .iter()
            .any(|acc| Address::parse(&append_0x_to_address(acc)).ok().as_ref() == Some(address)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenGenerator;
    use crate::chain::BlockTxEntry;
    use crate::config::{ClassifierKind, ClientConfig};
    use crate::error::{ClientError, JsonKind};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const OWNER: &str = "a8cc6864cbd7f7e06dc4405ce04bb27abb91403b";

    fn reader_for(server: &MockServer) -> ChainReader {
        let config = ClientConfig {
            base_url: format!("{}/exchange/", server.uri()),
            rpc_url: Some(format!("{}/rpc", server.uri())),
            debug: false,
            classifier: ClassifierKind::Status,
        };
        let rpc = RpcClient::new(&config, TokenGenerator::new("k").unwrap()).unwrap();
        ChainReader::new(Arc::new(rpc))
    }

    fn api_ok(data: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({"status": "success", "data": data}))
    }

    fn rpc_ok(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {},
            "jsonrpc": "2.0",
            "id": 1,
            "result": result
        }))
    }

    async fn mount_rpc(server: &MockServer, rpc_method: &str, result: Value) {
        Mock::given(method("POST"))
            .and(path("/rpc"))
            .and(body_partial_json(json!({ "method": rpc_method })))
            .respond_with(rpc_ok(result))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_block_number() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/exchange/blocknumber"))
            .respond_with(api_ok(json!({"block_number": 1279134})))
            .mount(&server)
            .await;

        assert_eq!(reader_for(&server).block_number().await.unwrap(), 1_279_134);
    }

    #[tokio::test]
    async fn test_block_number_wrong_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/exchange/blocknumber"))
            .respond_with(api_ok(json!({"block_number": "1279134"})))
            .mount(&server)
            .await;

        let err = reader_for(&server).block_number().await.unwrap_err();
        assert!(matches!(
            err.root(),
            ClientError::Shape {
                expected: JsonKind::Number,
                found: JsonKind::String,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_block_by_number() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/exchange/blocktxs"))
            .and(body_partial_json(json!({"number": 1279134})))
            .respond_with(api_ok(json!({
                "hash": "0xaa",
                "parentHash": "0xbb",
                "list": [{"hash": "0x01", "from": "FMabc"}]
            })))
            .mount(&server)
            .await;

        let block = reader_for(&server).block_by_number(1_279_134).await.unwrap();
        assert_eq!(block.height, 1_279_134);
        assert_eq!(block.tx_hashes(), vec!["0x01"]);
        assert!(matches!(block.transactions[0], BlockTxEntry::Full(_)));
    }

    #[tokio::test]
    async fn test_block_by_hash() {
        let server = MockServer::start().await;
        mount_rpc(
            &server,
            "eth_getBlockByHash",
            json!({"hash": "0xaa", "parentHash": "0xbb", "number": "0x10", "transactions": []}),
        )
        .await;

        let block = reader_for(&server).block_by_hash("0xaa", false).await.unwrap();
        assert_eq!(block.height, 16);
        assert_eq!(block.hash, "0xaa");
    }

    #[tokio::test]
    async fn test_transaction_by_hash_uses_fm_notation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rpc"))
            .and(body_partial_json(json!({
                "method": "eth_getTransactionByHash",
                "params": ["FM1234"]
            })))
            .respond_with(rpc_ok(json!({"hash": "FM1234", "nonce": "0x5"})))
            .mount(&server)
            .await;

        let tx = reader_for(&server).transaction_by_hash("1234").await.unwrap();
        assert_eq!(tx.nonce.as_deref(), Some("0x5"));
    }

    #[tokio::test]
    async fn test_missing_transaction_is_shape_error() {
        let server = MockServer::start().await;
        mount_rpc(&server, "eth_getTransactionReceipt", Value::Null).await;

        let err = reader_for(&server).transaction_receipt("0x01").await.unwrap_err();
        assert!(err.to_string().contains("get receipt of 0x01"));
        assert!(matches!(err.root(), ClientError::Shape { found: JsonKind::Null, .. }));
    }

    #[tokio::test]
    async fn test_balance() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/exchange/balance"))
            .and(body_partial_json(json!({ "address": format!("FM{}", OWNER) })))
            .respond_with(api_ok(json!({"balance": "100"})))
            .mount(&server)
            .await;

        let owner = Address::parse(OWNER).unwrap();
        assert_eq!(
            reader_for(&server).balance(&owner).await.unwrap(),
            BigUint::from(100u32)
        );
    }

    #[tokio::test]
    async fn test_balance_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "fail",
                "code": 3,
                "msg": "bad token"
            })))
            .mount(&server)
            .await;

        let owner = Address::parse(OWNER).unwrap();
        let err = reader_for(&server).balance(&owner).await.unwrap_err();
        assert!(err.is_protocol());
        assert_eq!(err.root().to_string(), "[3]bad token");
        assert!(err.to_string().contains(&format!("FM{}", OWNER)));
    }

    #[tokio::test]
    async fn test_token_balance() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rpc"))
            .and(body_partial_json(json!({
                "method": "eth_call",
                "params": [
                    {
                        "to": "0x0000000000000000000000000000000000000abc",
                        "data": format!("0x70a08231{}{}", "0".repeat(24), OWNER)
                    },
                    "latest"
                ]
            })))
            .respond_with(rpc_ok(json!(format!("0x{:064x}", 1000))))
            .mount(&server)
            .await;

        let owner = Address::parse(OWNER).unwrap();
        let balance = reader_for(&server)
            .token_balance(&owner, "0000000000000000000000000000000000000abc", BlockTag::Latest)
            .await
            .unwrap();
        assert_eq!(balance, BigUint::from(1000u32));
    }

    #[tokio::test]
    async fn test_nonce_is_hex() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/exchange/getnonce"))
            .respond_with(api_ok(json!({"nonce": "1a"})))
            .mount(&server)
            .await;

        let owner = Address::parse(OWNER).unwrap();
        assert_eq!(reader_for(&server).nonce(&owner).await.unwrap(), 26);
    }

    #[tokio::test]
    async fn test_gas_price_and_accounts() {
        let server = MockServer::start().await;
        mount_rpc(&server, "eth_gasPrice", json!("0x3b9aca00")).await;
        mount_rpc(&server, "eth_accounts", json!([format!("0x{}", OWNER.to_uppercase())])).await;

        let reader = reader_for(&server);
        assert_eq!(reader.gas_price().await.unwrap(), BigUint::from(1_000_000_000u64));
        assert_eq!(reader.accounts().await.unwrap().len(), 1);
        assert!(reader
            .is_node_account(&Address::parse(OWNER).unwrap())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_txpool_status() {
        let server = MockServer::start().await;
        mount_rpc(&server, "txpool_status", json!({"pending": "0x3", "queued": "0x0"})).await;

        let status = reader_for(&server).txpool_status().await.unwrap();
        assert_eq!(status, TxpoolStatus { pending: 3, queued: 0 });
    }

    #[tokio::test]
    async fn test_txpool_content() {
        let server = MockServer::start().await;
        mount_rpc(
            &server,
            "txpool_content",
            json!({"pending": {format!("0x{}", OWNER.to_uppercase()): {"4": {}, "5": {}}}, "queued": {}}),
        )
        .await;

        let pool = reader_for(&server).txpool_content().await.unwrap();
        assert_eq!(pool.pending_count(&format!("0x{}", OWNER)), 2);
    }
}
