//! Gas estimation and fee bookkeeping

use super::builder::GasEstimateRequest;
use crate::chain::ChainReader;
use crate::codec::hex::parse_big;
use crate::error::{ClientResult, ResultExt};
use crate::rpc::value::expect_string;

use num_bigint::BigUint;
use serde_json::json;
use tracing::debug;

/// Gas limit and price of a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxFeeInfo {
    pub gas_limit: BigUint,
    pub gas_price: BigUint,
}

impl TxFeeInfo {
    pub fn new(gas_limit: BigUint, gas_price: BigUint) -> Self {
        Self {
            gas_limit,
            gas_price,
        }
    }

    /// Total cost in wei
    pub fn fee(&self) -> BigUint {
        &self.gas_limit * &self.gas_price
    }
}

/// Asks the node for gas limits
#[derive(Debug, Clone)]
pub struct GasEstimator {
    reader: ChainReader,
}

impl GasEstimator {
    pub fn new(reader: ChainReader) -> Self {
        Self { reader }
    }

    /// `eth_estimateGas` for the request; the result must be a hex string
    pub async fn estimate_gas(&self, request: &GasEstimateRequest) -> ClientResult<BigUint> {
        let ctx = || format!("estimate gas from {} to {}", request.from, request.to);
        let result = self
            .reader
            .rpc()
            .call("eth_estimateGas", vec![json!(request)])
            .await
            .with_context(ctx)?;

        let gas = expect_string(&result).with_context(ctx)?;
        let gas_limit = parse_big(gas, 16, "estimated gas").with_context(ctx)?;
        debug!("Estimated gas {} for {} -> {}", gas_limit, request.from, request.to);
        Ok(gas_limit)
    }

    /// Estimated limit together with the node's current gas price
    pub async fn fee_info(&self, request: &GasEstimateRequest) -> ClientResult<TxFeeInfo> {
        let gas_limit = self.estimate_gas(request).await?;
        let gas_price = self.reader.gas_price().await?;
        Ok(TxFeeInfo::new(gas_limit, gas_price))
    }
}
