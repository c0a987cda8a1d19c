//! Transaction parameter assembly for value and token transfers

use super::gas::{GasEstimator, TxFeeInfo};
use crate::chain::ChainReader;
use crate::codec::abi::token_transfer_data;
use crate::codec::hex::{strip_0x, to_hex_prefixed};
use crate::codec::Address;
use crate::error::{ClientError, ClientResult, ResultExt};

use num_bigint::BigUint;
use serde::Serialize;
use tracing::info;

/// What the caller wants to move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferIntent {
    /// Native coin transfer
    Native {
        from: Address,
        to: Address,
        amount: BigUint,
    },
    /// `transfer(to, amount)` on a token contract
    Token {
        from: Address,
        contract: Address,
        to: Address,
        amount: BigUint,
    },
}

/// Validated transfer fields shared by estimation and submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferParams {
    pub from: Address,
    pub to: Address,
    pub value: Option<BigUint>,
    /// `0x`-prefixed call data
    pub data: Option<String>,
}

impl TransferParams {
    pub fn builder() -> TransferParamsBuilder {
        TransferParamsBuilder::default()
    }

    /// Token transfers target the contract and carry no value
    pub fn from_intent(intent: &TransferIntent) -> ClientResult<Self> {
        match intent {
            TransferIntent::Native { from, to, amount } => Ok(Self {
                from: from.clone(),
                to: to.clone(),
                value: Some(amount.clone()),
                data: None,
            }),
            TransferIntent::Token {
                from,
                contract,
                to,
                amount,
            } => {
                let data = token_transfer_data(&to.to_rpc(), amount)
                    .with_context(|| format!("token transfer data for {}", to))?;
                Ok(Self {
                    from: from.clone(),
                    to: contract.clone(),
                    value: None,
                    data: Some(data),
                })
            }
        }
    }

    /// Request body for `eth_estimateGas`
    pub fn estimate_request(&self) -> GasEstimateRequest {
        GasEstimateRequest {
            from: self.from.to_rpc(),
            to: self.to.to_rpc(),
            value: self.value.as_ref().map(to_hex_prefixed),
            data: self.data.clone(),
        }
    }

    /// Final `eth_sendTransaction` parameters
    pub fn with_fee(&self, fee: &TxFeeInfo) -> SendParams {
        SendParams {
            from: self.from.to_fm(),
            to: self.to.to_fm(),
            value: self.value.as_ref().map(to_hex_prefixed),
            gas: to_hex_prefixed(&fee.gas_limit),
            gas_price: to_hex_prefixed(&fee.gas_price),
            data: self.data.clone(),
        }
    }
}

/// Field-by-field construction of [`TransferParams`]
#[derive(Debug, Clone, Default)]
pub struct TransferParamsBuilder {
    from: Option<String>,
    to: Option<String>,
    value: Option<BigUint>,
    data: Option<String>,
}

impl TransferParamsBuilder {
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    pub fn value(mut self, value: BigUint) -> Self {
        self.value = Some(value);
        self
    }

    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn build(self) -> ClientResult<TransferParams> {
        let from = self.from.ok_or(ClientError::MissingField("from"))?;
        let to = self.to.ok_or(ClientError::MissingField("to"))?;
        let from = Address::parse(&from).context("from")?;
        let to = Address::parse(&to).context("to")?;

        let data = match self.data {
            Some(data) => {
                let body = strip_0x(&data);
                if body.len() % 2 != 0 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(ClientError::InvalidArgument(format!(
                        "call data is not hex: {}",
                        data
                    )));
                }
                Some(format!("0x{}", body))
            }
            None => None,
        };

        Ok(TransferParams {
            from,
            to,
            value: self.value,
            data,
        })
    }
}

/// Body of `eth_estimateGas`, addresses in `0x` notation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GasEstimateRequest {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Body of `eth_sendTransaction`, addresses in `FM` notation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendParams {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub gas: String,
    pub gas_price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// A transfer ready for submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTransfer {
    pub params: SendParams,
    pub fee: TxFeeInfo,
}

/// Turns transfer intents into estimated, fee-complete send parameters
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    estimator: GasEstimator,
}

impl TransactionBuilder {
    pub fn new(reader: ChainReader) -> Self {
        Self {
            estimator: GasEstimator::new(reader),
        }
    }

    pub fn estimator(&self) -> &GasEstimator {
        &self.estimator
    }

    /// Build, estimate and price a transfer. Without `gas_price` the node's
    /// current price is used.
    pub async fn prepare(
        &self,
        intent: &TransferIntent,
        gas_price: Option<BigUint>,
    ) -> ClientResult<PreparedTransfer> {
        let params = TransferParams::from_intent(intent)?;
        self.prepare_params(&params, gas_price).await
    }

    pub async fn prepare_params(
        &self,
        params: &TransferParams,
        gas_price: Option<BigUint>,
    ) -> ClientResult<PreparedTransfer> {
        let request = params.estimate_request();
        let fee = match gas_price {
            Some(price) => TxFeeInfo::new(self.estimator.estimate_gas(&request).await?, price),
            None => self.estimator.fee_info(&request).await?,
        };
        info!(
            "Prepared transfer {} -> {} (gas {}, price {}, fee {})",
            params.from,
            params.to,
            fee.gas_limit,
            fee.gas_price,
            fee.fee()
        );
        Ok(PreparedTransfer {
            params: params.with_fee(&fee),
            fee,
        })
    }
}
