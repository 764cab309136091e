//! Decoding of raw event logs into positional fields.
//!
//! A log is flattened into the list of its indexed topics (without the
//! signature topic) followed by the 32-byte words of its data section. The
//! decoder knows nothing about event arities: callers index the fields of the
//! events they dispatch to and get a [`DecodeError`] when a field is missing
//! or has a shape incompatible with the requested type.

use alloy::{
    primitives::{Address, Bytes, B256, U256},
    rpc::types::Log,
};
use thiserror::Error;

pub const WORD_SIZE: usize = 32;

/// Number of zero bytes padding an address to a full word.
const ADDRESS_PADDING: usize = WORD_SIZE - 20;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("log has no signature topic")]
    MissingSignature,
    #[error("invalid hex data: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("data length {0} is not a multiple of {WORD_SIZE} bytes")]
    UnalignedData(usize),
    #[error("field {index} requested, but log carries {available} fields")]
    MissingField { index: usize, available: usize },
    #[error("field {index} is not an address: padding bytes are not zero")]
    NotAnAddress { index: usize },
    #[error("field {index} does not fit into {target}")]
    Overflow { index: usize, target: &'static str },
    #[error("log index {0} does not fit into i32")]
    LogIndexOverflow(u64),
}

/// Chain-agnostic shape of a log, as delivered by a receipt or a log filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub log_index: u64,
}

impl RawLog {
    /// Builds a log from a hex encoded data section (with or without `0x`).
    pub fn from_hex_data(
        address: Address,
        topics: Vec<B256>,
        data: &str,
        log_index: u64,
    ) -> Result<Self, DecodeError> {
        let data = hex::decode(data.trim_start_matches("0x"))?;
        Ok(Self {
            address,
            topics,
            data: data.into(),
            log_index,
        })
    }

    pub fn signature(&self) -> Option<B256> {
        self.topics.first().copied()
    }
}

impl From<&Log> for RawLog {
    fn from(log: &Log) -> Self {
        Self {
            address: log.address(),
            topics: log.topics().to_vec(),
            data: log.data().data.clone(),
            log_index: log.log_index.unwrap_or_default(),
        }
    }
}

/// A single 32-byte field of a decoded log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word(B256);

impl Word {
    pub fn as_uint(&self) -> U256 {
        U256::from_be_bytes(self.0 .0)
    }

    /// Low 20 bytes of the word, if the upper 12 bytes are zero padding.
    pub fn as_address(&self) -> Option<Address> {
        let (padding, address) = self.0.as_slice().split_at(ADDRESS_PADDING);
        padding
            .iter()
            .all(|byte| *byte == 0)
            .then(|| Address::from_slice(address))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLog {
    pub address: Address,
    pub signature: B256,
    pub log_index: u64,
    fields: Vec<Word>,
}

impl DecodedLog {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn word(&self, index: usize) -> Result<Word, DecodeError> {
        self.fields
            .get(index)
            .copied()
            .ok_or(DecodeError::MissingField {
                index,
                available: self.fields.len(),
            })
    }

    pub fn uint(&self, index: usize) -> Result<U256, DecodeError> {
        self.word(index).map(|word| word.as_uint())
    }

    pub fn address(&self, index: usize) -> Result<Address, DecodeError> {
        self.word(index)?
            .as_address()
            .ok_or(DecodeError::NotAnAddress { index })
    }

    pub fn u64(&self, index: usize) -> Result<u64, DecodeError> {
        self.uint(index)?
            .try_into()
            .map_err(|_| DecodeError::Overflow {
                index,
                target: "u64",
            })
    }
}

pub fn decode_log(log: &RawLog) -> Result<DecodedLog, DecodeError> {
    let (signature, indexed) = log
        .topics
        .split_first()
        .ok_or(DecodeError::MissingSignature)?;

    if log.data.len() % WORD_SIZE != 0 {
        return Err(DecodeError::UnalignedData(log.data.len()));
    }

    let fields = indexed
        .iter()
        .copied()
        .chain(log.data.chunks_exact(WORD_SIZE).map(B256::from_slice))
        .map(Word)
        .collect();

    Ok(DecodedLog {
        address: log.address,
        signature: *signature,
        log_index: log.log_index,
        fields,
    })
}
