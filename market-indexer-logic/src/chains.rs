use alloy::primitives::{Address, U256};
use anyhow::Context;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::serde_as;
use std::{collections::HashMap, path::Path, str::FromStr, time::Duration};
use thiserror::Error;

/// Claim window applied to every district without an explicit override.
pub const DEFAULT_CLAIM_WINDOW: Duration = Duration::from_secs(1800);

const TRON_ADDRESS_PREFIX: u8 = 0x41;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainConfigError {
    #[error("district {0} is configured more than once")]
    DuplicateDistrict(i32),
    #[error("chain '{0}' is configured more than once")]
    DuplicateName(String),
    #[error("invalid address '{0}'")]
    InvalidAddress(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractName {
    LandSale,
    LandLease,
    CreatureSale,
    CreatureBreeding,
    CreatureLease,
    Land,
    Creature,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressFormat {
    #[default]
    Hex,
    Tron,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    pub name: String,
    pub district: i32,
    #[serde(default)]
    pub address_format: AddressFormat,
    pub rpc_url: String,
    #[serde(default)]
    pub start_block: u64,
    /// Overrides [`DEFAULT_CLAIM_WINDOW`]; meant for non-production districts.
    #[serde(default)]
    #[serde_as(as = "Option<serde_with::DurationSeconds<u64>>")]
    pub claim_window: Option<Duration>,
    #[serde(default = "default_sale_fee_rate")]
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub sale_fee_rate: BigDecimal,
    #[serde(deserialize_with = "deserialize_contracts")]
    pub contracts: HashMap<ContractName, Address>,
}

fn default_sale_fee_rate() -> BigDecimal {
    BigDecimal::new(4.into(), 2)
}

fn deserialize_contracts<'de, D>(deserializer: D) -> Result<HashMap<ContractName, Address>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: HashMap<ContractName, String> = Deserialize::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(name, address)| {
            parse_address(&address)
                .map(|address| (name, address))
                .map_err(serde::de::Error::custom)
        })
        .collect()
}

/// Parses either a hex address or a base58check Tron address.
pub fn parse_address(value: &str) -> Result<Address, ChainConfigError> {
    let invalid = || ChainConfigError::InvalidAddress(value.to_string());
    if value.starts_with('T') {
        let bytes = bs58::decode(value)
            .with_check(Some(TRON_ADDRESS_PREFIX))
            .into_vec()
            .map_err(|_| invalid())?;
        return match bytes.split_first() {
            Some((_, address)) if address.len() == 20 => Ok(Address::from_slice(address)),
            _ => Err(invalid()),
        };
    }
    Address::from_str(value).map_err(|_| invalid())
}

impl ChainConfig {
    pub fn contract(&self, name: ContractName) -> Option<Address> {
        self.contracts.get(&name).copied()
    }

    pub fn claim_window(&self) -> Duration {
        self.claim_window.unwrap_or(DEFAULT_CLAIM_WINDOW)
    }

    /// Renders an address the way the chain presents it to users.
    pub fn format_address(&self, address: Address) -> String {
        match self.address_format {
            AddressFormat::Hex => format!("0x{}", hex::encode(address)),
            AddressFormat::Tron => {
                let mut payload = Vec::with_capacity(21);
                payload.push(TRON_ADDRESS_PREFIX);
                payload.extend_from_slice(address.as_slice());
                bs58::encode(payload).with_check().into_string()
            }
        }
    }

    /// Finds which marketplace contract of this chain emitted a log.
    pub fn contract_name(&self, address: Address) -> Option<ContractName> {
        self.contracts
            .iter()
            .find_map(|(name, contract)| (*contract == address).then_some(*name))
    }
}

/// Token ids are kept as 32-byte hex strings on every chain.
pub fn format_token_id(token_id: U256) -> String {
    format!("0x{}", hex::encode(token_id.to_be_bytes::<32>()))
}

/// Immutable table of every configured chain, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct ChainContext {
    chains: Vec<ChainConfig>,
    by_district: HashMap<i32, usize>,
    by_name: HashMap<String, usize>,
}

impl ChainContext {
    pub fn new(chains: Vec<ChainConfig>) -> Result<Self, ChainConfigError> {
        let mut by_district = HashMap::new();
        let mut by_name = HashMap::new();
        for (index, chain) in chains.iter().enumerate() {
            if by_district.insert(chain.district, index).is_some() {
                return Err(ChainConfigError::DuplicateDistrict(chain.district));
            }
            if by_name.insert(chain.name.to_lowercase(), index).is_some() {
                return Err(ChainConfigError::DuplicateName(chain.name.clone()));
            }
        }
        Ok(Self {
            chains,
            by_district,
            by_name,
        })
    }

    /// Load and deserialize the chain table from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read chains config file: {:?}", path.as_ref()))?;
        let chains: Vec<ChainConfig> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse chains config JSON: {:?}", path.as_ref()))?;
        Ok(Self::new(chains)?)
    }

    pub fn chains(&self) -> impl Iterator<Item = &ChainConfig> {
        self.chains.iter()
    }

    pub fn chain(&self, district: i32) -> Option<&ChainConfig> {
        self.by_district
            .get(&district)
            .map(|index| &self.chains[*index])
    }

    pub fn chain_by_name(&self, chain: &str) -> Option<&ChainConfig> {
        self.by_name
            .get(&chain.to_lowercase())
            .map(|index| &self.chains[*index])
    }

    pub fn district(&self, chain: &str) -> Option<i32> {
        self.chain_by_name(chain).map(|chain| chain.district)
    }

    pub fn contract_address(&self, name: ContractName, chain: &str) -> Option<Address> {
        self.chain_by_name(chain)?.contract(name)
    }

    pub fn claim_window(&self, district: i32) -> Duration {
        self.chain(district)
            .map(ChainConfig::claim_window)
            .unwrap_or(DEFAULT_CLAIM_WINDOW)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloy::primitives::address;
    use pretty_assertions::assert_eq;

    pub(crate) const LAND_SALE: Address = address!("0x0000000000000000000000000000000000001001");
    pub(crate) const LAND_LEASE: Address = address!("0x0000000000000000000000000000000000001002");
    pub(crate) const CREATURE_SALE: Address =
        address!("0x0000000000000000000000000000000000001003");
    pub(crate) const CREATURE_BREEDING: Address =
        address!("0x0000000000000000000000000000000000001004");
    pub(crate) const CREATURE_LEASE: Address =
        address!("0x0000000000000000000000000000000000001005");

    pub(crate) fn eth_chain() -> ChainConfig {
        ChainConfig {
            name: "Eth".to_string(),
            district: 1,
            address_format: AddressFormat::Hex,
            rpc_url: "http://localhost:8545".to_string(),
            start_block: 0,
            claim_window: None,
            sale_fee_rate: default_sale_fee_rate(),
            contracts: HashMap::from([
                (ContractName::LandSale, LAND_SALE),
                (ContractName::LandLease, LAND_LEASE),
                (ContractName::CreatureSale, CREATURE_SALE),
                (ContractName::CreatureBreeding, CREATURE_BREEDING),
                (ContractName::CreatureLease, CREATURE_LEASE),
            ]),
        }
    }

    pub(crate) fn test_context() -> ChainContext {
        let tron = ChainConfig {
            name: "Tron".to_string(),
            district: 2,
            address_format: AddressFormat::Tron,
            contracts: HashMap::from([(ContractName::LandSale, LAND_SALE)]),
            ..eth_chain()
        };
        let crab = ChainConfig {
            name: "Crab".to_string(),
            district: 3,
            claim_window: Some(Duration::from_secs(300)),
            ..eth_chain()
        };
        ChainContext::new(vec![eth_chain(), tron, crab]).unwrap()
    }

    #[test]
    fn lookups_by_name_and_district() {
        let context = test_context();

        assert_eq!(context.district("eth"), Some(1));
        assert_eq!(context.district("TRON"), Some(2));
        assert_eq!(context.district("heco"), None);
        assert_eq!(
            context.contract_address(ContractName::LandSale, "Eth"),
            Some(LAND_SALE)
        );
        assert_eq!(context.contract_address(ContractName::LandLease, "Tron"), None);
        assert_eq!(
            context.chain(1).unwrap().contract_name(CREATURE_LEASE),
            Some(ContractName::CreatureLease)
        );
    }

    #[test]
    fn claim_window_has_single_default() {
        let context = test_context();

        assert_eq!(context.claim_window(1), Duration::from_secs(1800));
        assert_eq!(context.claim_window(3), Duration::from_secs(300));
        assert_eq!(context.claim_window(42), DEFAULT_CLAIM_WINDOW);
    }

    #[test]
    fn addresses_follow_chain_convention() {
        let context = test_context();
        let account = address!("0x85D1F3CA73A4B2D6A7D7A3DC7E2C3BF96C1E3A01");

        assert_eq!(
            context.chain(1).unwrap().format_address(account),
            "0x85d1f3ca73a4b2d6a7d7a3dc7e2c3bf96c1e3a01"
        );

        let tron_address = context.chain(2).unwrap().format_address(account);
        assert!(tron_address.starts_with('T'));
        assert_eq!(parse_address(&tron_address).unwrap(), account);
    }

    #[test]
    fn token_ids_are_padded() {
        assert_eq!(
            format_token_id(U256::from(0x2a)),
            "0x000000000000000000000000000000000000000000000000000000000000002a"
        );
    }

    #[test]
    fn duplicate_districts_are_rejected() {
        let result = ChainContext::new(vec![
            eth_chain(),
            ChainConfig {
                name: "Other".to_string(),
                ..eth_chain()
            },
        ]);
        assert_eq!(result.unwrap_err(), ChainConfigError::DuplicateDistrict(1));
    }

    #[test]
    fn deserializes_chain_table() {
        let raw = r#"[{
            "name": "Crab",
            "district": 3,
            "rpc_url": "http://crab.local",
            "claim_window": 300,
            "sale_fee_rate": "0.035",
            "contracts": {
                "land_sale": "0x0000000000000000000000000000000000001001"
            }
        }]"#;
        let chains: Vec<ChainConfig> = serde_json::from_str(raw).unwrap();

        assert_eq!(chains[0].address_format, AddressFormat::Hex);
        assert_eq!(chains[0].claim_window(), Duration::from_secs(300));
        assert_eq!(chains[0].sale_fee_rate, BigDecimal::from_str("0.035").unwrap());
        assert_eq!(chains[0].contract(ContractName::LandSale), Some(LAND_SALE));
    }
}
