use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

pub const ADDRESS_SIZE: usize = 32;

/// Account identifier used for every authorization check.
///
/// Externally owned accounts and the sale controller share the same space.
#[derive(Eq, PartialEq, Clone, Copy, Hash, Debug)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Address(bytes)
    }

    pub const fn zero() -> Self {
        Address([0; ADDRESS_SIZE])
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Hex with an optional `0x` prefix.
impl FromStr for Address {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; ADDRESS_SIZE];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| "Invalid address hex")?;
        Ok(Address(bytes))
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Controller address known before the controller holds anything:
/// `blake3(0xff || deployer || blake3(label))`.
pub fn compute_deterministic_contract_address(deployer: &Address, label: &[u8]) -> Address {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[0xff]);
    hasher.update(&deployer.0);
    hasher.update(blake3::hash(label).as_bytes());
    Address(*hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_address_depends_on_deployer_and_label() {
        let deployer = Address::new([1; 32]);
        let sale = compute_deterministic_contract_address(&deployer, b"sale");

        assert_eq!(sale, compute_deterministic_contract_address(&deployer, b"sale"));
        assert_ne!(sale, compute_deterministic_contract_address(&deployer, b"other"));
        assert_ne!(
            sale,
            compute_deterministic_contract_address(&Address::new([2; 32]), b"sale")
        );
        assert_ne!(sale, deployer);
    }

    #[test]
    fn test_address_hex_forms() -> Result<(), Box<dyn std::error::Error>> {
        let address = Address::new([0xab; 32]);
        assert_eq!(address.to_string().parse::<Address>()?, address);
        assert_eq!(format!("0x{}", address).parse::<Address>()?, address);

        let json = serde_json::to_string(&address)?;
        assert_eq!(serde_json::from_str::<Address>(&json)?, address);
        Ok(())
    }

    #[test]
    fn test_address_rejects_bad_input() {
        assert!("zz".parse::<Address>().is_err());
        assert!("abcd".parse::<Address>().is_err());
        assert!(serde_json::from_str::<Address>("\"abcd\"").is_err());
    }
}
