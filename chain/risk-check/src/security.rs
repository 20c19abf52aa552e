//! Account constraint checks shared by the instruction handlers
//!
//! Every handler that touches an existing record runs both checks: the
//! signer must be the record's authority, and the record must live at the
//! address its own seeds derive to.

use types::ids::{Address, Authority};

use crate::address::risk_params_address_with_bump;
use crate::errors::RiskCheckError;
use crate::state::RiskParamsAccount;

/// Require the signer to be the record's authority.
pub fn require_authority(
    record: &RiskParamsAccount,
    signer: &Authority,
) -> Result<(), RiskCheckError> {
    if record.authority != *signer {
        return Err(RiskCheckError::Unauthorized);
    }
    Ok(())
}

/// Require `address` to match the record's seeds and stored bump.
pub fn require_seeds(
    program_id: &Address,
    address: &Address,
    record: &RiskParamsAccount,
) -> Result<(), RiskCheckError> {
    let expected = risk_params_address_with_bump(
        program_id,
        record.market_index,
        &record.authority,
        record.bump,
    )?;
    if expected != *address {
        return Err(RiskCheckError::invalid_argument(format!(
            "seeds constraint violated: expected {expected}, got {address}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::derive_risk_params_address;
    use types::ids::MarketIndex;

    fn program_id() -> Address {
        Address::new([2u8; 32])
    }

    fn record_at(authority: Authority, market: MarketIndex) -> (Address, RiskParamsAccount) {
        let (address, bump) = derive_risk_params_address(&program_id(), market, &authority).unwrap();
        (address, RiskParamsAccount::new(authority, market, bump))
    }

    #[test]
    fn test_authority_accepted() {
        let owner = Authority::new();
        let (_, record) = record_at(owner, MarketIndex::new(1));
        assert!(require_authority(&record, &owner).is_ok());
    }

    #[test]
    fn test_other_signer_rejected() {
        let (_, record) = record_at(Authority::new(), MarketIndex::new(1));
        assert_eq!(
            require_authority(&record, &Authority::new()),
            Err(RiskCheckError::Unauthorized)
        );
    }

    #[test]
    fn test_seeds_match() {
        let (address, record) = record_at(Authority::new(), MarketIndex::new(4));
        assert!(require_seeds(&program_id(), &address, &record).is_ok());
    }

    #[test]
    fn test_seeds_mismatch() {
        let (_, record) = record_at(Authority::new(), MarketIndex::new(4));
        let result = require_seeds(&program_id(), &Address::new([0u8; 32]), &record);
        assert!(matches!(result, Err(RiskCheckError::InvalidArgument { .. })));
    }
}
