//! Deterministic record addresses
//!
//! A risk record lives at `sha256(seeds ‖ bump ‖ program_id ‖ marker)`,
//! searching bumps from 255 downward for the first hash that is not a valid
//! Ed25519 point. Off-curve addresses have no private key, so only the
//! program can ever own them. No registry is kept: the address is simply
//! recomputed from `(market_index, authority)`.

use ed25519_dalek::VerifyingKey;
use sha2::{Digest, Sha256};
use types::ids::{Address, Authority, MarketIndex};

use crate::errors::RiskCheckError;

/// Seed literal shared by the program and the client.
pub const RISK_PARAMS_ACCOUNT_SEED_PHRASE: &[u8; 10] = b"risk-check";

/// Domain separator appended to every derivation hash.
const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Maximum length of a single seed.
pub const MAX_SEED_LEN: usize = 32;

/// Hash seeds + bump into an address, failing if it lands on the curve.
pub fn create_program_address(
    seeds: &[&[u8]],
    program_id: &Address,
) -> Result<Address, RiskCheckError> {
    if let Some(seed) = seeds.iter().find(|s| s.len() > MAX_SEED_LEN) {
        return Err(RiskCheckError::invalid_argument(format!(
            "seed of {} bytes exceeds {MAX_SEED_LEN}",
            seed.len()
        )));
    }

    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(program_id.as_bytes());
    hasher.update(PDA_MARKER);
    let hash: [u8; 32] = hasher.finalize().into();

    if is_on_curve(&hash) {
        return Err(RiskCheckError::invalid_argument(
            "seeds produce an on-curve address",
        ));
    }
    Ok(Address::new(hash))
}

/// Find the canonical (highest) bump whose address is off-curve.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &Address,
) -> Result<(Address, u8), RiskCheckError> {
    for bump in (0..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut with_bump: Vec<&[u8]> = seeds.to_vec();
        with_bump.push(&bump_seed);
        match create_program_address(&with_bump, program_id) {
            Ok(address) => return Ok((address, bump)),
            Err(RiskCheckError::InvalidArgument { .. }) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(RiskCheckError::invalid_argument(
        "no viable bump seed for address",
    ))
}

/// Address and bump of the risk record for `(market_index, authority)`.
pub fn derive_risk_params_address(
    program_id: &Address,
    market_index: MarketIndex,
    authority: &Authority,
) -> Result<(Address, u8), RiskCheckError> {
    let market_seed = market_index.to_seed();
    find_program_address(
        &[
            RISK_PARAMS_ACCOUNT_SEED_PHRASE,
            &market_seed,
            authority.as_bytes(),
        ],
        program_id,
    )
}

/// Recompute a record address from its stored bump.
pub fn risk_params_address_with_bump(
    program_id: &Address,
    market_index: MarketIndex,
    authority: &Authority,
    bump: u8,
) -> Result<Address, RiskCheckError> {
    create_program_address(
        &[
            RISK_PARAMS_ACCOUNT_SEED_PHRASE,
            &market_index.to_seed(),
            authority.as_bytes(),
            &[bump],
        ],
        program_id,
    )
}

fn is_on_curve(bytes: &[u8; 32]) -> bool {
    VerifyingKey::from_bytes(bytes).is_ok()
}
