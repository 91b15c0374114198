//! Exchange-rate arithmetic
//!
//! Derives share/asset conversions from the current reserve and total issued
//! shares. Rounding policy is always floor; the one ceiling variant
//! ([`assets_for_mint`]) exists so that charging for an exact share count
//! rounds in the pool's favor. The asymmetry blocks value extraction via
//! repeated small operations.
//!
//! Bootstrap: while no shares are issued, both directions convert 1:1.

use crate::types::Amount;
use crate::{Error, Result};

/// Shares minted for a deposit of `assets` (floor)
pub fn shares_for_deposit(assets: Amount, total_shares: Amount, reserve: Amount) -> Result<Amount> {
    if total_shares == 0 {
        return Ok(assets);
    }
    if reserve == 0 {
        // Shares outstanding against an empty reserve: accounting is broken.
        return Err(Error::InconsistentReserve(format!(
            "{} shares issued against zero reserve",
            total_shares
        )));
    }
    let scaled = assets
        .checked_mul(total_shares)
        .ok_or(Error::Overflow("share conversion"))?;
    Ok(scaled / reserve)
}

/// Assets released for `shares` (floor), the settlement direction
pub fn assets_for_shares(shares: Amount, total_shares: Amount, reserve: Amount) -> Result<Amount> {
    if total_shares == 0 {
        return Ok(shares);
    }
    let scaled = shares
        .checked_mul(reserve)
        .ok_or(Error::Overflow("asset conversion"))?;
    Ok(scaled / total_shares)
}

/// Assets charged to mint exactly `shares` (ceiling)
pub fn assets_for_mint(shares: Amount, total_shares: Amount, reserve: Amount) -> Result<Amount> {
    if total_shares == 0 {
        return Ok(shares);
    }
    let scaled = shares
        .checked_mul(reserve)
        .ok_or(Error::Overflow("mint conversion"))?;
    Ok(scaled.div_ceil(total_shares))
}
