//! Basis-point arithmetic and split validation.

use crate::{DistributionSplit, Error};

/// 100% in basis points.
pub const BASIS_POINTS: u32 = 10_000;

/// Rejects rates above 100%.
pub fn check_rate(bps: u32) -> Result<u32, Error> {
    if bps > BASIS_POINTS {
        return Err(Error::OutOfRange);
    }
    Ok(bps)
}

/// `floor(amount * bps / 10000)` without forming the full product.
///
/// Writing `amount = q * 10000 + r` gives `q * bps + floor(r * bps / 10000)`:
/// the first term is bounded by `amount` and the second by `10000`, so the
/// result is exact for every non-negative `i128`.
pub fn apply_bps(amount: i128, bps: u32) -> Result<i128, Error> {
    if amount < 0 {
        return Err(Error::InvalidAmount);
    }
    let bps = check_rate(bps)? as i128;
    if amount == 0 || bps == 0 {
        return Ok(0);
    }
    let base = BASIS_POINTS as i128;
    let whole = (amount / base)
        .checked_mul(bps)
        .ok_or(Error::ArithmeticOverflow)?;
    let part = (amount % base) * bps / base;
    whole.checked_add(part).ok_or(Error::ArithmeticOverflow)
}

/// The single validator behind every percentage-pair setter. Either both
/// shares are accepted or neither is.
pub fn validated_split(treasury_share: u32, reward_share: u32) -> Result<DistributionSplit, Error> {
    let total = treasury_share
        .checked_add(reward_share)
        .ok_or(Error::InvalidSplit)?;
    if total != BASIS_POINTS {
        return Err(Error::InvalidSplit);
    }
    Ok(DistributionSplit {
        treasury_share,
        reward_share,
    })
}

/// Split a fee into `(treasury_fee, reward_fee)`. The reward side takes the
/// remainder so the two parts always add back to `fee`.
pub fn split_fee(fee: i128, split: &DistributionSplit) -> Result<(i128, i128), Error> {
    let treasury_fee = apply_bps(fee, split.treasury_share)?;
    let reward_fee = fee
        .checked_sub(treasury_fee)
        .ok_or(Error::ArithmeticOverflow)?;
    Ok((treasury_fee, reward_fee))
}
