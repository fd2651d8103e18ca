//! Exact integer arithmetic for pool seeding
//!
//! Ratios and human-readable amounts are `Decimal`s; on-chain amounts are `U256`.
//! A `Decimal` is multiplied into a `U256` as `value * mantissa / 10^scale`, so no
//! floating point value is ever involved. Every multiplication truncates toward zero.

use alloy::primitives::{Address, B256, U256, keccak256};
use rust_decimal::Decimal;

use super::ServiceResult;
use super::error::ServiceError;
use super::types::LiquidityAmounts;
use super::state::PoolInitializer;

/// Largest power of ten that fits into a U256 (10^77 < 2^256 < 10^78).
pub const MAX_U256_DECIMALS: u32 = 77;

/// Returns `10^exponent` as a U256.
pub fn pow10(exponent: u32) -> ServiceResult<U256> {
    if exponent > MAX_U256_DECIMALS {
        return Err(ServiceError::ArithmeticOverflow(format!(
            "10^{exponent} does not fit into 256 bits"
        )));
    }
    Ok(U256::from(10u64).pow(U256::from(exponent)))
}

/// Multiply a U256 by a non-negative Decimal, truncating the fractional part of the result.
///
/// # Arguments
/// * `value` - The integer to scale
/// * `factor` - The exact decimal factor (e.g., 2.5)
///
/// # Returns
/// `floor(value * factor)`
pub fn mul_decimal(value: U256, factor: Decimal) -> ServiceResult<U256> {
    if factor < Decimal::ZERO {
        return Err(ServiceError::InvalidAmount(format!(
            "Negative factor: {factor}"
        )));
    }

    // trailing zeros would inflate the mantissa past U256 for results that fit
    let factor = factor.normalize();
    let mantissa = U256::from(factor.mantissa().unsigned_abs());
    let product = value.checked_mul(mantissa).ok_or_else(|| {
        ServiceError::ArithmeticOverflow(format!("{value} * {factor}"))
    })?;

    Ok(product / pow10(factor.scale())?)
}

/// Compute the base and quote amounts used to seed a pool.
///
/// `base = 10^ratio_decimals`, `quote = base * midpoint_ratio`, then both are scaled by
/// `ratio_multiplier`. Each of the three multiplications truncates toward zero, so with
/// enough `ratio_decimals` to represent the ratio exactly the result is exact.
///
/// # Examples
/// - ratio 2.0, 22 decimals, multiplier 1.0 -> (10^22, 2 * 10^22)
/// - ratio 2.0, 22 decimals, multiplier 2.0 -> (2 * 10^22, 4 * 10^22)
pub fn liquidity_amounts(initializer: &PoolInitializer) -> ServiceResult<LiquidityAmounts> {
    if initializer.midpoint_ratio <= Decimal::ZERO {
        return Err(ServiceError::InvalidAmount(format!(
            "Midpoint ratio must be positive, got {}",
            initializer.midpoint_ratio
        )));
    }
    if initializer.ratio_multiplier <= Decimal::ZERO {
        return Err(ServiceError::InvalidAmount(format!(
            "Ratio multiplier must be positive, got {}",
            initializer.ratio_multiplier
        )));
    }

    let base = pow10(initializer.ratio_decimals)?;
    let quote = mul_decimal(base, initializer.midpoint_ratio)?;
    if quote.is_zero() {
        return Err(ServiceError::InvalidAmount(format!(
            "Midpoint ratio {} is below the precision of {} decimals",
            initializer.midpoint_ratio, initializer.ratio_decimals
        )));
    }

    let base = mul_decimal(base, initializer.ratio_multiplier)?;
    let quote = mul_decimal(quote, initializer.ratio_multiplier)?;
    if base.is_zero() || quote.is_zero() {
        return Err(ServiceError::InvalidAmount(format!(
            "Ratio multiplier {} scales the pool down to zero",
            initializer.ratio_multiplier
        )));
    }

    Ok(LiquidityAmounts { base, quote })
}

/// Convert a human-readable token amount to its on-chain integer representation.
///
/// # Arguments
/// * `amount` - Amount in whole tokens (e.g., 1.5)
/// * `decimals` - Number of decimal places of the token
///
/// # Examples
/// - 1 with 18 decimals -> 1000000000000000000
/// - 1.0 with 20 decimals -> 100000000000000000000
///
/// # Returns
/// `amount * 10^decimals`, or an error if the amount is negative or finer than the
/// token's precision
pub fn human_token_amount(amount: Decimal, decimals: u8) -> ServiceResult<U256> {
    if amount < Decimal::ZERO {
        return Err(ServiceError::InvalidAmount(format!(
            "Negative token amount: {amount}"
        )));
    }

    let amount = amount.normalize();
    let mantissa = U256::from(amount.mantissa().unsigned_abs());
    let scaled = mantissa
        .checked_mul(pow10(decimals as u32)?)
        .ok_or_else(|| ServiceError::ArithmeticOverflow(format!("{amount} * 10^{decimals}")))?;

    let divisor = pow10(amount.scale())?;
    if !(scaled % divisor).is_zero() {
        return Err(ServiceError::InvalidAmount(format!(
            "{amount} has more than {decimals} decimal places"
        )));
    }

    Ok(scaled / divisor)
}

/// Absolute deadline `seconds` from now, evaluated at call time.
pub fn relative_deadline(seconds: u64) -> U256 {
    let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default();
    U256::from(now.saturating_add(seconds))
}

/// Order two token addresses the way a Uniswap V2 pair stores them.
pub fn sort_tokens(token_a: Address, token_b: Address) -> (Address, Address) {
    if token_a < token_b {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    }
}

/// Address a Uniswap V2 factory assigns to the pair of two tokens.
///
/// CREATE2 with salt `keccak256(token0 ++ token1)` and the pair's init code hash; this
/// is the same derivation the router performs for every liquidity and swap call.
pub fn pair_address(
    factory: Address,
    token_a: Address,
    token_b: Address,
    init_code_hash: B256,
) -> Address {
    let (token0, token1) = sort_tokens(token_a, token_b);

    let mut packed = [0u8; 40];
    packed[..20].copy_from_slice(token0.as_slice());
    packed[20..].copy_from_slice(token1.as_slice());
    let salt = keccak256(packed);

    factory.create2(salt.0, init_code_hash.0)
}

/// Format balance from smallest unit to human-readable format
///
/// # Arguments
/// * `balance` - Balance in smallest unit
/// * `decimals` - Number of decimal places for the token
///
/// # Returns
/// Formatted balance as string with trailing zeros removed
pub fn format_balance(balance: U256, decimals: u8) -> String {
    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = balance / divisor;
    let remainder = balance % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_part = remainder.to_string();
        let padded = format!("{:0>width$}", decimal_part, width = decimals as usize);
        let trimmed = padded.trim_end_matches('0');
        format!("{whole}.{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn initializer(ratio: &str, decimals: u32, multiplier: &str) -> PoolInitializer {
        PoolInitializer {
            midpoint_ratio: dec(ratio),
            ratio_decimals: decimals,
            ratio_multiplier: dec(multiplier),
        }
    }

    #[test]
    fn test_liquidity_amounts_default_pool_should_work() {
        let amounts = liquidity_amounts(&PoolInitializer::default()).unwrap();

        assert_eq!(amounts.base, U256::from_str("10000000000000000000000").unwrap());
        assert_eq!(amounts.quote, U256::from_str("20000000000000000000000").unwrap());
    }

    #[test]
    fn test_doubling_multiplier_doubles_both_amounts() {
        for ratio in ["2.0", "0.5", "1234.5678", "3"] {
            let single = liquidity_amounts(&initializer(ratio, 18, "1.0")).unwrap();
            let double = liquidity_amounts(&initializer(ratio, 18, "2.0")).unwrap();

            assert_eq!(double.base, single.base * U256::from(2));
            assert_eq!(double.quote, single.quote * U256::from(2));
            // ratio unchanged: quote1 * base2 == quote2 * base1
            assert_eq!(single.quote * double.base, double.quote * single.base);
        }
    }

    #[test]
    fn test_ratio_error_is_bounded_by_precision() {
        // 1/3 cannot be represented exactly; the truncation error must stay below 10^-d
        let ratio = dec("0.3333333333333333333333333333");
        for decimals in [0u32, 6, 18, 22] {
            let init = PoolInitializer {
                midpoint_ratio: ratio,
                ratio_decimals: decimals,
                ratio_multiplier: Decimal::ONE,
            };
            let Ok(amounts) = liquidity_amounts(&init) else {
                // with 0 decimals the quote truncates to zero and is rejected
                assert_eq!(decimals, 0);
                continue;
            };

            // |ratio * base - quote| < 1, i.e. |ratio - quote/base| < 1/base = 10^-d
            let exact_scaled = amounts.base * U256::from(ratio.mantissa() as u128);
            let quote_scaled = amounts.quote * pow10(ratio.scale()).unwrap();
            assert!(exact_scaled >= quote_scaled);
            assert!(exact_scaled - quote_scaled < pow10(ratio.scale()).unwrap());
        }
    }

    #[test]
    fn test_fractional_multiplier_truncates_each_side() {
        // base 10, quote 25 (ratio 2.5 at 1 decimal), multiplier 0.33
        let amounts = liquidity_amounts(&initializer("2.5", 1, "0.33")).unwrap();

        assert_eq!(amounts.base, U256::from(3u64)); // floor(10 * 0.33) = floor(3.3)
        assert_eq!(amounts.quote, U256::from(8u64)); // floor(25 * 0.33) = floor(8.25)
    }

    #[test]
    fn test_liquidity_amounts_rejects_invalid_initializers() {
        assert!(matches!(
            liquidity_amounts(&initializer("0", 18, "1")),
            Err(ServiceError::InvalidAmount(_))
        ));
        assert!(matches!(
            liquidity_amounts(&initializer("-2", 18, "1")),
            Err(ServiceError::InvalidAmount(_))
        ));
        assert!(matches!(
            liquidity_amounts(&initializer("2", 18, "0")),
            Err(ServiceError::InvalidAmount(_))
        ));
        assert!(matches!(
            liquidity_amounts(&initializer("2", 78, "1")),
            Err(ServiceError::ArithmeticOverflow(_))
        ));
        assert!(matches!(
            liquidity_amounts(&initializer("0.001", 2, "1")),
            Err(ServiceError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_human_token_amount_should_work() {
        assert_eq!(
            human_token_amount(Decimal::ONE, 18).unwrap(),
            U256::from_str("1000000000000000000").unwrap()
        );
        assert_eq!(
            human_token_amount(dec("1.0"), 20).unwrap(),
            U256::from_str("100000000000000000000").unwrap()
        );
        assert_eq!(
            human_token_amount(dec("100.5"), 6).unwrap(),
            U256::from(100500000u64)
        );
        assert_eq!(human_token_amount(dec("42"), 0).unwrap(), U256::from(42u64));
    }

    #[test]
    fn test_human_token_amount_round_trips_integers() {
        for amount in [0u64, 1, 7, 10000, 123456789] {
            for decimals in [0u8, 6, 18, 20] {
                let raw = human_token_amount(Decimal::from(amount), decimals).unwrap();
                assert_eq!(raw / pow10(decimals as u32).unwrap(), U256::from(amount));
                assert!((raw % pow10(decimals as u32).unwrap()).is_zero());
            }
        }
    }

    #[test]
    fn test_human_token_amount_rejects_invalid_amounts() {
        assert!(matches!(
            human_token_amount(dec("-1"), 18),
            Err(ServiceError::InvalidAmount(_))
        ));
        assert!(matches!(
            human_token_amount(dec("0.0000001"), 6),
            Err(ServiceError::InvalidAmount(_))
        ));
        assert!(matches!(
            human_token_amount(Decimal::ONE, 78),
            Err(ServiceError::ArithmeticOverflow(_))
        ));
    }

    #[test]
    fn test_trailing_zeros_do_not_overflow() {
        let amount = human_token_amount(dec("1.0000000000000000000000000000"), 60).unwrap();
        assert_eq!(amount, pow10(60).unwrap());
        assert_eq!(amount, human_token_amount(Decimal::ONE, 60).unwrap());

        let amounts =
            liquidity_amounts(&initializer("2.0000000000000000000", 60, "1.000000")).unwrap();
        assert_eq!(amounts.base, pow10(60).unwrap());
        assert_eq!(amounts.quote, pow10(60).unwrap() * U256::from(2));
        assert_eq!(
            amounts,
            liquidity_amounts(&initializer("2", 60, "1")).unwrap()
        );
    }

    #[test]
    fn test_relative_deadline_is_evaluated_at_call_time() {
        let before = chrono::Utc::now().timestamp() as u64;
        let deadline = relative_deadline(60);
        let after = chrono::Utc::now().timestamp() as u64;

        assert!(deadline >= U256::from(before + 60));
        assert!(deadline <= U256::from(after + 60));
    }

    #[test]
    fn test_pair_address_matches_mainnet_usdc_weth() {
        let factory = Address::from_str("0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f").unwrap();
        let usdc = Address::from_str("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").unwrap();
        let weth = Address::from_str("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2").unwrap();
        let init_code_hash =
            B256::from_str("0x96e8ac4277198ff8b6f785478aa9a39f403cb768dd02cbee326c3e7da348845f")
                .unwrap();
        let expected = Address::from_str("0xB4e16d0168e52d35CaCD2c6185b44281Ec28C9Dc").unwrap();

        assert_eq!(pair_address(factory, usdc, weth, init_code_hash), expected);
        // argument order does not matter
        assert_eq!(pair_address(factory, weth, usdc, init_code_hash), expected);
    }

    #[test]
    fn test_format_balance_should_work() {
        let wei = U256::from_str("1500000000000000000").unwrap();
        assert_eq!(format_balance(wei, 18), "1.5");
        assert_eq!(format_balance(U256::from(100500000u64), 6), "100.5");
        assert_eq!(
            format_balance(U256::from_str("1000000000000000000").unwrap(), 18),
            "1"
        );
    }
}
