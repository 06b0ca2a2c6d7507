use anchor_lang::prelude::*;

use crate::errors::VaultError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

/// Computes `a * b / c` without losing precision when `a * b` overflows u128.
///
/// floor(a * b / c) = (a / c) * b + floor((a % c) * b / c), which only needs
/// `(a % c) * b` to fit, i.e. `c * b` must fit in u128.
pub fn mul_div(a: u128, b: u128, c: u128, rounding: Rounding) -> Result<u128> {
    require!(c != 0, VaultError::DivisionByZero);

    let (quotient, remainder) = match a.checked_mul(b) {
        Some(product) => (product / c, product % c),
        None => {
            let high = (a / c)
                .checked_mul(b)
                .ok_or(error!(VaultError::MathOverflow))?;
            let low = (a % c)
                .checked_mul(b)
                .ok_or(error!(VaultError::MathOverflow))?;
            let quotient = high
                .checked_add(low / c)
                .ok_or(error!(VaultError::MathOverflow))?;
            (quotient, low % c)
        }
    };

    match rounding {
        Rounding::Up if remainder > 0 => quotient
            .checked_add(1)
            .ok_or(error!(VaultError::MathOverflow)),
        _ => Ok(quotient),
    }
}

/// Narrows a u128 intermediate back to a token amount
pub fn to_u64(value: u128) -> Result<u64> {
    u64::try_from(value).map_err(|_| error!(VaultError::MathOverflow))
}

pub fn checked_add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or(error!(VaultError::MathOverflow))
}

pub fn checked_sub(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b)
        .ok_or(error!(VaultError::ArithmeticUnderflow))
}
