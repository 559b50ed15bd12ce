//! Client-side card checks run before any card data leaves the process.
//!
//! Checks run in a fixed order (number, expiry, CVX) and stop at the first
//! failure, so callers always see the earliest problem.

use crate::domain::model::{CardData, CardType};
use crate::utils::error::ValidationError;
use chrono::{Datelike, Local, NaiveDate};

/// Validates card data against today's local date.
pub fn validate(card: &CardData) -> Result<(), ValidationError> {
    validate_at(card, Local::now().date_naive())
}

pub fn validate_at(card: &CardData, today: NaiveDate) -> Result<(), ValidationError> {
    validate_card_number(&card.number)?;
    validate_expiration_date(&card.expiration_date, today)?;
    validate_cvx(&card.cvx, &card.card_type)?;
    Ok(())
}

pub fn validate_card_number(number: &str) -> Result<(), ValidationError> {
    let number = number.trim();
    if !is_numeric(number) || !luhn_valid(number) {
        return Err(ValidationError::CardNumberFormat);
    }
    Ok(())
}

/// Expiry in MMYY form; a card expiring this month is still valid.
pub fn validate_expiration_date(expiry: &str, today: NaiveDate) -> Result<(), ValidationError> {
    let expiry = expiry.trim();
    if expiry.len() != 4 || !is_numeric(expiry) {
        return Err(ValidationError::ExpiryDateFormat);
    }

    let month: u32 = expiry[..2]
        .parse()
        .map_err(|_| ValidationError::ExpiryDateFormat)?;
    let year: i32 = expiry[2..]
        .parse::<i32>()
        .map_err(|_| ValidationError::ExpiryDateFormat)?
        + 2000;

    if !(1..=12).contains(&month) {
        return Err(ValidationError::ExpiryDateFormat);
    }

    if year > today.year() || (year == today.year() && month >= today.month()) {
        Ok(())
    } else {
        Err(ValidationError::PastExpiryDate)
    }
}

pub fn validate_cvx(cvx: &str, card_type: &CardType) -> Result<(), ValidationError> {
    if card_type.skips_cvx() {
        return Ok(());
    }

    let cvx = cvx.trim();
    if !is_numeric(cvx) {
        return Err(ValidationError::CvvFormat);
    }

    let valid_length = match card_type {
        CardType::Amex => cvx.len() == 3 || cvx.len() == 4,
        CardType::CbVisaMastercard => cvx.len() == 3,
        _ => false,
    };

    if valid_length {
        Ok(())
    } else {
        Err(ValidationError::CvvFormat)
    }
}

/// Luhn mod-10 check over a string of ASCII digits.
///
/// Non-digit characters make the check fail.
pub fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0u32;
    for (position, c) in digits.chars().rev().enumerate() {
        let Some(mut digit) = c.to_digit(10) else {
            return false;
        };
        if position % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}

fn is_numeric(input: &str) -> bool {
    !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit())
}
