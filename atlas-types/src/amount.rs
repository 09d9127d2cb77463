use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const TOKEN_DECIMALS: u32 = 18;
pub const WEI_PER_TOKEN: u128 = 1_000_000_000_000_000_000;

/// Three decimal places of percentage precision.
pub const PERCENT_DECIMALS: u32 = 3;
pub const THOUSANDTHS_PER_PERCENT: u32 = 1_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount must not be negative")]
    Negative,
    #[error("`{0}` is not a decimal number")]
    Invalid(String),
    #[error("at most {0} decimal places are supported")]
    TooPrecise(u32),
    #[error("amount is too large")]
    Overflow,
}

/// Parses a plain decimal string into an integer scaled by `10^decimals`.
fn parse_scaled(raw: &str, decimals: u32) -> Result<u128, ParseAmountError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(ParseAmountError::Empty);
    }
    if s.starts_with('-') {
        return Err(ParseAmountError::Negative);
    }
    let s = s.strip_prefix('+').unwrap_or(s);

    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(ParseAmountError::Invalid(raw.to_string()));
    }
    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) {
        return Err(ParseAmountError::Invalid(raw.to_string()));
    }
    if frac_part.len() > decimals as usize {
        return Err(ParseAmountError::TooPrecise(decimals));
    }

    let scale = 10u128.pow(decimals);
    let whole: u128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| ParseAmountError::Overflow)?
    };
    let mut fraction: u128 = 0;
    if !frac_part.is_empty() {
        let padding = decimals - frac_part.len() as u32;
        fraction = frac_part
            .parse::<u128>()
            .map_err(|_| ParseAmountError::Invalid(raw.to_string()))?
            * 10u128.pow(padding);
    }

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction))
        .ok_or(ParseAmountError::Overflow)
}

/// Fixed-point token amount with 18 decimals, stored in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(0);

    pub const fn from_wei(wei: u128) -> Self {
        TokenAmount(wei)
    }

    pub fn from_tokens(tokens: u64) -> Self {
        TokenAmount(tokens as u128 * WEI_PER_TOKEN)
    }

    pub const fn wei(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_add(other.0).map(TokenAmount)
    }

    pub fn checked_sub(self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_sub(other.0).map(TokenAmount)
    }

    pub fn saturating_sub(self, other: TokenAmount) -> TokenAmount {
        TokenAmount(self.0.saturating_sub(other.0))
    }

    /// Price of `count` units at `self` per unit.
    pub fn checked_mul_count(self, count: u64) -> Option<TokenAmount> {
        self.0.checked_mul(count as u128).map(TokenAmount)
    }

    /// `self * bps / 10_000`, truncated.
    pub fn checked_bps(self, bps: u16) -> Option<TokenAmount> {
        self.0
            .checked_mul(bps as u128)
            .map(|scaled| TokenAmount(scaled / 10_000))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / WEI_PER_TOKEN;
        let fraction = self.0 % WEI_PER_TOKEN;
        if fraction == 0 {
            return write!(f, "{whole}.0");
        }
        let digits = format!("{:0width$}", fraction, width = TOKEN_DECIMALS as usize);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl FromStr for TokenAmount {
    type Err = ParseAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_scaled(s, TOKEN_DECIMALS).map(TokenAmount)
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Ownership percentage with exactly three decimal places, stored in
/// thousandths of a percent (`100_000` is 100%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percentage(u32);

impl Percentage {
    pub const ZERO: Percentage = Percentage(0);
    pub const HUNDRED: Percentage = Percentage(100 * THOUSANDTHS_PER_PERCENT);

    pub const fn from_thousandths(thousandths: u32) -> Self {
        Percentage(thousandths)
    }

    pub fn from_whole(percent: u32) -> Self {
        Percentage(percent.saturating_mul(THOUSANDTHS_PER_PERCENT))
    }

    /// Rounds to the nearest thousandth. Returns `None` for negative or
    /// non-finite input.
    pub fn from_f64(percent: f64) -> Option<Self> {
        if !percent.is_finite() || percent < 0.0 {
            return None;
        }
        let scaled = (percent * THOUSANDTHS_PER_PERCENT as f64).round();
        if scaled > u32::MAX as f64 {
            return None;
        }
        Some(Percentage(scaled as u32))
    }

    pub const fn thousandths(&self) -> u32 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / THOUSANDTHS_PER_PERCENT;
        let fraction = self.0 % THOUSANDTHS_PER_PERCENT;
        if fraction == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{:03}", fraction);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl FromStr for Percentage {
    type Err = ParseAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_suffix('%').unwrap_or(s);
        let scaled = parse_scaled(s, PERCENT_DECIMALS)?;
        u32::try_from(scaled)
            .map(Percentage)
            .map_err(|_| ParseAmountError::Overflow)
    }
}
