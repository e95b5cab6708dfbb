//! Unified instrument symbols
//!
//! Configuration and screeners speak one notation, `BASE/QUOTE:SETTLE`
//! (e.g. `ETH/USDT:USDT` for the USDT-margined perpetual). Each venue
//! module converts to and from its native id.

use std::fmt;
use std::str::FromStr;

use crate::adapters::errors::ExchangeError;

/// Parsed `BASE/QUOTE:SETTLE` symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnifiedSymbol {
    pub base: String,
    pub quote: String,
    /// Settlement currency; equals `quote` when omitted
    pub settle: String,
}

impl UnifiedSymbol {
    pub fn new(base: &str, quote: &str, settle: &str) -> Self {
        Self {
            base: base.to_uppercase(),
            quote: quote.to_uppercase(),
            settle: settle.to_uppercase(),
        }
    }
}

impl FromStr for UnifiedSymbol {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ExchangeError::InvalidResponse(format!(
            "Symbol '{}' is not in BASE/QUOTE[:SETTLE] form",
            s
        ));

        let (pair, settle) = match s.split_once(':') {
            Some((pair, settle)) => (pair, Some(settle)),
            None => (s, None),
        };
        let (base, quote) = pair.split_once('/').ok_or_else(invalid)?;
        let settle = settle.unwrap_or(quote);

        let valid = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric());
        if !(valid(base) && valid(quote) && valid(settle)) {
            return Err(invalid());
        }

        Ok(Self::new(base, quote, settle))
    }
}

impl fmt::Display for UnifiedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.base, self.quote, self.settle)
    }
}
