use crate::error::{EstimationError, EstimationResult};

/// Round half away from zero to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Converts catalog prices into the single output currency
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyConverter {
    output_currency: String,
    usd_rate: f64,
}

impl CurrencyConverter {
    pub fn new(output_currency: impl Into<String>, usd_rate: f64) -> Self {
        Self {
            output_currency: output_currency.into().to_ascii_uppercase(),
            usd_rate,
        }
    }

    pub fn output_currency(&self) -> &str {
        &self.output_currency
    }

    /// Identity for the output currency, fixed rate for USD, error otherwise.
    /// The result is not rounded.
    pub fn convert(&self, amount: f64, currency: &str, context: &str) -> EstimationResult<f64> {
        let code = currency.trim();
        if code.eq_ignore_ascii_case(&self.output_currency) {
            Ok(amount)
        } else if code.eq_ignore_ascii_case("USD") {
            Ok(amount * self.usd_rate)
        } else {
            Err(EstimationError::UnsupportedCurrency {
                currency: code.to_string(),
                context: context.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.005_000_1), 1.01);
        assert_eq!(round2(30295.0), 30295.0);
        assert_eq!(round2(7.054_9), 7.05);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_output_currency_is_identity() {
        let converter = CurrencyConverter::new("inr", 83.0);
        assert_eq!(converter.convert(12.5, "INR", "test").unwrap(), 12.5);
        assert_eq!(converter.output_currency(), "INR");
    }

    #[test]
    fn test_usd_uses_fixed_rate() {
        let converter = CurrencyConverter::new("INR", 83.0);
        assert_eq!(converter.convert(0.5, "usd", "test").unwrap(), 41.5);
    }

    #[test]
    fn test_other_currencies_are_rejected() {
        let converter = CurrencyConverter::new("INR", 83.0);
        let err = converter.convert(1.0, "EUR", "sku c6i.large").unwrap_err();
        assert!(matches!(
            err,
            EstimationError::UnsupportedCurrency { ref currency, .. } if currency == "EUR"
        ));
        assert!(err.to_string().contains("c6i.large"));
    }
}
