use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Base currencies the endpoint serves.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Eur,
    Usd,
    Gbp,
}

impl Currency {
    pub const SUPPORTED: [Currency; 3] = [Currency::Eur, Currency::Usd, Currency::Gbp];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
        }
    }

    pub fn supported_list() -> String {
        Self::SUPPORTED
            .iter()
            .map(Currency::code)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Eur
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        Self::SUPPORTED
            .into_iter()
            .find(|currency| currency.code() == code)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "Invalid base currency. Supported: {}",
                    Self::supported_list()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("eur".parse::<Currency>().unwrap(), Currency::Eur);
        assert_eq!("Usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!(" GBP ".parse::<Currency>().unwrap(), Currency::Gbp);
    }

    #[test]
    fn test_parse_rejects_unsupported() {
        for code in ["JPY", "", "EURO", "E UR"] {
            let error = code.parse::<Currency>().unwrap_err();
            assert!(matches!(error, Error::Validation(_)));
            assert_eq!(
                error.to_string(),
                "Invalid base currency. Supported: EUR, USD, GBP"
            );
        }
    }

    #[test]
    fn test_serialize_as_code() {
        assert_eq!(serde_json::to_string(&Currency::Gbp).unwrap(), "\"GBP\"");
        assert_eq!(
            serde_json::from_str::<Currency>("\"USD\"").unwrap(),
            Currency::Usd
        );
    }
}
