use anyhow::{anyhow, bail, Result};
use serde_json::Value;

/// Reads a scalar claim by dotted path, e.g. `user_metadata.id`.
pub trait ClaimParser {
    fn parse(&self, path: &str) -> Result<String>;
}

impl ClaimParser for Value {
    fn parse(&self, path: &str) -> Result<String> {
        let pointer = path
            .split('.')
            .map(|key| format!("/{}", key.replace('~', "~0").replace('/', "~1")))
            .collect::<String>();
        match self.pointer(&pointer) {
            None => bail!("Claim '{}' not found", path),
            Some(Value::String(string)) if string.is_empty() => {
                bail!("Claim '{}' is empty", path)
            }
            Some(Value::String(string)) => Ok(string.clone()),
            Some(Value::Number(number)) => Ok(number.to_string()),
            Some(Value::Bool(bool)) => Ok(bool.to_string()),
            Some(other) => Err(anyhow!("Claim '{}' is not a scalar: {}", path, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_claim_parser() {
        let claims = json!({
            "id": "8b1c7e2a-5d4f-4c8e-9f2a-1b3c4d5e6f70",
            "aud": "authenticated",
            "confirmed": true,
            "iat": 1516239022,
            "user_metadata": {
                "email": "jane@example.com"
            },
            "empty": ""
        });
        assert_eq!(
            claims.parse("id").unwrap(),
            "8b1c7e2a-5d4f-4c8e-9f2a-1b3c4d5e6f70"
        );
        assert_eq!(claims.parse("confirmed").unwrap(), "true");
        assert_eq!(claims.parse("iat").unwrap(), "1516239022");
        assert_eq!(
            claims.parse("user_metadata.email").unwrap(),
            "jane@example.com"
        );
        assert!(claims.parse("missing").is_err());
        assert!(claims.parse("id.missing").is_err());
        assert!(claims.parse("user_metadata").is_err());
        assert!(claims.parse("empty").is_err());
        assert!(json!({ "a/b": "x" }).parse("a/b").is_ok());
        assert!(json!({ "id": null }).parse("id").is_err());
    }
}
