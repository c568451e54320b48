//! Target URL validation.
//!
//! Purely syntactic: no DNS lookups or network access happen here.

use std::fmt;

use url::Url;

use crate::error::InvalidInput;

/// A URL known to parse as absolute and to use the `http` or `https` scheme.
///
/// The only constructor is [`validate`], so a value of this type is proof
/// that both checks passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUrl(Url);

impl ValidatedUrl {
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ValidatedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Parse `raw` and check that it targets http or https.
pub fn validate(raw: &str) -> Result<ValidatedUrl, InvalidInput> {
    if raw.is_empty() {
        return Err(InvalidInput::InvalidUrl("empty URL".into()));
    }

    let url = Url::parse(raw).map_err(|e| InvalidInput::InvalidUrl(format!("{raw:?}: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(ValidatedUrl(url)),
        other => Err(InvalidInput::InvalidUrl(format!(
            "unsupported scheme `{other}` in {raw:?}"
        ))),
    }
}
