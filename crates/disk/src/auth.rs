use reqwest::header::{HeaderValue, InvalidHeaderValue};

/// Static OAuth token issued to the application.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthToken {
    token: String,
}

impl OAuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// `Authorization` header value, marked sensitive so it is never logged.
    pub fn header(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(&format!("OAuth {}", self.token))?;
        value.set_sensitive(true);
        Ok(value)
    }

    pub fn is_empty(&self) -> bool {
        self.token.trim().is_empty()
    }

    /// Token with everything but the last four characters hidden.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.token.chars().collect();
        if chars.len() <= 8 {
            return "****".to_string();
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****{tail}")
    }
}

impl std::fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OAuthToken({})", self.masked())
    }
}
