use crate::error::Error;

/// How the SMTP connection is protected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Security {
    /// Plain connect, then upgrade with `STARTTLS` before authenticating.
    StartTls,
    /// TLS from the first byte (usually port 465).
    Tls,
    /// No encryption at all. Only for local relays and test servers.
    None,
}

impl Security {
    pub fn parse(value: &str) -> Result<Security, Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "starttls" => Ok(Security::StartTls),
            "tls" => Ok(Security::Tls),
            "none" => Ok(Security::None),
            other => Err(Error::Configuration(format!(
                "invalid SMTP_SECURITY value '{}' (expected starttls, tls or none)",
                other
            ))),
        }
    }

    /// Whether the credentials travel over TLS once the session is set up.
    pub fn is_encrypted(&self) -> bool {
        !matches!(self, Security::None)
    }
}

impl Default for Security {
    fn default() -> Self {
        Security::StartTls
    }
}
