use anyhow::Context;

/// Where we store secrets in the OS keyring.
///
/// This is intentionally constant so upgrades don't orphan secrets.
const SERVICE: &str = "framewatch";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKey {
    AnalysisApiKey,
}

impl SecretKey {
    fn user(self) -> &'static str {
        match self {
            SecretKey::AnalysisApiKey => "analysis_api_key",
        }
    }
}

pub fn set_secret(key: SecretKey, value: &str) -> anyhow::Result<()> {
    let entry = keyring::Entry::new(SERVICE, key.user()).context("create keyring entry")?;
    entry.set_password(value).context("set secret")
}

pub fn get_secret(key: SecretKey) -> anyhow::Result<Option<String>> {
    let entry = keyring::Entry::new(SERVICE, key.user()).context("create keyring entry")?;

    match entry.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(anyhow::Error::new(e)).context("get secret"),
    }
}

pub fn delete_secret(key: SecretKey) -> anyhow::Result<()> {
    let entry = keyring::Entry::new(SERVICE, key.user()).context("create keyring entry")?;
    match entry.delete_credential() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(anyhow::Error::new(e)).context("delete secret"),
    }
}

/// Stores a non-empty credential, or clears the stored one.
pub fn store_credential(value: Option<&str>) -> anyhow::Result<()> {
    match value.filter(|v| !v.is_empty()) {
        Some(v) => set_secret(SecretKey::AnalysisApiKey, v),
        None => delete_secret(SecretKey::AnalysisApiKey),
    }
}
