//! Secret mixed into identity hashes
//!
//! The pepper is fetched once per process. The OS keyring is the source of
//! truth; on first use the operator is asked for a value (or accepts a
//! generated one) which is then persisted to the keyring. When neither the
//! keyring nor a terminal is available a fixed default is used so caching
//! keeps working, at the cost of hashes that are only as secret as the
//! default itself.

use crate::error::{Result, TeamsResolverError};
use keyring::Entry;
use std::io::{BufRead, IsTerminal, Write};
use std::sync::OnceLock;

const SERVICE_NAME: &str = "teams-resolver";
const ACCOUNT_NAME: &str = "cache-pepper";

/// Used when no pepper can be loaded or captured
pub const DEFAULT_PEPPER: &str = "teams-resolver-default-pepper";

/// Source of the hashing secret
pub trait PepperProvider: Send + Sync {
    fn load(&self) -> Result<String>;
}

/// Fixed pepper, from configuration or tests
#[derive(Debug, Clone)]
pub struct StaticPepper(String);

impl StaticPepper {
    pub fn new(pepper: impl Into<String>) -> Self {
        Self(pepper.into())
    }
}

impl PepperProvider for StaticPepper {
    fn load(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Keyring-backed pepper with a one-time interactive capture
#[derive(Debug, Clone)]
pub struct KeyringPepper {
    service: String,
    account: String,
    interactive: bool,
}

impl Default for KeyringPepper {
    fn default() -> Self {
        Self::new(SERVICE_NAME, ACCOUNT_NAME)
    }
}

impl KeyringPepper {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
            interactive: std::io::stdin().is_terminal(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(&self.service, &self.account).map_err(|e| {
            TeamsResolverError::PepperUnavailable(format!("failed to open keyring entry: {e}"))
        })
    }

    fn capture(&self, entry: &Entry) -> Result<String> {
        if !self.interactive {
            return Err(TeamsResolverError::PepperUnavailable(
                "no pepper stored and no terminal to ask for one".to_string(),
            ));
        }

        let pepper = prompt_for_pepper()?;
        entry.set_password(&pepper).map_err(|e| {
            TeamsResolverError::PepperUnavailable(format!("failed to persist pepper: {e}"))
        })?;

        tracing::info!(service = %self.service, "Stored new cache pepper in keyring");
        Ok(pepper)
    }
}

impl PepperProvider for KeyringPepper {
    fn load(&self) -> Result<String> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(pepper) => Ok(pepper),
            Err(keyring::Error::NoEntry) => self.capture(&entry),
            Err(e) => {
                tracing::debug!(error = %e, "Keyring read failed, asking for pepper");
                self.capture(&entry)
            }
        }
    }
}

fn prompt_for_pepper() -> Result<String> {
    let mut stderr = std::io::stderr();
    write!(
        stderr,
        "Enter a secret used to hash cached identities (leave empty to generate one): "
    )?;
    stderr.flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;

    let pepper = line.trim();
    if pepper.is_empty() {
        Ok(uuid::Uuid::new_v4().simple().to_string())
    } else {
        Ok(pepper.to_string())
    }
}

/// Lazily loaded, process-wide pepper
pub struct Pepper {
    provider: Box<dyn PepperProvider>,
    value: OnceLock<String>,
}

impl Pepper {
    pub fn new(provider: impl PepperProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            value: OnceLock::new(),
        }
    }

    /// Explicitly configured pepper if given, keyring otherwise
    pub fn configured(explicit: Option<&str>) -> Self {
        match explicit {
            Some(pepper) => Self::new(StaticPepper::new(pepper)),
            None => Self::new(KeyringPepper::default()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.value.get().is_some()
    }

    /// The pepper, loading it on first call
    ///
    /// The first call may block on the keyring or a terminal prompt.
    pub fn get(&self) -> &str {
        self.value.get_or_init(|| match self.provider.load() {
            Ok(pepper) if !pepper.is_empty() => pepper,
            Ok(_) => {
                tracing::warn!("Pepper provider returned an empty secret, using default pepper");
                DEFAULT_PEPPER.to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Pepper unavailable, using default pepper");
                DEFAULT_PEPPER.to_string()
            }
        })
    }
}

impl std::fmt::Debug for Pepper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pepper")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
