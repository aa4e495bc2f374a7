use crate::config::Config;
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{anyhow, Result};

pub struct SignerOptions<'a> {
    pub private_key: Option<&'a str>,
    pub private_key_env: Option<&'a str>,
}

/// Loads the bridging account from the flag, or from the configured env var.
///
/// The same key signs on both chains.
pub fn load_signer(options: SignerOptions<'_>, config: &Config) -> Result<Option<PrivateKeySigner>> {
    if options.private_key.is_some() && options.private_key_env.is_some() {
        anyhow::bail!("cannot set both --private-key and --private-key-env");
    }

    if let Some(key) = options.private_key {
        return load_wallet(key).map(Some);
    }

    let env = options
        .private_key_env
        .map(|value| value.to_string())
        .unwrap_or_else(|| config.signer_env());
    match std::env::var(&env) {
        Ok(key) => {
            let signer = load_wallet(&key)?;
            tracing::debug!(env = %env, address = %signer.address(), "loaded signer from environment");
            Ok(Some(signer))
        }
        Err(_) => Ok(None),
    }
}

fn load_wallet(key: &str) -> Result<PrivateKeySigner> {
    key.trim()
        .parse()
        .map_err(|err| anyhow!("invalid private key: {err}"))
}
