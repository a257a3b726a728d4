//! Vault directory persistence
//!
//! A vault directory holds the configuration, the ledger state and the two
//! secret keys, each in its own file:
//!
//! ```text
//! config.json     LedgerConfig
//! state.json      LedgerState (ciphertexts, grants, nonces, audit logs)
//! reveal.key      hex secret of the encryption context
//! authority.key   hex secret of the verifier authority
//! ```

use anyhow::{bail, Context, Result};
use rand::{CryptoRng, RngCore};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use secretvault_cipher::{ElGamalCiphertext, ElGamalRevealKey};
use secretvault_verifier::VerifierAuthority;

use crate::config::LedgerConfig;
use crate::ledger::{ConfidentialLedger, LedgerState};

pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).context("Failed to create vault directory")?;

        Ok(Self { dir })
    }

    /// Store over an existing vault; fails if it was never initialized
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let store = Self { dir: dir.as_ref().to_path_buf() };
        if !store.is_initialized() {
            bail!("No vault found at {:?}; run `secretvault init` first", store.dir);
        }
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join("config.json")
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join("state.json")
    }

    pub fn reveal_key_path(&self) -> PathBuf {
        self.dir.join("reveal.key")
    }

    pub fn authority_key_path(&self) -> PathBuf {
        self.dir.join("authority.key")
    }

    pub fn is_initialized(&self) -> bool {
        self.state_path().exists()
    }

    /// Generate both keys and write a fresh ledger for `config`
    pub fn initialize<R: RngCore + CryptoRng>(
        &self,
        config: &LedgerConfig,
        rng: &mut R,
    ) -> Result<(ConfidentialLedger, VerifierAuthority)> {
        if self.is_initialized() {
            bail!("Vault at {:?} is already initialized", self.dir);
        }
        config.validate().context("Invalid ledger configuration")?;

        let reveal_key = ElGamalRevealKey::generate(rng, config.reveal_bound_bits)
            .context("Failed to generate reveal key")?;
        let authority = VerifierAuthority::generate(rng);

        self.save_config(config)?;
        self.save_reveal_key(&reveal_key)?;
        self.save_authority(&authority)?;

        let ledger = ConfidentialLedger::new(authority.verifying_key(), reveal_key, config)
            .context("Failed to create ledger")?;
        self.save_ledger(&ledger)?;

        info!(dir = ?self.dir, context = %ledger.context(), "vault initialized");
        Ok((ledger, authority))
    }

    pub fn save_config(&self, config: &LedgerConfig) -> Result<()> {
        let json = config.to_json().context("Failed to serialize config")?;
        fs::write(self.config_path(), json).context("Failed to write config file")
    }

    pub fn load_config(&self) -> Result<LedgerConfig> {
        let path = self.config_path();
        LedgerConfig::load(&path).context(format!("Failed to load config at {:?}", path))
    }

    pub fn save_reveal_key(&self, key: &ElGamalRevealKey) -> Result<()> {
        fs::write(self.reveal_key_path(), hex::encode(key.secret_bytes()))
            .context("Failed to write reveal key")
    }

    pub fn load_reveal_key(&self, bound_bits: u32) -> Result<ElGamalRevealKey> {
        let bytes = read_hex_file(&self.reveal_key_path())?;
        ElGamalRevealKey::from_secret_bytes(&bytes, bound_bits).context("Invalid reveal key")
    }

    pub fn save_authority(&self, authority: &VerifierAuthority) -> Result<()> {
        fs::write(self.authority_key_path(), hex::encode(authority.secret_bytes()))
            .context("Failed to write authority key")
    }

    pub fn load_authority(&self) -> Result<VerifierAuthority> {
        let bytes = read_hex_file(&self.authority_key_path())?;
        VerifierAuthority::from_secret_bytes(&bytes).context("Invalid authority key")
    }

    pub fn save_ledger(&self, ledger: &ConfidentialLedger) -> Result<()> {
        let json =
            serde_json::to_string_pretty(ledger.state()).context("Failed to serialize ledger state")?;
        fs::write(self.state_path(), json).context("Failed to write state file")
    }

    pub fn load_state(&self) -> Result<LedgerState<ElGamalCiphertext>> {
        let path = self.state_path();
        let content =
            fs::read_to_string(&path).context(format!("Failed to read state file at {:?}", path))?;

        serde_json::from_str(&content).context("Failed to deserialize ledger state")
    }

    /// Config, reveal key and state, reassembled into a ledger
    pub fn load_ledger(&self) -> Result<ConfidentialLedger> {
        let config = self.load_config()?;
        let reveal_key = self.load_reveal_key(config.reveal_bound_bits)?;
        let state = self.load_state()?;

        ConfidentialLedger::from_state(state, reveal_key)
            .context("Reveal key does not match the stored ledger")
    }
}

fn read_hex_file(path: &Path) -> Result<Vec<u8>> {
    let content =
        fs::read_to_string(path).context(format!("Failed to read key file at {:?}", path))?;
    hex::decode(content.trim()).context(format!("Key file {:?} is not valid hex", path))
}
