//! SecretVault CLI
//!
//! Operate a confidential treasury vault stored in a local directory.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::OsRng;
use std::{fs, path::PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use secretvault_cipher::ElGamalCiphertext;
use secretvault_ledger::{LedgerConfig, StateStore, TargetAllocation};
use secretvault_runtime::{CallerId, CategoryId, RevealTarget, Tier};
use secretvault_verifier::{RevealProof, VerifierAuthority};

#[derive(Parser)]
#[command(name = "secretvault")]
#[command(about = "Confidential treasury ledger with tiered, proof-gated reveals", long_about = None)]
struct Cli {
    /// Vault directory
    #[arg(long, global = true, default_value = ".secretvault")]
    vault: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a vault: keys, configuration and an empty ledger
    Init {
        /// Ledger configuration JSON; the five-category DAO split when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Governance identity used with the default configuration
        #[arg(long, default_value = "governance")]
        governance: String,
    },

    /// Encrypt a whole-unit amount under the vault context
    Encrypt {
        #[arg(short, long)]
        amount: u64,
    },

    /// Deposit an encrypted amount into a category
    Deposit {
        #[arg(long)]
        caller: String,

        #[arg(long)]
        category: String,

        /// Hex ciphertext from `encrypt`
        #[arg(long)]
        ciphertext: String,
    },

    /// Move an encrypted amount between categories (governance)
    Reallocate {
        #[arg(long)]
        governance: String,

        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        #[arg(long)]
        ciphertext: String,
    },

    /// Withdraw an encrypted amount from a category (governance)
    Withdraw {
        #[arg(long)]
        governance: String,

        #[arg(long)]
        category: String,

        #[arg(long)]
        ciphertext: String,
    },

    /// Grant a caller a tier on a category or on `total` (governance)
    Grant {
        #[arg(long)]
        governance: String,

        #[arg(long)]
        caller: String,

        #[arg(long)]
        target: RevealTarget,

        #[arg(long)]
        tier: Tier,
    },

    /// Remove a caller's grant (governance)
    Revoke {
        #[arg(long)]
        governance: String,

        #[arg(long)]
        caller: String,

        #[arg(long)]
        target: RevealTarget,
    },

    /// Change the tier ceiling of a category or of `total` (governance)
    SetCeiling {
        #[arg(long)]
        governance: String,

        #[arg(long)]
        target: RevealTarget,

        #[arg(long)]
        tier: Tier,
    },

    /// Allow a caller to deposit (governance)
    AuthorizeDepositor {
        #[arg(long)]
        governance: String,

        #[arg(long)]
        caller: String,
    },

    /// Withdraw a caller's deposit right (governance)
    RevokeDepositor {
        #[arg(long)]
        governance: String,

        #[arg(long)]
        caller: String,
    },

    /// Rebalance to a new split, e.g. "Development=40,Operations=60" (governance)
    Rebalance {
        #[arg(long)]
        governance: String,

        #[arg(long)]
        split: String,
    },

    /// Replace the verifier authority with a freshly generated one (governance)
    RotateVerifier {
        #[arg(long)]
        governance: String,
    },

    /// Sign a reveal proof with the vault's verifier authority key
    IssueProof {
        #[arg(long)]
        caller: String,

        #[arg(long)]
        target: RevealTarget,

        #[arg(long)]
        nonce: u64,

        /// Write the proof JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Request a reveal with a proof file
    Reveal {
        #[arg(long)]
        caller: String,

        #[arg(long)]
        target: RevealTarget,

        /// Proof JSON from `issue-proof`
        #[arg(long)]
        proof: PathBuf,
    },

    /// Allocation table as seen by a viewer
    Snapshot {
        #[arg(long)]
        viewer: String,
    },

    /// Print the reveal and governance logs
    Audit,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(std::io::stderr).init();
}

fn load_ciphertext(hex: &str) -> Result<ElGamalCiphertext> {
    ElGamalCiphertext::from_hex(hex).context("Invalid ciphertext")
}

fn load_proof(path: &PathBuf) -> Result<RevealProof> {
    let content =
        fs::read_to_string(path).context(format!("Failed to read proof file: {:?}", path))?;

    serde_json::from_str(&content).context("Failed to parse proof JSON")
}

fn load_config(path: Option<&PathBuf>, governance: &str) -> Result<LedgerConfig> {
    match path {
        Some(path) => {
            LedgerConfig::load(path).context(format!("Failed to load config: {:?}", path))
        }
        None => Ok(LedgerConfig::dao_default(CallerId::new(governance))),
    }
}

fn encrypt_amount(store: &StateStore, amount: u64) -> Result<String> {
    let config = store.load_config()?;
    let key = store.load_reveal_key(config.reveal_bound_bits)?;

    Ok(key.encryption_key().encrypt(amount, &mut OsRng).to_hex())
}

fn issue_proof(store: &StateStore, caller: &str, target: RevealTarget, nonce: u64) -> Result<RevealProof> {
    let authority = store.load_authority()?;
    authority
        .issue(CallerId::new(caller), target, nonce, &mut OsRng)
        .context("Failed to sign reveal proof")
}

fn init_vault(store: &StateStore, config: &LedgerConfig) -> Result<()> {
    let (ledger, authority) = store.initialize(config, &mut OsRng)?;

    println!("✅ Vault initialized at {:?}", store.dir());
    println!("   Context:      {}", ledger.context());
    println!("   Verifier key: {}", authority.verifying_key());
    println!("   Categories:   {}", ledger.categories().len());
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Init { config, governance } = &cli.command {
        let config = load_config(config.as_ref(), governance)?;
        let store = StateStore::new(&cli.vault)?;
        return init_vault(&store, &config);
    }

    let store = StateStore::open(&cli.vault)?;
    let mut ledger = store.load_ledger()?;
    debug!(vault = ?cli.vault, block = ledger.block(), "ledger loaded");

    match cli.command {
        Commands::Init { .. } => bail!("Vault at {:?} is already initialized", cli.vault),

        Commands::Encrypt { amount } => {
            println!("{}", encrypt_amount(&store, amount)?);
            return Ok(());
        }

        Commands::Deposit { caller, category, ciphertext } => {
            let amount = load_ciphertext(&ciphertext)?;
            ledger.deposit(&CallerId::new(caller), &CategoryId::new(&category), &amount)?;
            println!("✅ Deposit applied to '{}'", category);
        }

        Commands::Reallocate { governance, from, to, ciphertext } => {
            let amount = load_ciphertext(&ciphertext)?;
            ledger.reallocate(
                &CallerId::new(governance),
                &CategoryId::new(&from),
                &CategoryId::new(&to),
                &amount,
            )?;
            println!("✅ Reallocated from '{}' to '{}'", from, to);
        }

        Commands::Withdraw { governance, category, ciphertext } => {
            let amount = load_ciphertext(&ciphertext)?;
            ledger.withdraw(&CallerId::new(governance), &CategoryId::new(&category), &amount)?;
            println!("✅ Withdrawal applied to '{}'", category);
        }

        Commands::Grant { governance, caller, target, tier } => {
            ledger.grant(&CallerId::new(governance), CallerId::new(&caller), target.clone(), tier)?;
            println!("✅ Granted {} on {} to {}", tier, target, caller);
        }

        Commands::Revoke { governance, caller, target } => {
            match ledger.revoke(&CallerId::new(governance), &CallerId::new(&caller), &target)? {
                Some(tier) => println!("✅ Revoked {} on {} from {}", tier, target, caller),
                None => println!("ℹ️  {} had no grant on {}", caller, target),
            }
        }

        Commands::SetCeiling { governance, target, tier } => {
            ledger.set_tier_ceiling(&CallerId::new(governance), &target, tier)?;
            println!("✅ Ceiling of {} set to {}", target, tier);
        }

        Commands::AuthorizeDepositor { governance, caller } => {
            ledger.authorize_depositor(&CallerId::new(governance), CallerId::new(&caller))?;
            println!("✅ {} may deposit", caller);
        }

        Commands::RevokeDepositor { governance, caller } => {
            ledger.revoke_depositor(&CallerId::new(governance), &CallerId::new(&caller))?;
            println!("✅ {} may no longer deposit", caller);
        }

        Commands::Rebalance { governance, split } => {
            let target = TargetAllocation::parse(&split)?;
            ledger.rebalance(&CallerId::new(governance), &target)?;
            println!("✅ Rebalanced:");
            for category in ledger.categories() {
                println!("   {:<16} {:>3}%", category.id, category.percentage);
            }
        }

        Commands::RotateVerifier { governance } => {
            let next = VerifierAuthority::generate(&mut OsRng);
            ledger.rotate_verifier(&CallerId::new(governance), next.verifying_key())?;
            store.save_authority(&next)?;
            println!("✅ Verifier rotated to {}", next.verifying_key());
        }

        Commands::IssueProof { caller, target, nonce, output } => {
            let proof = issue_proof(&store, &caller, target, nonce)?;
            let json = serde_json::to_string_pretty(&proof).context("Failed to serialize proof")?;
            match output {
                Some(path) => {
                    fs::write(&path, json).context(format!("Failed to write proof to {:?}", path))?;
                    println!("💾 Proof written to {:?}", path);
                }
                None => println!("{}", json),
            }
            return Ok(());
        }

        Commands::Reveal { caller, target, proof } => {
            let proof = load_proof(&proof)?;
            let result = ledger.request_reveal(&target, &CallerId::new(&caller), &proof);

            // The attempt is on the audit log whatever the outcome
            store.save_ledger(&ledger)?;
            let disclosure = result?;

            println!("🔓 {} ({} tier, block {})", disclosure.target, disclosure.tier, disclosure.block);
            println!("   Amount: {}", disclosure.amount);
            return Ok(());
        }

        Commands::Snapshot { viewer } => {
            println!("📋 Allocation as seen by {}", viewer);
            for row in ledger.allocation_snapshot(&CallerId::new(viewer)) {
                let balance = match &row.balance {
                    Some(ct) => ct.to_hex(),
                    None => "<restricted>".to_string(),
                };
                println!(
                    "   {:<16} {:>3}%  {:<10} updated@{:<6} {}",
                    row.id, row.percentage, row.tier, row.last_updated, balance
                );
            }
            return Ok(());
        }

        Commands::Audit => {
            let logs = serde_json::json!({
                "block": ledger.block(),
                "reveals": ledger.reveal_log(),
                "governance": ledger.governance_log(),
            });
            println!("{}", serde_json::to_string_pretty(&logs).context("Failed to serialize logs")?);
            return Ok(());
        }
    }

    store.save_ledger(&ledger)
}

fn main() -> Result<()> {
    init_tracing();
    run(Cli::parse())
}
