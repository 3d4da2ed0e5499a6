//! Seed script for fgc_notes
//!
//! Creates a demo account and a few notes in the configured Sled database.
//! Run: cargo run --bin load_data
//! Then log in with demo / fightmoney.

use fgc_notes::catalog::Catalog;
use fgc_notes::config::Config;
use fgc_notes::credentials::CredentialStore;
use fgc_notes::error::StoreError;
use fgc_notes::notes::NotesStore;
use fgc_notes::storage::Storage;
use fgc_notes::telemetry::init_tracing;
use tracing::info;

const DEMO_USER: &str = "demo";
const DEMO_PASSWORD: &str = "fightmoney";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let _log_guard = init_tracing(&config);
    config.log_notices();

    let storage = Storage::open(&config.data_dir)?;
    let credentials = CredentialStore::new(storage.users(), config.password_hasher());
    let notes = NotesStore::new(storage.notes());
    let catalog = Catalog::builtin();

    match credentials.register(DEMO_USER, "demo@example.com", DEMO_PASSWORD) {
        Ok(_) => info!("Created demo account '{DEMO_USER}'"),
        Err(StoreError::AlreadyExists) => info!("Demo account already exists, keeping it"),
        Err(e) => return Err(e.into()),
    }

    let samples = [
        ("sf6", "Ryu", "Jump-in fierce into DP punish. Drive rush after blocked sweep is minus."),
        ("sf6", "Ken", "Watch for run-stop mixups; DP on wakeup is his favorite reversal."),
        ("mk1", "Scorpion", "Spear is punishable on block. Teleport is -20, always punish."),
        ("2xko", "Ahri", "Stay grounded against orb pressure, tag out when cornered."),
    ];

    let mut saved = 0;
    for (game, character, text) in samples {
        // the store does not check rosters, so keep seed data honest here
        if !catalog.is_valid_character(game, character) {
            continue;
        }
        notes.save_one(DEMO_USER, game, character, text)?;
        saved += 1;
    }

    info!("Seeded {saved} notes for '{DEMO_USER}' in {}", config.data_dir.display());
    Ok(())
}
