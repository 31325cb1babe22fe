//! # varddb Basic Usage
//!
//! Walks through the main surfaces of the crate against a temporary redb
//! database.
//!
//! ## What This Example Shows
//!
//! - Initializing a registry and opening named stores
//! - Typed saves and reads, including structured and object values
//! - TTL expiry and explicit enforcement
//! - Observing keys with exactly-once delivery
//! - Async variants on a tokio runtime
//!
//! ## Running This Example
//!
//! ```bash
//! cargo run --example basic_usage
//! ```
//!
//! Set `RUST_LOG=varddb=debug` to see store and engine logs.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tempfile::TempDir;
use varddb::logging::init_tracing;
use varddb::notify::Event;
use varddb::{Data, Kind, LogLevel, Object, Registry, StoreConfig, Structured};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Settings {
    theme: String,
    font_size: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(LogLevel::Info, false)?;
    println!("=== varddb Basic Usage ===\n");

    // =========================================================================
    // Part 1: Registry and stores
    // =========================================================================

    println!("--- Part 1: Registry and stores ---\n");

    let temp_dir = TempDir::new()?;
    let registry = Registry::redb();
    let token = registry.initialize(temp_dir.path(), LogLevel::Info)?;
    println!("Engine initialized: {token}");

    let prefs = registry.store_named("prefs")?;
    let session = registry.store(StoreConfig::new("session").with_ttl(true))?;
    println!("Open stores: {:?}\n", registry.names());

    // =========================================================================
    // Part 2: Typed values
    // =========================================================================

    println!("--- Part 2: Typed values ---\n");

    prefs.save("launches", 3i32, None)?;
    prefs.save("username", "ada".to_string(), None)?;
    prefs.save(
        "settings",
        Structured(Settings {
            theme: "dark".to_string(),
            font_size: 14,
        }),
        None,
    )?;
    prefs.save(
        "backup",
        Object(Settings {
            theme: "light".to_string(),
            font_size: 12,
        }),
        None,
    )?;

    println!("launches = {:?}", prefs.read::<i32>("launches", None)?);
    println!("username = {:?}", prefs.read::<String>("username", None)?);
    println!(
        "settings = {:?}",
        prefs.read::<Structured<Settings>>("settings", None)?.map(|s| s.0)
    );
    println!(
        "backup   = {:?}",
        prefs.read::<Object<Settings>>("backup", None)?.map(|o| o.0)
    );
    println!("missing  = {}", prefs.read_or("missing", 0i64, None)?);

    // Reading with the wrong kind is a decode error, not a silent default
    match prefs.read::<bool>("launches", None) {
        Ok(value) => println!("unexpected: {value:?}"),
        Err(e) => println!("kind mismatch: {e}"),
    }
    println!();

    // =========================================================================
    // Part 3: TTL
    // =========================================================================

    println!("--- Part 3: TTL ---\n");

    session.save("count", 42i32, Some(Duration::from_millis(100)))?;
    println!("fresh:   {:?}", session.read::<i32>("count", None)?);

    tokio::time::sleep(Duration::from_millis(150)).await;
    println!("expired: {:?}", session.read::<i32>("count", None)?);
    println!("raw:     {:?}", session.read::<i32>("count", Some(false))?);
    println!("stored:  {}\n", session.contains_key("count"));

    // =========================================================================
    // Part 4: Observing changes
    // =========================================================================

    println!("--- Part 4: Observing changes ---\n");

    let live = prefs.filled_observable("launches", Kind::Int32, None, Some(false));
    println!("filled with {:?}", live.current_value());

    live.attach(|event: &Event<Data>| match event.peek() {
        Some(data) => println!("observer: launches -> {data:?}"),
        None => println!("observer: launches removed"),
    });

    prefs.save("launches", 4i32, None)?;
    prefs.remove(&["launches"]);
    println!();

    // =========================================================================
    // Part 5: Async
    // =========================================================================

    println!("--- Part 5: Async ---\n");

    prefs.save_async("launches", 5i32, None).await?;
    let launches = prefs.read_async::<i32>("launches", None).await?;
    println!("async read: {launches:?}");

    prefs.clear_async().await?;
    println!("after clear: {}", prefs.contains_key_async("username").await?);

    println!("\n=== Done ===");
    Ok(())
}
