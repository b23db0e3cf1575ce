use daybook::cache::{self, FileCache};
use daybook::config::DaybookConfig;
use daybook::remote::rest::RestStore;
use daybook::remote::{keyring, RemoteStore};
use daybook::sync::merge::{self, Divergence};

#[tokio::main]
async fn main() {
    let config = DaybookConfig::load(&DaybookConfig::default_path());
    daybook::init_logging("daybook-sync-check", config.debug_logging);

    println!("=== Remote vs Local Comparison ===\n");

    let cache = FileCache::new(config.cache_directory());
    let local_tasks = cache::load_tasks(&cache).unwrap_or_default();
    let last = cache::last_synced(&cache)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".into());
    println!(
        "Local: {} cached tasks in {} (last synced {})\n",
        local_tasks.len(),
        cache.dir().display(),
        last
    );

    let Some(url) = config.remote_server() else {
        println!("No remote URL configured.");
        return;
    };

    println!("--- Remote: {} (table {}) ---", url, config.remote.table);

    let api_key = if config.remote.api_key.is_empty() {
        match keyring::load_api_key(url).await {
            Ok(Some(key)) => key,
            Ok(None) => { println!("  No API key found"); return; }
            Err(e) => { println!("  Keyring error: {}", e); return; }
        }
    } else {
        config.remote.api_key.clone()
    };

    let client = match RestStore::new(url, &api_key, &config.remote.table) {
        Ok(c) => c,
        Err(e) => { println!("  Client error: {}", e); return; }
    };

    let rows = match client.fetch_all().await {
        Ok(rows) => rows,
        Err(e) => { println!("  Error listing rows: {}", e); return; }
    };
    println!("  Remote: {} rows", rows.len());

    let divergences = merge::compare(&local_tasks, &rows);

    let mut mismatches = Vec::new();
    let mut remote_only = Vec::new();
    let mut local_only = Vec::new();
    for divergence in &divergences {
        match divergence {
            Divergence::FieldMismatch { title, fields, .. } => mismatches.push((title, fields)),
            Divergence::RemoteOnly { row } => remote_only.push(row),
            Divergence::LocalOnly { id, title } => local_only.push((id, title)),
        }
    }

    println!("  Matched: {}", rows.len() - remote_only.len());

    if !mismatches.is_empty() {
        println!("\n  FIELD MISMATCHES:");
        for (title, fields) in &mismatches {
            println!("    {}: {}", title, fields.join(", "));
        }
    }

    if !remote_only.is_empty() {
        println!("\n  ON SERVER ONLY ({}):", remote_only.len());
        for row in &remote_only {
            let state = if row.completed { "done" } else { "todo" };
            println!("    [{}] {} ({})", state, row.title, row.id);
        }
    }

    if !local_only.is_empty() {
        println!("\n  LOCAL ONLY ({}):", local_only.len());
        for (id, title) in &local_only {
            println!("    {} ({})", title, id);
        }
    }

    if divergences.is_empty() {
        println!("  All in sync!");
    }

    println!("\n=== Done ===");
}
