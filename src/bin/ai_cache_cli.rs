//! ai-cache-cli: 响应缓存快照的查看、清理与月度配额预测
//!
//! Usage:
//!   ai-cache-cli stats   [--dir <path>] [--namespace <ns>]   Show cache statistics
//!   ai-cache-cli cleanup [--dir <path>] [--namespace <ns>]   Drop expired entries
//!   ai-cache-cli clear   [--dir <path>] [--namespace <ns>]   Remove every entry
//!   ai-cache-cli quota --used <tokens> [--limit <tokens>] [--date YYYY-MM-DD]

use ai_response_cache::cache::{CacheStore, Clock, ResponseCache, SystemClock};
use ai_response_cache::persistence::{FileBlobStore, PersistencePort, Snapshot, SnapshotPersistence};
use ai_response_cache::tokens::QuotaProjector;
use ai_response_cache::CacheConfig;
use anyhow::{anyhow, bail, Context};
use chrono::{Local, NaiveDate};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "stats" => cmd_stats(&args[2..]).await,
        "cleanup" => cmd_cleanup(&args[2..]).await,
        "clear" => cmd_clear(&args[2..]).await,
        "quota" => cmd_quota(&args[2..]),
        "version" | "--version" | "-V" => {
            println!("ai-cache-cli {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"ai-cache-cli: AI 响应缓存命令行工具

USAGE:
    ai-cache-cli <COMMAND> [OPTIONS]

COMMANDS:
    stats   [--dir <path>] [--namespace <ns>]    Show size, hits, tokens and cost saved
    cleanup [--dir <path>] [--namespace <ns>]    Drop expired entries from the snapshot
    clear   [--dir <path>] [--namespace <ns>]    Remove every cached entry
    quota   --used <tokens> [--limit <tokens>] [--date YYYY-MM-DD]
                                                 Project monthly token usage
    version                                      Show version information
    help                                         Show this help message

ENVIRONMENT:
    AI_CACHE_DIR                   Snapshot directory (default ./.ai-cache)
    AI_CACHE_CAPACITY, AI_CACHE_TTL_SECS, AI_CACHE_PRICE_PER_1K,
    AI_CACHE_MONTHLY_TOKEN_LIMIT, AI_CACHE_NAMESPACE
    RUST_LOG                       Log filter (default warn)"#
    );
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn resolve_config(args: &[String]) -> anyhow::Result<CacheConfig> {
    let mut config = CacheConfig::from_env();
    if let Some(ns) = flag_value(args, "--namespace") {
        config = config.with_namespace(ns);
    }
    config.validate()?;
    Ok(config)
}

fn resolve_dir(args: &[String]) -> PathBuf {
    if let Some(dir) = flag_value(args, "--dir") {
        return PathBuf::from(dir);
    }
    if let Ok(dir) = std::env::var("AI_CACHE_DIR") {
        return PathBuf::from(dir);
    }
    PathBuf::from(".ai-cache")
}

fn port_for(args: &[String], config: &CacheConfig) -> Arc<dyn PersistencePort> {
    Arc::new(SnapshotPersistence::new(
        Arc::new(FileBlobStore::new(resolve_dir(args))),
        config.namespace.clone(),
    ))
}

async fn open_cache(args: &[String]) -> anyhow::Result<(ResponseCache, Arc<dyn PersistencePort>, CacheConfig)> {
    let config = resolve_config(args)?;
    let port = port_for(args, &config);
    let cache = ResponseCache::open(&config, port.clone(), Arc::new(SystemClock)).await;
    Ok((cache, port, config))
}

async fn cmd_stats(args: &[String]) -> anyhow::Result<()> {
    let (cache, _, config) = open_cache(args).await?;
    let stats = cache.stats();
    let pricing = config.pricing();
    println!("Namespace:        {}", config.namespace);
    println!("Entries:          {}/{}", stats.size, cache.capacity());
    println!("TTL:              {:?}", cache.ttl());
    println!("Total hits:       {}", stats.total_hits);
    println!("Hits per entry:   {:.2}", stats.hit_rate);
    println!("Tokens saved:     {}", stats.tokens_saved);
    println!("Est. cost saved:  {}", pricing.format(stats.estimated_cost_saved));
    cache.flush().await;
    Ok(())
}

async fn cmd_cleanup(args: &[String]) -> anyhow::Result<()> {
    let config = resolve_config(args)?;
    let port = port_for(args, &config);
    let snapshot = port.load().await.context("reading cache snapshot")?;
    let (expired, over_capacity) = cleanup_counts(snapshot, &config, SystemClock.now_millis());

    // Opening the cache applies the same sweep and capacity limit and queues the new snapshot.
    let cache = ResponseCache::open(&config, port, Arc::new(SystemClock)).await;
    cache.flush().await;
    println!(
        "Removed {expired} expired entr{} and {over_capacity} over capacity ({} remaining)",
        if expired == 1 { "y" } else { "ies" },
        cache.len()
    );
    Ok(())
}

/// Expired entries in `snapshot`, then how many live ones exceed the capacity.
fn cleanup_counts(snapshot: Snapshot, config: &CacheConfig, now: u64) -> (usize, usize) {
    let mut store = CacheStore::new(usize::MAX, config.ttl());
    store.restore(snapshot);
    let expired = store.cleanup_expired(now);
    (expired, store.len().saturating_sub(config.capacity.max(1)))
}

async fn cmd_clear(args: &[String]) -> anyhow::Result<()> {
    let (cache, _, _) = open_cache(args).await?;
    let removed = cache.clear();
    cache.flush().await;
    println!("Cleared {removed} entr{}", if removed == 1 { "y" } else { "ies" });
    Ok(())
}

fn cmd_quota(args: &[String]) -> anyhow::Result<()> {
    let config = CacheConfig::from_env();
    let used: u64 = flag_value(args, "--used")
        .ok_or_else(|| anyhow!("--used <tokens> is required"))?
        .parse()
        .context("--used must be a non-negative integer")?;
    let limit = match flag_value(args, "--limit") {
        Some(v) => v.parse().context("--limit must be a non-negative integer")?,
        None => config.monthly_token_limit,
    };
    let date = match flag_value(args, "--date") {
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d").context("--date must be YYYY-MM-DD")?,
        None => Local::now().date_naive(),
    };
    if limit == 0 {
        bail!("--limit must be positive");
    }

    let status = QuotaProjector::new(limit).project(used, date);
    println!("Date:               {date}");
    println!("Tokens used:        {} / {}", status.tokens_used, status.monthly_token_limit);
    println!("Percentage used:    {:.1}%", status.percentage_used);
    println!("Tokens remaining:   {}", status.tokens_remaining);
    println!("Daily rate:         {:.0}", status.daily_rate);
    println!("Projected month:    {:.0}", status.projected_monthly_usage);
    println!("Days until reset:   {}", status.days_until_reset);
    println!(
        "Status:             {}",
        if status.within_limit { "within limit" } else { "PROJECTED OVER LIMIT" }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_response_cache::CacheEntry;
    use std::time::Duration;

    #[test]
    fn test_cleanup_counts_separate_expired_from_over_capacity() {
        let config = CacheConfig::default()
            .with_capacity(2)
            .with_ttl(Duration::from_secs(10));
        let snapshot: Snapshot = vec![
            ("stale".into(), CacheEntry::new("r", 1, 0)),
            ("a".into(), CacheEntry::new("r", 1, 15_000)),
            ("b".into(), CacheEntry::new("r", 1, 16_000)),
            ("c".into(), CacheEntry::new("r", 1, 17_000)),
        ];
        assert_eq!(cleanup_counts(snapshot, &config, 20_000), (1, 1));
    }

    #[test]
    fn test_cleanup_counts_nothing_to_do() {
        let config = CacheConfig::default();
        let snapshot: Snapshot = vec![("a".into(), CacheEntry::new("r", 1, 1_000))];
        assert_eq!(cleanup_counts(snapshot, &config, 2_000), (0, 0));
    }
}
