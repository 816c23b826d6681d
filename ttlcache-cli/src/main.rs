//! ttlcache CLI
//!
//! Runs the expiring cache against real time: a short scripted demo and a
//! concurrent stress run.

use std::ops::AddAssign;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ttlcache_cache::ExpiringCache;
use ttlcache_core::CacheConfig;

/// ttlcache - key-value cache with expiring entries
#[derive(Parser)]
#[command(name = "ttlcache")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk through one entry's life: visible, expired, swept
    Demo {
        /// Entry lifetime in milliseconds
        #[arg(long, default_value = "50")]
        lifetime_ms: u64,
        /// Sweep interval in milliseconds
        #[arg(long, default_value = "10")]
        sweep_ms: u64,
    },

    /// Hammer one cache from many tasks with mixed operations
    Stress {
        /// Number of concurrent tasks
        #[arg(short, long, default_value = "8")]
        tasks: usize,
        /// Number of distinct keys shared by all tasks
        #[arg(short, long, default_value = "64")]
        keys: u64,
        /// Operations per task
        #[arg(short, long, default_value = "10000")]
        ops: u64,
        /// Entry lifetime in milliseconds (default: TTLCACHE_LIFETIME_MS or 5)
        #[arg(long)]
        lifetime_ms: Option<u64>,
        /// Sweep interval in milliseconds (default: TTLCACHE_SWEEP_INTERVAL_MS or 2)
        #[arg(long)]
        sweep_ms: Option<u64>,
        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "ttlcache=debug,info"
    } else {
        "ttlcache=info,warn"
    };
    let json_layer = cli.log_json.then(|| tracing_subscriber::fmt::layer().json());
    let text_layer = (!cli.log_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(json_layer)
        .with(text_layer)
        .init();

    match cli.command {
        Commands::Demo {
            lifetime_ms,
            sweep_ms,
        } => cmd_demo(lifetime_ms, sweep_ms).await,
        Commands::Stress {
            tasks,
            keys,
            ops,
            lifetime_ms,
            sweep_ms,
            json,
        } => {
            let config = stress_config(CacheConfig::from_env(), lifetime_ms, sweep_ms);
            cmd_stress(config, tasks, keys, ops, json).await
        }
    }
}

/// Flags win over the environment; without either, stress runs use short
/// lifetimes so expiry actually happens during the run.
fn stress_config(env: CacheConfig, lifetime_ms: Option<u64>, sweep_ms: Option<u64>) -> CacheConfig {
    let defaults = CacheConfig::default();
    CacheConfig {
        lifetime_ms: lifetime_ms.unwrap_or(if env.lifetime_ms == defaults.lifetime_ms {
            5
        } else {
            env.lifetime_ms
        }),
        sweep_interval_ms: sweep_ms.unwrap_or(
            if env.sweep_interval_ms == defaults.sweep_interval_ms {
                2
            } else {
                env.sweep_interval_ms
            },
        ),
    }
}

fn mark(ok: bool) -> ColoredString {
    if ok {
        "✓".green()
    } else {
        "✗".red()
    }
}

/// Run the expiry walkthrough
async fn cmd_demo(lifetime_ms: u64, sweep_ms: u64) -> Result<()> {
    let config = CacheConfig {
        lifetime_ms,
        sweep_interval_ms: sweep_ms,
    };
    println!(
        "{} lifetime={}ms sweep={}ms",
        "⏳ Expiring cache demo:".cyan().bold(),
        lifetime_ms,
        sweep_ms
    );

    let cancel = CancellationToken::new();
    let cache = ExpiringCache::from_config(&config, cancel.clone())
        .context("Failed to create cache")?;
    let lifetime = config.lifetime();
    let sweep = config.sweep_interval();

    let start = Instant::now();
    // "a" is read back; "b" is never touched again and must be swept.
    cache.set("a", 1);
    cache.set("b", 2);
    println!("   t=0ms      set a=1, b=2");

    sleep_until(start + sweep).await;
    let early = cache.get("a");
    println!(
        "   t={:<8} get a -> {:?} {}",
        format!("{}ms", start.elapsed().as_millis()),
        early,
        mark(early == Some(1))
    );

    sleep_until(start + lifetime + sweep).await;
    let late = cache.get("a");
    println!(
        "   t={:<8} get a -> {:?} {}",
        format!("{}ms", start.elapsed().as_millis()),
        late,
        mark(late.is_none())
    );

    sleep_until(start + lifetime + sweep * 2).await;
    let remaining = cache.len();
    println!(
        "   t={:<8} stored entries -> {} {} {}",
        format!("{}ms", start.elapsed().as_millis()),
        remaining,
        mark(remaining == 0),
        "(b removed by the sweeper, never read)".dimmed()
    );

    cancel.cancel();

    if early == Some(1) && late.is_none() && remaining == 0 {
        println!("\n{}", "✅ Entry expired and was reclaimed".green().bold());
    } else {
        println!(
            "\n{}",
            "⚠️  Timings drifted; try a longer lifetime".yellow().bold()
        );
    }

    Ok(())
}

/// Per-task operation counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Tally {
    sets: u64,
    hits: u64,
    misses: u64,
    deletes: u64,
}

impl AddAssign for Tally {
    fn add_assign(&mut self, other: Self) {
        self.sets += other.sets;
        self.hits += other.hits;
        self.misses += other.misses;
        self.deletes += other.deletes;
    }
}

async fn stress_worker(
    cache: ExpiringCache<u64, u64>,
    keys: u64,
    ops: u64,
    pb: ProgressBar,
) -> Tally {
    let mut rng = StdRng::from_entropy();
    let mut tally = Tally::default();

    for i in 0..ops {
        let key = rng.gen_range(0..keys);
        match rng.gen_range(0..4u8) {
            0 => {
                cache.set(key, i);
                tally.sets += 1;
            }
            1 => match cache.get(&key) {
                Some(_) => tally.hits += 1,
                None => tally.misses += 1,
            },
            2 => {
                if cache.has(&key) {
                    tally.hits += 1;
                } else {
                    tally.misses += 1;
                }
            }
            _ => {
                cache.delete(&key);
                tally.deletes += 1;
            }
        }

        if i % 256 == 255 {
            pb.inc(256);
            tokio::task::yield_now().await;
        }
    }
    pb.inc(ops % 256);

    tally
}

/// Run the concurrent stress test
async fn cmd_stress(config: CacheConfig, tasks: usize, keys: u64, ops: u64, json: bool) -> Result<()> {
    anyhow::ensure!(keys > 0, "--keys must be greater than zero");

    println!(
        "{} {} tasks x {} ops over {} keys (lifetime={}ms sweep={}ms)",
        "📊 Stress:".cyan().bold(),
        tasks,
        ops,
        keys,
        config.lifetime_ms,
        config.sweep_interval_ms
    );

    let cancel = CancellationToken::new();
    let cache: ExpiringCache<u64, u64> =
        ExpiringCache::from_config(&config, cancel.clone()).context("Failed to create cache")?;

    let pb = ProgressBar::new(tasks as u64 * ops);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("   [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );

    let start = std::time::Instant::now();
    let handles: Vec<_> = (0..tasks)
        .map(|_| tokio::spawn(stress_worker(cache.clone(), keys, ops, pb.clone())))
        .collect();

    let mut total = Tally::default();
    for result in futures::future::join_all(handles).await {
        total += result.context("Stress task panicked")?;
    }
    pb.finish();
    let elapsed = start.elapsed();

    let before_sweep = cache.stats();
    tokio::time::sleep(config.lifetime() + config.sweep_interval() * 2).await;
    let after_sweep = cache.stats();
    cancel.cancel();

    let total_ops = tasks as u64 * ops;
    let rate = total_ops as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
    info!(total_ops, elapsed_ms = elapsed.as_millis() as u64, "Stress run finished");

    if json {
        let report = serde_json::json!({
            "tasks": tasks,
            "keys": keys,
            "ops_per_task": ops,
            "elapsed_ms": elapsed.as_millis() as u64,
            "ops_per_sec": rate,
            "sets": total.sets,
            "hits": total.hits,
            "misses": total.misses,
            "deletes": total.deletes,
            "entries_at_end": before_sweep.total_entries,
            "expired_at_end": before_sweep.expired_entries,
            "entries_after_sweep": after_sweep.total_entries,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n{}", "📈 Results:".green().bold());
    println!("   Throughput: {:.0} ops/sec ({:?} total)", rate, elapsed);
    println!(
        "   Sets: {}  Deletes: {}  Hits: {}  Misses: {}",
        total.sets, total.deletes, total.hits, total.misses
    );
    println!(
        "   Stored at end: {} ({} expired, {} live)",
        before_sweep.total_entries, before_sweep.expired_entries, before_sweep.live_entries
    );
    println!(
        "   {} Stored after one lifetime: {}",
        mark(after_sweep.total_entries == 0),
        after_sweep.total_entries
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cli_parses_demo_defaults() {
        let cli = Cli::try_parse_from(["ttlcache", "demo"]).unwrap();
        match cli.command {
            Commands::Demo {
                lifetime_ms,
                sweep_ms,
            } => {
                assert_eq!(lifetime_ms, 50);
                assert_eq!(sweep_ms, 10);
            }
            _ => panic!("expected demo"),
        }
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parses_stress_flags() {
        let cli = Cli::try_parse_from([
            "ttlcache", "-v", "stress", "--tasks", "2", "--keys", "4", "--ops", "100",
            "--lifetime-ms", "20", "--json",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Stress {
                tasks,
                keys,
                ops,
                lifetime_ms,
                sweep_ms,
                json,
            } => {
                assert_eq!((tasks, keys, ops), (2, 4, 100));
                assert_eq!(lifetime_ms, Some(20));
                assert_eq!(sweep_ms, None);
                assert!(json);
            }
            _ => panic!("expected stress"),
        }
    }

    #[test]
    fn test_stress_config_precedence() {
        let env = CacheConfig::default();
        let config = stress_config(env.clone(), None, None);
        assert_eq!((config.lifetime_ms, config.sweep_interval_ms), (5, 2));

        let config = stress_config(env, Some(30), Some(3));
        assert_eq!((config.lifetime_ms, config.sweep_interval_ms), (30, 3));

        let env = CacheConfig {
            lifetime_ms: 40,
            sweep_interval_ms: 4,
        };
        let config = stress_config(env, None, Some(1));
        assert_eq!((config.lifetime_ms, config.sweep_interval_ms), (40, 1));
    }

    #[test]
    fn test_tally_add_assign() {
        let mut total = Tally::default();
        total += Tally {
            sets: 1,
            hits: 2,
            misses: 3,
            deletes: 4,
        };
        total += Tally {
            sets: 1,
            hits: 1,
            misses: 1,
            deletes: 1,
        };
        assert_eq!(
            total,
            Tally {
                sets: 2,
                hits: 3,
                misses: 4,
                deletes: 5,
            }
        );
    }

    #[tokio::test]
    async fn test_stress_worker_counts_every_op() {
        let cancel = CancellationToken::new();
        let cache: ExpiringCache<u64, u64> =
            ExpiringCache::new(Duration::from_secs(60), Duration::from_secs(60), cancel.clone());
        let pb = ProgressBar::hidden();

        let tally = stress_worker(cache, 8, 1_000, pb.clone()).await;

        assert_eq!(tally.sets + tally.hits + tally.misses + tally.deletes, 1_000);
        assert_eq!(pb.position(), 1_000);
        cancel.cancel();
    }
}
