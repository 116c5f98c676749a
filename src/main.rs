use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clash_stats::config::AppConfig;
use clash_stats::ingest::{self, IngestOutcome};
use clash_stats::models::RankBadge;
use clash_stats::query::{CareerMetric, StatsService};
use clash_stats::storage::BattleStore;
use clash_stats::views::{self, LeaderboardKind, ViewParams, DEFAULT_LIMIT};

#[derive(Parser)]
#[command(name = "clash-stats")]
#[command(about = "Icon Clash battle statistics: ingestion and leaderboards")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./clash-stats.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Print views as JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    InitDb,

    /// Ingest the latest collision log
    Ingest {
        /// Ingest this log instead of the newest one
        #[arg(long)]
        log: Option<PathBuf>,
    },

    /// List battle dates, newest first
    Dates,

    /// Summary of one battle
    Battle {
        #[arg(long)]
        date: String,
    },

    /// Daily leaderboard
    Leaderboard {
        #[arg(long)]
        date: String,

        #[arg(long, value_enum, default_value = "rank")]
        by: BoardArg,

        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },

    /// One player's result in one battle
    Player {
        #[arg(long)]
        date: String,

        #[arg(long)]
        name: String,
    },

    /// All-time headline statistics
    AllTime,

    /// Cumulative leaderboard across every battle
    AllTimeLeaderboard {
        #[arg(long, value_enum, default_value = "kills")]
        by: CareerArg,

        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },

    /// A player's career and battle history
    Career {
        #[arg(long)]
        name: String,
    },

    /// Every player who has fought
    Players,

    /// Winner of every battle
    Winners,
}

#[derive(Clone, Copy, ValueEnum)]
enum BoardArg {
    Rank,
    Kills,
    Damage,
}

impl From<BoardArg> for LeaderboardKind {
    fn from(arg: BoardArg) -> Self {
        match arg {
            BoardArg::Rank => LeaderboardKind::Rank,
            BoardArg::Kills => LeaderboardKind::Kills,
            BoardArg::Damage => LeaderboardKind::Damage,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CareerArg {
    Kills,
    Damage,
}

impl From<CareerArg> for CareerMetric {
    fn from(arg: CareerArg) -> Self {
        match arg {
            CareerArg::Kills => CareerMetric::Kills,
            CareerArg::Damage => CareerMetric::Damage,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_found = cli.config.exists();
    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    let log_level = cli.log_level.clone().unwrap_or(config.log_level.clone());

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::info!("Starting clash-stats v{}", env!("CARGO_PKG_VERSION"));
    if !config_found {
        tracing::info!("No config at {}, using defaults", cli.config.display());
    }

    let db_path = config.storage().db_path();
    let service = StatsService::new(&db_path, config.cache.ttl());

    match cli.command {
        Commands::InitDb => {
            let store = BattleStore::open(&db_path)
                .with_context(|| format!("Failed to open {}", db_path.display()))?;
            store.migrate().context("Failed to create schema")?;
            println!("Database ready at {}", db_path.display());
        }

        Commands::Ingest { log } => {
            let mut store = BattleStore::open(&db_path)
                .with_context(|| format!("Failed to open {}", db_path.display()))?;
            store.migrate().context("Failed to create schema")?;

            let outcome = match log {
                Some(path) => ingest::ingest_file(&mut store, &path, &config.ingest),
                None => ingest::ingest_latest(&mut store, &config.ingest),
            }
            .context("Ingestion failed")?;
            service.invalidate();

            if cli.json {
                print_json(&outcome)?;
            } else {
                print_ingest_outcome(&outcome);
            }
        }

        Commands::Dates => {
            let dates = service.list_battle_dates()?;
            if dates.is_empty() {
                println!("No battles recorded yet.");
            } else if cli.json {
                print_json(&dates)?;
            } else {
                println!("=== Battles ({}) ===\n", dates.len());
                for date in &dates {
                    println!("  {:<18} {}", date.as_str(), date.display());
                }
            }
        }

        Commands::Battle { date } => {
            let params = ViewParams::for_date(date.as_str());
            match views::battle_overview(&service, &params)? {
                None => println!("No battle recorded for {}.", date),
                Some(view) if cli.json => print_json(&view)?,
                Some(view) => {
                    println!("=== Battle {} ===\n", view.display_date);
                    println!("Participants: {}", view.participant_count);
                    println!(
                        "Winner:       {}",
                        view.winner.as_deref().unwrap_or("(none)")
                    );
                    println!("\n{}", view.participants.join(", "));
                }
            }
        }

        Commands::Leaderboard { date, by, limit } => {
            let params = ViewParams::for_date(date.as_str())
                .with_leaderboard(by.into())
                .with_limit(limit);
            match views::daily_leaderboard(&service, &params)? {
                None => println!("No results for {}.", date),
                Some(board) if cli.json => print_json(&board)?,
                Some(board) => {
                    let stat = board.kind.stat();
                    let title = stat.map(|s| s.label()).unwrap_or("Rank");
                    println!("=== {} leaderboard, {} ===\n", title, board.display_date);
                    for row in &board.rows {
                        let value = match (stat, row.value) {
                            (Some(stat), Some(v)) => views::format_stat(stat, v),
                            _ => String::new(),
                        };
                        println!(
                            "  {} {:>3}. {:<24} {}",
                            row.badge.symbol(),
                            row.position,
                            row.player,
                            value
                        );
                    }
                }
            }
        }

        Commands::Player { date, name } => {
            let params = ViewParams::for_date(date.as_str()).with_player(name.as_str());
            match views::player_profile(&service, &params)? {
                None => println!("{} did not fight on {}.", name, date),
                Some(p) if cli.json => print_json(&p)?,
                Some(p) => {
                    println!("=== {} on {} ===\n", p.player, p.display_date);
                    println!("Rank:             {}", format_rank(p.rank, p.badge));
                    println!("Kills:            {}", p.kills);
                    println!("Deaths:           {}", p.deaths);
                    println!("Damage dealt:     {:.2}", p.damage_dealt);
                    println!("Damage received:  {:.2}", p.damage_received);
                    println!("K/D:              {:.2}", p.kill_death_ratio);
                    println!("Efficiency:       {:.2}", p.damage_efficiency);
                    if let Some(nemesis) = &p.nemesis {
                        println!("Eliminated by:    {}", nemesis);
                    }
                    if let Some(victim) = &p.victim {
                        println!("Top victim:       {}", victim);
                    }
                }
            }
        }

        Commands::AllTime => match views::all_time_overview(&service)? {
            None => println!("No battles recorded yet."),
            Some(stats) if cli.json => print_json(&stats)?,
            Some(stats) => {
                println!("=== All-time statistics ===\n");
                println!("Battles:          {}", stats.total_battles);
                println!("Players:          {}", stats.total_players);
                if let (Some(first), Some(last)) = (&stats.first_battle, &stats.last_battle) {
                    println!("Span:             {} to {}", first.display(), last.display());
                }
                println!("Total kills:      {}", stats.total_kills);
                println!("Total damage:     {:.2}", stats.total_damage);
                if let Some(l) = &stats.top_winner {
                    println!("Most wins:        {} ({})", l.player, l.value);
                }
                if let Some(l) = &stats.top_killer {
                    println!("Top killer:       {} ({})", l.player, l.value);
                }
                if let Some(l) = &stats.top_damage_dealer {
                    println!("Top damage:       {} ({:.2})", l.player, l.value);
                }
                if let Some(kd) = &stats.best_kill_death {
                    println!(
                        "Best K/D:         {} ({:.2}, {}/{})",
                        kd.player, kd.ratio, kd.kills, kd.deaths
                    );
                }
                if let Some(l) = &stats.most_active {
                    println!("Most battles:     {} ({})", l.player, l.value);
                }
                if let Some(r) = &stats.highest_kills {
                    println!(
                        "Kill record:      {} ({} on {})",
                        r.player,
                        r.value,
                        r.date.display()
                    );
                }
                if let Some(r) = &stats.highest_damage {
                    println!(
                        "Damage record:    {} ({:.2} on {})",
                        r.player,
                        r.value,
                        r.date.display()
                    );
                }
                if let Some(day) = &stats.busiest_day {
                    println!(
                        "Busiest day:      {} ({} battles)",
                        day.date.display(),
                        day.battles
                    );
                }
            }
        },

        Commands::AllTimeLeaderboard { by, limit } => {
            let params = ViewParams {
                career_metric: by.into(),
                limit,
                ..ViewParams::default()
            };
            match views::all_time_leaderboard(&service, &params)? {
                None => println!("No battles recorded yet."),
                Some(board) if cli.json => print_json(&board)?,
                Some(board) => {
                    println!("=== All-time leaderboard ===\n");
                    println!(
                        "  {:>3}  {:<24} {:>6} {:>12} {:>8}",
                        "#", "Player", "Kills", "Damage", "Battles"
                    );
                    for row in &board.rows {
                        println!(
                            "  {:>3}  {:<24} {:>6} {:>12.2} {:>8}",
                            row.position, row.player, row.total_kills, row.total_damage, row.battles
                        );
                    }
                }
            }
        }

        Commands::Career { name } => {
            let params = ViewParams::default().with_player(name.as_str());
            match views::career_profile(&service, &params)? {
                None => println!("{} has no recorded battles.", name),
                Some(c) if cli.json => print_json(&c)?,
                Some(c) => {
                    let s = &c.stats;
                    println!("=== Career: {} ===\n", s.player);
                    println!("Battles:          {}", s.battles);
                    println!("Best rank:        {}", format_rank(c.best_rank, c.best_badge));
                    println!(
                        "Kills:            {} (avg {:.2}, best {})",
                        s.total_kills, s.avg_kills, s.best_kills
                    );
                    println!("Deaths:           {} (avg {:.2})", s.total_deaths, s.avg_deaths);
                    println!(
                        "Damage dealt:     {:.2} (avg {:.2}, best {:.2})",
                        s.total_damage_dealt, s.avg_damage_dealt, s.best_damage
                    );
                    println!(
                        "Damage received:  {:.2} (avg {:.2})",
                        s.total_damage_received, s.avg_damage_received
                    );
                    println!(
                        "K/D:              {:.2} (per battle {:.2})",
                        c.total_kill_death_ratio, c.average_kill_death_ratio
                    );
                    println!("Efficiency:       {:.2}", c.damage_efficiency);

                    println!("\n--- History ---");
                    for h in &c.history {
                        println!(
                            "  {:<20} {:>6}  K {:<3} D {:<3} dealt {:>9.2}  K/D {:>6.2}  eff {:>8.2}",
                            h.display_date,
                            h.rank.map(|r| format!("#{}", r)).unwrap_or_else(|| "-".into()),
                            h.kills,
                            h.deaths,
                            h.damage_dealt,
                            h.kill_death_ratio,
                            h.damage_efficiency
                        );
                    }
                }
            }
        }

        Commands::Players => {
            let players = service.list_all_players()?;
            if players.is_empty() {
                println!("No players recorded yet.");
            } else if cli.json {
                print_json(&players)?;
            } else {
                println!("=== Players ({}) ===\n", players.len());
                for player in &players {
                    println!("  {}", player);
                }
            }
        }

        Commands::Winners => match views::daily_winners(&service)? {
            None => println!("No winners recorded yet."),
            Some(table) if cli.json => print_json(&table)?,
            Some(table) => {
                println!("=== Daily winners ===\n");
                for row in &table.rows {
                    println!(
                        "  Battle #{:<4} {:<20} {:<24} {} players",
                        row.battle_number, row.display_date, row.winner, row.participants
                    );
                }
            }
        },
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize view")?;
    println!("{}", json);
    Ok(())
}

fn format_rank(rank: Option<u32>, badge: Option<RankBadge>) -> String {
    match (rank, badge) {
        (Some(rank), Some(badge)) => format!("{} #{}", badge.symbol(), rank),
        (Some(rank), None) => format!("#{}", rank),
        _ => "unranked".to_string(),
    }
}

fn print_ingest_outcome(outcome: &IngestOutcome) {
    match outcome {
        IngestOutcome::Ingested(report) => {
            println!("\n=== Ingestion Results ===");
            println!("Log:              {}", report.path.display());
            println!("Battle:           {}", report.date.display());
            println!("Players:          {}", report.participants);
            println!(
                "Winner:           {}",
                report.winner.as_deref().unwrap_or("(none)")
            );
            println!("Ranking rows:     {}", report.ranking_rows);
            if report.skipped_rows > 0 {
                println!("Skipped rows:     {}", report.skipped_rows);
            }
        }
        IngestOutcome::NoLogFound { dir } => {
            println!("No collision logs found in {}", dir.display());
        }
        IngestOutcome::Malformed { path, reason } => {
            println!("Skipped {}: {}", path.display(), reason);
        }
    }
}
