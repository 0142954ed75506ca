mod display;
mod import;
mod settings;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};

use palpite_db::config::GameConfig;
use palpite_db::db::{count_draws, db_path, fetch_history, fetch_last_draws, has_contest, insert_draw, latest_draw, migrate, open_db};
use palpite_db::models::{parse_date, parse_numbers, validate_numbers, Draw};
use palpite_db::rusqlite::Connection;
use palpite_db::usage::{check_and_increment, remaining, set_premium, Quota};
use palpite_engine::pipeline::{analyze, SuggestionRequest, DEFAULT_SUGGESTIONS_COUNT};
use palpite_engine::{compute_statistics, Strategy};
use crate::display::{
    display_draws, display_import_summary, display_quota, display_stats, display_suggestions,
};
use crate::settings::Settings;

const EMPTY_DB: &str = "Base vide. Lancez d'abord : palpite import";

#[derive(Parser)]
#[command(name = "palpite", about = "Statistiques de loterie et suggestions de grilles")]
struct Cli {
    /// Base SQLite (défaut : ./data/palpite.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Fichier de configuration JSON (jeu + réglages des stratégies)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer les tirages depuis un fichier CSV
    Import {
        /// Chemin vers le fichier CSV
        #[arg(short, long)]
        file: PathBuf,

        /// Séparateur de colonnes
        #[arg(short, long, default_value_t = ';')]
        delimiter: char,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Afficher le dernier tirage enregistré
    Latest,

    /// Afficher les statistiques de tout l'historique
    Stats {
        /// Sortie JSON
        #[arg(long)]
        json: bool,
    },

    /// Suggérer des grilles
    Suggest {
        /// Stratégie de génération
        #[arg(short, long, value_enum, default_value_t = Strategy::Balanced)]
        strategy: Strategy,

        /// Nombre de grilles à suggérer
        #[arg(short, long, default_value_t = DEFAULT_SUGGESTIONS_COUNT)]
        count: usize,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,

        /// Identifiant utilisateur soumis au quota journalier
        #[arg(short, long)]
        user: Option<String>,

        /// Sortie JSON
        #[arg(long)]
        json: bool,
    },

    /// Ajouter un tirage manuellement
    Add,

    /// Afficher le quota restant d'un utilisateur
    Usage {
        #[arg(short, long)]
        user: String,
    },

    /// Passer un utilisateur en premium
    Premium {
        #[arg(short, long)]
        user: String,

        /// Durée de l'abonnement en jours (illimitée si absent)
        #[arg(short, long)]
        days: Option<i64>,
    },

    /// Afficher la configuration effective
    Config {
        /// Écrire la configuration du jeu dans ce fichier JSON
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let settings = Settings::resolve(cli.config.as_deref())?;

    let path = cli.db.unwrap_or_else(db_path);
    if let Command::DbPath = cli.command {
        println!("{}", path.display());
        return Ok(());
    }
    if let Command::Config { save } = &cli.command {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        if let Some(out) = save {
            settings.game.save(out)?;
            println!("Configuration du jeu écrite dans {}", out.display());
        }
        return Ok(());
    }

    let conn = open_db(&path)?;
    migrate(&conn)?;
    log::debug!("Base ouverte : {}", path.display());

    match cli.command {
        Command::Import { file, delimiter } => cmd_import(&conn, &file, &settings.game, delimiter),
        Command::List { last } => cmd_list(&conn, last, &settings.game),
        Command::Latest => cmd_latest(&conn, &settings.game),
        Command::Stats { json } => cmd_stats(&conn, &settings, json),
        Command::Suggest {
            strategy,
            count,
            seed,
            user,
            json,
        } => {
            let request = SuggestionRequest { strategy, count, seed };
            cmd_suggest(&conn, &settings, &request, user.as_deref(), json)
        }
        Command::Add => cmd_add(&conn, &settings.game),
        Command::Usage { user } => cmd_usage(&conn, &user, &settings),
        Command::Premium { user, days } => cmd_premium(&conn, &user, days),
        Command::DbPath | Command::Config { .. } => Ok(()),
    }
}

fn cmd_import(conn: &Connection, file: &Path, config: &GameConfig, delimiter: char) -> Result<()> {
    if !delimiter.is_ascii() {
        bail!("Le séparateur doit être un caractère ASCII");
    }
    let result = import::import_csv(conn, file, config, delimiter as u8)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32, config: &GameConfig) -> Result<()> {
    let n = count_draws(conn)?;
    if n == 0 {
        println!("{EMPTY_DB}");
        return Ok(());
    }
    let draws = fetch_last_draws(conn, last, config)?;
    display_draws(&draws);
    Ok(())
}

fn cmd_latest(conn: &Connection, config: &GameConfig) -> Result<()> {
    match latest_draw(conn, config)? {
        Some(draw) => display_draws(std::slice::from_ref(&draw)),
        None => println!("{EMPTY_DB}"),
    }
    Ok(())
}

fn cmd_stats(conn: &Connection, settings: &Settings, json: bool) -> Result<()> {
    let history = fetch_history(conn, &settings.game)?;
    let stats = compute_statistics(&history, &settings.game, &settings.tuning)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    match stats.snapshot() {
        Some(snapshot) => display_stats(snapshot),
        None => println!("{EMPTY_DB}"),
    }
    Ok(())
}

fn cmd_suggest(
    conn: &Connection,
    settings: &Settings,
    request: &SuggestionRequest,
    user: Option<&str>,
    json: bool,
) -> Result<()> {
    let history = fetch_history(conn, &settings.game)?;
    if history.is_empty() {
        println!("{EMPTY_DB}");
        return Ok(());
    }

    let report = analyze(&history, &settings.game, &settings.tuning, request)?;

    // Le quota n'est débité qu'une fois les grilles produites.
    let quota = match user {
        Some(user_id) => {
            let quota = check_and_increment(conn, user_id, Utc::now(), &settings.rate_limit)?;
            if !quota.is_allowed() {
                bail!(
                    "Limite de {} suggestion(s) par jour atteinte pour {}",
                    settings.rate_limit.suggestions_per_day,
                    user_id
                );
            }
            Some(quota)
        }
        None => None,
    };

    if json {
        let out = serde_json::json!({
            "strategy": request.strategy,
            "quota": quota,
            "suggestions": report.suggestions,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    display_suggestions(&report.suggestions);
    if let (Some(user_id), Some(quota)) = (user, quota) {
        display_quota(user_id, &quota);
    }
    Ok(())
}

fn cmd_usage(conn: &Connection, user: &str, settings: &Settings) -> Result<()> {
    let quota = remaining(conn, user, Utc::now(), &settings.rate_limit)?;
    display_quota(user, &quota);
    Ok(())
}

fn cmd_premium(conn: &Connection, user: &str, days: Option<i64>) -> Result<()> {
    let expires_at = match days {
        Some(d) if d <= 0 => bail!("La durée doit être positive"),
        Some(d) => Some(Utc::now() + Duration::days(d)),
        None => None,
    };
    set_premium(conn, user, expires_at)?;
    match expires_at {
        Some(at) => println!("{} est premium jusqu'au {}.", user, at.format("%d/%m/%Y")),
        None => println!("{} est premium sans échéance.", user),
    }
    display_quota(user, &Quota::Unlimited);
    Ok(())
}

fn cmd_add(conn: &Connection, config: &GameConfig) -> Result<()> {
    println!("Ajout d'un tirage manuellement\n");

    let raw_contest = prompt("Numéro du concours (ex: 3050) : ")?;
    let contest_number: u32 = raw_contest
        .parse()
        .with_context(|| format!("Numéro de concours invalide : '{}'", raw_contest))?;
    if has_contest(conn, contest_number)? {
        println!("Le concours {} existe déjà.", contest_number);
        return Ok(());
    }

    let raw_date = prompt("Date (JJ/MM/AAAA) : ")?;
    let draw_date = parse_date(&raw_date)?;

    let numbers = prompt_numbers(config)?;
    let draw = Draw::new(contest_number, draw_date, numbers, config)?;

    println!("\nTirage à insérer :");
    display_draws(std::slice::from_ref(&draw));

    let confirm = prompt("\nConfirmer l'insertion ? (o/n) : ")?;
    if confirm.trim().to_lowercase() == "o" {
        let inserted = insert_draw(conn, &draw)?;
        if inserted {
            println!("Tirage inséré avec succès.");
        } else {
            println!("Ce tirage existe déjà (doublon ignoré).");
        }
    } else {
        println!("Insertion annulée.");
    }

    Ok(())
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    Ok(input.trim().to_string())
}

fn prompt_numbers(config: &GameConfig) -> Result<Vec<u8>> {
    let msg = format!(
        "{} numéros (séparés par des espaces, {}-{}) : ",
        config.numbers_per_game, config.min_number, config.max_number
    );
    loop {
        let input = prompt(&msg)?;
        if input.is_empty() {
            bail!("Saisie interrompue");
        }
        match parse_numbers(&input).and_then(|v| validate_numbers(&v, config).map(|_| v)) {
            Ok(v) => return Ok(v),
            Err(e) => println!("{e}. Réessayez."),
        }
    }
}
