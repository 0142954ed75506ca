use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};

use crate::import::ImportResult;
use palpite_db::models::{format_numbers, Draw};
use palpite_db::usage::Quota;
use palpite_engine::analysis::NumberFrequency;
use palpite_engine::{StatisticsSnapshot, Suggestion};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Concours", "Date", "Numéros", "Somme"]);
    for draw in draws {
        table.add_row(vec![
            draw.contest_number.to_string(),
            draw.draw_date.format("%d/%m/%Y").to_string(),
            format_numbers(&draw.numbers),
            draw.sum().to_string(),
        ]);
    }

    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

fn frequency_table(title: &str, entries: &[NumberFrequency], color: Color) {
    println!("\n── {title} ──");
    let mut table = new_table(vec!["Numéro", "Fréquence"]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(format!("{:02}", entry.number)).fg(color),
            Cell::new(entry.frequency),
        ]);
    }
    println!("{table}");
}

pub fn display_stats(stats: &StatisticsSnapshot) {
    println!(
        "\n📊 Statistiques sur {} concours ({} → {})\n",
        stats.total_contests,
        stats.date_range.first.format("%d/%m/%Y"),
        stats.date_range.last.format("%d/%m/%Y"),
    );
    println!("  Numéros analysés : {}", stats.total_numbers_analyzed);
    println!("  Somme moyenne    : {:.2}", stats.average_sum);

    let parity = &stats.even_odd_distribution;
    println!(
        "  Pairs / impairs  : {} ({:.2} %) / {} ({:.2} %)",
        parity.even_count, parity.even_pct, parity.odd_count, parity.odd_pct
    );

    frequency_table("Plus fréquents", &stats.most_common_numbers, Color::Green);
    frequency_table("Moins fréquents", &stats.least_common_numbers, Color::Red);

    println!("\n── Tranches ──");
    let mut table = new_table(vec!["Tranche", "Occurrences"]);
    for bucket in &stats.range_distribution.buckets {
        table.add_row(vec![bucket.label.clone(), bucket.count.to_string()]);
    }
    println!("{table}");

    println!("\n── Classement complet ──");
    let mut table = new_table(vec!["Rang", "Numéro", "Fréquence"]);
    for (i, entry) in stats.ranking.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            format!("{:02}", entry.number),
            entry.frequency.to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_suggestions(suggestions: &[Suggestion]) {
    let Some(first) = suggestions.first() else {
        println!("Aucune suggestion.");
        return;
    };
    println!("\n🎲 Suggestions ({})\n", first.strategy.description());

    let mut table = new_table(vec!["#", "Numéros", "Score", "Chauds/Froids", "Pairs/Impairs", "Somme"]);
    for (i, sug) in suggestions.iter().enumerate() {
        let meta = &sug.metadata;
        let score_color = if meta.quality_score >= 0.7 {
            Color::Green
        } else if meta.quality_score >= 0.4 {
            Color::Yellow
        } else {
            Color::Red
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(format_numbers(&sug.numbers)),
            Cell::new(format!("{:.2}", meta.quality_score)).fg(score_color),
            Cell::new(format!("{}/{}", meta.hot_numbers_count, meta.cold_numbers_count)),
            Cell::new(format!("{}/{}", meta.even_count, meta.odd_count)),
            Cell::new(meta.sum),
        ]);
    }
    println!("{table}");
}

pub fn display_quota(user_id: &str, quota: &Quota) {
    let color = match quota {
        Quota::Unlimited => Color::Green,
        Quota::Allowed { .. } => Color::White,
        Quota::Exhausted => Color::Red,
    };
    let mut table = new_table(vec!["Utilisateur", "Suggestions"]);
    table.add_row(vec![Cell::new(user_id), Cell::new(quota).fg(color)]);
    println!("{table}");
}
