// Output rendering for a ranked, described slate: a JSON report and a
// markdown "what to watch" page.

use chrono::NaiveDate;
use gnerd_core::describe::{format_time_12_hour, DescriptionState};
use gnerd_core::nerd::game::{DescribedGame, SlateSummary, StarterScore};
use serde::Serialize;

/// Top-level output document.
#[derive(Debug, Serialize)]
pub struct SlateReport<'a> {
    pub date: Option<NaiveDate>,
    pub summary: Option<SlateSummary>,
    pub games: &'a [DescribedGame<'a>],
}

impl<'a> SlateReport<'a> {
    /// The slate date is taken from the first game that carries one.
    pub fn new(summary: Option<SlateSummary>, games: &'a [DescribedGame<'a>]) -> Self {
        let date = games.iter().find_map(|g| g.game.game_date);
        Self {
            date,
            summary,
            games,
        }
    }
}

pub fn render_json(report: &SlateReport<'_>) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

// ---------------------------------------------------------------------------
// Markdown
// ---------------------------------------------------------------------------

const INTRO_TEXT: &str = "Here are today's MLB games, ordered by watchability, based on how \
interesting the teams and starting pitchers look. Higher is better.";

const FOOTER_TEXT: &str = "Notes:\n\n\
- **Pitcher 'No data'**: a starter only has a pNERD score after at least one start and \
enough innings to qualify. Games with an unannounced or unqualified starter use a neutral \
stand-in for that side.";

const TABLE_HEADER: &str = "| gNERD | Time | Visitors | tNERD | Home | tNERD | Starter (V) | pNERD | Starter (H) | pNERD |";
const TABLE_SEPARATOR: &str = "|-------|------|----------|-------|------|-------|-------------|-------|-------------|-------|";

pub fn render_markdown(report: &SlateReport<'_>) -> String {
    let mut out = String::with_capacity(4096);

    out.push_str(&metadata_block(report.date));
    out.push_str("\n\n");
    out.push_str(INTRO_TEXT);
    out.push_str("\n\n");
    out.push_str(&games_table(report.games));
    out.push_str("\n\n");

    let described: Vec<&DescribedGame<'_>> = report
        .games
        .iter()
        .filter(|g| g.description.is_set())
        .collect();
    if !described.is_empty() {
        out.push_str("## Game descriptions\n\n");
        for game in described {
            out.push_str(&description_section(game));
        }
    }

    out.push_str(FOOTER_TEXT);
    out.push('\n');
    out
}

fn metadata_block(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => format!(
            "---\ntitle: \"MLB: What to watch on {}\"\ndate: {}\ntags: mlbw\n---",
            d.format("%B %-d, %Y"),
            d.format("%Y-%m-%d"),
        ),
        None => "---\ntitle: \"MLB: What to watch\"\ntags: mlbw\n---".to_string(),
    }
}

fn games_table(games: &[DescribedGame<'_>]) -> String {
    if games.is_empty() {
        return "No games available for table.".to_string();
    }
    let mut lines = vec![TABLE_HEADER.to_string(), TABLE_SEPARATOR.to_string()];
    for DescribedGame { game, .. } in games {
        lines.push(format!(
            "| {:.1} | {} | {} | {:.1} | {} | {:.1} | {} | {} | {} | {} |",
            game.gnerd,
            format_time_12_hour(game.game_time),
            game.away_team_name,
            game.away_team.tnerd,
            game.home_team_name,
            game.home_team.tnerd,
            starter_name(&game.away_starter),
            starter_score(&game.away_starter),
            starter_name(&game.home_starter),
            starter_score(&game.home_starter),
        ));
    }
    lines.join("\n")
}

fn description_section(described: &DescribedGame<'_>) -> String {
    let game = &described.game;
    let mut out = format!(
        "### {} at {}, {}\n\n",
        game.away_team_name,
        game.home_team_name,
        format_time_12_hour(game.game_time)
    );
    if let DescriptionState::Described(d) = &described.description {
        out.push_str(&d.text);
        out.push_str("\n\n");
        if !d.sources.is_empty() {
            out.push_str("Sources:\n");
            for source in &d.sources {
                out.push_str(&format!("- [{}]({})\n", source.title, source.url));
            }
            out.push('\n');
        }
    }
    out
}

fn starter_name<'a>(starter: &StarterScore<'a>) -> &'a str {
    starter.name().unwrap_or("TBD")
}

fn starter_score(starter: &StarterScore<'_>) -> String {
    starter
        .pnerd()
        .map(|p| format!("{p:.1}"))
        .unwrap_or_else(|| "No data".to_string())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
