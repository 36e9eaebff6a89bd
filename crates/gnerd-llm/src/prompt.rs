// Prompt templates for game descriptions.
//
// Builds one compact, sectioned prompt per game from the pre-computed fact
// set so the model writes about matchups and storylines rather than
// re-deriving the numbers.

use chrono::NaiveDate;

use gnerd_core::describe::{
    format_time_12_hour, ComponentFact, GameFacts, StarterFacts, TeamFacts,
};

// ---------------------------------------------------------------------------
// System prompt
// ---------------------------------------------------------------------------

/// Return the static system prompt for all game description calls.
pub fn system_prompt() -> String {
    "You write short previews of MLB games for a daily \"what to watch\" post.\n\
     \n\
     Each game comes with NERD watchability scores: pNERD rates the starting pitchers, \
     tNERD rates the teams, and gNERD (the sum of the two averages) ranks the game against the rest of the day's slate. \
     Component scores are standardized: positive means more watchable than league average.\n\
     \n\
     For each game, write one paragraph of 3-5 sentences that:\n\
     1. Says why this game is (or is not) worth watching relative to the rest of the slate\n\
     2. Names the starting pitchers and the trait that drives their score\n\
     3. Mentions a current storyline for either team if you can find one\n\
     \n\
     Be concise and conversational. Use the pre-computed numbers I provide; do NOT do arithmetic. \
     Do not list every component, and do not repeat the scores verbatim more than once."
        .to_string()
}

// ---------------------------------------------------------------------------
// Game prompt
// ---------------------------------------------------------------------------

/// Build the user prompt describing one scored game.
pub fn build_game_prompt(facts: &GameFacts) -> String {
    let mut prompt = String::with_capacity(2048);

    // Section 1: MATCHUP
    prompt.push_str(&format!(
        "## MATCHUP\n\
         {} at {}\n\
         Date: {} | First pitch: {}\n\
         gNERD: {:.1} (rank {} on the slate) | Team average: {:.1} | Pitcher average: {:.1}\n\n",
        facts.away_team.name,
        facts.home_team.name,
        format_date(facts.game_date),
        format_time_12_hour(facts.game_time),
        facts.gnerd,
        facts.rank + 1,
        facts.tnerd_average,
        facts.pnerd_average,
    ));

    // Section 2: TEAMS
    prompt.push_str("## TEAMS (tNERD)\n");
    prompt.push_str(&format_team_table(&facts.away_team, &facts.home_team));
    prompt.push('\n');

    // Section 3: STARTING PITCHERS
    prompt.push_str("## STARTING PITCHERS (pNERD)\n");
    prompt.push_str(&format_starter("Away", &facts.away_starter));
    prompt.push_str(&format_starter("Home", &facts.home_starter));
    prompt.push('\n');

    // Section 4: SLATE CONTEXT
    if let Some(slate) = &facts.slate {
        prompt.push_str(&format!(
            "## SLATE CONTEXT\n\
             Games today: {}\n\
             gNERD range: {:.1} to {:.1} (mean {:.1})\n\
             Team average range: {:.1} to {:.1} | Pitcher average range: {:.1} to {:.1}\n\n",
            slate.games,
            slate.gnerd.min,
            slate.gnerd.max,
            slate.gnerd.mean,
            slate.tnerd_average.min,
            slate.tnerd_average.max,
            slate.pnerd_average.min,
            slate.pnerd_average.max,
        ));
    }

    // Section 5: INSTRUCTIONS
    prompt.push_str(
        "## INSTRUCTIONS\n\
         Write the preview paragraph for this game. Search for recent news about both teams \
         and the starters if it helps; cite what you use.\n",
    );

    prompt
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%A, %B %-d, %Y").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn format_team_table(away: &TeamFacts, home: &TeamFacts) -> String {
    let mut out = format!(
        "| Component | {} | {} |\n|---|---|---|\n",
        away.name, home.name
    );
    for (a, h) in away.components.iter().zip(&home.components) {
        out.push_str(&format!("| {} | {:+.2} | {:+.2} |\n", a.name, a.value, h.value));
    }
    out.push_str(&format!(
        "| **tNERD** | **{:.1}** | **{:.1}** |\n",
        away.tnerd, home.tnerd
    ));
    out
}

fn format_starter(side: &str, starter: &StarterFacts) -> String {
    match (&starter.name, starter.pnerd) {
        (None, _) => format!("{side}: TBD (not yet announced)\n"),
        (Some(name), None) => {
            format!("{side}: {name} (no qualifying stats this season)\n")
        }
        (Some(name), Some(pnerd)) => {
            format!(
                "{side}: {name} | pNERD {pnerd:.1} | {}\n",
                format_components(&starter.components)
            )
        }
    }
}

fn format_components(components: &[ComponentFact]) -> String {
    components
        .iter()
        .map(|c| format!("{} {:+.2}", c.name, c.value))
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
