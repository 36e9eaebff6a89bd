// Integration tests for the gNERD app.
//
// These exercise the full pipeline through the library crate's public API:
// fixture CSV/JSON loading, pitcher and team scoring, slate ranking,
// description attachment in every mode, and both output renderers.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use gnerd_app::config::*;
use gnerd_app::data::{self, SlateInputs};
use gnerd_app::pipeline;
use gnerd_core::config::ScoringConfig;
use gnerd_core::describe::{Description, Describer, GameFacts};
use gnerd_core::error::DescriptionError;
use gnerd_llm::LlmSettings;
use serde_json::Value;

// ===========================================================================
// Test helpers
// ===========================================================================

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn inline_config(mode: DescriptionMode, limit: usize, format: OutputFormat) -> Config {
    Config {
        scoring: ScoringConfig::default(),
        descriptions: DescriptionSettings {
            mode,
            limit,
            placeholder: "Placeholder text.".into(),
        },
        output: OutputSettings { format },
        llm: LlmSettings::default(),
        credentials: CredentialsConfig::default(),
        data_paths: DataPaths {
            pitchers: "pitchers.csv".into(),
            teams: "teams.csv".into(),
            schedule: "schedule.json".into(),
        },
    }
}

fn load_fixture_inputs() -> SlateInputs {
    let config = inline_config(DescriptionMode::None, 0, OutputFormat::Json);
    data::load_all(&config.data_paths.resolve(&fixtures())).expect("fixtures should load")
}

/// Describer that counts calls and fails on the listed call indices.
struct StubDescriber {
    calls: AtomicUsize,
    fail_on: Vec<usize>,
}

impl StubDescriber {
    fn new(fail_on: Vec<usize>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on,
        }
    }
}

#[async_trait]
impl Describer for StubDescriber {
    async fn describe(&self, facts: &GameFacts) -> Result<Description, DescriptionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.contains(&call) {
            return Err(DescriptionError::Request("rate limited".into()));
        }
        Ok(Description {
            text: format!("{} visit {}.", facts.away_team.name, facts.home_team.name),
            sources: vec![],
        })
    }
}

async fn run_json(config: &Config, describer: &dyn Describer) -> Value {
    let inputs = load_fixture_inputs();
    let out = pipeline::run(config, &inputs, describer)
        .await
        .expect("pipeline should succeed");
    serde_json::from_str(&out).expect("output should be JSON")
}

fn games(v: &Value) -> &Vec<Value> {
    v["games"].as_array().expect("games array")
}

// ===========================================================================
// Loading
// ===========================================================================

#[test]
fn fixtures_load_completely() {
    let inputs = load_fixture_inputs();
    assert_eq!(inputs.pitchers.len(), 11);
    assert_eq!(inputs.teams.len(), 8);
    assert_eq!(inputs.schedule.len(), 5);
}

// ===========================================================================
// Scoring and ranking
// ===========================================================================

#[tokio::test]
async fn slate_is_ranked_by_gnerd_descending() {
    let config = inline_config(DescriptionMode::None, 0, OutputFormat::Json);
    let v = run_json(&config, &StubDescriber::new(vec![])).await;
    let games = games(&v);
    assert_eq!(games.len(), 5);

    let scores: Vec<f64> = games.iter().map(|g| g["gnerd"].as_f64().unwrap()).collect();
    for w in scores.windows(2) {
        assert!(w[0] >= w[1], "not sorted: {scores:?}");
    }
    for g in games {
        let p = g["pnerd_average"].as_f64().unwrap();
        let t = g["tnerd_average"].as_f64().unwrap();
        assert!((g["gnerd"].as_f64().unwrap() - (p + t)).abs() < 1e-9);
    }
    // Two elite starters with a strong home team top the day.
    assert_eq!(games[0]["away_team_name"], "Pittsburgh Pirates");
    assert_eq!(games[0]["home_team_name"], "Detroit Tigers");
}

#[tokio::test]
async fn starters_resolve_or_report_no_data() {
    let config = inline_config(DescriptionMode::None, 0, OutputFormat::Json);
    let v = run_json(&config, &StubDescriber::new(vec![])).await;
    let find = |away: &str| {
        games(&v)
            .iter()
            .find(|g| g["away_team_name"] == away)
            .cloned()
            .unwrap()
    };

    // Accent-free and suffix-free schedule names still match.
    let hou = find("Houston Astros");
    assert_eq!(hou["away_starter"]["status"], "scored");
    assert_eq!(hou["away_starter"]["stats"]["name"], "Luis García Jr.");
    assert_eq!(hou["home_starter"]["stats"]["name"], "José Berríos");

    // Under the innings threshold: named, but no pNERD, substitute applies.
    let mia = find("Miami Marlins");
    assert_eq!(mia["away_starter"]["status"], "no_data");
    assert_eq!(mia["away_starter"]["name"], "Ryan Weathers");
    let webb = mia["home_starter"]["stats"]["pnerd"].as_f64().unwrap();
    let avg = mia["pnerd_average"].as_f64().unwrap();
    assert!((avg - (webb + 5.0) / 2.0).abs() < 1e-9);

    // TBD starter is unannounced.
    let mia_at_pit = find("MIA");
    assert_eq!(mia_at_pit["home_starter"]["status"], "unannounced");
}

#[tokio::test]
async fn every_score_satisfies_sum_invariant() {
    let config = inline_config(DescriptionMode::None, 0, OutputFormat::Json);
    let v = run_json(&config, &StubDescriber::new(vec![])).await;
    for g in games(&v) {
        for side in ["away_team", "home_team"] {
            let t = &g[side];
            let sum: f64 = t["components"]
                .as_object()
                .unwrap()
                .values()
                .map(|c| c.as_f64().unwrap())
                .sum();
            let total = t["tnerd"].as_f64().unwrap();
            assert!((total - (sum + t["constant"].as_f64().unwrap())).abs() < 1e-9);
            assert!(t["components"]["payroll"].as_f64().unwrap() >= 0.0);
            assert!((0.0..=2.0).contains(&t["components"]["luck"].as_f64().unwrap()));
        }
        for side in ["away_starter", "home_starter"] {
            let s = &g[side];
            if s["status"] != "scored" {
                continue;
            }
            let c = &s["stats"]["components"];
            assert!((0.0..=2.0).contains(&c["velocity"].as_f64().unwrap()));
            assert!((0.0..=2.0).contains(&c["age"].as_f64().unwrap()));
            assert!((0.0..=1.0).contains(&c["luck"].as_f64().unwrap()));
        }
    }
}

// ===========================================================================
// Descriptions
// ===========================================================================

#[tokio::test]
async fn placeholder_mode_describes_top_game_only() {
    let config = inline_config(DescriptionMode::Placeholder, 1, OutputFormat::Json);
    let stub = StubDescriber::new(vec![]);
    let v = run_json(&config, &stub).await;
    let games = games(&v);

    assert_eq!(games[0]["description"]["status"], "described");
    assert_eq!(games[0]["description"]["text"], "Placeholder text.");
    for g in &games[1..] {
        assert_eq!(g["description"]["status"], "unset");
    }
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn llm_mode_calls_generator_for_limit_games() {
    let config = inline_config(DescriptionMode::Llm, 3, OutputFormat::Json);
    let stub = StubDescriber::new(vec![1]);
    let v = run_json(&config, &stub).await;
    let games = games(&v);

    assert_eq!(stub.calls.load(Ordering::SeqCst), 3);
    assert_eq!(games[0]["description"]["status"], "described");
    assert_eq!(games[1]["description"]["status"], "failed");
    assert_eq!(
        games[1]["description"]["reason"],
        "description request failed: rate limited"
    );
    assert_eq!(games[2]["description"]["status"], "described");
    assert_eq!(games[3]["description"]["status"], "unset");
    assert_eq!(games[4]["description"]["status"], "unset");
}

#[tokio::test]
async fn llm_mode_without_key_marks_games_failed() {
    let config = inline_config(DescriptionMode::Llm, 2, OutputFormat::Json);
    let describer = pipeline::llm_describer(&config);
    let v = run_json(&config, &describer).await;
    let games = games(&v);

    assert_eq!(games[0]["description"]["status"], "failed");
    assert_eq!(
        games[0]["description"]["reason"],
        "description generation is not configured"
    );
    assert_eq!(games[1]["description"]["status"], "failed");
    assert_eq!(games[2]["description"]["status"], "unset");
}

#[tokio::test]
async fn none_mode_leaves_everything_unset() {
    let config = inline_config(DescriptionMode::None, 5, OutputFormat::Json);
    let stub = StubDescriber::new(vec![]);
    let v = run_json(&config, &stub).await;
    assert!(games(&v)
        .iter()
        .all(|g| g["description"]["status"] == "unset"));
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

// ===========================================================================
// Output and errors
// ===========================================================================

#[tokio::test]
async fn markdown_output_lists_every_game() {
    let config = inline_config(DescriptionMode::Placeholder, 1, OutputFormat::Markdown);
    let inputs = load_fixture_inputs();
    let md = pipeline::run(&config, &inputs, &StubDescriber::new(vec![]))
        .await
        .unwrap();

    assert!(md.contains("MLB: What to watch on July 27, 2025"));
    assert_eq!(md.matches("\n| ").count(), 6, "header plus five game rows");
    assert!(md.contains("| Ryan Weathers | No data |"));
    assert!(md.contains("## Game descriptions"));
    assert!(md.contains("Placeholder text."));
}

#[tokio::test]
async fn unknown_team_fails_the_run() {
    let mut inputs = load_fixture_inputs();
    inputs.schedule[0].home_team = "Montreal Expos".into();
    let config = inline_config(DescriptionMode::None, 0, OutputFormat::Json);
    let err = pipeline::run(&config, &inputs, &StubDescriber::new(vec![]))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("Montreal Expos"));
}

#[tokio::test]
async fn incomplete_team_record_fails_the_run() {
    let mut inputs = load_fixture_inputs();
    inputs.teams[2].payroll = None;
    let config = inline_config(DescriptionMode::None, 0, OutputFormat::Json);
    let err = pipeline::run(&config, &inputs, &StubDescriber::new(vec![]))
        .await
        .unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("PHI"));
    assert!(msg.contains("payroll"));
}

#[test]
fn malformed_team_file_fails_loading() {
    let dir = std::env::temp_dir().join("gnerd_malformed_teams");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    for name in ["pitchers.csv", "schedule.json"] {
        std::fs::copy(fixtures().join(name), dir.join(name)).unwrap();
    }
    let teams = std::fs::read_to_string(fixtures().join("teams.csv")).unwrap();
    let broken = teams.replacen("107.9", "n/a", 1);
    assert_ne!(teams, broken, "fixture payroll cell should be replaced");
    std::fs::write(dir.join("teams.csv"), broken).unwrap();

    let config = inline_config(DescriptionMode::None, 0, OutputFormat::Json);
    let err = data::load_all(&config.data_paths.resolve(&dir)).unwrap_err();
    assert!(matches!(err, data::DataError::Csv { .. }), "unexpected error: {err}");

    let _ = std::fs::remove_dir_all(&dir);
}
