// One run of the watchability pipeline: score the loaded inputs, rank the
// slate, attach descriptions per config, and render the output document.

use anyhow::Context;
use gnerd_core::describe::{Describer, DescriptionSource};
use gnerd_core::nerd::game::rank_slate;
use gnerd_core::nerd::pitcher::score_pitchers;
use gnerd_core::nerd::team::score_teams;
use gnerd_llm::{LlmClient, LlmDescriber};
use tracing::{info, warn};

use crate::config::{Config, DescriptionMode, OutputFormat};
use crate::data::SlateInputs;
use crate::render::{render_json, render_markdown, SlateReport};

/// Build the describer for `llm` mode from config and credentials.
pub fn llm_describer(config: &Config) -> LlmDescriber {
    let client = LlmClient::from_settings(
        config.credentials.anthropic_api_key.as_deref(),
        &config.llm,
    );
    match &client {
        LlmClient::Active(c) => {
            info!(model = c.model(), "LLM client initialized (API key configured)")
        }
        LlmClient::Disabled => {
            warn!("descriptions.mode = \"llm\" but no API key configured; descriptions will fail")
        }
    }
    LlmDescriber::new(client, config.llm.max_tokens)
}

/// Score, rank, describe and render. `describer` is consulted only in
/// `llm` mode.
pub async fn run(
    config: &Config,
    inputs: &SlateInputs,
    describer: &dyn Describer,
) -> anyhow::Result<String> {
    let pitchers = score_pitchers(&inputs.pitchers, &config.scoring.pitcher);
    let teams = score_teams(&inputs.teams, &config.scoring.team)
        .context("failed to score teams")?;
    info!(
        pitchers = pitchers.len(),
        teams = teams.len(),
        "computed entity scores"
    );

    let slate = rank_slate(&inputs.schedule, &pitchers, &teams, &config.scoring.game)
        .context("failed to rank slate")?;
    let summary = slate.summary();

    let limit = config.descriptions.limit;
    let games = match config.descriptions.mode {
        DescriptionMode::None => slate.without_descriptions(),
        DescriptionMode::Placeholder => {
            let text = config.descriptions.placeholder.clone();
            slate
                .attach_descriptions(limit, DescriptionSource::Placeholder(text))
                .await
        }
        DescriptionMode::Llm => {
            slate
                .attach_descriptions(limit, DescriptionSource::Generator(describer))
                .await
        }
    };

    let report = SlateReport::new(summary, &games);
    let rendered = match config.output.format {
        OutputFormat::Json => render_json(&report).context("failed to serialize slate")?,
        OutputFormat::Markdown => render_markdown(&report),
    };
    Ok(rendered)
}
