//! Dialogue Simulator Entry Point
//!
//! Runs a batch of episodes with the uniform reference policy and logs
//! per-episode outcomes and a summary.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use dialogue_sim_config::{constants::env, load_settings, Settings};
use dialogue_sim_core::DialogueStatus;
use dialogue_sim_engine::{DialogueDomain, DialogueEnv, EnvConfig, LanguageUnits, RandomPolicy};

fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env_name = std::env::var(env::ENV_NAME).ok();
    let config = match load_settings(env_name.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing(&config);

    tracing::info!("Starting dialogue simulator v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config_path = env_name.as_deref().unwrap_or("default"),
        max_nb_turns = config.simulation.max_nb_turns,
        mode = ?config.simulation.simulation_mode,
        episodes = config.runner.episodes,
        "Configuration loaded"
    );

    let domain = DialogueDomain::load(&config.data).context("loading dialogue domain")?;
    let catalog = domain
        .action_catalog(&config.data)
        .context("building action catalog")?;
    tracing::info!(actions = catalog.len(), "Action catalog ready");

    let env_config = EnvConfig::from_settings(&config);
    let mut dialogue_env = DialogueEnv::new(&domain, env_config, LanguageUnits::act_codec())
        .context("creating dialogue environment")?;
    let mut policy = RandomPolicy::new(config.simulation.seed.unwrap_or(0));

    let episodes = config.runner.episodes;
    let mut successes = 0u32;
    let mut total_reward = 0.0f64;
    let mut total_turns = 0u64;

    for episode in 0..episodes {
        let mut state = dialogue_env.reset()?;
        loop {
            let action = policy.act(&state, &catalog)?;
            let result = dialogue_env.step(&action)?;
            state = result.state;
            if result.done {
                break;
            }
        }

        if dialogue_env.status() == DialogueStatus::Success {
            successes += 1;
        }
        total_reward += dialogue_env.cumulative_reward();
        total_turns += u64::from(dialogue_env.turn());

        tracing::debug!(
            episode = episode,
            episode_id = %dialogue_env.episode_id(),
            status = %dialogue_env.status(),
            turns = dialogue_env.turn(),
            reward = dialogue_env.cumulative_reward(),
            "Episode complete"
        );
    }

    if episodes > 0 {
        let n = f64::from(episodes);
        tracing::info!(
            episodes = episodes,
            success_rate = f64::from(successes) / n,
            mean_reward = total_reward / n,
            mean_turns = total_turns as f64 / n,
            "Simulation finished"
        );
    }

    Ok(())
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("dialogue_sim={}", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
