use mentor_config::{Config, EstimatorKind, ProviderConfig};
use mentor_core::prompt::MENTOR_PERSONA;

/// Strategy for displaying configuration information.
///
/// Prints the provider endpoint (API key masked), agent defaults and memory
/// budget settings.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        println!("=== mentor Configuration ===\n");

        println!("Provider:");
        println!("  Base URL: {}", config.providers.openai.base_url);
        println!("  API Key: {}", describe_api_key(&config.providers.openai));
        println!(
            "  Request Timeout: {}s",
            config.providers.openai.request_timeout_secs
        );
        println!(
            "  Retry Delays: {:?}s",
            config.providers.openai.retry_delays_secs
        );
        println!();

        let defaults = &config.agents.defaults;
        println!("Agent Defaults:");
        println!("  Model: {}", defaults.model);
        println!("  Max Tokens: {}", defaults.max_tokens);
        println!("  Temperature: {}", defaults.temperature);
        if defaults.persona() == MENTOR_PERSONA {
            println!("  Persona: (built-in CBT/DBT mentor)");
        } else {
            println!("  Persona: {}", truncate(defaults.persona(), 60));
        }
        println!();

        println!("Memory:");
        println!("  Token Budget: {}", config.memory.token_budget);
        match config.memory.estimator {
            EstimatorKind::ApproxTokens => println!(
                "  Estimator: approx tokens ({} chars per token)",
                config.memory.chars_per_token
            ),
            EstimatorKind::Chars => println!("  Estimator: character count"),
        }

        Ok(())
    }
}

fn describe_api_key(provider: &ProviderConfig) -> String {
    provider
        .api_key()
        .map_or_else(|_| "(not set)".to_string(), |key| mask_key(&key))
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "***".to_string()
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
