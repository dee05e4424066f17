//! The `meaningcheck init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("meaningcheck.toml").exists() {
        println!("meaningcheck.toml already exists, skipping.");
    } else {
        std::fs::write("meaningcheck.toml", SAMPLE_CONFIG)?;
        println!("Created meaningcheck.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit meaningcheck.toml with your chat and embedding backends");
    println!("  2. Run: meaningcheck split --meaning \"反常的，异常的；变态的\"");
    println!("  3. Run: meaningcheck check --answer 不正常 --meaning \"反常的，异常的；变态的\"");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# meaningcheck configuration

# Score (0-100) at or above which an answer passes.
pass_threshold = 80.0
# Concurrent local scoring calls per answer.
max_workers = 5
remote_timeout_secs = 30
cache_path = "./meaningcheck-cache.json"

[chat]
type = "azure"
api_key = "${AZURE_OPENAI_API_KEY}"
endpoint = "https://your-resource.openai.azure.com"
deployment = "gpt-4o"
api_version = "2024-02-15-preview"

# [chat]
# type = "openai"
# api_key = "${OPENAI_API_KEY}"
# model = "gpt-4o-mini"

[embedding]
type = "ollama"
base_url = "http://localhost:11434"
model = "bge-m3"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_parses() {
        let config = meaningcheck_providers::config::parse_config(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.pass_threshold, 80.0);
        assert_eq!(config.max_workers, 5);
    }
}
