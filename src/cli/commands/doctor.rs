//! Doctor command - verify configuration and provider access.

use crate::cli::Output;
use crate::config::{EmbeddingProvider, Prompts, Settings, HF_TOKEN_VARS};
use console::style;
use std::time::Duration;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

fn print_section(title: &str, checks: &[CheckResult]) {
    println!("{}", style(title).bold());
    for check in checks {
        check.print();
    }
    println!();
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings, config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    Output::header("vidrag doctor");
    println!();
    println!("Checking configuration and provider access...\n");

    let mut checks = Vec::new();

    let credentials = vec![check_llm_token(settings), check_embedding_token(settings)];
    print_section("Credentials", &credentials);
    checks.extend(credentials);

    let config = vec![
        check_config_file(config_path.unwrap_or_else(Settings::default_config_path)),
        check_chunking(settings),
        check_retrieval(settings),
        check_prompts(settings),
        check_static_dir(settings),
    ];
    print_section("Configuration", &config);
    checks.extend(config);

    let network = vec![
        check_reachable("YouTube", &settings.youtube.base_url).await,
        check_reachable("Chat model endpoint", &settings.llm.api_base).await,
    ];
    print_section("Connectivity", &network);
    checks.extend(network);

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using vidrag.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! vidrag is ready to use.");
    }

    Ok(())
}

/// Show the first and last few characters of a secret.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn check_llm_token(settings: &Settings) -> CheckResult {
    let name = settings
        .llm
        .api_key_env
        .clone()
        .unwrap_or_else(|| HF_TOKEN_VARS[0].to_string());
    match settings.llm_api_key() {
        Some(key) => CheckResult::ok(&name, &format!("configured ({})", mask(&key))),
        None => CheckResult::error(
            &name,
            "not set",
            &format!("Set with: export {}='hf_...' or add it to .env", name),
        ),
    }
}

fn check_embedding_token(settings: &Settings) -> CheckResult {
    let name = format!("Embeddings ({})", settings.embedding.provider);
    match (settings.embedding.provider, settings.embedding_api_key()) {
        (EmbeddingProvider::Local, _) if cfg!(feature = "candle") => {
            CheckResult::ok(&name, "runs in-process")
        }
        (EmbeddingProvider::Local, _) => CheckResult::error(
            &name,
            "not compiled in",
            "Rebuild with: cargo build --features candle",
        ),
        (_, Some(key)) => CheckResult::ok(&name, &format!("token configured ({})", mask(&key))),
        (EmbeddingProvider::HuggingFace, None) => CheckResult::warning(
            &name,
            "no token, requests will be anonymous",
            "Anonymous inference is heavily rate limited; set HF_TOKEN",
        ),
        (EmbeddingProvider::OpenAI, None) => CheckResult::error(
            &name,
            "no API key",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

fn check_config_file(path: std::path::PathBuf) -> CheckResult {
    if !path.exists() {
        return CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: vidrag config init",
        );
    }
    match Settings::load_from(Some(&path)) {
        Ok(_) => CheckResult::ok("Config file", &format!("{}", path.display())),
        Err(e) => CheckResult::error("Config file", &e.to_string(), "Fix or regenerate the file"),
    }
}

fn check_chunking(settings: &Settings) -> CheckResult {
    match settings.chunking.validate() {
        Ok(()) => CheckResult::ok(
            "Chunking",
            &format!(
                "{:?}, {} chars with {} overlap",
                settings.chunking.strategy, settings.chunking.chunk_size, settings.chunking.chunk_overlap
            ),
        ),
        Err(e) => CheckResult::error("Chunking", &e.to_string(), "Edit [chunking] in the config file"),
    }
}

fn check_retrieval(settings: &Settings) -> CheckResult {
    match settings.retrieval.validate() {
        Ok(()) => CheckResult::ok("Retrieval", &format!("top {} chunks", settings.retrieval.top_k)),
        Err(e) => CheckResult::error("Retrieval", &e.to_string(), "Edit [retrieval] in the config file"),
    }
}

fn check_prompts(settings: &Settings) -> CheckResult {
    let loaded = Prompts::load(settings.prompts.custom_dir.as_deref())
        .and_then(|p| p.answer_template().map(|_| ()));
    match (loaded, &settings.prompts.custom_dir) {
        (Ok(()), Some(dir)) => CheckResult::ok("Prompt template", &format!("custom ({})", dir)),
        (Ok(()), None) => CheckResult::ok("Prompt template", "built-in"),
        (Err(e), _) => CheckResult::error("Prompt template", &e.to_string(), "Fix rag.toml in the prompts directory"),
    }
}

fn check_static_dir(settings: &Settings) -> CheckResult {
    let dir = settings.static_dir();
    if dir.join("index.html").is_file() {
        CheckResult::ok("Frontend", &format!("{}", dir.display()))
    } else {
        CheckResult::warning(
            "Frontend",
            &format!("{} has no index.html", dir.display()),
            "The API still works; set server.static_dir to serve the web UI",
        )
    }
}

/// Any HTTP response counts as reachable.
async fn check_reachable(name: &str, url: &str) -> CheckResult {
    let client = match reqwest::Client::builder().timeout(Duration::from_secs(10)).build() {
        Ok(c) => c,
        Err(e) => return CheckResult::error(name, &e.to_string(), "Check TLS setup"),
    };
    match client.get(url).send().await {
        Ok(response) => CheckResult::ok(name, &format!("{} (HTTP {})", url, response.status().as_u16())),
        Err(e) => CheckResult::error(name, &format!("{} unreachable: {}", url, e), "Check network or proxy settings"),
    }
}
