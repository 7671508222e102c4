// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::cli::{Cli, Commands, ConfigAction, GenerateArgs};
use crate::config::Config;
use crate::domain::{ProviderKind, RangeSpec, UsageStats};
use crate::error::{Error, Result};
use crate::services::{
    changelog::{AssemblyOptions, ChangelogAssembler, ReleaseHeader},
    git::{GitService, ResolveOptions},
    orchestrator::Orchestrator,
    secrets::{LayeredSecretStore, SecretStore},
};

/// Release notes plus what went into them.
#[derive(Debug, Clone)]
pub struct Generated {
    pub text: String,
    pub range: RangeSpec,
    pub commits: usize,
    pub entries: usize,
    pub provider: ProviderKind,
}

pub struct App {
    cli: Cli,
    config: Config,
    secrets: Arc<dyn SecretStore>,
}

impl App {
    pub fn new(cli: Cli) -> Result<Self> {
        let config = Config::load(&cli)?;
        debug!(
            primary = %config.primary_provider,
            fallback = ?config.fallback_provider,
            style = %config.style,
            "config loaded"
        );
        Ok(Self::with_parts(cli, config, Arc::new(LayeredSecretStore::new())))
    }

    /// Assemble an app from already-loaded pieces.
    pub fn with_parts(cli: Cli, config: Config, secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            cli,
            config,
            secrets,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        match self.cli.command.take() {
            Some(cmd) => self.handle_command(cmd).await,
            None => self.preview(&GenerateArgs::default()).await,
        }
    }

    async fn handle_command(&self, cmd: Commands) -> Result<()> {
        match cmd {
            Commands::Generate(args) => self.write_notes(&args).await,
            Commands::Preview(args) => self.preview(&args).await,
            Commands::Providers => self.show_providers().await,
            Commands::Test { provider } => self.test_provider(provider).await,
            #[cfg(feature = "secure-storage")]
            Commands::SetKey { provider } => self.set_api_key(provider).await,
            Commands::GetKey { provider } => self.get_api_key(provider).await,
            Commands::SetPrimary { provider } => {
                let path = Config::update("primary_provider", provider.as_str())?;
                self.print_done(&format!(
                    "Primary provider set to {provider} ({})",
                    path.display()
                ));
                Ok(())
            }
            Commands::SetFallback { provider } => {
                let path = Config::update("fallback_provider", provider.as_str())?;
                self.print_done(&format!(
                    "Fallback provider set to {provider} ({})",
                    path.display()
                ));
                Ok(())
            }
            Commands::SetModel { provider, model } => self.set_model(provider, &model),
            Commands::Config { action: None } => {
                self.show_config();
                Ok(())
            }
            Commands::Config {
                action: Some(ConfigAction::Set { key, value }),
            } => {
                let path = Config::update(&key, &value)?;
                self.print_done(&format!("{key} updated in {}", path.display()));
                Ok(())
            }
            Commands::Init => {
                let path = Config::create_default()?;
                println!("Created config: {}", path.display());
                Ok(())
            }
            Commands::Completions { shell } => {
                let mut cmd = <Cli as clap::CommandFactory>::command();
                clap_complete::generate(shell, &mut cmd, "changewise", &mut std::io::stdout());
                Ok(())
            }
        }
    }

    async fn orchestrator(&self) -> Result<Orchestrator> {
        Orchestrator::from_config(&self.config, Arc::clone(&self.secrets)).await
    }

    // ─── Generation ───

    fn assembly_options(&self, args: &GenerateArgs) -> AssemblyOptions {
        let mut options = AssemblyOptions::from_config(&self.config);
        if !args.types.is_empty() {
            options.included_types = args.types.clone();
        }
        options.skip_formatting |= args.skip_formatting;
        options.group_by_author |= args.group_by_author;
        options
    }

    /// Resolve the range, classify every commit, and render the notes.
    /// Nothing is written to disk.
    pub async fn generate(&self, args: &GenerateArgs) -> Result<Generated> {
        let spec = args.range_parts().into_spec(&self.config.range_defaults())?;

        let mut options = ResolveOptions::from_config(&self.config);
        options.include_merge_commits |= args.include_merges;
        let git = GitService::open(&self.cli.repo, options)?;

        self.print_status(&format!("Reading commits ({spec})..."));
        let commits = git.resolve(&spec).await?;
        debug!(count = commits.len(), "commits resolved");

        let orchestrator = self.orchestrator().await?;
        let provider = orchestrator.active_provider().await;
        self.print_status(&format!(
            "Classifying {} commits with {provider}...",
            commits.len()
        ));

        let bar = Self::progress_bar(commits.len());
        let entries = orchestrator
            .process_with_progress(&commits, self.config.style, |done| {
                bar.set_position(done as u64)
            })
            .await;
        bar.finish_and_clear();

        let assembler = ChangelogAssembler::new(self.assembly_options(args));
        let entries = assembler.filter(entries);
        let summary = orchestrator.summarize(&entries, self.config.style).await;

        let range = spec.to_string();
        let text = assembler.render(
            &ReleaseHeader {
                date: Local::now().date_naive(),
                range: &range,
                summary: &summary,
            },
            &entries,
        );

        if self.cli.verbose {
            Self::print_usage(&orchestrator.usage_statistics().await);
        }

        Ok(Generated {
            text,
            range: spec,
            commits: commits.len(),
            entries: entries.len(),
            provider,
        })
    }

    async fn preview(&self, args: &GenerateArgs) -> Result<()> {
        let generated = self.generate(args).await?;
        println!("{}", generated.text);
        Ok(())
    }

    async fn write_notes(&self, args: &GenerateArgs) -> Result<()> {
        let generated = self.generate(args).await?;

        let target: PathBuf = args
            .output
            .clone()
            .unwrap_or_else(|| self.config.output_file.clone());
        if let Some(dir) = target.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&target, &generated.text)?;

        self.print_done(&format!(
            "{} entries from {} commits written to {}",
            generated.entries,
            generated.commits,
            target.display()
        ));
        Ok(())
    }

    fn progress_bar(len: usize) -> ProgressBar {
        if !std::io::stderr().is_terminal() {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        bar.set_style(
            ProgressStyle::with_template("  {bar:30.cyan/blue} {pos}/{len} commits")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    }

    // ─── Providers ───

    async fn show_providers(&self) -> Result<()> {
        let orchestrator = self.orchestrator().await?;
        let active = orchestrator.active_provider().await;

        eprintln!("{}", style("Providers").bold().underlined());
        for descriptor in orchestrator.provider_statuses().await {
            let marker = if descriptor.name == active { "*" } else { " " };
            let state = if descriptor.configured {
                style("configured").green()
            } else {
                style("not configured").yellow()
            };
            let mut role = String::new();
            if descriptor.name == self.config.primary_provider {
                role.push_str(" (primary)");
            } else if Some(descriptor.name) == self.config.fallback_provider {
                role.push_str(" (fallback)");
            }
            eprintln!(
                " {marker} {:<10} {:<28} {state}{role}",
                descriptor.name.as_str(),
                descriptor.model,
            );
        }
        eprintln!();
        self.print_info(&format!("Next request goes to {active}"));
        Ok(())
    }

    async fn test_provider(&self, provider: ProviderKind) -> Result<()> {
        let orchestrator = self.orchestrator().await?;
        eprint!("  {provider}: ");
        let report = orchestrator.test_connectivity(provider).await;
        if report.success {
            eprintln!("{}", style("OK").green().bold());
            Ok(())
        } else {
            let reason = report.error.unwrap_or_else(|| "unknown error".into());
            eprintln!("{}", style("FAILED").red().bold());
            Err(Error::provider(provider.as_str(), reason))
        }
    }

    #[cfg(feature = "secure-storage")]
    async fn set_api_key(&self, provider: ProviderKind) -> Result<()> {
        if !provider.is_hosted() {
            return Err(Error::Config(format!(
                "Keyring storage is only for hosted providers (openai, anthropic, gemini), got '{provider}'"
            )));
        }

        eprintln!(
            "Enter API key for {} (input will be hidden):",
            style(provider.as_str()).bold()
        );

        let key = dialoguer::Password::new()
            .with_prompt("API key")
            .interact()?;

        if key.trim().is_empty() {
            return Err(Error::Config("API key cannot be empty".into()));
        }

        let orchestrator = self.orchestrator().await?;
        orchestrator
            .set_credential(provider, secrecy::SecretString::from(key))
            .await?;

        self.print_done(&format!("API key stored for {provider}"));
        Ok(())
    }

    async fn get_api_key(&self, provider: ProviderKind) -> Result<()> {
        if !provider.is_hosted() {
            self.print_info(&format!("{provider} needs no API key"));
            return Ok(());
        }

        match self.secrets.get(provider).await? {
            Some(_) => self.print_done(&format!("API key for {provider} is available")),
            None => self.print_warning(&format!("No API key found for {provider}")),
        }
        Ok(())
    }

    fn set_model(&self, provider: ProviderKind, model: &str) -> Result<()> {
        if !provider.is_hosted() {
            return Err(Error::Config(format!("{provider} has no selectable model")));
        }
        let model = model.trim();
        if model.is_empty() {
            return Err(Error::Config("model name cannot be empty".into()));
        }
        if !provider.available_models().contains(&model) {
            self.print_warning(&format!("'{model}' is not a known {provider} model"));
        }

        let path = Config::update(&format!("providers.{provider}.model"), model)?;
        self.print_done(&format!(
            "{provider} will use {model} ({})",
            path.display()
        ));
        Ok(())
    }

    // ─── Output ───

    fn show_config(&self) {
        let c = &self.config;
        println!("Style: {}", c.style);
        println!("Default commit count: {}", c.default_commit_count);
        println!(
            "Included types: {}",
            c.included_types
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("Skip formatting commits: {}", c.skip_formatting_commits);
        println!("Group by author: {}", c.group_by_author);
        println!("Comparison strategy: {}", c.comparison_strategy);
        println!("Base branch: {}", c.base_branch);
        println!("Include merge commits: {}", c.include_merge_commits);
        println!("Include unmerged: {}", c.include_unmerged);
        println!("Primary provider: {}", c.primary_provider);
        println!(
            "Fallback provider: {}",
            c.fallback_provider
                .map(|p| p.to_string())
                .unwrap_or_else(|| "none".into())
        );
        println!("Temperature: {}", c.temperature);
        println!("Max tokens: {}", c.max_output_tokens);
        println!("Timeout: {}s", c.timeout_secs);
        println!("Max diff lines: {}", c.max_diff_lines);
        println!("Output file: {}", c.output_file.display());
        println!();
        for kind in ProviderKind::HOSTED {
            println!("[providers.{kind}]");
            println!("  model: {}", c.model_for(kind));
            if let Some(url) = c.base_url_for(kind) {
                println!("  base_url: {url}");
            }
        }
        if let Some(path) = Config::config_path() {
            let status = if path.exists() { "found" } else { "not found" };
            println!();
            println!("Config file: {} ({status})", path.display());
        }
    }

    fn print_usage(usage: &BTreeMap<ProviderKind, UsageStats>) {
        eprintln!("{}", style("Usage (this process)").bold().underlined());
        for (kind, stats) in usage {
            let last = stats
                .last_request
                .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "never".into());
            eprintln!(
                "  {:<10} {:>8} tokens {:>5} requests  last: {last}",
                kind.as_str(),
                stats.tokens_used,
                stats.requests_count
            );
        }
    }

    fn print_status(&self, msg: &str) {
        eprintln!("{} {}", style("→").cyan(), msg);
    }

    fn print_info(&self, msg: &str) {
        eprintln!("{} {}", style("info:").cyan(), msg);
    }

    fn print_warning(&self, msg: &str) {
        eprintln!("{} {}", style("warning:").yellow().bold(), msg);
    }

    fn print_done(&self, msg: &str) {
        eprintln!("{} {}", style("✓").green().bold(), msg);
    }
}
