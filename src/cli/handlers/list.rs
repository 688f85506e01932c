use crate::{
    core::{arg_parser::GlobalOptions, config_loader::ConfigSnapshot, registry::AliasRegistry},
    models::{AliasEntry, FlagMap},
};
use anyhow::{Context, Result};
use colored::*;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

lazy_static! {
    static ref VARIABLE_RE: Regex = Regex::new(r"\{\{\w+\}\}").expect("valid variable regex");
    static ref ENV_RE: Regex = Regex::new(r"\$\w+").expect("valid env regex");
}

/// What `-l/--list` shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListView {
    /// The alias tree (default).
    Aliases,
    /// The `vars` section.
    Vars,
    /// The global `env` section and every alias' own environment.
    Envs,
}

impl ListView {
    /// `--vars` wins over `--envs`. Either may also follow the search term, in which
    /// case it was collected as a foreign flag.
    pub fn select(options: &GlobalOptions, flags: &FlagMap) -> Self {
        if options.list_vars || flags.get("--vars").is_some() {
            Self::Vars
        } else if options.list_envs || flags.get("--envs").is_some() {
            Self::Envs
        } else {
            Self::Aliases
        }
    }
}

/// Entry point for `-l/--list [--vars|--envs] [search]`.
pub fn handle(snapshot: &ConfigSnapshot, view: ListView, search: Option<&str>) -> Result<()> {
    match view {
        ListView::Aliases => list_aliases(snapshot, search),
        ListView::Vars => list_variables(snapshot, search),
        ListView::Envs => list_environment(snapshot, search),
    }
}

fn list_aliases(snapshot: &ConfigSnapshot, search: Option<&str>) -> Result<()> {
    let registry = AliasRegistry::load(snapshot.aliases())?;
    let entries: Vec<&AliasEntry> = registry
        .iter()
        .filter(|entry| matches_search(entry, search))
        .collect();
    log::debug!(
        "Listing {} of {} alias(es) (search: {:?})",
        entries.len(),
        registry.len(),
        search
    );

    println!("{}", "Available Aliases:".yellow().bold());
    if entries.is_empty() {
        println!("  {}", "No aliases found.".dimmed());
        return Ok(());
    }

    let last = entries.len() - 1;
    for (i, entry) in entries.iter().enumerate() {
        let branch = if i == last { "  └── " } else { "  ├── " };
        println!("{}{}", branch.dimmed(), render_header(entry));

        let stem = if i == last { "      " } else { "  │   " };
        let last_cmd = entry.commands.len().saturating_sub(1);
        for (j, command) in entry.commands.iter().enumerate() {
            let leaf = if j == last_cmd { "└── " } else { "├── " };
            println!(
                "{}{}{}",
                stem.dimmed(),
                leaf.dimmed(),
                highlight_command(command)
            );
        }
    }

    for skipped in registry.skipped() {
        println!(
            "  {}",
            format!("'{}' ignored: unsupported value type {}", skipped.name, skipped.kind).dimmed()
        );
    }
    Ok(())
}

fn list_variables(snapshot: &ConfigSnapshot, search: Option<&str>) -> Result<()> {
    let variables = snapshot.variables().context("failed to get vars")?;
    let rows: Vec<(&str, &str)> = variables
        .iter()
        .filter(|(name, value)| contains_term(search, &[*name, *value]))
        .collect();
    log::debug!("Listing {} of {} variable(s)", rows.len(), variables.len());

    println!("{}", "Available Variables:".yellow().bold());
    if rows.is_empty() {
        println!("  {}", "No variables found.".dimmed());
        return Ok(());
    }
    print_rows(rows.iter().map(|(name, value)| {
        format!("{} -> {}", name.bright_green(), value)
    }));
    Ok(())
}

fn list_environment(snapshot: &ConfigSnapshot, search: Option<&str>) -> Result<()> {
    let registry = AliasRegistry::load(snapshot.aliases())?;
    let environment = collect_environment(snapshot.global_env()?, &registry);
    let rows: Vec<(&String, &String)> = environment
        .iter()
        .filter(|(key, _)| contains_term(search, &[key.as_str()]))
        .collect();
    log::debug!("Listing {} of {} env variable(s)", rows.len(), environment.len());

    println!("{}", "Available Envs:".yellow().bold());
    if rows.is_empty() {
        println!("  {}", "No envs found.".dimmed());
        return Ok(());
    }
    print_rows(
        rows.iter()
            .map(|(key, value)| format!("{} -> {}", render_env_key(key), value)),
    );
    Ok(())
}

/// Global variables keyed by name, alias variables keyed `name (alias)`.
fn collect_environment(
    global: BTreeMap<String, String>,
    registry: &AliasRegistry,
) -> BTreeMap<String, String> {
    let mut environment = global;
    for entry in registry.iter() {
        for (name, value) in &entry.environment {
            environment.insert(format!("{} ({})", name, entry.name), value.clone());
        }
    }
    environment
}

/// `$NAME (alias)`: the variable as a child sees it, followed by its owner.
fn render_env_key(key: &str) -> String {
    match key.rsplit_once(" (") {
        Some((name, owner)) => format!(
            "{} {}",
            format!("${}", name.to_uppercase()).red(),
            format!("({}", owner).truecolor(255, 175, 0)
        ),
        None => format!("${}", key.to_uppercase()).red().to_string(),
    }
}

/// Prints one flat tree level.
fn print_rows(rows: impl ExactSizeIterator<Item = String>) {
    let last = rows.len().saturating_sub(1);
    for (i, row) in rows.enumerate() {
        let branch = if i == last { "  └── " } else { "  ├── " };
        println!("{}{}", branch.dimmed(), row);
    }
}

/// `name (synonyms) [parallel] -> description`
fn render_header(entry: &AliasEntry) -> String {
    let mut header = if entry.parallel {
        entry.name.cyan().bold().to_string()
    } else {
        entry.name.green().bold().to_string()
    };
    if !entry.synonyms.is_empty() {
        let synonyms = format!("({})", entry.synonyms.join(", "));
        header.push(' ');
        header.push_str(&synonyms.truecolor(255, 175, 0).to_string());
    }
    if entry.parallel {
        header.push(' ');
        header.push_str(&"[parallel]".cyan().to_string());
    }
    format!("{} -> {}", header, entry.description.yellow())
}

/// Highlights `{{var}}` placeholders and `$ENV` references of a command template.
fn highlight_command(command: &str) -> String {
    let with_vars = VARIABLE_RE.replace_all(command, |caps: &Captures<'_>| {
        matched(caps).bright_green().to_string()
    });
    ENV_RE
        .replace_all(&with_vars, |caps: &Captures<'_>| matched(caps).red().to_string())
        .into_owned()
}

fn matched<'t>(caps: &Captures<'t>) -> &'t str {
    caps.get(0).map_or("", |m| m.as_str())
}

/// Case-insensitive substring match on the name, the description or a synonym.
fn matches_search(entry: &AliasEntry, search: Option<&str>) -> bool {
    let mut fields = vec![entry.name.as_str(), entry.description.as_str()];
    fields.extend(entry.synonyms.iter().map(String::as_str));
    contains_term(search, &fields)
}

/// `true` without a search term, or when any field contains it, ignoring case.
fn contains_term(search: Option<&str>, fields: &[&str]) -> bool {
    let Some(term) = search.map(str::to_lowercase).filter(|t| !t.is_empty()) else {
        return true;
    };
    fields.iter().any(|field| field.to_lowercase().contains(&term))
}
