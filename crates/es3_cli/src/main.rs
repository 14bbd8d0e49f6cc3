use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use es3_core::codec::JsonContainerCodec;
use es3_core::core_api::{CoreError, Document, EditReport, Rejection};
use es3_core::games::phasmophobia::{PLUGIN_ID as PHASMOPHOBIA_ID, PlayerStats};
use es3_core::games::{GamePlugin, all_plugins, plugin_by_id};
use es3_core::storage::{BackupPolicy, read_save, write_save};
use es3_core::view::StructuredView;
use es3_render::{
    render_entries_json, render_entries_text, render_plugin_list, render_rejections,
    render_view_json, render_view_text,
};
use serde_json::{Map as JsonMap, Value as JsonValue};

const LIST_COMMAND: &str = "list";

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Game plugin id, or `list` to show the available plugins.
    #[arg(value_name = "GAME", default_value = PHASMOPHOBIA_ID)]
    game: String,
    /// Save file to open instead of the plugin's default location.
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
    /// Structured field edit, e.g. `--set money=750`.
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    set: Vec<(String, String)>,
    /// Raw scalar entry edit, e.g. `--set-entry fovValue=90`.
    #[arg(long = "set-entry", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    set_entry: Vec<(String, String)>,
    /// Boolean entry toggle, e.g. `--toggle isTutorialCompleted=false`.
    #[arg(long = "toggle", value_name = "KEY=true|false", value_parser = parse_toggle)]
    toggle: Vec<(String, bool)>,
    #[arg(long = "set-money", allow_hyphen_values = true)]
    set_money: Option<i64>,
    #[arg(long = "set-xp", allow_hyphen_values = true)]
    set_xp: Option<i64>,
    /// Codec key override.
    #[arg(long)]
    key: Option<String>,
    /// Also print every raw entry.
    #[arg(long)]
    entries: bool,
    #[arg(long)]
    json: bool,
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long = "no-backup")]
    no_backup: bool,
}

impl Cli {
    fn has_edits(&self) -> bool {
        !self.set.is_empty()
            || !self.set_entry.is_empty()
            || !self.toggle.is_empty()
            || self.set_money.is_some()
            || self.set_xp.is_some()
    }

    /// Structured field names this invocation edits.
    fn structured_targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = self.set.iter().map(|(name, _)| name.clone()).collect();
        if self.set_money.is_some() {
            targets.push("money".to_string());
        }
        if self.set_xp.is_some() {
            targets.push("experience".to_string());
        }
        targets
    }

    fn player_stats(&self) -> Option<PlayerStats> {
        if self.set_money.is_none() && self.set_xp.is_none() {
            return None;
        }
        Some(PlayerStats {
            money: self.set_money.into(),
            experience: self.set_xp.into(),
        })
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if cli.game == LIST_COMMAND {
        print!("{}", render_plugin_list(all_plugins()));
        return;
    }

    let plugin = plugin_by_id(&cli.game).unwrap_or_else(|e| {
        eprintln!("Error: {}", e.message);
        eprintln!("  run `es3-se list` to see the available plugins");
        process::exit(1);
    });

    let has_edits = cli.has_edits();
    if !has_edits && cli.output.is_some() {
        eprintln!("--output requires at least one edit flag");
        process::exit(2);
    }
    let stats_edit = cli.player_stats();
    if stats_edit.is_some() && plugin.id() != PHASMOPHOBIA_ID {
        eprintln!("--set-money and --set-xp are only available for {PHASMOPHOBIA_ID}");
        process::exit(2);
    }

    let path = resolve_save_path(&cli, plugin);
    let bytes = read_save(&path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", path.display(), e.message);
        process::exit(1);
    });

    let key = cli
        .key
        .clone()
        .unwrap_or_else(|| plugin.codec_key().to_string());
    let mut document = Document::new(JsonContainerCodec::new(), key);
    let raw = document.load(bytes).unwrap_or_else(|e| {
        eprintln!("Error decoding save file: {}", path.display());
        eprintln!("  {e}");
        process::exit(1);
    });

    // Structured edits go first; the view was read before any raw entry edit. An
    // unreadable view rejects only the structured edits.
    let parsed = plugin.parse(raw);
    let mut report = match parsed {
        Ok(view) => {
            apply_structured_edits(&cli, plugin, &mut document, view, stats_edit.as_ref())
        }
        Err(e) => {
            log::warn!("{} fields are unreadable: {e}", plugin.name());
            unreadable_fields(cli.structured_targets(), &e)
        }
    };

    let entry_report = document
        .apply_entry_edits(&cli.set_entry)
        .unwrap_or_else(|e| {
            eprintln!("Error applying entry edits: {e}");
            process::exit(1);
        });
    report.merge(entry_report);
    let toggle_report = document
        .apply_entry_toggles(&cli.toggle)
        .unwrap_or_else(|e| {
            eprintln!("Error applying entry toggles: {e}");
            process::exit(1);
        });
    report.merge(toggle_report);

    let mut status = Vec::new();
    if report.has_changes() {
        status.extend(save_document(&cli, &mut document, &path));
    } else if has_edits {
        status.push("No edits applied; save not modified.".to_string());
    }

    let raw = document.raw().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });
    let view = match plugin.parse(raw) {
        Ok(view) => Some(view),
        Err(e) => {
            eprintln!("Error reading {} fields: {e}", plugin.name());
            None
        }
    };

    if cli.json {
        let mut out = JsonMap::new();
        out.insert(
            "view".to_string(),
            view.as_ref().map_or(JsonValue::Null, render_view_json),
        );
        if cli.entries {
            out.insert("entries".to_string(), render_entries_json(raw));
        }
        let rendered =
            serde_json::to_string_pretty(&JsonValue::Object(out)).unwrap_or_else(|e| {
                eprintln!("Error rendering JSON output: {e}");
                process::exit(1);
            });
        println!("{rendered}");
    } else {
        for line in &status {
            println!("{line}");
        }
        if let Some(view) = &view {
            print!("{}", render_view_text(view));
        }
        if cli.entries {
            println!();
            print!("{}", render_entries_text(raw));
        }
    }

    if !report.is_clean() {
        eprint!("{}", render_rejections(&report));
    }
    if !report.is_clean() || view.is_none() {
        process::exit(1);
    }
}

/// Applies `--set` and the stat shorthands to `view`, then merges the result into the
/// document.
fn apply_structured_edits(
    cli: &Cli,
    plugin: &dyn GamePlugin,
    document: &mut Document<JsonContainerCodec>,
    mut view: StructuredView,
    stats: Option<&PlayerStats>,
) -> EditReport {
    let mut report = view.apply_text_edits(&cli.set);
    if let Some(stats) = stats {
        stats.apply_to(&mut view).unwrap_or_else(|e| {
            eprintln!("Error applying player stats: {e}");
            process::exit(1);
        });
        if stats.money.is_present() {
            report.applied.push("money".to_string());
        }
        if stats.experience.is_present() {
            report.applied.push("experience".to_string());
        }
    }
    if report.has_changes() {
        let merged = document
            .raw()
            .and_then(|raw| plugin.serialize(&view, raw));
        if let Err(e) = merged.and_then(|updated| document.commit(updated)) {
            eprintln!("Error merging {} fields: {e}", plugin.name());
            process::exit(1);
        }
    }
    report
}

fn unreadable_fields(targets: Vec<String>, err: &CoreError) -> EditReport {
    let rejected = targets
        .into_iter()
        .map(|target| Rejection {
            target,
            expected: None,
            reason: format!("fields are unreadable: {}", err.message),
        })
        .collect();
    EditReport {
        applied: Vec::new(),
        rejected,
    }
}

fn resolve_save_path(cli: &Cli, plugin: &dyn GamePlugin) -> PathBuf {
    if let Some(path) = &cli.file {
        return path.clone();
    }
    match plugin.default_locations().into_iter().next() {
        Some(location) => {
            log::info!("using {} at {}", location.label, location.path.display());
            location.path
        }
        None => {
            eprintln!(
                "No default save location for {}; pass --file <PATH>",
                plugin.name()
            );
            process::exit(1);
        }
    }
}

/// Encodes the edited document and writes it out. Returns status lines for the user.
fn save_document(
    cli: &Cli,
    document: &mut Document<JsonContainerCodec>,
    path: &Path,
) -> Vec<String> {
    let bytes = document.save().unwrap_or_else(|e| {
        eprintln!("Error encoding edited save: {e}");
        process::exit(1);
    });

    let out_path = cli.output.as_deref().unwrap_or(path);
    let policy = if cli.no_backup {
        BackupPolicy::Skip
    } else {
        BackupPolicy::Timestamped
    };
    let backup = write_save(out_path, &bytes, policy).unwrap_or_else(|e| {
        eprintln!("Error writing {}: {}", out_path.display(), e.message);
        process::exit(1);
    });

    let mut status = vec![format!("Wrote edited save to {}", out_path.display())];
    if let Some(backup) = backup {
        status.push(format!("Backed up previous save to {}", backup.display()));
    }
    status
}

fn parse_assignment(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((name, text)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), text.to_string()))
        }
        _ => Err(format!("invalid edit '{value}', expected NAME=VALUE")),
    }
}

fn parse_toggle(value: &str) -> Result<(String, bool), String> {
    let (name, text) = parse_assignment(value)?;
    match text.trim() {
        "true" => Ok((name, true)),
        "false" => Ok((name, false)),
        other => Err(format!("invalid toggle '{other}' for {name}, expected true or false")),
    }
}
