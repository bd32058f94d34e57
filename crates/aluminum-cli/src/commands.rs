//! Subcommand handlers. Every result is printed to stdout as pretty JSON.

use anyhow::{bail, Context};
use serde::Serialize;
use serde_json::json;
use std::io::{self, BufRead, Read, Write};
use std::path::Path;

use aluminum_core::{Config, HistoryReader, HistoryRemover};
use aluminum_history::ExportFormat;
use aluminum_storage::{BookmarkStore, CacheStore, HistoryStore};
use aluminum_telemetry::SystemDataCompiler;
use aluminum_utility::calculator::{percentage, solve_quadratic, statistics};
use aluminum_utility::{Calculator, CodingUtility};

use crate::{CalcAction, CodeAction, HistoryAction, StoreAction, SysdataAction};

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Ask on stderr; only an explicit "y" or "yes" confirms
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    eprint!("{prompt} [y/N] ");
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Read a file, or stdin for "-"
fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut contents = String::new();
        io::stdin().read_to_string(&mut contents)?;
        return Ok(contents);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

pub fn history(config: &Config, action: HistoryAction) -> anyhow::Result<()> {
    let location = config.profile_location()?;
    let reader = HistoryReader::open(location.profile_dir())
        .with_context(|| format!("opening history in {}", location.profile_dir().display()))?;

    match action {
        HistoryAction::List { limit, offset } => print_json(&reader.entries(limit, offset)?)?,
        HistoryAction::Search { keyword, limit } => print_json(&reader.search(&keyword, limit)?)?,
        HistoryAction::Top { limit } => print_json(&reader.most_visited(limit)?)?,
        HistoryAction::Stats => print_json(&reader.stats()?)?,
        HistoryAction::Delete { id } => {
            let deleted = reader.delete_entry(id)?;
            print_json(&json!({ "id": id, "deleted": deleted }))?;
        }
        HistoryAction::Clear { yes } => {
            if !yes && !confirm("Delete every history entry?")? {
                bail!("aborted");
            }
            let deleted = reader.clear()?;
            print_json(&json!({ "deleted": deleted }))?;
        }
        HistoryAction::Export { output, format } => {
            let format: ExportFormat = format.parse()?;
            let exported = reader.export(&output, format)?;
            print_json(&json!({
                "path": output,
                "format": format.as_str(),
                "entries": exported,
            }))?;
        }
        HistoryAction::Domains => print_json(&reader.domain_visits()?)?,
        HistoryAction::Timeline { from, to } => print_json(&reader.visit_timeline(from, to)?)?,
    }

    reader.close()?;
    Ok(())
}

pub fn wipe(config: &Config, include_credentials: bool, yes: bool) -> anyhow::Result<()> {
    let location = config.profile_location()?;
    let options = config.wipe_options(include_credentials);

    if !yes {
        let prompt = format!(
            "Remove browsing history{} from {}? A backup is written to {}",
            if options.include_credentials {
                ", saved logins and autofill data"
            } else {
                ""
            },
            location.profile_dir().display(),
            options.backup_root.display(),
        );
        if !confirm(&prompt)? {
            bail!("aborted");
        }
    }

    let report = HistoryRemover::new(location, options).run()?;
    print_json(&report)
}

pub fn store(config: &Config, action: StoreAction) -> anyhow::Result<()> {
    let db = config.open_database()?;
    let history = || HistoryStore::new(db.clone());
    let bookmarks = || BookmarkStore::new(db.clone());
    let cache = || CacheStore::new(db.clone());

    match action {
        StoreAction::Visit { url, title } => {
            history().record_visit(&url, &title)?;
            print_json(&json!({ "recorded": url }))
        }
        StoreAction::Recent { limit } => print_json(&history().recent(limit)?),
        StoreAction::Search { query, limit } => print_json(&history().search(&query, limit)?),
        StoreAction::Top { limit } => print_json(&history().most_visited(limit)?),
        StoreAction::Forget { url } => {
            let removed = history().delete_url(&url)?;
            print_json(&json!({ "url": url, "removed": removed }))
        }
        StoreAction::Clear { older_than_days } => {
            let deleted = history().clear(older_than_days)?;
            print_json(&json!({ "deleted": deleted }))
        }
        StoreAction::Bookmark { url, title, folder } => {
            bookmarks().add(&url, &title, folder.as_deref())?;
            print_json(&json!({ "bookmarked": url }))
        }
        StoreAction::Bookmarks { folder } => print_json(&bookmarks().list(folder.as_deref())?),
        StoreAction::ExportBookmarks { output } => {
            let exported = bookmarks().export_json(&output)?;
            print_json(&json!({ "path": output, "bookmarks": exported }))
        }
        StoreAction::ImportBookmarks { input } => {
            let imported = bookmarks().import_json(&input)?;
            print_json(&json!({ "path": input, "imported": imported }))
        }
        StoreAction::Set { key, value } => {
            db.set_setting(&key, &value)?;
            print_json(&json!({ "key": key, "value": value }))
        }
        StoreAction::Get { key } => {
            let value = db.get_setting(&key)?;
            print_json(&json!({ "key": key, "value": value }))
        }
        StoreAction::CachePut { url, file } => {
            let content =
                std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            cache().put(&url, &content)?;
            print_json(&json!({ "url": url, "bytes": content.len() }))
        }
        StoreAction::CacheGet { url } => match cache().get(&url)? {
            Some(content) => print_json(&json!({
                "url": url,
                "bytes": content.len(),
                "content": String::from_utf8_lossy(&content),
            })),
            None => bail!("no cached content for {url}"),
        },
        StoreAction::CacheClear => {
            let cleared = cache().clear()?;
            print_json(&json!({ "cleared": cleared }))
        }
        StoreAction::Optimize => {
            db.optimize()?;
            print_json(&json!({ "optimized": true }))
        }
        StoreAction::Backup { output } => {
            db.backup_to(&output)?;
            print_json(&json!({ "backup": output }))
        }
        StoreAction::Restore { input } => {
            db.restore_from(&input)?;
            print_json(&json!({ "restored_from": input }))
        }
        StoreAction::Stats => print_json(&db.statistics()?),
    }
}

pub async fn sysdata(config: &Config, action: SysdataAction) -> anyhow::Result<()> {
    let db = config.open_database()?;
    let mut settings = config.telemetry.clone();

    match action {
        SysdataAction::Collect { upload, print } => {
            settings.upload_enabled |= upload;
            // A missing profile only means no plugin or extension list
            let profile_dir = config
                .profile_location()
                .map(|l| l.profile_dir().to_path_buf())
                .ok();

            let compiler = SystemDataCompiler::new(db, settings)?.with_profile_dir(profile_dir);
            let summary = compiler.compile().await?;

            if print {
                print_json(&summary)
            } else {
                print_json(&json!({
                    "record_id": summary.record_id,
                    "report_id": summary.report.report_id,
                    "upload": summary.upload,
                }))
            }
        }
        SysdataAction::List { limit } => {
            let compiler = SystemDataCompiler::new(db, settings)?;
            print_json(&compiler.history(limit)?)
        }
    }
}

pub fn calc(action: CalcAction) -> anyhow::Result<()> {
    let mut calculator = Calculator::new();

    match action {
        CalcAction::Eval {
            expression,
            constants,
        } => {
            for definition in &constants {
                let (name, value) = definition
                    .split_once('=')
                    .with_context(|| format!("expected NAME=VALUE, got '{definition}'"))?;
                let value: f64 = value
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid value for constant '{name}'"))?;
                calculator.add_constant(name.trim(), value)?;
            }

            let result = calculator.evaluate(&expression)?;
            print_json(&json!({ "expression": expression, "result": result }))
        }
        CalcAction::Convert { value, from, to } => {
            let result = calculator.convert_units(value, &from, &to)?;
            print_json(&json!({ "value": value, "from": from, "to": to, "result": result }))
        }
        CalcAction::Percent { value, percentage: pct } => print_json(&percentage(value, pct)),
        CalcAction::Quadratic { a, b, c } => print_json(&solve_quadratic(a, b, c)?),
        CalcAction::Stats { values } => print_json(&statistics(&values)),
    }
}

pub fn code(action: CodeAction) -> anyhow::Result<()> {
    let coder = CodingUtility::new();

    match action {
        CodeAction::Detect { file } => {
            let language = coder.detect_language(&read_input(&file)?);
            print_json(&json!({
                "language": language,
                "extension": language.map(|l| l.extension()),
            }))
        }
        CodeAction::Metrics { file } => {
            let source = read_input(&file)?;
            print_json(&json!({
                "metrics": coder.code_metrics(&source),
                "complexity": coder.analyze_complexity(&source),
            }))
        }
        CodeAction::Lint { file } => print_json(&coder.lint(&read_input(&file)?)),
        CodeAction::Similarity { first, second } => {
            let similarity = coder.similarity(&read_input(&first)?, &read_input(&second)?);
            print_json(&json!({ "similarity": similarity }))
        }
        CodeAction::CommitMessage { diff } => {
            let diff = read_input(&diff)?;
            print_json(&json!({
                "message": coder.commit_message(&diff),
                "stats": coder.diff_stats(&diff),
            }))
        }
    }
}
