//! Refnav CLI binary
//!
//! This is the main entry point for the refnav command-line interface.
//! The CLI is a thin adapter over the library: it builds a session, steps it
//! to completion the way an interactive front end would (one unit per
//! tick), and renders the results.

use refnav::catalog::{AssetCatalog, ProjectCatalog};
use refnav::cli::{CliErrorPayload, CliSuccessPayload, Commands, OrderArg};
use refnav::config::{load_config, NavigatorConfig};
use refnav::history::NavigationHistory;
use refnav::model::{CategoryFilter, GlobalId, ObjectHandle};
use refnav::progress::ProgressMemo;
use refnav::session::{ScanSession, SessionOptions};
use refnav::symbols::{CommandSymbolSearch, SymbolSearch, Unconfigured};
use refnav::RefNavError;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = refnav::cli::parse_args();

    // Initialize logger if verbose
    if cli.verbose {
        env_logger::init();
    }

    let json = match &cli.command {
        Commands::Find { json, .. } | Commands::Count { json, .. } => *json,
    };

    let result = load_settings(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Find {
            project,
            asset,
            guid,
            category,
            size_limit,
            json,
            pause_after,
        } => execute_find(
            &config,
            &project,
            FindTarget::from_args(asset, guid),
            &category,
            size_limit,
            json,
            pause_after,
        ),
        Commands::Count {
            project,
            category,
            order,
            limit,
            size_limit,
            json,
        } => execute_count(&config, &project, &category, order, limit, size_limit, json),
    });

    // Handle result
    match result {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            if json {
                let payload = CliErrorPayload::from_error(&e);
                match serde_json::to_string_pretty(&payload) {
                    Ok(text) => println!("{}", text),
                    Err(_) => eprintln!("Error: {}", e),
                }
            } else {
                eprintln!("Error: {}", e);
                if let Some(hint) = e.hint() {
                    eprintln!("Hint: {}", hint);
                }
            }
            ExitCode::from(1)
        }
    }
}

/// How the find target was given on the command line.
enum FindTarget {
    Asset(PathBuf),
    Guid(String),
}

impl FindTarget {
    fn from_args(asset: Option<PathBuf>, guid: Option<String>) -> Option<Self> {
        asset.map(FindTarget::Asset).or(guid.map(FindTarget::Guid))
    }
}

fn load_settings(path: Option<&Path>) -> Result<NavigatorConfig, RefNavError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(NavigatorConfig::default()),
    }
}

fn session_options(config: &NavigatorConfig, project: &Path, size_limit: Option<u64>) -> SessionOptions {
    let mut corpus = config.corpus.options();
    if let Some(limit) = size_limit {
        corpus.file_size_limit = limit;
    }
    SessionOptions {
        project_root: project.to_path_buf(),
        corpus,
        indent_unit: config.scan.indent_unit,
    }
}

fn category_filter(requested: &[String], fallback: &[String]) -> Result<CategoryFilter, RefNavError> {
    if requested.is_empty() {
        CategoryFilter::from_names(fallback)
    } else {
        CategoryFilter::from_names(requested)
    }
}

/// Turn the command-line target into a catalog handle.
fn resolve_target(
    catalog: &ProjectCatalog,
    project: &Path,
    target: Option<FindTarget>,
) -> Result<ObjectHandle, RefNavError> {
    match target {
        Some(FindTarget::Asset(path)) => {
            let relative = path.strip_prefix(project).map(Path::to_path_buf).unwrap_or(path);
            let type_tag = catalog
                .main_type(&relative)
                .ok_or_else(|| RefNavError::InvalidTarget(relative.display().to_string()))?;
            Ok(ObjectHandle::asset(relative, type_tag))
        }
        Some(FindTarget::Guid(token)) => {
            let id = GlobalId::parse(token.trim())
                .ok_or_else(|| RefNavError::InvalidTarget(format!("malformed identifier '{}'", token)))?;
            catalog
                .object_for_global_id(&id)
                .ok_or_else(|| RefNavError::InvalidTarget(format!("no asset with identifier {}", id)))
        }
        None => Err(RefNavError::InvalidTarget("no target given".to_string())),
    }
}

/// Execute the find command.
fn execute_find(
    config: &NavigatorConfig,
    project: &Path,
    target: Option<FindTarget>,
    categories: &[String],
    size_limit: Option<u64>,
    json: bool,
    pause_after: Option<usize>,
) -> Result<String, RefNavError> {
    let catalog = ProjectCatalog::new(project, config.corpus.root.clone());
    let target = resolve_target(&catalog, project, target)?;
    let filter = category_filter(categories, &config.search.categories)?;

    let symbols: Box<dyn SymbolSearch> = match &config.symbols.command {
        Some(command) => Box::new(CommandSymbolSearch::new(
            command.clone(),
            config.symbols.args.clone(),
            project,
        )),
        None => Box::new(Unconfigured),
    };
    let session = ScanSession::find(&catalog, target, filter, session_options(config, project, size_limit))?
        .with_symbol_search(symbols);

    let mut history = NavigationHistory::new(config.history.capacity);
    history.push(session);
    let session = history
        .current_mut()
        .ok_or_else(|| RefNavError::Other("history lost the session".to_string()))?;

    drive(session, &catalog, pause_after);

    let fingerprint = session.fingerprint()?;
    if json {
        let data = serde_json::json!({
            "session": session.id(),
            "target": session.target(),
            "requested_target": session.requested_target(),
            "state": session.state(),
            "results": session.results(),
            "references": session.references(),
            "skipped": session.skipped(),
            "anomalies": session.anomalies(),
            "resolution_errors": session.resolution_errors(),
            "symbol_error": session.symbol_error(),
            "fingerprint": fingerprint,
        });
        let payload = CliSuccessPayload::with_data(
            format!("{} referencing assets", session.results().len()),
            data,
        );
        return Ok(serde_json::to_string_pretty(&payload)?);
    }

    Ok(render_find(session))
}

/// Step a session to completion, pausing once if asked.
fn drive(session: &mut ScanSession, catalog: &dyn AssetCatalog, pause_after: Option<usize>) {
    let mut ticks = 0usize;
    while session.step(catalog) {
        ticks += 1;
        if let Some(path) = session.last_searched() {
            log::debug!("Searching {}", path.display());
        }
        if pause_after == Some(ticks) {
            session.pause();
            let (done, total) = session.progress();
            log::info!("Paused after {} steps ({}/{:?} files)", ticks, done, total);
            // A paused session does no work when stepped.
            session.step(catalog);
            session.resume();
        }
    }
}

fn render_find(session: &ScanSession) -> String {
    let mut out = String::new();
    if let Some(target) = session.target() {
        let _ = writeln!(out, "Target: {}", target);
    }
    for result in session.results() {
        let _ = writeln!(
            out,
            "{} ({}) [{}]",
            result.path.display(),
            result.type_tag,
            result.category.as_str()
        );
        for hit in &result.hits {
            let _ = writeln!(
                out,
                "    {}:{} in &{} ({:?})",
                hit.line, hit.column, hit.containing_document, hit.kind
            );
        }
        for sub in result.sub_references() {
            let _ = writeln!(out, "    -> {}", sub);
        }
    }
    if !session.references().is_empty() {
        let _ = writeln!(out, "Code references:");
        for reference in session.references() {
            let _ = writeln!(
                out,
                "    {}:{}:{}",
                reference.file_path.display(),
                reference.line,
                reference.column
            );
        }
    }
    if let Some(error) = session.symbol_error() {
        let _ = writeln!(out, "Code references unavailable: {}", error.reason);
    }
    for error in session.resolution_errors() {
        let _ = writeln!(out, "Unresolved: {}", error);
    }
    for skip in session.skipped() {
        let _ = writeln!(out, "Skipped: {}", skip);
    }
    for anomaly in session.anomalies() {
        let _ = writeln!(out, "Warning: {}", anomaly);
    }
    let _ = write!(out, "{} referencing assets", session.results().len());
    out
}

/// Execute the count command.
fn execute_count(
    config: &NavigatorConfig,
    project: &Path,
    categories: &[String],
    order: Option<OrderArg>,
    limit: Option<usize>,
    size_limit: Option<u64>,
    json: bool,
) -> Result<String, RefNavError> {
    let catalog = ProjectCatalog::new(project, config.corpus.root.clone());
    let filter = category_filter(categories, &config.count.categories)?;
    let order = order.map_or(config.count.order, OrderArg::to_tally_order);

    let memo_path = project.join(&config.progress.state_file);
    let memo = ProgressMemo::load_or_default(&memo_path);

    let mut session = ScanSession::tally(filter, session_options(config, project, size_limit))?;
    while session.step(&catalog) {
        if let Some(fraction) = memo.fraction(session.tally_results().total()) {
            log::debug!("Counted {:.0}% of the previous total", fraction * 100.0);
        }
    }

    let tally = session.tally_results();
    if let Err(e) = ProgressMemo::new(tally.total()).save(&memo_path) {
        log::warn!("Could not save progress memo: {}", e);
    }

    let ranked: Vec<_> = tally
        .ranked(order)
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    if json {
        let data = serde_json::json!({
            "session": session.id(),
            "order": order,
            "total": tally.total(),
            "entries": ranked,
            "skipped": session.skipped(),
        });
        let payload = CliSuccessPayload::with_data(
            format!("Searched {} identifiers", tally.len()),
            data,
        );
        return Ok(serde_json::to_string_pretty(&payload)?);
    }

    let mut out = String::new();
    for entry in &ranked {
        let path = entry
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let _ = writeln!(out, "{:>8}  {}  {}", entry.count, entry.global_id, path);
    }
    for skip in session.skipped() {
        let _ = writeln!(out, "Skipped: {}", skip);
    }
    let _ = write!(out, "Searched {} identifiers", tally.len());
    Ok(out)
}
