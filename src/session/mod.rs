//! Resumable scan sessions.
//!
//! A [`ScanSession`] owns one end-to-end search: its corpus cursor, its
//! resolver or tally engine, and every result found so far. The session does
//! no work on its own; the caller drives it one bounded unit at a time with
//! [`ScanSession::step`], typically once per redraw tick, and decides when
//! to pause, resume or restart.
//!
//! ```text
//! Idle --step--> Running --pause--> Paused --resume--> Running
//!                   |                                     |
//!                   +------ corpus exhausted / stop ------+--> Completed
//! restart: any state --> Idle (results discarded)
//! ```

use crate::catalog::AssetCatalog;
use crate::corpus::{CorpusEntry, CorpusEnumerator, CorpusOptions};
use crate::error::{ExternalServiceUnavailable, IoSkip, RefNavError, ResolutionError, Result, ScanAnomaly};
use crate::model::{CategoryFilter, ObjectHandle};
use crate::resolve::{AssetResult, ReferenceResolver};
use crate::scan::DEFAULT_INDENT_UNIT;
use crate::symbols::{AnalyticResult, SymbolSearch, Unconfigured};
use crate::tally::TallyEngine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Unique identity of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Created or restarted, no work done yet.
    Idle,
    /// Stepping.
    Running,
    /// Stepping suspended by the caller.
    Paused,
    /// Corpus exhausted or stopped. Terminal until restart.
    Completed,
}

/// What the session computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Find every referrer of one target.
    Find,
    /// Count references to every identifier in the corpus.
    Tally,
}

/// Settings shared by both session modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Directory that corpus paths are relative to.
    pub project_root: PathBuf,
    /// Corpus enumeration settings.
    pub corpus: CorpusOptions,
    /// Indentation width of field lines.
    pub indent_unit: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            corpus: CorpusOptions::default(),
            indent_unit: DEFAULT_INDENT_UNIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SymbolPhase {
    NotRequested,
    Pending,
    Done,
}

/// One resumable search.
pub struct ScanSession {
    id: SessionId,
    mode: SessionMode,
    target: Option<ObjectHandle>,
    requested: Option<ObjectHandle>,
    filter: CategoryFilter,
    options: SessionOptions,
    state: SessionState,
    enumerator: CorpusEnumerator,
    resolver: Option<ReferenceResolver>,
    symbols: Box<dyn SymbolSearch>,
    symbol_phase: SymbolPhase,
    results: Vec<AssetResult>,
    references: Vec<AnalyticResult>,
    tally: TallyEngine,
    skipped: Vec<IoSkip>,
    anomalies: Vec<ScanAnomaly>,
    resolution_errors: Vec<ResolutionError>,
    symbol_error: Option<ExternalServiceUnavailable>,
    last_searched: Option<PathBuf>,
    steps: usize,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl ScanSession {
    /// Start a search for every referrer of `target`.
    ///
    /// Behaviour and scriptable instances are searched through their script
    /// asset. Fails only for an empty filter or a target the catalog does not
    /// know; a target without a global identifier yields a session that
    /// reports [`ResolutionError::MissingIdentifier`] and finds no assets.
    pub fn find(
        catalog: &dyn AssetCatalog,
        target: ObjectHandle,
        filter: CategoryFilter,
        options: SessionOptions,
    ) -> Result<Self> {
        let filter = filter.validate()?;
        if catalog.main_type(&target.path).is_none() {
            return Err(RefNavError::InvalidTarget(target.to_string()));
        }

        let subject = if target.type_tag.is_script_instance() {
            match catalog.script_of(&target) {
                Some(script) => {
                    log::info!("Searching {} through its script {}", target, script);
                    script
                }
                None => {
                    log::warn!("No script found for {}, searching the instance", target);
                    target.clone()
                }
            }
        } else {
            target.clone()
        };

        let mut session = Self::blank(SessionMode::Find, filter, options);
        match catalog.global_id(&subject) {
            Some(global_id) => {
                let resolver = ReferenceResolver::new(global_id, catalog.declared_type(&subject))
                    .with_indent_unit(session.options.indent_unit);
                session.resolver = Some(resolver);
            }
            None => {
                let error = ResolutionError::MissingIdentifier {
                    target: subject.to_string(),
                };
                log::warn!("{}", error);
                session.resolution_errors.push(error);
            }
        }
        if filter.contains(CategoryFilter::SCRIPT) && subject.type_tag.is_script() {
            session.symbol_phase = SymbolPhase::Pending;
        }
        session.requested = Some(target);
        session.target = Some(subject);
        Ok(session)
    }

    /// Start a corpus-wide tally over the files passing `filter`.
    pub fn tally(filter: CategoryFilter, options: SessionOptions) -> Result<Self> {
        let filter = filter.validate()?;
        Ok(Self::blank(SessionMode::Tally, filter, options))
    }

    fn blank(mode: SessionMode, filter: CategoryFilter, options: SessionOptions) -> Self {
        Self {
            id: SessionId::new(),
            mode,
            target: None,
            requested: None,
            filter,
            enumerator: CorpusEnumerator::new(filter, options.corpus.clone()),
            options,
            state: SessionState::Idle,
            resolver: None,
            symbols: Box::new(Unconfigured),
            symbol_phase: SymbolPhase::NotRequested,
            results: Vec::new(),
            references: Vec::new(),
            tally: TallyEngine::new(),
            skipped: Vec::new(),
            anomalies: Vec::new(),
            resolution_errors: Vec::new(),
            symbol_error: None,
            last_searched: None,
            steps: 0,
            started_at: None,
            completed_at: None,
        }
    }

    /// Use `search` for code-symbol references of script targets.
    pub fn with_symbol_search(mut self, search: Box<dyn SymbolSearch>) -> Self {
        self.symbols = search;
        self
    }

    /// Perform one bounded unit of work and report whether more remains.
    ///
    /// A unit is one corpus file, or the single code-symbol search. A paused
    /// session does nothing and reports `true`; a completed one does nothing
    /// and reports `false`.
    pub fn step(&mut self, catalog: &dyn AssetCatalog) -> bool {
        match self.state {
            SessionState::Completed => return false,
            SessionState::Paused => return true,
            SessionState::Idle => {
                log::info!("Session {} started ({:?})", self.id, self.mode);
                self.state = SessionState::Running;
            }
            SessionState::Running => {}
        }
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }

        self.ensure_listed(catalog);
        self.steps += 1;

        if self.files_pending() {
            if let Some(entry) = self.enumerator.next_entry(catalog) {
                self.process(catalog, &entry);
            }
        } else if self.symbol_phase == SymbolPhase::Pending {
            self.search_symbols(catalog);
        }

        let more = self.has_remaining();
        if !more {
            self.complete();
        }
        more
    }

    /// Step until the session completes. Resumes a paused session first.
    pub fn run_to_completion(&mut self, catalog: &dyn AssetCatalog) {
        self.resume();
        while self.step(catalog) {}
    }

    /// Suspend stepping. Takes effect before the next step.
    pub fn pause(&mut self) {
        if matches!(self.state, SessionState::Idle | SessionState::Running) {
            log::debug!("Session {} paused", self.id);
            self.state = SessionState::Paused;
        }
    }

    /// Allow stepping again after [`pause`](Self::pause).
    pub fn resume(&mut self) {
        if self.state == SessionState::Paused {
            log::debug!("Session {} resumed", self.id);
            self.state = SessionState::Running;
        }
    }

    /// Abandon the rest of the corpus and complete with what was found.
    pub fn stop(&mut self) {
        if self.state != SessionState::Completed {
            log::info!("Session {} stopped after {} steps", self.id, self.steps);
            self.complete();
        }
    }

    /// Discard every result and rewind to the first corpus file.
    pub fn restart(&mut self) {
        log::info!("Session {} restarted", self.id);
        self.state = SessionState::Idle;
        self.enumerator.reset();
        self.results.clear();
        self.references.clear();
        self.tally.clear();
        self.skipped = self.enumerator.skipped().to_vec();
        self.anomalies.clear();
        self.symbol_error = None;
        self.last_searched = None;
        self.steps = 0;
        self.started_at = None;
        self.completed_at = None;
        if self.symbol_phase == SymbolPhase::Done {
            self.symbol_phase = SymbolPhase::Pending;
        }
    }

    fn complete(&mut self) {
        self.state = SessionState::Completed;
        self.completed_at = Some(Utc::now());
        log::info!(
            "Session {} completed: {} results, {} references, {} tallied, {} skipped",
            self.id,
            self.results.len(),
            self.references.len(),
            self.tally.len(),
            self.skipped.len()
        );
    }

    fn ensure_listed(&mut self, catalog: &dyn AssetCatalog) {
        if !self.enumerator.is_listed() && self.scans_files() {
            self.enumerator.ensure_listed(catalog);
            self.skipped.extend(self.enumerator.skipped().iter().cloned());
        }
    }

    fn scans_files(&self) -> bool {
        match self.mode {
            SessionMode::Find => self.resolver.is_some(),
            SessionMode::Tally => true,
        }
    }

    fn files_pending(&self) -> bool {
        self.scans_files()
            && self
                .enumerator
                .total()
                .map_or(true, |total| self.enumerator.position() < total)
    }

    fn has_remaining(&self) -> bool {
        self.files_pending() || self.symbol_phase == SymbolPhase::Pending
    }

    fn process(&mut self, catalog: &dyn AssetCatalog, entry: &CorpusEntry) {
        log::debug!("Searching {}", entry.path.display());
        self.last_searched = Some(entry.path.clone());

        let text = match catalog.read_all_text(&entry.path) {
            Ok(text) => text,
            Err(e) => {
                let skip = IoSkip::UnreadableFile {
                    path: entry.path.clone(),
                    reason: e.to_string(),
                };
                log::warn!("{}", skip);
                self.skipped.push(skip);
                return;
            }
        };

        match self.mode {
            SessionMode::Find => {
                let Some(resolver) = self.resolver.as_ref() else {
                    return;
                };
                if let Some((result, documents)) = resolver.resolve_file(catalog, entry, &text) {
                    self.anomalies
                        .extend(documents.into_iter().flat_map(|d| d.anomalies));
                    log::debug!("{} references the target", entry.path.display());
                    self.results.push(result);
                }
            }
            SessionMode::Tally => {
                self.tally.count(catalog, entry, &text);
            }
        }
    }

    fn search_symbols(&mut self, catalog: &dyn AssetCatalog) {
        self.symbol_phase = SymbolPhase::Done;
        let Some(script) = self.target.as_ref() else {
            return;
        };
        let script_path = self.options.project_root.join(&script.path);
        match self.symbols.find_symbol_references(script, &script_path) {
            Ok(locations) => {
                let root = &self.options.project_root;
                self.references.extend(
                    locations
                        .into_iter()
                        .map(|location| AnalyticResult::from_location(location, root, catalog)),
                );
            }
            Err(e) => {
                log::warn!("{}", e);
                self.symbol_error = Some(e);
            }
        }
    }

    /// Session identity.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Find or tally.
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True until the session completes.
    pub fn is_searching(&self) -> bool {
        self.state != SessionState::Completed
    }

    /// The object actually searched for (a script instance's script).
    pub fn target(&self) -> Option<&ObjectHandle> {
        self.target.as_ref()
    }

    /// The object the search was started with.
    pub fn requested_target(&self) -> Option<&ObjectHandle> {
        self.requested.as_ref()
    }

    /// Categories covered.
    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    /// Settings in use.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Referencing files, in discovery order.
    pub fn results(&self) -> &[AssetResult] {
        &self.results
    }

    /// Code-symbol references of a script target.
    pub fn references(&self) -> &[AnalyticResult] {
        &self.references
    }

    /// Tally of a tally session.
    pub fn tally_results(&self) -> &TallyEngine {
        &self.tally
    }

    /// Files excluded from the scan.
    pub fn skipped(&self) -> &[IoSkip] {
        &self.skipped
    }

    /// Scanner anomalies in files that produced results.
    pub fn anomalies(&self) -> &[ScanAnomaly] {
        &self.anomalies
    }

    /// Target resolution failures.
    pub fn resolution_errors(&self) -> &[ResolutionError] {
        &self.resolution_errors
    }

    /// Why the code-symbol search produced nothing, if it failed.
    pub fn symbol_error(&self) -> Option<&ExternalServiceUnavailable> {
        self.symbol_error.as_ref()
    }

    /// File currently or most recently scanned.
    pub fn last_searched(&self) -> Option<&Path> {
        self.last_searched.as_deref()
    }

    /// Files handed out so far and the corpus size, once listed.
    pub fn progress(&self) -> (usize, Option<usize>) {
        (self.enumerator.position(), self.enumerator.total())
    }

    /// Units of work performed since start or restart.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Time of the first step.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Time of completion.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// SHA-256 digest of the ordered results, references and tally.
    pub fn fingerprint(&self) -> Result<String> {
        let tally: Vec<_> = self.tally.entries().values().collect();
        let snapshot = serde_json::json!({
            "results": self.results,
            "references": self.references,
            "tally": tally,
        });
        let bytes = serde_json::to_vec(&snapshot)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

impl fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanSession")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("target", &self.target)
            .field("state", &self.state)
            .field("results", &self.results.len())
            .field("tally", &self.tally.len())
            .finish_non_exhaustive()
    }
}
