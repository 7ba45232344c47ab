//! Walking a repository and filling in missing docstrings file by file.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::OllamaConfig;
use crate::error::DocfillError;
use crate::generate::{Backend, DocGenerator, FailurePolicy, GenerationOutcome, GenerationRequest};
use crate::ports::{FileSystem, LlmClient};
use crate::sanitize::sanitize;
use crate::syntax::extract::{extract_definitions, ExtractedDefinition};
use crate::syntax::transform::{apply_insertions, plan_insertions, DocAssignment};
use crate::syntax::SourceTree;

/// Extension of the files considered for documentation.
const PYTHON_EXTENSION: &str = "py";

/// Everything that shapes one run over a repository.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Repository root.
    pub root: PathBuf,
    /// Generation backend selected by the user.
    pub backend: Backend,
    /// Preview only; never write.
    pub dry_run: bool,
    /// Copy each file to `<file>.bak` before overwriting it.
    pub create_backup: bool,
    /// Paths relative to `root` whose files are left alone.
    pub ignore: Vec<PathBuf>,
    /// What to do when a definition cannot be documented.
    pub on_failure: FailurePolicy,
    /// Extra attempts for retryable generation failures.
    pub max_retries: u32,
    /// Base delay between attempts; attempt `n` waits `n` times this.
    pub retry_delay: Duration,
}

impl RunOptions {
    /// Options with every flag at its default.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            backend: Backend::Ollama,
            dry_run: false,
            create_backup: false,
            ignore: Vec::new(),
            on_failure: FailurePolicy::Skip,
            max_retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Whether nothing was written.
    pub dry_run: bool,
    /// Files transformed (or previewed) without error.
    pub files_processed: usize,
    /// Files excluded by `--ignore`.
    pub files_ignored: usize,
    /// Files that were reported and left untouched.
    pub failures: Vec<String>,
    /// Docstrings inserted, or that would have been in a dry run.
    pub docstrings: usize,
    /// Definitions left undocumented because generation failed.
    pub definitions_skipped: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run { "would insert" } else { "inserted" };
        write!(
            f,
            "Done: {} file(s) processed, {verb} {} docstring(s), {} definition(s) skipped, {} file(s) ignored, {} file(s) failed",
            self.files_processed,
            self.docstrings,
            self.definitions_skipped,
            self.files_ignored,
            self.failures.len(),
        )
    }
}

/// Ignore entries resolved against the repository root.
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    root: PathBuf,
    entries: Vec<PathBuf>,
}

impl IgnoreSet {
    /// Resolves `entries` (relative to `root`, or absolute) once for the run.
    #[must_use]
    pub fn resolve(root: &Path, entries: &[PathBuf]) -> Self {
        let root = absolutize(root);
        let entries = entries.iter().map(|entry| absolutize(&root.join(entry))).collect();
        Self { root, entries }
    }

    /// Whether the file at `relative` (to the root) equals or descends from
    /// an ignore entry.
    #[must_use]
    pub fn contains(&self, relative: &Path) -> bool {
        let path = self.root.join(relative);
        self.entries.iter().any(|entry| path.starts_with(entry))
    }
}

fn absolutize(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// `<file>.py` becomes `<file>.py.bak`.
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}

/// Runs one pass over the repository described by `options`.
///
/// # Errors
///
/// Returns an error only for run-level failures: an unsupported backend
/// (checked before any file is touched) or an untraversable root. Per-file
/// failures are printed, counted in the summary, and do not stop the run.
pub async fn process_repository(
    fs: &dyn FileSystem,
    llm: &dyn LlmClient,
    config: &OllamaConfig,
    options: &RunOptions,
) -> Result<RunSummary, DocfillError> {
    if let Backend::Unsupported(name) = &options.backend {
        return Err(DocfillError::UnsupportedBackend(name.clone()));
    }

    let ignore = IgnoreSet::resolve(&options.root, &options.ignore);
    let files = fs.list_files(&options.root, PYTHON_EXTENSION).map_err(|source| {
        DocfillError::Walk { path: options.root.clone(), source }
    })?;
    tracing::info!(root = %options.root.display(), files = files.len(), "scanning repository");

    let run = FileRun { fs, generator: DocGenerator::new(llm, config), options };
    let mut summary = RunSummary { dry_run: options.dry_run, ..RunSummary::default() };

    for path in files {
        let relative = path.strip_prefix(&options.root).unwrap_or(&path).to_path_buf();
        if ignore.contains(&relative) {
            tracing::debug!(path = %relative.display(), "ignored");
            summary.files_ignored += 1;
            continue;
        }

        println!("Processing: {}", relative.display());
        match run.process_file(&path).await {
            Ok(report) => {
                summary.files_processed += 1;
                summary.docstrings += report.inserted;
                summary.definitions_skipped += report.skipped;
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                eprintln!("{err}");
                summary.failures.push(err.to_string());
            }
        }
    }

    Ok(summary)
}

/// Per-file counts.
#[derive(Debug, Default)]
struct FileReport {
    inserted: usize,
    skipped: usize,
}

struct FileRun<'a> {
    fs: &'a dyn FileSystem,
    generator: DocGenerator<'a>,
    options: &'a RunOptions,
}

impl FileRun<'_> {
    async fn process_file(&self, path: &Path) -> Result<FileReport, DocfillError> {
        let source = self
            .fs
            .read_to_string(path)
            .map_err(|source| DocfillError::Read { path: path.to_path_buf(), source })?;
        let parse_error = |source| DocfillError::Parse { path: path.to_path_buf(), source };

        let definitions = extract_definitions(&source).map_err(parse_error)?;
        let mut report = FileReport::default();
        let mut assignment = DocAssignment::new();

        for definition in &definitions {
            let payload = match self.generate(definition).await {
                Ok(raw) => {
                    let payload = sanitize(&raw);
                    println!("  Suggested docstring for {} '{}':", definition.kind, definition.name);
                    println!("{payload}");
                    println!("-");
                    payload
                }
                Err(reason) => {
                    tracing::warn!(
                        path = %path.display(),
                        name = %definition.name,
                        "generation failed: {reason}"
                    );
                    match self.options.on_failure {
                        FailurePolicy::Skip => {
                            report.skipped += 1;
                            continue;
                        }
                        FailurePolicy::InsertEmpty => String::new(),
                    }
                }
            };
            if assignment.insert(&definition.name, definition.kind, payload).is_some() {
                tracing::warn!(
                    path = %path.display(),
                    name = %definition.name,
                    kind = %definition.kind,
                    "several definitions share this name; all receive the last docstring"
                );
            }
        }

        let tree = SourceTree::parse(&source).map_err(parse_error)?;
        let plan = plan_insertions(&tree, &assignment);
        report.inserted = plan.len();
        let updated = apply_insertions(&source, &plan);

        if self.options.dry_run {
            println!("  Dry run: would insert {} docstring(s)", report.inserted);
            return Ok(report);
        }

        if self.options.create_backup {
            let backup = backup_path(path);
            self.fs
                .copy(path, &backup)
                .map_err(|source| DocfillError::Backup { path: path.to_path_buf(), source })?;
            tracing::debug!(backup = %backup.display(), "backup written");
        }
        self.fs
            .write(path, &updated)
            .map_err(|source| DocfillError::Write { path: path.to_path_buf(), source })?;
        tracing::info!(path = %path.display(), inserted = report.inserted, "file updated");

        Ok(report)
    }

    /// Generates text for one definition, retrying transient failures.
    async fn generate(&self, definition: &ExtractedDefinition) -> Result<String, String> {
        let request = GenerationRequest {
            name: &definition.name,
            kind: definition.kind,
            snippet: &definition.snippet,
        };
        let mut attempt = 0;
        loop {
            match self.generator.generate(&request).await {
                GenerationOutcome::Generated(text) => return Ok(text),
                GenerationOutcome::Skip { reason } => return Err(reason),
                GenerationOutcome::Retry { reason } if attempt < self.options.max_retries => {
                    attempt += 1;
                    tracing::info!(name = %definition.name, attempt, "retrying after: {reason}");
                    tokio::time::sleep(self.options.retry_delay * attempt).await;
                }
                GenerationOutcome::Retry { reason } => {
                    return Err(format!("{reason} (gave up after {attempt} retries)"));
                }
            }
        }
    }
}
