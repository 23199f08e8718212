use crate::error::{CleanupError, StoreError};
use crate::store::DocumentStore;
use anyhow::Result;
use std::fmt;
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

pub const COLLECTIONS: [&str; 7] = [
    "users", "goals", "tasks", "journals", "ai_logs", "sessions", "quotes",
];

pub fn confirm_first(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "yes" | "y")
}

pub fn confirm_second(answer: &str) -> bool {
    answer.trim() == "DELETE"
}

fn read_answer<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> io::Result<String> {
    write!(output, "{prompt}")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line)
}

/// Asks twice. Returns false on the first wrong answer or at end of input.
pub fn prompt_confirmation<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<bool> {
    let first = read_answer(
        input,
        output,
        "This will DELETE ALL DATA from the database. Are you sure? (yes/no): ",
    )?;
    if !confirm_first(&first) {
        writeln!(output, "Cleanup cancelled by user")?;
        return Ok(false);
    }

    let second = read_answer(input, output, "Type 'DELETE' to confirm: ")?;
    if !confirm_second(&second) {
        writeln!(output, "Cleanup cancelled - incorrect confirmation")?;
        return Ok(false);
    }

    Ok(true)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionOutcome {
    Deleted(u64),
    Empty,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReport {
    pub name: String,
    pub outcome: CollectionOutcome,
}

impl fmt::Display for CollectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            CollectionOutcome::Deleted(n) => write!(f, "{}: Deleted {n} documents", self.name),
            CollectionOutcome::Empty => write!(f, "{}: No documents to delete", self.name),
            CollectionOutcome::Failed(e) => write!(f, "{e}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub collections: Vec<CollectionReport>,
}

impl CleanupReport {
    pub fn total_deleted(&self) -> u64 {
        self.collections
            .iter()
            .map(|c| match c.outcome {
                CollectionOutcome::Deleted(n) => n,
                _ => 0,
            })
            .sum()
    }

    pub fn collections_cleaned(&self) -> usize {
        self.collections.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CollectionReport> {
        self.collections
            .iter()
            .filter(|c| matches!(c.outcome, CollectionOutcome::Failed(_)))
    }

    pub fn outcome(&self, name: &str) -> Option<&CollectionOutcome> {
        self.collections
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.outcome)
    }
}

impl fmt::Display for CleanupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for collection in &self.collections {
            writeln!(f, "{collection}")?;
        }
        writeln!(f)?;
        writeln!(f, "Database cleanup completed!")?;
        writeln!(f, "Total documents deleted: {}", self.total_deleted())?;
        write!(f, "Collections cleaned: {}", self.collections_cleaned())
    }
}

async fn clean_collection(store: &dyn DocumentStore, name: &str) -> Result<CollectionOutcome, StoreError> {
    if store.count_documents(name).await? == 0 {
        return Ok(CollectionOutcome::Empty);
    }
    Ok(CollectionOutcome::Deleted(store.delete_all(name).await?))
}

/// Empties each collection in turn. A failing collection is recorded and
/// the rest are still processed.
pub async fn run_cleanup(store: &dyn DocumentStore, collections: &[&str]) -> CleanupReport {
    let mut report = CleanupReport::default();

    for &name in collections {
        let outcome = match clean_collection(store, name).await {
            Ok(outcome) => {
                info!("{name}: {outcome:?}");
                outcome
            }
            Err(source) => {
                let error = CleanupError::Collection {
                    name: name.to_string(),
                    source,
                };
                warn!("{error}");
                CollectionOutcome::Failed(error.to_string())
            }
        };
        report.collections.push(CollectionReport {
            name: name.to_string(),
            outcome,
        });
    }

    report
}

/// Confirms on `input` unless `assume_yes`, checks the connection, then
/// cleans. `Ok(None)` means the operator backed out and the store was never
/// touched.
pub async fn clean_with_confirmation<R: BufRead, W: Write>(
    store: &dyn DocumentStore,
    input: &mut R,
    output: &mut W,
    collections: &[&str],
    assume_yes: bool,
) -> Result<Option<CleanupReport>> {
    if assume_yes {
        writeln!(output, "Auto-confirmation mode enabled (--confirm flag)")?;
    } else if !prompt_confirmation(input, output)? {
        return Ok(None);
    }

    store.ping().await.map_err(CleanupError::Connection)?;
    writeln!(output, "Starting database cleanup...")?;

    let report = run_cleanup(store, collections).await;
    writeln!(output, "{report}")?;
    if report.total_deleted() > 0 {
        writeln!(
            output,
            "\nSuccessfully cleaned {} documents from the database",
            report.total_deleted()
        )?;
    } else {
        writeln!(output, "\nDatabase was already empty")?;
    }
    Ok(Some(report))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseStats {
    pub counts: Vec<(String, u64)>,
}

impl DatabaseStats {
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, n)| n).sum()
    }
}

impl fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Collections: {}", self.counts.len())?;
        writeln!(f, "Total Documents: {}", self.total())?;
        for (name, count) in &self.counts {
            writeln!(f, "  - {name}: {count} documents")?;
        }
        Ok(())
    }
}

pub async fn collect_stats(store: &dyn DocumentStore) -> Result<DatabaseStats, StoreError> {
    let mut stats = DatabaseStats::default();
    for name in store.collection_names().await? {
        let count = store.count_documents(&name).await?;
        stats.counts.push((name, count));
    }
    Ok(stats)
}
