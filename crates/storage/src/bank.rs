//! Loading the question bank from disk.

use log::{info, warn};
use quiz_core::model::Catalog;
use quiz_core::parser::DroppedBlock;
use std::path::Path;

/// Outcome of loading a bank file.
#[derive(Debug, Clone, Default)]
pub struct BankLoad {
    pub catalog: Catalog,
    pub dropped: Vec<DroppedBlock>,
}

/// Read and parse a question bank.
///
/// Never fails: a missing or unreadable file gives an empty catalog, which callers
/// must treat as "no questions available".
#[must_use]
pub fn load_catalog(path: &Path) -> BankLoad {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("question bank {} could not be read: {e}", path.display());
            return BankLoad::default();
        }
    };

    let (catalog, report) = Catalog::parse_with_report(&text);
    info!(
        "loaded {} questions from {} ({} malformed blocks dropped)",
        catalog.len(),
        path.display(),
        report.dropped_count()
    );
    if catalog.is_empty() {
        warn!("question bank {} has no usable questions", path.display());
    }

    BankLoad {
        catalog,
        dropped: report.dropped,
    }
}
