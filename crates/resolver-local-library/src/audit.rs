use std::fmt;

use tracing::warn;

use crate::error::Result;
use crate::storage::TableCounts;
use crate::traits::RecordingStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditWarning {
    NoMetadata,
    PartialMetadata { metadata: u64, recordings: u64 },
    NoRemoteMatches,
    PartialRemoteMatches { remote: u64, recordings: u64 },
}

impl fmt::Display for AuditWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditWarning::NoMetadata => write!(
                f,
                "sanity check: You have not downloaded metadata for your collection. Run the metadata command."
            ),
            AuditWarning::PartialMetadata { metadata, recordings } => write!(
                f,
                "sanity check: Only {metadata} of your {recordings} recordings have metadata information available. \
                 Run the metadata command."
            ),
            AuditWarning::NoRemoteMatches => write!(
                f,
                "sanity check: You have not matched your collection against the collection in subsonic. \
                 Run the subsonic command."
            ),
            AuditWarning::PartialRemoteMatches { remote, recordings } => write!(
                f,
                "sanity check: Only {remote} of your {recordings} recordings have subsonic matches. \
                 Run the subsonic command."
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub counts: TableCounts,
    pub warnings: Vec<AuditWarning>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Compares enrichment coverage against the recordings. Read-only.
pub fn audit<S: RecordingStore + ?Sized>(store: &S, include_remote: bool) -> Result<AuditReport> {
    let counts = store.table_counts()?;
    let half = counts.recordings / 2;
    let mut warnings = Vec::new();

    if counts.metadata == 0 {
        warnings.push(AuditWarning::NoMetadata);
    } else if counts.metadata < half {
        warnings.push(AuditWarning::PartialMetadata {
            metadata: counts.metadata,
            recordings: counts.recordings,
        });
    }

    if include_remote {
        if counts.remote == 0 {
            warnings.push(AuditWarning::NoRemoteMatches);
        } else if counts.remote < half {
            warnings.push(AuditWarning::PartialRemoteMatches {
                remote: counts.remote,
                recordings: counts.recordings,
            });
        }
    }

    for warning in &warnings {
        warn!("{warning}");
    }

    Ok(AuditReport { counts, warnings })
}
