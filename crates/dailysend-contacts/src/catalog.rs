//! Contact catalog: one ordered, validated list built from many sources.
//!
//! **Ordering contract:** the persisted cursor is an index into this list.
//! The order is (sorted source name, row order within the source), so it is
//! stable only while the source files and their names stay unchanged.
//! Renaming, reordering or editing source files between runs silently shifts
//! which contact the cursor points at.

use dailysend_core::error::{DailySendError, Result};
use dailysend_core::traits::ContactSource;
use dailysend_core::types::{Contact, RawRecord};

use crate::source::select_sources;
use crate::validator::ContactValidator;

/// Per-source load result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStats {
    pub name: String,
    pub records: usize,
}

/// What happened while building the catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogStats {
    /// The naming convention that matched.
    pub pattern: String,
    /// Sources that loaded, in catalog order.
    pub loaded: Vec<SourceStats>,
    /// Sources that failed to parse, with the reason.
    pub failed: Vec<(String, String)>,
    pub total_records: usize,
    pub valid: usize,
    pub rejected: usize,
}

/// Non-fatal degradation of a catalog build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogWarning {
    /// Some sources were skipped because they failed to parse.
    PartialLoad { failed: Vec<String> },
}

impl CatalogStats {
    pub fn warning(&self) -> Option<CatalogWarning> {
        if self.failed.is_empty() {
            None
        } else {
            Some(CatalogWarning::PartialLoad {
                failed: self.failed.iter().map(|(name, _)| name.clone()).collect(),
            })
        }
    }
}

/// Ordered, validated contacts for one run.
#[derive(Debug, Clone, Default)]
pub struct ContactCatalog {
    contacts: Vec<Contact>,
}

impl ContactCatalog {
    /// Resolve, read, validate and concatenate every matching source.
    pub fn load(
        source: &dyn ContactSource,
        patterns: &[String],
        validator: &ContactValidator,
    ) -> Result<(Self, CatalogStats)> {
        let candidates = source.list()?;
        let Some((pattern, names)) = select_sources(&candidates, patterns) else {
            tracing::error!("❌ No contact files found (expected e.g. 'SDB (1).csv')");
            return Err(DailySendError::NoContactsFound {
                patterns: patterns.to_vec(),
            });
        };

        tracing::info!("📂 Found {} source(s) matching '{}'", names.len(), pattern);
        let mut stats = CatalogStats {
            pattern,
            ..Default::default()
        };
        let mut raw: Vec<RawRecord> = Vec::new();

        for name in names {
            match source.read(&name) {
                Ok(records) => {
                    tracing::info!("   ✅ Loaded {}: {} contacts", name, records.len());
                    stats.loaded.push(SourceStats {
                        name,
                        records: records.len(),
                    });
                    raw.extend(records);
                }
                Err(e) => {
                    tracing::warn!("   ⚠️ Skipping {}: {}", name, e);
                    let reason = match e {
                        DailySendError::SourceParse { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    stats.failed.push((name, reason));
                }
            }
        }

        if stats.loaded.is_empty() {
            tracing::error!("❌ No data loaded from {} source(s)", stats.failed.len());
            return Err(DailySendError::NoContactsFound {
                patterns: patterns.to_vec(),
            });
        }

        stats.total_records = raw.len();
        let (contacts, rejected) = validator.partition(&raw);
        stats.valid = contacts.len();
        stats.rejected = rejected;

        if let Some(CatalogWarning::PartialLoad { failed }) = stats.warning() {
            tracing::warn!("⚠️ Partial load: {} source(s) skipped: {}", failed.len(), failed.join(", "));
        }
        tracing::info!("🔍 Valid numbers: {} | Invalid/skipped: {}", stats.valid, stats.rejected);

        if contacts.is_empty() {
            return Err(DailySendError::EmptyCatalog { rejected });
        }

        Ok((Self { contacts }, stats))
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Contacts in `[start, end)`, clamped to the catalog.
    pub fn slice(&self, start: usize, end: usize) -> &[Contact] {
        let end = end.min(self.contacts.len());
        let start = start.min(end);
        &self.contacts[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn patterns() -> Vec<String> {
        vec!["SDB (*.csv".into(), "contacts*.csv".into()]
    }

    fn rows(prefix: &str, n: usize) -> Vec<RawRecord> {
        (0..n)
            .map(|i| RawRecord::new(format!("98765432{i:02}"), format!("{prefix} {i}")))
            .collect()
    }

    #[test]
    fn test_concatenates_in_sorted_source_order() {
        let source = MemorySource::new()
            .with("SDB (2).csv", rows("second", 2))
            .with("SDB (1).csv", rows("first", 3))
            .with("contacts1.csv", rows("ignored", 5));
        let (catalog, stats) =
            ContactCatalog::load(&source, &patterns(), &ContactValidator::default()).unwrap();

        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog.slice(0, 1)[0].name, "first 0");
        assert_eq!(catalog.slice(3, 4)[0].name, "second 0");
        assert_eq!(stats.pattern, "SDB (*.csv");
        assert!(stats.warning().is_none());
    }

    #[test]
    fn test_no_sources_matched() {
        let source = MemorySource::new().with("other.csv", rows("x", 1));
        let err = ContactCatalog::load(&source, &patterns(), &ContactValidator::default()).unwrap_err();
        assert!(matches!(err, DailySendError::NoContactsFound { .. }));
    }

    #[test]
    fn test_all_sources_broken_is_absence() {
        let source = MemorySource::new().with_broken("SDB (1).csv", "bad encoding");
        let err = ContactCatalog::load(&source, &patterns(), &ContactValidator::default()).unwrap_err();
        assert!(matches!(err, DailySendError::NoContactsFound { .. }));
    }

    #[test]
    fn test_all_invalid_is_empty_catalog() {
        let source = MemorySource::new().with(
            "SDB (1).csv",
            vec![RawRecord::new("123", "a"), RawRecord::new("", "b")],
        );
        let err = ContactCatalog::load(&source, &patterns(), &ContactValidator::default()).unwrap_err();
        assert!(matches!(err, DailySendError::EmptyCatalog { rejected: 2 }));
    }

    #[test]
    fn test_partial_load_is_a_warning() {
        let source = MemorySource::new()
            .with("SDB (1).csv", rows("ok", 2))
            .with_broken("SDB (2).csv", "unterminated quote");
        let (catalog, stats) =
            ContactCatalog::load(&source, &patterns(), &ContactValidator::default()).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(
            stats.warning(),
            Some(CatalogWarning::PartialLoad {
                failed: vec!["SDB (2).csv".into()]
            })
        );
        assert_eq!(stats.failed[0].1, "unterminated quote");
    }

    #[test]
    fn test_slice_is_clamped() {
        let catalog = ContactCatalog {
            contacts: vec![
                Contact::new("9876543210", "a"),
                Contact::new("9876543211", "b"),
                Contact::new("9876543212", "c"),
            ],
        };
        assert_eq!(catalog.slice(1, 10).len(), 2);
        assert!(catalog.slice(5, 10).is_empty());
    }
}
