//! # Catalog Processor
//!
//! Answers the derived queries over a fetched rights document and a fetched
//! assets document:
//!
//! - [`Processor::get_titles_for_device`]: titles playable on a device platform;
//! - [`Processor::filter_currently_active_items`]: which of those titles are
//!   inside a licensing window right now;
//! - [`Processor::get_level3_hd_manifest_paths`]: manifest paths of active
//!   items delivered in HD from a `level3` origin.
//!
//! Every query is a read-only scan of both documents, total (it always returns
//! a list) and repeatable. Term windows with unreadable bounds are logged and
//! skipped; they never abort a query.

use super::model::{AssetsDocument, RightsDocument, RightsEntry};
use super::timestamps::window_contains;
use crate::loggers::LogSink;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

/// Video format selected by [`Processor::get_level3_hd_manifest_paths`].
pub const HD_VIDEO_FORMAT: &str = "HD";

/// Origin substring selected by [`Processor::get_level3_hd_manifest_paths`].
pub const LEVEL3_ORIGIN: &str = "level3";

type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// A fetched payload that does not have the expected overall shape.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The rights payload could not be read.
    #[error("Rights document has an unexpected shape: {0}")]
    Rights(#[source] serde_json::Error),

    /// The assets payload could not be read.
    #[error("Assets document has an unexpected shape: {0}")]
    Assets(#[source] serde_json::Error),
}

/// # Active Item
///
/// A title together with the licensing window that makes it active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveItem {
    /// The localized title.
    pub title: String,
    /// Start of the matching window.
    pub start: NaiveDateTime,
    /// End of the matching window.
    pub end: NaiveDateTime,
}

/// # Processor
///
/// Holds the two documents for its lifetime, plus the sink that receives
/// timestamp parse errors and the clock that defines "now".
pub struct Processor {
    rights: RightsDocument,
    assets: AssetsDocument,
    logger: Arc<dyn LogSink>,
    clock: Clock,
}

impl Processor {
    /// Creates a processor over already typed documents. "Now" is local wall time.
    pub fn new(rights: RightsDocument, assets: AssetsDocument, logger: Arc<dyn LogSink>) -> Self {
        Self {
            rights,
            assets,
            logger,
            clock: Arc::new(|| Local::now().naive_local()),
        }
    }

    /// Creates a processor from raw fetched JSON: `vq` is the rights payload,
    /// `tq` the assets payload.
    pub fn from_values(vq: Value, tq: Value, logger: Arc<dyn LogSink>) -> Result<Self, DocumentError> {
        let rights = serde_json::from_value(vq).map_err(DocumentError::Rights)?;
        let assets = serde_json::from_value(tq).map_err(DocumentError::Assets)?;
        Ok(Self::new(rights, assets, logger))
    }

    /// Replaces the clock used by the queries that do not take an explicit instant.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// The rights document.
    pub fn rights(&self) -> &RightsDocument {
        &self.rights
    }

    /// The assets document.
    pub fn assets(&self) -> &AssetsDocument {
        &self.assets
    }

    /// The current instant according to the clock.
    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    /// Titles of every entry with at least one term window listing `platform`,
    /// in document order. An entry contributes once, however many of its
    /// windows match. Duplicates across entries are kept.
    pub fn get_titles_for_device(&self, platform: &str) -> Vec<String> {
        self.rights
            .results
            .iter()
            .filter(|entry| entry.playable_on(platform))
            .flat_map(|entry| entry.titles().map(str::to_string))
            .collect()
    }

    /// Active items among `titles`, reading "now" once from the clock.
    pub fn filter_currently_active_items<S: AsRef<str>>(&self, titles: &[S]) -> Vec<ActiveItem> {
        self.filter_active_items_at(titles, self.now())
    }

    /// For each title (caller order), each entry carrying that title yields the
    /// first of its windows containing `now`. A title appears once per
    /// qualifying localized record.
    pub fn filter_active_items_at<S: AsRef<str>>(&self, titles: &[S], now: NaiveDateTime) -> Vec<ActiveItem> {
        let mut active_items = Vec::new();

        for title in titles {
            let title = title.as_ref();
            for entry in &self.rights.results {
                for info in &entry.localizable_information {
                    if info.title() != Some(title) {
                        continue;
                    }
                    let active = self.first_active_window(entry, now, || format!("title '{}'", title));
                    if let Some((start, end)) = active {
                        active_items.push(ActiveItem {
                            title: title.to_string(),
                            start,
                            end,
                        });
                    }
                }
            }
        }

        active_items
    }

    /// Level3 HD manifest paths of every currently active entry.
    pub fn get_level3_hd_manifest_paths(&self) -> Vec<String> {
        self.get_manifest_paths_at(HD_VIDEO_FORMAT, LEVEL3_ORIGIN, self.now())
    }

    /// Manifest paths of every entry active at `now`, restricted to assets in
    /// `video_format` whose first endpoint's origin contains `origin`.
    ///
    /// Only the first endpoint descriptor of an asset is inspected, and the
    /// collected path is that descriptor's (empty when absent). Assets without
    /// endpoints and entries without a `contentId` contribute nothing.
    pub fn get_manifest_paths_at(&self, video_format: &str, origin: &str, now: NaiveDateTime) -> Vec<String> {
        let mut manifest_paths = Vec::new();

        for entry in &self.rights.results {
            let active = self.first_active_window(entry, now, || {
                format!("entry '{}'", entry.content_id.as_deref().unwrap_or_default())
            });
            if active.is_none() {
                continue;
            }
            let Some(content_id) = entry.content_id.as_deref() else {
                continue;
            };

            for asset_entry in self.assets.entries_for(content_id) {
                for asset in &asset_entry.assets {
                    if asset.video_format.as_deref() != Some(video_format) {
                        continue;
                    }
                    let Some(endpoint) = asset.first_endpoint() else {
                        continue;
                    };
                    if endpoint.origin.as_deref().unwrap_or_default().contains(origin) {
                        manifest_paths.push(endpoint.path.clone().unwrap_or_default());
                    }
                }
            }
        }

        manifest_paths
    }

    /// Bounds of the first window of `entry` containing `now`. Windows whose
    /// bounds fail to parse are logged against `subject()` and skipped.
    fn first_active_window<F>(&self, entry: &RightsEntry, now: NaiveDateTime, subject: F) -> Option<(NaiveDateTime, NaiveDateTime)>
    where
        F: Fn() -> String,
    {
        for term in &entry.rights.terms {
            match term.bounds() {
                Ok((start, end)) => {
                    if window_contains(start, end, now) {
                        return Some((start, end));
                    }
                }
                Err(e) => {
                    self.logger.error(
                        &format!("Error parsing date for {}: {}", subject(), e),
                        Some(json!({
                            "startDateTime": term.start_date_time,
                            "endDateTime": term.end_date_time,
                        })),
                    );
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loggers::{LogLevel, MemoryLogger};
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn processor(vq: Value, tq: Value) -> (Processor, Arc<MemoryLogger>) {
        let logger = Arc::new(MemoryLogger::default());
        let p = Processor::from_values(vq, tq, logger.clone()).unwrap();
        (p, logger)
    }

    #[test]
    fn entry_contributes_titles_once_even_with_several_matching_windows() {
        let (p, _) = processor(
            json!({"results": [{
                "rights": {"terms": [
                    {"devices": [{"devicePlatform": "ROKU"}]},
                    {"devices": [{"devicePlatform": "ROKU"}, {"devicePlatform": "ROKU"}]}
                ]},
                "localizableInformation": [{"titleNameMedium": "A"}, {"titleNameMedium": "B"}]
            }]}),
            json!({}),
        );
        assert_eq!(p.get_titles_for_device("ROKU"), vec!["A", "B"]);
    }

    #[test]
    fn clock_drives_the_plain_queries() {
        let (p, _) = processor(
            json!({"results": [{
                "contentId": "1",
                "rights": {"terms": [{"startDateTime": "2024-01-01T00:00:00Z",
                                       "endDateTime": "2024-01-31T00:00:00Z"}]},
                "localizableInformation": [{"titleNameMedium": "A"}]
            }]}),
            json!({"results": [{"contentId": "1", "assets": [
                {"videoFormat": "HD", "endpoints": [{"origin": "level3", "path": "/a"}]}
            ]}]}),
        );

        let inside = p.with_clock(|| at(2024, 1, 15));
        assert_eq!(inside.filter_currently_active_items(&["A"]).len(), 1);
        assert_eq!(inside.get_level3_hd_manifest_paths(), vec!["/a"]);

        let outside = inside.with_clock(|| at(2024, 2, 15));
        assert!(outside.filter_currently_active_items(&["A"]).is_empty());
        assert!(outside.get_level3_hd_manifest_paths().is_empty());
    }

    #[test]
    fn parse_errors_are_logged_with_their_subject() {
        let (p, logger) = processor(
            json!({"results": [{
                "contentId": "42",
                "rights": {"terms": [{"startDateTime": "garbage", "endDateTime": "2024-01-31T00:00:00Z"}]},
                "localizableInformation": [{"titleNameMedium": "A"}]
            }]}),
            json!({}),
        );

        assert!(p.filter_active_items_at(&["A"], at(2024, 1, 15)).is_empty());
        assert!(p.get_manifest_paths_at("HD", "level3", at(2024, 1, 15)).is_empty());

        let errors = logger.messages(LogLevel::Error);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("Error parsing date for title 'A'"));
        assert!(errors[1].starts_with("Error parsing date for entry '42'"));
    }

    #[test]
    fn shape_errors_name_the_document() {
        let logger = Arc::new(MemoryLogger::default());
        let err = Processor::from_values(json!({"results": "nope"}), json!({}), logger.clone())
            .err()
            .unwrap();
        assert!(matches!(err, DocumentError::Rights(_)));

        let err = Processor::from_values(json!({}), json!([1, 2]), logger)
            .err()
            .unwrap();
        assert!(matches!(err, DocumentError::Assets(_)));
    }
}
