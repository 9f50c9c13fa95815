use lib_catalog::{ActiveItem, Processor};
use serde::Serialize;
use std::fmt;

const RULE: &str = "--------------------------------------";

/// Results of the three catalog queries for one device platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub platform: String,
    pub titles: Vec<String>,
    pub active_items: Vec<ActiveItem>,
    pub manifest_paths: Vec<String>,
}

impl Report {
    pub fn build(processor: &Processor, platform: &str) -> Report {
        let titles = processor.get_titles_for_device(platform);
        let active_items = processor.filter_currently_active_items(&titles);
        let manifest_paths = processor.get_level3_hd_manifest_paths();
        Report {
            platform: platform.to_string(),
            titles,
            active_items,
            manifest_paths,
        }
    }

    pub fn render_text(&self) -> String {
        self.to_string()
    }

    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nTitles playable on {}:", self.platform)?;
        for title in &self.titles {
            writeln!(f, "{}\n", title)?;
        }
        writeln!(f, "{}", RULE)?;

        writeln!(f, "\nCurrently active items:")?;
        for item in &self.active_items {
            writeln!(f, "Title: {}", item.title)?;
            writeln!(f, "Start Date: {}", item.start)?;
            writeln!(f, "End Date: {}\n", item.end)?;
        }
        writeln!(f, "{}", RULE)?;

        writeln!(f, "\nLevel3 HD Manifest Paths for currently active items:")?;
        for path in &self.manifest_paths {
            writeln!(f, "{}\n", path)?;
        }
        writeln!(f, "{}", RULE)
    }
}
