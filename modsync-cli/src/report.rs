//! Human-readable sync report

use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use modsync_core::sync::{SyncOutcome, SyncReport};

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Plugin")]
    plugin: String,
    #[tabled(rename = "Module")]
    module: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
}

/// Table of every item that was (or would be) added, then a summary line
///
/// Already-present modules are left out of the table; they only show up
/// in the counts.
pub fn render(report: &SyncReport) -> String {
    let rows: Vec<OutcomeRow> = report
        .items
        .iter()
        .filter(|item| item.outcome != SyncOutcome::AlreadyPresent)
        .map(|item| OutcomeRow {
            plugin: item.plugin.clone(),
            module: item.module.clone(),
            outcome: item.outcome.to_string(),
        })
        .collect();

    let mut out = String::new();

    if rows.is_empty() {
        out.push_str("Library is up to date.\n");
    } else {
        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .to_string();
        out.push_str(&table);
        out.push('\n');
    }

    out.push_str(&summary_line(report));
    out.push('\n');
    out
}

fn summary_line(report: &SyncReport) -> String {
    let s = &report.summary;
    if report.dry_run {
        format!(
            "Dry run: {} already present, {} would be added",
            s.already_present, s.would_add
        )
    } else {
        format!(
            "{} already present, {} added, {} failed",
            s.already_present, s.added, s.add_failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modsync_core::sync::{ItemOutcome, SyncSummary};

    fn item(plugin: &str, module: &str, outcome: SyncOutcome) -> ItemOutcome {
        ItemOutcome {
            plugin: plugin.to_string(),
            module: module.to_string(),
            outcome,
        }
    }

    #[test]
    fn test_render_up_to_date() {
        let report = SyncReport {
            dry_run: false,
            items: vec![item("Bogaudio", "Bogaudio-PolyCon", SyncOutcome::AlreadyPresent)],
            summary: SyncSummary {
                already_present: 1,
                ..Default::default()
            },
        };

        let out = render(&report);
        assert!(out.contains("Library is up to date."));
        assert!(out.contains("1 already present, 0 added, 0 failed"));
        assert!(!out.contains("Bogaudio-PolyCon"));
    }

    #[test]
    fn test_render_lists_adds_and_failures() {
        let report = SyncReport {
            dry_run: false,
            items: vec![
                item("X", "a", SyncOutcome::Added),
                item("X", "b", SyncOutcome::AddFailed),
            ],
            summary: SyncSummary {
                added: 1,
                add_failed: 1,
                ..Default::default()
            },
        };

        let out = render(&report);
        assert!(out.contains("add failed"));
        assert!(out.contains("added"));
        assert!(out.contains("0 already present, 1 added, 1 failed"));
    }

    #[test]
    fn test_render_dry_run_summary() {
        let report = SyncReport {
            dry_run: true,
            items: vec![item("X", "a", SyncOutcome::WouldAdd)],
            summary: SyncSummary {
                would_add: 1,
                ..Default::default()
            },
        };

        assert!(render(&report).contains("Dry run: 0 already present, 1 would be added"));
    }
}
