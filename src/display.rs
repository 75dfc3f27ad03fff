/// Terminal tables for CLI output
use comfy_table::{presets::UTF8_FULL, Cell, Table};

use crate::campaigns::ScanResult;
use crate::sync::SyncReport;
use crate::transactions::{ClassifiedTransfer, ContributionStats};
use crate::utils::{
    format_address_short, format_age_string, format_signature_short, lamports_to_sol,
};

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header.to_vec());
    table
}

pub fn sync_report_table(report: &SyncReport) -> Table {
    let mut table = new_table(&["", "Total", "Created", "Updated", "Skipped"]);
    table.add_row(vec![
        Cell::new("Campaigns"),
        Cell::new(report.campaigns_total),
        Cell::new(report.campaigns_created),
        Cell::new(if report.updates_applied {
            report.campaigns_updated.to_string()
        } else {
            format!("{} (not applied)", report.campaigns_updated)
        }),
        Cell::new(report.campaigns_skipped),
    ]);
    table.add_row(vec![
        Cell::new("Transactions"),
        Cell::new(report.transactions_total),
        Cell::new(report.transactions_created),
        Cell::new("-"),
        Cell::new(report.transactions_skipped),
    ]);
    table.add_row(vec![
        Cell::new("Contributors"),
        Cell::new("-"),
        Cell::new("-"),
        Cell::new(report.contributors_updated),
        Cell::new("-"),
    ]);
    table
}

pub fn scan_table(scan: &ScanResult) -> Table {
    let mut table = new_table(&[
        "Campaign", "Title", "Author", "Raised (SOL)", "Target (SOL)", "Transfers", "State", "Age",
    ]);
    for entry in &scan.campaigns {
        let c = &entry.campaign;
        let state = if c.closed {
            "closed"
        } else if c.locked {
            "locked"
        } else {
            "funded"
        };
        table.add_row(vec![
            Cell::new(format_address_short(&c.id)),
            Cell::new(&c.title),
            Cell::new(format_address_short(&c.author)),
            Cell::new(format!("{:.4}", lamports_to_sol(c.current_amount))),
            Cell::new(format!("{:.4}", lamports_to_sol(c.target_amount))),
            Cell::new(entry.transfers.len()),
            Cell::new(state),
            Cell::new(format_age_string(chrono::DateTime::from_timestamp(c.timestamp, 0))),
        ]);
    }
    table
}

pub fn transfers_table(transfers: &[ClassifiedTransfer]) -> Table {
    let mut table = new_table(&["Signature", "Kind", "From", "To", "SOL", "Block time", "Memo"]);
    for t in transfers {
        let time = t
            .block_time
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(format_signature_short(&t.signature)),
            Cell::new(t.kind),
            Cell::new(format_address_short(&t.from)),
            Cell::new(format_address_short(&t.to)),
            Cell::new(format!("{:.6}", lamports_to_sol(t.lamports))),
            Cell::new(time),
            Cell::new(t.memo.as_deref().unwrap_or("")),
        ]);
    }
    table
}

pub fn stats_table(stats: &ContributionStats) -> Table {
    let mut table = new_table(&["Metric", "Value"]);
    table.add_row(vec!["Contributions".to_string(), stats.total_contributions.to_string()]);
    table.add_row(vec![
        "Total raised (SOL)".to_string(),
        format!("{:.6}", lamports_to_sol(stats.total_amount)),
    ]);
    table.add_row(vec!["Unique contributors".to_string(), stats.unique_contributors.to_string()]);
    table.add_row(vec![
        "Average (SOL)".to_string(),
        format!("{:.6}", stats.average_contribution / 1_000_000_000.0),
    ]);
    table.add_row(vec![
        "Largest (SOL)".to_string(),
        format!("{:.6}", lamports_to_sol(stats.largest_contribution)),
    ]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_marks_unapplied_updates() {
        let report = SyncReport {
            campaigns_total: 3,
            campaigns_updated: 2,
            updates_applied: false,
            ..SyncReport::default()
        };
        let rendered = sync_report_table(&report).to_string();
        assert!(rendered.contains("2 (not applied)"));
        assert!(rendered.contains("Campaigns"));
    }

    #[test]
    fn stats_render_in_sol() {
        let stats = ContributionStats {
            total_contributions: 2,
            total_amount: 1_500_000_000,
            unique_contributors: 1,
            average_contribution: 750_000_000.0,
            largest_contribution: 1_000_000_000,
        };
        let rendered = stats_table(&stats).to_string();
        assert!(rendered.contains("1.500000"));
        assert!(rendered.contains("0.750000"));
    }
}
