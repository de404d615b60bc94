//! Report export: paginated text recap and CSV spreadsheet

use std::io::Write;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::calculator::{DivisionShare, FinancialSummary};
use crate::error::{RabError, Result};
use crate::models::{BudgetTree, ProjectInfo, info_text};

pub const DEFAULT_ROWS_PER_PAGE: usize = 40;

const NO_WIDTH: usize = 6;
const DESC_WIDTH: usize = 50;
const AMOUNT_WIDTH: usize = 20;

/// Round to whole rupiah, halves away from zero
pub fn round_rupiah(value: Decimal) -> Decimal {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    // Drop the sign of a rounded-away negative fraction.
    if rounded.is_zero() {
        Decimal::ZERO
    } else {
        rounded
    }
}

/// Whole-unit amount with `.` as thousands separator, e.g. `1.234.567`
///
/// Rounds to the nearest unit for display only.
pub fn format_amount(value: Decimal) -> String {
    let rounded = round_rupiah(value);
    let digits = rounded.abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded.is_sign_negative() {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

/// Currency display used everywhere amounts are shown, e.g. `Rp 1.234.567`
pub fn format_rupiah(value: Decimal) -> String {
    let amount = format_amount(value);
    match amount.strip_prefix('-') {
        Some(abs) => format!("-Rp {abs}"),
        None => format!("Rp {amount}"),
    }
}

/// Rate label without trailing zeros, e.g. `10` or `12.5`
fn format_rate(rate: Decimal) -> String {
    rate.normalize().to_string()
}

/// One row of the recap table
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub level: RowLevel,
    pub id: String,
    pub title: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLevel {
    Division,
    SubDivision,
    Summary,
}

impl RowLevel {
    fn as_str(self) -> &'static str {
        match self {
            RowLevel::Division => "division",
            RowLevel::SubDivision => "subdivision",
            RowLevel::Summary => "summary",
        }
    }
}

/// Division and sub-division rows in tree order
pub fn body_rows(tree: &BudgetTree) -> Vec<ReportRow> {
    let mut rows = Vec::new();
    for division in &tree.divisions {
        rows.push(ReportRow {
            level: RowLevel::Division,
            id: division.id.clone(),
            title: division.title.clone(),
            amount: division.total,
        });
        for sub in &division.subdivisions {
            rows.push(ReportRow {
                level: RowLevel::SubDivision,
                id: sub.id.clone(),
                title: sub.title.clone(),
                amount: sub.subtotal,
            });
        }
    }
    rows
}

/// Cost base, overhead, tax and grand total rows, labelled with their rates
pub fn summary_rows(summary: &FinancialSummary) -> Vec<ReportRow> {
    let row = |title: String, amount: Decimal| ReportRow {
        level: RowLevel::Summary,
        id: String::new(),
        title,
        amount,
    };
    vec![
        row("REAL COST".to_string(), summary.cost_base),
        row(
            format!("OVERHEAD & PROFIT ({}%)", format_rate(summary.overhead_rate)),
            summary.overhead_amount,
        ),
        row(format!("TAX ({}%)", format_rate(summary.tax_rate)), summary.tax_amount),
        row("GRAND TOTAL".to_string(), summary.grand_total),
    ]
}

fn rule(output: &mut String) {
    output.push_str(&"-".repeat(NO_WIDTH + DESC_WIDTH + AMOUNT_WIDTH + 4));
    output.push('\n');
}

fn page_header(output: &mut String, info: &ProjectInfo) {
    output.push_str(&format!(
        "COST ESTIMATE RECAP: {}\n",
        info_text(info, "name").to_uppercase()
    ));
    output.push_str(&format!(
        "Location: {} | Owner: {}\n",
        info_text(info, "location"),
        info_text(info, "owner")
    ));
    rule(output);
    output.push_str(&table_line("NO", "DESCRIPTION", "AMOUNT (Rp)"));
    rule(output);
}

fn page_footer(output: &mut String, page: usize) {
    output.push_str(&format!(
        "{:^width$}\n",
        format!("Page {page}"),
        width = NO_WIDTH + DESC_WIDTH + AMOUNT_WIDTH + 6
    ));
}

fn table_line(no: &str, desc: &str, amount: &str) -> String {
    format!(
        "{:^no_w$} | {:<desc_w$} | {:>amount_w$}\n",
        truncate(no, NO_WIDTH),
        truncate(desc, DESC_WIDTH),
        amount,
        no_w = NO_WIDTH,
        desc_w = DESC_WIDTH,
        amount_w = AMOUNT_WIDTH
    )
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        text.chars().take(width).collect()
    }
}

/// Render the recap as plain text pages
///
/// A page break (form feed) follows every `rows_per_page` body rows; the
/// summary block always closes the last page.
pub fn render_text(
    info: &ProjectInfo,
    tree: &BudgetTree,
    summary: &FinancialSummary,
    rows_per_page: usize,
) -> String {
    let rows_per_page = rows_per_page.max(1);
    let mut output = String::new();
    let mut page = 1;

    page_header(&mut output, info);

    for (n, row) in body_rows(tree).iter().enumerate() {
        if n > 0 && n % rows_per_page == 0 {
            rule(&mut output);
            page_footer(&mut output, page);
            output.push('\x0c');
            page += 1;
            page_header(&mut output, info);
        }

        let (no, desc) = match row.level {
            RowLevel::Division => (row.id.clone(), row.title.clone()),
            _ => (String::new(), format!("  > {}", row.title)),
        };
        output.push_str(&table_line(&no, &desc, &format_amount(row.amount)));
    }

    rule(&mut output);
    for row in summary_rows(summary) {
        output.push_str(&format!(
            "{:>width$} | {:>amount_w$}\n",
            row.title,
            format_amount(row.amount),
            width = NO_WIDTH + DESC_WIDTH + 3,
            amount_w = AMOUNT_WIDTH
        ));
    }
    rule(&mut output);
    page_footer(&mut output, page);

    output
}

/// Horizontal text bars for the division breakdown, scaled to the largest
///
/// Returns lines like `PERSIAPAN   ████████░░░░  Rp 12.345`.
pub fn render_chart(breakdown: &[DivisionShare], width: usize) -> String {
    let max = breakdown.iter().map(|d| d.total).fold(Decimal::ZERO, Decimal::max);
    let label_width = breakdown
        .iter()
        .map(|d| d.title.chars().count())
        .max()
        .unwrap_or(0);

    let mut output = String::new();
    for share in breakdown {
        let filled = if max > Decimal::ZERO {
            (share.total * Decimal::from(width) / max)
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_usize()
                .unwrap_or(0)
                .min(width)
        } else {
            0
        };
        output.push_str(&format!(
            "{:<label_width$}  {}{}  {}\n",
            share.title,
            "█".repeat(filled),
            "░".repeat(width - filled),
            format_rupiah(share.total),
        ));
    }
    output
}

/// Write the recap as CSV: `level,id,title,amount`
///
/// Amounts are whole rupiah without grouping so spreadsheets read them as numbers.
pub fn write_csv<W: Write>(writer: W, tree: &BudgetTree, summary: &FinancialSummary) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["level", "id", "title", "amount"])?;

    for row in body_rows(tree).into_iter().chain(summary_rows(summary)) {
        let amount = round_rupiah(row.amount).to_string();
        csv.write_record([row.level.as_str(), row.id.as_str(), row.title.as_str(), amount.as_str()])?;
    }

    csv.flush().map_err(|e| RabError::io("<csv output>", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::summarize;
    use crate::models::{Division, Settings, SubDivision};
    use serde_json::json;

    fn dec(text: &str) -> Decimal {
        text.parse().unwrap()
    }

    fn recap_tree() -> BudgetTree {
        let mut a = Division::new("A", "PEKERJAAN PERSIAPAN");
        let mut a1 = SubDivision::new("A.1", "Pembersihan");
        a1.subtotal = dec("2491500");
        a.subdivisions.push(a1);
        a.total = dec("2491500");

        let mut b = Division::new("B", "STRUKTUR BAWAH");
        let mut b1 = SubDivision::new("B.1", "Tanah");
        b1.subtotal = dec("1000.4");
        b.subdivisions.push(b1);
        b.total = dec("1000.4");

        BudgetTree {
            divisions: vec![a, b],
        }
    }

    fn info() -> ProjectInfo {
        let mut info = ProjectInfo::new();
        info.insert("name".into(), json!("Gedung Operasional"));
        info.insert("location".into(), json!("Bandung"));
        info.insert("owner".into(), json!("OM RIO"));
        info
    }

    #[test]
    fn amounts_are_grouped_and_rounded() {
        assert_eq!(format_amount(Decimal::ZERO), "0");
        assert_eq!(format_amount(dec("999")), "999");
        assert_eq!(format_amount(dec("1000.00")), "1.000");
        assert_eq!(format_amount(dec("1221000")), "1.221.000");
        assert_eq!(format_amount(dec("12457.5")), "12.458");
        assert_eq!(format_amount(dec("100.49")), "100");
        assert_eq!(format_amount(dec("-0.3")), "0");
        assert_eq!(format_amount(dec("-2.5")), "-3");
        assert_eq!(format_amount(dec("-1500000")), "-1.500.000");
    }

    #[test]
    fn rupiah_prefix() {
        assert_eq!(format_rupiah(dec("3500")), "Rp 3.500");
        assert_eq!(format_rupiah(dec("100.5")), "Rp 101");
        assert_eq!(format_rupiah(dec("-2000")), "-Rp 2.000");
    }

    #[test]
    fn text_report_lists_divisions_subdivisions_and_summary() {
        let tree = recap_tree();
        let summary = summarize(dec("1000000"), &Settings::default());
        let text = render_text(&info(), &tree, &summary, DEFAULT_ROWS_PER_PAGE);

        assert!(text.contains("COST ESTIMATE RECAP: GEDUNG OPERASIONAL"));
        assert!(text.contains("Owner: OM RIO"));
        assert!(text.contains("PEKERJAAN PERSIAPAN"));
        assert!(text.contains("  > Pembersihan"));
        assert!(text.contains("2.491.500"));
        assert!(text.contains("OVERHEAD & PROFIT (10%)"));
        assert!(text.contains("TAX (11%)"));
        assert!(text.contains("1.221.000"));
        assert!(text.contains("Page 1"));
        assert!(!text.contains('\x0c'));
    }

    #[test]
    fn text_report_paginates() {
        let tree = recap_tree();
        let summary = summarize(Decimal::ZERO, &Settings::default());
        let text = render_text(&info(), &tree, &summary, 2);

        // Four body rows at two per page.
        assert_eq!(text.matches('\x0c').count(), 1);
        assert!(text.contains("Page 2"));
        assert_eq!(text.matches("COST ESTIMATE RECAP").count(), 2);
    }

    #[test]
    fn chart_scales_to_largest_division() {
        let breakdown = vec![
            DivisionShare {
                title: "PERSIAPAN".into(),
                total: dec("50"),
            },
            DivisionShare {
                title: "STRUKTUR".into(),
                total: dec("100"),
            },
            DivisionShare {
                title: "KOSONG".into(),
                total: Decimal::ZERO,
            },
        ];
        let chart = render_chart(&breakdown, 10);
        let lines: Vec<_> = chart.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].matches('█').count(), 5);
        assert_eq!(lines[1].matches('█').count(), 10);
        assert_eq!(lines[2].matches('█').count(), 0);
        assert!(lines[1].ends_with("Rp 100"));
    }

    #[test]
    fn rate_labels_drop_trailing_zeros() {
        assert_eq!(format_rate(dec("10.00")), "10");
        assert_eq!(format_rate(dec("12.50")), "12.5");
    }

    #[test]
    fn chart_of_empty_budget_is_empty() {
        assert_eq!(render_chart(&[], 10), "");
    }

    #[test]
    fn csv_report_has_rows_in_tree_order() {
        let tree = recap_tree();
        let summary = summarize(dec("2492500.4"), &Settings::default());
        let mut buf = Vec::new();
        write_csv(&mut buf, &tree, &summary).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "level,id,title,amount");
        assert_eq!(lines[1], "division,A,PEKERJAAN PERSIAPAN,2491500");
        assert_eq!(lines[2], "subdivision,A.1,Pembersihan,2491500");
        assert_eq!(lines[4], "subdivision,B.1,Tanah,1000");
        assert_eq!(lines[5], "summary,,REAL COST,2492500");
        assert!(lines[6].starts_with("summary,,OVERHEAD & PROFIT (10%),"));
        // 2492500.4 * 1.1 * 1.11 = 3043342.9884
        assert_eq!(lines[8], "summary,,GRAND TOTAL,3043343");
        assert_eq!(lines.len(), 9);
    }
}
