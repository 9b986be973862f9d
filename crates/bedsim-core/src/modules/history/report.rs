use super::{ForgetSource, SavedEntry};
use crate::common::config::ReportLayout;
use crate::numerics::format_fixed;

const DECIMALS: usize = 2;
const MISSING: &str = "—";
/// Title line plus the blank line under it.
const HEADER_LINES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPage {
    pub number: usize,
    pub lines: Vec<String>,
}

/// Lay entries out one block each, in the order given.
///
/// A block always stays on one page. A block longer than a page gets a page
/// of its own and overflows it rather than being split.
pub fn render_report(entries: &[SavedEntry], layout: &ReportLayout) -> Vec<ReportPage> {
    let capacity = layout.lines_per_page.saturating_sub(HEADER_LINES).max(1);
    let mut pages = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for entry in entries {
        let block = entry_block(entry);
        let needed = if current.is_empty() {
            block.len()
        } else {
            block.len() + 1
        };

        if !current.is_empty() && current.len() + needed > capacity {
            pages.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(String::new());
        }
        current.extend(block);
    }
    if !current.is_empty() {
        pages.push(current);
    }

    pages
        .into_iter()
        .enumerate()
        .map(|(index, lines)| ReportPage {
            number: index + 1,
            lines,
        })
        .collect()
}

pub fn render_report_text(entries: &[SavedEntry], layout: &ReportLayout) -> String {
    let pages = render_report(entries, layout);
    let total = pages.len();
    let mut text = String::new();

    for page in &pages {
        if page.number > 1 {
            text.push('\u{c}');
        }
        text.push_str(&format!("{} (page {}/{})\n\n", layout.title, page.number, total));
        for line in &page.lines {
            text.push_str(line);
            text.push('\n');
        }
    }
    text
}

fn entry_block(entry: &SavedEntry) -> Vec<String> {
    let mut lines = vec![
        entry.name.clone(),
        format!("  α/β: {} Gy", gy(entry.alpha_beta)),
        format!(
            "  Authorized BED: {} Gy | EQD2: {} Gy",
            gy(entry.allowed_bed),
            gy(entry.allowed_eqd2)
        ),
        format!(
            "  Used BED: {} Gy | EQD2: {} Gy",
            gy(entry.used_bed),
            gy(entry.used_eqd2)
        ),
        format!(
            "  Forget: {} %{}",
            gy(entry.forget_percent),
            forget_note(entry.forget_source)
        ),
        format!(
            "  Remaining BED: {} Gy | EQD2: {} Gy",
            gy(entry.remaining_bed),
            gy(entry.remaining_eqd2)
        ),
    ];

    if let Some(dose) = entry.max_dose_per_fraction {
        let fractions = entry
            .planned_fractions
            .map_or_else(|| MISSING.to_string(), |count| count.to_string());
        lines.push(format!(
            "  Max dose per fraction: {} Gy over {fractions} fractions",
            gy(Some(dose))
        ));
        lines.push(format!("  Max total dose: {} Gy", gy(entry.max_total_dose)));
    }

    if let Some(total) = entry.vx_equivalent_total_dose {
        let percent = gy(entry.vx_target_percent);
        lines.push(format!("  Vx: V{} Gy < {percent} %", gy(Some(total))));
        if let Some(per_fraction) = entry.vx_equivalent_dose_per_fraction {
            lines.push(format!(
                "  Vx per fraction: V{} Gy/fraction < {percent} %",
                gy(Some(per_fraction))
            ));
        }
    }

    lines
}

fn gy(value: Option<f64>) -> String {
    let rendered = format_fixed(value, DECIMALS);
    if rendered.is_empty() {
        MISSING.to_string()
    } else {
        rendered
    }
}

fn forget_note(source: Option<ForgetSource>) -> &'static str {
    match source {
        Some(ForgetSource::Computed) => " (model)",
        Some(ForgetSource::Overridden) => " (manual)",
        Some(ForgetSource::Defaulted) => " (no recovery credit)",
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::{render_report, render_report_text};
    use crate::common::config::ReportLayout;
    use crate::modules::history::{ForgetSource, SavedEntry};

    fn entry(name: &str) -> SavedEntry {
        SavedEntry {
            name: name.to_string(),
            alpha_beta: Some(2.0),
            allowed_bed: Some(100.0),
            allowed_eqd2: Some(50.0),
            used_bed: Some(60.0),
            used_eqd2: Some(30.0),
            forget_percent: Some(50.0),
            forget_source: Some(ForgetSource::Computed),
            remaining_bed: Some(70.0),
            remaining_eqd2: Some(35.0),
            ..SavedEntry::default()
        }
    }

    fn layout(lines_per_page: usize) -> ReportLayout {
        ReportLayout {
            title: "Summary".to_string(),
            lines_per_page,
        }
    }

    #[test]
    fn block_lists_every_known_result() {
        let pages = render_report(&[entry("Spinal cord")], &layout(48));
        assert_eq!(pages.len(), 1);
        assert_eq!(
            pages[0].lines,
            vec![
                "Spinal cord",
                "  α/β: 2.00 Gy",
                "  Authorized BED: 100.00 Gy | EQD2: 50.00 Gy",
                "  Used BED: 60.00 Gy | EQD2: 30.00 Gy",
                "  Forget: 50.00 % (model)",
                "  Remaining BED: 70.00 Gy | EQD2: 35.00 Gy",
            ]
        );
    }

    #[test]
    fn optional_lines_appear_only_when_known() {
        let planned = SavedEntry {
            planned_fractions: Some(5),
            max_dose_per_fraction: Some(4.0955),
            max_total_dose: Some(20.4775),
            vx_equivalent_total_dose: Some(15.24),
            vx_target_percent: Some(30.0),
            allowed_eqd2: None,
            ..entry("Brainstem")
        };
        let lines = &render_report(&[planned], &layout(48))[0].lines;
        assert!(lines.contains(&"  Authorized BED: 100.00 Gy | EQD2: — Gy".to_string()));
        assert!(lines.contains(&"  Max dose per fraction: 4.10 Gy over 5 fractions".to_string()));
        assert!(lines.contains(&"  Max total dose: 20.48 Gy".to_string()));
        assert!(lines.contains(&"  Vx: V15.24 Gy < 30.00 %".to_string()));
        assert!(!lines.iter().any(|line| line.contains("per fraction:") && line.contains("Vx")));
    }

    #[test]
    fn blocks_are_never_split_across_pages() {
        let entries = (1..=5)
            .map(|index| entry(&format!("Organ {index}")))
            .collect::<Vec<_>>();
        // Two six-line blocks and their separator fit in 13 lines of body.
        let pages = render_report(&entries, &layout(15));

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].lines.len(), 13);
        assert_eq!(pages[2].lines.len(), 6);
        for page in &pages {
            assert!(page.lines[0].starts_with("Organ "));
            assert_ne!(page.lines.last().map(String::as_str), Some(""));
        }
    }

    #[test]
    fn oversized_block_gets_its_own_page() {
        let pages = render_report(&[entry("Lens"), entry("Liver")], &layout(3));
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].number, 2);
        assert_eq!(pages[1].lines.len(), 6);
    }

    #[test]
    fn text_report_carries_page_headers() {
        let text = render_report_text(&[entry("Lens"), entry("Liver")], &layout(8));
        assert!(text.starts_with("Summary (page 1/2)\n\nLens\n"));
        assert!(text.contains("\u{c}Summary (page 2/2)\n\nLiver\n"));
        assert_eq!(render_report_text(&[], &layout(8)), "");
    }
}
