//! Renders the structured analysis report as cards.

use egui::{vec2, RichText, ScrollArea, Ui};

use crate::analysis::AnalysisReport;
use crate::theme::AppTheme;
use crate::ui_controls;

#[derive(Default)]
pub struct ReportPanelOutput {
    pub copy_report: bool,
}

pub fn show_report_panel(
    ui: &mut Ui,
    theme: &AppTheme,
    report: Option<&AnalysisReport>,
    analysis_running: bool,
) -> ReportPanelOutput {
    let mut out = ReportPanelOutput::default();

    ui.label(
        RichText::new("Clinical Interpretation")
            .strong()
            .size(16.0)
            .color(theme.text.primary),
    );
    ui.add_space(theme.layout.space_2);

    if analysis_running {
        ui_controls::card_frame(theme).show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(
                    RichText::new("Analyzing clinical data…")
                        .color(theme.text.secondary),
                );
            });
        });
        return out;
    }

    let Some(report) = report else {
        ui_controls::card_frame(theme).show(ui, |ui| {
            ui.label(
                RichText::new("No analysis yet. Upload an image, mark the finding, and run Analyze.")
                    .color(theme.text.muted),
            );
        });
        return out;
    };

    ScrollArea::vertical()
        .id_source("medimark_report_scroll")
        .show(ui, |ui| {
            if report.urgent_alert {
                ui_controls::urgent_banner(
                    ui,
                    theme,
                    "Urgent: findings may indicate an immediate emergency",
                );
                ui.add_space(theme.layout.space_2);
            }

            ui_controls::card_frame(theme).show(ui, |ui| {
                ui.label(
                    RichText::new(&report.modality_detected)
                        .strong()
                        .size(15.0)
                        .color(theme.text.primary),
                );
                ui.add_space(theme.layout.space_2);
                ui.label(
                    RichText::new(format!(
                        "Image quality confidence: {:.0}/100",
                        report.confidence_score
                    ))
                    .size(12.0)
                    .color(theme.text.muted),
                );
                ui_controls::confidence_meter(ui, theme, report.confidence_score);
            });

            ui.add_space(theme.layout.space_2);

            ui_controls::card_frame(theme).show(ui, |ui| {
                for line in findings_lines(&report.clinical_findings) {
                    match line {
                        FindingsLine::Heading(text) => {
                            ui.add_space(theme.layout.space_1);
                            ui.label(
                                RichText::new(text)
                                    .strong()
                                    .size(14.0)
                                    .color(theme.text.accent),
                            );
                        }
                        FindingsLine::Bullet(text) => {
                            ui.horizontal_wrapped(|ui| {
                                ui.label(RichText::new("•").color(theme.text.muted));
                                ui.label(RichText::new(text).color(theme.text.secondary));
                            });
                        }
                        FindingsLine::Text(text) => {
                            ui.label(RichText::new(text).color(theme.text.secondary));
                        }
                        FindingsLine::Blank => {
                            ui.add_space(theme.layout.space_2);
                        }
                    }
                }
            });

            ui.add_space(theme.layout.space_3);
            if ui_controls::ghost_button(
                ui,
                theme,
                "Copy report text",
                vec2(150.0, theme.controls.action_height),
            )
            .clicked()
            {
                out.copy_report = true;
            }
        });

    out
}

/// Plain-text rendition of the report, for pasting into a clinical note.
pub fn report_as_text(report: &AnalysisReport) -> String {
    format!(
        "{}\nConfidence: {:.0}/100{}\n\n{}",
        report.modality_detected,
        report.confidence_score,
        if report.urgent_alert {
            "\nURGENT ALERT"
        } else {
            ""
        },
        report.clinical_findings,
    )
}

/// The model returns lightweight Markdown; only headings and bullets are
/// given special treatment, everything else renders verbatim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FindingsLine<'a> {
    Heading(&'a str),
    Bullet(&'a str),
    Text(&'a str),
    Blank,
}

pub fn findings_lines(text: &str) -> impl Iterator<Item = FindingsLine<'_>> {
    text.lines().map(|line| {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            FindingsLine::Blank
        } else if let Some(heading) = trimmed
            .strip_prefix("### ")
            .or_else(|| trimmed.strip_prefix("## "))
            .or_else(|| trimmed.strip_prefix("# "))
        {
            FindingsLine::Heading(heading.trim())
        } else if let Some(bullet) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            FindingsLine::Bullet(bullet.trim())
        } else {
            FindingsLine::Text(trimmed)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{findings_lines, report_as_text, FindingsLine};
    use crate::analysis::AnalysisReport;

    #[test]
    fn findings_lines_classifies_markdown() {
        let text = "## Rhythm\n- Sinus rhythm\n* Rate 72 bpm\n\nNo acute changes.";
        let lines: Vec<FindingsLine<'_>> = findings_lines(text).collect();
        assert_eq!(
            lines,
            vec![
                FindingsLine::Heading("Rhythm"),
                FindingsLine::Bullet("Sinus rhythm"),
                FindingsLine::Bullet("Rate 72 bpm"),
                FindingsLine::Blank,
                FindingsLine::Text("No acute changes."),
            ]
        );
    }

    #[test]
    fn report_text_carries_the_urgent_flag() {
        let report = AnalysisReport {
            modality_detected: "12-Lead ECG".to_string(),
            clinical_findings: "- ST elevation in V2-V4".to_string(),
            confidence_score: 88.0,
            urgent_alert: true,
        };

        let text = report_as_text(&report);
        assert!(text.contains("12-Lead ECG"));
        assert!(text.contains("URGENT ALERT"));
        assert!(text.contains("ST elevation"));

        let calm = AnalysisReport {
            urgent_alert: false,
            ..report
        };
        assert!(!report_as_text(&calm).contains("URGENT ALERT"));
    }
}
