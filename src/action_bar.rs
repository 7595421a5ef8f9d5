use egui::{vec2, Align, Layout, RichText, Ui};

use crate::session::EditorState;
use crate::theme::{AppTheme, WidthClass};
use crate::ui_controls;

pub struct ActionBarOutput {
    pub analyze: bool,
    pub save: bool,
    pub copy_image: bool,
    pub clear_image: bool,
    pub sign_out: bool,
}

pub fn should_show_shortcut_label(width_class: WidthClass, available_width: f32) -> bool {
    match width_class {
        WidthClass::Compact => available_width >= 420.0,
        WidthClass::Regular | WidthClass::Wide => true,
    }
}

pub fn show_action_bar(
    ui: &mut Ui,
    theme: &AppTheme,
    state: &EditorState,
    copied_feedback: bool,
    width_class: WidthClass,
) -> ActionBarOutput {
    let action_h = theme.controls.action_height;
    let button_gap = theme.layout.space_3 + 2.0;
    let analyze_w = if width_class == WidthClass::Compact {
        120.0
    } else {
        140.0
    };
    let side_w = if width_class == WidthClass::Compact {
        88.0
    } else {
        98.0
    };
    let shortcut_visible =
        should_show_shortcut_label(width_class, ui.available_width() - analyze_w - side_w * 3.0);

    let mut out = ActionBarOutput {
        analyze: false,
        save: false,
        copy_image: false,
        clear_image: false,
        sign_out: false,
    };

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing = vec2(button_gap, 0.0);

        if ui_controls::ghost_button(ui, theme, "Sign out", vec2(side_w, action_h)).clicked() {
            out.sign_out = true;
        }

        if let Some(status) = &state.status {
            ui.label(
                RichText::new(status)
                    .color(theme.status.warning)
                    .size(12.0),
            );
        }

        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            ui.add_space(theme.layout.space_2);

            if shortcut_visible {
                ui_controls::keycap(ui, theme, "⏎");
                ui.add_space(theme.layout.space_2);
                ui_controls::keycap(ui, theme, "⌘");
                ui.add_space(theme.layout.space_3);
                ui_controls::vertical_divider(ui, theme, 16.0);
                ui.add_space(theme.layout.space_3);
            }

            let analyze_label = if state.analysis_running {
                "Analyzing…"
            } else {
                "Analyze Image"
            };
            let analyze = ui.add_enabled_ui(state.can_analyze(), |ui| {
                ui_controls::primary_button(ui, theme, analyze_label, vec2(analyze_w, action_h))
            });
            if analyze.inner.clicked() {
                out.analyze = true;
            }

            ui.add_space(button_gap);

            if copied_feedback && width_class != WidthClass::Compact {
                ui_controls::subtle_badge(ui, theme, "image copied");
                ui.add_space(button_gap);
            }

            let has_image = state.displayed.is_some();
            let copy = ui.add_enabled_ui(has_image, |ui| {
                ui_controls::ghost_button(ui, theme, "Copy", vec2(side_w, action_h))
            });
            if copy.inner.clicked() {
                out.copy_image = true;
            }

            let save = ui.add_enabled_ui(has_image, |ui| {
                ui_controls::ghost_button(ui, theme, "Save", vec2(side_w, action_h))
            });
            if save.inner.clicked() {
                out.save = true;
            }

            let clear = ui.add_enabled_ui(has_image, |ui| {
                ui_controls::ghost_button(ui, theme, "Clear", vec2(side_w, action_h))
            });
            if clear.inner.clicked() {
                out.clear_image = true;
            }
        });
    });

    out
}

#[cfg(test)]
mod tests {
    use super::should_show_shortcut_label;
    use crate::theme::WidthClass;

    #[test]
    fn compact_width_hides_the_shortcut_label_first() {
        assert!(!should_show_shortcut_label(WidthClass::Compact, 320.0));
        assert!(should_show_shortcut_label(WidthClass::Compact, 420.0));
        assert!(should_show_shortcut_label(WidthClass::Regular, 320.0));
    }
}
