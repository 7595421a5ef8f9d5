use egui::epaint::Shadow;
use egui::{
    vec2, Color32, Context, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WidthClass {
    Compact,
    Regular,
    Wide,
}

#[derive(Clone, Debug)]
pub struct AppTheme {
    pub surfaces: SurfaceTokens,
    pub text: TextTokens,
    pub status: StatusTokens,
    pub controls: ControlTokens,
    pub layout: LayoutTokens,
    pub breakpoints: Breakpoints,
    pub shadows: ShadowTokens,
}

#[derive(Clone, Debug)]
pub struct SurfaceTokens {
    pub app_bg: Color32,
    pub panel_bg: Color32,
    pub card_bg: Color32,
    pub canvas_bg: Color32,
    pub stroke_soft: Color32,
    pub stroke_strong: Color32,
    pub accent: Color32,
    pub accent_soft: Color32,
}

#[derive(Clone, Debug)]
pub struct TextTokens {
    pub primary: Color32,
    pub secondary: Color32,
    pub muted: Color32,
    pub accent: Color32,
}

/// Clinical status colors: urgency banners, confidence meter, notices.
#[derive(Clone, Debug)]
pub struct StatusTokens {
    pub danger: Color32,
    pub danger_soft: Color32,
    pub warning: Color32,
    pub success: Color32,
}

#[derive(Clone, Debug)]
pub struct ControlTokens {
    pub card_rounding: f32,
    pub panel_rounding: f32,
    pub chip_rounding: f32,
    pub button_rounding: f32,
    pub toolbar_icon_size: f32,
    pub action_height: f32,
}

#[derive(Clone, Debug)]
pub struct LayoutTokens {
    pub space_1: f32,
    pub space_2: f32,
    pub space_3: f32,
    pub space_4: f32,
    pub panel_padding_x: f32,
    pub panel_padding_y: f32,
    pub control_gap: f32,
    pub group_gap: f32,
    pub toolbar_height: f32,
    pub action_bar_height: f32,
    pub chip_h: f32,
    pub chip_w_tool: f32,
    pub report_panel_width: f32,
}

#[derive(Clone, Debug)]
pub struct Breakpoints {
    pub compact_max: f32,
    pub regular_max: f32,
}

#[derive(Clone, Debug)]
pub struct ShadowTokens {
    pub ambient: Color32,
    pub elevation: Color32,
    pub focus_ring: Color32,
}

impl AppTheme {
    pub fn width_class(&self, width: f32) -> WidthClass {
        width_class(width, &self.breakpoints)
    }
}

pub fn width_class(width: f32, breakpoints: &Breakpoints) -> WidthClass {
    if width <= breakpoints.compact_max {
        WidthClass::Compact
    } else if width <= breakpoints.regular_max {
        WidthClass::Regular
    } else {
        WidthClass::Wide
    }
}

pub fn clinical_theme() -> AppTheme {
    AppTheme {
        surfaces: SurfaceTokens {
            app_bg: Color32::from_rgb(0x0F, 0x17, 0x2A),
            panel_bg: Color32::from_rgb(0x13, 0x1D, 0x31),
            card_bg: Color32::from_rgb(0x1A, 0x25, 0x3B),
            canvas_bg: Color32::from_rgb(0x0B, 0x12, 0x21),
            stroke_soft: Color32::from_rgba_unmultiplied(255, 255, 255, 24),
            stroke_strong: Color32::from_rgba_unmultiplied(255, 255, 255, 46),
            accent: Color32::from_rgb(0x14, 0xB8, 0xA6),
            accent_soft: Color32::from_rgba_unmultiplied(20, 184, 166, 72),
        },
        text: TextTokens {
            primary: Color32::from_rgb(0xF1, 0xF6, 0xFB),
            secondary: Color32::from_rgb(0xAE, 0xBC, 0xCF),
            muted: Color32::from_rgb(0x7E, 0x8C, 0xA3),
            accent: Color32::from_rgb(0x5E, 0xEA, 0xD4),
        },
        status: StatusTokens {
            danger: Color32::from_rgb(0xEF, 0x44, 0x44),
            danger_soft: Color32::from_rgba_unmultiplied(239, 68, 68, 44),
            warning: Color32::from_rgb(0xF5, 0x9E, 0x0B),
            success: Color32::from_rgb(0x22, 0xC5, 0x5E),
        },
        controls: ControlTokens {
            card_rounding: 12.0,
            panel_rounding: 10.0,
            chip_rounding: 8.0,
            button_rounding: 8.0,
            toolbar_icon_size: 18.0,
            action_height: 30.0,
        },
        layout: LayoutTokens {
            space_1: 4.0,
            space_2: 8.0,
            space_3: 12.0,
            space_4: 16.0,
            panel_padding_x: 12.0,
            panel_padding_y: 8.0,
            control_gap: 8.0,
            group_gap: 12.0,
            toolbar_height: 46.0,
            action_bar_height: 50.0,
            chip_h: 28.0,
            chip_w_tool: 40.0,
            report_panel_width: 380.0,
        },
        breakpoints: Breakpoints {
            compact_max: 860.0,
            regular_max: 1180.0,
        },
        shadows: ShadowTokens {
            ambient: Color32::from_rgba_unmultiplied(0, 0, 0, 56),
            elevation: Color32::from_rgba_unmultiplied(0, 0, 0, 110),
            focus_ring: Color32::from_rgba_unmultiplied(45, 212, 191, 200),
        },
    }
}

pub fn apply_theme(ctx: &Context, theme: &AppTheme) {
    let mut style: Style = (*ctx.style()).clone();

    style.spacing.item_spacing = vec2(theme.layout.control_gap, theme.layout.space_2);
    style.spacing.button_padding = vec2(theme.layout.space_3, theme.layout.space_2);
    style.spacing.menu_margin = egui::Margin::symmetric(theme.layout.space_2, theme.layout.space_2);
    style.spacing.window_margin =
        egui::Margin::symmetric(theme.layout.space_3, theme.layout.space_3);

    style.visuals = Visuals::dark();
    style.visuals.override_text_color = Some(theme.text.primary);
    style.visuals.panel_fill = theme.surfaces.panel_bg;
    style.visuals.window_fill = theme.surfaces.panel_bg;
    style.visuals.faint_bg_color = theme.surfaces.panel_bg;
    style.visuals.extreme_bg_color = theme.surfaces.app_bg;
    style.visuals.window_rounding = Rounding::same(theme.controls.panel_rounding);
    style.visuals.widgets.noninteractive.bg_fill = theme.surfaces.panel_bg;
    style.visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, theme.text.secondary);
    style.visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, theme.surfaces.stroke_soft);

    style.visuals.widgets.inactive.bg_fill = theme.surfaces.card_bg;
    style.visuals.widgets.inactive.weak_bg_fill = theme.surfaces.card_bg;
    style.visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, theme.surfaces.stroke_soft);
    style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, theme.text.secondary);

    style.visuals.widgets.hovered.bg_fill = theme.surfaces.card_bg;
    style.visuals.widgets.hovered.weak_bg_fill = theme.surfaces.card_bg;
    style.visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, theme.surfaces.stroke_strong);
    style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, theme.text.primary);

    style.visuals.widgets.active.bg_fill = theme.surfaces.accent_soft;
    style.visuals.widgets.active.bg_stroke = Stroke::new(1.0, theme.surfaces.accent);
    style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, theme.text.primary);

    style.visuals.widgets.open.bg_fill = theme.surfaces.card_bg;
    style.visuals.widgets.open.bg_stroke = Stroke::new(1.0, theme.surfaces.stroke_strong);
    style.visuals.widgets.open.fg_stroke = Stroke::new(1.0, theme.text.primary);

    style.visuals.selection.bg_fill = theme.surfaces.accent_soft;
    style.visuals.selection.stroke = Stroke::new(1.0, theme.surfaces.accent);
    style.visuals.hyperlink_color = theme.text.accent;
    style.visuals.popup_shadow = Shadow {
        offset: vec2(0.0, 10.0),
        blur: 22.0,
        spread: 0.0,
        color: theme.shadows.ambient,
    };
    style.visuals.window_shadow = Shadow {
        offset: vec2(0.0, 14.0),
        blur: 28.0,
        spread: 0.0,
        color: theme.shadows.elevation,
    };

    style.visuals.widgets.noninteractive.rounding = Rounding::same(theme.controls.button_rounding);
    style.visuals.widgets.inactive.rounding = Rounding::same(theme.controls.button_rounding);
    style.visuals.widgets.hovered.rounding = Rounding::same(theme.controls.button_rounding);
    style.visuals.widgets.active.rounding = Rounding::same(theme.controls.button_rounding);
    style.visuals.widgets.open.rounding = Rounding::same(theme.controls.button_rounding);

    style.text_styles.insert(
        TextStyle::Heading,
        FontId::new(30.0, FontFamily::Proportional),
    );
    style.text_styles.insert(
        TextStyle::Name("Title".into()),
        FontId::new(22.0, FontFamily::Proportional),
    );
    style
        .text_styles
        .insert(TextStyle::Body, FontId::new(15.0, FontFamily::Proportional));
    style.text_styles.insert(
        TextStyle::Button,
        FontId::new(14.0, FontFamily::Proportional),
    );
    style.text_styles.insert(
        TextStyle::Small,
        FontId::new(12.0, FontFamily::Proportional),
    );

    ctx.set_style(style);
}

#[cfg(test)]
mod tests {
    use super::{width_class, Breakpoints, WidthClass};

    #[test]
    fn width_class_boundaries_are_stable() {
        let breakpoints = Breakpoints {
            compact_max: 860.0,
            regular_max: 1180.0,
        };

        assert_eq!(width_class(640.0, &breakpoints), WidthClass::Compact);
        assert_eq!(width_class(860.0, &breakpoints), WidthClass::Compact);
        assert_eq!(width_class(861.0, &breakpoints), WidthClass::Regular);
        assert_eq!(width_class(1180.0, &breakpoints), WidthClass::Regular);
        assert_eq!(width_class(1181.0, &breakpoints), WidthClass::Wide);
    }
}
