use ratatui::style::{Color, Modifier, Style};

pub struct Theme {
    pub focus_border: Color,
    pub text: Color,
    pub text_secondary: Color,
    pub selection_fg: Color,

    // Specific components
    pub filter_active: Style,
    pub filter_disabled: Style,
    pub group_header: Style,
    pub check_id: Style,
    pub premium_badge: Style,
    pub target_tag: Style,
    pub remediation: Style,
    pub checkbox_on: Style,
    pub error: Style,
    pub button: Style,
    pub button_disabled: Style,
    pub footer: Style,
    pub popup_border: Style,
    pub popup_text: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            focus_border: Color::Cyan,
            text: Color::White,
            text_secondary: Color::Gray,
            selection_fg: Color::Yellow,

            filter_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            filter_disabled: Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM),
            group_header: Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            check_id: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            premium_badge: Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD),
            target_tag: Style::default().fg(Color::Magenta),
            remediation: Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            checkbox_on: Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            error: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            button: Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD),
            button_disabled: Style::default().fg(Color::DarkGray).bg(Color::Rgb(30, 30, 30)),
            footer: Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
            popup_border: Style::default().fg(Color::Magenta).bg(Color::Black),
            popup_text: Style::default().fg(Color::White),
        }
    }
}
