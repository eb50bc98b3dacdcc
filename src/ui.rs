use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    symbols,
};

use crate::app::{App, CatalogSnapshot};
use crate::catalog::Row;
use crate::models::{CatalogEntry, TargetKind, TargetType, View};
use crate::network::lock;
use crate::selection::{GroupSelection, SelectionGate};
use crate::theme::Theme;

/// Renders the whole screen for the current view.
pub fn render(f: &mut Frame, app: &App, catalog: &CatalogSnapshot, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // view tabs
            Constraint::Length(3), // filters / target header
            Constraint::Min(3),    // list
            Constraint::Length(3), // footer
        ])
        .split(f.area());

    render_tabs(f, chunks[0], app.view, theme);
    match app.view {
        View::Catalog => {
            render_filters(f, chunks[1], app, theme);
            render_catalog(f, chunks[2], app, catalog, None, theme);
        }
        View::Targets => {
            let source = if app.backend.is_remote() { "remote API" } else { "local catalog file" };
            let header = Paragraph::new(format!("{} targets configured, checks from {}", app.targets.len(), source))
                .block(Block::default().borders(Borders::ALL))
                .style(Style::default().fg(theme.text_secondary));
            f.render_widget(header, chunks[1]);
            render_targets(f, chunks[2], app, theme);
        }
        View::Selection => {
            render_selection_header(f, chunks[1], app, theme);
            render_catalog(f, chunks[2], app, catalog, app.active_gate(), theme);
        }
    }
    render_footer(f, chunks[3], app, catalog, theme);
    render_notice(f, app, theme);
}

fn render_tabs(f: &mut Frame, area: Rect, view: View, theme: &Theme) {
    let selected = match view {
        View::Catalog => 0,
        View::Targets | View::Selection => 1,
    };
    let tabs = Tabs::new(["Checks catalog [1]", "Targets [2]"])
        .block(Block::default().borders(Borders::ALL).title("checkcat"))
        .style(Style::default().fg(theme.text))
        .highlight_style(Style::default().fg(theme.selection_fg).bold().underlined())
        .select(selected)
        .divider(symbols::DOT)
        .padding(" ", " ");
    f.render_widget(tabs, area);
}

fn render_filters(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let filter = app.filter.effective_filter();
    let cluster_style = if app.filter.cluster_type_enabled() {
        theme.filter_active
    } else {
        theme.filter_disabled
    };
    let line = Line::from(vec![
        Span::raw("t: "),
        Span::styled(filter.target_type.label().to_string(), theme.filter_active),
        Span::raw("   c: "),
        Span::styled(filter.cluster_type.label().to_string(), cluster_style),
        Span::raw("   p: "),
        Span::styled(filter.provider.label().to_string(), theme.filter_active),
    ]);
    let block = Block::default()
        .title("Filters")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.focus_border));
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn render_targets(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let block = Block::default().title("Targets").borders(Borders::ALL);
    if app.targets.is_empty() {
        let empty = Paragraph::new("No targets configured. Add [[targets]] entries to checkcat.toml")
            .block(block)
            .style(theme.error);
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = app
        .targets
        .iter()
        .map(|target| {
            let kind = match target.kind {
                TargetKind::Host => "host",
                TargetKind::Cluster => "cluster",
            };
            let saved = app.backend.saved_selection(&target.id).map(|s| s.len()).unwrap_or(0);
            let mut spans = vec![
                Span::styled(target.name.clone(), Style::default().fg(theme.text).bold()),
                Span::raw(" "),
                Span::styled(format!("[{kind}]"), theme.target_tag),
                Span::raw(format!(" {}", target.provider.label())),
            ];
            if target.kind == TargetKind::Cluster {
                spans.push(Span::raw(format!(" · {}", target.cluster_type.label())));
            }
            ListItem::new(vec![
                Line::from(spans),
                Line::from(Span::styled(
                    format!("{} check{} saved", saved, if saved == 1 { "" } else { "s" }),
                    Style::default().fg(theme.text_secondary).italic(),
                )),
            ])
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.target_cursor));
    let list = List::new(items)
        .block(block.border_style(Style::default().fg(theme.focus_border)))
        .highlight_style(Style::default().fg(theme.selection_fg))
        .highlight_symbol("→ ");
    f.render_stateful_widget(list, area, &mut state);
}

fn render_selection_header(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let Some(target) = app.active_target() else {
        return;
    };
    let selected = app.active_gate().map(SelectionGate::len).unwrap_or(0);
    let saved = app.saved_gate().map(|g| g.len()).unwrap_or(0);
    let save_label = if app.saving() { " saving… " } else { " s: Save " };
    let exec_style = if app.can_start_execution() {
        theme.button
    } else {
        theme.button_disabled
    };
    let line = Line::from(vec![
        Span::styled(target.name.clone(), Style::default().fg(theme.text).bold()),
        Span::raw(format!("  {selected} checks selected, {saved} saved   ")),
        Span::styled(save_label, theme.button),
        Span::raw("  "),
        Span::styled(" x: Start execution ", exec_style),
    ]);
    let block = Block::default()
        .title("Check selection")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.focus_border));
    f.render_widget(Paragraph::new(line).block(block), area);
}

/// Grouped catalog; with a gate the rows carry selection checkboxes.
fn render_catalog(
    f: &mut Frame,
    area: Rect,
    app: &App,
    catalog: &CatalogSnapshot,
    gate: Option<&SelectionGate>,
    theme: &Theme,
) {
    let block = Block::default()
        .title("Checks")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.focus_border));

    if let Some(error) = &catalog.error {
        let text = vec![
            Line::from(Span::styled(format!("Unable to load checks catalog: {error}"), theme.error)),
            Line::from("Press r to try again"),
        ];
        f.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: true }), area);
        return;
    }
    if catalog.loading && catalog.is_empty() {
        f.render_widget(Paragraph::new("Loading checks catalog...").block(block), area);
        return;
    }
    if catalog.is_empty() {
        f.render_widget(
            Paragraph::new("Checks catalog is empty.")
                .block(block)
                .style(Style::default().fg(theme.text_secondary)),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = app
        .rows(catalog)
        .into_iter()
        .map(|row| match row {
            Row::Group { group } => {
                let g = &catalog.groups[group];
                let arrow = if app.open_groups.is_open(group, &g.name) { "▼" } else { "▶" };
                let mut spans = Vec::new();
                if let Some(gate) = gate {
                    let marker = match gate.group_selection(g.check_ids()) {
                        GroupSelection::All => "[x] ",
                        GroupSelection::Some => "[-] ",
                        GroupSelection::None => "[ ] ",
                    };
                    spans.push(Span::styled(marker, theme.checkbox_on));
                }
                spans.push(Span::styled(format!("{arrow} {} ({})", g.name, g.checks.len()), theme.group_header));
                ListItem::new(Line::from(spans))
            }
            Row::Check { group, check } => {
                let entry = &catalog.groups[group].checks[check];
                ListItem::new(check_line(entry, gate, theme))
            }
            Row::Remediation { group, check } => {
                let entry = &catalog.groups[group].checks[check];
                let lines: Vec<Line> = entry
                    .remediation
                    .lines()
                    .map(|l| Line::from(Span::styled(format!("      {l}"), theme.remediation)))
                    .collect();
                ListItem::new(lines)
            }
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.cursor));
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(theme.selection_fg).bold())
        .highlight_symbol("→ ");
    f.render_stateful_widget(list, area, &mut state);
}

fn check_line(entry: &CatalogEntry, gate: Option<&SelectionGate>, theme: &Theme) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    if let Some(gate) = gate {
        if gate.contains(&entry.id) {
            spans.push(Span::styled("[x] ", theme.checkbox_on));
        } else {
            spans.push(Span::raw("[ ] "));
        }
    }
    spans.push(Span::styled(entry.id.clone(), theme.check_id));
    if entry.premium {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(" Premium ", theme.premium_badge));
    }
    match entry.target_type() {
        Some(TargetType::Host) => spans.push(Span::styled(" [host]", theme.target_tag)),
        Some(TargetType::Cluster) => spans.push(Span::styled(" [cluster]", theme.target_tag)),
        _ => {}
    }
    spans.push(Span::raw(format!(" {}", entry.description)));
    Line::from(spans)
}

fn render_footer(f: &mut Frame, area: Rect, app: &App, catalog: &CatalogSnapshot, theme: &Theme) {
    let hints = match app.view {
        View::Catalog => "t/c/p Filters | r Refresh | ↑/↓ j/k Move | <Enter> Expand | y Copy remediation | Tab Targets | q Quit",
        View::Targets => "↑/↓ j/k Move | <Enter> Select checks | Tab Catalog | q Quit",
        View::Selection => "<Space> Toggle | <Enter> Expand | s Save | x Start execution | Esc Back | q Quit",
    };
    let status = match (&catalog.fetched_at, catalog.loading) {
        (_, true) => " | loading…".to_string(),
        (Some(at), false) => format!(" | updated {at}"),
        (None, false) => String::new(),
    };
    let footer = Paragraph::new(format!("{hints}{status}"))
        .block(Block::default().borders(Borders::ALL))
        .style(theme.footer);
    f.render_widget(footer, area);
}

fn render_notice(f: &mut Frame, app: &App, theme: &Theme) {
    let notice = lock(&app.backend.notice);
    if !notice.visible {
        return;
    }
    let popup_area = centered_rect(50, 30, f.area());
    f.render_widget(Clear, popup_area);
    let title = if notice.loading { "Working…" } else { "Notice (Esc to close)" };
    let para = Paragraph::new(notice.text.clone())
        .block(Block::default().title(title).borders(Borders::ALL).style(theme.popup_border))
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Left)
        .style(theme.popup_text);
    f.render_widget(para, popup_area);
}

/// Centers a rectangle within another rectangle.
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r)[1];
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical)[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogEntry;

    #[test]
    fn centered_rect_stays_inside() {
        let outer = Rect::new(0, 0, 100, 40);
        let inner = centered_rect(50, 30, outer);
        assert!(inner.x >= outer.x && inner.right() <= outer.right());
        assert!(inner.y >= outer.y && inner.bottom() <= outer.bottom());
        assert_eq!(inner.width, 50);
    }

    #[test]
    fn check_line_shows_badge_and_checkbox() {
        let entry: CatalogEntry = serde_json::from_value(serde_json::json!({
            "id": "373DB8",
            "description": "Cluster fencing timeout",
            "premium": true,
            "metadata": { "target_type": "cluster" },
        }))
        .unwrap();
        let mut gate = SelectionGate::default();
        gate.toggle("373DB8");

        let text: String = check_line(&entry, Some(&gate), &Theme::default())
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect();
        assert!(text.contains("[x] 373DB8"));
        assert!(text.contains("Premium"));
        assert!(text.contains("[cluster]"));
        assert!(text.ends_with("Cluster fencing timeout"));
    }
}
