use anyhow::Result;
use arboard::Clipboard;
use crossterm::event::KeyCode;
use tracing::debug;

use crate::app::App;
use crate::models::View;
use crate::network::lock;

/// Applies one key press. Returns `Ok(false)` when the user quits.
pub fn handle_key(app: &mut App, key: KeyCode) -> Result<bool> {
    if lock(&app.backend.notice).visible {
        match key {
            KeyCode::Esc | KeyCode::Enter => app.dismiss_notice(),
            KeyCode::Char('q') => return Ok(false),
            _ => {}
        }
        return Ok(true);
    }

    match key {
        KeyCode::Char('q') => return Ok(false),
        KeyCode::Char('1') => app.show_view(View::Catalog),
        KeyCode::Char('2') => app.show_view(View::Targets),
        KeyCode::Tab => {
            let next = match app.view {
                View::Catalog => View::Targets,
                View::Targets | View::Selection => View::Catalog,
            };
            app.show_view(next);
        }
        _ => match app.view {
            View::Catalog => handle_catalog_key(app, key),
            View::Targets => handle_targets_key(app, key),
            View::Selection => handle_selection_key(app, key),
        },
    }
    Ok(true)
}

fn handle_catalog_key(app: &mut App, key: KeyCode) {
    let current = app.filter.effective_filter();
    match key {
        KeyCode::Char('t') => app.filter.set_target_type(current.target_type.next()),
        KeyCode::Char('c') => {
            // Disabled control: the key is swallowed while not filtering clusters.
            if app.filter.cluster_type_enabled() {
                app.filter.set_cluster_type(current.cluster_type.next());
            }
        }
        KeyCode::Char('p') => app.filter.set_provider(current.provider.next()),
        KeyCode::Char('r') => app.filter.refresh(),
        KeyCode::Char('y') => copy_remediation(app),
        KeyCode::Up | KeyCode::Char('k') => app.move_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_cursor(1),
        KeyCode::Enter | KeyCode::Char(' ') => app.activate_row(),
        _ => {}
    }
}

fn handle_targets_key(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Up | KeyCode::Char('k') => app.move_target_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_target_cursor(1),
        KeyCode::Enter | KeyCode::Char('l') => app.open_target(),
        _ => {}
    }
}

fn handle_selection_key(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Esc | KeyCode::Char('h') => app.show_view(View::Targets),
        KeyCode::Up | KeyCode::Char('k') => app.move_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_cursor(1),
        KeyCode::Char(' ') => app.toggle_selection(),
        KeyCode::Enter => app.activate_row(),
        KeyCode::Char('s') => app.save_selection(),
        KeyCode::Char('x') => {
            if !app.start_execution() {
                debug!(saving = app.saving(), "execution not available");
            }
        }
        KeyCode::Char('y') => copy_remediation(app),
        _ => {}
    }
}

fn copy_remediation(app: &App) {
    let Some(text) = app.remediation_under_cursor() else {
        return;
    };
    let result = Clipboard::new().and_then(|mut cb| cb.set_text(text));
    report_copy(app, result);
}

fn report_copy(app: &App, result: Result<(), arboard::Error>) {
    let mut notice = lock(&app.backend.notice);
    match result {
        Ok(()) => notice.show("Remediation copied to clipboard"),
        Err(e) => {
            debug!(error = %e, "clipboard unavailable");
            notice.show(format!("Clipboard unavailable: {e}"));
        }
    }
}
