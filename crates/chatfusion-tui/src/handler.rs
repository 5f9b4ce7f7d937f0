use chatfusion_core::{InputBuffer, SubmitOutcome};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, InputMode, Screen};
use crate::tui::AppEvent;

const PAGE: u16 = 10;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    app.notice = None;

    match app.screen {
        Screen::Login => handle_login(app, key),
        Screen::Chat if app.show_profile_menu => handle_profile_menu(app, key),
        Screen::Chat => match app.input_mode {
            InputMode::Normal => handle_chat_normal(app, key),
            InputMode::Editing => handle_chat_editing(app, key),
        },
    }
}

fn handle_login(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => app.sign_in(),
        _ => edit_input(&mut app.login_input, key),
    }
}

fn handle_profile_menu(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('l') | KeyCode::Enter => app.sign_out(),
        KeyCode::Char('p') | KeyCode::Esc => app.show_profile_menu = false,
        _ => {}
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('i') | KeyCode::Enter | KeyCode::Tab => app.input_mode = InputMode::Editing,
        KeyCode::Char('p') => app.show_profile_menu = true,
        KeyCode::Char('b') => app.show_sidebar = !app.show_sidebar,
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::PageDown => app.scroll_down(PAGE),
        KeyCode::PageUp => app.scroll_up(PAGE),
        KeyCode::Char('g') | KeyCode::Home => app.chat_scroll = 0,
        KeyCode::Char('G') | KeyCode::End => app.chat_scroll = app.chat_max_scroll,
        _ => {}
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => submit(app),
        KeyCode::PageDown => app.scroll_down(PAGE),
        KeyCode::PageUp => app.scroll_up(PAGE),
        _ => {
            if let Some(session) = app.session.as_mut() {
                edit_input(session.input_mut(), key);
            }
        }
    }
}

fn submit(app: &mut App) {
    let Some(session) = app.session.as_mut() else {
        return;
    };

    if session.submit_input() == SubmitOutcome::Rejected {
        app.notice = Some("Still waiting for the last reply; your message is kept.".to_string());
    }
}

fn edit_input(input: &mut InputBuffer, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.home(),
        KeyCode::End => input.end(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => input.insert(c),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}
