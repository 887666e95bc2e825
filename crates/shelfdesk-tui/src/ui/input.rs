//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{can_add_password_char, can_add_username_char, App, AppState, LoginFocus};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::LoggingIn => return handle_login_input(app, key).await,
        AppState::Editing => {
            handle_editor_input(app, key).await;
            return Ok(false);
        }
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.delete_pending().await;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.pending_delete = None;
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::Quitting => return Ok(true),
        AppState::Normal => {}
    }

    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Left | KeyCode::Char('[') => app.previous_page(),
        KeyCode::Right | KeyCode::Char(']') => app.next_page(),
        KeyCode::Char(c @ '1'..='5') => {
            if let Some(slot) = c.to_digit(10) {
                app.select_strip_page(slot);
            }
        }
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('n') => app.open_new_product(),
        KeyCode::Char('e') | KeyCode::Enter => app.open_selected_product(),
        KeyCode::Char('d') | KeyCode::Delete => app.confirm_delete_selected(),
        KeyCode::Char('l') => app.logout().await,
        _ => {}
    }
    Ok(false)
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Username,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Username,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => {
                // On failure login_error is set and the form stays up
                app.attempt_login().await;
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.console.login.username.pop();
            }
            LoginFocus::Password => {
                app.console.login.password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => {
            let form = &mut app.console.login;
            match app.login_focus {
                LoginFocus::Username => {
                    if can_add_username_char(form.username.chars().count(), c) {
                        form.username.push(c);
                    }
                }
                LoginFocus::Password => {
                    if can_add_password_char(form.password.chars().count(), c) {
                        form.password.push(c);
                    }
                }
                LoginFocus::Button => {}
            }
        }
        _ => {}
    }
    Ok(false)
}

async fn handle_editor_input(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.submit_editor().await;
        return;
    }

    let Some(editor) = app.editor.as_mut() else {
        app.state = AppState::Normal;
        return;
    };

    match key.code {
        KeyCode::Esc => app.close_editor(),
        KeyCode::Tab | KeyCode::Down | KeyCode::Enter => editor.focus = editor.focus.next(),
        KeyCode::BackTab | KeyCode::Up => editor.focus = editor.focus.prev(),
        KeyCode::Backspace => editor.backspace(),
        KeyCode::Char(c) => editor.push_char(c),
        _ => {}
    }
}
