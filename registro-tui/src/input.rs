use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Screen};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    None,
    Quit,
    /// Run `vehicles().list(..)` again, bypassing the load gate
    ReloadGrid,
    /// Run `service.load(..)` for the highlighted plate
    OpenVehicle,
    /// Stage the typed file for the highlighted certificate and save
    AttachFile,
    /// Run the decommission action for the open vehicle
    Decommission,
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Command {
    use KeyCode::{Backspace, Char, Down, Enter, Esc, Up};

    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Command::Quit;
    }
    // The path prompt takes every printable key, `q` included.
    if app.screen != Screen::Attach && key.code == Char('q') && key.modifiers.is_empty() {
        return Command::Quit;
    }

    let mut command = Command::None;

    match app.screen {
        Screen::Grid => match key.code {
            Up | Char('k') => {
                app.grid_index = app.grid_index.saturating_sub(1);
            }
            Down | Char('j') => {
                if app.grid_index + 1 < app.vehicles.len() {
                    app.grid_index += 1;
                }
            }
            Enter => command = Command::OpenVehicle,
            Char('r') => command = Command::ReloadGrid,
            _ => {}
        },

        Screen::Vehicle if app.confirm_decommission => match key.code {
            Char('y' | 'Y') => {
                app.confirm_decommission = false;
                command = Command::Decommission;
            }
            _ => {
                app.confirm_decommission = false;
                app.set_info("Baja cancelada.");
            }
        },

        Screen::Vehicle => match key.code {
            Up | Char('k') => {
                app.certificate_index = app.certificate_index.saturating_sub(1);
            }
            Down | Char('j') => {
                if app.certificate_index + 1 < app.certificates.len() {
                    app.certificate_index += 1;
                }
            }
            Char('a') => {
                if app.selected_kind().is_some() {
                    app.path_input.clear();
                    app.clear_messages();
                    app.screen = Screen::Attach;
                } else {
                    app.set_error("Selecciona un certificado existente para adjuntar.");
                }
            }
            Char('d') => {
                app.confirm_decommission = true;
                app.set_info("¿Dar de baja el vehículo y todos sus certificados? (y/n)");
            }
            Esc => app.back_to_grid(),
            _ => {}
        },

        Screen::Attach => match key.code {
            Char(character) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT)
                {
                    app.path_input.push(character);
                }
            }
            Backspace => {
                app.path_input.pop();
            }
            Enter => command = Command::AttachFile,
            Esc => app.screen = Screen::Vehicle,
            _ => {}
        },
    }
    command
}
