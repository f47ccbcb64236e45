//! Terminal UI for the vehicle registry: browse vehicles, review their certificates,
//! replace certificate files and decommission vehicles.

mod app;
mod config;
mod input;
mod ui;

use std::{
    fs::{self, OpenOptions},
    io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration as StdDuration,
};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use registro_core::{
    memory::MemoryStore,
    model::{Attachment, Plate},
    ports::ListStore,
    service::{Action, RegistroError, RegistroService},
};
use registro_store_sharepoint::SharePointStore;
use reqwest::Client;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::{App, Screen};
use crate::config::{Config, StoreConfig};
use crate::input::Command;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_logging(&config.log_file)?;

    // Store + service setup
    let store = build_store(&config)?;
    let service = Arc::new(RegistroService::new(store, &config.titles));

    // App state
    let app = App::new(service, config.company);

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        warn!(error = %err, "registro stopped with an error");
    }
    res
}

// The terminal belongs to the UI, so logs go to a file.
fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();
    Ok(())
}

fn build_store(config: &Config) -> Result<Arc<dyn ListStore>> {
    match &config.store {
        StoreConfig::Memory => {
            info!("no site configured, using the in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreConfig::SharePoint(site) => {
            let client = Client::builder().user_agent("registro/0.1").build()?;
            let store = SharePointStore::new(client, site.clone())?;
            info!(site = %site.site_url, "using SharePoint store");
            Ok(Arc::new(store))
        }
    }
}

async fn run(terminal: &mut Term, mut app: App) -> Result<()> {
    loop {
        // Load the grid once per key; `r` resets the gate.
        if app.screen == Screen::Grid && app.grid_gate.enter(app.grid_key()) {
            load_grid(terminal, &mut app).await?;
        }

        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            match input::handle_key_event(key, &mut app) {
                Command::Quit => break,
                Command::None => {}
                Command::ReloadGrid => app.grid_gate.reset(),
                Command::OpenVehicle => open_vehicle(terminal, &mut app).await?,
                Command::AttachFile => attach_file(terminal, &mut app).await?,
                Command::Decommission => decommission(terminal, &mut app).await?,
            }
        }
    }

    Ok(())
}

fn start_loading(terminal: &mut Term, app: &mut App) -> Result<()> {
    app.is_loading = true;
    app.clear_messages();
    terminal.draw(|frame| ui::draw(frame, app))?;
    Ok(())
}

async fn load_grid(terminal: &mut Term, app: &mut App) -> Result<()> {
    start_loading(terminal, app)?;
    let result = app.service.vehicles().list(app.company).await;
    app.is_loading = false;

    match result {
        Ok(vehicles) => {
            app.grid_index = app.grid_index.min(vehicles.len().saturating_sub(1));
            app.vehicles = vehicles;
        }
        Err(err) => {
            warn!(error = %err, "vehicle list failed to load");
            app.set_error(format!(
                "No se pudo cargar la lista: {}",
                RegistroError::from(err).user_message()
            ));
        }
    }
    Ok(())
}

async fn open_vehicle(terminal: &mut Term, app: &mut App) -> Result<()> {
    let Some(plate) = app.selected_plate() else {
        app.set_error("No hay vehículo seleccionado.");
        return Ok(());
    };

    start_loading(terminal, app)?;
    let loaded = app.service.load(&plate).await;
    let rows = app.service.certificates().list_for_display(&plate).await;
    app.is_loading = false;

    match (loaded, rows) {
        (Ok(Some(loaded)), Ok(rows)) => app.show_vehicle(loaded, rows),
        (Ok(None), Ok(_)) => {
            app.set_error(format!("La placa {plate} ya no existe. Pulsa r para recargar."));
        }
        (Err(err), _) | (Ok(_), Err(err)) => {
            app.set_error(format!(
                "No se pudo cargar {plate}: {}",
                RegistroError::from(err).user_message()
            ));
        }
    }
    Ok(())
}

async fn attach_file(terminal: &mut Term, app: &mut App) -> Result<()> {
    let (Some(kind), Some(plate)) = (app.selected_kind(), Plate::parse(&app.form.vehicle.placa))
    else {
        app.set_error("Selecciona un certificado existente para adjuntar.");
        return Ok(());
    };

    let path = PathBuf::from(app.path_input.trim());
    let Some(file_name) = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
    else {
        app.set_error("Escribe la ruta de un archivo.");
        return Ok(());
    };
    let content = match fs::read(&path) {
        Ok(content) => content,
        Err(err) => {
            app.set_error(format!("No se pudo leer {}: {err}", path.display()));
            return Ok(());
        }
    };

    app.form.stage(kind, Attachment::new(file_name, content));
    start_loading(terminal, app)?;
    let result = app
        .service
        .save(Action::Update, &mut app.form, App::today())
        .await;

    match result {
        Ok(outcome) => {
            let rows = app
                .service
                .certificates()
                .list_for_display(&plate)
                .await;
            app.is_loading = false;
            match rows {
                Ok(rows) => app.certificates = rows,
                Err(err) => warn!(error = %err, "certificate rows failed to refresh"),
            }
            app.path_input.clear();
            app.screen = Screen::Vehicle;
            app.set_info(outcome.message());
        }
        Err(err) => {
            app.is_loading = false;
            warn!(error = %err, %kind, "attachment replacement failed");
            app.set_error(format!("Error al guardar: {}", err.user_message()));
        }
    }
    Ok(())
}

async fn decommission(terminal: &mut Term, app: &mut App) -> Result<()> {
    start_loading(terminal, app)?;
    let result = app
        .service
        .save(Action::Decommission, &mut app.form, App::today())
        .await;
    app.is_loading = false;

    match result {
        Ok(outcome) => {
            app.back_to_grid();
            app.grid_gate.reset();
            app.set_info(outcome.message());
        }
        Err(err) => {
            warn!(error = %err, "decommission failed");
            app.set_error(format!("Error al dar de baja: {}", err.user_message()));
        }
    }
    Ok(())
}
