use chrono::NaiveDate;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
};
use registro_core::{eligibility::EligibilityFlags, model::CertificateKind};

use crate::app::{App, Screen};

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    let company = app
        .company
        .map_or_else(|| "todas las empresas".to_owned(), |id| format!("empresa {id}"));
    let header = Paragraph::new(format!("registro – vehículos y certificados ({company})"))
        .block(Block::default().borders(Borders::ALL).title("Registro vehicular"));
    frame.render_widget(header, *header_area);

    match app.screen {
        Screen::Grid => draw_grid(frame, app, *content_area),
        Screen::Vehicle => draw_vehicle(frame, app, *content_area),
        Screen::Attach => draw_attach(frame, app, *content_area),
    }

    let nav_hint = match app.screen {
        Screen::Grid => "↑/↓ mover · Enter abrir · r recargar · q/Ctrl-C salir",
        Screen::Vehicle if app.confirm_decommission => "y confirmar baja · cualquier otra tecla cancela",
        Screen::Vehicle => "↑/↓ certificado · a adjuntar · d dar de baja · Esc volver · q salir",
        Screen::Attach => "Escribe la ruta del archivo · Enter guardar · Esc cancelar",
    };

    let status_text = if app.is_loading {
        format!("Cargando… · {nav_hint}")
    } else if let Some(msg) = app.error_message.as_ref().or(app.info_message.as_ref()) {
        format!("{msg} · {nav_hint}")
    } else {
        nav_hint.to_owned()
    };

    let status_style = if app.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else if app.is_loading {
        Style::default().fg(Color::Yellow)
    } else if app.info_message.is_some() {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Estado"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn draw_grid(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let title = format!("Vehículos ({})", app.vehicles.len());

    if app.vehicles.is_empty() {
        let paragraph = Paragraph::new("No hay vehículos registrados. Pulsa r para recargar.")
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let rows = app.vehicles.iter().map(|vehicle| {
        let style = if vehicle.activo {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Row::new(vec![
            Cell::from(vehicle.placa.clone()),
            Cell::from(vehicle.marca.clone()),
            Cell::from(vehicle.modelo.clone()),
            Cell::from(vehicle.tipo_unidad.clone()),
            Cell::from(if vehicle.activo { "Sí" } else { "No" }),
        ])
        .style(style)
    });

    let column_widths = [
        Constraint::Length(12),
        Constraint::Min(12),
        Constraint::Min(12),
        Constraint::Length(14),
        Constraint::Length(7),
    ];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["Placa", "Marca", "Modelo", "Unidad", "Activo"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .column_spacing(1);

    let mut state = TableState::default();
    state.select(Some(app.grid_index));
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_vehicle(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // vehicle data
            Constraint::Min(5),    // certificates
            Constraint::Length(5), // validity
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [data_area, certificates_area, validity_area] = chunks else {
        return;
    };

    draw_vehicle_data(frame, app, *data_area);
    draw_certificates(frame, app, *certificates_area);
    draw_validity(frame, app, *validity_area);
}

fn draw_vehicle_data(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let vehicle = &app.form.vehicle;
    let visible = app.form.visibility();

    let mut temperatura = vehicle.temperatura.clone();
    if visible.tipo_temperatura && !vehicle.tipo_temperatura.is_empty() {
        temperatura = format!("{temperatura} ({})", vehicle.tipo_temperatura);
    }
    let mut capacidad = vehicle.capacidad.clone();
    if visible.capacidad_otros && !vehicle.otros.is_empty() {
        capacidad = format!("{capacidad}: {}", vehicle.otros);
    }
    let rampa = if visible.rampa {
        format!("Sí ({} x {})", vehicle.largo_rampa, vehicle.ancho_rampa)
    } else {
        "No".to_owned()
    };
    let bonificacion = if visible.nro_resolucion {
        format!("Sí, resolución {}", vehicle.nro_resolucion)
    } else {
        "No".to_owned()
    };

    let lines = vec![
        Line::from(format!(
            "{} · {} {} · {} · SOAT {}",
            vehicle.placa, vehicle.marca, vehicle.modelo, vehicle.tipo_unidad, vehicle.soat
        )),
        Line::from(format!("Temperatura: {temperatura} · Capacidad: {capacidad}")),
        Line::from(format!("Rampa: {rampa} · Bonificación: {bonificacion}")),
        Line::from(format!(
            "Medidas int./ext.: {} / {} · Altura piso: {} · Carga útil: {} · Bruto: {}",
            vehicle.medidas_internas,
            vehicle.medidas_externas,
            vehicle.altura_piso,
            vehicle.peso_carga_util,
            vehicle.peso_bruto
        )),
        Line::from(format!("Requiere: {}", required_documents(&app.flags))),
        Line::from(if vehicle.activo { "Activo" } else { "Inactivo" }),
    ];

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Vehículo"))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn draw_certificates(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let title = "Certificados (↑/↓, a para reemplazar el archivo)";

    if app.certificates.is_empty() {
        let paragraph = Paragraph::new("Sin certificados registrados para esta placa.")
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(paragraph, area);
        return;
    }

    let rows = app.certificates.iter().map(|row| {
        let label = row
            .kind
            .parse::<CertificateKind>()
            .map_or_else(|_| row.kind.clone(), |kind| kind.label().to_owned());
        Row::new(vec![
            Cell::from(label),
            Cell::from(format_date(row.emision)),
            Cell::from(format_date(row.resolucion)),
            Cell::from(row.anio.clone().unwrap_or_default()),
            Cell::from(row.expediente.clone().unwrap_or_default()),
            Cell::from(row.archivo.clone().unwrap_or_else(|| "—".to_owned())),
        ])
    });

    let column_widths = [
        Constraint::Length(28),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(6),
        Constraint::Length(12),
        Constraint::Min(10),
    ];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["Tipo", "Emisión", "Resolución", "Año", "Expediente", "Archivo"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .column_spacing(1);

    let mut state = TableState::default();
    state.select(Some(app.certificate_index));
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_validity(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let report = app.validity();
    let (text, style) = if report.is_ok() {
        (
            "Fechas de documentos vigentes.".to_owned(),
            Style::default().fg(Color::Green),
        )
    } else {
        (
            report.violations().join("\n"),
            Style::default().fg(Color::Red),
        )
    };

    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Vigencia"))
        .style(style)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn draw_attach(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [input_area, info_area] = chunks else {
        return;
    };

    let kind = app
        .selected_kind()
        .map_or("<certificado>", CertificateKind::label);

    let input = Paragraph::new(app.path_input.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Nuevo archivo para {kind} (ruta, Enter)")),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(input, *input_area);

    let current = app
        .selected_certificate()
        .and_then(|row| row.archivo.as_deref())
        .unwrap_or("ninguno");
    let info = Paragraph::new(format!(
        "Archivo actual: {current}\nEl archivo actual se elimina y se sube el nuevo al guardar."
    ))
    .block(Block::default().borders(Borders::ALL).title(app.form.vehicle.placa.as_str()))
    .wrap(Wrap { trim: true });
    frame.render_widget(info, *info_area);
}

fn required_documents(flags: &EligibilityFlags) -> String {
    let required = [
        (flags.res_bonificacion, "Res. bonificación"),
        (flags.termoking, "Termoking"),
        (flags.sanipes, "Sanipes"),
        (flags.fumigacion, "Fumigación"),
        (flags.limpieza, "Limpieza"),
    ]
    .into_iter()
    .filter_map(|(needed, label)| needed.then_some(label))
    .collect::<Vec<_>>();

    if required.is_empty() {
        "documentos básicos".to_owned()
    } else {
        required.join(", ")
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|value| value.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_documents_lists_enabled_flags() {
        let flags = EligibilityFlags {
            res_bonificacion: true,
            fumigacion: true,
            limpieza: true,
            ..EligibilityFlags::default()
        };
        assert_eq!(
            required_documents(&flags),
            "Res. bonificación, Fumigación, Limpieza"
        );
        assert_eq!(required_documents(&EligibilityFlags::default()), "documentos básicos");
    }

    #[test]
    fn dates_render_day_first() {
        assert_eq!(format_date(NaiveDate::from_ymd_opt(2024, 3, 9)), "09/03/2024");
        assert_eq!(format_date(None), "");
    }
}
