use std::sync::Arc;

use chrono::{Local, NaiveDate};
use registro_core::{
    eligibility::EligibilityFlags,
    gate::LoadGate,
    model::{CertificateKind, CertificateRow, Plate, VehicleSummary},
    service::{Action, LoadedVehicle, RegistrationForm, RegistroService},
    validity::{ValidityMonitor, ValidityReport},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Grid,
    Vehicle,
    Attach,
}

pub(crate) struct App {
    pub service: Arc<RegistroService>,
    pub company: Option<u64>,

    pub screen: Screen,
    pub grid_gate: LoadGate<(Action, Option<u64>)>,
    pub vehicles: Vec<VehicleSummary>,
    pub grid_index: usize,

    pub form: RegistrationForm,
    pub flags: EligibilityFlags,
    pub certificates: Vec<CertificateRow>,
    pub certificate_index: usize,
    pub monitor: ValidityMonitor,

    pub path_input: String,
    pub confirm_decommission: bool,

    pub is_loading: bool,
    pub info_message: Option<String>,
    pub error_message: Option<String>,
}

impl App {
    pub(crate) fn new(service: Arc<RegistroService>, company: Option<u64>) -> Self {
        let mut form = RegistrationForm::default();
        form.vehicle.empresa_id = company;
        Self {
            service,
            company,
            screen: Screen::Grid,
            grid_gate: LoadGate::new(),
            vehicles: Vec::new(),
            grid_index: 0,
            form,
            flags: EligibilityFlags::default(),
            certificates: Vec::new(),
            certificate_index: 0,
            monitor: ValidityMonitor::new(),
            path_input: String::new(),
            confirm_decommission: false,
            is_loading: false,
            info_message: None,
            error_message: None,
        }
    }

    pub(crate) fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Key of the grid load: browsing for updates within the configured company.
    pub(crate) fn grid_key(&self) -> (Action, Option<u64>) {
        (Action::Update, self.company)
    }

    pub(crate) fn selected_plate(&self) -> Option<Plate> {
        self.vehicles
            .get(self.grid_index)
            .and_then(|summary| Plate::parse(&summary.placa))
    }

    pub(crate) fn selected_certificate(&self) -> Option<&CertificateRow> {
        self.certificates.get(self.certificate_index)
    }

    pub(crate) fn selected_kind(&self) -> Option<CertificateKind> {
        self.selected_certificate()
            .and_then(|row| row.kind.parse().ok())
    }

    pub(crate) fn show_vehicle(&mut self, loaded: LoadedVehicle, rows: Vec<CertificateRow>) {
        self.form.load(loaded);
        self.flags = self.form.eligibility();
        self.monitor.reset();
        self.monitor
            .observe(&self.form.documents, &self.flags, Self::today());
        self.certificates = rows;
        self.certificate_index = 0;
        self.confirm_decommission = false;
        self.screen = Screen::Vehicle;
    }

    pub(crate) fn validity(&self) -> &ValidityReport {
        self.monitor.report()
    }

    pub(crate) fn back_to_grid(&mut self) {
        self.form.reset();
        self.certificates.clear();
        self.monitor.reset();
        self.confirm_decommission = false;
        self.screen = Screen::Grid;
    }

    pub(crate) fn set_info<M: Into<String>>(&mut self, message: M) {
        self.info_message = Some(message.into());
        self.error_message = None;
    }

    pub(crate) fn set_error<M: Into<String>>(&mut self, message: M) {
        self.error_message = Some(message.into());
        self.info_message = None;
    }

    pub(crate) fn clear_messages(&mut self) {
        self.info_message = None;
        self.error_message = None;
    }
}
