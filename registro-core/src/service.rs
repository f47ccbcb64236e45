//! High-level service facade driving the create, update and decommission actions.

use std::fmt;
use std::slice;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use futures::try_join;
use tracing::{info, warn};

use crate::certificates::CertificateService;
use crate::eligibility::{EligibilityFlags, FieldVisibility};
use crate::model::{
    Attachment, CertificateFields, CertificateKind, CertificateStatus, DocumentDraft, ItemId,
    Plate, StagedDocument, Vehicle,
};
use crate::ports::{ListStore, StoreError};
use crate::validity::{ValidityReport, validate};
use crate::vehicles::VehicleService;

/// Message shown when an action is attempted without a plate.
pub const PLATE_REQUIRED: &str = "Placa es obligatoria.";

#[derive(thiserror::Error, Debug)]
/// Errors surfaced to the user by the registry actions.
pub enum RegistroError {
    /// Input must be corrected before the action can run.
    #[error("Validation failed: {}", .0.join(" "))]
    Validation(Vec<String>),
    /// No certificate exists to attach the file to.
    #[error("No {kind} certificate found for plate {plate}")]
    NotFound {
        /// Plate that was searched.
        plate: String,
        /// Kind that was searched.
        kind: String,
    },
    /// Another action is still running.
    #[error("Another save is still in progress")]
    Busy,
    /// A store call failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl RegistroError {
    /// Text to show the user: the structured server message when there is one,
    /// the violations one per line for validation failures, otherwise the error itself.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(violations) => violations.join("\n"),
            Self::Store(err) => err
                .server_message()
                .map_or_else(|| err.to_string(), ToOwned::to_owned),
            Self::NotFound { .. } | Self::Busy => self.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Titles of the two lists the registry works on.
pub struct ListTitles {
    /// Vehicles list.
    pub vehicles: String,
    /// Certificates list.
    pub certificates: String,
}

impl Default for ListTitles {
    fn default() -> Self {
        Self {
            vehicles: "Vehiculos".to_owned(),
            certificates: "Certificados".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default)]
/// Shared "an action is running" indicator.
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    /// Whether an action currently holds the flag.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Raise the flag for the lifetime of the returned guard.
    ///
    /// Returns `None` when the flag is already raised.
    #[must_use]
    pub fn acquire(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BusyGuard(Arc::clone(&self.0)))
    }
}

/// Lowers the busy flag when dropped, whichever way the action ended.
#[derive(Debug)]
pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// What the save button does.
pub enum Action {
    /// Register a new vehicle together with its documents.
    Create,
    /// Edit a vehicle and commit the staged attachment replacements.
    Update,
    /// Remove a vehicle and every certificate of its plate.
    Decommission,
}

impl Action {
    /// Short key used in logs and load keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "crear",
            Self::Update => "actualizar",
            Self::Decommission => "baja",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Client-held state of the registration form.
pub struct RegistrationForm {
    /// Vehicle being edited.
    pub vehicle: Vehicle,
    /// Documents entered for a new vehicle.
    pub documents: DocumentDraft,
    /// Files picked for existing certificates, committed on the next update.
    pub staged: Vec<StagedDocument>,
}

impl RegistrationForm {
    /// Clear everything except the owning company.
    pub fn reset(&mut self) {
        let empresa_id = self.vehicle.empresa_id;
        let empresa = self.vehicle.empresa.take();
        *self = Self::default();
        self.vehicle.empresa_id = empresa_id;
        self.vehicle.empresa = empresa;
    }

    /// Stage `file` for `kind`, replacing a file staged earlier for the same kind.
    pub fn stage(&mut self, kind: CertificateKind, file: Attachment) {
        self.staged.retain(|staged| staged.kind != kind);
        self.staged.push(StagedDocument { kind, file });
    }

    /// Fill the form from a loaded vehicle. Staged files are dropped.
    ///
    /// The owning company of the form is kept; the loaded one is used only
    /// when the form has none.
    pub fn load(&mut self, loaded: LoadedVehicle) {
        let empresa_id = self.vehicle.empresa_id.or(loaded.vehicle.empresa_id);
        let empresa = self.vehicle.empresa.take();
        self.vehicle = loaded.vehicle;
        self.vehicle.empresa_id = empresa_id;
        self.vehicle.empresa = empresa;
        self.documents = DocumentDraft::default();
        self.documents.apply_status(&loaded.status);
        self.staged.clear();
    }

    /// Certificates the current vehicle has to present.
    #[must_use]
    pub fn eligibility(&self) -> EligibilityFlags {
        EligibilityFlags::for_vehicle(&self.vehicle)
    }

    /// Dependent vehicle fields that are currently shown.
    #[must_use]
    pub fn visibility(&self) -> FieldVisibility {
        FieldVisibility::for_vehicle(&self.vehicle)
    }

    /// Date checks of the drafted documents.
    #[must_use]
    pub fn validity(&self, today: NaiveDate) -> ValidityReport {
        validate(&self.documents, &self.eligibility(), today)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Vehicle and certificate snapshot fetched when a plate is selected.
pub struct LoadedVehicle {
    /// Latest vehicle item of the plate.
    pub vehicle: Vehicle,
    /// Latest certificate values per kind.
    pub status: CertificateStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Result of a decommission.
pub struct Decommissioned {
    /// Certificate items deleted.
    pub certificates: usize,
    /// Whether a vehicle item was deleted.
    pub vehicle: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Result of a successful save.
pub enum SaveOutcome {
    /// A vehicle was registered with its documents.
    Created(ItemId),
    /// A vehicle was updated and its staged files committed.
    Updated {
        /// Vehicle item.
        id: ItemId,
        /// Number of replaced attachments.
        attachments: usize,
    },
    /// A vehicle and its certificates were removed.
    Decommissioned(Decommissioned),
}

impl SaveOutcome {
    /// Confirmation text for the user.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Created(_) | Self::Updated { .. } => "Listo.",
            Self::Decommissioned(_) => "Vehículo dado de baja.",
        }
    }
}

struct DocumentWrite<'draft> {
    kind: CertificateKind,
    fields: CertificateFields,
    files: &'draft [Attachment],
}

/// Certificate writes for the filled-in sections of a draft, in kind order.
fn document_writes(draft: &DocumentDraft) -> Vec<DocumentWrite<'_>> {
    CertificateKind::ALL
        .into_iter()
        .filter(|kind| !draft.is_blank(*kind))
        .map(|kind| {
            let (fields, file) = match kind {
                CertificateKind::TarjetaPropiedad => {
                    (CertificateFields::default(), draft.propiedad.as_ref())
                }
                CertificateKind::ResolucionBonificacion => {
                    (CertificateFields::default(), draft.res_bonificacion.as_ref())
                }
                CertificateKind::CertificadoBonificacion => (
                    CertificateFields {
                        emision: draft.cert_bonificacion.date,
                        ..CertificateFields::default()
                    },
                    draft.cert_bonificacion.file.as_ref(),
                ),
                CertificateKind::RevisionTecnica => (
                    CertificateFields {
                        emision: draft.revision_tecnica.date,
                        anio: Some(draft.revision_tecnica.text.trim().to_owned()),
                        ..CertificateFields::default()
                    },
                    draft.revision_tecnica.file.as_ref(),
                ),
                CertificateKind::Sanipes => (
                    CertificateFields {
                        resolucion: draft.sanipes.date,
                        expediente: Some(draft.sanipes.text.trim().to_owned()),
                        ..CertificateFields::default()
                    },
                    draft.sanipes.file.as_ref(),
                ),
                CertificateKind::Termoking => (
                    CertificateFields {
                        emision: draft.termoking.date,
                        ..CertificateFields::default()
                    },
                    draft.termoking.file.as_ref(),
                ),
                CertificateKind::LimpiezaDesinfeccion => (
                    CertificateFields {
                        emision: draft.limpieza.date,
                        ..CertificateFields::default()
                    },
                    draft.limpieza.file.as_ref(),
                ),
            };
            DocumentWrite {
                kind,
                fields,
                files: file.map(slice::from_ref).unwrap_or_default(),
            }
        })
        .collect()
}

/// Public entry point for the registration form.
pub struct RegistroService {
    vehicles: VehicleService,
    certificates: CertificateService,
    busy: BusyFlag,
}

impl RegistroService {
    /// Create a new service bound to a store handle and the list titles.
    #[must_use]
    pub fn new(store: Arc<dyn ListStore>, titles: &ListTitles) -> Self {
        Self {
            vehicles: VehicleService::new(Arc::clone(&store), titles.vehicles.as_str()),
            certificates: CertificateService::new(store, titles.certificates.as_str()),
            busy: BusyFlag::default(),
        }
    }

    /// Vehicle operations.
    #[must_use]
    pub fn vehicles(&self) -> &VehicleService {
        &self.vehicles
    }

    /// Certificate operations.
    #[must_use]
    pub fn certificates(&self) -> &CertificateService {
        &self.certificates
    }

    /// Indicator raised while an action runs.
    #[must_use]
    pub fn busy(&self) -> &BusyFlag {
        &self.busy
    }

    /// Fetch the vehicle and its certificate snapshot concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first [`StoreError`] of either fetch.
    pub async fn load(&self, plate: &Plate) -> Result<Option<LoadedVehicle>, StoreError> {
        let (vehicle, status) = try_join!(
            self.vehicles.get_by_plate(plate),
            self.certificates.status(plate)
        )?;
        Ok(vehicle.map(|vehicle| LoadedVehicle { vehicle, status }))
    }

    /// Run `action` for the form.
    ///
    /// Creating checks the document dates first and writes every filled-in
    /// document; the form is reset afterwards. Updating commits the staged files
    /// and keeps the form. Decommissioning removes the vehicle and its
    /// certificates and resets the form.
    ///
    /// # Errors
    ///
    /// Returns [`RegistroError::Validation`] without touching the store when the
    /// plate is missing or, on create, a document date is invalid;
    /// [`RegistroError::Busy`] while another action runs; otherwise the first
    /// failing step. Steps already applied stay applied and re-running is safe.
    pub async fn save(
        &self,
        action: Action,
        form: &mut RegistrationForm,
        today: NaiveDate,
    ) -> Result<SaveOutcome, RegistroError> {
        let Some(plate) = Plate::parse(&form.vehicle.placa) else {
            return Err(RegistroError::Validation(vec![PLATE_REQUIRED.to_owned()]));
        };
        if action == Action::Create {
            let report = form.validity(today);
            if !report.is_ok() {
                return Err(RegistroError::Validation(report.into_violations()));
            }
        }

        let _guard = self.busy.acquire().ok_or(RegistroError::Busy)?;
        info!(%plate, %action, "saving");
        let outcome = match action {
            Action::Create => {
                let id = self.vehicles.upsert(&plate, &form.vehicle).await?;
                self.save_documents(&plate, &form.documents).await?;
                form.reset();
                SaveOutcome::Created(id)
            }
            Action::Update => {
                let id = self.vehicles.upsert(&plate, &form.vehicle).await?;
                let attachments = self.commit_staged(&plate, &form.staged).await?;
                form.staged.clear();
                SaveOutcome::Updated { id, attachments }
            }
            Action::Decommission => {
                let removed = self.decommission(&plate).await?;
                form.reset();
                SaveOutcome::Decommissioned(removed)
            }
        };
        Ok(outcome)
    }

    /// Delete every certificate of the plate, then the vehicle. Safe to re-run.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`StoreError`]; the vehicle is kept when a
    /// certificate delete fails.
    pub async fn decommission(&self, plate: &Plate) -> Result<Decommissioned, StoreError> {
        let certificates = self.certificates.delete_all_for_plate(plate.as_str()).await?;
        let vehicle = self.vehicles.delete_by_plate(plate).await?;
        if !vehicle && certificates == 0 {
            warn!(%plate, "decommission found nothing to remove");
        }
        Ok(Decommissioned {
            certificates,
            vehicle,
        })
    }

    async fn save_documents(&self, plate: &Plate, draft: &DocumentDraft) -> Result<(), StoreError> {
        for write in document_writes(draft) {
            self.certificates
                .upsert(plate, write.kind, &write.fields, write.files)
                .await?;
        }
        Ok(())
    }

    async fn commit_staged(
        &self,
        plate: &Plate,
        staged: &[StagedDocument],
    ) -> Result<usize, RegistroError> {
        for document in staged {
            self.certificates
                .replace_attachment(plate, document.kind.as_str(), &document.file)
                .await?;
        }
        Ok(staged.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryStore, Operation};
    use crate::model::{DatedDocument, DatedTextDocument};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
    }

    fn setup() -> (Arc<MemoryStore>, RegistroService) {
        let store = Arc::new(MemoryStore::new());
        let service = RegistroService::new(
            Arc::<MemoryStore>::clone(&store),
            &ListTitles::default(),
        );
        (store, service)
    }

    fn plate(raw: &str) -> Plate {
        Plate::parse(raw).expect("test plate")
    }

    fn carreta_form() -> RegistrationForm {
        RegistrationForm {
            vehicle: Vehicle {
                tipo_unidad: "Carreta".to_owned(),
                bonificacion: true,
                nro_resolucion: "RD-2024-15".to_owned(),
                empresa_id: Some(4),
                empresa: Some("Transportes Andinos".to_owned()),
                ..Vehicle::new(" ABC-123 ")
            },
            ..RegistrationForm::default()
        }
    }

    #[test]
    fn carreta_with_bonus_requires_bonus_fumigation_and_cleaning() {
        let mut form = carreta_form();
        let flags = form.eligibility();
        assert!(flags.res_bonificacion && flags.fumigacion && flags.limpieza);
        assert!(!flags.termoking && !flags.sanipes);

        form.vehicle.temperatura = "Con temperatura".to_owned();
        let flags = form.eligibility();
        assert!(flags.termoking && flags.sanipes);
        assert!(form.visibility().tipo_temperatura);
    }

    #[test]
    fn loading_a_vehicle_keeps_the_form_company() {
        let mut form = carreta_form();
        form.stage(CertificateKind::Termoking, Attachment::new("tk.pdf", vec![1]));
        let loaded = LoadedVehicle {
            vehicle: Vehicle {
                marca: "Volvo".to_owned(),
                empresa_id: Some(4),
                ..Vehicle::new("XYZ-789")
            },
            status: CertificateStatus::default(),
        };

        form.load(loaded.clone());

        assert_eq!(form.vehicle.placa, "XYZ-789");
        assert_eq!(form.vehicle.marca, "Volvo");
        assert_eq!(form.vehicle.empresa_id, Some(4));
        assert_eq!(form.vehicle.empresa.as_deref(), Some("Transportes Andinos"));
        assert!(form.staged.is_empty());

        let mut unscoped = RegistrationForm::default();
        unscoped.load(loaded);
        assert_eq!(unscoped.vehicle.empresa_id, Some(4));
        assert_eq!(unscoped.vehicle.empresa, None);
    }

    #[tokio::test]
    async fn missing_plate_is_rejected_before_any_write() {
        let (store, service) = setup();
        let mut form = RegistrationForm::default();

        let result = service.save(Action::Create, &mut form, date(2024, 8, 15)).await;

        assert!(matches!(result, Err(RegistroError::Validation(ref messages)) if messages == &[PLATE_REQUIRED]));
        assert_eq!(store.mutation_count(), 0);
    }

    #[tokio::test]
    async fn invalid_documents_block_create_with_every_violation() {
        let (store, service) = setup();
        let mut form = carreta_form();
        form.documents.fumigacion.date = Some(date(2023, 1, 1));
        form.documents.limpieza.date = Some(date(2024, 1, 1));

        let err = service
            .save(Action::Create, &mut form, date(2024, 8, 15))
            .await
            .expect_err("stale documents");

        assert_eq!(err.user_message().lines().count(), 2);
        assert_eq!(store.mutation_count(), 0);
        assert!(!service.busy().is_busy());
    }

    #[tokio::test]
    async fn create_writes_vehicle_and_filled_documents_then_resets() {
        let (store, service) = setup();
        let mut form = carreta_form();
        form.documents = DocumentDraft {
            propiedad: Some(Attachment::new("tarjeta.pdf", vec![1])),
            revision_tecnica: DatedTextDocument {
                date: Some(date(2025, 3, 1)),
                text: " 2019 ".to_owned(),
                file: Some(Attachment::new("rt.pdf", vec![2])),
            },
            limpieza: DatedDocument {
                date: Some(date(2024, 8, 1)),
                file: None,
            },
            ..DocumentDraft::default()
        };

        let outcome = service
            .save(Action::Create, &mut form, date(2024, 8, 15))
            .await
            .expect("create");

        assert!(matches!(outcome, SaveOutcome::Created(_)));
        assert_eq!(store.item_count("Vehiculos").expect("count"), 1);
        assert_eq!(store.item_count("Certificados").expect("count"), 3);

        let loaded = service
            .load(&plate("ABC-123"))
            .await
            .expect("load")
            .expect("vehicle present");
        assert_eq!(loaded.vehicle.placa, "ABC-123");
        assert_eq!(loaded.vehicle.nro_resolucion, "RD-2024-15");
        assert_eq!(loaded.status.revision_tecnica_year, "2019");
        assert_eq!(loaded.status.revision_tecnica_date, Some(date(2025, 3, 1)));
        assert_eq!(loaded.status.limpieza_date, Some(date(2024, 8, 1)));

        assert_eq!(form.vehicle.placa, "");
        assert_eq!(form.vehicle.empresa_id, Some(4));
        assert_eq!(form.vehicle.empresa.as_deref(), Some("Transportes Andinos"));
        assert_eq!(form.documents, DocumentDraft::default());
    }

    #[tokio::test]
    async fn update_commits_staged_files_and_keeps_the_form() {
        let (store, service) = setup();
        let mut form = carreta_form();
        form.documents.termoking.file = Some(Attachment::new("tk-old.pdf", vec![1]));
        service
            .save(Action::Create, &mut form, date(2024, 8, 15))
            .await
            .expect("create");

        let loaded = service
            .load(&plate("ABC-123"))
            .await
            .expect("load")
            .expect("vehicle present");
        form.load(loaded);
        form.vehicle.marca = "Scania".to_owned();
        form.stage(CertificateKind::Termoking, Attachment::new("tk-a.pdf", vec![2]));
        form.stage(CertificateKind::Termoking, Attachment::new("tk-b.pdf", vec![3]));
        assert_eq!(form.staged.len(), 1);

        let outcome = service
            .save(Action::Update, &mut form, date(2024, 8, 15))
            .await
            .expect("update");

        assert!(matches!(outcome, SaveOutcome::Updated { attachments: 1, .. }));
        assert!(form.staged.is_empty());
        assert_eq!(form.vehicle.marca, "Scania");
        let rows = service
            .certificates()
            .list_for_display(&plate("ABC-123"))
            .await
            .expect("rows");
        assert_eq!(rows.first().and_then(|row| row.archivo.clone()), Some("tk-b.pdf".to_owned()));
        assert_eq!(store.item_count("Vehiculos").expect("count"), 1);
    }

    #[tokio::test]
    async fn staged_file_without_certificate_fails_and_releases_busy() {
        let (_store, service) = setup();
        let mut form = carreta_form();
        form.stage(CertificateKind::Termoking, Attachment::new("tk.pdf", vec![1]));

        let err = service
            .save(Action::Update, &mut form, date(2024, 8, 15))
            .await
            .expect_err("nothing to replace");

        assert!(matches!(err, RegistroError::NotFound { ref kind, .. } if kind == "TERMOKING"));
        assert_eq!(form.staged.len(), 1);
        assert!(!service.busy().is_busy());
    }

    #[tokio::test]
    async fn decommission_removes_everything_and_can_rerun() {
        let (store, service) = setup();
        let mut form = carreta_form();
        form.documents.propiedad = Some(Attachment::new("p.pdf", vec![1]));
        form.documents.termoking.date = Some(date(2024, 8, 1));
        service
            .save(Action::Create, &mut form, date(2024, 8, 15))
            .await
            .expect("create");

        form.vehicle.placa = "ABC-123".to_owned();
        let outcome = service
            .save(Action::Decommission, &mut form, date(2024, 8, 15))
            .await
            .expect("decommission");

        assert_eq!(
            outcome,
            SaveOutcome::Decommissioned(Decommissioned {
                certificates: 2,
                vehicle: true
            })
        );
        assert_eq!(store.item_count("Certificados").expect("count"), 0);
        assert_eq!(store.item_count("Vehiculos").expect("count"), 0);

        let again = service.decommission(&plate("ABC-123")).await.expect("rerun");
        assert_eq!(
            again,
            Decommissioned {
                certificates: 0,
                vehicle: false
            }
        );
    }

    #[tokio::test]
    async fn failed_step_keeps_earlier_writes_and_releases_busy() {
        let (store, service) = setup();
        let mut form = carreta_form();
        form.documents.propiedad = Some(Attachment::new("p.pdf", vec![1]));
        store.fail_next(Operation::AddAttachment).expect("plan failure");

        let err = service
            .save(Action::Create, &mut form, date(2024, 8, 15))
            .await
            .expect_err("upload fails");

        assert_eq!(err.user_message(), "injected AddAttachment failure");
        assert!(!service.busy().is_busy());
        assert_eq!(form.vehicle.placa, " ABC-123 ");

        service
            .save(Action::Create, &mut form, date(2024, 8, 15))
            .await
            .expect("rerun");
        assert_eq!(store.item_count("Vehiculos").expect("count"), 1);
        assert_eq!(store.item_count("Certificados").expect("count"), 1);
    }

    #[tokio::test]
    async fn busy_flag_blocks_a_second_action() {
        let (_store, service) = setup();
        let guard = service.busy().acquire().expect("first acquire");
        assert!(service.busy().acquire().is_none());

        let mut form = carreta_form();
        let result = service.save(Action::Update, &mut form, date(2024, 8, 15)).await;
        assert!(matches!(result, Err(RegistroError::Busy)));

        drop(guard);
        assert!(!service.busy().is_busy());
    }

    #[tokio::test]
    async fn unknown_plate_loads_nothing() {
        let (_store, service) = setup();
        assert!(service.load(&plate("NOPE-1")).await.expect("load").is_none());
    }

    #[test]
    fn user_message_prefers_the_server_text() {
        let with_message = RegistroError::Store(StoreError::Server {
            status: 400,
            message: Some("Column 'foo' does not exist.".to_owned()),
        });
        assert_eq!(with_message.user_message(), "Column 'foo' does not exist.");

        let bare = RegistroError::Store(StoreError::Server {
            status: 500,
            message: None,
        });
        assert_eq!(bare.user_message(), bare.to_string());
    }

    #[test]
    fn only_filled_sections_are_written() {
        let draft = DocumentDraft {
            sanipes: DatedTextDocument {
                date: None,
                text: " EXP-1 ".to_owned(),
                file: None,
            },
            fumigacion: DatedDocument {
                date: Some(date(2024, 8, 1)),
                file: None,
            },
            ..DocumentDraft::default()
        };

        let writes = document_writes(&draft);

        assert_eq!(writes.len(), 1);
        let write = writes.first().expect("sanipes write");
        assert_eq!(write.kind, CertificateKind::Sanipes);
        assert_eq!(write.fields.expediente.as_deref(), Some("EXP-1"));
        assert!(write.files.is_empty());
    }
}
