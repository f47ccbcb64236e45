//! Domain data structures for vehicles, certificates and the list items backing them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
/// Server-assigned identifier of a list item.
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Natural key of a vehicle. Never empty, surrounding whitespace removed.
pub struct Plate(String);

impl Plate {
    /// Parse a plate typed by a user. Returns `None` when nothing but whitespace is left.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_owned()))
    }

    /// The plate as stored in the `Title` column.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Plate {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
/// Closed set of compliance documents tracked per vehicle.
pub enum CertificateKind {
    /// Vehicle ownership card.
    TarjetaPropiedad,
    /// Resolution granting the weight bonus.
    ResolucionBonificacion,
    /// Bonus certificate.
    CertificadoBonificacion,
    /// Periodic technical review.
    RevisionTecnica,
    /// Fisheries health authority clearance.
    Sanipes,
    /// Refrigeration unit maintenance certificate.
    Termoking,
    /// Cleaning and disinfection certificate.
    LimpiezaDesinfeccion,
}

impl CertificateKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::TarjetaPropiedad,
        Self::ResolucionBonificacion,
        Self::CertificadoBonificacion,
        Self::RevisionTecnica,
        Self::Sanipes,
        Self::Termoking,
        Self::LimpiezaDesinfeccion,
    ];

    /// Value stored in the `certificado` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TarjetaPropiedad => "TARJETA_PROPIEDAD",
            Self::ResolucionBonificacion => "RESOLUCION_BONIFICACION",
            Self::CertificadoBonificacion => "CERTIFICADO_BONIFICACION",
            Self::RevisionTecnica => "REVISION_TECNICA",
            Self::Sanipes => "SANIPES",
            Self::Termoking => "TERMOKING",
            Self::LimpiezaDesinfeccion => "LIMPIEZA_DESINFECCION",
        }
    }

    /// Human-friendly label shown next to the document.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::TarjetaPropiedad => "Tarjeta de propiedad",
            Self::ResolucionBonificacion => "Resolución de bonificación",
            Self::CertificadoBonificacion => "Certificado de bonificación",
            Self::RevisionTecnica => "Revisión técnica",
            Self::Sanipes => "Sanipes",
            Self::Termoking => "Mantenimiento de termoking",
            Self::LimpiezaDesinfeccion => "Limpieza y desinfección",
        }
    }
}

impl fmt::Display for CertificateKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown certificate kind: {0}")]
/// Raised when a `certificado` value is outside the closed set.
pub struct UnknownKind(pub String);

impl FromStr for CertificateKind {
    type Err = UnknownKind;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let upper = raw.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == upper)
            .ok_or_else(|| UnknownKind(raw.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Typed value of a single list column.
pub enum FieldValue {
    /// Single line or choice text.
    Text(String),
    /// Whole number, including lookup ids.
    Integer(i64),
    /// Floating point number.
    Number(f64),
    /// Yes/no column.
    Bool(bool),
    /// Date-only value, written at UTC midnight.
    Date(NaiveDate),
    /// Explicitly cleared column.
    Null,
}

impl FieldValue {
    /// Text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Date content. Text values are read by their leading `YYYY-MM-DD`.
    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            Self::Text(text) => text
                .get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()),
            _ => None,
        }
    }

    /// Boolean content; missing or non-boolean values read as `false`.
    #[must_use]
    pub fn as_bool(&self) -> bool {
        matches!(self, Self::Bool(true))
    }

    /// Non-negative whole number content.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Integer(value) => u64::try_from(*value).ok(),
            _ => None,
        }
    }

    /// Render the value the way a text box would show it.
    #[must_use]
    pub fn display_text(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Integer(value) => Some(value.to_string()),
            Self::Number(value) => Some(value.to_string()),
            Self::Bool(value) => Some(value.to_string()),
            Self::Date(date) => Some(date.format("%Y-%m-%d").to_string()),
            Self::Null => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

/// Column values of a list item keyed by internal column name.
pub type Fields = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq)]
/// List item returned by a query.
pub struct Record {
    /// Server-assigned identifier.
    pub id: ItemId,
    /// Selected column values.
    pub fields: Fields,
    /// Attachment file names, filled only when the query expands attachments.
    pub attachments: Vec<String>,
}

impl Record {
    /// Look up a column value.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Column value as text, empty when missing.
    #[must_use]
    pub fn text(&self, name: &str) -> String {
        self.field(name)
            .and_then(FieldValue::display_text)
            .unwrap_or_default()
    }

    /// Column value as a date.
    #[must_use]
    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.field(name).and_then(FieldValue::as_date)
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Binary file uploaded as a list item attachment.
pub struct Attachment {
    /// File name; attachments are addressed by it.
    pub file_name: String,
    /// Raw file content.
    pub content: Vec<u8>,
}

impl Attachment {
    /// Build an attachment from a name and its bytes.
    #[must_use]
    pub fn new<N: Into<String>>(file_name: N, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
        }
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("bytes", &self.content.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// File picked for an existing certificate, waiting for the next save.
pub struct StagedDocument {
    /// Certificate the file belongs to.
    pub kind: CertificateKind,
    /// File to upload in place of the current attachments.
    pub file: Attachment,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Columns written for a certificate. `None` leaves the stored value untouched.
pub struct CertificateFields {
    /// Issue date.
    pub emision: Option<NaiveDate>,
    /// Expiry date.
    pub caducidad: Option<NaiveDate>,
    /// Year, free text or picked from a list.
    pub anio: Option<String>,
    /// Resolution date.
    pub resolucion: Option<NaiveDate>,
    /// Case file number.
    pub expediente: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Latest stored dates and texts per certificate, used to pre-populate the document form.
///
/// Files are not part of the snapshot.
pub struct CertificateStatus {
    /// Bonus certificate issue date.
    pub cert_bonificacion_date: Option<NaiveDate>,
    /// Technical review date.
    pub revision_tecnica_date: Option<NaiveDate>,
    /// Technical review year.
    pub revision_tecnica_year: String,
    /// SANIPES resolution date.
    pub sanipes_date: Option<NaiveDate>,
    /// SANIPES case file.
    pub sanipes_expediente: String,
    /// Termoking issue date.
    pub termoking_date: Option<NaiveDate>,
    /// Cleaning and disinfection issue date.
    pub limpieza_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One row of the certificate table for a plate.
pub struct CertificateRow {
    /// Identifier of the latest record of this kind.
    pub id: ItemId,
    /// Upper-cased `certificado` value.
    pub kind: String,
    /// Issue date.
    pub emision: Option<NaiveDate>,
    /// Resolution date.
    pub resolucion: Option<NaiveDate>,
    /// Year text.
    pub anio: Option<String>,
    /// Case file.
    pub expediente: Option<String>,
    /// First attachment file name.
    pub archivo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Result of replacing the attachment of an existing certificate.
pub struct ReplacedAttachment {
    /// Record that now carries the file.
    pub id: ItemId,
    /// File name reported by the store after the upload.
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Vehicle as edited in the registration form.
pub struct Vehicle {
    /// Plate, the natural key.
    pub placa: String,
    /// Mandatory insurance policy.
    pub soat: String,
    /// Internal code.
    pub codigo: String,
    /// Brand.
    pub marca: String,
    /// Model.
    pub modelo: String,
    /// Load capacity option.
    pub capacidad: String,
    /// Free text capacity when the option is "Otros".
    pub otros: String,
    /// Whether the unit has a ramp.
    pub rampa: bool,
    /// Ramp length.
    pub largo_rampa: String,
    /// Ramp width.
    pub ancho_rampa: String,
    /// Whether the unit holds a weight bonus.
    pub bonificacion: bool,
    /// Bonus resolution number.
    pub nro_resolucion: String,
    /// Internal measurements.
    pub medidas_internas: String,
    /// External measurements.
    pub medidas_externas: String,
    /// Floor height.
    pub altura_piso: String,
    /// Payload weight.
    pub peso_carga_util: String,
    /// Gross weight.
    pub peso_bruto: String,
    /// Temperature mode ("Seco", "Con temperatura").
    pub temperatura: String,
    /// Temperature sub-type, only meaningful with temperature control.
    pub tipo_temperatura: String,
    /// Unit type ("Camión", "Carreta", ...).
    pub tipo_unidad: String,
    /// Whether the vehicle is in service.
    pub activo: bool,
    /// Notification e-mail addresses.
    pub correos_notificacion: String,
    /// Lookup id of the owning company.
    pub empresa_id: Option<u64>,
    /// Display name of the owning company. Not persisted.
    #[serde(skip)]
    pub empresa: Option<String>,
}

/// Temperature mode assumed when none was picked.
pub const DEFAULT_TEMPERATURA: &str = "Seco";

impl Default for Vehicle {
    fn default() -> Self {
        Self {
            placa: String::new(),
            soat: String::new(),
            codigo: String::new(),
            marca: String::new(),
            modelo: String::new(),
            capacidad: String::new(),
            otros: String::new(),
            rampa: false,
            largo_rampa: String::new(),
            ancho_rampa: String::new(),
            bonificacion: false,
            nro_resolucion: String::new(),
            medidas_internas: String::new(),
            medidas_externas: String::new(),
            altura_piso: String::new(),
            peso_carga_util: String::new(),
            peso_bruto: String::new(),
            temperatura: DEFAULT_TEMPERATURA.to_owned(),
            tipo_temperatura: String::new(),
            tipo_unidad: String::new(),
            activo: true,
            correos_notificacion: String::new(),
            empresa_id: None,
            empresa: None,
        }
    }
}

impl Vehicle {
    /// Fresh vehicle for the given plate.
    #[must_use]
    pub fn new<P: Into<String>>(placa: P) -> Self {
        Self {
            placa: placa.into(),
            ..Self::default()
        }
    }

    /// Fill the temperature mode with [`DEFAULT_TEMPERATURA`] when it is blank.
    pub fn apply_defaults(&mut self) {
        if self.temperatura.trim().is_empty() {
            DEFAULT_TEMPERATURA.clone_into(&mut self.temperatura);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Row of the vehicle selection grid.
pub struct VehicleSummary {
    /// Item identifier.
    pub id: ItemId,
    /// Plate.
    pub placa: String,
    /// Brand.
    pub marca: String,
    /// Model.
    pub modelo: String,
    /// Unit type.
    pub tipo_unidad: String,
    /// Whether the vehicle is in service.
    pub activo: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Document with an optional date and an optional file.
pub struct DatedDocument {
    /// Issue, expiry or resolution date depending on the document.
    pub date: Option<NaiveDate>,
    /// Picked file.
    pub file: Option<Attachment>,
}

impl DatedDocument {
    fn is_blank(&self) -> bool {
        self.date.is_none() && self.file.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Document with a date, a text field and a file.
pub struct DatedTextDocument {
    /// Date of the document.
    pub date: Option<NaiveDate>,
    /// Year or case file, depending on the document.
    pub text: String,
    /// Picked file.
    pub file: Option<Attachment>,
}

impl DatedTextDocument {
    fn is_blank(&self) -> bool {
        self.date.is_none() && self.text.is_empty() && self.file.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Documents entered while registering a new vehicle.
pub struct DocumentDraft {
    /// Ownership card file.
    pub propiedad: Option<Attachment>,
    /// Bonus resolution file.
    pub res_bonificacion: Option<Attachment>,
    /// Bonus certificate with its issue date.
    pub cert_bonificacion: DatedDocument,
    /// Technical review: expiry date and manufacturing year.
    pub revision_tecnica: DatedTextDocument,
    /// SANIPES: resolution date and case file.
    pub sanipes: DatedTextDocument,
    /// Termoking certificate with its issue date.
    pub termoking: DatedDocument,
    /// Cleaning certificate with its issue date.
    pub limpieza: DatedDocument,
    /// Fumigation certificate. Validated only, never stored.
    pub fumigacion: DatedDocument,
}

impl DocumentDraft {
    /// Whether nothing was entered for the given dated document.
    #[must_use]
    pub fn is_blank(&self, kind: CertificateKind) -> bool {
        match kind {
            CertificateKind::TarjetaPropiedad => self.propiedad.is_none(),
            CertificateKind::ResolucionBonificacion => self.res_bonificacion.is_none(),
            CertificateKind::CertificadoBonificacion => self.cert_bonificacion.is_blank(),
            CertificateKind::RevisionTecnica => self.revision_tecnica.is_blank(),
            CertificateKind::Sanipes => self.sanipes.is_blank(),
            CertificateKind::Termoking => self.termoking.is_blank(),
            CertificateKind::LimpiezaDesinfeccion => self.limpieza.is_blank(),
        }
    }

    /// Merge a stored snapshot into the draft. Files stay as they are.
    pub fn apply_status(&mut self, status: &CertificateStatus) {
        self.cert_bonificacion.date = status.cert_bonificacion_date;
        self.revision_tecnica.date = status.revision_tecnica_date;
        self.revision_tecnica
            .text
            .clone_from(&status.revision_tecnica_year);
        self.sanipes.date = status.sanipes_date;
        self.sanipes.text.clone_from(&status.sanipes_expediente);
        self.termoking.date = status.termoking_date;
        self.limpieza.date = status.limpieza_date;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plate_is_trimmed_and_never_empty() {
        assert_eq!(
            Plate::parse("  ABC-123 ").map(|plate| plate.as_str().to_owned()),
            Some("ABC-123".to_owned())
        );
        assert!(Plate::parse("   ").is_none());
        assert!(Plate::parse("").is_none());
    }

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!("termoking".parse::<CertificateKind>(), Ok(CertificateKind::Termoking));
        assert_eq!(
            " limpieza_desinfeccion ".parse::<CertificateKind>(),
            Ok(CertificateKind::LimpiezaDesinfeccion)
        );
        assert!("FUMIGACION".parse::<CertificateKind>().is_err());
    }

    #[test]
    fn text_dates_are_read_by_their_prefix() {
        let value = FieldValue::from("2024-03-01T00:00:00Z");
        assert_eq!(value.as_date(), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(FieldValue::from("2024").as_date(), None);
        assert_eq!(FieldValue::Null.as_date(), None);
    }

    #[test]
    fn whole_floats_render_without_fraction() {
        assert_eq!(FieldValue::Number(2019.0).display_text().as_deref(), Some("2019"));
        assert_eq!(FieldValue::Integer(7).display_text().as_deref(), Some("7"));
    }

    #[test]
    fn new_vehicles_default_to_dry_and_active() {
        let vehicle = Vehicle::new("ABC-123");
        assert_eq!(vehicle.temperatura, "Seco");
        assert!(vehicle.activo);

        let mut blank = Vehicle {
            temperatura: "  ".to_owned(),
            ..Vehicle::default()
        };
        blank.apply_defaults();
        assert_eq!(blank.temperatura, "Seco");
    }

    #[test]
    fn status_is_merged_without_touching_files() {
        let mut draft = DocumentDraft {
            termoking: DatedDocument {
                date: None,
                file: Some(Attachment::new("tk.pdf", vec![1])),
            },
            ..DocumentDraft::default()
        };
        let status = CertificateStatus {
            termoking_date: NaiveDate::from_ymd_opt(2024, 1, 2),
            sanipes_expediente: "EXP-9".to_owned(),
            ..CertificateStatus::default()
        };

        draft.apply_status(&status);

        assert_eq!(draft.termoking.date, NaiveDate::from_ymd_opt(2024, 1, 2));
        assert!(draft.termoking.file.is_some());
        assert_eq!(draft.sanipes.text, "EXP-9");
    }
}
