//! Vehicle lookups and upserts against the vehicles list.

use std::sync::Arc;

use tracing::{info, warn};

use crate::eligibility::FieldVisibility;
use crate::model::{FieldValue, Fields, ItemId, Plate, Record, Vehicle, VehicleSummary};
use crate::ports::{ListStore, StoreError};
use crate::query::{Filter, ID_FIELD, Query};

/// Internal column names of the vehicles list.
pub mod columns {
    /// Plate.
    pub const TITLE: &str = "Title";
    /// Insurance policy.
    pub const SOAT: &str = "soat";
    /// Internal code.
    pub const CODIGO: &str = "codigo";
    /// Brand.
    pub const MARCA: &str = "marca";
    /// Model.
    pub const MODELO: &str = "modelo";
    /// Capacity option.
    pub const CAPACIDAD: &str = "capacidad";
    /// Free text capacity.
    pub const OTROS: &str = "otros";
    /// Ramp flag.
    pub const RAMPA: &str = "rampa";
    /// Ramp length.
    pub const LARGO_RAMPA: &str = "largorampa";
    /// Ramp width.
    pub const ANCHO_RAMPA: &str = "anchorampa";
    /// Bonus flag.
    pub const BONIFICACION: &str = "bonificacion";
    /// Bonus resolution number.
    pub const RESOLUCION: &str = "resolucion";
    /// Active flag.
    pub const ACTIVO: &str = "Activo";
    /// Internal measurements.
    pub const MEDIDAS_INTERNAS: &str = "medidasinternas";
    /// External measurements.
    pub const MEDIDAS_EXTERNAS: &str = "medidasexternas";
    /// Floor height.
    pub const ALTURA_PISO: &str = "alturapiso";
    /// Payload weight.
    pub const PESO_CARGA_UTIL: &str = "pesocargautil";
    /// Gross weight.
    pub const PESO_BRUTO: &str = "pesobruto";
    /// Temperature mode.
    pub const TEMPERATURA: &str = "temperatura";
    /// Temperature sub-type.
    pub const TIPO_TEMPERATURA: &str = "Tipo_x0020_Temperatura";
    /// Unit type.
    pub const TIPO_UNIDAD: &str = "Tipo_x0020_de_x0020_unidad";
    /// Company lookup id.
    pub const EMPRESA_ID: &str = "EmpresaId";
    /// Notification e-mails.
    pub const CORREOS: &str = "CorreosNotificacion";
}

const VEHICLE_COLUMNS: [&str; 24] = [
    ID_FIELD,
    columns::TITLE,
    columns::SOAT,
    columns::CODIGO,
    columns::MARCA,
    columns::MODELO,
    columns::CAPACIDAD,
    columns::OTROS,
    columns::RAMPA,
    columns::LARGO_RAMPA,
    columns::ANCHO_RAMPA,
    columns::BONIFICACION,
    columns::RESOLUCION,
    columns::ACTIVO,
    columns::MEDIDAS_INTERNAS,
    columns::MEDIDAS_EXTERNAS,
    columns::ALTURA_PISO,
    columns::PESO_CARGA_UTIL,
    columns::PESO_BRUTO,
    columns::TEMPERATURA,
    columns::TIPO_TEMPERATURA,
    columns::TIPO_UNIDAD,
    columns::EMPRESA_ID,
    columns::CORREOS,
];

const SUMMARY_COLUMNS: [&str; 6] = [
    ID_FIELD,
    columns::TITLE,
    columns::MARCA,
    columns::MODELO,
    columns::TIPO_UNIDAD,
    columns::ACTIVO,
];

fn text(value: &str) -> FieldValue {
    FieldValue::from(value.trim())
}

fn dependent(visible: bool, value: &str) -> FieldValue {
    if visible { text(value) } else { FieldValue::Null }
}

impl Vehicle {
    /// Columns to write. Fields hidden by their governing attribute are cleared.
    #[must_use]
    pub fn to_fields(&self) -> Fields {
        let visible = FieldVisibility::for_vehicle(self);
        let mut fields = Fields::new();
        let mut put = |column: &str, value: FieldValue| {
            fields.insert(column.to_owned(), value);
        };

        put(columns::TITLE, text(&self.placa));
        put(columns::SOAT, text(&self.soat));
        put(columns::CODIGO, text(&self.codigo));
        put(columns::MARCA, text(&self.marca));
        put(columns::MODELO, text(&self.modelo));
        put(columns::CAPACIDAD, text(&self.capacidad));
        put(columns::OTROS, dependent(visible.capacidad_otros, &self.otros));
        put(columns::RAMPA, FieldValue::Bool(self.rampa));
        put(columns::LARGO_RAMPA, dependent(visible.rampa, &self.largo_rampa));
        put(columns::ANCHO_RAMPA, dependent(visible.rampa, &self.ancho_rampa));
        put(columns::BONIFICACION, FieldValue::Bool(self.bonificacion));
        put(
            columns::RESOLUCION,
            dependent(visible.nro_resolucion, &self.nro_resolucion),
        );
        put(columns::ACTIVO, FieldValue::Bool(self.activo));
        put(columns::MEDIDAS_INTERNAS, text(&self.medidas_internas));
        put(columns::MEDIDAS_EXTERNAS, text(&self.medidas_externas));
        put(columns::ALTURA_PISO, text(&self.altura_piso));
        put(columns::PESO_CARGA_UTIL, text(&self.peso_carga_util));
        put(columns::PESO_BRUTO, text(&self.peso_bruto));
        put(columns::TEMPERATURA, text(&self.temperatura));
        put(
            columns::TIPO_TEMPERATURA,
            dependent(visible.tipo_temperatura, &self.tipo_temperatura),
        );
        put(columns::TIPO_UNIDAD, text(&self.tipo_unidad));
        put(columns::CORREOS, text(&self.correos_notificacion));
        if let Some(empresa_id) = self.empresa_id.and_then(|id| i64::try_from(id).ok()) {
            put(columns::EMPRESA_ID, FieldValue::Integer(empresa_id));
        }
        fields
    }

    /// Read a vehicle back from its list item.
    #[must_use]
    pub fn from_record(record: &Record) -> Self {
        let flag = |column: &str| record.field(column).is_some_and(FieldValue::as_bool);
        let mut vehicle = Self {
            placa: record.text(columns::TITLE),
            soat: record.text(columns::SOAT),
            codigo: record.text(columns::CODIGO),
            marca: record.text(columns::MARCA),
            modelo: record.text(columns::MODELO),
            capacidad: record.text(columns::CAPACIDAD),
            otros: record.text(columns::OTROS),
            rampa: flag(columns::RAMPA),
            largo_rampa: record.text(columns::LARGO_RAMPA),
            ancho_rampa: record.text(columns::ANCHO_RAMPA),
            bonificacion: flag(columns::BONIFICACION),
            nro_resolucion: record.text(columns::RESOLUCION),
            medidas_internas: record.text(columns::MEDIDAS_INTERNAS),
            medidas_externas: record.text(columns::MEDIDAS_EXTERNAS),
            altura_piso: record.text(columns::ALTURA_PISO),
            peso_carga_util: record.text(columns::PESO_CARGA_UTIL),
            peso_bruto: record.text(columns::PESO_BRUTO),
            temperatura: record.text(columns::TEMPERATURA),
            tipo_temperatura: record.text(columns::TIPO_TEMPERATURA),
            tipo_unidad: record.text(columns::TIPO_UNIDAD),
            activo: flag(columns::ACTIVO),
            correos_notificacion: record.text(columns::CORREOS),
            empresa_id: record.field(columns::EMPRESA_ID).and_then(FieldValue::as_u64),
            empresa: None,
        };
        vehicle.apply_defaults();
        vehicle
    }
}

/// Vehicle operations against the vehicles list.
pub struct VehicleService {
    store: Arc<dyn ListStore>,
    list: String,
}

impl VehicleService {
    /// Create a service bound to a store handle and the vehicles list title.
    #[must_use]
    pub fn new<L: Into<String>>(store: Arc<dyn ListStore>, list: L) -> Self {
        Self {
            store,
            list: list.into(),
        }
    }

    async fn find_latest(&self, plate: &Plate, select: &[&str]) -> Result<Option<Record>, StoreError> {
        let query = Query::new()
            .select(select.iter().copied())
            .filter(Filter::eq(columns::TITLE, plate.as_str()))
            .order_by_desc(ID_FIELD)
            .top(1);
        Ok(self.store.items(&self.list, &query).await?.into_iter().next())
    }

    /// Update the latest vehicle with this plate, or create it.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when a store call fails.
    pub async fn upsert(&self, plate: &Plate, vehicle: &Vehicle) -> Result<ItemId, StoreError> {
        let mut fields = vehicle.to_fields();
        fields.insert(columns::TITLE.to_owned(), FieldValue::from(plate.as_str()));

        match self.find_latest(plate, &[ID_FIELD]).await? {
            Some(existing) => {
                self.store.update(&self.list, existing.id, &fields).await?;
                info!(%plate, id = %existing.id, "vehicle updated");
                Ok(existing.id)
            }
            None => {
                let id = self.store.add(&self.list, &fields).await?;
                info!(%plate, %id, "vehicle created");
                Ok(id)
            }
        }
    }

    /// Latest vehicle with this plate.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the query fails.
    pub async fn get_by_plate(&self, plate: &Plate) -> Result<Option<Vehicle>, StoreError> {
        Ok(self
            .find_latest(plate, &VEHICLE_COLUMNS)
            .await?
            .map(|record| Vehicle::from_record(&record)))
    }

    /// Delete the latest vehicle with this plate. Returns `false` when there was none.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when a store call fails.
    pub async fn delete_by_plate(&self, plate: &Plate) -> Result<bool, StoreError> {
        let Some(existing) = self.find_latest(plate, &[ID_FIELD]).await? else {
            warn!(%plate, "vehicle already absent, nothing to delete");
            return Ok(false);
        };
        self.store.delete(&self.list, existing.id).await?;
        info!(%plate, id = %existing.id, "vehicle deleted");
        Ok(true)
    }

    /// Vehicles for the selection grid, newest first, optionally for one company.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the query fails.
    pub async fn list(&self, empresa_id: Option<u64>) -> Result<Vec<VehicleSummary>, StoreError> {
        let mut query = Query::new().select(SUMMARY_COLUMNS).order_by_desc(ID_FIELD);
        if let Some(empresa_id) = empresa_id {
            query = query.filter(Filter::eq(columns::EMPRESA_ID, empresa_id));
        }
        Ok(self
            .store
            .items(&self.list, &query)
            .await?
            .into_iter()
            .map(|record| VehicleSummary {
                id: record.id,
                placa: record.text(columns::TITLE),
                marca: record.text(columns::MARCA),
                modelo: record.text(columns::MODELO),
                tipo_unidad: record.text(columns::TIPO_UNIDAD),
                activo: record.field(columns::ACTIVO).is_some_and(FieldValue::as_bool),
            })
            .collect())
    }
}
