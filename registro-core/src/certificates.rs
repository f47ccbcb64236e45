//! Reconciliation of certificate items: one canonical "latest" item per (plate, kind).
//!
//! The store has no upsert and no uniqueness constraint, so concurrent creations
//! can leave duplicates behind. Every read path folds the items of a plate,
//! ordered by descending id, into the first item seen per kind; older duplicates
//! are shadowed, never merged.

use std::collections::BTreeMap;
use std::slice;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info};

use crate::model::{
    Attachment, CertificateFields, CertificateKind, CertificateRow, CertificateStatus, FieldValue,
    Fields, ItemId, Plate, Record, ReplacedAttachment,
};
use crate::ports::{ListStore, StoreError};
use crate::query::{Filter, ID_FIELD, Query};
use crate::service::RegistroError;

/// Internal column names of the certificates list.
pub mod columns {
    /// Plate of the vehicle the certificate belongs to.
    pub const TITLE: &str = "Title";
    /// Certificate kind.
    pub const CERTIFICADO: &str = "certificado";
    /// Issue date.
    pub const EMISION: &str = "emision";
    /// Expiry date.
    pub const CADUCIDAD: &str = "caducidad";
    /// Year.
    pub const ANIO: &str = "anio";
    /// Resolution date.
    pub const RESOLUCION: &str = "resolucion";
    /// Case file.
    pub const EXPEDIENTE: &str = "expediente";
}

/// Number of deletes in flight at once when clearing a plate.
pub const DELETE_BATCH_SIZE: usize = 10;

const STATUS_COLUMNS: [&str; 8] = [
    ID_FIELD,
    columns::TITLE,
    columns::CERTIFICADO,
    columns::EMISION,
    columns::CADUCIDAD,
    columns::ANIO,
    columns::RESOLUCION,
    columns::EXPEDIENTE,
];

impl CertificateFields {
    /// Columns to write; unset fields are left out so updates stay partial.
    #[must_use]
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        let dates = [
            (columns::EMISION, self.emision),
            (columns::CADUCIDAD, self.caducidad),
            (columns::RESOLUCION, self.resolucion),
        ];
        for (column, date) in dates {
            if let Some(date) = date {
                fields.insert(column.to_owned(), FieldValue::Date(date));
            }
        }
        if let Some(anio) = &self.anio {
            fields.insert(columns::ANIO.to_owned(), FieldValue::from(anio.as_str()));
        }
        if let Some(expediente) = self.expediente.as_deref().filter(|text| !text.is_empty()) {
            fields.insert(columns::EXPEDIENTE.to_owned(), FieldValue::from(expediente));
        }
        fields
    }
}

/// Fold items ordered by descending id into the first item seen per upper-cased kind.
#[must_use]
pub fn latest_per_kind<I>(records: I) -> BTreeMap<String, Record>
where
    I: IntoIterator<Item = Record>,
{
    let mut latest = BTreeMap::new();
    for record in records {
        let kind = record.text(columns::CERTIFICADO).to_uppercase();
        latest.entry(kind).or_insert(record);
    }
    latest
}

fn plate_filter(plate: &Plate) -> Filter {
    Filter::eq(columns::TITLE, plate.as_str())
}

/// Certificate operations against the certificates list.
pub struct CertificateService {
    store: Arc<dyn ListStore>,
    list: String,
}

impl CertificateService {
    /// Create a service bound to a store handle and the certificates list title.
    #[must_use]
    pub fn new<L: Into<String>>(store: Arc<dyn ListStore>, list: L) -> Self {
        Self {
            store,
            list: list.into(),
        }
    }

    /// Find-or-create the latest item for `(plate, kind)`, write the supplied
    /// fields and, when `attachments` is not empty, replace every attachment.
    ///
    /// Attachment replacement deletes first and uploads second. A failure in
    /// between leaves the item without attachments; calling `upsert` again
    /// with the same files repairs it.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] from the first store call that fails.
    pub async fn upsert(
        &self,
        plate: &Plate,
        kind: CertificateKind,
        fields: &CertificateFields,
        attachments: &[Attachment],
    ) -> Result<ItemId, StoreError> {
        let query = Query::new()
            .select([ID_FIELD])
            .filter(plate_filter(plate).and(Filter::eq(columns::CERTIFICADO, kind.as_str())))
            .order_by_desc(ID_FIELD)
            .top(1);
        let existing = self.store.items(&self.list, &query).await?.into_iter().next();

        let mut payload = fields.to_fields();
        payload.insert(columns::TITLE.to_owned(), FieldValue::from(plate.as_str()));
        payload.insert(columns::CERTIFICADO.to_owned(), FieldValue::from(kind.as_str()));

        let id = match existing {
            Some(record) => {
                self.store.update(&self.list, record.id, &payload).await?;
                info!(%plate, %kind, id = %record.id, "certificate updated");
                record.id
            }
            None => {
                let id = self.store.add(&self.list, &payload).await?;
                info!(%plate, %kind, %id, "certificate created");
                id
            }
        };

        if !attachments.is_empty() {
            self.replace_attachments(id, attachments).await?;
        }
        Ok(id)
    }

    /// Replace the attachment of the latest existing certificate. Never creates one.
    ///
    /// The kind is matched as given or upper-cased.
    ///
    /// # Errors
    ///
    /// Returns [`RegistroError::NotFound`] without touching the store when no
    /// certificate exists, or a store error from a failing call.
    pub async fn replace_attachment(
        &self,
        plate: &Plate,
        kind: &str,
        file: &Attachment,
    ) -> Result<ReplacedAttachment, RegistroError> {
        let kind = kind.trim();
        let upper = kind.to_uppercase();
        let mut kind_filter = Filter::eq(columns::CERTIFICADO, kind);
        if upper != kind {
            kind_filter = kind_filter.or(Filter::eq(columns::CERTIFICADO, upper));
        }
        let query = Query::new()
            .select([ID_FIELD, columns::TITLE, columns::CERTIFICADO])
            .filter(plate_filter(plate).and(kind_filter))
            .order_by_desc(ID_FIELD)
            .top(1);

        let Some(record) = self.store.items(&self.list, &query).await?.into_iter().next() else {
            return Err(RegistroError::NotFound {
                plate: plate.to_string(),
                kind: kind.to_owned(),
            });
        };

        Ok(self.replace_attachment_by_id(record.id, file).await?)
    }

    /// Replace every attachment of a known certificate item with `file`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the item is missing or a store call fails.
    pub async fn replace_attachment_by_id(
        &self,
        id: ItemId,
        file: &Attachment,
    ) -> Result<ReplacedAttachment, StoreError> {
        self.replace_attachments(id, slice::from_ref(file)).await?;
        let file_name = self
            .store
            .attachments(&self.list, id)
            .await?
            .into_iter()
            .next()
            .unwrap_or_else(|| file.file_name.clone());
        Ok(ReplacedAttachment { id, file_name })
    }

    async fn replace_attachments(&self, id: ItemId, files: &[Attachment]) -> Result<(), StoreError> {
        let current = self.store.attachments(&self.list, id).await?;
        for file_name in &current {
            self.store
                .delete_attachment(&self.list, id, file_name)
                .await?;
        }
        for file in files {
            self.store.add_attachment(&self.list, id, file).await?;
        }
        info!(
            %id,
            removed = current.len(),
            added = files.len(),
            "certificate attachments replaced"
        );
        Ok(())
    }

    /// Latest dates and texts per kind for a plate, used to pre-populate the form.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the query fails.
    pub async fn status(&self, plate: &Plate) -> Result<CertificateStatus, StoreError> {
        let query = Query::new()
            .select(STATUS_COLUMNS)
            .filter(plate_filter(plate))
            .order_by_desc(ID_FIELD);
        let latest = latest_per_kind(self.store.items(&self.list, &query).await?);
        let get = |kind: CertificateKind| latest.get(kind.as_str());

        let revision = get(CertificateKind::RevisionTecnica);
        let sanipes = get(CertificateKind::Sanipes);
        Ok(CertificateStatus {
            cert_bonificacion_date: get(CertificateKind::CertificadoBonificacion)
                .and_then(|record| record.date(columns::EMISION)),
            revision_tecnica_date: revision.and_then(|record| record.date(columns::EMISION)),
            revision_tecnica_year: revision
                .map(|record| record.text(columns::ANIO))
                .unwrap_or_default(),
            sanipes_date: sanipes.and_then(|record| record.date(columns::RESOLUCION)),
            sanipes_expediente: sanipes
                .map(|record| record.text(columns::EXPEDIENTE))
                .unwrap_or_default(),
            termoking_date: get(CertificateKind::Termoking)
                .and_then(|record| record.date(columns::EMISION)),
            limpieza_date: get(CertificateKind::LimpiezaDesinfeccion)
                .and_then(|record| record.date(columns::EMISION)),
        })
    }

    /// Latest certificate per kind for display, sorted by kind, with the first attachment name.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the query fails.
    pub async fn list_for_display(&self, plate: &Plate) -> Result<Vec<CertificateRow>, StoreError> {
        let query = Query::new()
            .select(STATUS_COLUMNS)
            .filter(plate_filter(plate))
            .order_by_desc(ID_FIELD)
            .expand_attachments();
        let latest = latest_per_kind(self.store.items(&self.list, &query).await?);

        let optional_text = |record: &Record, column: &str| {
            record
                .field(column)
                .and_then(FieldValue::display_text)
        };
        Ok(latest
            .into_iter()
            .map(|(kind, record)| CertificateRow {
                id: record.id,
                emision: record.date(columns::EMISION),
                resolucion: record.date(columns::RESOLUCION),
                anio: optional_text(&record, columns::ANIO),
                expediente: optional_text(&record, columns::EXPEDIENTE),
                archivo: record.attachments.first().cloned(),
                kind,
            })
            .collect())
    }

    /// Delete every certificate of a plate, [`DELETE_BATCH_SIZE`] at a time.
    ///
    /// Deletes run in parallel within a batch and batches run one after the
    /// other. A blank plate or a plate without certificates is a no-op.
    /// Returns the number of deleted items.
    ///
    /// # Errors
    ///
    /// Returns the first [`StoreError`]. The other deletes of the failing batch
    /// are dropped and may be abandoned mid-request; later batches are not
    /// started. Running it again deletes whatever is left.
    pub async fn delete_all_for_plate(&self, plate: &str) -> Result<usize, StoreError> {
        let Some(plate) = Plate::parse(plate) else {
            return Ok(0);
        };
        let query = Query::new().select([ID_FIELD]).filter(plate_filter(&plate));
        let ids = self
            .store
            .items(&self.list, &query)
            .await?
            .into_iter()
            .map(|record| record.id)
            .collect::<Vec<_>>();
        if ids.is_empty() {
            debug!(%plate, "no certificates to delete");
            return Ok(0);
        }

        for batch in ids.chunks(DELETE_BATCH_SIZE) {
            try_join_all(batch.iter().map(|id| self.store.delete(&self.list, *id))).await?;
            debug!(%plate, size = batch.len(), "certificate batch deleted");
        }
        info!(%plate, deleted = ids.len(), "certificates deleted");
        Ok(ids.len())
    }
}
