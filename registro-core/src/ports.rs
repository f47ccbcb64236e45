//! Trait describing the remote list store and its error type.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;

use crate::model::{Attachment, Fields, ItemId, Record};
use crate::query::Query;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to the list store.
pub enum StoreError {
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// The store rejected the request.
    #[error("Store responded with status {status}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Structured message returned by the server, if any.
        message: Option<String>,
    },
    /// The store answered with a payload that could not be read.
    #[error("Decode error: {0}")]
    Decode(String),
    /// The store handle could not be built.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Referenced item does not exist.
    #[error("Item {0} not found")]
    ItemNotFound(ItemId),
    /// Referenced attachment does not exist.
    #[error("Attachment {file_name} not found on item {id}")]
    AttachmentNotFound {
        /// Item the attachment was looked up on.
        id: ItemId,
        /// Missing file name.
        file_name: String,
    },
    /// Internal adapter error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Structured message sent by the server, if the error carries one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Server {
                message: Some(message),
                ..
            } => Some(message),
            _ => None,
        }
    }
}

#[async_trait]
/// Key-filtered CRUD access to the lists of a site, with per-item attachments.
///
/// Every list is addressed by its title. Implementations are shared between
/// services through an `Arc<dyn ListStore>`.
pub trait ListStore: Send + Sync {
    /// Fetch the items of a list matching the query.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the request fails.
    async fn items(&self, list: &str, query: &Query) -> Result<Vec<Record>, StoreError>;

    /// Create an item and return its new identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the request fails.
    async fn add(&self, list: &str, fields: &Fields) -> Result<ItemId, StoreError>;

    /// Overwrite the given columns of an item, leaving the others untouched.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the item is missing or the request fails.
    async fn update(&self, list: &str, id: ItemId, fields: &Fields) -> Result<(), StoreError>;

    /// Delete an item.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the item is missing or the request fails.
    async fn delete(&self, list: &str, id: ItemId) -> Result<(), StoreError>;

    /// File names of the attachments of an item.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the item is missing or the request fails.
    async fn attachments(&self, list: &str, id: ItemId) -> Result<Vec<String>, StoreError>;

    /// Delete one attachment by file name.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the attachment is missing or the request fails.
    async fn delete_attachment(
        &self,
        list: &str,
        id: ItemId,
        file_name: &str,
    ) -> Result<(), StoreError>;

    /// Upload a new attachment.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the item is missing or the request fails.
    async fn add_attachment(
        &self,
        list: &str,
        id: ItemId,
        file: &Attachment,
    ) -> Result<(), StoreError>;
}
