//! List store implementation for SharePoint sites using the REST API.

use std::fmt;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, IF_MATCH};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use tracing::debug;

use registro_core::{
    model::{Attachment, FieldValue, Fields, ItemId, Record},
    ports::{ListStore, StoreError},
    query::{ID_FIELD, Query, quote},
};

const JSON_NOMETADATA: &str = "application/json;odata=nometadata";
const X_HTTP_METHOD: &str = "X-HTTP-Method";
const ATTACHMENT_FILES: &str = "AttachmentFiles";
const DATE_FORMAT: &str = "%Y-%m-%dT00:00:00Z";

/// JSON pointers where SharePoint and the token endpoint put a readable message.
const ERROR_POINTERS: [&str; 3] = [
    "/odata.error/message/value",
    "/error/message/value",
    "/error/message",
];

/// Page of items from `/items`.
#[derive(Debug, Deserialize)]
struct ItemsPage {
    value: Vec<Map<String, Value>>,

    #[serde(rename = "odata.nextLink")]
    next_link: Option<String>,
}

/// Response of an item creation; only the id is needed.
#[derive(Debug, Deserialize)]
struct AddedItem {
    #[serde(rename = "Id")]
    id: u64,
}

/// Response from `/AttachmentFiles`.
#[derive(Debug, Deserialize)]
struct AttachmentsPage {
    value: Vec<AttachmentFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AttachmentFile {
    file_name: String,
}

#[derive(Clone, PartialEq, Eq)]
/// Where the site lives and how to authenticate against it.
pub struct SharePointConfig {
    /// Absolute site URL, e.g. `https://contoso.sharepoint.com/sites/flota`.
    pub site_url: String,
    /// Bearer token sent with every request, if any.
    pub access_token: Option<String>,
}

impl fmt::Debug for SharePointConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SharePointConfig")
            .field("site_url", &self.site_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// [`ListStore`] talking to the lists of one SharePoint site.
pub struct SharePointStore {
    client: Client,
    site: Url,
    access_token: Option<String>,
}

impl SharePointStore {
    /// Create a store bound to the given HTTP client and site.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] when the site URL is not an absolute http(s) URL.
    pub fn new(client: Client, config: SharePointConfig) -> Result<Self, StoreError> {
        let site = Url::parse(config.site_url.trim()).map_err(|err| {
            StoreError::Config(format!("invalid site url {:?}: {err}", config.site_url))
        })?;
        if !matches!(site.scheme(), "http" | "https") || site.cannot_be_a_base() {
            return Err(StoreError::Config(format!(
                "site url must be an http(s) address: {site}"
            )));
        }
        Ok(Self {
            client,
            site,
            access_token: config.access_token,
        })
    }

    /// `<site>/_api/web/lists/getbytitle('<list>')/<segments...>`, each segment percent-encoded.
    fn endpoint(&self, list: &str, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.site.clone();
        url.set_query(None);
        url.set_fragment(None);
        let list_segment = format!("getbytitle({})", quote(list));
        url.path_segments_mut()
            .map_err(|()| StoreError::Config(format!("site url cannot be a base: {}", self.site)))?
            .pop_if_empty()
            .extend(["_api", "web", "lists", list_segment.as_str()])
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self
            .client
            .request(method, url)
            .header(ACCEPT, JSON_NOMETADATA);
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// POST tunnelling a MERGE or DELETE, matching any etag.
    fn tunnelled(&self, verb: &str, url: Url) -> RequestBuilder {
        self.request(Method::POST, url)
            .header(X_HTTP_METHOD, verb)
            .header(IF_MATCH, "*")
    }
}

#[async_trait]
impl ListStore for SharePointStore {
    async fn items(&self, list: &str, query: &Query) -> Result<Vec<Record>, StoreError> {
        let url = self.endpoint(list, &["items"])?;
        let params = query_params(query);
        debug!(list, ?params, "querying list items");

        let limit = query.top.unwrap_or(usize::MAX);
        let mut page: ItemsPage =
            read_json(send(self.request(Method::GET, url).query(&params)).await?).await?;
        let mut records = Vec::new();
        loop {
            for item in page.value {
                records.push(record_from_json(item)?);
            }
            match page.next_link {
                Some(next) if records.len() < limit => {
                    let next = Url::parse(&next)
                        .map_err(|err| StoreError::Decode(format!("invalid next link: {err}")))?;
                    page = read_json(send(self.request(Method::GET, next)).await?).await?;
                }
                _ => break,
            }
        }
        records.truncate(limit);
        debug!(list, count = records.len(), "list items received");
        Ok(records)
    }

    async fn add(&self, list: &str, fields: &Fields) -> Result<ItemId, StoreError> {
        let url = self.endpoint(list, &["items"])?;
        let request = self
            .request(Method::POST, url)
            .header(CONTENT_TYPE, JSON_NOMETADATA)
            .json(&fields_body(fields));
        let added: AddedItem = read_json(send(request).await?).await?;
        Ok(ItemId(added.id))
    }

    async fn update(&self, list: &str, id: ItemId, fields: &Fields) -> Result<(), StoreError> {
        let item = format!("items({id})");
        let url = self.endpoint(list, &[item.as_str()])?;
        let request = self
            .tunnelled("MERGE", url)
            .header(CONTENT_TYPE, JSON_NOMETADATA)
            .json(&fields_body(fields));
        send(request).await?;
        Ok(())
    }

    async fn delete(&self, list: &str, id: ItemId) -> Result<(), StoreError> {
        let item = format!("items({id})");
        let url = self.endpoint(list, &[item.as_str()])?;
        send(self.tunnelled("DELETE", url)).await?;
        Ok(())
    }

    async fn attachments(&self, list: &str, id: ItemId) -> Result<Vec<String>, StoreError> {
        let item = format!("items({id})");
        let url = self.endpoint(list, &[item.as_str(), ATTACHMENT_FILES])?;
        let page: AttachmentsPage = read_json(send(self.request(Method::GET, url)).await?).await?;
        Ok(page.value.into_iter().map(|file| file.file_name).collect())
    }

    async fn delete_attachment(
        &self,
        list: &str,
        id: ItemId,
        file_name: &str,
    ) -> Result<(), StoreError> {
        let item = format!("items({id})");
        let file = format!("getByFileName({})", quote(file_name));
        let url = self.endpoint(list, &[item.as_str(), ATTACHMENT_FILES, file.as_str()])?;
        send(self.tunnelled("DELETE", url)).await?;
        Ok(())
    }

    async fn add_attachment(
        &self,
        list: &str,
        id: ItemId,
        file: &Attachment,
    ) -> Result<(), StoreError> {
        let item = format!("items({id})");
        let add = format!("add(FileName={})", quote(&file.file_name));
        let url = self.endpoint(list, &[item.as_str(), ATTACHMENT_FILES, add.as_str()])?;
        let request = self
            .request(Method::POST, url)
            .body(file.content.clone());
        send(request).await?;
        Ok(())
    }
}

/// OData system query options for a [`Query`].
fn query_params(query: &Query) -> Vec<(&'static str, String)> {
    let mut select = query.select.join(",");
    if query.expand_attachments {
        if select.is_empty() {
            select.push('*');
        }
        select.push(',');
        select.push_str(ATTACHMENT_FILES);
    }

    let mut params = Vec::new();
    if !select.is_empty() {
        params.push(("$select", select));
    }
    if let Some(filter) = &query.filter {
        params.push(("$filter", filter.to_odata()));
    }
    if let Some(order) = &query.order_by {
        let direction = if order.descending { "desc" } else { "asc" };
        params.push(("$orderby", format!("{} {direction}", order.field)));
    }
    if let Some(top) = query.top {
        params.push(("$top", top.to_string()));
    }
    if query.expand_attachments {
        params.push(("$expand", ATTACHMENT_FILES.to_owned()));
    }
    params
}

fn record_from_json(mut item: Map<String, Value>) -> Result<Record, StoreError> {
    let id = item
        .get(ID_FIELD)
        .and_then(Value::as_u64)
        .map(ItemId)
        .ok_or_else(|| StoreError::Decode("list item without Id".to_owned()))?;

    let attachments = match item.remove(ATTACHMENT_FILES) {
        Some(files) => serde_json::from_value::<Vec<AttachmentFile>>(files)
            .map_err(|err| StoreError::Decode(format!("attachment files: {err}")))?
            .into_iter()
            .map(|file| file.file_name)
            .collect(),
        None => Vec::new(),
    };

    let fields = item
        .into_iter()
        .filter(|(name, _)| name != ID_FIELD && name != "ID" && !name.starts_with("odata."))
        .map(|(name, value)| (name, field_from_json(value)))
        .collect();

    Ok(Record {
        id,
        fields,
        attachments,
    })
}

fn field_from_json(value: Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Null,
        Value::Bool(flag) => FieldValue::Bool(flag),
        Value::Number(number) => number.as_i64().map_or_else(
            || FieldValue::Number(number.as_f64().unwrap_or_default()),
            FieldValue::Integer,
        ),
        Value::String(text) => FieldValue::Text(text),
        other @ (Value::Array(_) | Value::Object(_)) => FieldValue::Text(other.to_string()),
    }
}

fn field_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(text) => Value::String(text.clone()),
        FieldValue::Integer(number) => Value::from(*number),
        FieldValue::Number(number) => Number::from_f64(*number).map_or(Value::Null, Value::Number),
        FieldValue::Bool(flag) => Value::Bool(*flag),
        FieldValue::Date(date) => Value::String(date.format(DATE_FORMAT).to_string()),
        FieldValue::Null => Value::Null,
    }
}

fn fields_body(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(name, value)| (name.clone(), field_to_json(value)))
            .collect(),
    )
}

/// Structured message of a SharePoint error body.
fn error_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(body).ok()?;
    ERROR_POINTERS
        .iter()
        .find_map(|pointer| value.pointer(pointer).and_then(Value::as_str))
        .map(ToOwned::to_owned)
}

// Send a request and turn non-success answers into `StoreError::Server`.
async fn send(request: RequestBuilder) -> Result<Response, StoreError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);
    debug!(status = status.as_u16(), ?message, "store request rejected");
    Err(StoreError::Server {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|err| StoreError::Decode(err.to_string()))
}
