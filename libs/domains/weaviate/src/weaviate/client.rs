use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::classify_error;
use super::config::{ConnectionConfig, DEFAULT_HOST, DOCKER_HOST, cluster_url};
use super::graphql::{
    GraphQlRequest, GraphQlResponse, SearchMode, aggregate_query, get_query,
    parse_aggregate_response, parse_get_response, selectable_properties,
};
use super::schema::{
    BatchItemDto, ClassDto, SchemaDto, apply_update, batch_object, create_body, error_message,
    parse_batch_response,
};
use crate::client::{BackupClient, CollectionClient, DataClient, TenantClient};
use crate::error::{WeaviateError, WeaviateResult};
use crate::models::{
    BackupDescriptor, BackupRequest, BatchOutcome, CollectionConfig, ConsistencyLevel,
    CreateCollection, DataObject, QueryObject, ScopedCollection, ServerVersion, Tenant,
    UpdateCollection,
};

/// Tenants per create/update/remove request
const TENANT_CHUNK_SIZE: usize = 100;

const DOCKER_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct MetaDto {
    version: String,
}

/// REST client for one Weaviate server, shared by every command of a
/// process run.
#[derive(Debug, Clone)]
pub struct WeaviateClient {
    http: Client,
    base_url: String,
    version: ServerVersion,
}

impl WeaviateClient {
    /// Resolve the server address, check it answers `/v1/meta` and record its
    /// version.
    pub async fn connect(config: ConnectionConfig) -> WeaviateResult<Self> {
        let base_url = resolve_base_url(&config).await;
        info!(url = %base_url, timeout_secs = config.timeout_secs, "Connecting to Weaviate");

        let http = build_http_client(&config)?;
        let response = http.get(format!("{base_url}/v1/meta")).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WeaviateError::BackendRequestFailed {
                status: Some(status.as_u16()),
                message: format!("server at {base_url} is not ready: {}", error_message(&body)),
            });
        }
        let meta: MetaDto = response.json().await?;
        let version: ServerVersion = meta.version.parse()?;

        info!(url = %base_url, %version, "Connected to Weaviate");
        Ok(Self {
            http,
            base_url,
            version,
        })
    }

    pub fn version(&self) -> ServerVersion {
        self.version
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{path}", self.base_url)
    }

    fn class_url(&self, collection: &str) -> String {
        self.url(&format!("/schema/{}", urlencoding::encode(collection)))
    }

    fn tenants_url(&self, collection: &str) -> String {
        format!("{}/tenants", self.class_url(collection))
    }

    fn object_url(&self, target: &ScopedCollection, id: Uuid) -> String {
        self.url(&format!(
            "/objects/{}/{id}",
            urlencoding::encode(&target.collection)
        ))
    }

    fn backup_url(&self, request: &BackupRequest) -> String {
        self.url(&format!(
            "/backups/{}/{}",
            request.backend,
            urlencoding::encode(&request.backup_id)
        ))
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> WeaviateResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "Weaviate response");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_error(
            Some(status.as_u16()),
            error_message(&body),
            context,
        ))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> WeaviateResult<T> {
        Ok(self.send(request, context).await?.json().await?)
    }

    /// Class document, `None` when the collection does not exist.
    async fn class_document(&self, collection: &str) -> WeaviateResult<Option<Value>> {
        let response = self.http.get(self.class_url(collection)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(Some(status), error_message(&body), collection));
        }
        Ok(Some(response.json().await?))
    }

    async fn graphql(&self, query: String, collection: &str) -> WeaviateResult<GraphQlResponse> {
        debug!(%query, "GraphQL request");
        let request = self.http.post(self.url("/graphql")).json(&GraphQlRequest { query });
        self.send_json(request, collection).await
    }

    async fn get_objects(
        &self,
        target: &ScopedCollection,
        consistency: ConsistencyLevel,
        mode: SearchMode<'_>,
        limit: usize,
    ) -> WeaviateResult<Vec<QueryObject>> {
        let config = CollectionClient::get(self, &target.collection).await?;
        let properties = selectable_properties(&config);
        let query = get_query(target, consistency, mode, &properties, limit);
        let response = self.graphql(query, &target.collection).await?;
        parse_get_response(response, &target.collection)
    }

    async fn tenant_request(
        &self,
        method: reqwest::Method,
        collection: &str,
        body: Vec<Value>,
    ) -> WeaviateResult<()> {
        for chunk in body.chunks(TENANT_CHUNK_SIZE) {
            let request = self
                .http
                .request(method.clone(), self.tenants_url(collection))
                .json(chunk);
            self.send(request, collection).await?;
        }
        Ok(())
    }

    async fn backup_descriptor(
        &self,
        request: RequestBuilder,
        backup_id: &str,
    ) -> WeaviateResult<BackupDescriptor> {
        self.send_json(request, backup_id).await
    }
}

fn build_http_client(config: &ConnectionConfig) -> WeaviateResult<Client> {
    let mut headers = HeaderMap::new();
    if let Some(api_key) = &config.api_key {
        headers.insert(AUTHORIZATION, sensitive_header(&format!("Bearer {api_key}"))?);
    }
    if let Some(openai_key) = &config.openai_api_key {
        headers.insert(
            HeaderName::from_static("x-openai-api-key"),
            sensitive_header(openai_key)?,
        );
    }

    Ok(Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(concat!("weaviatest/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

fn sensitive_header(raw: &str) -> WeaviateResult<HeaderValue> {
    let mut value = HeaderValue::from_str(raw)
        .map_err(|e| WeaviateError::Config(format!("invalid header value: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

/// `http://host.docker.internal:port` when running in a container that can
/// reach the host, `http://localhost:port` otherwise. Non-local hosts are
/// cluster URLs.
async fn resolve_base_url(config: &ConnectionConfig) -> String {
    if !config.is_local() {
        return cluster_url(&config.host);
    }
    let attempt = TcpStream::connect((DOCKER_HOST, config.port));
    let host = match tokio::time::timeout(DOCKER_CONNECT_TIMEOUT, attempt).await {
        Ok(Ok(_)) => DOCKER_HOST,
        _ => DEFAULT_HOST,
    };
    format!("http://{host}:{}", config.port)
}

fn scope_params(
    target: &ScopedCollection,
    consistency: ConsistencyLevel,
) -> Vec<(&'static str, String)> {
    let mut params = vec![("consistency_level", consistency.as_wire().to_string())];
    if let Some(tenant) = target.tenant() {
        params.push(("tenant", tenant.to_string()));
    }
    params
}

fn object_body(target: &ScopedCollection, id: Uuid, properties: &Map<String, Value>) -> Value {
    let mut body = json!({
        "class": target.collection,
        "id": id,
        "properties": properties,
    });
    if let Some(tenant) = target.tenant() {
        body["tenant"] = json!(tenant);
    }
    body
}

/// Body of a backup create (`with_id`) or restore request.
fn backup_body(request: &BackupRequest, with_id: bool, cpu_supported: bool) -> Value {
    let mut body = Map::new();
    if with_id {
        body.insert("id".to_string(), json!(request.backup_id));
    }
    if !request.include.is_empty() {
        body.insert("include".to_string(), json!(request.include));
    }
    if !request.exclude.is_empty() {
        body.insert("exclude".to_string(), json!(request.exclude));
    }
    if let Some(cpu) = request.cpu_percentage.filter(|_| cpu_supported) {
        body.insert("config".to_string(), json!({ "CPUPercentage": cpu }));
    }
    Value::Object(body)
}

#[async_trait]
impl CollectionClient for WeaviateClient {
    async fn exists(&self, name: &str) -> WeaviateResult<bool> {
        Ok(self.class_document(name).await?.is_some())
    }

    async fn get(&self, name: &str) -> WeaviateResult<CollectionConfig> {
        let document = self
            .class_document(name)
            .await?
            .ok_or_else(|| WeaviateError::CollectionNotFound(name.to_string()))?;
        let class: ClassDto = serde_json::from_value(document)?;
        Ok(class.into_config())
    }

    async fn list_all(&self) -> WeaviateResult<Vec<String>> {
        let schema: SchemaDto = self.send_json(self.http.get(self.url("/schema")), "").await?;
        Ok(schema
            .classes
            .iter()
            .map(|class| class.name().to_string())
            .collect())
    }

    async fn create(&self, input: CreateCollection) -> WeaviateResult<CollectionConfig> {
        let request = self.http.post(self.url("/schema")).json(&create_body(&input));
        let class: ClassDto = self.send_json(request, &input.name).await?;
        info!(collection = %input.name, "Collection created");
        Ok(class.into_config())
    }

    async fn update(
        &self,
        name: &str,
        update: UpdateCollection,
    ) -> WeaviateResult<CollectionConfig> {
        let mut document = self
            .class_document(name)
            .await?
            .ok_or_else(|| WeaviateError::CollectionNotFound(name.to_string()))?;
        apply_update(&mut document, &update)?;

        let request = self.http.put(self.class_url(name)).json(&document);
        let class: ClassDto = self.send_json(request, name).await?;
        Ok(class.into_config())
    }

    async fn delete(&self, name: &str) -> WeaviateResult<()> {
        self.send(self.http.delete(self.class_url(name)), name).await?;
        Ok(())
    }
}

#[async_trait]
impl TenantClient for WeaviateClient {
    async fn get(&self, collection: &str) -> WeaviateResult<Vec<Tenant>> {
        self.send_json(self.http.get(self.tenants_url(collection)), collection)
            .await
    }

    async fn get_by_names(
        &self,
        collection: &str,
        names: Vec<String>,
    ) -> WeaviateResult<Vec<Tenant>> {
        if !self.version.supports_tenant_lookup() {
            let all = TenantClient::get(self, collection).await?;
            return Ok(all.into_iter().filter(|t| names.contains(&t.name)).collect());
        }

        let mut found = Vec::with_capacity(names.len());
        for name in names {
            let url = format!("{}/{}", self.tenants_url(collection), urlencoding::encode(&name));
            let response = self.http.get(url).send().await?;
            if response.status() == StatusCode::NOT_FOUND {
                debug!(collection, tenant = %name, "Tenant not found");
                continue;
            }
            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                return Err(classify_error(Some(status), error_message(&body), collection));
            }
            found.push(response.json().await?);
        }
        Ok(found)
    }

    async fn create(&self, collection: &str, tenants: Vec<Tenant>) -> WeaviateResult<()> {
        let body = tenants.iter().map(|t| json!(t)).collect();
        self.tenant_request(reqwest::Method::POST, collection, body)
            .await
    }

    async fn update(&self, collection: &str, tenants: Vec<Tenant>) -> WeaviateResult<()> {
        let body = tenants.iter().map(|t| json!(t)).collect();
        self.tenant_request(reqwest::Method::PUT, collection, body)
            .await
    }

    async fn remove(&self, collection: &str, names: Vec<String>) -> WeaviateResult<()> {
        let body = names.into_iter().map(Value::String).collect();
        self.tenant_request(reqwest::Method::DELETE, collection, body)
            .await
    }
}

#[async_trait]
impl DataClient for WeaviateClient {
    async fn batch_insert(
        &self,
        target: &ScopedCollection,
        consistency: ConsistencyLevel,
        objects: Vec<DataObject>,
    ) -> WeaviateResult<BatchOutcome> {
        let objects: Vec<Value> = objects.iter().map(|o| batch_object(target, o)).collect();
        let request = self
            .http
            .post(self.url("/batch/objects"))
            .query(&[("consistency_level", consistency.as_wire())])
            .json(&json!({ "objects": objects }));
        let items: Vec<BatchItemDto> = self.send_json(request, &target.collection).await?;
        Ok(parse_batch_response(items))
    }

    async fn fetch(
        &self,
        target: &ScopedCollection,
        consistency: ConsistencyLevel,
        limit: usize,
    ) -> WeaviateResult<Vec<QueryObject>> {
        self.get_objects(target, consistency, SearchMode::Fetch, limit)
            .await
    }

    async fn search_vector(
        &self,
        target: &ScopedCollection,
        consistency: ConsistencyLevel,
        query: &str,
        limit: usize,
    ) -> WeaviateResult<Vec<QueryObject>> {
        self.get_objects(target, consistency, SearchMode::NearText(query), limit)
            .await
    }

    async fn search_keyword(
        &self,
        target: &ScopedCollection,
        consistency: ConsistencyLevel,
        query: &str,
        limit: usize,
    ) -> WeaviateResult<Vec<QueryObject>> {
        self.get_objects(target, consistency, SearchMode::Bm25(query), limit)
            .await
    }

    async fn search_hybrid(
        &self,
        target: &ScopedCollection,
        consistency: ConsistencyLevel,
        query: &str,
        limit: usize,
    ) -> WeaviateResult<Vec<QueryObject>> {
        self.get_objects(target, consistency, SearchMode::Hybrid(query), limit)
            .await
    }

    async fn aggregate_count(&self, target: &ScopedCollection) -> WeaviateResult<u64> {
        let response = self
            .graphql(aggregate_query(target), &target.collection)
            .await?;
        parse_aggregate_response(response, &target.collection)
    }

    async fn update(
        &self,
        target: &ScopedCollection,
        consistency: ConsistencyLevel,
        id: Uuid,
        properties: Map<String, Value>,
    ) -> WeaviateResult<()> {
        let request = self
            .http
            .patch(self.object_url(target, id))
            .query(&scope_params(target, consistency))
            .json(&object_body(target, id, &properties));
        self.send(request, &target.collection).await?;
        Ok(())
    }

    async fn replace(
        &self,
        target: &ScopedCollection,
        consistency: ConsistencyLevel,
        object: DataObject,
    ) -> WeaviateResult<()> {
        let mut body = object_body(target, object.id, &object.properties);
        if let Some(vector) = &object.vector {
            body["vector"] = json!(vector);
        }
        let request = self
            .http
            .put(self.object_url(target, object.id))
            .query(&scope_params(target, consistency))
            .json(&body);
        self.send(request, &target.collection).await?;
        Ok(())
    }

    async fn delete_by_id(
        &self,
        target: &ScopedCollection,
        consistency: ConsistencyLevel,
        id: Uuid,
    ) -> WeaviateResult<()> {
        let request = self
            .http
            .delete(self.object_url(target, id))
            .query(&scope_params(target, consistency));
        self.send(request, &target.collection).await?;
        Ok(())
    }
}

#[async_trait]
impl BackupClient for WeaviateClient {
    async fn create(&self, request: BackupRequest) -> WeaviateResult<BackupDescriptor> {
        let cpu_supported = self.version.supports_backup_cpu_limit();
        if request.cpu_percentage.is_some() && !cpu_supported {
            warn!(version = %self.version, "Server ignores backup CPU percentage, not sending it");
        }
        let url = self.url(&format!("/backups/{}", request.backend));
        let http = self
            .http
            .post(url)
            .json(&backup_body(&request, true, cpu_supported));
        self.backup_descriptor(http, &request.backup_id).await
    }

    async fn create_status(&self, request: &BackupRequest) -> WeaviateResult<BackupDescriptor> {
        let http = self.http.get(self.backup_url(request));
        self.backup_descriptor(http, &request.backup_id).await
    }

    async fn restore(&self, request: BackupRequest) -> WeaviateResult<BackupDescriptor> {
        let cpu_supported = self.version.supports_backup_cpu_limit();
        let http = self
            .http
            .post(format!("{}/restore", self.backup_url(&request)))
            .json(&backup_body(&request, false, cpu_supported));
        self.backup_descriptor(http, &request.backup_id).await
    }

    async fn restore_status(&self, request: &BackupRequest) -> WeaviateResult<BackupDescriptor> {
        let http = self
            .http
            .get(format!("{}/restore", self.backup_url(request)));
        self.backup_descriptor(http, &request.backup_id).await
    }

    async fn cancel(&self, request: &BackupRequest) -> WeaviateResult<bool> {
        let response = self.http.delete(self.backup_url(request)).send().await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(classify_error(
                    Some(status.as_u16()),
                    error_message(&body),
                    &request.backup_id,
                ))
            }
        }
    }
}
