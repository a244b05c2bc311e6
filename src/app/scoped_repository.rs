//! Generic role-scoped repository.
//!
//! One instance serves one resource (a table model plus an ownership scope).
//! Every operation passes the authorization gate first and then issues a
//! single store call filtered by `owner_field = caller id`. A row that exists
//! but belongs to someone else is indistinguishable from a missing row.

use crate::auth::{AccessToken, AuthGate, Identity};
use crate::domain::model::coerce::format_timestamp;
use crate::domain::model::{
    coerce_record, coerce_scalar_for_type, FieldError, JsonMap, MarketplaceModel, ResourceSpec,
};
use crate::error::AppError;
use crate::realtime::{ChangeEvent, ChangeFeed, ChangeFilter, ChangeKind, Subscription};
use crate::storage::{Filter, OrderBy, TableStore};
use chrono::Utc;
use futures_util::Stream;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::marker::PhantomData;
use std::sync::Arc;

const CREATED_AT: &str = "created_at";
const UPDATED_AT: &str = "updated_at";

pub struct ScopedRepository<R = JsonValue> {
    store: Arc<dyn TableStore>,
    gate: Arc<AuthGate>,
    feed: ChangeFeed,
    spec: &'static ResourceSpec,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for ScopedRepository<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            gate: self.gate.clone(),
            feed: self.feed.clone(),
            spec: self.spec,
            _record: PhantomData,
        }
    }
}

fn invalid_fields(message: &str) -> impl FnOnce(Vec<FieldError>) -> AppError + '_ {
    move |errors| AppError::InvalidFields {
        message: message.to_string(),
        errors,
    }
}

impl<R: DeserializeOwned> ScopedRepository<R> {
    pub fn new(
        store: Arc<dyn TableStore>,
        gate: Arc<AuthGate>,
        feed: ChangeFeed,
        spec: &'static ResourceSpec,
    ) -> Self {
        Self {
            store,
            gate,
            feed,
            spec,
            _record: PhantomData,
        }
    }

    pub fn spec(&self) -> &'static ResourceSpec {
        self.spec
    }

    fn model(&self) -> &'static dyn MarketplaceModel {
        self.spec.model
    }

    async fn authorize(&self, token: Option<&AccessToken>) -> Result<Identity, AppError> {
        self.gate.require_role(token, self.spec.scope.role).await
    }

    fn owner_filter(&self, identity: &Identity) -> Filter {
        Filter::eq(self.spec.scope.owner_field, identity.user_id.to_string())
    }

    fn id_filter(&self, id: &str) -> Result<Filter, AppError> {
        let model = self.model();
        let pk_field = model.primary_key_field();
        let pk_type = model
            .column_type(pk_field)
            .ok_or_else(|| AppError::Config(format!("model '{}' has no primary key column", model.table_name())))?;
        let value = coerce_scalar_for_type(pk_type, &JsonValue::from(id))
            .map_err(|e| AppError::validation(format!("invalid id '{}': {}", id, e)))?;
        Ok(Filter::eq(pk_field, value))
    }

    fn decode(row: JsonValue) -> Result<R, AppError> {
        Ok(serde_json::from_value(row)?)
    }

    fn payload_object<P: Serialize + ?Sized>(fields: &P) -> Result<JsonMap, AppError> {
        match serde_json::to_value(fields) {
            Ok(JsonValue::Object(map)) => Ok(map),
            Ok(_) => Err(AppError::validation("payload must be a JSON object")),
            Err(e) => Err(AppError::validation(format!("payload is not serializable: {}", e))),
        }
    }

    /// Drops fields the server assigns itself.
    fn strip_server_fields(&self, payload: &mut JsonMap) {
        payload.remove(self.model().primary_key_field());
        payload.remove(CREATED_AT);
        payload.remove(UPDATED_AT);
    }

    /// All rows owned by the caller, newest first.
    pub async fn list(&self, token: Option<&AccessToken>) -> Result<Vec<R>, AppError> {
        let identity = self.authorize(token).await?;
        let model = self.model();
        let order = model.has_column(CREATED_AT).then(|| OrderBy::desc(CREATED_AT));

        let rows = self
            .store
            .select(model, &[self.owner_filter(&identity)], order.as_ref())
            .await?;
        tracing::debug!(resource = %self.spec.key(), user_id = %identity.user_id, count = rows.len(), "Listed rows");
        rows.into_iter().map(Self::decode).collect()
    }

    pub async fn get(&self, token: Option<&AccessToken>, id: &str) -> Result<R, AppError> {
        let identity = self.authorize(token).await?;
        let filters = [self.id_filter(id)?, self.owner_filter(&identity)];

        let row = self
            .store
            .select(self.model(), &filters, None)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(format!("{} '{}'", self.spec.path, id)))?;
        Self::decode(row)
    }

    /// Inserts a row owned by the caller. Any ownership value in `fields` is
    /// replaced by the caller's id.
    pub async fn create<P: Serialize + ?Sized>(&self, token: Option<&AccessToken>, fields: &P) -> Result<R, AppError> {
        let identity = self.authorize(token).await?;
        if !self.spec.scope.permissions.create {
            return Err(AppError::NotPermitted(format!(
                "{} cannot create {}",
                self.spec.scope.role, self.spec.path
            )));
        }
        let model = self.model();
        let owner_field = self.spec.scope.owner_field;
        let owner = JsonValue::from(identity.user_id.to_string());

        let mut payload = Self::payload_object(fields)?;
        self.strip_server_fields(&mut payload);
        if let Some(supplied) = payload.get(owner_field) {
            if supplied != &owner {
                tracing::debug!(resource = %self.spec.key(), field = owner_field, "Ignoring supplied owner");
            }
        }
        payload.insert(owner_field.to_string(), owner);
        model.apply_defaults(&mut payload);

        let record = coerce_record(model, &payload).map_err(invalid_fields("Validation/coercion failed"))?;
        model
            .validate_create_payload(&record)
            .map_err(invalid_fields("Validation failed"))?;

        let row = self.store.insert(model, &record).await?;
        tracing::info!(resource = %self.spec.key(), user_id = %identity.user_id, "Created row");
        Self::decode(row)
    }

    /// Applies a partial update to a row owned by the caller.
    pub async fn update<P: Serialize + ?Sized>(
        &self,
        token: Option<&AccessToken>,
        id: &str,
        fields: &P,
    ) -> Result<R, AppError> {
        let identity = self.authorize(token).await?;
        let model = self.model();
        let permissions = self.spec.scope.permissions;

        let mut patch = Self::payload_object(fields)?;
        self.strip_server_fields(&mut patch);
        patch.remove(self.spec.scope.owner_field);

        let denied: Vec<&str> = patch
            .keys()
            .map(String::as_str)
            .filter(|field| !permissions.can_update(field))
            .collect();
        if !denied.is_empty() {
            return Err(AppError::NotPermitted(format!(
                "{} cannot update {} on {}",
                self.spec.scope.role,
                denied.join(", "),
                self.spec.path
            )));
        }
        if patch.is_empty() {
            return Err(AppError::validation("no updatable fields in payload"));
        }
        if model.has_column(UPDATED_AT) {
            patch.insert(UPDATED_AT.to_string(), JsonValue::from(format_timestamp(Utc::now())));
        }

        let patch = coerce_record(model, &patch).map_err(invalid_fields("Validation/coercion failed"))?;
        model
            .validate_update_payload(&patch)
            .map_err(invalid_fields("Validation failed"))?;

        let filters = [self.id_filter(id)?, self.owner_filter(&identity)];
        let row = self
            .store
            .update(model, &filters, &patch)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(format!("{} '{}'", self.spec.path, id)))?;
        tracing::info!(resource = %self.spec.key(), user_id = %identity.user_id, "Updated row");
        Self::decode(row)
    }

    /// Removes a row owned by the caller. Missing and foreign rows are a no-op.
    pub async fn delete(&self, token: Option<&AccessToken>, id: &str) -> Result<(), AppError> {
        let identity = self.authorize(token).await?;
        if !self.spec.scope.permissions.delete {
            return Err(AppError::NotPermitted(format!(
                "{} cannot delete {}",
                self.spec.scope.role, self.spec.path
            )));
        }
        let filters = [self.id_filter(id)?, self.owner_filter(&identity)];
        let removed = self.store.delete(self.model(), &filters).await?;
        tracing::info!(resource = %self.spec.key(), user_id = %identity.user_id, removed, "Deleted rows");
        Ok(())
    }

    fn change_filter(&self, identity: &Identity) -> ChangeFilter {
        ChangeFilter::table(self.model().table_name())
            .field_eq(self.spec.scope.owner_field, JsonValue::from(identity.user_id.to_string()))
    }

    /// Calls `callback` for inserts and updates of the caller's rows.
    pub async fn subscribe<F>(&self, token: Option<&AccessToken>, callback: F) -> Result<Subscription, AppError>
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        let identity = self.authorize(token).await?;
        Ok(self.feed.subscribe(self.change_filter(&identity), callback))
    }

    /// Inserts, updates and deletes of the caller's rows as a stream.
    pub async fn stream(
        &self,
        token: Option<&AccessToken>,
    ) -> Result<impl Stream<Item = ChangeEvent> + Send + 'static, AppError> {
        let identity = self.authorize(token).await?;
        let filter = self
            .change_filter(&identity)
            .kinds(&[ChangeKind::Insert, ChangeKind::Update, ChangeKind::Delete]);
        Ok(self.feed.stream(filter))
    }
}
