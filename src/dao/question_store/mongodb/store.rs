use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database,
    bson::{Document, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::MongoQuestionDocument,
};
use crate::dao::{
    models::QuestionEntity,
    question_store::{QUESTION_TEXT_FIELD, QuestionStore},
    storage::StorageResult,
};

const QUESTION_COLLECTION_NAME: &str = "questions";

/// MongoDB-backed implementation of [`QuestionStore`].
#[derive(Clone)]
pub struct MongoQuestionStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let database =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.database = database;
        Ok(())
    }
}

impl MongoQuestionStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// Create the index backing the text-anchored range scan. The `_id` index
    /// that serves the id-anchored scan exists implicitly.
    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.collection().await;
        let index = mongodb::IndexModel::builder()
            .keys(doc! { QUESTION_TEXT_FIELD: 1 })
            .options(
                IndexOptions::builder()
                    .name(Some("question_text_idx".to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: QUESTION_COLLECTION_NAME,
                index: QUESTION_TEXT_FIELD,
                source,
            })?;

        Ok(())
    }

    async fn collection(&self) -> Collection<MongoQuestionDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoQuestionDocument>(QUESTION_COLLECTION_NAME)
    }

    /// Range scan ordered by the given field, skipping the heavy hint and
    /// script fields at the wire level.
    async fn query_ordered(
        &self,
        order_by: &'static str,
        filter: Document,
        limit: usize,
    ) -> MongoResult<Vec<QuestionEntity>> {
        let collection = self.collection().await;

        let documents: Vec<MongoQuestionDocument> = collection
            .find(filter)
            .sort(doc! { order_by: 1 })
            .limit(limit as i64)
            .projection(doc! { "fallback_hint": 0, "cached_script": 0 })
            .await
            .map_err(|source| MongoDaoError::QueryQuestions { order_by, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryQuestions { order_by, source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn get_by_id(&self, id: String) -> MongoResult<Option<QuestionEntity>> {
        let collection = self.collection().await;

        let document = collection
            .find_one(doc! { "_id": &id })
            .await
            .map_err(|source| MongoDaoError::LoadQuestion { id, source })?;

        Ok(document.map(Into::into))
    }

    async fn insert_question(&self, question: QuestionEntity) -> MongoResult<()> {
        let id = question.id.clone();
        let document: MongoQuestionDocument = question.into();
        let collection = self.collection().await;

        collection
            .replace_one(doc! { "_id": &id }, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveQuestion { id, source })?;

        Ok(())
    }

    /// `$set` only the script field so concurrent edits to the rest of the
    /// document are preserved.
    async fn merge_script(&self, id: String, script: String) -> MongoResult<()> {
        let collection = self.collection().await;

        collection
            .update_one(
                doc! { "_id": &id },
                doc! { "$set": { "cached_script": script } },
            )
            .await
            .map_err(|source| MongoDaoError::CacheScript { id, source })?;

        Ok(())
    }
}

impl QuestionStore for MongoQuestionStore {
    fn query_ordered_by_id(
        &self,
        start_at: Option<String>,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = match start_at {
                Some(anchor) => doc! { "_id": { "$gte": anchor } },
                None => doc! {},
            };
            store
                .query_ordered("_id", filter, limit)
                .await
                .map_err(Into::into)
        })
    }

    fn query_ordered_by_field(
        &self,
        field: &'static str,
        start_at: String,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = doc! { field: { "$gte": start_at } };
            store
                .query_ordered(field, filter, limit)
                .await
                .map_err(Into::into)
        })
    }

    fn get_by_id(&self, id: String) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.get_by_id(id).await.map_err(Into::into) })
    }

    fn insert_question(
        &self,
        question: QuestionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_question(question).await.map_err(Into::into) })
    }

    fn merge_script(&self, id: String, script: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.merge_script(id, script).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
