use crate::config::MongoConfig;
use crate::source::{RawRecord, RecordSource, SourceError};
use mongodb::bson::{doc, Bson, Document};
use mongodb::sync::{Client, Collection};
use tracing::debug;

/// A live MongoDB collection.
///
/// The client is owned by the source and released when the source is dropped.
pub struct MongoSource {
    config: MongoConfig,
    collection: Collection<Document>,
}

impl MongoSource {
    /// Opens a client and checks that the server answers.
    pub fn connect(config: MongoConfig) -> Result<Self, SourceError> {
        let client = Client::with_uri_str(&config.uri)?;
        client
            .database(&config.database)
            .run_command(doc! { "ping": 1 })
            .run()?;
        debug!(uri = %config.uri, "connected to MongoDB");

        let collection = client
            .database(&config.database)
            .collection::<Document>(&config.collection);
        Ok(Self { config, collection })
    }
}

impl RecordSource for MongoSource {
    fn fetch_all(&mut self) -> Result<Vec<RawRecord>, SourceError> {
        let cursor = self
            .collection
            .find(doc! {})
            .projection(doc! { "_id": 0 })
            .run()?;

        let mut records = Vec::new();
        for document in cursor {
            records.push(Bson::Document(document?).into_relaxed_extjson());
        }
        Ok(records)
    }

    fn describe(&self) -> String {
        format!(
            "mongodb {}/{}",
            self.config.database, self.config.collection
        )
    }
}
