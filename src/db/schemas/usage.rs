//! Usage audit document schema
//!
//! One document per successful gated search. Never updated after insert.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for usage records
pub const USAGE_COLLECTION: &str = "meta_data";

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UsageDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub uuid: String,

    /// Total tokens billed by the generation upstream
    pub tokens: i64,

    /// Raw JSON text returned by the generation upstream
    pub response: String,

    pub query: String,
}

impl IntoIndexes for UsageDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "uuid": 1 },
            Some(
                IndexOptions::builder()
                    .name("uuid_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for UsageDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
