//! Registered client key document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for registered public keys
pub const PUBLIC_KEY_COLLECTION: &str = "public_keys";

/// One registered client: its stable identifier and current Ed25519 key
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PublicKeyDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Client identifier as sent in `X-UUID`
    pub uuid: String,

    /// Base64-encoded verifying key, stored exactly as registered
    pub public_key: String,
}

impl PublicKeyDoc {
    pub fn new(uuid: String, public_key: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            uuid,
            public_key,
        }
    }
}

impl IntoIndexes for PublicKeyDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "uuid": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("uuid_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for PublicKeyDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_index_is_unique() {
        let indices = PublicKeyDoc::into_indices();
        assert_eq!(indices.len(), 1);

        let (keys, options) = &indices[0];
        assert_eq!(keys, &doc! { "uuid": 1 });
        assert_eq!(options.as_ref().and_then(|o| o.unique), Some(true));
    }

    #[test]
    fn test_serializes_without_empty_id() {
        let doc = PublicKeyDoc::new("client-1".into(), "a2V5".into());
        let bson = bson::to_document(&doc).unwrap();
        assert!(!bson.contains_key("_id"));
        assert_eq!(bson.get_str("uuid").unwrap(), "client-1");
        assert!(bson.get_document("metadata").unwrap().contains_key("created_at"));
    }
}
