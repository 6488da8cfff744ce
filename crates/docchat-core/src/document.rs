//! Document and chunk types

use serde::{Deserialize, Serialize};

/// A raw input document read from disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    /// Path the document was read from
    pub source: String,
    pub text: String,
}

/// A retrievable chunk produced by splitting a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub text: String,
    /// Source path of the document this chunk came from
    pub source: String,
}
