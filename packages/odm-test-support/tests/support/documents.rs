use document_manager::{Document, DocumentMetadata};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub address: Option<Address>,
}

impl Document for User {
    fn metadata() -> DocumentMetadata {
        DocumentMetadata::new("User")
            .collection("users")
            .embed_one("address")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub reviewers: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Document for Post {
    fn metadata() -> DocumentMetadata {
        DocumentMetadata::new("Post")
            .collection("posts")
            .reference_one("author", "User")
            .reference_many("reviewers", "User")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Document for Product {
    fn metadata() -> DocumentMetadata {
        DocumentMetadata::new("Product").collection("products")
    }
}
