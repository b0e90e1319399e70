//! Request encoding: document bytes → base64 `generateContent` body.
//!
//! The vision API takes the file inline in the JSON body, so the payload is
//! base64 (standard alphabet, padded) next to its MIME type. The prompt rides
//! in a second part of the same content entry.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Body of a `generateContent` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

/// One request part: either inline file data or prompt text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    InlineData { inline_data: InlineData },
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Build the request body for one document.
pub fn encode_request(bytes: &[u8], mime_type: &str, prompt: &str) -> GenerateContentRequest {
    let data = STANDARD.encode(bytes);
    debug!("Encoded {} bytes ({}) → {} bytes base64", bytes.len(), mime_type, data.len());

    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.to_string(),
                        data,
                    },
                },
                Part::Text {
                    text: prompt.to_string(),
                },
            ],
        }],
    }
}
