use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use url::Url;

/// A problem attachment as stored in the display data's attachment list.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct AttachmentRecord {
    pub name: String,
    pub url: String,
    /// MIME type of an uploaded file, or `link`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "uploadedAt")]
    pub uploaded_at: String,
}

impl AttachmentRecord {
    pub fn file(name: String, url: String, mime_type: String) -> Self {
        Self {
            name,
            url,
            kind: mime_type,
            uploaded_at: Utc::now().to_rfc3339(),
        }
    }

    /// An external link, named after the host it points to.
    pub fn link(url: String) -> Self {
        Self {
            name: link_name(&url),
            url,
            kind: "link".to_string(),
            uploaded_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Host part of a URL, or the whole input when there is none.
///
/// Protocol-relative references (`//host/path`) are named after their host.
pub fn link_name(raw: &str) -> String {
    let parsed = match raw.strip_prefix("//") {
        Some(rest) => Url::parse(&format!("http://{rest}")),
        None => Url::parse(raw),
    };
    parsed
        .ok()
        .and_then(|url| {
            url.host_str()
                .map(|host| host.trim_start_matches('[').trim_end_matches(']').to_owned())
        })
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| raw.to_string())
}

/// Remove the entry at `index`, keeping the rest in order.
///
/// Returns `false` and leaves the list untouched when the index is out of range.
pub fn remove_at(list: &mut Vec<Value>, index: usize) -> bool {
    if index < list.len() {
        list.remove(index);
        true
    } else {
        false
    }
}
