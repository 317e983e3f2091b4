use serde::{Deserialize, Serialize};

/// Where the entries live, as shown in the app footer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreInfo {
    /// Backend kind, e.g. `sqlite` or `firestore`
    pub backend: String,
    /// `collection/document` path of the entry document
    pub document: String,
    pub field: String,
}

impl StoreInfo {
    pub fn location(&self) -> String {
        format!("{} {}#{}", self.backend, self.document, self.field)
    }
}
