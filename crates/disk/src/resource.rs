use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A node of the remote storage tree as returned by `GET /v1/disk/resources`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub path: String,
    pub created: DateTime<FixedOffset>,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: ResourceType,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(rename = "_embedded", default, skip_serializing_if = "Option::is_none")]
    pub embedded: Option<ResourceList>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    File,
    #[serde(alias = "directory")]
    Dir,
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::File => write!(f, "file"),
            ResourceType::Dir => write!(f, "dir"),
        }
    }
}

/// Embedded directory listing, one page of it as sent by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceList {
    #[serde(default)]
    pub items: Vec<Resource>,
    pub path: String,
    #[serde(default)]
    pub total: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub sort: Option<String>,
}

impl Resource {
    pub fn is_dir(&self) -> bool {
        self.kind == ResourceType::Dir
    }

    /// Children of a directory, empty for files.
    pub fn children(&self) -> &[Resource] {
        self.embedded
            .as_ref()
            .map(|list| list.items.as_slice())
            .unwrap_or(&[])
    }

    pub fn into_children(self) -> Vec<Resource> {
        self.embedded.map(|list| list.items).unwrap_or_default()
    }
}

/// One-shot upload target from `GET /v1/disk/resources/upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadLink {
    pub href: String,
    pub method: String,
    #[serde(default)]
    pub templated: bool,
}

/// Error body the API sends with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiError {
    pub const EXISTING_DIRECTORY: &'static str = "DiskPathPointsToExistentDirectoryError";

    /// Parse an error body; `None` when it is not the API's JSON shape.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    pub fn is_existing_directory(&self) -> bool {
        self.error == Self::EXISTING_DIRECTORY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"{
        "name": "backups",
        "path": "disk:/Приложения/db-backups/backups",
        "created": "2024-01-10T08:00:00+00:00",
        "resource_id": "1130000057:abc",
        "type": "dir",
        "_embedded": {
            "sort": "-created",
            "path": "disk:/Приложения/db-backups/backups",
            "limit": 20,
            "offset": 0,
            "total": 2,
            "items": [
                {
                    "name": "sales_dump_20240302.zip",
                    "path": "disk:/Приложения/db-backups/backups/sales_dump_20240302.zip",
                    "created": "2024-03-02T03:00:05+00:00",
                    "resource_id": "1130000057:def",
                    "type": "file",
                    "mime_type": "application/zip",
                    "size": 10485
                },
                {
                    "name": "sales_dump_20240301.zip",
                    "path": "disk:/Приложения/db-backups/backups/sales_dump_20240301.zip",
                    "created": "2024-03-01T03:00:04+00:00",
                    "type": "file",
                    "mime_type": "application/zip"
                }
            ]
        }
    }"#;

    #[test]
    fn decodes_directory_listing() {
        let dir: Resource = serde_json::from_str(LISTING).unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir.mime_type, None);
        assert_eq!(dir.children().len(), 2);

        let newest = &dir.children()[0];
        assert_eq!(newest.kind, ResourceType::File);
        assert_eq!(newest.mime_type.as_deref(), Some("application/zip"));
        assert_eq!(newest.size, Some(10485));
        assert_eq!(newest.resource_id.as_deref(), Some("1130000057:def"));
        assert!(newest.created > dir.children()[1].created);
        assert_eq!(dir.embedded.as_ref().unwrap().total, Some(2));
    }

    #[test]
    fn file_has_no_children() {
        let dir: Resource = serde_json::from_str(LISTING).unwrap();
        let file = dir.into_children().remove(1);
        assert!(!file.is_dir());
        assert!(file.children().is_empty());
        assert_eq!(file.resource_id, None);
    }

    #[test]
    fn directory_alias_is_accepted() {
        let json = r#"{"name":"x","path":"disk:/x","created":"2024-01-01T00:00:00Z","type":"directory"}"#;
        let res: Resource = serde_json::from_str(json).unwrap();
        assert_eq!(res.kind, ResourceType::Dir);
    }

    #[test]
    fn upload_link_decodes() {
        let json = r#"{"operation_id":"op","href":"https://uploader1j.disk.yandex.net:443/upload-target/1","method":"PUT","templated":false}"#;
        let link: UploadLink = serde_json::from_str(json).unwrap();
        assert_eq!(link.method, "PUT");
        assert!(link.href.ends_with("/upload-target/1"));
    }

    #[test]
    fn decodes_api_error_bodies() {
        let exists = ApiError::parse(
            r#"{"message": "Ресурс уже существует", "description": "Specified path points to existent directory.", "error": "DiskPathPointsToExistentDirectoryError"}"#,
        )
        .unwrap();
        assert!(exists.is_existing_directory());

        let orphan = ApiError::parse(r#"{"error": "DiskPathDoesntExistsError"}"#).unwrap();
        assert!(!orphan.is_existing_directory());

        assert!(ApiError::parse("<html>conflict</html>").is_none());
    }
}
