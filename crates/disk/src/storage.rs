use std::path::Path;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use tracing::{debug, info, warn};

use crate::client::{DiskClient, RESOURCES, UPLOAD, ensure_success, read_json};
use crate::error::{Cause, DiskError};
use crate::resource::{ApiError, Resource, UploadLink};
use crate::retention::{self, RetentionPolicy, RetentionReport};

/// Page size requested for embedded directory listings.
const PAGE_SIZE: usize = 100;

/// Remote storage operations used by a backup run.
///
/// Paths passed to `ensure_folder`, `get_resource` and `upload_file` are
/// relative to the application namespace. `delete_resource` takes the
/// fully-qualified path exactly as it appears in a listing.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Create a folder. An already existing folder is not an error; a
    /// missing parent is.
    async fn ensure_folder(&self, path: &str) -> Result<(), DiskError>;

    /// Metadata of a resource and, for directories, all of its children
    /// newest first.
    async fn get_resource(&self, path: &str) -> Result<Resource, DiskError>;

    /// Two-phase upload: obtain a one-time link, then stream the file to it.
    async fn upload_file(&self, local: &Path, remote: &str) -> Result<(), DiskError>;

    /// Permanently delete a resource, bypassing the trash.
    async fn delete_resource(&self, path: &str) -> Result<(), DiskError>;

    /// Delete every child of `folder` beyond the newest `policy.keep`.
    ///
    /// Only a failed listing is returned as an error. Individual delete
    /// failures are logged, recorded in the report, and do not stop the
    /// remaining deletes.
    async fn enforce_retention(
        &self,
        folder: &str,
        policy: RetentionPolicy,
    ) -> Result<RetentionReport, DiskError> {
        let mut items = self.get_resource(folder).await?.into_children();
        retention::order_newest_first(&mut items);

        let (kept, expired) = policy.split(&items);
        let mut report = RetentionReport {
            kept: kept.iter().map(|r| r.path.clone()).collect(),
            ..Default::default()
        };
        debug!(folder, kept = kept.len(), expired = expired.len(), "retention plan");

        for item in expired {
            match self.delete_resource(&item.path).await {
                Ok(()) => {
                    info!(path = %item.path, "Old backup deleted");
                    report.deleted.push(item.path.clone());
                }
                Err(e) => {
                    warn!(path = %item.path, error = %e.chain(), "Old backup delete failed");
                    report.failed.push((item.path.clone(), e));
                }
            }
        }

        Ok(report)
    }
}

impl DiskClient {
    async fn fetch_page(&self, full: &str, offset: usize) -> Result<Resource, DiskError> {
        let query = [
            ("sort", "-created".to_string()),
            ("path", full.to_string()),
            ("limit", PAGE_SIZE.to_string()),
            ("offset", offset.to_string()),
        ];
        let fetch_failed = |cause| DiskError::ResourceFetchFailed {
            path: full.to_string(),
            cause,
        };

        let resp = self
            .send(Method::GET, RESOURCES, &query)
            .await
            .map_err(fetch_failed)?;
        let resp = ensure_success(resp).await.map_err(fetch_failed)?;
        read_json(resp)
            .await
            .map_err(fetch_failed)?
            .map_err(|source| DiskError::DecodeFailed {
                path: full.to_string(),
                source,
            })
    }

    async fn upload_link(&self, full: &str) -> Result<UploadLink, Cause> {
        let query = [("overwrite", "true".to_string()), ("path", full.to_string())];
        let resp = self.send(Method::GET, UPLOAD, &query).await?;
        let resp = ensure_success(resp).await?;
        Ok(read_json(resp).await??)
    }
}

#[async_trait]
impl StorageClient for DiskClient {
    async fn ensure_folder(&self, path: &str) -> Result<(), DiskError> {
        let full = self.app_path(path);
        let folder_failed = |cause| DiskError::FolderCreateFailed {
            path: full.clone(),
            cause,
        };

        let resp = self
            .send(Method::PUT, RESOURCES, &[("path", full.clone())])
            .await
            .map_err(folder_failed)?;

        let status = resp.status();
        if status == StatusCode::CONFLICT {
            let body = resp
                .text()
                .await
                .map_err(|e| folder_failed(Cause::Transport(e)))?;
            // 409 is also sent when a parent folder is missing.
            if ApiError::parse(&body).is_some_and(|e| e.is_existing_directory()) {
                debug!(path = %full, "Folder already exists");
                return Ok(());
            }
            return Err(folder_failed(Cause::Status { status, body }));
        }
        ensure_success(resp).await.map_err(folder_failed)?;
        info!(path = %full, "Folder created");
        Ok(())
    }

    async fn get_resource(&self, path: &str) -> Result<Resource, DiskError> {
        let full = self.app_path(path);
        let mut resource = self.fetch_page(&full, 0).await?;

        // Follow the embedded listing until every child is collected.
        if let Some(list) = resource.embedded.as_mut() {
            loop {
                let fetched = list.items.len();
                match list.total {
                    Some(total) if fetched < total => {}
                    _ => break,
                }
                let page = self.fetch_page(&full, fetched).await?.into_children();
                if page.is_empty() {
                    break;
                }
                debug!(path = %full, offset = fetched, items = page.len(), "fetched listing page");
                list.items.extend(page);
            }
        }

        Ok(resource)
    }

    async fn upload_file(&self, local: &Path, remote: &str) -> Result<(), DiskError> {
        let full = self.app_path(remote);

        let link = self
            .upload_link(&full)
            .await
            .map_err(|cause| DiskError::UploadSessionFailed {
                path: full.clone(),
                cause,
            })?;
        let method = Method::from_bytes(link.method.as_bytes()).map_err(|_| {
            DiskError::UploadSessionFailed {
                path: full.clone(),
                cause: Cause::Protocol(format!("unsupported upload method {:?}", link.method)),
            }
        })?;
        if link.templated {
            return Err(DiskError::UploadSessionFailed {
                path: full,
                cause: Cause::Protocol(format!("upload href is a template: {}", link.href)),
            });
        }
        debug!(path = %full, %method, "Upload link obtained");

        self.transfer(local, &link.href, method)
            .await
            .map_err(|cause| DiskError::UploadTransferFailed {
                path: full.clone(),
                cause,
            })?;

        info!(local = %local.display(), remote = %full, "File uploaded");
        Ok(())
    }

    async fn delete_resource(&self, path: &str) -> Result<(), DiskError> {
        let delete_failed = |cause| DiskError::DeleteFailed {
            path: path.to_string(),
            cause,
        };
        let query = [("permanently", "true".to_string()), ("path", path.to_string())];

        let resp = self
            .send(Method::DELETE, RESOURCES, &query)
            .await
            .map_err(delete_failed)?;
        ensure_success(resp).await.map_err(delete_failed)?;
        Ok(())
    }
}
