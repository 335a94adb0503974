use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::info;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::json;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

/// A remote repository that files can be pushed to.
pub trait DatasetStore {
    fn upload_file(&self, local: &Path, path_in_repo: &str) -> Result<()>;
}

/// Client for the commit API of a Hugging Face compatible hub.
#[derive(Debug, Clone)]
pub struct HubClient {
    client: Client,
    endpoint: String,
    token: String,
    repo_id: String,
    repo_type: String,
    revision: String,
}

impl HubClient {
    pub fn new(repo_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            token: token.into(),
            repo_id: repo_id.into(),
            repo_type: "dataset".to_owned(),
            revision: "main".to_owned(),
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn repo_type(mut self, repo_type: impl Into<String>) -> Self {
        self.repo_type = repo_type.into();
        self
    }

    pub fn revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    pub fn commit_url(&self) -> String {
        format!(
            "{}/api/{}s/{}/commit/{}",
            self.endpoint, self.repo_type, self.repo_id, self.revision
        )
    }

    /// NDJSON commit payload: a header line, then one line carrying the file.
    pub fn commit_body(&self, content: &[u8], path_in_repo: &str) -> Result<String> {
        let header = json!({
            "key": "header",
            "value": {
                "summary": format!("Upload {path_in_repo}"),
                "description": "",
            },
        });
        let file = json!({
            "key": "file",
            "value": {
                "content": STANDARD.encode(content),
                "path": path_in_repo,
                "encoding": "base64",
            },
        });
        Ok(format!(
            "{}\n{}\n",
            serde_json::to_string(&header)?,
            serde_json::to_string(&file)?
        ))
    }
}

impl DatasetStore for HubClient {
    fn upload_file(&self, local: &Path, path_in_repo: &str) -> Result<()> {
        let content = fs::read(local).with_context(|| format!("cannot read {}", local.display()))?;
        let body = self.commit_body(&content, path_in_repo)?;
        let response = self
            .client
            .post(self.commit_url())
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .with_context(|| format!("upload of {path_in_repo} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(anyhow!(
                "upload of {path_in_repo} to {} rejected with {status}: {text}",
                self.repo_id
            ));
        }
        Ok(())
    }
}

/// Uploads every regular file directly inside `folder` to
/// `{prefix}/{file_name}`, in file name order. Sub-directories are skipped.
pub fn upload_folder(store: &impl DatasetStore, folder: &Path, prefix: &str) -> Result<Vec<String>> {
    let mut uploaded = Vec::new();
    let entries = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in entries {
        let entry = entry.with_context(|| format!("cannot list {}", folder.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        let path_in_repo = if prefix.is_empty() {
            file_name.into_owned()
        } else {
            format!("{}/{file_name}", prefix.trim_end_matches('/'))
        };

        info!("Uploading {} ...", entry.path().display());
        store.upload_file(entry.path(), &path_in_repo)?;
        info!("Uploaded {path_in_repo}");
        uploaded.push(path_in_repo);
    }
    Ok(uploaded)
}
