//! Client for a GitHub-compatible source-hosting API.
//!
//! Fetches module repository files from the branch that produced the
//! latest release, walking the tree with an explicit depth bound. Per-file
//! and per-directory failures are logged and skipped so one bad entry
//! never fails the whole traversal.

use crate::config::HubConfig;
use crate::error::ApiError;
use crate::terraform::model::{
    display_provider, readme_excerpt, OutputDeclaration, VariableDeclaration,
};
use crate::terraform::parser;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The origin tree is assumed acyclic but its size is unconstrained, so
/// the walk carries explicit bounds.
const MAX_TREE_DEPTH: usize = 8;
const MAX_TREE_FILES: usize = 500;

/// File extensions worth fetching from a module repository.
const TARGET_EXTENSIONS: [&str; 3] = [".tf", ".md", ".txt"];

#[derive(Debug, Clone, Serialize)]
pub struct FileMetadata {
    pub size: u64,
    pub sha: String,
    pub download_url: String,
    pub html_url: String,
}

/// Everything recovered from a module repository walk.
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryFiles {
    pub repository: String,
    pub provider: String,
    pub provider_code: String,
    pub branch_used: String,
    pub release_info: Value,
    pub terraform_files: Vec<String>,
    pub documentation_files: Vec<String>,
    pub all_files: BTreeMap<String, String>,
    pub file_metadata: BTreeMap<String, FileMetadata>,
    pub input_variables: Vec<VariableDeclaration>,
    pub output_variables: Vec<OutputDeclaration>,
    pub file_count: usize,
    pub readme_content: String,
    pub repository_info: Value,
    pub latest_commit: Value,
}

pub struct HubClient {
    client: Client,
    api_url: String,
    token: String,
    organization: String,
}

impl HubClient {
    pub fn new(config: &HubConfig) -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("tfscaffold/", env!("CARGO_PKG_VERSION")))
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_url: config.api_url.clone(),
            token: config.token.clone(),
            organization: config.organization.clone(),
        }
    }

    async fn get_json(&self, url: &str, resource: &str) -> Result<Value, ApiError> {
        debug!(url, "hub request");
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await?;

        let status = response.status();
        if status == 404 {
            return Err(ApiError::NotFound {
                resource: resource.to_string(),
            });
        }
        if status == 401 {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ApiError::Unexpected(format!("HTTP {} for {}", status, url)));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(ApiError::from)
    }

    async fn get_json_opt(&self, url: &str, resource: &str) -> Option<Value> {
        match self.get_json(url, resource).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(resource, error = %e, "optional hub fetch failed, continuing without it");
                None
            }
        }
    }

    /// Determine which branch to read from the latest release: releases cut
    /// from develop-like branches point at develop, everything else
    /// (including bare commit hashes) falls back to main.
    async fn resolve_branch(&self, repo_name: &str) -> (String, Value) {
        let url = format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_url, self.organization, repo_name
        );
        match self.get_json_opt(&url, "latest release").await {
            Some(release) => {
                let target_commitish = release["target_commitish"].as_str().unwrap_or("main");
                let branch = match target_commitish {
                    "develop" | "development" | "dev" => "develop",
                    _ => "main",
                };
                let info = serde_json::json!({
                    "tag_name": release["tag_name"].as_str().unwrap_or(""),
                    "name": release["name"].as_str().unwrap_or(""),
                    "published_at": release["published_at"].as_str().unwrap_or(""),
                    "target_commitish": target_commitish,
                });
                info!(
                    repo = repo_name,
                    tag = release["tag_name"].as_str().unwrap_or(""),
                    branch,
                    "resolved branch from latest release"
                );
                (branch.to_string(), info)
            }
            None => {
                info!(repo = repo_name, "no releases found, defaulting to main");
                (
                    "main".to_string(),
                    serde_json::json!({"message": "No releases found, using main branch"}),
                )
            }
        }
    }

    /// Walk the repository tree depth-first with explicit depth and file
    /// bounds, fetching and decoding every matching file.
    async fn walk_tree(
        &self,
        repo_name: &str,
        branch: &str,
    ) -> Result<(BTreeMap<String, String>, BTreeMap<String, FileMetadata>), ApiError> {
        let mut files = BTreeMap::new();
        let mut metadata = BTreeMap::new();

        // (path, depth); empty path is the repository root.
        let mut pending: Vec<(String, usize)> = vec![(String::new(), 0)];

        while let Some((dir_path, depth)) = pending.pop() {
            let url = if dir_path.is_empty() {
                format!(
                    "{}/repos/{}/{}/contents?ref={}",
                    self.api_url, self.organization, repo_name, branch
                )
            } else {
                format!(
                    "{}/repos/{}/{}/contents/{}?ref={}",
                    self.api_url, self.organization, repo_name, dir_path, branch
                )
            };

            // The root listing must succeed; nested directories may not.
            let listing = if dir_path.is_empty() {
                self.get_json(&url, &format!("repository {}/{} contents", self.organization, repo_name))
                    .await?
            } else {
                match self.get_json(&url, "directory listing").await {
                    Ok(listing) => listing,
                    Err(e) => {
                        warn!(path = %dir_path, error = %e, "skipping unreadable directory");
                        continue;
                    }
                }
            };

            let Some(items) = listing.as_array() else {
                continue;
            };

            for item in items {
                let name = item["name"].as_str().unwrap_or("");
                let path = item["path"].as_str().unwrap_or(name).to_string();
                match item["type"].as_str().unwrap_or("") {
                    "file" => {
                        let lower = name.to_lowercase();
                        if !TARGET_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
                            continue;
                        }
                        if files.len() >= MAX_TREE_FILES {
                            warn!(limit = MAX_TREE_FILES, "file limit reached, truncating walk");
                            return Ok((files, metadata));
                        }
                        match self.fetch_file(repo_name, &path, branch).await {
                            Ok(Some((content, meta))) => {
                                files.insert(path.clone(), content);
                                metadata.insert(path, meta);
                            }
                            Ok(None) => {}
                            Err(e) => {
                                warn!(path = %path, error = %e, "skipping unreadable file");
                            }
                        }
                    }
                    "dir" => {
                        if depth + 1 > MAX_TREE_DEPTH {
                            warn!(path = %path, limit = MAX_TREE_DEPTH, "depth limit reached, not descending");
                        } else {
                            pending.push((path, depth + 1));
                        }
                    }
                    _ => {}
                }
            }
        }

        Ok((files, metadata))
    }

    async fn fetch_file(
        &self,
        repo_name: &str,
        path: &str,
        branch: &str,
    ) -> Result<Option<(String, FileMetadata)>, ApiError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.api_url, self.organization, repo_name, path, branch
        );
        let file = self.get_json(&url, "file contents").await?;

        if file["encoding"].as_str() != Some("base64") {
            return Ok(None);
        }
        let raw: String = file["content"]
            .as_str()
            .unwrap_or("")
            .split_whitespace()
            .collect();
        let decoded = BASE64
            .decode(raw)
            .map_err(|e| ApiError::Unexpected(format!("base64 decode failed for {}: {}", path, e)))?;
        let content = String::from_utf8_lossy(&decoded).into_owned();

        let meta = FileMetadata {
            size: file["size"].as_u64().unwrap_or(0),
            sha: file["sha"].as_str().unwrap_or("").to_string(),
            download_url: file["download_url"].as_str().unwrap_or("").to_string(),
            html_url: file["html_url"].as_str().unwrap_or("").to_string(),
        };
        Ok(Some((content, meta)))
    }

    /// Fetch all relevant files from the module's repository, parsing
    /// variable and output declarations out of the configuration files.
    /// The repository is named `terraform-<provider>-<module>`.
    pub async fn fetch_module_repository(
        &self,
        module_name: &str,
        provider: &str,
    ) -> Result<RepositoryFiles, ApiError> {
        let code = crate::terraform::model::provider_code(provider).to_string();
        let repo_name = format!("terraform-{}-{}", code, module_name);

        let (branch, release_info) = self.resolve_branch(&repo_name).await;
        let (all_files, file_metadata) = self.walk_tree(&repo_name, &branch).await?;

        let mut input_variables = Vec::new();
        for (path, content) in &all_files {
            if path.ends_with("variables.tf") {
                input_variables.extend(parser::parse_variables(content));
            }
        }
        let mut output_variables = Vec::new();
        for (path, content) in &all_files {
            if path.ends_with("outputs.tf") {
                output_variables.extend(parser::parse_outputs(content));
            }
        }

        let terraform_files: Vec<String> = all_files
            .keys()
            .filter(|k| k.ends_with(".tf"))
            .cloned()
            .collect();
        let documentation_files: Vec<String> = all_files
            .keys()
            .filter(|k| k.ends_with(".md") || k.ends_with(".txt"))
            .cloned()
            .collect();

        let readme_content = all_files
            .iter()
            .find(|(path, _)| path.to_lowercase().contains("readme"))
            .map(|(_, content)| readme_excerpt(content))
            .unwrap_or_default();

        // Repository metadata and the branch head are nice-to-have.
        let repo_info = self
            .get_json_opt(
                &format!("{}/repos/{}/{}", self.api_url, self.organization, repo_name),
                "repository info",
            )
            .await
            .unwrap_or(Value::Null);
        let commit = self
            .get_json_opt(
                &format!(
                    "{}/repos/{}/{}/commits/{}",
                    self.api_url, self.organization, repo_name, branch
                ),
                "latest commit",
            )
            .await
            .unwrap_or(Value::Null);

        info!(
            repo = %repo_name,
            branch = %branch,
            files = all_files.len(),
            inputs = input_variables.len(),
            outputs = output_variables.len(),
            "fetched module repository"
        );

        Ok(RepositoryFiles {
            repository: format!("{}/{}", self.organization, repo_name),
            provider: display_provider(&code).to_string(),
            provider_code: code,
            branch_used: branch.clone(),
            release_info,
            terraform_files,
            documentation_files,
            file_count: all_files.len(),
            all_files,
            file_metadata,
            input_variables,
            output_variables,
            readme_content,
            repository_info: serde_json::json!({
                "description": repo_info["description"].as_str().unwrap_or(""),
                "created_at": repo_info["created_at"].as_str().unwrap_or(""),
                "updated_at": repo_info["updated_at"].as_str().unwrap_or(""),
                "pushed_at": repo_info["pushed_at"].as_str().unwrap_or(""),
                "default_branch": repo_info["default_branch"].as_str().unwrap_or("main"),
                "size": repo_info["size"].as_u64().unwrap_or(0),
                "language": repo_info["language"].as_str().unwrap_or(""),
                "topics": repo_info["topics"].as_array().cloned().unwrap_or_default(),
            }),
            latest_commit: serde_json::json!({
                "sha": commit["sha"].as_str().map(|s| s.chars().take(8).collect::<String>()).unwrap_or_default(),
                "message": commit["commit"]["message"].as_str().unwrap_or(""),
                "author": commit["commit"]["author"]["name"].as_str().unwrap_or(""),
                "date": commit["commit"]["author"]["date"].as_str().unwrap_or(""),
                "branch": branch,
            }),
        })
    }
}
