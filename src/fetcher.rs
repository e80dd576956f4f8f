//! Downloads a filing's primary document and the same-origin images it references
//!
//! The primary document is written verbatim into the scratch directory. For markup
//! documents, image references found in `src="..."` attributes and CSS
//! `background-image: url(...)` declarations are resolved against the filing's archive
//! directory and written next to the document, so a renderer with local file access
//! picks them up through the unchanged relative references.
//!
//! Absolute (`http...`) and protocol-relative (`//...`) references are never followed.
//! A failed asset is logged and skipped; only the primary document is fatal.

use crate::error::RegistryError;
use crate::registry::RegistryClient;
use crate::types::{CompanyRef, FetchedDocument, FilingRecord};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

const ASSET_PATTERNS: &[&str] = &[
    r#"src=["']([^"']*\.(?:jpg|jpeg|png|gif|svg))["']"#,
    r#"background-image:\s*url\(["']?([^"')]*\.(?:jpg|jpeg|png|gif|svg))["']?\)"#,
];

/// Fetches primary documents and their referenced assets
pub struct DocumentFetcher {
    client: Arc<RegistryClient>,
    patterns: Vec<Regex>,
}

impl DocumentFetcher {
    /// Create a fetcher that downloads through `client`
    pub fn new(client: Arc<RegistryClient>) -> Self {
        Self {
            client,
            patterns: compile_patterns(ASSET_PATTERNS),
        }
    }

    /// Download the filing's primary document into `output_dir`, plus its assets for markup
    ///
    /// # Errors
    ///
    /// Fails if the document name is not a plain file name, if the directory cannot be
    /// created, or if the primary document cannot be fetched or written. Asset problems
    /// never fail the call.
    pub async fn fetch(
        &self,
        company: &CompanyRef,
        filing: &FilingRecord,
        output_dir: &Path,
    ) -> Result<FetchedDocument, RegistryError> {
        let base_url = self
            .client
            .filing_base_url(&company.registry_key, &filing.accession_id)?;

        let document_name = filing.primary_document.as_str();
        if !is_plain_file_name(document_name) {
            return Err(RegistryError::MalformedResponse {
                url: base_url.to_string(),
                reason: format!("primary document name {:?} is not a plain file name", document_name),
            });
        }

        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| RegistryError::Write {
                path: output_dir.to_path_buf(),
                source,
            })?;

        let body = self
            .client
            .fetch_document(&company.registry_key, &filing.accession_id, document_name)
            .await?;

        let path = output_dir.join(document_name);
        tokio::fs::write(&path, &body)
            .await
            .map_err(|source| RegistryError::Write {
                path: path.clone(),
                source,
            })?;

        info!(
            company = %company.identifier,
            document = %document_name,
            bytes = body.len(),
            "downloaded primary document"
        );

        let mut assets = BTreeSet::new();
        if is_markup(document_name) {
            let text = String::from_utf8_lossy(&body);
            for reference in self.asset_references(&text) {
                if let Some(name) = self
                    .fetch_asset(&base_url, &reference, output_dir, &assets)
                    .await
                {
                    assets.insert(name);
                }
            }
            if !assets.is_empty() {
                debug!(company = %company.identifier, count = assets.len(), "downloaded assets");
            }
        }

        Ok(FetchedDocument { path, assets })
    }

    /// Image references in document order, first pattern first
    fn asset_references(&self, text: &str) -> Vec<String> {
        self.patterns
            .iter()
            .flat_map(|re| re.captures_iter(text))
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Download one referenced asset; `None` means skipped or failed
    async fn fetch_asset(
        &self,
        base_url: &url::Url,
        reference: &str,
        output_dir: &Path,
        written: &BTreeSet<String>,
    ) -> Option<String> {
        if reference.starts_with("http") || reference.starts_with("//") {
            debug!(reference = %reference, "skipping external asset");
            return None;
        }

        let url = match base_url.join(reference) {
            Ok(url) => url,
            Err(e) => {
                warn!(reference = %reference, error = %e, "cannot resolve asset reference");
                return None;
            }
        };

        let name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_string();
        if name.is_empty() {
            return None;
        }
        if !is_plain_file_name(&name) {
            warn!(reference = %reference, "skipping asset with unsafe file name");
            return None;
        }
        if written.contains(&name) {
            return None;
        }

        let path = output_dir.join(&name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!(asset = %name, "asset already present");
            return None;
        }

        let body = match self.client.fetch_url(&url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(asset = %name, error = %e, "failed to download asset");
                return None;
            }
        };

        if let Err(e) = tokio::fs::write(&path, &body).await {
            warn!(asset = %name, path = %path.display(), error = %e, "failed to write asset");
            return None;
        }

        Some(name)
    }
}

/// Compile case-insensitive patterns, logging and skipping any that fail
fn compile_patterns(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| {
            regex::RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    warn!("Invalid asset pattern '{}': {}", pattern, e);
                })
                .ok()
        })
        .collect()
}

fn is_markup(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("htm") || ext.eq_ignore_ascii_case("html"))
}

/// A bare file name that cannot escape the directory it is joined onto
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..")
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use chrono::NaiveDate;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FILING_DIR: &str = "/Archives/edgar/data/320193/000032019325000079";

    fn fetcher_for(server: &MockServer) -> DocumentFetcher {
        let config = RegistryConfig {
            user_agent: "Test Agent test@example.com".into(),
            request_delay: Duration::ZERO,
            submissions_base: format!("{}/submissions", server.uri()),
            archive_base: format!("{}/Archives/edgar/data", server.uri()),
            ..Default::default()
        };
        DocumentFetcher::new(Arc::new(RegistryClient::new(&config).unwrap()))
    }

    fn company() -> CompanyRef {
        CompanyRef::new("AAPL", "0000320193")
    }

    fn filing(document: &str) -> FilingRecord {
        FilingRecord {
            form_type: "10-K".into(),
            accession_id: "0000320193-25-000079".into(),
            filing_date: NaiveDate::from_ymd_opt(2025, 10, 31).unwrap(),
            primary_document: document.into(),
        }
    }

    async fn mount_document(server: &MockServer, name: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(format!("{FILING_DIR}/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(server)
            .await;
    }

    async fn mount_asset(server: &MockServer, name: &str, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path(format!("{FILING_DIR}/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\x89PNG".to_vec()))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[test]
    fn test_plain_file_names() {
        assert!(is_plain_file_name("aapl-20250927.htm"));
        assert!(!is_plain_file_name("../escape.htm"));
        assert!(!is_plain_file_name("dir/file.htm"));
        assert!(!is_plain_file_name("dir\\file.htm"));
        assert!(!is_plain_file_name(""));
    }

    #[test]
    fn test_asset_patterns_are_case_insensitive() {
        let fetcher = DocumentFetcher {
            client: Arc::new(RegistryClient::new(&RegistryConfig::default()).unwrap()),
            patterns: compile_patterns(ASSET_PATTERNS),
        };
        let refs = fetcher.asset_references(
            r#"<IMG SRC="Logo.PNG"><div style="BACKGROUND-IMAGE: url('bg.jpg')"></div>
               <p style="background-image:url(plain.gif)"></p><a href="doc.pdf">x</a>"#,
        );
        assert_eq!(refs, vec!["Logo.PNG", "bg.jpg", "plain.gif"]);
    }

    #[tokio::test]
    async fn test_fetch_writes_document_and_relative_assets() {
        let server = MockServer::start().await;
        let html = r#"<html><img src="logo.png"><img src='chart.gif'>
            <div style="background-image: url(bg.jpg)"></div>
            <img src="logo.png"></html>"#;
        mount_document(&server, "aapl-20250927.htm", html).await;
        mount_asset(&server, "logo.png", 1).await;
        mount_asset(&server, "chart.gif", 1).await;
        mount_asset(&server, "bg.jpg", 1).await;

        let dir = TempDir::new().unwrap();
        let scratch = dir.path().join("temp");
        let fetched = fetcher_for(&server)
            .fetch(&company(), &filing("aapl-20250927.htm"), &scratch)
            .await
            .unwrap();

        assert_eq!(fetched.path, scratch.join("aapl-20250927.htm"));
        assert_eq!(std::fs::read_to_string(&fetched.path).unwrap(), html);
        let names: Vec<_> = fetched.assets.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["bg.jpg", "chart.gif", "logo.png"]);
        assert!(scratch.join("logo.png").exists());
    }

    #[tokio::test]
    async fn test_absolute_and_protocol_relative_references_are_never_fetched() {
        let server = MockServer::start().await;
        let authority = server.address().to_string();
        let html = format!(
            r#"<img src="{}/abs.png"><img src="//{}/proto.png">"#,
            server.uri(),
            authority
        );
        mount_document(&server, "doc.htm", &html).await;
        Mock::given(method("GET"))
            .and(path("/abs.png"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/proto.png"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let fetched = fetcher_for(&server)
            .fetch(&company(), &filing("doc.htm"), dir.path())
            .await
            .unwrap();

        assert!(fetched.assets.is_empty());
    }

    #[tokio::test]
    async fn test_existing_assets_are_not_refetched() {
        let server = MockServer::start().await;
        mount_document(&server, "doc.htm", r#"<img src="logo.png">"#).await;
        mount_asset(&server, "logo.png", 0).await;

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("logo.png"), b"cached").unwrap();

        let fetched = fetcher_for(&server)
            .fetch(&company(), &filing("doc.htm"), dir.path())
            .await
            .unwrap();

        assert!(fetched.assets.is_empty());
        assert_eq!(std::fs::read(dir.path().join("logo.png")).unwrap(), b"cached");
    }

    #[tokio::test]
    async fn test_asset_failure_is_not_fatal() {
        let server = MockServer::start().await;
        mount_document(&server, "doc.htm", r#"<img src="missing.png"><img src="ok.png">"#).await;
        Mock::given(method("GET"))
            .and(path(format!("{FILING_DIR}/missing.png")))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        mount_asset(&server, "ok.png", 1).await;

        let dir = TempDir::new().unwrap();
        let fetched = fetcher_for(&server)
            .fetch(&company(), &filing("doc.htm"), dir.path())
            .await
            .unwrap();

        assert_eq!(fetched.assets.len(), 1);
        assert!(fetched.assets.contains("ok.png"));
        assert!(!dir.path().join("missing.png").exists());
    }

    #[tokio::test]
    async fn test_primary_document_failure_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let result = fetcher_for(&server)
            .fetch(&company(), &filing("doc.htm"), dir.path())
            .await;

        assert!(matches!(result, Err(RegistryError::Status { status: 500, .. })));
        assert!(!dir.path().join("doc.htm").exists());
    }

    #[tokio::test]
    async fn test_unsafe_document_name_is_rejected_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let result = fetcher_for(&server)
            .fetch(&company(), &filing("../../escape.htm"), &dir.path().join("temp"))
            .await;

        assert!(matches!(result, Err(RegistryError::MalformedResponse { .. })));
        assert!(!dir.path().join("temp").exists());
    }

    #[tokio::test]
    async fn test_plain_text_documents_are_not_scanned() {
        let server = MockServer::start().await;
        mount_document(&server, "filing.txt", r#"see src="logo.png""#).await;
        mount_asset(&server, "logo.png", 0).await;

        let dir = TempDir::new().unwrap();
        let fetched = fetcher_for(&server)
            .fetch(&company(), &filing("filing.txt"), dir.path())
            .await
            .unwrap();

        assert!(fetched.assets.is_empty());
        assert!(dir.path().join("filing.txt").exists());
    }
}
