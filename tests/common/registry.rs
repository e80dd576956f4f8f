//! Mock registry built on wiremock

use filing_dl::config::RegistryConfig;
use filing_dl::registry::{RegistryClient, accession_path, archive_key, padded_key};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One row of the `filings.recent` parallel arrays
pub struct Row<'a> {
    pub form: &'a str,
    pub accession: &'a str,
    pub date: &'a str,
    pub document: &'a str,
}

impl<'a> Row<'a> {
    pub fn new(form: &'a str, accession: &'a str, date: &'a str, document: &'a str) -> Self {
        Self {
            form,
            accession,
            date,
            document,
        }
    }
}

/// A wiremock server laid out like the submissions endpoint and document archive
pub struct FakeRegistry {
    pub server: MockServer,
}

impl FakeRegistry {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Registry settings pointing at this server, without pacing
    pub fn config(&self) -> RegistryConfig {
        RegistryConfig {
            user_agent: "filing-dl tests test@example.com".into(),
            request_delay: Duration::ZERO,
            submissions_base: format!("{}/submissions", self.server.uri()),
            archive_base: format!("{}/Archives/edgar/data", self.server.uri()),
            ..Default::default()
        }
    }

    pub fn client(&self) -> RegistryClient {
        RegistryClient::new(&self.config()).unwrap()
    }

    pub fn metadata_path(cik: &str) -> String {
        format!("/submissions/CIK{}.json", padded_key(cik))
    }

    pub fn archive_path(cik: &str, accession: &str, name: &str) -> String {
        format!(
            "/Archives/edgar/data/{}/{}/{}",
            archive_key(cik),
            accession_path(accession),
            name
        )
    }

    /// Serve submissions metadata built from `rows`
    pub async fn metadata(&self, cik: &str, rows: &[Row<'_>]) {
        let body = serde_json::json!({
            "cik": cik.trim_start_matches('0'),
            "filings": {"recent": {
                "form": rows.iter().map(|r| r.form).collect::<Vec<_>>(),
                "accessionNumber": rows.iter().map(|r| r.accession).collect::<Vec<_>>(),
                "filingDate": rows.iter().map(|r| r.date).collect::<Vec<_>>(),
                "primaryDocument": rows.iter().map(|r| r.document).collect::<Vec<_>>(),
            }}
        });
        Mock::given(method("GET"))
            .and(path(Self::metadata_path(cik)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Answer the metadata request for `cik` with a bare status
    pub async fn metadata_status(&self, cik: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(Self::metadata_path(cik)))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Serve one archive file
    pub async fn archive_file(&self, cik: &str, accession: &str, name: &str, body: &[u8]) {
        Mock::given(method("GET"))
            .and(path(Self::archive_path(cik, accession, name)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(&self.server)
            .await;
    }

    /// Paths of every request the server has seen, in arrival order
    pub async fn requested_paths(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect()
    }
}
