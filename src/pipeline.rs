//! Per-company pipeline and sequential batch runs
//!
//! One company goes through four stages: metadata, selection, download, conversion.
//! The first failing stage ends that company's run with a [`CompanyOutcome::Failed`]
//! carrying the stage and cause. Batches never stop early.

use crate::config::{CompanyMap, Config};
use crate::convert::{DocumentRenderer, FormatConverter, renderer_from_config};
use crate::error::Result;
use crate::fetcher::DocumentFetcher;
use crate::registry::{RegistryClient, RequestPacer};
use crate::selector::select_latest_original_filing;
use crate::types::{
    BatchReport, CompanyOutcome, CompanyRef, ConversionResult, ReportFailure, Stage,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Subdirectory of the output directory that receives downloaded documents and assets
pub const SCRATCH_DIR: &str = "temp";

/// Fetch-and-convert pipeline shared by the CLI and the job tracker
///
/// Cloning is cheap and clones share the registry client, so every clone is throttled
/// by the same [`RequestPacer`].
#[derive(Clone)]
pub struct Pipeline {
    client: Arc<RegistryClient>,
    fetcher: Arc<DocumentFetcher>,
    converter: FormatConverter,
    companies: Arc<CompanyMap>,
    form_type: Arc<str>,
}

impl Pipeline {
    /// Build a pipeline from registry client, renderer and target form type
    ///
    /// The company mapping starts as [`CompanyMap::default`]; see [`Pipeline::with_companies`].
    pub fn new(
        client: RegistryClient,
        renderer: Arc<dyn DocumentRenderer>,
        form_type: impl Into<String>,
    ) -> Self {
        let client = Arc::new(client);
        Self {
            fetcher: Arc::new(DocumentFetcher::new(client.clone())),
            client,
            converter: FormatConverter::new(renderer),
            companies: Arc::new(CompanyMap::default()),
            form_type: Arc::from(form_type.into()),
        }
    }

    /// Build client, renderer and company mapping from configuration
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] when the registry client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = RegistryClient::new(&config.registry)?;
        let renderer = renderer_from_config(&config.tools);

        Ok(Self::new(client, renderer, config.output.form_type.clone())
            .with_companies(config.companies.clone()))
    }

    /// Replace the ticker mapping used by [`Pipeline::run_tickers`]
    #[must_use]
    pub fn with_companies(mut self, companies: CompanyMap) -> Self {
        self.companies = Arc::new(companies);
        self
    }

    /// Known tickers and their registry keys
    pub fn companies(&self) -> &CompanyMap {
        &self.companies
    }

    /// Form type selected for every company
    pub fn form_type(&self) -> &str {
        &self.form_type
    }

    /// Pacer gating every registry request this pipeline makes
    pub fn pacer(&self) -> &RequestPacer {
        self.client.pacer()
    }

    /// Run all four stages for one company
    ///
    /// Downloads land in `output_dir/temp`; the artifact is written to
    /// `output_dir/<identifier>_<accession>_<date>.pdf`. On success the downloaded
    /// primary document is removed; assets stay for later runs.
    pub async fn process_company(&self, company: &CompanyRef, output_dir: &Path) -> CompanyOutcome {
        info!(company = %company.identifier, cik = %company.registry_key, "Processing company");

        let metadata = match self.client.fetch_metadata(&company.registry_key).await {
            Ok(metadata) => metadata,
            Err(e) => return failed(company, Stage::Metadata, e.to_string()),
        };

        let Some(filing) = select_latest_original_filing(&metadata, &self.form_type) else {
            return failed(
                company,
                Stage::Selection,
                format!("no {} filing found", self.form_type),
            );
        };
        info!(
            company = %company.identifier,
            accession = %filing.accession_id,
            filing_date = %filing.filing_date,
            document = %filing.primary_document,
            "Selected filing"
        );

        let scratch = output_dir.join(SCRATCH_DIR);
        let fetched = match self.fetcher.fetch(company, &filing, &scratch).await {
            Ok(fetched) => fetched,
            Err(e) => return failed(company, Stage::Download, e.to_string()),
        };

        let artifact = output_dir.join(filing.artifact_name(&company.identifier));
        let artifact_path = match self.converter.convert(&fetched.path, &artifact).await {
            Ok(path) => path,
            Err(e) => return failed(company, Stage::Conversion, e.to_string()),
        };

        if let Err(e) = tokio::fs::remove_file(&fetched.path).await {
            warn!(path = %fetched.path.display(), error = %e, "failed to remove downloaded document");
        }

        info!(company = %company.identifier, path = %artifact_path.display(), "Company converted");
        CompanyOutcome::Converted(ConversionResult {
            company: company.clone(),
            filing,
            artifact_path,
        })
    }

    /// Process companies one after another in input order
    ///
    /// # Errors
    ///
    /// Only fails when `output_dir` cannot be created; per-company failures are
    /// collected in the report.
    pub async fn run_batch(&self, companies: &[CompanyRef], output_dir: &Path) -> Result<BatchReport> {
        tokio::fs::create_dir_all(output_dir).await?;

        let mut report = BatchReport::default();
        for company in companies {
            match self.process_company(company, output_dir).await {
                CompanyOutcome::Converted(result) => report.results.push(result),
                CompanyOutcome::Failed {
                    company,
                    stage,
                    reason,
                } => report.failures.push(ReportFailure {
                    ticker: company.identifier,
                    stage,
                    reason,
                }),
            }
        }

        info!(
            processed = report.processed(),
            successful = report.results.len(),
            failed = report.failures.len(),
            "Batch finished"
        );
        Ok(report)
    }

    /// Resolve tickers against the configured mapping, then run the batch
    ///
    /// Unknown tickers are logged and listed in [`BatchReport::unknown`] without any
    /// request being made for them.
    pub async fn run_tickers<S: AsRef<str>>(&self, tickers: &[S], output_dir: &Path) -> Result<BatchReport> {
        let (companies, unknown) = resolve_companies(tickers, &self.companies);
        let mut report = self.run_batch(&companies, output_dir).await?;
        report.unknown = unknown;
        Ok(report)
    }
}

fn failed(company: &CompanyRef, stage: Stage, reason: String) -> CompanyOutcome {
    error!(company = %company.identifier, %stage, reason = %reason, "Company failed");
    CompanyOutcome::Failed {
        company: company.clone(),
        stage,
        reason,
    }
}

/// Split tickers into known companies and unknown identifiers, both upper-cased
///
/// Blank entries are dropped. Input order is preserved on both sides.
pub fn resolve_companies<S: AsRef<str>>(
    tickers: &[S],
    companies: &CompanyMap,
) -> (Vec<CompanyRef>, Vec<String>) {
    let mut known = Vec::new();
    let mut unknown = Vec::new();

    for ticker in tickers {
        let ticker = ticker.as_ref().trim().to_uppercase();
        if ticker.is_empty() {
            continue;
        }
        match companies.get(&ticker) {
            Some(cik) => known.push(CompanyRef::new(ticker, cik)),
            None => {
                warn!(ticker = %ticker, "Unknown ticker, skipping");
                unknown.push(ticker);
            }
        }
    }

    (known, unknown)
}
