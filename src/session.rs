use crate::category::CategoryResolver;
use crate::config::Config;
use crate::ledger::UploadLedger;
use crate::loader::{self, LoadError, LoadStats};
use crate::uploader::{self, UploadOutcome};
use crate::woocommerce::{ApiError, WooCommerceApi};
use anyhow::Context;
use catalog_types::Row;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::Path;
use url::Url;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub uploaded: Vec<String>,
    pub skipped: Vec<String>,
    /// Code and reason of every row that stays displayed for a retry.
    pub failed: Vec<(String, String)>,
    pub not_displayed: Vec<String>,
    /// Uploaded codes the ledger file failed to record, with the io error.
    pub unrecorded: Vec<(String, String)>,
}

/// State of one import run: the rows on display plus everything needed to upload them.
pub struct ImportSession {
    api: Box<dyn WooCommerceApi>,
    site_root: Url,
    ledger: UploadLedger,
    categories: CategoryResolver,
    rows: Vec<Row>,
    image_columns: usize,
}

impl ImportSession {
    pub fn new(api: Box<dyn WooCommerceApi>, site_root: Url, ledger: UploadLedger) -> Self {
        Self {
            api,
            site_root,
            ledger,
            categories: CategoryResolver::new(),
            rows: Vec::new(),
            image_columns: 0,
        }
    }

    pub fn open(config: &Config, api: Box<dyn WooCommerceApi>) -> anyhow::Result<Self> {
        let ledger = UploadLedger::open(&config.ledger_path)
            .with_context(|| format!("Unable to open ledger {:?}", config.ledger_path))?;
        Ok(Self::new(api, config.site_url.clone(), ledger))
    }

    /// Replaces the category cache with the remote listing.
    pub async fn load_categories(&mut self, page_size: u32) {
        self.categories = CategoryResolver::load(self.api.as_ref(), page_size).await;
    }

    pub fn load_csv<P: AsRef<Path>>(&mut self, path: P) -> Result<LoadStats, LoadError> {
        let catalog = loader::load_catalog_file(path, &self.ledger)?;
        Ok(self.display(catalog))
    }

    pub fn load_reader<R: Read>(&mut self, reader: R) -> Result<LoadStats, LoadError> {
        let catalog = loader::load_catalog(reader, &self.ledger)?;
        Ok(self.display(catalog))
    }

    fn display(&mut self, catalog: loader::Catalog) -> LoadStats {
        self.rows = catalog.rows;
        self.image_columns = catalog.image_columns;
        catalog.stats
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn image_columns(&self) -> usize {
        self.image_columns
    }

    pub fn ledger(&self) -> &UploadLedger {
        &self.ledger
    }

    pub fn categories(&self) -> &CategoryResolver {
        &self.categories
    }

    pub fn find(&self, code: &str) -> Option<&Row> {
        let code = code.trim();
        self.rows.iter().find(|r| r.code.trim() == code)
    }

    /// Displayed rows with any cell containing `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<&Row> {
        let query = query.trim();
        if query.is_empty() {
            return self.rows.iter().collect();
        }
        self.rows.iter().filter(|r| r.matches(query)).collect()
    }

    /// Uploads the selected rows one after another.
    ///
    /// Uploaded rows leave the display. Failed rows stay for a retry.
    pub async fn upload_selected<S: AsRef<str>>(&mut self, codes: &[S]) -> UploadReport {
        let mut report = UploadReport::default();
        let pb = ProgressBar::new(codes.len() as u64);
        match ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos:>7}/{len:7} {msg}") {
            Ok(style) => pb.set_style(style.progress_chars("=-")),
            Err(err) => log::warn!("Unable to initialize progress bar: {err}"),
        }
        for code in codes {
            let code = code.as_ref().trim();
            pb.set_message(code.to_string());
            let Some(index) = self.rows.iter().position(|r| r.code.trim() == code) else {
                log::warn!("Product {code} is not displayed, skipping");
                report.not_displayed.push(code.to_string());
                pb.inc(1);
                continue;
            };
            let result = uploader::upload_row(
                self.api.as_ref(),
                &self.site_root,
                &mut self.categories,
                &mut self.ledger,
                &self.rows[index],
            )
            .await;
            match result {
                Ok(UploadOutcome::Uploaded(_)) => {
                    self.rows.remove(index);
                    report.uploaded.push(code.to_string());
                }
                Ok(UploadOutcome::Unrecorded { error, .. }) => {
                    self.rows.remove(index);
                    report.uploaded.push(code.to_string());
                    report.unrecorded.push((code.to_string(), error.to_string()));
                }
                Ok(UploadOutcome::Skipped) => report.skipped.push(code.to_string()),
                Err(err) => report.failed.push((code.to_string(), err.to_string())),
            }
            pb.inc(1);
        }
        pb.finish_and_clear();
        report
    }

    pub async fn test_connection(&self) -> Result<(), ApiError> {
        self.api.list_products().await
    }
}
