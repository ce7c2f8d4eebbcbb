use crate::ledger::UploadLedger;
use catalog_types::row::IMAGE;
use catalog_types::Row;
use csv::StringRecord;
use derive_more::{Display, Error};
use itertools::Itertools;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Display, Error)]
pub enum LoadError {
    #[display("Unable to read CSV: {_0}")]
    Csv(csv::Error),
    #[error(ignore)]
    #[display("Missing columns: {}", _0.join(", "))]
    MissingColumns(Vec<String>),
}

impl From<csv::Error> for LoadError {
    fn from(err: csv::Error) -> Self {
        LoadError::Csv(err)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    pub read: usize,
    pub already_uploaded: usize,
    pub missing_image: usize,
    pub kept: usize,
}

/// Rows of one catalog file that still need uploading.
#[derive(Debug, Default)]
pub struct Catalog {
    pub rows: Vec<Row>,
    pub image_columns: usize,
    pub stats: LoadStats,
}

/// Header positions of a catalog file.
struct Columns {
    by_name: HashMap<String, usize>,
    images: Vec<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, LoadError> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let images = names
            .iter()
            .positions(|h| h == IMAGE)
            .collect::<Vec<_>>();
        let mut by_name = HashMap::new();
        for (i, name) in names.into_iter().enumerate() {
            by_name.entry(name).or_insert(i);
        }
        let missing: Vec<String> = Row::required_headers()
            .filter(|h| !by_name.contains_key(*h))
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns(missing));
        }
        Ok(Self { by_name, images })
    }

    fn get(&self, record: &StringRecord, name: &str) -> String {
        self.by_name
            .get(name)
            .and_then(|i| record.get(*i))
            .unwrap_or_default()
            .to_string()
    }

    fn row(&self, record: &StringRecord) -> Row {
        Row {
            code: self.get(record, "Code"),
            master_product_name: self.get(record, "Master Product Name"),
            variant_name: self.get(record, "Variant Name"),
            description: self.get(record, "Product Description"),
            images: self
                .images
                .iter()
                .map(|i| record.get(*i).unwrap_or_default().to_string())
                .collect(),
            manufacturer: self.get(record, "Manufacturer"),
            category: self.get(record, "Category"),
            barcode: self.get(record, "Barcode"),
            colour: self.get(record, "Colour"),
            size_1: self.get(record, "Size 1"),
            size_2: self.get(record, "Size 2"),
            rrp: self.get(record, "RRP"),
            stock: self.get(record, "Stock"),
            brand_product: self.get(record, "Brand + Product"),
            vat_status: self.get(record, "VAT Status"),
            commodity_code: self.get(record, "Commodity Code"),
            country_of_origin: self.get(record, "Country of Origin"),
        }
    }
}

/// Reads a catalog export, dropping rows already in `ledger` or without a first image.
pub fn load_catalog<R: Read>(reader: R, ledger: &UploadLedger) -> Result<Catalog, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);
    let columns = Columns::from_headers(rdr.headers()?)?;
    let mut catalog = Catalog {
        image_columns: columns.images.len(),
        ..Default::default()
    };
    for record in rdr.records() {
        let row = columns.row(&record?);
        catalog.stats.read += 1;
        if ledger.is_uploaded(&row.code) {
            catalog.stats.already_uploaded += 1;
            continue;
        }
        if row.first_image_column().is_none() {
            catalog.stats.missing_image += 1;
            continue;
        }
        catalog.rows.push(row);
    }
    catalog.stats.kept = catalog.rows.len();
    Ok(catalog)
}

pub fn load_catalog_file<P: AsRef<Path>>(
    path: P,
    ledger: &UploadLedger,
) -> Result<Catalog, LoadError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    let catalog = load_catalog(file, ledger)?;
    let LoadStats {
        read,
        already_uploaded,
        missing_image,
        kept,
    } = catalog.stats;
    log::info!(
        "Loaded {path:?}: {read} rows, {already_uploaded} already uploaded, {missing_image} without image, {kept} to display"
    );
    Ok(catalog)
}
