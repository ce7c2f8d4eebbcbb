use crate::non_blank;

/// Header of the CSV column holding the product code.
pub const CODE: &str = "Code";
/// Image columns share one header and repeat as many times as the export has images.
pub const IMAGE: &str = "Image";

/// Columns that precede the image block in display order.
pub const LEADING_COLUMNS: [&str; 4] = [
    CODE,
    "Master Product Name",
    "Variant Name",
    "Product Description",
];

/// Columns that follow the image block in display order.
pub const TRAILING_COLUMNS: [&str; 12] = [
    "Manufacturer",
    "Category",
    "Barcode",
    "Colour",
    "Size 1",
    "Size 2",
    "RRP",
    "Stock",
    "Brand + Product",
    "VAT Status",
    "Commodity Code",
    "Country of Origin",
];

/// One product record of the catalog export, keyed by `code`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub code: String,
    pub master_product_name: String,
    pub variant_name: String,
    pub description: String,
    pub images: Vec<String>,
    pub manufacturer: String,
    pub category: String,
    pub barcode: String,
    pub colour: String,
    pub size_1: String,
    pub size_2: String,
    pub rrp: String,
    pub stock: String,
    pub brand_product: String,
    pub vat_status: String,
    pub commodity_code: String,
    pub country_of_origin: String,
}

impl Row {
    /// Every header the loader must find, `Image` included once.
    pub fn required_headers() -> impl Iterator<Item = &'static str> {
        LEADING_COLUMNS
            .into_iter()
            .chain(std::iter::once(IMAGE))
            .chain(TRAILING_COLUMNS)
    }

    /// Display headers for a file with `images` image columns.
    pub fn display_headers(images: usize) -> Vec<String> {
        LEADING_COLUMNS
            .iter()
            .map(|h| h.to_string())
            .chain((1..=images).map(|i| format!("Image_{i}")))
            .chain(TRAILING_COLUMNS.iter().map(|h| h.to_string()))
            .collect()
    }

    /// Cell values in the fixed display order.
    pub fn display_values(&self) -> Vec<&str> {
        let mut values = vec![
            self.code.as_str(),
            self.master_product_name.as_str(),
            self.variant_name.as_str(),
            self.description.as_str(),
        ];
        values.extend(self.images.iter().map(String::as_str));
        values.extend([
            self.manufacturer.as_str(),
            self.category.as_str(),
            self.barcode.as_str(),
            self.colour.as_str(),
            self.size_1.as_str(),
            self.size_2.as_str(),
            self.rrp.as_str(),
            self.stock.as_str(),
            self.brand_product.as_str(),
            self.vat_status.as_str(),
            self.commodity_code.as_str(),
            self.country_of_origin.as_str(),
        ]);
        values
    }

    /// Content of the first image column, trimmed, if not blank.
    pub fn first_image_column(&self) -> Option<&str> {
        self.images.first().and_then(|i| non_blank(i))
    }

    /// First non-blank image path in any image column.
    pub fn first_image(&self) -> Option<&str> {
        self.images.iter().find_map(|i| non_blank(i))
    }

    /// Case-insensitive substring match against every cell.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.display_values()
            .into_iter()
            .any(|cell| cell.to_lowercase().contains(&query))
    }
}
