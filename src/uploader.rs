use crate::category::{CategoryError, CategoryResolver};
use crate::ledger::UploadLedger;
use crate::markup;
use crate::woocommerce::{ApiError, WooCommerceApi};
use catalog_types::product::{CategoryRef, ImageRef};
use catalog_types::{non_blank, CategoryId, CreatedProduct, NewProduct, ProductType, Row};
use derive_more::{Display, Error};
use url::Url;

const MEDIA_DIR: &str = "media/";

#[derive(Debug, Display, Error)]
pub enum UploadError {
    #[display("Failed to get or create category {category:?}: {source}")]
    Category {
        category: String,
        source: CategoryError,
    },
    #[display("Invalid image path: {_0}")]
    Image(url::ParseError),
    #[display("{_0}")]
    Api(ApiError),
}

#[derive(Debug)]
pub enum UploadOutcome {
    /// `None` when the store's response could not be read.
    Uploaded(Option<CreatedProduct>),
    /// Created remotely, but the ledger file could not be written.
    Unrecorded {
        created: Option<CreatedProduct>,
        error: std::io::Error,
    },
    /// The row has no image at all.
    Skipped,
}

fn is_absolute(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Store URL of a media-relative image path. Every path segment is percent-encoded.
pub fn image_url(site_root: &Url, path: &str) -> Result<Url, url::ParseError> {
    let path = path.trim().replace('\\', "/");
    if is_absolute(&path) {
        return Url::parse(&path);
    }
    let path = path.trim_start_matches('/');
    let relative = path.strip_prefix(MEDIA_DIR).unwrap_or(path);
    let mut url = site_root.join(MEDIA_DIR)?;
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(relative.split('/').filter(|s| !s.is_empty()));
    Ok(url)
}

/// Master product name followed by each non-blank size and colour in parentheses.
pub fn compose_name(row: &Row) -> String {
    let mut name = row.master_product_name.trim().to_string();
    for attribute in [&row.size_1, &row.size_2, &row.colour] {
        if let Some(value) = non_blank(attribute) {
            name.push_str(&format!(" ({value})"));
        }
    }
    name
}

pub fn build_product(row: &Row, image: Url, category: CategoryId) -> NewProduct {
    let name = compose_name(row);
    NewProduct {
        short_description: name.clone(),
        name,
        product_type: ProductType::Simple,
        regular_price: row.rrp.trim().to_string(),
        description: markup::to_html(&row.description),
        images: vec![ImageRef {
            src: image.to_string(),
        }],
        sku: row.code.trim().to_string(),
        categories: vec![CategoryRef { id: category }],
    }
}

/// Sends one row to the store and records it in the ledger on success.
///
/// Nothing is sent when the category cannot be resolved.
pub async fn upload_row(
    api: &dyn WooCommerceApi,
    site_root: &Url,
    categories: &mut CategoryResolver,
    ledger: &mut UploadLedger,
    row: &Row,
) -> Result<UploadOutcome, UploadError> {
    let Some(image) = row.first_image() else {
        return Ok(UploadOutcome::Skipped);
    };
    let image = image_url(site_root, image).map_err(UploadError::Image)?;
    let category = match categories.resolve(api, &row.category).await {
        Ok(id) => id,
        Err(source) => {
            log::error!(
                "Failed to get or create category {} for product {}.",
                row.category,
                row.code
            );
            return Err(UploadError::Category {
                category: row.category.clone(),
                source,
            });
        }
    };
    let product = build_product(row, image, category);
    match api.create_product(&product).await {
        Ok(created) => {
            log::info!("Successfully uploaded simple product {}.", product.sku);
            match ledger.mark_uploaded(&product.sku) {
                Ok(_) => Ok(UploadOutcome::Uploaded(created)),
                Err(error) => {
                    log::error!(
                        "Product {} uploaded but not recorded in {:?}: {error}",
                        product.sku,
                        ledger.path()
                    );
                    Ok(UploadOutcome::Unrecorded { created, error })
                }
            }
        }
        Err(err) => {
            let detail = match &err {
                ApiError::Status { body, .. } => body.clone(),
                other => other.to_string(),
            };
            log::error!("Failed to upload product {}. Error: {detail}", product.sku);
            Err(UploadError::Api(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::woocommerce::fake::{serve, FakeStore};
    use crate::woocommerce::WooCommerceClient;
    use std::time::Duration;

    fn site() -> Url {
        Url::parse("https://shop.test/").unwrap()
    }

    fn row(code: &str) -> Row {
        Row {
            code: code.to_string(),
            master_product_name: "Jacket".to_string(),
            description: "**Warm** and\n* Waterproof\n* Light".to_string(),
            images: vec!["media/catalog/jkt.jpg".to_string(), "".to_string()],
            category: "Outdoor, Jackets".to_string(),
            colour: "Red".to_string(),
            size_1: "M".to_string(),
            size_2: "".to_string(),
            rrp: " 49.99 ".to_string(),
            ..Default::default()
        }
    }

    fn ledger(dir: &tempfile::TempDir) -> UploadLedger {
        UploadLedger::open(dir.path().join("uploaded.already")).unwrap()
    }

    #[test]
    fn composes_display_name() {
        assert_eq!(compose_name(&row("A")), "Jacket (M) (Red)");
        let r = Row {
            master_product_name: "Boot".to_string(),
            size_1: " 9 ".to_string(),
            size_2: "Wide".to_string(),
            colour: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(compose_name(&r), "Boot (9) (Wide)");
    }

    #[test]
    fn rewrites_media_paths() {
        let site = site();
        assert_eq!(
            image_url(&site, "media/catalog/a.jpg").unwrap().as_str(),
            "https://shop.test/media/catalog/a.jpg"
        );
        assert_eq!(
            image_url(&site, " /media/catalog/a.jpg").unwrap().as_str(),
            "https://shop.test/media/catalog/a.jpg"
        );
        assert_eq!(
            image_url(&site, "catalog\\a b.jpg").unwrap().as_str(),
            "https://shop.test/media/catalog/a%20b.jpg"
        );
        let nested = Url::parse("https://shop.test/store/").unwrap();
        assert_eq!(
            image_url(&nested, "a.jpg").unwrap().as_str(),
            "https://shop.test/store/media/a.jpg"
        );
    }

    #[test]
    fn absolute_image_urls_pass_through() {
        assert_eq!(
            image_url(&site(), "https://cdn.test/a.jpg").unwrap().as_str(),
            "https://cdn.test/a.jpg"
        );
    }

    #[test]
    fn special_characters_stay_inside_the_path() {
        let site = site();
        assert_eq!(
            image_url(&site, "C:\\media\\a.jpg").unwrap().as_str(),
            "https://shop.test/media/C:/media/a.jpg"
        );
        assert_eq!(
            image_url(&site, "media/a#1?.jpg").unwrap().as_str(),
            "https://shop.test/media/a%231%3F.jpg"
        );
        assert_eq!(
            image_url(&site, "catalog//a.jpg").unwrap().as_str(),
            "https://shop.test/media/catalog/a.jpg"
        );
    }

    #[test]
    fn builds_payload() {
        let image = image_url(&site(), "media/catalog/jkt.jpg").unwrap();
        let p = build_product(&row("JKT-01"), image, CategoryId(7));
        assert_eq!(p.name, "Jacket (M) (Red)");
        assert_eq!(p.short_description, p.name);
        assert_eq!(p.product_type, ProductType::Simple);
        assert_eq!(p.regular_price, "49.99");
        assert_eq!(
            p.description,
            "<strong>Warm</strong> and\n<ul>\n<li>Waterproof</li>\n<li>Light</li>\n</ul>"
        );
        assert_eq!(p.images[0].src, "https://shop.test/media/catalog/jkt.jpg");
        assert_eq!(p.sku, "JKT-01");
        assert_eq!(p.categories[0].id, CategoryId(7));
    }

    #[tokio::test]
    async fn uploads_and_records_code() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::with_categories(&[("Outdoor / Jackets", 3)]);
        let mut categories = CategoryResolver::load(&store, 100).await;
        let mut ledger = ledger(&dir);
        let outcome = upload_row(&store, &site(), &mut categories, &mut ledger, &row("JKT-01"))
            .await
            .unwrap();
        assert!(matches!(outcome, UploadOutcome::Uploaded(_)));
        assert!(ledger.is_uploaded("JKT-01"));
        let state = store.lock();
        assert_eq!(state.products.len(), 1);
        assert_eq!(state.products[0].categories[0].id, CategoryId(3));
    }

    #[tokio::test]
    async fn row_without_images_is_skipped_silently() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::default();
        let mut categories = CategoryResolver::new();
        let mut ledger = ledger(&dir);
        let mut r = row("A1");
        r.images = vec![" ".to_string(), "".to_string()];
        let outcome = upload_row(&store, &site(), &mut categories, &mut ledger, &r)
            .await
            .unwrap();
        assert!(matches!(outcome, UploadOutcome::Skipped));
        assert_eq!(store.lock().category_creates, 0);
        assert!(store.lock().products.is_empty());
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn category_failure_aborts_before_product_creation() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::default();
        store
            .lock()
            .failing_categories
            .insert("Outdoor / Jackets".to_string());
        let mut categories = CategoryResolver::new();
        let mut ledger = ledger(&dir);
        let err = upload_row(&store, &site(), &mut categories, &mut ledger, &row("JKT-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Category { .. }));
        assert!(store.lock().products.is_empty());
        assert!(!ledger.is_uploaded("JKT-01"));
    }

    #[tokio::test]
    async fn unreadable_success_body_still_records_code() {
        let dir = tempfile::tempdir().unwrap();
        let (site, server) = serve(vec![
            (201, r#"{"id":9,"name":"Outdoor / Jackets"}"#),
            (
                201,
                "<br />\n<b>Deprecated</b>: old call\n<p>no json here</p>",
            ),
        ]);
        let client = WooCommerceClient::new(
            &site,
            "ck".to_string(),
            "cs".to_string(),
            Duration::from_secs(15),
        )
        .unwrap();
        let mut categories = CategoryResolver::new();
        let mut ledger = ledger(&dir);
        let outcome = upload_row(&client, &site, &mut categories, &mut ledger, &row("JKT-01"))
            .await
            .unwrap();
        server.join().unwrap();
        assert!(matches!(outcome, UploadOutcome::Uploaded(None)));
        assert!(ledger.is_uploaded("JKT-01"));
        assert_eq!(std::fs::read_to_string(ledger.path()).unwrap(), "JKT-01\n");
    }

    #[tokio::test]
    async fn ledger_write_failure_is_not_a_retryable_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::default();
        let mut categories = CategoryResolver::new();
        let mut ledger = UploadLedger::open_unwritable(dir.path().join("uploaded.already")).unwrap();
        let outcome = upload_row(&store, &site(), &mut categories, &mut ledger, &row("JKT-01"))
            .await
            .unwrap();
        assert!(matches!(outcome, UploadOutcome::Unrecorded { .. }));
        assert!(ledger.is_uploaded("JKT-01"));
        assert_eq!(store.lock().products.len(), 1);
    }

    #[tokio::test]
    async fn rejected_product_leaves_ledger_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::default();
        store.lock().failing_skus.insert("JKT-01".to_string());
        let mut categories = CategoryResolver::new();
        let mut ledger = ledger(&dir);
        let err = upload_row(&store, &site(), &mut categories, &mut ledger, &row("JKT-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Api(_)));
        assert!(!ledger.is_uploaded("JKT-01"));
        assert_eq!(
            std::fs::read_to_string(ledger.path()).unwrap(),
            ""
        );
    }
}
