use crate::category::CategoryId;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Simple,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub src: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRef {
    pub id: CategoryId,
}

/// Body of a product creation request.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub regular_price: String,
    pub description: String,
    pub short_description: String,
    pub images: Vec<ImageRef>,
    pub sku: String,
    pub categories: Vec<CategoryRef>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreatedProduct {
    pub id: u64,
    #[serde(default)]
    pub sku: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_woocommerce_shape() {
        let p = NewProduct {
            name: "Jacket (M)".to_string(),
            product_type: ProductType::Simple,
            regular_price: "49.99".to_string(),
            description: "<strong>Warm</strong>".to_string(),
            short_description: "Jacket (M)".to_string(),
            images: vec![ImageRef {
                src: "https://shop.test/media/a.jpg".to_string(),
            }],
            sku: "JKT-01".to_string(),
            categories: vec![CategoryRef { id: CategoryId(7) }],
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["type"], "simple");
        assert_eq!(v["categories"][0]["id"], 7);
        assert_eq!(v["images"][0]["src"], "https://shop.test/media/a.jpg");
        assert_eq!(v["sku"], "JKT-01");
    }
}
