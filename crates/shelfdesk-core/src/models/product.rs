use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Product {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub origin_price: f64,
    #[serde(default)]
    pub price: f64,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_enabled: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
    #[serde(rename = "imagesUrl", default)]
    pub images_url: Vec<String>,
}

impl Product {
    pub fn enabled_display(&self) -> &'static str {
        if self.is_enabled {
            "Enabled"
        } else {
            "Disabled"
        }
    }
}

/// Format a price for table display, dropping a zero fractional part.
pub fn format_price(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

/// `is_enabled` arrives as `0`/`1` from the admin API but as a bool from
/// some older records.
fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(n)) => n != 0,
        None => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_product() {
        let json = r#"{"category":"Fruit","content":"Fresh","description":"Red apples","id":"-Nx1","imageUrl":"https://img/a.png","imagesUrl":["https://img/b.png"],"is_enabled":1,"origin_price":120,"price":99,"title":"Apple","unit":"box","num":3}"#;
        let product: Product = serde_json::from_str(json).expect("Failed to parse product test JSON");
        assert_eq!(product.id, "-Nx1");
        assert_eq!(product.title, "Apple");
        assert_eq!(product.origin_price, 120.0);
        assert!(product.is_enabled);
        assert_eq!(product.images_url, vec!["https://img/b.png".to_string()]);
    }

    #[test]
    fn test_is_enabled_accepts_bool_zero_and_null() {
        let p: Product = serde_json::from_str(r#"{"is_enabled":true}"#).unwrap();
        assert!(p.is_enabled);
        let p: Product = serde_json::from_str(r#"{"is_enabled":0}"#).unwrap();
        assert!(!p.is_enabled);
        let p: Product = serde_json::from_str(r#"{"is_enabled":null}"#).unwrap();
        assert!(!p.is_enabled);
        let p: Product = serde_json::from_str(r#"{}"#).unwrap();
        assert!(!p.is_enabled);
        assert_eq!(p.enabled_display(), "Disabled");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(100.0), "100");
        assert_eq!(format_price(99.5), "99.50");
        assert_eq!(format_price(0.0), "0");
    }
}
