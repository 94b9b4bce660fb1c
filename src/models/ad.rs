use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use num_traits::Signed;
use serde::{Deserialize, Serialize};

use crate::error::FieldErrors;
use crate::utils::datetime::{parse_datetime, INVALID_DATETIME};

pub const TITLE_MAX_CHARS: usize = 200;

/// Matches the `NUMERIC(12, 2)` price column.
pub const PRICE_MAX_DIGITS: i64 = 12;
pub const PRICE_DECIMAL_PLACES: i64 = 2;

const REQUIRED: &str = "This field is required.";

/// Stored ad row.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Ad {
    pub id: i32,
    pub title: String,
    pub price: BigDecimal,
    pub date: DateTime<Utc>,
    pub tag_id: Vec<i32>,
    pub views: i32,
}

/// Listing shape: id, title and price only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdCut {
    pub id: i32,
    pub title: String,
    pub price: BigDecimal,
}

impl From<Ad> for AdCut {
    fn from(ad: Ad) -> Self {
        AdCut {
            id: ad.id,
            title: ad.title,
            price: ad.price,
        }
    }
}

/// Every persisted field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdDetail {
    pub id: i32,
    pub title: String,
    pub price: BigDecimal,
    pub date: DateTime<Utc>,
    pub tag_id: Vec<i32>,
    pub views: i32,
}

impl From<Ad> for AdDetail {
    fn from(ad: Ad) -> Self {
        AdDetail {
            id: ad.id,
            title: ad.title,
            price: ad.price,
            date: ad.date,
            tag_id: ad.tag_id,
            views: ad.views,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAd {
    pub title: String,
    pub price: BigDecimal,
    pub date: DateTime<Utc>,
    pub tag_id: Vec<i32>,
}

/// Fields to overwrite on an existing ad; `None` leaves the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdChanges {
    pub title: Option<String>,
    pub price: Option<BigDecimal>,
    pub date: Option<DateTime<Utc>>,
    pub tag_id: Option<Vec<i32>>,
}

impl AdChanges {
    pub fn apply(self, ad: &mut Ad) {
        if let Some(title) = self.title {
            ad.title = title;
        }
        if let Some(price) = self.price {
            ad.price = price;
        }
        if let Some(date) = self.date {
            ad.date = date;
        }
        if let Some(tag_id) = self.tag_id {
            ad.tag_id = tag_id;
        }
    }
}

impl From<NewAd> for AdChanges {
    fn from(ad: NewAd) -> Self {
        AdChanges {
            title: Some(ad.title),
            price: Some(ad.price),
            date: Some(ad.date),
            tag_id: Some(ad.tag_id),
        }
    }
}

/// Request body for create and update. `views` and `id` are not accepted
/// from clients, so unknown keys are dropped.
#[derive(Debug, Default, Deserialize)]
pub struct AdPayload {
    pub title: Option<String>,
    /// Kept as raw JSON so numbers are read from their decimal text, not
    /// through `f64`.
    pub price: Option<serde_json::Value>,
    pub date: Option<String>,
    pub tag_id: Option<Vec<i32>>,
}

/// Reads a price from a JSON number or string and checks it fits the column.
fn parse_price(raw: &serde_json::Value) -> Result<BigDecimal, String> {
    let price = match raw {
        serde_json::Value::Number(number) => BigDecimal::from_str(&number.to_string()).ok(),
        serde_json::Value::String(text) => BigDecimal::from_str(text.trim()).ok(),
        _ => None,
    }
    .ok_or_else(|| "A valid number is required.".to_string())?;

    if price.is_negative() {
        return Err("Ensure this value is greater than or equal to 0.".to_string());
    }

    let (digits, exponent) = price.normalized().as_bigint_and_exponent();
    let digit_count = digits.magnitude().to_string().len() as i64;
    let integer_digits = (digit_count - exponent).max(0);

    if exponent > PRICE_DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {PRICE_DECIMAL_PLACES} decimal places."
        ));
    }
    if integer_digits > PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {} digits before the decimal point.",
            PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES
        ));
    }

    Ok(price)
}

impl AdPayload {
    /// Full validation, used by create and PUT.
    pub fn into_new_ad(self) -> Result<NewAd, FieldErrors> {
        let (changes, mut errors) = self.check();

        match (changes.title, changes.price, changes.date) {
            (Some(title), Some(price), Some(date)) if errors.is_empty() => Ok(NewAd {
                title,
                price,
                date,
                tag_id: changes.tag_id.unwrap_or_default(),
            }),
            (title, price, date) => {
                for (field, missing) in [
                    ("title", title.is_none()),
                    ("price", price.is_none()),
                    ("date", date.is_none()),
                ] {
                    if missing {
                        errors
                            .entry(field.to_string())
                            .or_insert_with(|| vec![REQUIRED.to_string()]);
                    }
                }
                Err(errors)
            }
        }
    }

    /// Partial validation, used by PATCH.
    pub fn into_changes(self) -> Result<AdChanges, FieldErrors> {
        let (changes, errors) = self.check();
        if errors.is_empty() {
            Ok(changes)
        } else {
            Err(errors)
        }
    }

    fn check(self) -> (AdChanges, FieldErrors) {
        let mut errors = FieldErrors::new();
        let mut reject = |field: &str, message: String| {
            errors.entry(field.to_string()).or_default().push(message);
        };

        let title = self.title.and_then(|title| {
            let title = title.trim().to_string();
            if title.is_empty() {
                reject("title", "This field may not be blank.".to_string());
                None
            } else if title.chars().count() > TITLE_MAX_CHARS {
                reject(
                    "title",
                    format!("Ensure this field has no more than {TITLE_MAX_CHARS} characters."),
                );
                None
            } else {
                Some(title)
            }
        });

        let price = self.price.and_then(|raw| match parse_price(&raw) {
            Ok(price) => Some(price),
            Err(message) => {
                reject("price", message);
                None
            }
        });

        let date = self.date.and_then(|raw| match parse_datetime(&raw) {
            Some(date) => Some(date),
            None => {
                reject("date", INVALID_DATETIME.to_string());
                None
            }
        });

        let tag_id = self.tag_id.map(|mut ids| {
            ids.sort_unstable();
            ids.dedup();
            ids
        });

        (
            AdChanges {
                title,
                price,
                date,
                tag_id,
            },
            errors,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn payload(value: serde_json::Value) -> AdPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_full_payload_is_accepted() {
        let ad = payload(serde_json::json!({
            "title": "  Bike ",
            "price": 100,
            "date": "2024-01-01",
            "tag_id": [3, 1, 3],
            "views": 99
        }))
        .into_new_ad()
        .unwrap();

        assert_eq!(ad.title, "Bike");
        assert_eq!(ad.price, BigDecimal::from(100));
        assert_eq!(ad.date, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(ad.tag_id, vec![1, 3]);
    }

    #[test]
    fn test_price_accepts_decimal_string() {
        let ad = payload(serde_json::json!({
            "title": "Lamp",
            "price": "19.99",
            "date": "2024-01-01T10:00:00Z"
        }))
        .into_new_ad()
        .unwrap();

        assert_eq!(ad.price, BigDecimal::from_str("19.99").unwrap());
        assert!(ad.tag_id.is_empty());
    }

    #[test]
    fn test_json_number_price_keeps_its_decimal_text() {
        for (raw, expected) in [
            (serde_json::json!(0.1), "0.1"),
            (serde_json::json!(19.99), "19.99"),
            (serde_json::json!(100), "100"),
            (serde_json::json!("9999999999.99"), "9999999999.99"),
        ] {
            let price = parse_price(&raw).unwrap();
            assert_eq!(price, BigDecimal::from_str(expected).unwrap());
            assert_eq!(price.to_string(), expected);
        }
    }

    #[test]
    fn test_price_must_fit_the_column() {
        let too_precise = parse_price(&serde_json::json!("1.005")).unwrap_err();
        assert_eq!(too_precise, "Ensure that there are no more than 2 decimal places.");

        let too_large = parse_price(&serde_json::json!("123456789012345.678")).unwrap_err();
        assert!(too_large.contains("decimal places") || too_large.contains("before the decimal"));

        let too_large = parse_price(&serde_json::json!(12345678901u64)).unwrap_err();
        assert_eq!(
            too_large,
            "Ensure that there are no more than 10 digits before the decimal point."
        );

        // trailing zeros do not count as decimal places
        assert!(parse_price(&serde_json::json!("1.500")).is_ok());
        assert!(parse_price(&serde_json::json!("0")).is_ok());

        assert_eq!(
            parse_price(&serde_json::json!(true)).unwrap_err(),
            "A valid number is required."
        );
        assert_eq!(
            parse_price(&serde_json::json!("cheap")).unwrap_err(),
            "A valid number is required."
        );

        let errors = payload(serde_json::json!({
            "title": "Bike",
            "price": "1.005",
            "date": "2024-01-01"
        }))
        .into_new_ad()
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_key("price"));
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let errors = payload(serde_json::json!({ "title": "Bike" }))
            .into_new_ad()
            .unwrap_err();

        assert!(!errors.contains_key("title"));
        assert_eq!(errors["price"], vec![REQUIRED.to_string()]);
        assert_eq!(errors["date"], vec![REQUIRED.to_string()]);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let long_title = "x".repeat(TITLE_MAX_CHARS + 1);
        let errors = payload(serde_json::json!({
            "title": long_title,
            "price": -1,
            "date": "soon"
        }))
        .into_new_ad()
        .unwrap_err();

        assert_eq!(errors.len(), 3);
        assert_eq!(errors["date"], vec![INVALID_DATETIME.to_string()]);

        let errors = payload(serde_json::json!({ "title": "   " }))
            .into_changes()
            .unwrap_err();
        assert_eq!(errors["title"], vec!["This field may not be blank.".to_string()]);
    }

    #[test]
    fn test_partial_payload_only_touches_given_fields() {
        let changes = payload(serde_json::json!({ "price": 5 }))
            .into_changes()
            .unwrap();

        let mut ad = Ad {
            id: 1,
            title: "Chair".to_string(),
            price: BigDecimal::from(10),
            date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            tag_id: vec![2],
            views: 4,
        };
        changes.apply(&mut ad);

        assert_eq!(ad.title, "Chair");
        assert_eq!(ad.price, BigDecimal::from(5));
        assert_eq!(ad.tag_id, vec![2]);
        assert_eq!(ad.views, 4);
    }

    #[test]
    fn test_projections() {
        let ad = Ad {
            id: 7,
            title: "Bike".to_string(),
            price: BigDecimal::from(100),
            date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            tag_id: vec![1],
            views: 2,
        };

        let cut = serde_json::to_value(AdCut::from(ad.clone())).unwrap();
        let keys: Vec<&String> = cut.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(cut["id"], 7);
        assert_eq!(cut["title"], "Bike");

        let detail = serde_json::to_value(AdDetail::from(ad)).unwrap();
        assert_eq!(detail.as_object().unwrap().len(), 6);
        assert_eq!(detail["tag_id"], serde_json::json!([1]));
        assert_eq!(detail["views"], 2);
    }
}
