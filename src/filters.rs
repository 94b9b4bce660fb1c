//! Search predicates built from query parameters.
//!
//! Each predicate is a plain value that can test an [`Ad`] in memory; the
//! Postgres store renders the same values into SQL.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use crate::error::FieldErrors;
use crate::models::Ad;
use crate::utils::datetime::{parse_datetime, INVALID_DATETIME};

/// Inclusive bounds on `price`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceRange {
    pub min: Option<BigDecimal>,
    pub max: Option<BigDecimal>,
}

impl PriceRange {
    pub fn matches(&self, ad: &Ad) -> bool {
        self.min.as_ref().map_or(true, |min| ad.price >= *min)
            && self.max.as_ref().map_or(true, |max| ad.price <= *max)
    }
}

/// Ads whose tag list shares at least one id with the set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagSet(pub Vec<i32>);

impl TagSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, ad: &Ad) -> bool {
        self.is_empty() || ad.tag_id.iter().any(|id| self.0.contains(id))
    }
}

/// Inclusive bounds on `date`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateRange {
    pub min: Option<DateTime<Utc>>,
    pub max: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn matches(&self, ad: &Ad) -> bool {
        self.min.map_or(true, |min| ad.date >= min) && self.max.map_or(true, |max| ad.date <= max)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdFilter {
    pub price: PriceRange,
    pub tags: TagSet,
    pub date: DateRange,
}

impl AdFilter {
    /// Builds a filter from raw query pairs. `tag_id` may repeat; other
    /// known keys keep their last value; unknown keys are ignored. Blank
    /// values count as absent.
    pub fn from_query(pairs: &[(String, String)]) -> Result<Self, FieldErrors> {
        let mut filter = AdFilter::default();
        let mut errors = FieldErrors::new();

        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            match key.as_str() {
                "min_price" => filter.price.min = parse_number(key, value, &mut errors),
                "max_price" => filter.price.max = parse_number(key, value, &mut errors),
                "created_min" => filter.date.min = parse_date(key, value, &mut errors),
                "created_max" => filter.date.max = parse_date(key, value, &mut errors),
                "tag_id" => match value.parse::<i32>() {
                    Ok(id) if !filter.tags.0.contains(&id) => filter.tags.0.push(id),
                    Ok(_) => {}
                    Err(_) => {
                        push_error(&mut errors, key, format!("\"{value}\" is not a valid tag id."))
                    }
                },
                _ => {}
            }
        }

        if errors.is_empty() {
            Ok(filter)
        } else {
            Err(errors)
        }
    }

    pub fn matches(&self, ad: &Ad) -> bool {
        self.price.matches(ad) && self.tags.matches(ad) && self.date.matches(ad)
    }
}

fn push_error(errors: &mut FieldErrors, key: &str, message: String) {
    errors.entry(key.to_string()).or_default().push(message);
}

fn parse_number(key: &str, value: &str, errors: &mut FieldErrors) -> Option<BigDecimal> {
    match BigDecimal::from_str(value) {
        Ok(number) => Some(number),
        Err(_) => {
            push_error(errors, key, "Enter a number.".to_string());
            None
        }
    }
}

fn parse_date(key: &str, value: &str, errors: &mut FieldErrors) -> Option<DateTime<Utc>> {
    let parsed = parse_datetime(value);
    if parsed.is_none() {
        push_error(errors, key, INVALID_DATETIME.to_string());
    }
    parsed
}
