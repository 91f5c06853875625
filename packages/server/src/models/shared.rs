use serde::{Deserialize, Deserializer};

use crate::error::AppError;

pub const INVALID_PAGE_MESSAGE: &str = "Invalid page.";

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

pub const INVALID_INTEGER_MESSAGE: &str = "A valid integer is required.";

/// Integer written either as a JSON number or as a numeric string, the way
/// form fields arrive.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum LenientInt {
    Number(i64),
    Text(String),
}

impl LenientInt {
    pub fn to_i32(&self, field: &'static str) -> Result<i32, AppError> {
        match self {
            LenientInt::Number(n) => i32::try_from(*n)
                .map_err(|_| AppError::field(field, INVALID_INTEGER_MESSAGE)),
            LenientInt::Text(text) => parse_int(field, text),
        }
    }
}

/// Parse a textual integer, surrounding whitespace allowed.
pub fn parse_int(field: &'static str, text: &str) -> Result<i32, AppError> {
    text.trim()
        .parse::<i32>()
        .map_err(|_| AppError::field(field, INVALID_INTEGER_MESSAGE))
}

/// Validate a trimmed, required name of at most `max` characters.
pub fn validate_name(field: &'static str, value: &str, max: usize) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::field(field, "This field may not be blank."));
    }
    if value.chars().count() > max {
        return Err(AppError::field(
            field,
            format!("Ensure this field has no more than {max} characters."),
        ));
    }
    Ok(value.to_string())
}

/// Page-number pagination window for a list of `count` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub page_size: u64,
    pub count: u64,
}

impl PageWindow {
    /// Resolve the requested page. A missing page means the first one; an
    /// unparsable, zero, or out-of-range page is a 404. An empty collection
    /// still has a (single, empty) first page.
    pub fn resolve(raw_page: Option<&str>, page_size: u64, count: u64) -> Result<Self, AppError> {
        let page_size = page_size.max(1);
        let page = match raw_page.map(str::trim) {
            None | Some("") => 1,
            Some("last") => Self::last_page(count, page_size),
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| AppError::NotFound(INVALID_PAGE_MESSAGE.into()))?,
        };

        if page == 0 || page > Self::last_page(count, page_size) {
            return Err(AppError::NotFound(INVALID_PAGE_MESSAGE.into()));
        }

        Ok(Self {
            page,
            page_size,
            count,
        })
    }

    fn last_page(count: u64, page_size: u64) -> u64 {
        count.div_ceil(page_size).max(1)
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.page_size
    }

    /// Link to the next page under `base`, if there is one.
    pub fn next_link(&self, base: &str) -> Option<String> {
        (self.page < Self::last_page(self.count, self.page_size))
            .then(|| format!("{base}?page={}", self.page + 1))
    }

    /// Link to the previous page under `base`. The first page is linked
    /// without a `page` parameter.
    pub fn previous_link(&self, base: &str) -> Option<String> {
        match self.page {
            1 => None,
            2 => Some(base.to_string()),
            p => Some(format!("{base}?page={}", p - 1)),
        }
    }
}
