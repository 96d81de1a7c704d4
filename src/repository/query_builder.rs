//! Translates raw query-string pairs into a MongoDB filter, sort, projection and page.
//!
//! Keys are checked against an explicit field schema, so a request can only filter,
//! sort or select fields the collection declares. Filter keys may carry a comparison
//! operator in brackets (`price[gte]=10`). The reserved keys `sort`, `fields`, `page`
//! and `limit` drive the other steps and never reach the filter.
//!
//! ```ignore
//! let query = QueryBuilder::new(MOVIE_FIELDS, params)
//!     .filter()?
//!     .sort()?
//!     .select_fields()?
//!     .paginate()
//!     .build();
//! ```

use bson::{doc, Bson, Document};
use chrono::{DateTime, NaiveDate, Utc};
use mongodb::options::FindOptions;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

const RESERVED_KEYS: [&str; 4] = ["sort", "fields", "page", "limit"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Date,
    /// Array of strings; equality matches any element.
    StringList,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub sortable: bool,
    pub selectable: bool,
}

impl FieldSpec {
    const fn new(name: &'static str, field_type: FieldType, sortable: bool) -> Self {
        FieldSpec { name, field_type, sortable, selectable: true }
    }
}

/// Public movie fields. `createdAt` is internal and deliberately absent.
pub const MOVIE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", FieldType::String, true),
    FieldSpec::new("description", FieldType::String, false),
    FieldSpec::new("duration", FieldType::Number, true),
    FieldSpec::new("ratings", FieldType::Number, true),
    FieldSpec::new("totalRating", FieldType::Number, true),
    FieldSpec::new("releaseYear", FieldType::Number, true),
    FieldSpec::new("releaseDate", FieldType::Date, true),
    FieldSpec::new("genres", FieldType::StringList, false),
    FieldSpec::new("directors", FieldType::StringList, false),
    FieldSpec::new("coverImage", FieldType::String, false),
    FieldSpec::new("actors", FieldType::StringList, false),
    FieldSpec::new("price", FieldType::Number, true),
    FieldSpec::new("createdBy", FieldType::String, true),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Gte,
    Gt,
    Lte,
    Lt,
}

impl Operator {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "eq" => Some(Operator::Eq),
            "gte" => Some(Operator::Gte),
            "gt" => Some(Operator::Gt),
            "lte" => Some(Operator::Lte),
            "lt" => Some(Operator::Lt),
            _ => None,
        }
    }

    pub fn mongo_operator(&self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Gte => "$gte",
            Operator::Gt => "$gt",
            Operator::Lte => "$lte",
            Operator::Lt => "$lt",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Unknown field '{0}'")]
    UnknownField(String),
    #[error("Unknown operator '{operator}' on field '{field}'")]
    UnknownOperator { field: String, operator: String },
    #[error("Operator '{operator}' is not supported on field '{field}'")]
    UnsupportedOperator { field: String, operator: String },
    #[error("Invalid value '{value}' for field '{field}': expected {expected}")]
    InvalidValue { field: String, value: String, expected: &'static str },
    #[error("Field '{0}' cannot be used for sorting")]
    NotSortable(String),
    #[error("Conflicting conditions for field '{0}'")]
    ConflictingFilter(String),
    #[error("Cannot mix included and excluded fields")]
    MixedProjection,
}

/// The executable form of a query; run it with `find(filter, find_options())`.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub filter: Document,
    pub sort: Document,
    pub projection: Document,
    pub page: u64,
    pub limit: u64,
    pub skip: u64,
}

impl BuiltQuery {
    pub fn find_options(&self) -> FindOptions {
        let mut options = FindOptions::default();
        options.sort = Some(self.sort.clone());
        options.projection = Some(self.projection.clone());
        options.skip = Some(self.skip);
        options.limit = i64::try_from(self.limit).ok();
        options
    }
}

pub struct QueryBuilder<'s> {
    schema: &'s [FieldSpec],
    params: Vec<(String, String)>,
    filter: Document,
    sort: Option<Document>,
    projection: Option<Document>,
    page: u64,
    limit: u64,
}

impl<'s> QueryBuilder<'s> {
    pub fn new(schema: &'s [FieldSpec], params: Vec<(String, String)>) -> Self {
        QueryBuilder {
            schema,
            params,
            filter: Document::new(),
            sort: None,
            projection: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Last value wins when a reserved key is repeated.
    fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn field(&self, name: &str) -> Result<&'s FieldSpec, QueryError> {
        self.schema
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| QueryError::UnknownField(name.to_string()))
    }

    pub fn filter(mut self) -> Result<Self, QueryError> {
        let mut filter = Document::new();

        for (key, raw_value) in self.params.iter() {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }

            let (name, operator) = parse_key(key)?;
            let spec = self.field(name)?;
            if spec.field_type == FieldType::StringList && operator != Operator::Eq {
                return Err(QueryError::UnsupportedOperator {
                    field: name.to_string(),
                    operator: operator.mongo_operator().trim_start_matches('$').to_string(),
                });
            }
            let value = coerce_value(spec, raw_value)?;

            let mongo_operator = operator.mongo_operator();
            match filter.get_mut(name) {
                None if operator == Operator::Eq => {
                    filter.insert(name, value);
                }
                None => {
                    let mut conditions = Document::new();
                    conditions.insert(mongo_operator, value);
                    filter.insert(name, conditions);
                }
                Some(Bson::Document(conditions))
                    if operator != Operator::Eq && !conditions.contains_key(mongo_operator) =>
                {
                    conditions.insert(mongo_operator, value);
                }
                Some(_) => return Err(QueryError::ConflictingFilter(name.to_string())),
            }
        }

        self.filter = filter;
        Ok(self)
    }

    pub fn sort(mut self) -> Result<Self, QueryError> {
        let mut sort = Document::new();
        if let Some(raw) = self.param("sort") {
            for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                let (name, direction) = match token.strip_prefix('-') {
                    Some(name) => (name, -1),
                    None => (token, 1),
                };
                let spec = self.field(name)?;
                if !spec.sortable {
                    return Err(QueryError::NotSortable(name.to_string()));
                }
                sort.insert(name, direction);
            }
        }

        self.sort = if sort.is_empty() { None } else { Some(sort) };
        Ok(self)
    }

    pub fn select_fields(mut self) -> Result<Self, QueryError> {
        let mut projection = Document::new();
        let mut excluding: Option<bool> = None;

        if let Some(raw) = self.param("fields") {
            for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                let (name, exclude) = match token.strip_prefix('-') {
                    Some(name) => (name, true),
                    None => (token, false),
                };
                if *excluding.get_or_insert(exclude) != exclude {
                    return Err(QueryError::MixedProjection);
                }
                self.field(name)?;
                projection.insert(name, if exclude { 0 } else { 1 });
            }
        }

        self.projection = match excluding {
            None => None,
            Some(true) => {
                projection.insert("createdAt", 0);
                Some(projection)
            }
            Some(false) => Some(projection),
        };
        Ok(self)
    }

    /// Absent, non-numeric or non-positive values fall back to the defaults.
    pub fn paginate(mut self) -> Self {
        self.page = parse_positive(self.param("page")).unwrap_or(DEFAULT_PAGE);
        self.limit = parse_positive(self.param("limit")).unwrap_or(DEFAULT_LIMIT);
        self
    }

    /// `skip` and `limit` are capped at `i64::MAX`, the largest value the server accepts.
    pub fn build(self) -> BuiltQuery {
        BuiltQuery {
            filter: self.filter,
            sort: self.sort.unwrap_or_else(default_sort),
            projection: self.projection.unwrap_or_else(default_projection),
            page: self.page,
            limit: self.limit.min(MAX_WINDOW),
            skip: (self.page - 1).saturating_mul(self.limit).min(MAX_WINDOW),
        }
    }
}

const MAX_WINDOW: u64 = i64::MAX as u64;

pub fn default_sort() -> Document {
    doc! { "name": 1 }
}

pub fn default_projection() -> Document {
    doc! { "createdAt": 0 }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .map(|v| v as u64)
}

/// `price[gte]` → `("price", Gte)`, `price` → `("price", Eq)`.
fn parse_key(key: &str) -> Result<(&str, Operator), QueryError> {
    match key.split_once('[') {
        Some((name, rest)) => {
            let token = rest.strip_suffix(']').unwrap_or(rest);
            let operator = Operator::parse(token).ok_or_else(|| QueryError::UnknownOperator {
                field: name.to_string(),
                operator: token.to_string(),
            })?;
            Ok((name, operator))
        }
        None => Ok((key, Operator::Eq)),
    }
}

fn coerce_value(spec: &FieldSpec, raw: &str) -> Result<Bson, QueryError> {
    let invalid = |expected: &'static str| QueryError::InvalidValue {
        field: spec.name.to_string(),
        value: raw.to_string(),
        expected,
    };

    match spec.field_type {
        FieldType::String | FieldType::StringList => Ok(Bson::String(raw.to_string())),
        FieldType::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Bson::Double)
            .ok_or_else(|| invalid("a number")),
        FieldType::Date => parse_date(raw.trim())
            .map(|date| Bson::DateTime(bson::DateTime::from_chrono(date)))
            .ok_or_else(|| invalid("a date (YYYY-MM-DD or RFC 3339)")),
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
