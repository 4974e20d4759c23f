//! Filter selections and their translation into SQL predicates.
//!
//! RULE: filter values never reach SQL text. Every value is bound through a
//! named parameter whose name is prefixed by its filter category, so names
//! cannot collide across fragments.

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    types::{ParamValue, Params},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const BOOKING_STATUS: &str = "Booking_Status";
pub const VEHICLE_TYPE: &str = "Vehicle_Type";
pub const PAYMENT_METHOD: &str = "Payment_Method";
pub const DRIVER_RATINGS: &str = "Driver_Ratings";
pub const CUSTOMER_RATING: &str = "Customer_Rating";

/// Columns whose distinct values may be offered as dropdown choices.
pub const DROPDOWN_COLUMNS: &[&str] = &[BOOKING_STATUS, VEHICLE_TYPE, PAYMENT_METHOD];

pub const STATUS_OPTIONS: &[&str] = &[
    "Success",
    "Canceled by Driver",
    "Canceled by Customer",
    "Driver Not Found",
];

pub const VEHICLE_OPTIONS: &[&str] = &[
    "Auto", "Bike", "Mini", "Prime Sedan", "Prime SUV", "Prime Plus", "eBike",
];

pub const RATING_MIN: f64 = 0.0;
pub const RATING_MAX: f64 = 5.0;

/// Who cancelled a booking. Maps onto a Booking_Status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelSource {
    Customer,
    Driver,
}

impl CancelSource {
    pub const ALL: [CancelSource; 2] = [CancelSource::Customer, CancelSource::Driver];

    pub fn booking_status(&self) -> &'static str {
        match self {
            CancelSource::Customer => "Canceled by Customer",
            CancelSource::Driver   => "Canceled by Driver",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CancelSource::Customer => "Customer",
            CancelSource::Driver   => "Driver",
        }
    }
}

impl std::str::FromStr for CancelSource {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(CancelSource::Customer),
            "driver"   => Ok(CancelSource::Driver),
            other => Err(AnalyticsError::InvalidFilter(format!(
                "unknown cancellation source '{other}' (expected Customer or Driver)"
            ))),
        }
    }
}

/// Inclusive rating bounds on the 0.0–5.0 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingRange {
    pub min: f64,
    pub max: f64,
}

impl Default for RatingRange {
    fn default() -> Self {
        Self { min: RATING_MIN, max: RATING_MAX }
    }
}

impl RatingRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn validate(&self, label: &str) -> AnalyticsResult<()> {
        let in_scale = |v: f64| (RATING_MIN..=RATING_MAX).contains(&v);
        if !in_scale(self.min) || !in_scale(self.max) {
            return Err(AnalyticsError::InvalidFilter(format!(
                "{label} range ({}, {}) must lie within {RATING_MIN}..={RATING_MAX}",
                self.min, self.max
            )));
        }
        if self.min > self.max {
            return Err(AnalyticsError::InvalidFilter(format!(
                "{label} range minimum {} exceeds maximum {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingFilter {
    /// Drop rows where either rating is missing.
    #[serde(default = "default_exclude_blank")]
    pub exclude_blank: bool,
    #[serde(default)]
    pub driver: RatingRange,
    #[serde(default)]
    pub customer: RatingRange,
}

fn default_exclude_blank() -> bool { true }

impl Default for RatingFilter {
    fn default() -> Self {
        Self {
            exclude_blank: true,
            driver: RatingRange::default(),
            customer: RatingRange::default(),
        }
    }
}

/// Date range toggle. Only applied when both endpoints are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end:   Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start: Some(start), end: Some(end) }
    }

    fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.start?, self.end?))
    }
}

/// Everything the user picked in the filter panel. `None` for ratings or
/// dates means the toggle is off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    pub statuses:     Vec<String>,
    pub vehicles:     Vec<String>,
    pub payments:     Vec<String>,
    pub cancelled_by: Vec<CancelSource>,
    pub ratings:      Option<RatingFilter>,
    pub dates:        Option<DateRange>,
}

impl FilterSelection {
    /// Build one predicate per active filter category.
    pub fn translate(&self) -> AnalyticsResult<PredicateSet> {
        let mut set = PredicateSet::default();

        // Cancellation source also targets Booking_Status and wins.
        if !self.statuses.is_empty() && self.cancelled_by.is_empty() {
            set.push(membership(BOOKING_STATUS, "status", &self.statuses))?;
        }

        if !self.vehicles.is_empty() {
            set.push(membership(VEHICLE_TYPE, "veh", &self.vehicles))?;
        }

        if let Some((start, end)) = self.dates.as_ref().and_then(DateRange::bounds) {
            if start > end {
                return Err(AnalyticsError::InvalidFilter(format!(
                    "start date {start} is after end date {end}"
                )));
            }
            let mut params = Params::new();
            params.insert("start_date".into(), ParamValue::Text(start.format("%Y-%m-%d").to_string()));
            params.insert("end_date".into(), ParamValue::Text(end.format("%Y-%m-%d").to_string()));
            set.push(Predicate {
                sql: "DATE(`Date`) BETWEEN :start_date AND :end_date".into(),
                params,
            })?;
        }

        if !self.payments.is_empty() {
            set.push(membership(PAYMENT_METHOD, "pay", &self.payments))?;
        }

        if !self.cancelled_by.is_empty() {
            let statuses: Vec<&str> = self.cancelled_by.iter().map(CancelSource::booking_status).collect();
            set.push(membership(BOOKING_STATUS, "cancel", &statuses))?;
        }

        if let Some(ratings) = &self.ratings {
            set.push(rating_predicate(ratings)?)?;
        }

        Ok(set)
    }
}

/// A SQL condition plus the parameters it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predicate {
    pub sql:    String,
    pub params: Params,
}

/// Predicates for one request, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PredicateSet {
    predicates: Vec<Predicate>,
    params:     Params,
}

impl PredicateSet {
    /// Add a predicate, rejecting parameter names already bound.
    pub fn push(&mut self, predicate: Predicate) -> AnalyticsResult<()> {
        if let Some(dup) = predicate.params.keys().find(|k| self.params.contains_key(*k)) {
            return Err(AnalyticsError::DuplicateParam { name: dup.clone() });
        }
        self.params.extend(predicate.params.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.predicates.push(predicate);
        Ok(())
    }

    pub fn predicates(&self) -> &[Predicate] { &self.predicates }

    pub fn params(&self) -> &Params { &self.params }

    pub fn into_params(self) -> Params { self.params }

    pub fn is_empty(&self) -> bool { self.predicates.is_empty() }

    /// All predicates joined with AND. Empty when no filter is active.
    pub fn condition(&self) -> String {
        self.predicates
            .iter()
            .map(|p| p.sql.as_str())
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

/// `column IN (:prefix_0, :prefix_1, ...)`
fn membership<S: AsRef<str>>(column: &str, prefix: &str, values: &[S]) -> Predicate {
    let mut params = Params::new();
    let mut placeholders = Vec::with_capacity(values.len());
    for (i, value) in values.iter().enumerate() {
        let key = format!("{prefix}_{i}");
        placeholders.push(format!(":{key}"));
        params.insert(key, ParamValue::Text(value.as_ref().to_string()));
    }
    Predicate {
        sql: format!("{column} IN ({})", placeholders.join(", ")),
        params,
    }
}

fn rating_predicate(ratings: &RatingFilter) -> AnalyticsResult<Predicate> {
    ratings.driver.validate("driver rating")?;
    ratings.customer.validate("customer rating")?;

    let mut clauses = Vec::with_capacity(4);
    if ratings.exclude_blank {
        clauses.push(format!("{DRIVER_RATINGS} IS NOT NULL"));
        clauses.push(format!("{CUSTOMER_RATING} IS NOT NULL"));
    }
    clauses.push(format!("{DRIVER_RATINGS} BETWEEN :driver_min AND :driver_max"));
    clauses.push(format!("{CUSTOMER_RATING} BETWEEN :cust_min AND :cust_max"));

    let mut params = Params::new();
    params.insert("driver_min".into(), ParamValue::Real(ratings.driver.min));
    params.insert("driver_max".into(), ParamValue::Real(ratings.driver.max));
    params.insert("cust_min".into(), ParamValue::Real(ratings.customer.min));
    params.insert("cust_max".into(), ParamValue::Real(ratings.customer.max));

    Ok(Predicate { sql: clauses.join(" AND "), params })
}
