use chrono::{DateTime, Utc};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::schema::{campaigns, coupons, package_discounts};

/// How a discount value is interpreted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_value` is a percentage of the total.
    Percentage,
    /// `discount_value` is a flat amount, capped at the total.
    FixedAmount,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "percentage",
            DiscountType::FixedAmount => "fixed_amount",
        }
    }
}

impl ToSql<Text, Pg> for DiscountType {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for DiscountType {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"percentage" => Ok(DiscountType::Percentage),
            b"fixed_amount" => Ok(DiscountType::FixedAmount),
            other => Err(format!(
                "unknown discount type: {}",
                String::from_utf8_lossy(other)
            )
            .into()),
        }
    }
}

/// Which flight dates a package discount applies to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum DiscountCondition {
    Always,
    Weekday,
    Weekend,
    SpecificDays,
}

impl DiscountCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountCondition::Always => "always",
            DiscountCondition::Weekday => "weekday",
            DiscountCondition::Weekend => "weekend",
            DiscountCondition::SpecificDays => "specific_days",
        }
    }
}

impl ToSql<Text, Pg> for DiscountCondition {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for DiscountCondition {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"always" => Ok(DiscountCondition::Always),
            b"weekday" => Ok(DiscountCondition::Weekday),
            b"weekend" => Ok(DiscountCondition::Weekend),
            b"specific_days" => Ok(DiscountCondition::SpecificDays),
            other => Err(format!(
                "unknown discount condition: {}",
                String::from_utf8_lossy(other)
            )
            .into()),
        }
    }
}

/// Always-available conditional discount attached to one flight package.
///
/// `specific_days` holds weekday numbers, 0 = Sunday through 6 = Saturday.
#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = package_discounts)]
pub struct PackageDiscount {
    pub id: i32,
    pub flight_package_id: i32,
    pub name: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub condition: DiscountCondition,
    pub specific_days: Option<Vec<i32>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Time-boxed promotion attached to one flight package.
#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = campaigns)]
pub struct Campaign {
    pub id: i32,
    pub flight_package_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    /// Whether `instant` falls inside `[starts_at, ends_at]`.
    pub fn is_running_at(&self, instant: DateTime<Utc>) -> bool {
        self.starts_at <= instant && instant <= self.ends_at
    }
}

/// Customer-redeemable code. `code` is always stored upper-cased.
#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = coupons)]
pub struct Coupon {
    pub id: i32,
    pub operator_id: i32,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub flight_package_id: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_limit: Option<i32>,
    pub times_used: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    pub fn is_expired_at(&self, instant: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expiry) if expiry < instant)
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.usage_limit, Some(limit) if self.times_used >= limit)
    }
}

/// Normalizes a user-typed coupon code to its stored form.
pub fn normalize_code(code: &str) -> String {
    code.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_text_matches_json_names() {
        for kind in [DiscountType::Percentage, DiscountType::FixedAmount] {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
        }
        for condition in [
            DiscountCondition::Always,
            DiscountCondition::Weekday,
            DiscountCondition::Weekend,
            DiscountCondition::SpecificDays,
        ] {
            assert_eq!(serde_json::to_value(condition).unwrap(), condition.as_str());
        }
    }
}
