use chrono::{DateTime, Utc};
use diesel::Insertable;
use flight_pricing_api::errors::ApiError;
use flight_pricing_api::models::{normalize_code, DiscountCondition, DiscountType};
use flight_pricing_api::schema::{campaigns, coupons, package_discounts};
use serde::{Deserialize, Serialize};

fn validate_value(kind: DiscountType, value: f64) -> Result<(), ApiError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::Validation(
            "discount value must be zero or more".into(),
        ));
    }
    if kind == DiscountType::Percentage && value > 100.0 {
        return Err(ApiError::Validation(
            "percentage discount cannot exceed 100".into(),
        ));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::Validation("name must not be empty".into()));
    }
    Ok(())
}

#[derive(Insertable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name=package_discounts)]
pub struct NewPackageDiscount {
    pub flight_package_id: i32,
    pub name: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub condition: DiscountCondition,
    pub specific_days: Option<Vec<i32>>,
}

impl NewPackageDiscount {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_name(&self.name)?;
        validate_value(self.discount_type, self.discount_value)?;
        if self.condition == DiscountCondition::SpecificDays {
            match &self.specific_days {
                Some(days) if !days.is_empty() => {}
                _ => {
                    return Err(ApiError::Validation(
                        "specific_days condition needs at least one weekday".into(),
                    ))
                }
            }
        }
        if let Some(days) = &self.specific_days {
            if days.iter().any(|day| !(0..=6).contains(day)) {
                return Err(ApiError::Validation(
                    "weekdays must be between 0 (Sunday) and 6 (Saturday)".into(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Insertable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name=campaigns)]
pub struct NewCampaign {
    pub flight_package_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl NewCampaign {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_name(&self.name)?;
        validate_value(self.discount_type, self.discount_value)?;
        if self.starts_at > self.ends_at {
            return Err(ApiError::Validation(
                "campaign must start before it ends".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Insertable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name=coupons)]
pub struct NewCoupon {
    pub operator_id: i32,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub flight_package_id: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_limit: Option<i32>,
}

impl NewCoupon {
    /// Validates the payload and upper-cases the code for storage.
    pub fn normalized(mut self) -> Result<Self, ApiError> {
        if self.code.trim().is_empty() {
            return Err(ApiError::Validation("coupon code must not be empty".into()));
        }
        validate_value(self.discount_type, self.discount_value)?;
        if matches!(self.usage_limit, Some(limit) if limit < 1) {
            return Err(ApiError::Validation(
                "usage limit must be at least 1".into(),
            ));
        }
        self.code = normalize_code(&self.code);
        Ok(self)
    }
}
