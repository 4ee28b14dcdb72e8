#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use flight_pricing_api::errors::StoreError;
use flight_pricing_api::models::{
    Campaign, Coupon, DiscountCondition, DiscountType, PackageDiscount,
};
use flight_pricing_api::pricing::{Clock, PriceRequest};
use flight_pricing_api::store::PricingStore;

pub const PACKAGE_ID: i32 = 1;

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// 2024-01-13, a Saturday.
pub fn saturday() -> NaiveDate {
    date(2024, 1, 13)
}

/// 2024-01-15, a Monday.
pub fn monday() -> NaiveDate {
    date(2024, 1, 15)
}

pub fn request(per_person: f64, passengers: u32, slot_date: NaiveDate) -> PriceRequest {
    PriceRequest {
        base_price_per_person: per_person,
        passenger_count: passengers,
        package_id: PACKAGE_ID,
        slot_date,
    }
}

pub fn discount(
    id: i32,
    discount_type: DiscountType,
    value: f64,
    condition: DiscountCondition,
) -> PackageDiscount {
    PackageDiscount {
        id,
        flight_package_id: PACKAGE_ID,
        name: format!("discount {id}"),
        discount_type,
        discount_value: value,
        condition,
        specific_days: None,
        is_active: true,
        created_at: at(2023, 12, 1),
    }
}

pub fn campaign(
    id: i32,
    discount_type: DiscountType,
    value: f64,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
) -> Campaign {
    Campaign {
        id,
        flight_package_id: PACKAGE_ID,
        name: format!("campaign {id}"),
        description: None,
        discount_type,
        discount_value: value,
        starts_at,
        ends_at,
        is_active: true,
        created_at: at(2023, 12, 1),
    }
}

pub fn coupon(id: i32, code: &str, discount_type: DiscountType, value: f64) -> Coupon {
    Coupon {
        id,
        operator_id: 1,
        code: code.to_string(),
        discount_type,
        discount_value: value,
        flight_package_id: None,
        expires_at: None,
        usage_limit: None,
        times_used: 0,
        is_active: true,
        created_at: at(2023, 12, 1),
    }
}

fn lookup_failure() -> StoreError {
    StoreError::Database(diesel::result::Error::BrokenTransactionManager)
}

/// In-memory record store with the same filtering as the PostgreSQL one.
#[derive(Default)]
pub struct MemoryStore {
    pub discounts: Vec<PackageDiscount>,
    pub campaigns: Vec<Campaign>,
    pub coupons: Vec<Coupon>,
    pub fail_discounts: bool,
    pub fail_campaigns: bool,
    pub fail_coupons: bool,
    pub fail_coupon_reads: bool,
}

impl PricingStore for MemoryStore {
    fn active_discounts(&mut self, package_id: i32) -> Result<Vec<PackageDiscount>, StoreError> {
        if self.fail_discounts {
            return Err(lookup_failure());
        }
        Ok(self
            .discounts
            .iter()
            .filter(|d| d.flight_package_id == package_id && d.is_active)
            .cloned()
            .collect())
    }

    fn running_campaigns(
        &mut self,
        package_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Vec<Campaign>, StoreError> {
        if self.fail_campaigns {
            return Err(lookup_failure());
        }
        Ok(self
            .campaigns
            .iter()
            .filter(|c| c.flight_package_id == package_id && c.is_active && c.is_running_at(now))
            .cloned()
            .collect())
    }

    fn active_coupon(&mut self, code: &str) -> Result<Option<Coupon>, StoreError> {
        if self.fail_coupons {
            return Err(lookup_failure());
        }
        Ok(self
            .coupons
            .iter()
            .find(|c| c.code == code && c.is_active)
            .cloned())
    }

    fn coupon_by_id(&mut self, coupon_id: i32) -> Result<Option<Coupon>, StoreError> {
        if self.fail_coupon_reads {
            return Err(lookup_failure());
        }
        Ok(self.coupons.iter().find(|c| c.id == coupon_id).cloned())
    }

    fn try_redeem_coupon(
        &mut self,
        coupon_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<Coupon>, StoreError> {
        let redeemable = self.coupons.iter_mut().find(|c| {
            c.id == coupon_id && c.is_active && !c.is_expired_at(now) && !c.is_exhausted()
        });
        Ok(redeemable.map(|coupon| {
            coupon.times_used += 1;
            coupon.clone()
        }))
    }
}
