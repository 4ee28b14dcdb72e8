//! Price resolution for flight packages.
//!
//! Three discount sources are combined for a booking:
//! - package discounts, always available but conditional on the flight's weekday;
//! - campaigns, running between `starts_at` and `ends_at`;
//! - a coupon the customer typed in, validated beforehand by `validate_coupon`.
//!
//! At most one discount and one campaign apply (the one worth the most), and
//! the three amounts stack additively with the final price floored at zero.
//!
//! Lookup failures while pricing are logged and swallowed: the caller gets the
//! breakdown resolved so far, so a broken discount lookup can only ever cost
//! the customer a discount and never block the booking.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{CouponError, StoreError};
use crate::models::{
    normalize_code, Campaign, Coupon, DiscountCondition, DiscountType, PackageDiscount,
};
use crate::store::PricingStore;

/// Source of the evaluation instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Anything carrying a discount type and value.
pub trait Discount {
    fn discount_type(&self) -> DiscountType;
    fn discount_value(&self) -> f64;

    /// Money this discount takes off `total`.
    fn amount_for(&self, total: f64) -> f64 {
        discount_amount(self.discount_type(), self.discount_value(), total)
    }
}

macro_rules! impl_discount {
    ($($ty:ty),*) => {
        $(impl Discount for $ty {
            fn discount_type(&self) -> DiscountType {
                self.discount_type
            }

            fn discount_value(&self) -> f64 {
                self.discount_value
            }
        })*
    };
}

impl_discount!(PackageDiscount, Campaign, Coupon);

/// Percentages are rounded to whole units; fixed amounts never exceed `total`.
pub fn discount_amount(kind: DiscountType, value: f64, total: f64) -> f64 {
    let amount = match kind {
        DiscountType::Percentage => (total * value / 100.0).round(),
        DiscountType::FixedAmount => value.min(total),
    };
    amount.clamp(0.0, total.max(0.0))
}

/// Whether a package discount applies to a flight on `slot_date`.
pub fn is_discount_eligible(discount: &PackageDiscount, slot_date: NaiveDate) -> bool {
    // 0 = Sunday .. 6 = Saturday
    let day = slot_date.weekday().num_days_from_sunday() as i32;
    match discount.condition {
        DiscountCondition::Always => true,
        DiscountCondition::Weekday => (1..=5).contains(&day),
        DiscountCondition::Weekend => day == 0 || day == 6,
        DiscountCondition::SpecificDays => discount
            .specific_days
            .as_ref()
            .map_or(false, |days| days.contains(&day)),
    }
}

/// Picks the candidate worth strictly the most; the earliest wins a tie.
pub fn select_best<T: Discount>(candidates: Vec<T>, total: f64) -> Option<(T, f64)> {
    let mut best: Option<(T, f64)> = None;
    for candidate in candidates {
        let amount = candidate.amount_for(total);
        let is_better = best
            .as_ref()
            .map_or(true, |(_, best_amount)| amount > *best_amount);
        if is_better {
            best = Some((candidate, amount));
        }
    }
    best
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub base_price: f64,
    pub discount_amount: f64,
    pub campaign_amount: f64,
    pub coupon_amount: f64,
    pub final_price: f64,
    pub applied_discount: Option<PackageDiscount>,
    pub applied_campaign: Option<Campaign>,
    pub applied_coupon: Option<Coupon>,
}

impl PriceBreakdown {
    fn new(base_price: f64) -> Self {
        Self {
            base_price,
            discount_amount: 0.0,
            campaign_amount: 0.0,
            coupon_amount: 0.0,
            final_price: base_price,
            applied_discount: None,
            applied_campaign: None,
            applied_coupon: None,
        }
    }

    pub fn total_reduction(&self) -> f64 {
        self.discount_amount + self.campaign_amount + self.coupon_amount
    }

    fn settle(mut self) -> Self {
        self.final_price = (self.base_price - self.total_reduction()).max(0.0);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CouponRejection {
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    #[serde(flatten)]
    pub breakdown: PriceBreakdown,
    pub coupon_rejection: Option<CouponRejection>,
}

/// What is being priced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRequest {
    pub base_price_per_person: f64,
    pub passenger_count: u32,
    pub package_id: i32,
    pub slot_date: NaiveDate,
}

pub struct PricingResolver<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: PricingStore> PricingResolver<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: PricingStore, C: Clock> PricingResolver<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Computes the price breakdown for `request`. Never fails; see the
    /// module docs for what happens when a lookup does.
    pub fn calculate_price(
        &mut self,
        request: &PriceRequest,
        coupon: Option<&Coupon>,
    ) -> PriceBreakdown {
        let base_price = request.base_price_per_person * f64::from(request.passenger_count);
        let mut breakdown = PriceBreakdown::new(base_price);

        if let Err(err) = self.apply_discounts(&mut breakdown, request, coupon) {
            log::error!(
                "pricing lookup failed for package {}, continuing with partial breakdown: {}",
                request.package_id,
                err
            );
        }
        breakdown.settle()
    }

    fn apply_discounts(
        &mut self,
        breakdown: &mut PriceBreakdown,
        request: &PriceRequest,
        coupon: Option<&Coupon>,
    ) -> Result<(), StoreError> {
        let total = breakdown.base_price;

        let eligible: Vec<PackageDiscount> = self
            .store
            .active_discounts(request.package_id)?
            .into_iter()
            .filter(|discount| is_discount_eligible(discount, request.slot_date))
            .collect();
        if let Some((discount, amount)) = select_best(eligible, total) {
            log::debug!("package discount {} applies: {}", discount.id, amount);
            breakdown.discount_amount = amount;
            breakdown.applied_discount = Some(discount);
        }

        // Campaign windows are matched against the evaluation instant, not the slot date.
        let now = self.clock.now();
        let running: Vec<Campaign> = self
            .store
            .running_campaigns(request.package_id, now)?
            .into_iter()
            .filter(|campaign| campaign.is_running_at(now))
            .collect();
        if let Some((campaign, amount)) = select_best(running, total) {
            log::debug!("campaign {} applies: {}", campaign.id, amount);
            breakdown.campaign_amount = amount;
            breakdown.applied_campaign = Some(campaign);
        }

        if let Some(coupon) = coupon {
            breakdown.coupon_amount = coupon.amount_for(total);
            breakdown.applied_coupon = Some(coupon.clone());
        }
        Ok(())
    }

    /// Validates an optional coupon code and prices the request. A rejected
    /// coupon is reported in the quote and the booking is priced without it.
    pub fn quote(&mut self, request: &PriceRequest, coupon_code: Option<&str>) -> Quote {
        let mut coupon_rejection = None;
        let coupon = match coupon_code {
            None => None,
            Some(coupon_code) => match self.validate_coupon(coupon_code, Some(request.package_id)) {
                Ok(coupon) => Some(coupon),
                Err(err @ CouponError::Lookup(_)) => {
                    log::error!("coupon lookup failed, pricing without coupon: {err}");
                    None
                }
                Err(err) => {
                    log::debug!("coupon {coupon_code} rejected: {err}");
                    coupon_rejection = Some(CouponRejection {
                        error: err.kind(),
                        message: err.to_string(),
                    });
                    None
                }
            },
        };

        Quote {
            breakdown: self.calculate_price(request, coupon.as_ref()),
            coupon_rejection,
        }
    }

    /// Looks up `code` and checks it can be used for `package_id`.
    pub fn validate_coupon(
        &mut self,
        code: &str,
        package_id: Option<i32>,
    ) -> Result<Coupon, CouponError> {
        let code = normalize_code(code);
        let coupon = self
            .store
            .active_coupon(&code)?
            .ok_or(CouponError::InvalidCode)?;
        check_coupon(&coupon, package_id, self.clock.now())?;
        Ok(coupon)
    }

    /// Records one use of a coupon after its booking is confirmed.
    ///
    /// The increment is a single conditional update, so two bookings racing
    /// for the last use cannot both succeed.
    pub fn redeem_coupon(&mut self, coupon_id: i32) -> Result<Coupon, CouponError> {
        let now = self.clock.now();
        if let Some(redeemed) = self.store.try_redeem_coupon(coupon_id, now)? {
            return Ok(redeemed);
        }

        let coupon = self
            .store
            .coupon_by_id(coupon_id)?
            .filter(|coupon| coupon.is_active)
            .ok_or(CouponError::InvalidCode)?;
        if coupon.is_expired_at(now) {
            Err(CouponError::Expired)
        } else {
            Err(CouponError::UsageExhausted)
        }
    }
}

fn check_coupon(
    coupon: &Coupon,
    package_id: Option<i32>,
    now: DateTime<Utc>,
) -> Result<(), CouponError> {
    if let Some(scope) = coupon.flight_package_id {
        if package_id != Some(scope) {
            return Err(CouponError::PackageMismatch);
        }
    }
    if coupon.is_expired_at(now) {
        return Err(CouponError::Expired);
    }
    if coupon.is_exhausted() {
        return Err(CouponError::UsageExhausted);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn discount(condition: DiscountCondition, days: Option<Vec<i32>>) -> PackageDiscount {
        PackageDiscount {
            id: 1,
            flight_package_id: 7,
            name: "test".into(),
            discount_type: DiscountType::Percentage,
            discount_value: 10.0,
            condition,
            specific_days: days,
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn coupon() -> Coupon {
        Coupon {
            id: 3,
            operator_id: 1,
            code: "SAVE10".into(),
            discount_type: DiscountType::FixedAmount,
            discount_value: 1000.0,
            flight_package_id: None,
            expires_at: None,
            usage_limit: None,
            times_used: 0,
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    // 2024-01-13 is a Saturday, 2024-01-15 a Monday.
    fn saturday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 13).unwrap()
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn percentage_amount_is_rounded() {
        assert_eq!(discount_amount(DiscountType::Percentage, 15.0, 10000.0), 1500.0);
        assert_eq!(discount_amount(DiscountType::Percentage, 12.5, 999.0), 125.0);
    }

    #[test]
    fn fixed_amount_is_capped_at_total() {
        assert_eq!(discount_amount(DiscountType::FixedAmount, 5000.0, 1000.0), 1000.0);
        assert_eq!(discount_amount(DiscountType::FixedAmount, 300.0, 1000.0), 300.0);
    }

    #[test]
    fn eligibility_follows_weekday() {
        let always = discount(DiscountCondition::Always, None);
        let weekday = discount(DiscountCondition::Weekday, None);
        let weekend = discount(DiscountCondition::Weekend, None);

        assert!(is_discount_eligible(&always, saturday()));
        assert!(is_discount_eligible(&always, monday()));
        assert!(is_discount_eligible(&weekday, monday()));
        assert!(!is_discount_eligible(&weekday, saturday()));
        assert!(is_discount_eligible(&weekend, saturday()));
        assert!(!is_discount_eligible(&weekend, monday()));
    }

    #[test]
    fn specific_days_needs_a_day_set() {
        let mondays = discount(DiscountCondition::SpecificDays, Some(vec![1]));
        let unset = discount(DiscountCondition::SpecificDays, None);

        assert!(is_discount_eligible(&mondays, monday()));
        assert!(!is_discount_eligible(&mondays, saturday()));
        assert!(!is_discount_eligible(&unset, monday()));
    }

    #[test]
    fn select_best_keeps_first_on_tie() {
        let mut first = discount(DiscountCondition::Always, None);
        first.id = 1;
        let mut second = discount(DiscountCondition::Always, None);
        second.id = 2;

        let (winner, amount) = select_best(vec![first, second], 1000.0).unwrap();
        assert_eq!(winner.id, 1);
        assert_eq!(amount, 100.0);
    }

    #[test]
    fn select_best_of_nothing_is_none() {
        assert!(select_best(Vec::<PackageDiscount>::new(), 1000.0).is_none());
    }

    #[test]
    fn coupon_scope_must_match_package() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let mut scoped = coupon();
        scoped.flight_package_id = Some(7);

        assert!(check_coupon(&scoped, Some(7), now).is_ok());
        assert!(matches!(
            check_coupon(&scoped, Some(8), now),
            Err(CouponError::PackageMismatch)
        ));
        assert!(matches!(
            check_coupon(&scoped, None, now),
            Err(CouponError::PackageMismatch)
        ));
        assert!(check_coupon(&coupon(), None, now).is_ok());
    }

    #[test]
    fn coupon_at_limit_is_exhausted() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let mut limited = coupon();
        limited.usage_limit = Some(2);
        limited.times_used = 2;

        assert!(matches!(
            check_coupon(&limited, None, now),
            Err(CouponError::UsageExhausted)
        ));
    }

    #[test]
    fn breakdown_never_goes_negative() {
        let mut breakdown = PriceBreakdown::new(1000.0);
        breakdown.discount_amount = 600.0;
        breakdown.campaign_amount = 600.0;
        let breakdown = breakdown.settle();
        assert_eq!(breakdown.final_price, 0.0);
    }
}
