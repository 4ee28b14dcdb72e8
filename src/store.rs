use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_builder::QueryFragment;
use diesel::query_dsl::LoadQuery;
use diesel::PgConnection;

use crate::errors::StoreError;
use crate::models::{Campaign, Coupon, PackageDiscount};
use crate::schema;

/// Read access to the discount records the pricing resolver evaluates, plus
/// the one write it needs for coupon redemption.
pub trait PricingStore {
    /// Active discounts attached to `package_id`, ordered by id.
    fn active_discounts(&mut self, package_id: i32) -> Result<Vec<PackageDiscount>, StoreError>;

    /// Active campaigns attached to `package_id` whose window contains `now`,
    /// ordered by id.
    fn running_campaigns(
        &mut self,
        package_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Vec<Campaign>, StoreError>;

    /// First active coupon with exactly this (already upper-cased) code.
    fn active_coupon(&mut self, code: &str) -> Result<Option<Coupon>, StoreError>;

    /// Any coupon by id, active or not.
    fn coupon_by_id(&mut self, coupon_id: i32) -> Result<Option<Coupon>, StoreError>;

    /// Increments `times_used` only if the coupon is active, unexpired at
    /// `now` and below its usage limit. Returns the updated coupon, or `None`
    /// when nothing was redeemed.
    fn try_redeem_coupon(
        &mut self,
        coupon_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<Coupon>, StoreError>;
}

impl<T: PricingStore + ?Sized> PricingStore for &mut T {
    fn active_discounts(&mut self, package_id: i32) -> Result<Vec<PackageDiscount>, StoreError> {
        (**self).active_discounts(package_id)
    }

    fn running_campaigns(
        &mut self,
        package_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Vec<Campaign>, StoreError> {
        (**self).running_campaigns(package_id, now)
    }

    fn active_coupon(&mut self, code: &str) -> Result<Option<Coupon>, StoreError> {
        (**self).active_coupon(code)
    }

    fn coupon_by_id(&mut self, coupon_id: i32) -> Result<Option<Coupon>, StoreError> {
        (**self).coupon_by_id(coupon_id)
    }

    fn try_redeem_coupon(
        &mut self,
        coupon_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<Coupon>, StoreError> {
        (**self).try_redeem_coupon(coupon_id, now)
    }
}

fn active_discounts_query(
    package_id: i32,
) -> impl RunQueryDsl<PgConnection>
       + LoadQuery<'static, PgConnection, PackageDiscount>
       + QueryFragment<Pg> {
    use schema::package_discounts::dsl::*;

    package_discounts
        .filter(flight_package_id.eq(package_id))
        .filter(is_active.eq(true))
        .order(id.asc())
        .select(PackageDiscount::as_select())
}

fn running_campaigns_query(
    package_id: i32,
    now: DateTime<Utc>,
) -> impl RunQueryDsl<PgConnection> + LoadQuery<'static, PgConnection, Campaign> + QueryFragment<Pg>
{
    use schema::campaigns::dsl::*;

    campaigns
        .filter(flight_package_id.eq(package_id))
        .filter(is_active.eq(true))
        .filter(starts_at.le(now))
        .filter(ends_at.ge(now))
        .order(id.asc())
        .select(Campaign::as_select())
}

/// Single conditional UPDATE; two bookings racing for the last use cannot
/// both match the usage guard.
fn redeem_coupon_query(
    coupon_id: i32,
    now: DateTime<Utc>,
) -> impl RunQueryDsl<PgConnection> + LoadQuery<'static, PgConnection, Coupon> + QueryFragment<Pg> {
    use schema::coupons::dsl::*;

    diesel::update(
        coupons
            .filter(id.eq(coupon_id))
            .filter(is_active.eq(true))
            .filter(expires_at.is_null().or(expires_at.assume_not_null().ge(now)))
            .filter(usage_limit.is_null().or(times_used.lt(usage_limit.assume_not_null()))),
    )
    .set(times_used.eq(times_used + 1))
    .returning(Coupon::as_returning())
}

/// `PricingStore` over a PostgreSQL connection.
pub struct PgPricingStore<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> PgPricingStore<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }
}

impl PricingStore for PgPricingStore<'_> {
    fn active_discounts(&mut self, package_id: i32) -> Result<Vec<PackageDiscount>, StoreError> {
        Ok(active_discounts_query(package_id).load(self.conn)?)
    }

    fn running_campaigns(
        &mut self,
        package_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Vec<Campaign>, StoreError> {
        Ok(running_campaigns_query(package_id, now).load(self.conn)?)
    }

    fn active_coupon(&mut self, coupon_code: &str) -> Result<Option<Coupon>, StoreError> {
        use schema::coupons::dsl::*;

        let coupon = coupons
            .filter(code.eq(coupon_code))
            .filter(is_active.eq(true))
            .order(id.asc())
            .select(Coupon::as_select())
            .first(self.conn)
            .optional()?;
        Ok(coupon)
    }

    fn coupon_by_id(&mut self, coupon_id: i32) -> Result<Option<Coupon>, StoreError> {
        use schema::coupons::dsl::*;

        let coupon = coupons
            .find(coupon_id)
            .select(Coupon::as_select())
            .first(self.conn)
            .optional()?;
        Ok(coupon)
    }

    fn try_redeem_coupon(
        &mut self,
        coupon_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<Coupon>, StoreError> {
        let redeemed = redeem_coupon_query(coupon_id, now)
            .get_result(self.conn)
            .optional()?;
        Ok(redeemed)
    }
}
