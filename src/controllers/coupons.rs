use crate::insertables::NewCoupon;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use flight_pricing_api::errors::ApiError;
use flight_pricing_api::models::Coupon;
use flight_pricing_api::pricing::PricingResolver;
use flight_pricing_api::schema;
use flight_pricing_api::store::PgPricingStore;
use flight_pricing_api::DbPool;
use schema::coupons::dsl::*;
use serde::Deserialize;

#[derive(Deserialize)]
struct ValidateCouponDto {
    code: String,
    package_id: Option<i32>,
}

pub fn get_operator_coupons(
    conn: &mut PgConnection,
    owner_id: i32,
) -> Result<Vec<Coupon>, ApiError> {
    let operator_coupons = coupons
        .filter(operator_id.eq(owner_id))
        .order(created_at.desc())
        .select(Coupon::as_select())
        .load(conn)?;
    Ok(operator_coupons)
}

pub fn get_coupon_by_id(conn: &mut PgConnection, coupon_id: i32) -> Result<Coupon, ApiError> {
    coupons
        .find(coupon_id)
        .select(Coupon::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound(format!("coupon {coupon_id}")))
}

pub fn insert_new_coupon(
    conn: &mut PgConnection,
    new_coupon: NewCoupon,
) -> Result<Coupon, ApiError> {
    let new_coupon = new_coupon.normalized()?;
    let created = diesel::insert_into(coupons)
        .values(&new_coupon)
        .returning(Coupon::as_returning())
        .get_result(conn)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                ApiError::Validation(format!("coupon code {} already exists", new_coupon.code))
            }
            other => other.into(),
        })?;
    log::info!("created coupon {} for operator {}", created.code, created.operator_id);
    Ok(created)
}

pub fn toggle_coupon_by_id(conn: &mut PgConnection, coupon_id: i32) -> Result<bool, ApiError> {
    diesel::update(coupons.find(coupon_id))
        .set(is_active.eq(diesel::dsl::not(is_active)))
        .returning(is_active)
        .get_result::<bool>(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound(format!("coupon {coupon_id}")))
}

pub fn delete_coupon_by_id(conn: &mut PgConnection, coupon_id: i32) -> Result<String, ApiError> {
    let deleted = diesel::delete(coupons.find(coupon_id)).execute(conn)?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("coupon {coupon_id}")));
    }
    Ok("Coupon deleted".to_string())
}

#[get("/api/operators/{operator_id}/coupons")]
async fn get_coupons(
    pool: web::Data<DbPool>,
    owner_id: web::Path<i32>,
) -> Result<impl Responder, ApiError> {
    let operator_coupons = web::block(move || {
        let mut conn = pool.get()?;
        get_operator_coupons(&mut conn, *owner_id)
    })
    .await??;
    Ok(HttpResponse::Ok().json(operator_coupons))
}

#[get("/api/coupons/{coupon_id}")]
async fn get_coupon(
    pool: web::Data<DbPool>,
    coupon_id: web::Path<i32>,
) -> Result<impl Responder, ApiError> {
    let coupon = web::block(move || {
        let mut conn = pool.get()?;
        get_coupon_by_id(&mut conn, *coupon_id)
    })
    .await??;
    Ok(HttpResponse::Ok().json(coupon))
}

#[post("/api/coupons")]
async fn create_coupon(
    pool: web::Data<DbPool>,
    form: web::Json<NewCoupon>,
) -> Result<impl Responder, ApiError> {
    let coupon = web::block(move || {
        let mut conn = pool.get()?;
        insert_new_coupon(&mut conn, form.into_inner())
    })
    .await??;
    Ok(HttpResponse::Created().json(coupon))
}

#[post("/api/coupons/validate")]
async fn validate_coupon(
    pool: web::Data<DbPool>,
    form: web::Json<ValidateCouponDto>,
) -> Result<impl Responder, ApiError> {
    let coupon = web::block(move || -> Result<Coupon, ApiError> {
        let mut conn = pool.get()?;
        let mut resolver = PricingResolver::new(PgPricingStore::new(&mut conn));
        Ok(resolver.validate_coupon(&form.code, form.package_id)?)
    })
    .await??;
    Ok(HttpResponse::Ok().json(coupon))
}

#[post("/api/coupons/{coupon_id}/redeem")]
async fn redeem_coupon(
    pool: web::Data<DbPool>,
    coupon_id: web::Path<i32>,
) -> Result<impl Responder, ApiError> {
    let coupon = web::block(move || -> Result<Coupon, ApiError> {
        let mut conn = pool.get()?;
        let mut resolver = PricingResolver::new(PgPricingStore::new(&mut conn));
        let redeemed = resolver.redeem_coupon(*coupon_id)?;
        log::info!(
            "coupon {} redeemed, {} use(s) recorded",
            redeemed.code,
            redeemed.times_used
        );
        Ok(redeemed)
    })
    .await??;
    Ok(HttpResponse::Ok().json(coupon))
}

#[put("/api/coupons/{coupon_id}/toggle")]
async fn toggle_coupon(
    pool: web::Data<DbPool>,
    coupon_id: web::Path<i32>,
) -> Result<impl Responder, ApiError> {
    let active = web::block(move || {
        let mut conn = pool.get()?;
        toggle_coupon_by_id(&mut conn, *coupon_id)
    })
    .await??;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "is_active": active })))
}

#[delete("/api/coupons/{coupon_id}")]
async fn delete_coupon(
    pool: web::Data<DbPool>,
    coupon_id: web::Path<i32>,
) -> Result<impl Responder, ApiError> {
    let message = web::block(move || {
        let mut conn = pool.get()?;
        delete_coupon_by_id(&mut conn, *coupon_id)
    })
    .await??;
    Ok(HttpResponse::Ok().json(message))
}
