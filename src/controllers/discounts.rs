use crate::insertables::NewPackageDiscount;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use diesel::prelude::*;
use flight_pricing_api::errors::ApiError;
use flight_pricing_api::models::PackageDiscount;
use flight_pricing_api::schema;
use flight_pricing_api::DbPool;
use schema::package_discounts::dsl::*;

pub fn get_package_discounts(
    conn: &mut PgConnection,
    package_id: i32,
) -> Result<Vec<PackageDiscount>, ApiError> {
    let discounts = package_discounts
        .filter(flight_package_id.eq(package_id))
        .order(id.asc())
        .select(PackageDiscount::as_select())
        .load(conn)?;
    Ok(discounts)
}

pub fn get_discount_by_id(
    conn: &mut PgConnection,
    discount_id: i32,
) -> Result<PackageDiscount, ApiError> {
    package_discounts
        .find(discount_id)
        .select(PackageDiscount::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound(format!("discount {discount_id}")))
}

pub fn insert_new_discount(
    conn: &mut PgConnection,
    new_discount: &NewPackageDiscount,
) -> Result<PackageDiscount, ApiError> {
    new_discount.validate()?;
    let created = diesel::insert_into(package_discounts)
        .values(new_discount)
        .returning(PackageDiscount::as_returning())
        .get_result(conn)?;
    log::info!(
        "created package discount {} for package {}",
        created.id,
        created.flight_package_id
    );
    Ok(created)
}

pub fn toggle_discount_by_id(conn: &mut PgConnection, discount_id: i32) -> Result<bool, ApiError> {
    diesel::update(package_discounts.find(discount_id))
        .set(is_active.eq(diesel::dsl::not(is_active)))
        .returning(is_active)
        .get_result::<bool>(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound(format!("discount {discount_id}")))
}

pub fn delete_discount_by_id(
    conn: &mut PgConnection,
    discount_id: i32,
) -> Result<String, ApiError> {
    let deleted = diesel::delete(package_discounts.find(discount_id)).execute(conn)?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("discount {discount_id}")));
    }
    Ok("Discount deleted".to_string())
}

#[get("/api/packages/{package_id}/discounts")]
async fn get_discounts(
    pool: web::Data<DbPool>,
    package_id: web::Path<i32>,
) -> Result<impl Responder, ApiError> {
    let discounts = web::block(move || {
        let mut conn = pool.get()?;
        get_package_discounts(&mut conn, *package_id)
    })
    .await??;
    Ok(HttpResponse::Ok().json(discounts))
}

#[get("/api/discounts/{discount_id}")]
async fn get_discount(
    pool: web::Data<DbPool>,
    discount_id: web::Path<i32>,
) -> Result<impl Responder, ApiError> {
    let discount = web::block(move || {
        let mut conn = pool.get()?;
        get_discount_by_id(&mut conn, *discount_id)
    })
    .await??;
    Ok(HttpResponse::Ok().json(discount))
}

#[post("/api/discounts")]
async fn create_discount(
    pool: web::Data<DbPool>,
    form: web::Json<NewPackageDiscount>,
) -> Result<impl Responder, ApiError> {
    let discount = web::block(move || {
        let mut conn = pool.get()?;
        insert_new_discount(&mut conn, &form)
    })
    .await??;
    Ok(HttpResponse::Created().json(discount))
}

#[put("/api/discounts/{discount_id}/toggle")]
async fn toggle_discount(
    pool: web::Data<DbPool>,
    discount_id: web::Path<i32>,
) -> Result<impl Responder, ApiError> {
    let active = web::block(move || {
        let mut conn = pool.get()?;
        toggle_discount_by_id(&mut conn, *discount_id)
    })
    .await??;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "is_active": active })))
}

#[delete("/api/discounts/{discount_id}")]
async fn delete_discount(
    pool: web::Data<DbPool>,
    discount_id: web::Path<i32>,
) -> Result<impl Responder, ApiError> {
    let message = web::block(move || {
        let mut conn = pool.get()?;
        delete_discount_by_id(&mut conn, *discount_id)
    })
    .await??;
    Ok(HttpResponse::Ok().json(message))
}
