use actix_web::{post, web, HttpResponse, Responder};
use chrono::NaiveDate;
use flight_pricing_api::errors::ApiError;
use flight_pricing_api::pricing::{PriceRequest, PricingResolver};
use flight_pricing_api::store::PgPricingStore;
use flight_pricing_api::DbPool;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct QuoteDto {
    pub base_price_per_person: f64,
    pub passenger_count: u32,
    pub package_id: i32,
    pub slot_date: NaiveDate,
    pub coupon_code: Option<String>,
}

impl QuoteDto {
    fn price_request(&self) -> Result<PriceRequest, ApiError> {
        if !self.base_price_per_person.is_finite() || self.base_price_per_person <= 0.0 {
            return Err(ApiError::Validation(
                "base price per person must be greater than zero".into(),
            ));
        }
        if self.passenger_count == 0 {
            return Err(ApiError::Validation(
                "at least one passenger is required".into(),
            ));
        }
        Ok(PriceRequest {
            base_price_per_person: self.base_price_per_person,
            passenger_count: self.passenger_count,
            package_id: self.package_id,
            slot_date: self.slot_date,
        })
    }
}

#[post("/api/pricing/quote")]
async fn create_quote(
    pool: web::Data<DbPool>,
    form: web::Json<QuoteDto>,
) -> Result<impl Responder, ApiError> {
    let request = form.price_request()?;
    let quote = web::block(move || -> Result<_, ApiError> {
        let mut conn = pool.get()?;
        let mut resolver = PricingResolver::new(PgPricingStore::new(&mut conn));
        Ok(resolver.quote(&request, form.coupon_code.as_deref()))
    })
    .await??;
    Ok(HttpResponse::Ok().json(quote))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(base: f64, passengers: u32) -> QuoteDto {
        QuoteDto {
            base_price_per_person: base,
            passenger_count: passengers,
            package_id: 1,
            slot_date: NaiveDate::from_ymd_opt(2024, 1, 13).unwrap(),
            coupon_code: None,
        }
    }

    #[test]
    fn quote_needs_a_positive_price() {
        assert!(dto(0.0, 1).price_request().is_err());
        assert!(dto(-10.0, 1).price_request().is_err());
    }

    #[test]
    fn quote_needs_a_passenger() {
        assert!(dto(100.0, 0).price_request().is_err());
        assert_eq!(dto(100.0, 2).price_request().unwrap().passenger_count, 2);
    }

    #[test]
    fn quote_body_parses_iso_date() {
        let body = concat!(
            r#"{"base_price_per_person":20000,"passenger_count":2,"package_id":4,"#,
            r#""slot_date":"2024-01-13","coupon_code":"save10"}"#,
        );
        let parsed: QuoteDto = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.slot_date, NaiveDate::from_ymd_opt(2024, 1, 13).unwrap());
        assert_eq!(parsed.coupon_code.as_deref(), Some("save10"));
    }
}
