diesel::table! {
    campaigns (id) {
        id -> Int4,
        flight_package_id -> Int4,
        name -> Varchar,
        description -> Nullable<Varchar>,
        discount_type -> Varchar,
        discount_value -> Float8,
        starts_at -> Timestamptz,
        ends_at -> Timestamptz,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    coupons (id) {
        id -> Int4,
        operator_id -> Int4,
        code -> Varchar,
        discount_type -> Varchar,
        discount_value -> Float8,
        flight_package_id -> Nullable<Int4>,
        expires_at -> Nullable<Timestamptz>,
        usage_limit -> Nullable<Int4>,
        times_used -> Int4,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    package_discounts (id) {
        id -> Int4,
        flight_package_id -> Int4,
        name -> Varchar,
        discount_type -> Varchar,
        discount_value -> Float8,
        condition -> Varchar,
        specific_days -> Nullable<Array<Int4>>,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(campaigns, coupons, package_discounts,);
