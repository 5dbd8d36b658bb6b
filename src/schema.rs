diesel::table! {
    orders (id) {
        id -> Text,
        user_name -> Text,
        user_email -> Text,
        user_whatsapp -> Text,
        amount -> Int8,
        status -> Text,
        payment_id -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    payments (id) {
        id -> Uuid,
        order_id -> Text,
        razorpay_order_id -> Text,
        razorpay_payment_id -> Text,
        razorpay_signature -> Text,
        amount -> Int8,
        status -> Text,
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(orders, payments);
