//! Cache keys. Lookups by order id and by user id live in separate
//! namespaces so a user id can never alias an order id.

pub fn order_key(id: i64) -> String {
    format!("order:{}", id)
}

pub fn user_order_key(user_id: i64) -> String {
    format!("order:user:{}", user_id)
}
