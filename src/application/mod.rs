pub mod cart_service;
pub mod category_service;
pub mod checkout;
pub mod order_service;
pub mod product_service;
pub mod read_cache;
pub mod review_service;

#[cfg(test)]
pub mod testing;
