use crate::application::read_cache::ReadCache;
use crate::cache::{keys, CacheStore};
use crate::domain::errors::DomainError;
use crate::domain::order::{CheckoutPolicy, NewOrderItem, Order, PlaceOrder};
use crate::domain::ports::{CartRepository, OrderRepository, UserDirectory};

/// Turns a user's cart into an order.
///
/// Reads and guards happen up front; the write (order header, price
/// snapshot items, cart clear and, under [`CheckoutPolicy::ReserveStock`],
/// the stock decrement) is handed to [`OrderRepository::place`] as one
/// unit. Cache invalidation runs only after that unit has committed.
pub struct CheckoutService<C, O, U, S> {
    carts: C,
    orders: O,
    users: U,
    cache: ReadCache<S>,
    policy: CheckoutPolicy,
}

impl<C, O, U, S> CheckoutService<C, O, U, S>
where
    C: CartRepository,
    O: OrderRepository,
    U: UserDirectory,
    S: CacheStore,
{
    pub fn new(
        carts: C,
        orders: O,
        users: U,
        cache: ReadCache<S>,
        policy: CheckoutPolicy,
    ) -> Self {
        Self {
            carts,
            orders,
            users,
            cache,
            policy,
        }
    }

    pub fn create_order(
        &self,
        user_id: i64,
        address_id: Option<i64>,
    ) -> Result<Order, DomainError> {
        let cart = match self.carts.find_by_user(user_id)? {
            Some(cart) if !cart.is_empty() => cart,
            _ => return Err(DomainError::CartEmpty),
        };

        self.users
            .find_user(user_id)?
            .ok_or(DomainError::UserNotFound)?;
        if let Some(address_id) = address_id {
            match self.users.find_address(address_id)? {
                Some(address) if address.user_id == user_id => {}
                _ => return Err(DomainError::AddressNotFound),
            }
        }

        let total_price = cart.total_price();
        let items: Vec<NewOrderItem> = cart
            .lines
            .iter()
            .map(|line| NewOrderItem {
                product_id: line.product.id,
                product_name: line.product.name.clone(),
                price_at_order: line.product.price.clone(),
                quantity: line.quantity,
            })
            .collect();
        let product_ids: Vec<i64> = items.iter().map(|item| item.product_id).collect();

        let order = self
            .orders
            .place(PlaceOrder {
                user_id,
                address_id,
                cart_id: cart.id,
                total_price,
                items,
                policy: self.policy,
            })
            .map_err(|e| {
                log::warn!("Checkout for user {} rolled back: {}", user_id, e);
                e
            })?;

        log::info!(
            "User {} placed order {} ({} items, total {})",
            user_id,
            order.id,
            order.items.len(),
            order.total_price
        );

        let stale: Vec<String> = product_ids.into_iter().map(keys::product).collect();
        self.cache.invalidate(&stale);
        self.cache.invalidate_matching(keys::PRODUCT_LIST_PATTERN);

        Ok(order)
    }
}
