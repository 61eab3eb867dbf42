use crate::domain::cart::{Cart, CartView};
use crate::domain::catalog::Product;
use crate::domain::errors::DomainError;
use crate::domain::ports::{CartRepository, ProductRepository};

/// Per-user cart. Never cached: every read joins the live product rows so
/// prices and stock are current.
pub struct CartService<C, P> {
    carts: C,
    products: P,
}

impl<C: CartRepository, P: ProductRepository> CartService<C, P> {
    pub fn new(carts: C, products: P) -> Self {
        Self { carts, products }
    }

    /// Returns the user's cart, creating an empty one on first access.
    pub fn get(&self, user_id: i64) -> Result<CartView, DomainError> {
        let cart = self.find_or_create(user_id)?;
        Ok(CartView::from(&cart))
    }

    /// Adds `quantity` to the line for `product_id`. The merged quantity
    /// must fit in the product's current stock.
    pub fn add_item(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> Result<CartView, DomainError> {
        if quantity <= 0 {
            return Err(DomainError::InvalidQuantity);
        }
        let product = self.product(product_id)?;
        let cart = self.find_or_create(user_id)?;
        let already = quantity_of(&cart, product_id);
        ensure_stock(&product, already.saturating_add(quantity))?;

        self.carts.add_item(cart.id, product_id, quantity)?;
        log::debug!(
            "User {} added {} x product {} to cart {}",
            user_id,
            quantity,
            product_id,
            cart.id
        );
        self.get(user_id)
    }

    /// Replaces the quantity of an existing line.
    pub fn update_item(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> Result<CartView, DomainError> {
        if quantity <= 0 {
            return Err(DomainError::InvalidQuantity);
        }
        let product = self.product(product_id)?;
        ensure_stock(&product, quantity)?;

        let cart = self
            .carts
            .find_by_user(user_id)?
            .ok_or(DomainError::CartItemNotFound)?;
        if !self.carts.update_item(cart.id, product_id, quantity)? {
            return Err(DomainError::CartItemNotFound);
        }
        self.get(user_id)
    }

    pub fn remove_item(&self, user_id: i64, product_id: i64) -> Result<CartView, DomainError> {
        let cart = self
            .carts
            .find_by_user(user_id)?
            .ok_or(DomainError::CartItemNotFound)?;
        if !self.carts.remove_item(cart.id, product_id)? {
            return Err(DomainError::CartItemNotFound);
        }
        self.get(user_id)
    }

    /// Empties the cart. Clearing an empty or missing cart is a no-op.
    pub fn clear(&self, user_id: i64) -> Result<CartView, DomainError> {
        if let Some(cart) = self.carts.find_by_user(user_id)? {
            self.carts.clear(cart.id)?;
            log::debug!("Cleared cart {} for user {}", cart.id, user_id);
        }
        self.get(user_id)
    }

    fn find_or_create(&self, user_id: i64) -> Result<Cart, DomainError> {
        match self.carts.find_by_user(user_id)? {
            Some(cart) => Ok(cart),
            None => {
                let cart = self.carts.create(user_id)?;
                log::info!("Created cart {} for user {}", cart.id, user_id);
                Ok(cart)
            }
        }
    }

    fn product(&self, product_id: i64) -> Result<Product, DomainError> {
        self.products
            .find_by_id(product_id)?
            .ok_or(DomainError::ProductNotFound)
    }
}

fn quantity_of(cart: &Cart, product_id: i64) -> i32 {
    cart.lines
        .iter()
        .find(|line| line.product.id == product_id)
        .map_or(0, |line| line.quantity)
}

fn ensure_stock(product: &Product, wanted: i32) -> Result<(), DomainError> {
    if product.stock < wanted {
        return Err(DomainError::InsufficientStock {
            product_id: product.id,
        });
    }
    Ok(())
}
