//! In-memory stand-ins for every port, shared by the service tests.
//!
//! `MemoryDb` implements all repository traits over one mutex-guarded
//! world, so services wired to it observe each other's writes the same way
//! they would through PostgreSQL. `place` works on a copy of the world and
//! swaps it in only when every step succeeded.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::cache::{CacheError, CacheStore};
use crate::domain::cart::{Cart, CartLine};
use crate::domain::catalog::{
    Category, CategoryChanges, CategorySummary, CategoryView, NewCategory, NewProduct, Product,
    ProductChanges,
};
use crate::domain::errors::DomainError;
use crate::domain::filters::{
    offset, AdminOrderFilters, OrderFilters, OrderSort, ProductFilters, ProductSort,
    ReviewFilters, ReviewSort, SortOrder,
};
use crate::domain::order::{CheckoutPolicy, Order, OrderItem, OrderPage, OrderStatus, PlaceOrder};
use crate::domain::ports::{
    CartRepository, CategoryRepository, OrderRepository, ProductRepository, ReviewRepository,
    UserDirectory,
};
use crate::domain::review::{NewReview, ReviewChanges, ReviewView};
use crate::domain::user::{Address, User};

pub fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).expect("valid decimal literal")
}

// ── Cache ────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, (String, Duration)>>>,
    available: Arc<AtomicBool>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self {
            entries: Arc::default(),
            available: Arc::new(AtomicBool::new(true)),
        }
    }
}

fn glob_matches(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

impl MemoryCache {
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn seed(&self, key: &str, raw: &str) {
        self.lock()
            .insert(key.to_string(), (raw.to_string(), Duration::from_secs(60)));
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().get(key).map(|(raw, _)| raw.clone())
    }

    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.lock().get(key).map(|(_, ttl)| *ttl)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, (String, Duration)>> {
        self.entries.lock().expect("cache mutex poisoned")
    }

    fn check(&self) -> Result<(), CacheError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check()?;
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.check()?;
        self.lock().insert(key.to_string(), (value.to_string(), ttl));
        Ok(())
    }

    fn delete(&self, keys: &[String]) -> Result<(), CacheError> {
        self.check()?;
        let mut entries = self.lock();
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    fn delete_matching(&self, pattern: &str) -> Result<usize, CacheError> {
        self.check()?;
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !glob_matches(pattern, key));
        Ok(before - entries.len())
    }
}

// ── Relational store ─────────────────────────────────────────────────────────

/// Step of `place` at which an injected failure fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    OrderHeader,
    OrderItems,
    CartClear,
}

#[derive(Debug, Clone)]
struct CartRow {
    id: i64,
    uuid: Uuid,
    user_id: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
struct World {
    next_id: i64,
    users: BTreeMap<i64, User>,
    addresses: BTreeMap<i64, Address>,
    products: BTreeMap<i64, Product>,
    categories: BTreeMap<i64, Category>,
    product_categories: BTreeSet<(i64, i64)>,
    carts: BTreeMap<i64, CartRow>,
    cart_items: BTreeMap<(i64, i64), i32>,
    orders: BTreeMap<i64, Order>,
    reviews: BTreeMap<i64, ReviewView>,
}

impl World {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn cart(&self, row: &CartRow) -> Cart {
        let lines = self
            .cart_items
            .iter()
            .filter(|((cart_id, _), _)| *cart_id == row.id)
            .filter_map(|((_, product_id), quantity)| {
                self.products.get(product_id).map(|p| CartLine {
                    product: p.clone(),
                    quantity: *quantity,
                })
            })
            .collect();
        Cart {
            id: row.id,
            uuid: row.uuid,
            user_id: row.user_id,
            created_at: row.created_at,
            lines,
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryDb {
    world: Arc<Mutex<World>>,
    fail_at: Arc<Mutex<Option<FailAt>>>,
    product_reads: Arc<AtomicUsize>,
    category_reads: Arc<AtomicUsize>,
    review_reads: Arc<AtomicUsize>,
}

impl MemoryDb {
    fn lock(&self) -> MutexGuard<'_, World> {
        self.world.lock().expect("world mutex poisoned")
    }

    pub fn fail_next_place_at(&self, step: FailAt) {
        *self.fail_at.lock().expect("fail mutex poisoned") = Some(step);
    }

    pub fn product_reads(&self) -> usize {
        self.product_reads.load(Ordering::SeqCst)
    }

    pub fn category_reads(&self) -> usize {
        self.category_reads.load(Ordering::SeqCst)
    }

    pub fn review_reads(&self) -> usize {
        self.review_reads.load(Ordering::SeqCst)
    }

    pub fn add_user(&self, email: &str) -> i64 {
        let mut w = self.lock();
        let id = w.id();
        w.users.insert(
            id,
            User {
                id,
                uuid: Uuid::new_v4(),
                email: email.to_string(),
                name: None,
                created_at: Utc::now(),
            },
        );
        id
    }

    pub fn add_address(&self, user_id: i64) -> i64 {
        let mut w = self.lock();
        let id = w.id();
        w.addresses.insert(
            id,
            Address {
                id,
                uuid: Uuid::new_v4(),
                user_id,
                line1: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                postal_code: "12345".to_string(),
                country: "US".to_string(),
            },
        );
        id
    }

    pub fn add_category(&self, name: &str) -> i64 {
        let mut w = self.lock();
        let id = w.id();
        let now = Utc::now();
        w.categories.insert(
            id,
            Category {
                id,
                uuid: Uuid::new_v4(),
                name: name.to_string(),
                description: None,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub fn add_product(&self, name: &str, price: &str, stock: i32) -> i64 {
        let mut w = self.lock();
        let id = w.id();
        let now = Utc::now();
        w.products.insert(
            id,
            Product {
                id,
                uuid: Uuid::new_v4(),
                name: name.to_string(),
                description: None,
                price: dec(price),
                stock,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub fn set_stock(&self, product_id: i64, stock: i32) {
        if let Some(p) = self.lock().products.get_mut(&product_id) {
            p.stock = stock;
        }
    }

    pub fn stock_of(&self, product_id: i64) -> Option<i32> {
        self.lock().products.get(&product_id).map(|p| p.stock)
    }

    pub fn rename_product(&self, product_id: i64, name: &str, price: &str) {
        if let Some(p) = self.lock().products.get_mut(&product_id) {
            p.name = name.to_string();
            p.price = dec(price);
        }
    }

    pub fn set_order_status(&self, order_id: i64, status: OrderStatus) {
        if let Some(o) = self.lock().orders.get_mut(&order_id) {
            o.status = status;
        }
    }

    pub fn order_count(&self) -> usize {
        self.lock().orders.len()
    }

    pub fn order_item_count(&self) -> usize {
        self.lock().orders.values().map(|o| o.items.len()).sum()
    }

    pub fn cart_line_count(&self, user_id: i64) -> usize {
        let w = self.lock();
        w.carts
            .values()
            .find(|c| c.user_id == user_id)
            .map_or(0, |c| w.cart_items.keys().filter(|(id, _)| *id == c.id).count())
    }

    pub fn cart_count(&self) -> usize {
        self.lock().carts.len()
    }
}

fn sorted<T, K: Ord>(mut rows: Vec<T>, order: SortOrder, key: impl Fn(&T) -> K) -> Vec<T> {
    rows.sort_by(|a, b| {
        let ord = key(a).cmp(&key(b));
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
    rows
}

fn page<T>(rows: Vec<T>, page: i64, limit: i64) -> Vec<T> {
    let skip = usize::try_from(offset(page, limit)).unwrap_or(0);
    let take = usize::try_from(limit).unwrap_or(0);
    rows.into_iter().skip(skip).take(take).collect()
}

impl ProductRepository for MemoryDb {
    fn find_by_id(&self, id: i64) -> Result<Option<Product>, DomainError> {
        self.product_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.lock().products.get(&id).cloned())
    }

    fn list(&self, filters: &ProductFilters) -> Result<(Vec<Product>, i64), DomainError> {
        self.product_reads.fetch_add(1, Ordering::SeqCst);
        let w = self.lock();
        let rows: Vec<Product> = w
            .products
            .values()
            .filter(|p| {
                filters
                    .category_id
                    .map_or(true, |c| w.product_categories.contains(&(p.id, c)))
            })
            .filter(|p| filters.min_price.as_ref().map_or(true, |m| p.price >= *m))
            .filter(|p| filters.max_price.as_ref().map_or(true, |m| p.price <= *m))
            .cloned()
            .collect();
        let total = rows.len() as i64;
        let rows = match filters.sort_by {
            ProductSort::CreatedAt => sorted(rows, filters.sort_order, |p| (p.created_at, p.id)),
            ProductSort::Price => sorted(rows, filters.sort_order, |p| p.price.clone()),
            ProductSort::Name => sorted(rows, filters.sort_order, |p| p.name.clone()),
        };
        Ok((page(rows, filters.page, filters.limit), total))
    }

    fn categories_of(
        &self,
        product_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<CategorySummary>>, DomainError> {
        let w = self.lock();
        let mut out: HashMap<i64, Vec<CategorySummary>> = HashMap::new();
        for (product_id, category_id) in &w.product_categories {
            if !product_ids.contains(product_id) {
                continue;
            }
            if let Some(c) = w.categories.get(category_id) {
                out.entry(*product_id).or_default().push(CategorySummary {
                    id: c.id,
                    name: c.name.clone(),
                });
            }
        }
        Ok(out)
    }

    fn create(&self, product: &NewProduct) -> Result<Product, DomainError> {
        let mut w = self.lock();
        if product.category_ids.iter().any(|c| !w.categories.contains_key(c)) {
            return Err(DomainError::CategoryNotFound);
        }
        let id = w.id();
        let now = Utc::now();
        let row = Product {
            id,
            uuid: Uuid::new_v4(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.clone(),
            stock: product.stock,
            created_at: now,
            updated_at: now,
        };
        w.products.insert(id, row.clone());
        for c in &product.category_ids {
            w.product_categories.insert((id, *c));
        }
        Ok(row)
    }

    fn update(&self, id: i64, changes: &ProductChanges) -> Result<Option<Product>, DomainError> {
        let mut w = self.lock();
        if let Some(ids) = &changes.category_ids {
            if ids.iter().any(|c| !w.categories.contains_key(c)) {
                return Err(DomainError::CategoryNotFound);
            }
            w.product_categories.retain(|(p, _)| *p != id);
            for c in ids {
                w.product_categories.insert((id, *c));
            }
        }
        let Some(p) = w.products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            p.name = name.clone();
        }
        if let Some(description) = &changes.description {
            p.description = Some(description.clone());
        }
        if let Some(price) = &changes.price {
            p.price = price.clone();
        }
        if let Some(stock) = changes.stock {
            p.stock = stock;
        }
        p.updated_at = Utc::now();
        Ok(Some(p.clone()))
    }

    fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let mut w = self.lock();
        w.product_categories.retain(|(p, _)| *p != id);
        w.cart_items.retain(|(_, p), _| *p != id);
        w.reviews.retain(|_, r| r.product_id != id);
        Ok(w.products.remove(&id).is_some())
    }
}

impl CategoryRepository for MemoryDb {
    fn find_by_id(&self, id: i64) -> Result<Option<CategoryView>, DomainError> {
        self.category_reads.fetch_add(1, Ordering::SeqCst);
        let w = self.lock();
        Ok(w.categories.get(&id).map(|c| category_view(&w, c)))
    }

    fn list_all(&self) -> Result<Vec<CategoryView>, DomainError> {
        self.category_reads.fetch_add(1, Ordering::SeqCst);
        let w = self.lock();
        Ok(w.categories.values().map(|c| category_view(&w, c)).collect())
    }

    fn all_exist(&self, ids: &[i64]) -> Result<bool, DomainError> {
        let w = self.lock();
        Ok(ids.iter().all(|id| w.categories.contains_key(id)))
    }

    fn create(&self, category: &NewCategory) -> Result<Category, DomainError> {
        let mut w = self.lock();
        if w.categories.values().any(|c| c.name == category.name) {
            return Err(DomainError::CategoryNameExists);
        }
        let id = w.id();
        let now = Utc::now();
        let row = Category {
            id,
            uuid: Uuid::new_v4(),
            name: category.name.clone(),
            description: category.description.clone(),
            created_at: now,
            updated_at: now,
        };
        w.categories.insert(id, row.clone());
        Ok(row)
    }

    fn update(&self, id: i64, changes: &CategoryChanges) -> Result<Option<Category>, DomainError> {
        let mut w = self.lock();
        if let Some(name) = &changes.name {
            if w.categories.values().any(|c| c.id != id && &c.name == name) {
                return Err(DomainError::CategoryNameExists);
            }
        }
        let Some(c) = w.categories.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            c.name = name.clone();
        }
        if let Some(description) = &changes.description {
            c.description = Some(description.clone());
        }
        c.updated_at = Utc::now();
        Ok(Some(c.clone()))
    }

    fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let mut w = self.lock();
        w.product_categories.retain(|(_, c)| *c != id);
        Ok(w.categories.remove(&id).is_some())
    }
}

fn category_view(w: &World, c: &Category) -> CategoryView {
    CategoryView {
        id: c.id,
        uuid: c.uuid,
        name: c.name.clone(),
        description: c.description.clone(),
        product_count: w
            .product_categories
            .iter()
            .filter(|(_, cat)| *cat == c.id)
            .count() as i64,
    }
}

impl ReviewRepository for MemoryDb {
    fn find_by_id(&self, id: i64) -> Result<Option<ReviewView>, DomainError> {
        self.review_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.lock().reviews.get(&id).cloned())
    }

    fn list(&self, filters: &ReviewFilters) -> Result<(Vec<ReviewView>, i64), DomainError> {
        self.review_reads.fetch_add(1, Ordering::SeqCst);
        let w = self.lock();
        let rows: Vec<ReviewView> = w
            .reviews
            .values()
            .filter(|r| filters.product_id.map_or(true, |p| r.product_id == p))
            .filter(|r| filters.user_id.map_or(true, |u| r.user_id == u))
            .filter(|r| filters.rating.map_or(true, |x| r.rating == x))
            .cloned()
            .collect();
        let total = rows.len() as i64;
        let rows = match filters.sort_by {
            ReviewSort::CreatedAt => sorted(rows, filters.sort_order, |r| (r.created_at, r.id)),
            ReviewSort::Rating => sorted(rows, filters.sort_order, |r| (r.rating, r.id)),
        };
        Ok((page(rows, filters.page, filters.limit), total))
    }

    fn create(&self, review: &NewReview) -> Result<ReviewView, DomainError> {
        let mut w = self.lock();
        if !w.products.contains_key(&review.product_id) {
            return Err(DomainError::ProductNotFound);
        }
        let id = w.id();
        let now = Utc::now();
        let row = ReviewView {
            id,
            uuid: Uuid::new_v4(),
            product_id: review.product_id,
            user_id: review.user_id,
            rating: review.rating,
            comment: review.comment.clone(),
            created_at: now,
            updated_at: now,
        };
        w.reviews.insert(id, row.clone());
        Ok(row)
    }

    fn update(&self, id: i64, changes: &ReviewChanges) -> Result<Option<ReviewView>, DomainError> {
        let mut w = self.lock();
        let Some(r) = w.reviews.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(rating) = changes.rating {
            r.rating = rating;
        }
        if let Some(comment) = &changes.comment {
            r.comment = Some(comment.clone());
        }
        r.updated_at = Utc::now();
        Ok(Some(r.clone()))
    }

    fn delete(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.lock().reviews.remove(&id).is_some())
    }
}

impl CartRepository for MemoryDb {
    fn find_by_user(&self, user_id: i64) -> Result<Option<Cart>, DomainError> {
        let w = self.lock();
        Ok(w.carts
            .values()
            .find(|c| c.user_id == user_id)
            .map(|row| w.cart(row)))
    }

    fn create(&self, user_id: i64) -> Result<Cart, DomainError> {
        let mut w = self.lock();
        if !w.users.contains_key(&user_id) {
            return Err(DomainError::UserNotFound);
        }
        if let Some(row) = w.carts.values().find(|c| c.user_id == user_id).cloned() {
            return Ok(w.cart(&row));
        }
        let id = w.id();
        let row = CartRow {
            id,
            uuid: Uuid::new_v4(),
            user_id,
            created_at: Utc::now(),
        };
        w.carts.insert(id, row.clone());
        Ok(w.cart(&row))
    }

    fn add_item(&self, cart_id: i64, product_id: i64, quantity: i32) -> Result<(), DomainError> {
        let mut w = self.lock();
        if !w.products.contains_key(&product_id) {
            return Err(DomainError::ProductNotFound);
        }
        if !w.carts.contains_key(&cart_id) {
            return Err(DomainError::CartNotFound);
        }
        *w.cart_items.entry((cart_id, product_id)).or_insert(0) += quantity;
        Ok(())
    }

    fn update_item(
        &self,
        cart_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> Result<bool, DomainError> {
        let mut w = self.lock();
        match w.cart_items.get_mut(&(cart_id, product_id)) {
            Some(q) => {
                *q = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_item(&self, cart_id: i64, product_id: i64) -> Result<bool, DomainError> {
        Ok(self.lock().cart_items.remove(&(cart_id, product_id)).is_some())
    }

    fn clear(&self, cart_id: i64) -> Result<(), DomainError> {
        self.lock().cart_items.retain(|(c, _), _| *c != cart_id);
        Ok(())
    }
}

fn order_matches(o: &Order, f: &OrderFilters) -> bool {
    f.status.map_or(true, |s| o.status == s)
        && f.date_from.map_or(true, |d| o.created_at >= d)
        && f.date_to.map_or(true, |d| o.created_at <= d)
        && f.min_amount.as_ref().map_or(true, |m| o.total_price >= *m)
        && f.max_amount.as_ref().map_or(true, |m| o.total_price <= *m)
}

fn order_page(rows: Vec<Order>, f: &OrderFilters) -> OrderPage {
    let total = rows.len() as i64;
    let rows = match f.sort_by {
        OrderSort::CreatedAt => sorted(rows, f.sort_order, |o| (o.created_at, o.id)),
        OrderSort::UpdatedAt => sorted(rows, f.sort_order, |o| (o.updated_at, o.id)),
        OrderSort::TotalPrice => sorted(rows, f.sort_order, |o| (o.total_price.clone(), o.id)),
        OrderSort::Status => sorted(rows, f.sort_order, |o| (o.status.as_str(), o.id)),
    };
    let items = page(rows, f.page, f.limit);
    let total_amount = items
        .iter()
        .fold(BigDecimal::from(0), |acc, o| acc + o.total_price.clone());
    OrderPage {
        items,
        total,
        total_amount,
        page: f.page,
        limit: f.limit,
    }
}

impl OrderRepository for MemoryDb {
    fn place(&self, order: PlaceOrder) -> Result<Order, DomainError> {
        let fail_at = self.fail_at.lock().expect("fail mutex poisoned").take();
        let mut guard = self.lock();
        let mut tx = guard.clone();

        let mut claimed: Vec<(i64, i32)> = tx
            .cart_items
            .iter()
            .filter(|((c, _), _)| *c == order.cart_id)
            .map(|((_, p), q)| (*p, *q))
            .collect();
        claimed.sort_unstable();
        if claimed.is_empty() {
            return Err(DomainError::CartEmpty);
        }
        if claimed != order.lines() {
            return Err(DomainError::CartChanged);
        }

        if order.policy == CheckoutPolicy::ReserveStock {
            for item in &order.items {
                match tx.products.get_mut(&item.product_id) {
                    Some(p) if p.stock >= item.quantity => p.stock -= item.quantity,
                    _ => {
                        return Err(DomainError::InsufficientStock {
                            product_id: item.product_id,
                        })
                    }
                }
            }
        }

        if fail_at == Some(FailAt::OrderHeader) {
            return Err(DomainError::Internal("injected: order header".to_string()));
        }
        let id = tx.id();
        let now = Utc::now();
        let mut placed = Order {
            id,
            uuid: Uuid::new_v4(),
            user_id: order.user_id,
            address_id: order.address_id,
            total_price: order.total_price,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            items: Vec::new(),
        };
        tx.orders.insert(id, placed.clone());

        if fail_at == Some(FailAt::OrderItems) {
            return Err(DomainError::Internal("injected: order items".to_string()));
        }
        for item in order.items {
            let item_id = tx.id();
            placed.items.push(OrderItem {
                id: item_id,
                product_id: item.product_id,
                product_name: item.product_name,
                price_at_order: item.price_at_order,
                quantity: item.quantity,
            });
        }
        tx.orders.insert(id, placed.clone());

        if fail_at == Some(FailAt::CartClear) {
            return Err(DomainError::Internal("injected: cart clear".to_string()));
        }
        tx.cart_items.retain(|(c, _), _| *c != order.cart_id);

        *guard = tx;
        Ok(placed)
    }

    fn find_by_id(&self, order_id: i64) -> Result<Option<Order>, DomainError> {
        Ok(self.lock().orders.get(&order_id).cloned())
    }

    fn find_for_user(&self, order_id: i64, user_id: i64) -> Result<Option<Order>, DomainError> {
        Ok(self
            .lock()
            .orders
            .get(&order_id)
            .filter(|o| o.user_id == user_id)
            .cloned())
    }

    fn list_for_user(
        &self,
        user_id: i64,
        filters: &OrderFilters,
    ) -> Result<OrderPage, DomainError> {
        let rows = self
            .lock()
            .orders
            .values()
            .filter(|o| o.user_id == user_id && order_matches(o, filters))
            .cloned()
            .collect();
        Ok(order_page(rows, filters))
    }

    fn list_all(&self, filters: &AdminOrderFilters) -> Result<OrderPage, DomainError> {
        let rows = self
            .lock()
            .orders
            .values()
            .filter(|o| filters.user_id.map_or(true, |u| o.user_id == u))
            .filter(|o| order_matches(o, &filters.orders))
            .cloned()
            .collect();
        Ok(order_page(rows, &filters.orders))
    }

    fn update_status(&self, order_id: i64, status: OrderStatus) -> Result<bool, DomainError> {
        let mut w = self.lock();
        match w.orders.get_mut(&order_id) {
            Some(o) => {
                o.status = status;
                o.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn cancel(&self, order_id: i64, user_id: Option<i64>) -> Result<bool, DomainError> {
        let mut w = self.lock();
        match w.orders.get_mut(&order_id) {
            Some(o) if o.status.is_cancellable() && user_id.map_or(true, |u| o.user_id == u) => {
                o.status = OrderStatus::Cancelled;
                o.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl UserDirectory for MemoryDb {
    fn find_user(&self, id: i64) -> Result<Option<User>, DomainError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    fn find_address(&self, id: i64) -> Result<Option<Address>, DomainError> {
        Ok(self.lock().addresses.get(&id).cloned())
    }
}
