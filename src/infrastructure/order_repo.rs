use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::filters::{offset, AdminOrderFilters, OrderFilters, OrderSort, SortOrder};
use crate::domain::order::{CheckoutPolicy, Order, OrderPage, OrderStatus, PlaceOrder};
use crate::domain::ports::OrderRepository;
use crate::schema::{cart_items, order_items, orders, products};

use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow};

#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn cancellable_statuses() -> [&'static str; 2] {
    OrderStatus::CANCELLABLE.map(OrderStatus::as_str)
}

fn filtered(user_id: Option<i64>, filters: &OrderFilters) -> orders::BoxedQuery<'static, Pg> {
    let mut query = orders::table.into_boxed();
    if let Some(user_id) = user_id {
        query = query.filter(orders::user_id.eq(user_id));
    }
    if let Some(status) = filters.status {
        query = query.filter(orders::status.eq(status.as_str()));
    }
    if let Some(from) = filters.date_from {
        query = query.filter(orders::created_at.ge(from));
    }
    if let Some(to) = filters.date_to {
        query = query.filter(orders::created_at.le(to));
    }
    if let Some(min) = &filters.min_amount {
        query = query.filter(orders::total_price.ge(min.clone()));
    }
    if let Some(max) = &filters.max_amount {
        query = query.filter(orders::total_price.le(max.clone()));
    }
    query
}

fn with_items(conn: &mut PgConnection, rows: Vec<OrderRow>) -> Result<Vec<Order>, DomainError> {
    let items: Vec<Vec<OrderItemRow>> = OrderItemRow::belonging_to(&rows)
        .select(OrderItemRow::as_select())
        .order(order_items::id.asc())
        .load(conn)?
        .grouped_by(&rows);
    rows.into_iter()
        .zip(items)
        .map(|(order, items)| order.into_order(items))
        .collect()
}

fn load_one(
    conn: &mut PgConnection,
    query: orders::BoxedQuery<'static, Pg>,
) -> Result<Option<Order>, DomainError> {
    let row: Option<OrderRow> = query
        .select(OrderRow::as_select())
        .first(conn)
        .optional()?;
    match row {
        Some(row) => Ok(with_items(conn, vec![row])?.pop()),
        None => Ok(None),
    }
}

fn page(
    conn: &mut PgConnection,
    user_id: Option<i64>,
    filters: &OrderFilters,
) -> Result<OrderPage, DomainError> {
    let total: i64 = filtered(user_id, filters).count().get_result(conn)?;

    let query = filtered(user_id, filters).select(OrderRow::as_select());
    let query = match (filters.sort_by, filters.sort_order) {
        (OrderSort::CreatedAt, SortOrder::Asc) => {
            query.order((orders::created_at.asc(), orders::id.asc()))
        }
        (OrderSort::CreatedAt, SortOrder::Desc) => {
            query.order((orders::created_at.desc(), orders::id.desc()))
        }
        (OrderSort::UpdatedAt, SortOrder::Asc) => {
            query.order((orders::updated_at.asc(), orders::id.asc()))
        }
        (OrderSort::UpdatedAt, SortOrder::Desc) => {
            query.order((orders::updated_at.desc(), orders::id.desc()))
        }
        (OrderSort::TotalPrice, SortOrder::Asc) => {
            query.order((orders::total_price.asc(), orders::id.asc()))
        }
        (OrderSort::TotalPrice, SortOrder::Desc) => {
            query.order((orders::total_price.desc(), orders::id.desc()))
        }
        (OrderSort::Status, SortOrder::Asc) => query.order((orders::status.asc(), orders::id.asc())),
        (OrderSort::Status, SortOrder::Desc) => {
            query.order((orders::status.desc(), orders::id.desc()))
        }
    };
    let rows: Vec<OrderRow> = query
        .limit(filters.limit)
        .offset(offset(filters.page, filters.limit))
        .load(conn)?;

    let items = with_items(conn, rows)?;
    let total_amount = items
        .iter()
        .fold(BigDecimal::from(0), |acc, order| acc + &order.total_price);

    Ok(OrderPage {
        items,
        total,
        total_amount,
        page: filters.page,
        limit: filters.limit,
    })
}

impl OrderRepository for DieselOrderRepository {
    fn place(&self, order: PlaceOrder) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let lines = order.lines();

            // 1. Claim the cart. The deleted rows stay locked until commit, so
            //    a concurrent checkout of the same cart finds nothing left.
            let mut claimed: Vec<(i64, i32)> = diesel::delete(
                cart_items::table.filter(cart_items::cart_id.eq(order.cart_id)),
            )
            .returning((cart_items::product_id, cart_items::quantity))
            .get_results(conn)?;
            claimed.sort_unstable();
            if claimed.is_empty() {
                return Err(DomainError::CartEmpty);
            }
            if claimed != lines {
                return Err(DomainError::CartChanged);
            }

            // 2. Reserve stock, in product id order so concurrent checkouts
            //    lock rows in the same sequence.
            if order.policy == CheckoutPolicy::ReserveStock {
                let now = Utc::now();
                for &(product_id, quantity) in &lines {
                    let reserved = diesel::update(
                        products::table
                            .filter(products::id.eq(product_id))
                            .filter(products::stock.ge(quantity)),
                    )
                    .set((
                        products::stock.eq(products::stock - quantity),
                        products::updated_at.eq(now),
                    ))
                    .execute(conn)?;
                    if reserved == 0 {
                        return Err(DomainError::InsufficientStock { product_id });
                    }
                }
            }

            // 3. Order header
            let header: OrderRow = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    uuid: Uuid::new_v4(),
                    user_id: order.user_id,
                    address_id: order.address_id,
                    total_price: &order.total_price,
                    status: OrderStatus::Pending.as_str(),
                })
                .returning(OrderRow::as_returning())
                .get_result(conn)?;

            // 4. Price snapshot items
            let new_items: Vec<NewOrderItemRow> = order
                .items
                .iter()
                .map(|item| NewOrderItemRow {
                    order_id: header.id,
                    product_id: item.product_id,
                    product_name: &item.product_name,
                    price_at_order: &item.price_at_order,
                    quantity: item.quantity,
                })
                .collect();
            let items: Vec<OrderItemRow> = diesel::insert_into(order_items::table)
                .values(&new_items)
                .returning(OrderItemRow::as_returning())
                .get_results(conn)?;

            header.into_order(items)
        })
    }

    fn find_by_id(&self, order_id: i64) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;
        load_one(
            &mut conn,
            orders::table.filter(orders::id.eq(order_id)).into_boxed(),
        )
    }

    fn find_for_user(&self, order_id: i64, user_id: i64) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;
        load_one(
            &mut conn,
            orders::table
                .filter(orders::id.eq(order_id))
                .filter(orders::user_id.eq(user_id))
                .into_boxed(),
        )
    }

    fn list_for_user(
        &self,
        user_id: i64,
        filters: &OrderFilters,
    ) -> Result<OrderPage, DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| page(conn, Some(user_id), filters))
    }

    fn list_all(&self, filters: &AdminOrderFilters) -> Result<OrderPage, DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| page(conn, filters.user_id, &filters.orders))
    }

    fn update_status(&self, order_id: i64, status: OrderStatus) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let updated = diesel::update(orders::table.find(order_id))
            .set((
                orders::status.eq(status.as_str()),
                orders::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;
        Ok(updated > 0)
    }

    fn cancel(&self, order_id: i64, user_id: Option<i64>) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let changes = (
            orders::status.eq(OrderStatus::Cancelled.as_str()),
            orders::updated_at.eq(Utc::now()),
        );
        let eligible = orders::table
            .filter(orders::id.eq(order_id))
            .filter(orders::status.eq_any(cancellable_statuses()));

        let updated = match user_id {
            Some(user_id) => diesel::update(eligible.filter(orders::user_id.eq(user_id)))
                .set(changes)
                .execute(&mut conn)?,
            None => diesel::update(eligible).set(changes).execute(&mut conn)?,
        };
        Ok(updated > 0)
    }
}
