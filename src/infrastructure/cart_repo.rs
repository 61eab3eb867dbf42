use diesel::prelude::*;
use diesel::upsert::excluded;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::{Cart, CartLine};
use crate::domain::catalog::Product;
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;
use crate::schema::{cart_items, carts, products};

use super::models::{CartItemRow, CartRow, NewCartRow, ProductRow};
use super::on_constraint;

#[derive(Clone)]
pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn load_cart(conn: &mut PgConnection, user_id: i64) -> Result<Option<Cart>, DomainError> {
    let cart: Option<CartRow> = carts::table
        .filter(carts::user_id.eq(user_id))
        .select(CartRow::as_select())
        .first(conn)
        .optional()?;
    let Some(cart) = cart else {
        return Ok(None);
    };

    let lines: Vec<(i32, ProductRow)> = cart_items::table
        .inner_join(products::table)
        .filter(cart_items::cart_id.eq(cart.id))
        .order(cart_items::product_id.asc())
        .select((cart_items::quantity, ProductRow::as_select()))
        .load(conn)?;

    Ok(Some(Cart {
        id: cart.id,
        uuid: cart.uuid,
        user_id: cart.user_id,
        created_at: cart.created_at,
        lines: lines
            .into_iter()
            .map(|(quantity, product)| CartLine {
                product: Product::from(product),
                quantity,
            })
            .collect(),
    }))
}

fn missing_parent(constraint: &str) -> Option<DomainError> {
    match constraint {
        "carts_user_id_fkey" => Some(DomainError::UserNotFound),
        "cart_items_cart_id_fkey" => Some(DomainError::CartNotFound),
        "cart_items_product_id_fkey" => Some(DomainError::ProductNotFound),
        _ => None,
    }
}

impl CartRepository for DieselCartRepository {
    fn find_by_user(&self, user_id: i64) -> Result<Option<Cart>, DomainError> {
        let mut conn = self.pool.get()?;
        load_cart(&mut conn, user_id)
    }

    fn create(&self, user_id: i64) -> Result<Cart, DomainError> {
        let mut conn = self.pool.get()?;
        // A concurrent first touch may win the insert; read back whichever row exists.
        diesel::insert_into(carts::table)
            .values(&NewCartRow {
                uuid: Uuid::new_v4(),
                user_id,
            })
            .on_conflict(carts::user_id)
            .do_nothing()
            .execute(&mut conn)
            .map_err(|e| on_constraint(e, missing_parent))?;

        load_cart(&mut conn, user_id)?
            .ok_or_else(|| DomainError::Internal(format!("cart for user {user_id} vanished")))
    }

    fn add_item(&self, cart_id: i64, product_id: i64, quantity: i32) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::insert_into(cart_items::table)
            .values(&CartItemRow {
                cart_id,
                product_id,
                quantity,
            })
            .on_conflict((cart_items::cart_id, cart_items::product_id))
            .do_update()
            .set(cart_items::quantity.eq(cart_items::quantity + excluded(cart_items::quantity)))
            .execute(&mut conn)
            .map_err(|e| on_constraint(e, missing_parent))?;
        Ok(())
    }

    fn update_item(
        &self,
        cart_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let updated = diesel::update(cart_items::table.find((cart_id, product_id)))
            .set(cart_items::quantity.eq(quantity))
            .execute(&mut conn)?;
        Ok(updated > 0)
    }

    fn remove_item(&self, cart_id: i64, product_id: i64) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted =
            diesel::delete(cart_items::table.find((cart_id, product_id))).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn clear(&self, cart_id: i64) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(cart_id)))
            .execute(&mut conn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::test_db::{insert_category, insert_product, insert_user, setup_db};

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn create_is_idempotent_per_user() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCartRepository::new(pool.clone());
        let user = insert_user(&pool, "ann@example.com");

        let first = repo.create(user).expect("create");
        let second = repo.create(user).expect("create");

        assert_eq!(first.id, second.id);
        assert!(matches!(repo.create(9_999), Err(DomainError::UserNotFound)));
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn add_item_upserts_additively() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCartRepository::new(pool.clone());
        let user = insert_user(&pool, "ann@example.com");
        let cat = insert_category(&pool, "Home");
        let lamp = insert_product(&pool, "Lamp", "10.00", 10, cat);
        let cart = repo.create(user).expect("create");

        repo.add_item(cart.id, lamp, 2).expect("add");
        repo.add_item(cart.id, lamp, 3).expect("add");

        let cart = repo.find_by_user(user).expect("find").expect("cart");
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 5);
        assert_eq!(cart.lines[0].product.name, "Lamp");
        assert!(matches!(
            repo.add_item(cart.id, 9_999, 1),
            Err(DomainError::ProductNotFound)
        ));
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn update_and_remove_report_missing_lines() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCartRepository::new(pool.clone());
        let user = insert_user(&pool, "ann@example.com");
        let cat = insert_category(&pool, "Home");
        let lamp = insert_product(&pool, "Lamp", "10.00", 10, cat);
        let cart = repo.create(user).expect("create");

        assert!(!repo.update_item(cart.id, lamp, 1).expect("update"));
        repo.add_item(cart.id, lamp, 1).expect("add");
        assert!(repo.update_item(cart.id, lamp, 4).expect("update"));
        assert!(repo.remove_item(cart.id, lamp).expect("remove"));
        assert!(!repo.remove_item(cart.id, lamp).expect("remove"));

        repo.add_item(cart.id, lamp, 1).expect("add");
        repo.clear(cart.id).expect("clear");
        repo.clear(cart.id).expect("clear twice");
        assert!(repo.find_by_user(user).expect("find").expect("cart").is_empty());
    }
}
