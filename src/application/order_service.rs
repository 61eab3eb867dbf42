use crate::domain::errors::DomainError;
use crate::domain::filters::{AdminOrderFilters, OrderFilters};
use crate::domain::order::{Order, OrderPage, OrderStatus};
use crate::domain::ports::OrderRepository;

/// Order queries and the status lifecycle.
///
/// Cancellation is enforced by the repository's conditional write, not by
/// the read that precedes it; the read only picks the error to report when
/// the order is plainly ineligible.
pub struct OrderService<R> {
    repo: R,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_user_orders(
        &self,
        user_id: i64,
        filters: OrderFilters,
    ) -> Result<OrderPage, DomainError> {
        let filters = filters.normalized();
        check_ranges(&filters)?;
        self.repo.list_for_user(user_id, &filters)
    }

    /// Orders owned by someone else are reported as missing.
    pub fn get_order(&self, user_id: i64, order_id: i64) -> Result<Order, DomainError> {
        self.repo
            .find_for_user(order_id, user_id)?
            .ok_or(DomainError::OrderNotFound)
    }

    pub fn cancel_order(&self, user_id: i64, order_id: i64) -> Result<Order, DomainError> {
        let order = self.get_order(user_id, order_id)?;
        ensure_cancellable(order.status)?;

        if !self.repo.cancel(order_id, Some(user_id))? {
            return Err(self.explain_lost_cancel(order_id));
        }
        log::info!("User {} cancelled order {}", user_id, order_id);
        self.get_order(user_id, order_id)
    }

    pub fn list_all_orders(&self, filters: AdminOrderFilters) -> Result<OrderPage, DomainError> {
        let filters = filters.normalized();
        check_ranges(&filters.orders)?;
        self.repo.list_all(&filters)
    }

    /// Administrative override. Any known status may be written, except
    /// that `cancelled` goes through the same guarded write as a user
    /// cancel so shipped or delivered orders cannot be cancelled.
    pub fn update_status(&self, order_id: i64, status: &str) -> Result<Order, DomainError> {
        let status: OrderStatus = status.parse()?;

        if status == OrderStatus::Cancelled {
            let order = self
                .repo
                .find_by_id(order_id)?
                .ok_or(DomainError::OrderNotFound)?;
            ensure_cancellable(order.status)?;
            if !self.repo.cancel(order_id, None)? {
                return Err(self.explain_lost_cancel(order_id));
            }
        } else if !self.repo.update_status(order_id, status)? {
            return Err(DomainError::OrderNotFound);
        }

        log::info!("Order {} set to {} by admin", order_id, status);
        self.repo
            .find_by_id(order_id)?
            .ok_or(DomainError::OrderNotFound)
    }

    /// The conditional cancel matched nothing: someone else moved the
    /// order first. Re-read it to say what happened.
    fn explain_lost_cancel(&self, order_id: i64) -> DomainError {
        match self.repo.find_by_id(order_id) {
            Ok(Some(order)) if order.status == OrderStatus::Cancelled => {
                DomainError::OrderAlreadyCancelled
            }
            Ok(Some(_)) => DomainError::OrderCannotBeCancelled,
            Ok(None) => DomainError::OrderNotFound,
            Err(e) => e,
        }
    }
}

fn ensure_cancellable(status: OrderStatus) -> Result<(), DomainError> {
    match status {
        OrderStatus::Cancelled => Err(DomainError::OrderAlreadyCancelled),
        s if !s.is_cancellable() => Err(DomainError::OrderCannotBeCancelled),
        _ => Ok(()),
    }
}

fn check_ranges(filters: &OrderFilters) -> Result<(), DomainError> {
    if let (Some(from), Some(to)) = (filters.date_from, filters.date_to) {
        if from > to {
            return Err(DomainError::InvalidOrderData(
                "date_from must not be after date_to".to_string(),
            ));
        }
    }
    if let (Some(min), Some(max)) = (&filters.min_amount, &filters.max_amount) {
        if min > max {
            return Err(DomainError::InvalidOrderData(
                "min_amount must not exceed max_amount".to_string(),
            ));
        }
    }
    Ok(())
}
