use crate::db_types::UserId;

/// Who is asking to move an order through fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentActor {
    /// Admins may fulfil any order.
    Admin,
    /// Sellers may only fulfil orders that contain at least one of their products.
    Seller(UserId),
}
