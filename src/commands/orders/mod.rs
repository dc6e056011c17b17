pub mod create_order_command;
pub mod update_order_status_command;
pub mod update_payment_status_command;

pub use create_order_command::{CreateOrderCommand, CreateOrderItem, CreateOrderResult};
pub use update_order_status_command::UpdateOrderStatusCommand;
pub use update_payment_status_command::UpdatePaymentStatusCommand;
