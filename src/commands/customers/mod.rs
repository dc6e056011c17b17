pub mod convert_customer_to_lead_command;
pub mod create_customer_command;

pub use convert_customer_to_lead_command::{
    ConvertCustomerToLeadCommand, ConvertCustomerToLeadResult,
};
pub use create_customer_command::CreateCustomerCommand;
