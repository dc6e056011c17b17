pub mod convert_lead_command;
pub mod create_lead_command;

pub use convert_lead_command::{ConvertLeadCommand, ConvertLeadResult};
pub use create_lead_command::CreateLeadCommand;
