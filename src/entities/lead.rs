use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::names::ContactName;

/// A prospective contact. Conversion terminally mutates the row (status
/// `converted` plus the marker pair); converted leads are never deleted by the
/// conversion itself.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "leads")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Derived display name; kept in sync with the parts on every write.
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: String,
    pub source: Option<String>,
    pub brand: Option<String>,
    pub notes: Option<String>,
    /// Once true, `converted_customer_id` is set and both are immutable.
    pub converted_to_customer: bool,
    pub converted_customer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}

impl ContactName for Model {
    fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }
    fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }
    fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
    fn set_display_name(&mut self, name: String) {
        self.name = Some(name);
    }
}
