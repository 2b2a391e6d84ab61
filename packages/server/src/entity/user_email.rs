use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Maps an email address to an account.
///
/// `user_id` is not a foreign key. A row may outlive the account it points
/// at; attendance statistics only count ids still present in `user`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_email")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    /// Trimmed and lower-cased.
    #[sea_orm(unique)]
    pub email: String,
    pub primary_email: bool,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
