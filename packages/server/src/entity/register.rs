use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A registration of an email address to a hackathon.
///
/// The email does not have to belong to any account: organisers may enter
/// contestants who never signed in online.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "register")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub hackathon_id: i32,
    #[sea_orm(belongs_to, from = "hackathon_id", to = "id")]
    pub hackathon: HasOne<super::hackathon::Entity>,

    /// Trimmed and lower-cased.
    pub email: String,
    pub enabled: bool,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
