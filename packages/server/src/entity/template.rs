use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const PROVIDER_DOCKER: &str = "docker";
pub const PROVIDER_K8S: &str = "k8s";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "template")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
    pub description: String,

    /// One of: docker, k8s
    pub provider: String,
    /// Set when `provider` is docker.
    pub image: Option<String>,
    /// Set when `provider` is k8s.
    #[sea_orm(column_type = "Text", nullable)]
    pub yaml_template: Option<String>,

    pub creator_id: i32,
    #[sea_orm(belongs_to, from = "creator_id", to = "id")]
    pub creator: HasOne<super::user::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
