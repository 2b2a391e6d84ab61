use std::collections::BTreeSet;

use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};
use tracing::instrument;

use crate::entity::{hackathon, register, user, user_email};
use crate::models::hackathon::HackathonStat;

/// Read-side access to hackathons and their attendance numbers.
///
/// Built once in `main` over the shared pool and handed to handlers through
/// `AppState`; every call checks a connection out of the pool for its own
/// queries.
#[derive(Clone)]
pub struct HackathonManager {
    db: DatabaseConnection,
}

impl HackathonManager {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_hackathon_by_name(
        &self,
        name: &str,
    ) -> Result<Option<hackathon::Model>, DbErr> {
        hackathon::Entity::find()
            .filter(hackathon::Column::Name.eq(name))
            .one(&self.db)
            .await
    }

    pub async fn get_hackathon_by_id(&self, id: i32) -> Result<Option<hackathon::Model>, DbErr> {
        hackathon::Entity::find_by_id(id).one(&self.db).await
    }

    /// Count enabled registrations and split them into online and offline.
    ///
    /// A registration is online when its email maps through `user_email` to a
    /// row still present in `user`. The second step is set-based: a user
    /// counts once, however many registration rows or emails point at them.
    /// The two reads are not wrapped in a transaction.
    #[instrument(skip(self))]
    pub async fn get_hackathon_stat(&self, hackathon_id: i32) -> Result<HackathonStat, DbErr> {
        let reg_email_list: Vec<String> = register::Entity::find()
            .filter(register::Column::HackathonId.eq(hackathon_id))
            .filter(register::Column::Enabled.eq(true))
            .select_only()
            .column(register::Column::Email)
            .into_tuple()
            .all(&self.db)
            .await?;

        let reg_count = reg_email_list.len() as u64;
        if reg_count == 0 {
            return Ok(HackathonStat::empty(hackathon_id));
        }

        // Membership only; duplicates add nothing to an IN list.
        let emails: BTreeSet<String> = reg_email_list.into_iter().collect();

        let user_ids: BTreeSet<i32> = user_email::Entity::find()
            .filter(user_email::Column::Email.is_in(emails))
            .select_only()
            .column(user_email::Column::UserId)
            .into_tuple::<i32>()
            .all(&self.db)
            .await?
            .into_iter()
            .collect();

        let online_count = if user_ids.is_empty() {
            0
        } else {
            user::Entity::find()
                .filter(user::Column::Id.is_in(user_ids))
                .count(&self.db)
                .await?
        };

        tracing::debug!(reg_count, online_count, "Computed hackathon stat");
        Ok(HackathonStat::from_counts(
            hackathon_id,
            reg_count,
            online_count,
        ))
    }
}
