use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

use crate::{entities::actor, error::AppResult, models::Actor};

#[derive(Clone)]
pub struct ActorRepo {
    db: DatabaseConnection,
}

impl ActorRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, name: &str) -> AppResult<Actor> {
        let row = actor::ActiveModel {
            id: Default::default(),
            name: Set(name.to_string()),
        }
        .insert(&self.db)
        .await?;

        tracing::debug!(actor_id = row.id, "actor created");
        Ok(row.into())
    }

    /// All actors in insertion (id) order.
    pub async fn list(&self) -> AppResult<Vec<Actor>> {
        let rows = actor::Entity::find()
            .order_by_asc(actor::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Actor::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    #[tokio::test]
    async fn create_assigns_increasing_ids() {
        let repo = ActorRepo::new(test_db().await);

        let a = repo.create("Tom Hanks").await.unwrap();
        let b = repo.create("Helen Hunt").await.unwrap();

        assert_eq!(a, Actor { id: 1, name: "Tom Hanks".into() });
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn list_keeps_insertion_order_and_duplicate_names() {
        let repo = ActorRepo::new(test_db().await);
        assert!(repo.list().await.unwrap().is_empty());

        repo.create("Tom Hanks").await.unwrap();
        repo.create("Helen Hunt").await.unwrap();
        repo.create("Tom Hanks").await.unwrap();

        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|a| a.name).collect();
        assert_eq!(names, ["Tom Hanks", "Helen Hunt", "Tom Hanks"]);
    }
}
