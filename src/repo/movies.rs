use std::collections::{BTreeMap, BTreeSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::{
    entities::{actor, movie, movie_actor},
    error::AppResult,
    models::{Actor, Movie, MovieInput, MovieWithActors},
};

/// Bind parameters per statement, under SQLite's 999 floor for older builds.
const MAX_BINDS: usize = 900;

/// Movies and their actor links.
///
/// Every write runs in a single transaction so readers never see a movie row
/// without its links, or an update with its old links removed but the new ones
/// not yet inserted. Multi-query reads also share one transaction to get a
/// consistent snapshot.
#[derive(Clone)]
pub struct MovieRepo {
    db: DatabaseConnection,
}

impl MovieRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts the movie and one link per supplied actor id. Ids are not checked
    /// against `actors`; unknown ones are dropped when the movie is read.
    pub async fn create(&self, input: MovieInput) -> AppResult<Movie> {
        let txn = self.db.begin().await?;

        let row = columns(&input).insert(&txn).await?;
        insert_links(&txn, row.id, &input.actor_ids).await?;

        txn.commit().await?;

        tracing::debug!(movie_id = row.id, actor_count = input.actor_ids.len(), "movie created");
        Ok(input.into_movie(row.id))
    }

    /// Overwrites the movie columns and replaces its links. A missing id is not
    /// an error: zero rows are updated and the links for that id are still
    /// rewritten.
    pub async fn update(&self, movie_id: i64, input: MovieInput) -> AppResult<Movie> {
        let txn = self.db.begin().await?;

        let updated = movie::Entity::update_many()
            .set(columns(&input))
            .filter(movie::Column::Id.eq(movie_id))
            .exec(&txn)
            .await?;
        delete_links(&txn, movie_id).await?;
        insert_links(&txn, movie_id, &input.actor_ids).await?;

        txn.commit().await?;

        tracing::debug!(
            movie_id,
            rows = updated.rows_affected,
            actor_count = input.actor_ids.len(),
            "movie updated"
        );
        Ok(input.into_movie(movie_id))
    }

    pub async fn list(&self) -> AppResult<Vec<MovieWithActors>> {
        let txn = self.db.begin().await?;

        let rows = movie::Entity::find()
            .order_by_asc(movie::Column::Id)
            .find_with_related(movie_actor::Entity)
            .all(&txn)
            .await?;

        let linked: Vec<(movie::Model, BTreeSet<i64>)> = rows
            .into_iter()
            .map(|(m, links)| (m, links.into_iter().map(|l| l.actor_id).collect()))
            .collect();
        let wanted: BTreeSet<i64> =
            linked.iter().flat_map(|(_, ids)| ids.iter().copied()).collect();
        let found = lookup_actors(&txn, &wanted).await?;

        txn.commit().await?;

        Ok(linked
            .into_iter()
            .map(|(m, ids)| MovieWithActors::from_model(m, pick(&found, &ids)))
            .collect())
    }

    /// `None` when no movie has this id.
    pub async fn get(&self, movie_id: i64) -> AppResult<Option<MovieWithActors>> {
        let txn = self.db.begin().await?;

        let movie = match movie::Entity::find_by_id(movie_id).one(&txn).await? {
            Some(m) => {
                let ids: BTreeSet<i64> = m
                    .find_related(movie_actor::Entity)
                    .all(&txn)
                    .await?
                    .into_iter()
                    .map(|l| l.actor_id)
                    .collect();
                let found = lookup_actors(&txn, &ids).await?;
                Some(MovieWithActors::from_model(m, pick(&found, &ids)))
            }
            None => None,
        };

        txn.commit().await?;
        Ok(movie)
    }

    /// Removes the movie and its links. Deleting an unknown id is a no-op.
    pub async fn delete(&self, movie_id: i64) -> AppResult<()> {
        let txn = self.db.begin().await?;

        let res = movie::Entity::delete_by_id(movie_id).exec(&txn).await?;
        delete_links(&txn, movie_id).await?;

        txn.commit().await?;

        tracing::debug!(movie_id, rows = res.rows_affected, "movie deleted");
        Ok(())
    }

    /// Removes every movie and every link. Actors are kept.
    pub async fn delete_all(&self) -> AppResult<()> {
        let txn = self.db.begin().await?;

        let res = movie::Entity::delete_many().exec(&txn).await?;
        movie_actor::Entity::delete_many().exec(&txn).await?;

        txn.commit().await?;

        tracing::debug!(rows = res.rows_affected, "all movies deleted");
        Ok(())
    }
}

fn columns(input: &MovieInput) -> movie::ActiveModel {
    movie::ActiveModel {
        id: Default::default(),
        title: Set(input.title.clone()),
        year: Set(Some(input.year.clone())),
        director: Set(Some(input.director.clone())),
        description: Set(Some(input.description.clone())),
    }
}

async fn insert_links(txn: &DatabaseTransaction, movie_id: i64, actor_ids: &[i64]) -> AppResult<()> {
    // two binds per link
    for chunk in actor_ids.chunks(MAX_BINDS / 2) {
        let links = chunk.iter().map(|&actor_id| movie_actor::ActiveModel {
            movie_id: Set(movie_id),
            actor_id: Set(actor_id),
        });
        movie_actor::Entity::insert_many(links).exec_without_returning(txn).await?;
    }
    Ok(())
}

async fn delete_links(txn: &DatabaseTransaction, movie_id: i64) -> AppResult<()> {
    movie_actor::Entity::delete_many()
        .filter(movie_actor::Column::MovieId.eq(movie_id))
        .exec(txn)
        .await?;
    Ok(())
}

/// Resolves actor ids with one `IN` lookup per [`MAX_BINDS`] ids. Ids with no
/// row are simply absent from the result.
async fn lookup_actors<C: ConnectionTrait>(
    conn: &C,
    ids: &BTreeSet<i64>,
) -> AppResult<BTreeMap<i64, Actor>> {
    let ids: Vec<i64> = ids.iter().copied().collect();
    let mut found = BTreeMap::new();

    for chunk in ids.chunks(MAX_BINDS) {
        let rows = actor::Entity::find()
            .filter(actor::Column::Id.is_in(chunk.iter().copied()))
            .all(conn)
            .await?;
        found.extend(rows.into_iter().map(|a| (a.id, Actor::from(a))));
    }
    Ok(found)
}

fn pick(found: &BTreeMap<i64, Actor>, ids: &BTreeSet<i64>) -> Vec<Actor> {
    ids.iter().filter_map(|id| found.get(id).cloned()).collect()
}
