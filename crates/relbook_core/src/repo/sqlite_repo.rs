//! SQLite-backed persisted store.
//!
//! # Responsibility
//! - Map the generic collections onto the schema's migrated tables.
//! - Run every write as one `IMMEDIATE` transaction.
//!
//! # Invariants
//! - Insertion order is the `seq` column; `id` is the caller's key.
//! - Back-references are the link rows themselves, so a committed link is
//!   visible from both endpoints at once.
//! - Multi-statement reads run in one deferred transaction (one snapshot).

use crate::db::migrations::{current_version, latest_version};
use crate::model::entity::{Entity, EntityId, Link};
use crate::model::schema::{Collection, EntityKind, Schema};
use crate::repo::binder::{bind_entity, bind_link};
use crate::repo::{
    EntityListQuery, EntityRepository, LinkListQuery, RepoError, RepoResult, WriteScope,
};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::marker::PhantomData;

/// Persisted store for one schema over a migrated connection.
///
/// A connection is single-threaded; concurrent callers open one connection
/// each on the same file and serialize through SQLite's write lock.
pub struct SqliteEntityRepository<'conn, S: Schema> {
    conn: &'conn Connection,
    _schema: PhantomData<fn() -> S>,
}

impl<'conn, S: Schema> SqliteEntityRepository<'conn, S> {
    /// Wraps a connection after checking schema version and tables.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready::<S>(conn)?;
        Ok(Self {
            conn,
            _schema: PhantomData,
        })
    }

    fn write_scope(&self) -> RepoResult<SqliteScope<'_, S>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        Ok(SqliteScope {
            tx,
            _schema: PhantomData,
        })
    }
}

struct SqliteScope<'conn, S: Schema> {
    tx: Transaction<'conn>,
    _schema: PhantomData<fn() -> S>,
}

impl<S: Schema> SqliteScope<'_, S> {
    fn commit(self) -> RepoResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}

impl<S: Schema> WriteScope for SqliteScope<'_, S> {
    fn contains(&self, collection: Collection, id: EntityId) -> RepoResult<bool> {
        let exists: i64 = self.tx.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1);",
                S::table(collection)
            ),
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn insert_entity(&mut self, kind: EntityKind, entity: &Entity) -> RepoResult<()> {
        self.tx.execute(
            &format!(
                "INSERT INTO {} (id, name) VALUES (?1, ?2);",
                S::table(kind.into())
            ),
            params![entity.id, entity.name.as_str()],
        )?;
        Ok(())
    }

    fn insert_link(&mut self, link: &Link) -> RepoResult<()> {
        if S::LINK_TEXT {
            self.tx.execute(
                &format!(
                    "INSERT INTO {} (id, parent_id, child_id, text) VALUES (?1, ?2, ?3, ?4);",
                    S::LINK_TABLE
                ),
                params![link.id, link.parent_id, link.child_id, link.text.as_deref()],
            )?;
        } else {
            self.tx.execute(
                &format!(
                    "INSERT INTO {} (id, parent_id, child_id) VALUES (?1, ?2, ?3);",
                    S::LINK_TABLE
                ),
                params![link.id, link.parent_id, link.child_id],
            )?;
        }
        Ok(())
    }
}

impl<S: Schema> EntityRepository for SqliteEntityRepository<'_, S> {
    type Schema = S;

    fn create_entity(&self, kind: EntityKind, entity: &Entity) -> RepoResult<Entity> {
        let mut scope = self.write_scope()?;
        let stored = bind_entity(&mut scope, kind, entity)?;
        scope.commit()?;
        debug!(
            "event=entity_insert module=sqlite_repo schema={} collection={} id={}",
            S::KEY,
            S::label(kind.into()),
            stored.id
        );
        Ok(stored)
    }

    fn create_link(&self, link: &Link) -> RepoResult<Link> {
        let mut scope = self.write_scope()?;
        let stored = bind_link::<S, _>(&mut scope, link)?;
        scope.commit()?;
        debug!(
            "event=link_insert module=sqlite_repo schema={} id={} parent_id={} child_id={}",
            S::KEY,
            stored.id,
            stored.parent_id,
            stored.child_id
        );
        Ok(stored)
    }

    fn get_entity(&self, kind: EntityKind, id: EntityId) -> RepoResult<Option<Entity>> {
        load_entity::<S>(self.conn, kind, id)
    }

    fn get_link(&self, id: EntityId) -> RepoResult<Option<Link>> {
        let link = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE id = ?1;",
                    link_columns::<S>(),
                    S::LINK_TABLE
                ),
                [id],
                parse_link_row::<S>,
            )
            .optional()?;
        Ok(link)
    }

    fn list_entities(
        &self,
        kind: EntityKind,
        query: &EntityListQuery,
    ) -> RepoResult<Vec<Entity>> {
        let mut sql = format!("SELECT id, name FROM {}", S::table(kind.into()));
        let mut bind_values: Vec<Value> = Vec::new();
        push_window(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            entities.push(parse_entity_row(row)?);
        }
        Ok(entities)
    }

    fn list_links(&self, query: &LinkListQuery) -> RepoResult<Vec<Link>> {
        let mut sql = format!(
            "SELECT {} FROM {} WHERE 1 = 1",
            link_columns::<S>(),
            S::LINK_TABLE
        );
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(parent_id) = query.parent_id {
            sql.push_str(" AND parent_id = ?");
            bind_values.push(Value::Integer(parent_id));
        }
        if let Some(child_id) = query.child_id {
            sql.push_str(" AND child_id = ?");
            bind_values.push(Value::Integer(child_id));
        }
        push_window(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut links = Vec::new();
        while let Some(row) = rows.next()? {
            links.push(parse_link_row::<S>(row)?);
        }
        Ok(links)
    }

    fn entity_with_links(
        &self,
        kind: EntityKind,
        id: EntityId,
    ) -> RepoResult<Option<(Entity, Vec<Link>)>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let Some(entity) = load_entity::<S>(&tx, kind, id)? else {
            return Ok(None);
        };

        let column = match kind {
            EntityKind::Parent => "parent_id",
            EntityKind::Child => "child_id",
        };
        let mut stmt = tx.prepare(&format!(
            "SELECT {} FROM {} WHERE {column} = ?1 ORDER BY seq ASC;",
            link_columns::<S>(),
            S::LINK_TABLE
        ))?;
        let mut rows = stmt.query([id])?;
        let mut links = Vec::new();
        while let Some(row) = rows.next()? {
            links.push(parse_link_row::<S>(row)?);
        }
        drop(rows);
        drop(stmt);
        tx.commit()?;

        Ok(Some((entity, links)))
    }

    fn count(&self, collection: Collection) -> RepoResult<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {};", S::table(collection)),
            [],
            |row| row.get(0),
        )?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count {count}")))
    }
}

fn load_entity<S: Schema>(
    conn: &Connection,
    kind: EntityKind,
    id: EntityId,
) -> RepoResult<Option<Entity>> {
    let entity = conn
        .query_row(
            &format!(
                "SELECT id, name FROM {} WHERE id = ?1;",
                S::table(kind.into())
            ),
            [id],
            parse_entity_row,
        )
        .optional()?;
    Ok(entity)
}

fn push_window(sql: &mut String, bind_values: &mut Vec<Value>, limit: Option<u32>, offset: u32) {
    sql.push_str(" ORDER BY seq ASC");
    if let Some(limit) = limit {
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(offset)));
        }
    } else if offset > 0 {
        sql.push_str(" LIMIT -1 OFFSET ?");
        bind_values.push(Value::Integer(i64::from(offset)));
    }
}

fn parse_entity_row(row: &Row<'_>) -> rusqlite::Result<Entity> {
    Ok(Entity {
        id: row.get("id")?,
        name: row.get("name")?,
    })
}

fn link_columns<S: Schema>() -> &'static str {
    if S::LINK_TEXT {
        "id, parent_id, child_id, text"
    } else {
        "id, parent_id, child_id"
    }
}

fn parse_link_row<S: Schema>(row: &Row<'_>) -> rusqlite::Result<Link> {
    Ok(Link {
        id: row.get("id")?,
        parent_id: row.get("parent_id")?,
        child_id: row.get("child_id")?,
        text: if S::LINK_TEXT { row.get("text")? } else { None },
    })
}

fn ensure_connection_ready<S: Schema>(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for collection in Collection::ALL {
        let table = S::table(collection);
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
