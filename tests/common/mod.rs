//! Helpers for integration tests.
#![allow(dead_code)]

use chrono::{DateTime, NaiveDateTime};
use diesel_migrations::MigrationHarness;
use pushkind_forum::db::{DbPool, MIGRATIONS, establish_connection_pool};
use pushkind_forum::domain::category::NewCategory;
use pushkind_forum::domain::forum::{Forum, NewForum};
use pushkind_forum::domain::post::NewReply;
use pushkind_forum::domain::thread::{NewThread, ThreadCreated};
use pushkind_forum::domain::types::{
    CategoryName, ForumId, ForumName, PostContent, Slug, ThreadId, ThreadName, UserId,
};
use pushkind_forum::repository::{
    CategoryWriter, DieselRepository, ForumReader, ForumWriter, ThreadWriter,
};
use tempfile::NamedTempFile;

/// Temporary database used in integration tests.
pub struct TestDb {
    _tempfile: NamedTempFile,
    pool: DbPool,
}

impl TestDb {
    pub fn new() -> Self {
        let tempfile = NamedTempFile::new().expect("Failed to create temp file");
        let pool = establish_connection_pool(tempfile.path().to_str().unwrap())
            .expect("Failed to establish SQLite connection.");
        let mut conn = pool
            .get()
            .expect("Failed to get SQLite connection from pool.");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("Migrations failed");
        TestDb {
            _tempfile: tempfile,
            pool,
        }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    pub fn repo(&self) -> DieselRepository {
        DieselRepository::new(self.pool())
    }
}

/// Timestamp `secs` seconds after the epoch.
pub fn at(secs: i64) -> NaiveDateTime {
    DateTime::from_timestamp(secs, 0).unwrap().naive_utc()
}

pub fn uid(id: i32) -> UserId {
    UserId::new(id).unwrap()
}

/// Create a category holding one forum and return the forum id.
pub fn seed_forum(repo: &DieselRepository, name: &str, visible: bool) -> ForumId {
    let category = repo
        .create_category(&NewCategory {
            name: CategoryName::new(format!("{name} category")).unwrap(),
            slug: Slug::from_name(name),
            visible,
            sort: 0,
            keywords: None,
            description: None,
            created_at: at(0),
            updated_at: at(0),
        })
        .expect("should create category");
    repo.create_forum(&NewForum {
        category_id: category.id,
        name: ForumName::new(name).unwrap(),
        sub: None,
        slug: Slug::from_name(name),
        visible,
        sort: 0,
        keywords: None,
        description: None,
        created_at: at(0),
        updated_at: at(0),
    })
    .expect("should create forum")
    .id
}

pub fn forum(repo: &DieselRepository, id: ForumId) -> Forum {
    repo.get_forum_by_id(id)
        .expect("should load forum")
        .expect("forum should exist")
}

pub fn create_thread(
    repo: &DieselRepository,
    forum_id: ForumId,
    author: i32,
    name: &str,
    body: &str,
    secs: i64,
) -> ThreadCreated {
    repo.create_thread(&NewThread {
        forum_id,
        name: ThreadName::new(name).unwrap(),
        author_id: uid(author),
        content: PostContent::new(body).unwrap(),
        subscribe: true,
        created_at: at(secs),
    })
    .expect("should create thread")
}

pub fn reply(author: i32, thread_id: ThreadId, body: &str, secs: i64) -> NewReply {
    NewReply {
        thread_id,
        author_id: uid(author),
        content: PostContent::new(body).unwrap(),
        subscribe: false,
        created_at: at(secs),
    }
}
