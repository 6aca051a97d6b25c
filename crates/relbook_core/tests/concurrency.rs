use relbook_core::db::open_db;
use relbook_core::{
    Blog, Collection, EntityService, MemoryEntityRepository, RepoError, SqliteEntityRepository,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

const WORKERS: usize = 8;
const IDS: i64 = 40;

#[test]
fn racing_creates_in_memory_admit_each_id_once() {
    let service = EntityService::new(MemoryEntityRepository::<Blog>::new());
    let created = AtomicUsize::new(0);
    let rejected = AtomicUsize::new(0);

    thread::scope(|scope| {
        for worker in 0..WORKERS {
            let service = &service;
            let created = &created;
            let rejected = &rejected;
            scope.spawn(move || {
                for id in 0..IDS {
                    match service.create_parent(id, format!("worker {worker}")) {
                        Ok(_) => created.fetch_add(1, Ordering::SeqCst),
                        Err(RepoError::AlreadyExists { .. }) => {
                            rejected.fetch_add(1, Ordering::SeqCst)
                        }
                        Err(other) => panic!("unexpected error: {other}"),
                    };
                }
            });
        }
    });

    assert_eq!(created.load(Ordering::SeqCst), IDS as usize);
    assert_eq!(
        rejected.load(Ordering::SeqCst),
        (WORKERS - 1) * IDS as usize
    );
    assert_eq!(service.count(Collection::Parent).unwrap(), IDS as usize);
}

#[test]
fn readers_never_see_a_one_sided_link() {
    let service = EntityService::new(MemoryEntityRepository::<Blog>::new());
    for id in 0..4 {
        service.create_parent(id, format!("user {id}")).unwrap();
        service.create_child(id, format!("post {id}")).unwrap();
    }

    thread::scope(|scope| {
        for worker in 0..4i64 {
            let service = &service;
            scope.spawn(move || {
                for n in 0..100i64 {
                    let id = worker * 1_000 + n;
                    service.create_link(id, n % 4, (n + worker) % 4).unwrap();
                }
            });
        }

        for _ in 0..4 {
            let service = &service;
            scope.spawn(move || {
                for _ in 0..50 {
                    for link in service.list_links().unwrap() {
                        let parent = service.denormalize_parent(link.parent_id).unwrap().unwrap();
                        let child = service.denormalize_child(link.child_id).unwrap().unwrap();
                        assert!(parent.links.contains(&link));
                        assert!(child.links.contains(&link));
                    }
                }
            });
        }
    });

    assert_eq!(service.count(Collection::Link).unwrap(), 400);
}

#[test]
fn racing_connections_on_one_file_admit_each_id_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.db");
    drop(open_db(&path).unwrap());

    let created = AtomicUsize::new(0);
    thread::scope(|scope| {
        for _ in 0..4 {
            let path = &path;
            let created = &created;
            scope.spawn(move || {
                let conn = open_db(path).unwrap();
                let repo = SqliteEntityRepository::<Blog>::try_new(&conn).unwrap();
                let service = EntityService::new(repo);
                for id in 0..IDS {
                    match service.create_child(id, "shared") {
                        Ok(_) => {
                            created.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(RepoError::AlreadyExists { .. }) => {}
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                }
            });
        }
    });

    assert_eq!(created.load(Ordering::SeqCst), IDS as usize);
    let conn = open_db(&path).unwrap();
    let repo = SqliteEntityRepository::<Blog>::try_new(&conn).unwrap();
    let service = EntityService::new(repo);
    assert_eq!(service.count(Collection::Child).unwrap(), IDS as usize);
}

#[test]
fn racing_links_on_one_file_stay_visible_from_both_endpoints() {
    const LINK_IDS: i64 = 30;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("links.db");
    {
        let conn = open_db(&path).unwrap();
        let service = EntityService::new(SqliteEntityRepository::<Blog>::try_new(&conn).unwrap());
        for id in 0..4 {
            service.create_parent(id, format!("user {id}")).unwrap();
            service.create_child(id, format!("post {id}")).unwrap();
        }
    }

    let created = AtomicUsize::new(0);
    thread::scope(|scope| {
        for worker in 0..4i64 {
            let path = &path;
            let created = &created;
            scope.spawn(move || {
                let conn = open_db(path).unwrap();
                let repo = SqliteEntityRepository::<Blog>::try_new(&conn).unwrap();
                let service = EntityService::new(repo);
                for id in 0..LINK_IDS {
                    match service.create_link(id, id % 4, (id + worker) % 4) {
                        Ok(_) => {
                            created.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(RepoError::AlreadyExists { .. }) => {}
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                }
            });
        }

        for _ in 0..2 {
            let path = &path;
            scope.spawn(move || {
                let conn = open_db(path).unwrap();
                let repo = SqliteEntityRepository::<Blog>::try_new(&conn).unwrap();
                let service = EntityService::new(repo);
                for _ in 0..20 {
                    for link in service.list_links().unwrap() {
                        let parent = service.denormalize_parent(link.parent_id).unwrap().unwrap();
                        let child = service.denormalize_child(link.child_id).unwrap().unwrap();
                        assert!(parent.links.contains(&link));
                        assert!(child.links.contains(&link));
                    }
                }
            });
        }
    });

    assert_eq!(created.load(Ordering::SeqCst), LINK_IDS as usize);
    let conn = open_db(&path).unwrap();
    let service = EntityService::new(SqliteEntityRepository::<Blog>::try_new(&conn).unwrap());
    assert_eq!(service.count(Collection::Link).unwrap(), LINK_IDS as usize);
    let from_parents: usize = (0..4)
        .map(|id| service.denormalize_parent(id).unwrap().unwrap().links.len())
        .sum();
    assert_eq!(from_parents, LINK_IDS as usize);
}
