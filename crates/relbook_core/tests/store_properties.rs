use proptest::prelude::*;
use relbook_core::db::open_db_in_memory;
use relbook_core::{
    Blog, Collection, EntityId, EntityRepository, EntityService, MemoryEntityRepository,
    RepoError, SqliteEntityRepository,
};
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Command {
    Parent(EntityId),
    Child(EntityId),
    Link(EntityId, EntityId, EntityId),
}

fn command() -> impl Strategy<Value = Command> {
    // Small id space so duplicates and dangling references are common.
    prop_oneof![
        (0i64..6).prop_map(Command::Parent),
        (0i64..6).prop_map(Command::Child),
        (0i64..8, 0i64..6, 0i64..6).prop_map(|(id, p, c)| Command::Link(id, p, c)),
    ]
}

#[derive(Default)]
struct Model {
    parents: HashSet<EntityId>,
    children: HashSet<EntityId>,
    links: HashSet<EntityId>,
}

impl Model {
    /// Expected error code, or `None` when the command should succeed.
    fn apply(&mut self, command: &Command) -> Option<&'static str> {
        match *command {
            Command::Parent(id) => (!self.parents.insert(id)).then_some("already_exists"),
            Command::Child(id) => (!self.children.insert(id)).then_some("already_exists"),
            Command::Link(id, parent_id, child_id) => {
                if self.links.contains(&id) {
                    Some("already_exists")
                } else if !self.parents.contains(&parent_id) {
                    Some("parent_not_found")
                } else if !self.children.contains(&child_id) {
                    Some("child_not_found")
                } else {
                    self.links.insert(id);
                    None
                }
            }
        }
    }
}

fn run<R: EntityRepository>(service: &EntityService<R>, command: &Command) -> Result<(), RepoError> {
    match *command {
        Command::Parent(id) => service.create_parent(id, format!("user {id}")).map(|_| ()),
        Command::Child(id) => service.create_child(id, format!("post {id}")).map(|_| ()),
        Command::Link(id, parent_id, child_id) => {
            service.create_link(id, parent_id, child_id).map(|_| ())
        }
    }
}

fn assert_symmetric<R: EntityRepository>(service: &EntityService<R>) -> Result<(), TestCaseError> {
    let links = service.list_links().unwrap();
    let mut seen_from_parents = 0;
    for parent in service.list_parents().unwrap() {
        let view = service.denormalize_parent(parent.id).unwrap().unwrap();
        seen_from_parents += view.links.len();
        for link in &view.links {
            prop_assert_eq!(link.parent_id, parent.id);
            let child = service.denormalize_child(link.child_id).unwrap().unwrap();
            prop_assert!(child.links.contains(link));
        }
    }
    prop_assert_eq!(seen_from_parents, links.len());
    Ok(())
}

proptest! {
    #[test]
    fn outcomes_match_model_and_links_stay_symmetric(
        commands in prop::collection::vec(command(), 1..60)
    ) {
        let service = EntityService::new(MemoryEntityRepository::<Blog>::new());
        let mut model = Model::default();

        for command in &commands {
            let expected = model.apply(command);
            let actual = run(&service, command).err().map(|err| err.code());
            prop_assert_eq!(actual, expected, "command {:?}", command);
        }

        prop_assert_eq!(service.count(Collection::Parent).unwrap(), model.parents.len());
        prop_assert_eq!(service.count(Collection::Child).unwrap(), model.children.len());
        prop_assert_eq!(service.count(Collection::Link).unwrap(), model.links.len());

        let ids: Vec<_> = service.list_links().unwrap().iter().map(|l| l.id).collect();
        let unique: HashSet<_> = ids.iter().copied().collect();
        prop_assert_eq!(ids.len(), unique.len());

        assert_symmetric(&service)?;
    }

    #[test]
    fn memory_and_sqlite_backends_agree(
        commands in prop::collection::vec(command(), 1..40)
    ) {
        let memory = EntityService::new(MemoryEntityRepository::<Blog>::new());
        let conn = open_db_in_memory().unwrap();
        let sqlite = EntityService::new(SqliteEntityRepository::<Blog>::try_new(&conn).unwrap());

        for command in &commands {
            let left = run(&memory, command).err().map(|err| err.code());
            let right = run(&sqlite, command).err().map(|err| err.code());
            prop_assert_eq!(left, right, "command {:?}", command);
        }

        prop_assert_eq!(memory.list_parents().unwrap(), sqlite.list_parents().unwrap());
        prop_assert_eq!(memory.list_children().unwrap(), sqlite.list_children().unwrap());
        prop_assert_eq!(memory.list_links().unwrap(), sqlite.list_links().unwrap());
        assert_symmetric(&sqlite)?;
    }
}
