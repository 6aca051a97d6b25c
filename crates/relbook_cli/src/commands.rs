//! Command execution against a selected store.

use crate::args::{Cli, Command, EntityCommand, LinkCommand, PageArgs};
use anyhow::Context;
use log::debug;
use relbook_core::db::open_db;
use relbook_core::{
    labeled_json, Collection, CoreConfig, EntityId, EntityKind, EntityRepository, EntityService,
    LinkListQuery, MemoryEntityRepository, PageRequest, Schema, SqliteEntityRepository,
};
use serde_json::{json, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// `show` named a record that does not exist.
#[derive(Debug)]
pub struct RecordNotFound {
    pub label: &'static str,
    pub id: EntityId,
}

impl Display for RecordNotFound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} not found", self.label, self.id)
    }
}

impl Error for RecordNotFound {}

/// Opens the store selected by `cli`/`config` for schema `S` and runs the command.
pub fn dispatch<S: Schema>(cli: &Cli, config: &CoreConfig) -> anyhow::Result<Value> {
    if cli.memory {
        let service = EntityService::new(MemoryEntityRepository::<S>::new());
        return execute(&service, &cli.command, config.default_per_page);
    }

    let conn = open_db(&config.db_path)
        .with_context(|| format!("opening {}", config.db_path.display()))?;
    let repo = SqliteEntityRepository::<S>::try_new(&conn)?;
    execute(&EntityService::new(repo), &cli.command, config.default_per_page)
}

fn execute<R: EntityRepository>(
    service: &EntityService<R>,
    command: &Command,
    default_per_page: u32,
) -> anyhow::Result<Value> {
    debug!(
        "event=cli_command module=cli schema={} command={command:?}",
        <R::Schema as Schema>::KEY
    );
    match command {
        Command::Parent(cmd) => execute_entity(service, EntityKind::Parent, cmd, default_per_page),
        Command::Child(cmd) => execute_entity(service, EntityKind::Child, cmd, default_per_page),
        Command::Link(LinkCommand::Add {
            id,
            parent_id,
            child_id,
            text,
        }) => {
            let created = match text {
                Some(text) => {
                    service.create_link_with_text(*id, *parent_id, *child_id, text.as_str())?
                }
                None => service.create_link(*id, *parent_id, *child_id)?,
            };
            Ok(json!(created))
        }
        Command::Link(LinkCommand::List {
            parent_id,
            child_id,
            page,
        }) => {
            let filter = LinkListQuery {
                parent_id: *parent_id,
                child_id: *child_id,
                ..LinkListQuery::default()
            };
            if page.is_paged() {
                Ok(json!(service.paginate_links(filter, page_request(page, default_per_page))?))
            } else if child_id.is_some() {
                Ok(json!(service.filter_links_by_child(*child_id)?))
            } else {
                Ok(json!(service.filter_links_by_parent(*parent_id)?))
            }
        }
    }
}

fn execute_entity<R: EntityRepository>(
    service: &EntityService<R>,
    kind: EntityKind,
    command: &EntityCommand,
    default_per_page: u32,
) -> anyhow::Result<Value> {
    match command {
        EntityCommand::Add { id, name } => {
            let created = match kind {
                EntityKind::Parent => service.create_parent(*id, name.as_str())?,
                EntityKind::Child => service.create_child(*id, name.as_str())?,
            };
            Ok(json!(created))
        }
        EntityCommand::List(page) if page.is_paged() => {
            let request = page_request(page, default_per_page);
            let listed = match kind {
                EntityKind::Parent => service.paginate_parents(request)?,
                EntityKind::Child => service.paginate_children(request)?,
            };
            Ok(json!(listed))
        }
        EntityCommand::List(_) => {
            let listed = match kind {
                EntityKind::Parent => service.list_parents()?,
                EntityKind::Child => service.list_children()?,
            };
            Ok(json!(listed))
        }
        EntityCommand::Show { id } => {
            let view = match kind {
                EntityKind::Parent => service.denormalize_parent(*id)?,
                EntityKind::Child => service.denormalize_child(*id)?,
            };
            let view = view.ok_or(RecordNotFound {
                label: <R::Schema as Schema>::label(Collection::from(kind)),
                id: *id,
            })?;
            Ok(labeled_json::<R::Schema>(&view))
        }
    }
}

fn page_request(page: &PageArgs, default_per_page: u32) -> PageRequest {
    PageRequest::from_params(page.page, page.per_page, default_per_page)
}

#[cfg(test)]
mod tests {
    use super::execute;
    use crate::args::{Command, EntityCommand, LinkCommand, PageArgs};
    use relbook_core::{Blog, Campus, EntityService, MemoryEntityRepository, RepoError};
    use serde_json::json;

    fn add_parent(id: i64, name: &str) -> Command {
        Command::Parent(EntityCommand::Add {
            id,
            name: name.to_string(),
        })
    }

    #[test]
    fn show_renders_schema_labeled_view() {
        let service = EntityService::new(MemoryEntityRepository::<Campus>::new());
        execute(&service, &add_parent(1, "Ada"), 5).unwrap();
        execute(
            &service,
            &Command::Child(EntityCommand::Add {
                id: 7,
                name: "Logic".to_string(),
            }),
            5,
        )
        .unwrap();
        execute(
            &service,
            &Command::Link(LinkCommand::Add {
                id: 1,
                parent_id: 1,
                child_id: 7,
                text: None,
            }),
            5,
        )
        .unwrap();

        let shown = execute(&service, &Command::Parent(EntityCommand::Show { id: 1 }), 5).unwrap();
        assert_eq!(
            shown,
            json!({
                "id": 1,
                "name": "Ada",
                "enrollments": [{"id": 1, "parent_id": 1, "child_id": 7}]
            })
        );
    }

    #[test]
    fn duplicate_add_surfaces_store_error() {
        let service = EntityService::new(MemoryEntityRepository::<Campus>::new());
        execute(&service, &add_parent(1, "Ada"), 5).unwrap();
        let err = execute(&service, &add_parent(1, "Bob"), 5).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RepoError>(),
            Some(RepoError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn paged_list_uses_default_page_size() {
        let service = EntityService::new(MemoryEntityRepository::<Campus>::new());
        for id in 1..=3 {
            execute(&service, &add_parent(id, "student"), 2).unwrap();
        }
        let paged = PageArgs {
            page: Some(2),
            per_page: None,
        };
        let listed = execute(&service, &Command::Parent(EntityCommand::List(paged)), 2).unwrap();
        assert_eq!(listed["per_page"], json!(2));
        assert_eq!(listed["items"], json!([{"id": 3, "name": "student"}]));
    }

    #[test]
    fn comment_text_is_echoed_and_refused_for_enrollments() {
        let add_link = Command::Link(LinkCommand::Add {
            id: 1,
            parent_id: 1,
            child_id: 1,
            text: Some("Nice post".to_string()),
        });
        let add_child = Command::Child(EntityCommand::Add {
            id: 1,
            name: "Intro".to_string(),
        });

        let blog = EntityService::new(MemoryEntityRepository::<Blog>::new());
        execute(&blog, &add_parent(1, "Ada"), 5).unwrap();
        execute(&blog, &add_child, 5).unwrap();
        let created = execute(&blog, &add_link, 5).unwrap();
        assert_eq!(created["text"], json!("Nice post"));

        let campus = EntityService::new(MemoryEntityRepository::<Campus>::new());
        execute(&campus, &add_parent(1, "Ada"), 5).unwrap();
        execute(&campus, &add_child, 5).unwrap();
        let err = execute(&campus, &add_link, 5).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RepoError>(),
            Some(RepoError::Validation(_))
        ));
    }
}
