//! # Catalog
//!
//! Joins the four portfolio tables into display views.
//!
//! ## Flow
//! 1. Fetch users, categories, courses and projects concurrently. The first
//!    failure aborts the whole batch, there is no partial result.
//! 2. Build id lookups for users, categories and courses once.
//! 3. Project every project record, keeping the store's order.
//!
//! ## Notes
//! - Every call reads fresh from the store. The collections are small (a few
//!   hundred projects), so a slug lookup simply projects everything and takes
//!   the first match.
//! - Slugs are not unique in the base; the first project in store order wins.
use std::{collections::HashMap, sync::Arc};

use store::{
    RawRecord, RecordStore, StoreError, Table, fetch_all,
    models::{CategoryFields, CourseFields, NewTicket, ProjectFields, UserFields},
};
use tracing::info;

pub mod lookup;
pub mod models;
pub mod process;
pub mod utils;

use lookup::build_lookup;
use models::{ProcessedProject, ProcessedUser, Student};
use process::{process_user, project};

#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn RecordStore>,
}

impl Catalog {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn users(&self) -> Result<Vec<RawRecord<UserFields>>, StoreError> {
        fetch_all(self.store.as_ref(), Table::Users).await
    }

    pub async fn categories(&self) -> Result<Vec<RawRecord<CategoryFields>>, StoreError> {
        fetch_all(self.store.as_ref(), Table::Categories).await
    }

    pub async fn courses(&self) -> Result<Vec<RawRecord<CourseFields>>, StoreError> {
        fetch_all(self.store.as_ref(), Table::Courses).await
    }

    pub async fn projects(&self) -> Result<Vec<RawRecord<ProjectFields>>, StoreError> {
        fetch_all(self.store.as_ref(), Table::Projects).await
    }

    pub async fn all_projects(&self) -> Result<Vec<ProcessedProject>, StoreError> {
        let (projects, users, categories, courses) = tokio::try_join!(
            self.projects(),
            self.users(),
            self.categories(),
            self.courses(),
        )?;

        let users = build_lookup(&users);
        let categories = build_lookup(&categories);
        let courses = build_lookup(&courses);

        let processed: Vec<_> = projects
            .iter()
            .map(|record| project(record, &users, &categories, &courses))
            .collect();

        info!("Projected {} projects", processed.len());

        Ok(processed)
    }

    pub async fn all_users(&self) -> Result<Vec<ProcessedUser>, StoreError> {
        let (users, projects) = tokio::try_join!(self.users(), self.projects())?;

        let counts = project_counts(&projects);

        Ok(users
            .iter()
            .map(|user| process_user(user, counts.get(user.id.as_str()).copied().unwrap_or(0)))
            .collect())
    }

    pub async fn students(&self) -> Result<Vec<Student>, StoreError> {
        Ok(self
            .all_users()
            .await?
            .into_iter()
            .map(Student::from)
            .collect())
    }

    /// `None` when no project carries `slug`.
    pub async fn project_by_slug(&self, slug: &str) -> Result<Option<ProcessedProject>, StoreError> {
        Ok(self
            .all_projects()
            .await?
            .into_iter()
            .find(|project| project.slug == slug))
    }

    /// Writes a ticket and returns the new record's id.
    pub async fn create_ticket(&self, ticket: &NewTicket) -> Result<String, StoreError> {
        let fields = serde_json::to_value(ticket).map_err(|source| StoreError::InvalidRecord {
            table: Table::Tickets,
            id: String::new(),
            source,
        })?;

        let record = self.store.create(Table::Tickets, fields).await?;
        info!("Created {} ticket {} for {:?}", ticket.kind, record.id, ticket.project);

        Ok(record.id)
    }
}

/// Occurrences of each user id across every project's authors.
pub fn project_counts(projects: &[RawRecord<ProjectFields>]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();

    for author in projects
        .iter()
        .filter_map(|project| project.fields.authors.as_ref())
        .flatten()
    {
        *counts.entry(author.as_str()).or_insert(0) += 1;
    }

    counts
}
