//! # Projection
//!
//! Turns stored records into the views the site renders.
//!
//! Link fields are resolved best effort: an id with no matching record
//! (deleted user, half-synced link cell) is skipped, never an error.
use store::{
    RawRecord,
    models::{CategoryFields, CourseFields, ProjectFields, UserFields},
};
use tracing::warn;

use crate::{
    lookup::{Lookup, resolve},
    models::{ProcessedProject, ProcessedUser, Seo},
    utils::{non_empty, parse_created, slug_for},
};

pub fn process_user(user: &RawRecord<UserFields>, project_count: usize) -> ProcessedUser {
    let fields = &user.fields;

    let full_name = [
        Some(&fields.first_name),
        fields.last_name.as_ref(),
        fields.second_last_name.as_ref(),
    ]
    .into_iter()
    .filter_map(non_empty)
    .map(String::as_str)
    .collect::<Vec<_>>()
    .join(" ");

    ProcessedUser {
        id: user.id.clone(),
        first_name: fields.first_name.clone(),
        last_name: fields.last_name.clone(),
        second_last_name: fields.second_last_name.clone(),
        full_name,
        code: fields.code.clone(),
        url: fields.url.clone(),
        email: fields.email.clone(),
        project_count,
    }
}

pub fn project(
    project: &RawRecord<ProjectFields>,
    users: &Lookup<'_, UserFields>,
    categories: &Lookup<'_, CategoryFields>,
    courses: &Lookup<'_, CourseFields>,
) -> ProcessedProject {
    let fields = &project.fields;

    let authors = resolve(fields.authors.as_ref(), users, |user| {
        Some(process_user(user, 0))
    });
    let categories = resolve(fields.category.as_ref(), categories, |category| {
        (!category.fields.name.is_empty()).then(|| category.fields.name.clone())
    });
    let courses = resolve(fields.course.as_ref(), courses, |course| {
        (!course.fields.name.is_empty()).then(|| course.fields.name.clone())
    });

    let gallery: Vec<_> = fields
        .gallery_slots()
        .into_iter()
        .flatten()
        .flatten()
        .cloned()
        .collect();

    let videos: Vec<_> = fields
        .video_slots()
        .into_iter()
        .filter_map(non_empty)
        .cloned()
        .collect();

    let cover = gallery.first().cloned();

    let created_at = fields.created.as_deref().and_then(|raw| {
        let parsed = parse_created(raw);
        if parsed.is_none() {
            warn!("Project {}: unreadable created timestamp {raw:?}", project.id);
        }
        parsed
    });

    let seo = Seo {
        title: non_empty(fields.seo_title.as_ref())
            .unwrap_or(&fields.title)
            .clone(),
        description: non_empty(fields.seo_description.as_ref())
            .or(non_empty(fields.description.as_ref()))
            .cloned()
            .unwrap_or_default(),
        keywords: fields.keywords.clone().unwrap_or_default(),
    };

    ProcessedProject {
        id: project.id.clone(),
        numeric_id: fields.id,
        title: fields.title.clone(),
        description: fields.description.clone(),
        slug: slug_for(fields.slug.as_deref(), &fields.title),
        cycle: fields.cycle.clone(),
        cover,
        url: fields.url.clone(),
        gallery,
        videos,
        authors,
        categories,
        courses,
        contact: fields.contact.clone(),
        created_at,
        seo,
    }
}
